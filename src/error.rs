use std::path::PathBuf;
use thiserror::Error;

/// A fault confined to one file or directory.
///
/// These never abort a search: the offending entry is skipped and the fault is
/// reported to the diagnostics sink.
#[derive(Debug, Error)]
pub enum SearchFault {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("directory walk error: {source}")]
    Walk {
        #[source]
        source: ignore::Error,
    },

    #[error("failed to parse {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },
}

impl SearchFault {
    pub fn parse(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        SearchFault::Parse {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
