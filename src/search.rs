//! Ordered, pruned walk over a package's source tree.
//!
//! Algorithm:
//!  1. Visit each configured search dir (`src`, then the package root) that exists.
//!  2. Walk it depth-first with `ignore::WalkBuilder`. Ignore-listed directory names
//!     are pruned before they are entered. Within a directory, files come before
//!     subdirectories.
//!  3. Parse each source file and hand it to the classifier; the first hit wins.
//!  4. Nothing found: fall back to the package's entry file, unverified.
//!
//! Any fault reading or parsing one entry is reported and the walk moves on.

use ignore::WalkBuilder;
use serde::Serialize;
use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use crate::classifier::{classify, ExportBinding, SourceUnit};
use crate::config::{ResolverConfig, WalkOrder};
use crate::diagnostics::{DiagnosticsSink, SearchEvent};
use crate::error::SearchFault;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "provenance", rename_all = "snake_case")]
pub enum MatchProvenance {
    /// The classifier found the symbol in this file.
    Verified(ExportBinding),
    /// Nothing matched; this is the package entry file, which may re-export it.
    EntryFallback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymbolMatch {
    pub path: PathBuf,
    #[serde(flatten)]
    pub provenance: MatchProvenance,
}

impl SymbolMatch {
    pub fn is_verified(&self) -> bool {
        matches!(self.provenance, MatchProvenance::Verified(_))
    }

    pub fn binding(&self) -> Option<&ExportBinding> {
        match &self.provenance {
            MatchProvenance::Verified(b) => Some(b),
            MatchProvenance::EntryFallback => None,
        }
    }
}

/// Search `package_root` for the file defining `symbol`.
pub fn search_package(package_root: &Path, symbol: &str, cfg: &ResolverConfig, sink: &dyn DiagnosticsSink) -> Option<SymbolMatch> {
    let mut searched: Vec<PathBuf> = Vec::new();

    for sub in &cfg.search_dirs {
        let dir = if sub == "." { package_root.to_path_buf() } else { package_root.join(sub) };
        if !dir.is_dir() {
            continue;
        }

        if let Some(found) = search_dir(&dir, &searched, symbol, cfg, sink) {
            return Some(found);
        }
        searched.push(dir);
    }

    if let Some(path) = entry_fallback(package_root, cfg) {
        sink.emit(SearchEvent::EntryFallback { path: path.clone() });
        return Some(SymbolMatch {
            path,
            provenance: MatchProvenance::EntryFallback,
        });
    }

    sink.emit(SearchEvent::NoMatch {
        root: package_root.to_path_buf(),
        symbol: symbol.to_string(),
    });
    None
}

/// Walk one search dir. Directories in `already_searched` are pruned, so the root
/// pass does not repeat the `src` pass.
fn search_dir(
    dir: &Path,
    already_searched: &[PathBuf],
    symbol: &str,
    cfg: &ResolverConfig,
    sink: &dyn DiagnosticsSink,
) -> Option<SymbolMatch> {
    let ignored = cfg.ignored_dir_set();
    let skip = already_searched.to_vec();
    let sort_cfg = cfg.clone();

    let mut builder = WalkBuilder::new(dir);
    builder
        .standard_filters(false)
        .follow_links(false)
        .sort_by_file_path(move |a, b| compare_entries(a, b, &sort_cfg))
        .filter_entry(move |entry| {
            let is_dir = entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false);
            if !is_dir || entry.depth() == 0 {
                return true;
            }
            let name = entry.file_name().to_string_lossy();
            !ignored.contains(name.as_ref()) && !skip.iter().any(|s| s == entry.path())
        });

    for item in builder.build() {
        let dent = match item {
            Ok(d) => d,
            Err(err) => {
                sink.emit(SearchEvent::Fault(SearchFault::Walk { source: err }));
                continue;
            }
        };

        let path = dent.path();
        // Links are not followed as directories, but a linked file is still a file.
        let is_file = dent
            .file_type()
            .map(|ft| ft.is_file() || (ft.is_symlink() && path.is_file()))
            .unwrap_or(false);
        if !is_file {
            continue;
        }
        if !cfg.is_source_file(path) {
            continue;
        }

        if let Some(binding) = inspect_file(path, symbol, cfg, sink) {
            sink.emit(SearchEvent::Matched {
                path: path.to_path_buf(),
                binding: binding.clone(),
            });
            return Some(SymbolMatch {
                path: path.to_path_buf(),
                provenance: MatchProvenance::Verified(binding),
            });
        }
    }

    None
}

/// Files before directories; then either name order (entry files first) or listing order.
fn compare_entries(a: &Path, b: &Path, cfg: &ResolverConfig) -> Ordering {
    let by_kind = a.is_dir().cmp(&b.is_dir());
    match cfg.walk_order {
        // Relies on the walker's stable sort to keep listing order within each group.
        WalkOrder::Listing => by_kind,
        WalkOrder::Sorted => by_kind
            .then_with(|| cfg.is_entry_file(b).cmp(&cfg.is_entry_file(a)))
            .then_with(|| a.file_name().cmp(&b.file_name())),
    }
}

fn inspect_file(path: &Path, symbol: &str, cfg: &ResolverConfig, sink: &dyn DiagnosticsSink) -> Option<ExportBinding> {
    match load_source_unit(path, cfg, sink) {
        Ok(Some(unit)) => {
            if unit.has_syntax_errors() {
                sink.emit(SearchEvent::SyntaxErrors {
                    path: unit.path().to_path_buf(),
                });
            }
            classify(&unit, symbol)
        }
        Ok(None) => None,
        Err(fault) => {
            sink.emit(SearchEvent::Fault(fault));
            None
        }
    }
}

/// Read and parse one file. `Ok(None)` means it was skipped on size.
fn load_source_unit(path: &Path, cfg: &ResolverConfig, sink: &dyn DiagnosticsSink) -> Result<Option<SourceUnit>, SearchFault> {
    let io_fault = |source: std::io::Error| SearchFault::Io {
        path: path.to_path_buf(),
        source,
    };

    let bytes = std::fs::metadata(path).map_err(io_fault)?.len();
    if bytes == 0 || bytes > cfg.file_size_limit() {
        sink.emit(SearchEvent::FileSkipped {
            path: path.to_path_buf(),
            bytes,
        });
        return Ok(None);
    }

    let raw = std::fs::read(path).map_err(io_fault)?;
    if raw.contains(&0u8) {
        return Err(SearchFault::parse(path, "binary content"));
    }
    let source_text = String::from_utf8(raw).map_err(|err| SearchFault::parse(path, err))?;

    sink.emit(SearchEvent::FileInspected {
        path: path.to_path_buf(),
    });
    SourceUnit::parse(path, source_text)
        .map(Some)
        .map_err(|err| SearchFault::parse(path, format!("{err:#}")))
}

/// First existing entry file, package root before `src/`.
fn entry_fallback(package_root: &Path, cfg: &ResolverConfig) -> Option<PathBuf> {
    [package_root.to_path_buf(), package_root.join("src")]
        .iter()
        .flat_map(|dir| cfg.entry_files.iter().map(move |name| dir.join(name)))
        .find(|p| p.is_file())
}
