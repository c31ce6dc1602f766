//! Maps an import specifier onto a sibling package directory of the workspace.

use anyhow::{Context, Result};
use std::borrow::Cow;
use std::path::{Path, PathBuf};

use crate::config::ResolverConfig;
use crate::diagnostics::{DiagnosticsSink, RejectReason, SearchEvent};

/// One lookup, as handed over by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionRequest {
    pub import_specifier: String,
    pub symbol_name: String,
    pub workspace_root: PathBuf,
}

impl ResolutionRequest {
    pub fn new(import_specifier: impl Into<String>, symbol_name: impl Into<String>, workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            import_specifier: import_specifier.into(),
            symbol_name: symbol_name.into(),
            workspace_root: workspace_root.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Specifier<'a> {
    /// `pkg`, `pkg/sub`, `@org/pkg`
    Bare {
        /// `pkg` or `@org/pkg`, as a manifest would name it. Stray empty segments
        /// are dropped, so `@org//pkg` still names `@org/pkg`.
        package: Cow<'a, str>,
        /// Final non-empty path segment; names the sibling directory.
        dir_name: &'a str,
    },
    /// `./x`, `../x`, `/abs/x`
    Path,
}

pub fn parse_specifier(specifier: &str) -> Option<Specifier<'_>> {
    let spec = specifier.trim();
    if spec.is_empty() {
        return None;
    }
    if spec.starts_with('.') || spec.starts_with('/') {
        return Some(Specifier::Path);
    }

    let segments: Vec<&str> = spec.split('/').filter(|s| !s.is_empty()).collect();
    let dir_name = *segments.last()?;

    let package = match segments.as_slice() {
        [scope, name, ..] if scope.starts_with('@') => match spec.get(..scope.len() + 1 + name.len()) {
            Some(prefix) if prefix.split_once('/') == Some((*scope, *name)) => Cow::Borrowed(prefix),
            _ => Cow::Owned(format!("{scope}/{name}")),
        },
        [first, ..] => Cow::Borrowed(*first),
        [] => return None,
    };

    Some(Specifier::Bare { package, dir_name })
}

/// A directory accepted as the package named by the specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRoot {
    pub dir: PathBuf,
}

/// Locate the sibling package directory for `req`, or `None`.
///
/// Only the last specifier segment is used to pick the directory, so `@org/pkg` and
/// `pkg` both land on `../pkg`. The manifest's `name` is only consulted when
/// `verify_manifest_name` is set.
pub fn resolve_package_root(req: &ResolutionRequest, cfg: &ResolverConfig, sink: &dyn DiagnosticsSink) -> Option<PackageRoot> {
    let (package, dir_name) = match parse_specifier(&req.import_specifier)? {
        Specifier::Bare { package, dir_name } => (package, dir_name),
        Specifier::Path => {
            sink.emit(SearchEvent::OutOfScopeSpecifier {
                specifier: req.import_specifier.clone(),
            });
            return None;
        }
    };

    let dir = req.workspace_root.parent()?.join(dir_name);
    let manifest = dir.join(&cfg.manifest_file);

    let reject = |reason: RejectReason| {
        sink.emit(SearchEvent::PackageRejected {
            specifier: req.import_specifier.clone(),
            dir: dir.clone(),
            reason,
        });
        None
    };

    if !manifest.is_file() {
        return reject(RejectReason::MissingManifest);
    }

    if cfg.verify_manifest_name {
        match read_manifest_name(&manifest) {
            Ok(declared) if declared.as_deref() == Some(package.as_ref()) => {}
            Ok(declared) => return reject(RejectReason::NameMismatch { declared }),
            Err(err) => {
                tracing::debug!(manifest = %manifest.display(), "manifest unreadable: {err:#}");
                return reject(RejectReason::UnreadableManifest);
            }
        }
    }

    sink.emit(SearchEvent::PackageAccepted {
        specifier: req.import_specifier.clone(),
        root: dir.clone(),
    });
    Some(PackageRoot { dir })
}

fn read_manifest_name(manifest: &Path) -> Result<Option<String>> {
    let text = std::fs::read_to_string(manifest)
        .with_context(|| format!("Failed to read {}", manifest.display()))?;
    let v: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("Invalid JSON in {}", manifest.display()))?;
    Ok(v.get("name").and_then(|n| n.as_str()).map(str::to_string))
}
