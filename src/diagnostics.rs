//! Structured diagnostics emitted while resolving a symbol.
//!
//! The search code never logs directly; it reports [`SearchEvent`]s to an injected
//! [`DiagnosticsSink`]. [`TracingSink`] is the production default, [`CollectingSink`]
//! lets tests assert on what happened.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::classifier::ExportBinding;
use crate::error::SearchFault;

/// Why a sibling directory was not accepted as a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    MissingManifest,
    UnreadableManifest,
    NameMismatch { declared: Option<String> },
}

#[derive(Debug)]
pub enum SearchEvent {
    /// Relative or absolute specifiers are left to the host's own resolution.
    OutOfScopeSpecifier { specifier: String },
    PackageRejected {
        specifier: String,
        dir: PathBuf,
        reason: RejectReason,
    },
    PackageAccepted { specifier: String, root: PathBuf },
    FileSkipped { path: PathBuf, bytes: u64 },
    FileInspected { path: PathBuf },
    /// The tree contains error nodes; classification still runs on the rest.
    SyntaxErrors { path: PathBuf },
    Matched { path: PathBuf, binding: ExportBinding },
    EntryFallback { path: PathBuf },
    NoMatch { root: PathBuf, symbol: String },
    Fault(SearchFault),
}

pub trait DiagnosticsSink: Send + Sync {
    fn emit(&self, event: SearchEvent);
}

pub type SharedSink = Arc<dyn DiagnosticsSink>;

/// Forwards events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticsSink for TracingSink {
    fn emit(&self, event: SearchEvent) {
        match event {
            SearchEvent::OutOfScopeSpecifier { specifier } => {
                tracing::debug!(%specifier, "specifier is relative or absolute; not resolved");
            }
            SearchEvent::PackageRejected { specifier, dir, reason } => {
                tracing::debug!(%specifier, dir = %dir.display(), ?reason, "sibling package rejected");
            }
            SearchEvent::PackageAccepted { specifier, root } => {
                tracing::debug!(%specifier, root = %root.display(), "sibling package found");
            }
            SearchEvent::FileSkipped { path, bytes } => {
                tracing::debug!(path = %path.display(), bytes, "file skipped (size)");
            }
            SearchEvent::FileInspected { path } => {
                tracing::trace!(path = %path.display(), "inspecting file");
            }
            SearchEvent::SyntaxErrors { path } => {
                tracing::debug!(path = %path.display(), "syntax errors in file");
            }
            SearchEvent::Matched { path, binding } => {
                tracing::info!(
                    path = %path.display(),
                    kind = ?binding.kind,
                    line = binding.line + 1,
                    "symbol located"
                );
            }
            SearchEvent::EntryFallback { path } => {
                tracing::info!(path = %path.display(), "no declaration found; using entry file");
            }
            SearchEvent::NoMatch { root, symbol } => {
                tracing::info!(root = %root.display(), %symbol, "symbol not found");
            }
            SearchEvent::Fault(fault) => {
                tracing::warn!(error = %fault, "skipped entry");
            }
        }
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticsSink for NullSink {
    fn emit(&self, _event: SearchEvent) {}
}

/// Buffers events in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    events: Mutex<Vec<SearchEvent>>,
}

impl CollectingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Drain everything recorded so far.
    pub fn take(&self) -> Vec<SearchEvent> {
        let mut guard = self.events.lock().unwrap_or_else(|e| e.into_inner());
        std::mem::take(&mut *guard)
    }
}

impl DiagnosticsSink for CollectingSink {
    fn emit(&self, event: SearchEvent) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event);
    }
}
