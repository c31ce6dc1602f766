//! Locate the file that defines a JavaScript/TypeScript symbol imported from a
//! sibling package of the workspace (monorepo neighbours that are not linked into
//! `node_modules`).
//!
//! ```no_run
//! # async fn demo() {
//! let hit = symlocate::resolve_symbol_path("@acme/ui", "Button", "/work/app").await;
//! # }
//! ```

pub mod classifier;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod resolver;
pub mod search;

use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use classifier::{ExportBinding, ExportKind};
pub use config::{load_config, ResolverConfig, WalkOrder};
pub use diagnostics::{CollectingSink, DiagnosticsSink, NullSink, SearchEvent, SharedSink, TracingSink};
pub use error::SearchFault;
pub use resolver::{PackageRoot, ResolutionRequest};
pub use search::{MatchProvenance, SymbolMatch};

/// Resolve one request synchronously: package lookup, then source search.
pub fn locate_symbol(req: &ResolutionRequest, cfg: &ResolverConfig, sink: &dyn DiagnosticsSink) -> Option<SymbolMatch> {
    let package = resolver::resolve_package_root(req, cfg, sink)?;
    search::search_package(&package.dir, &req.symbol_name, cfg, sink)
}

/// Configuration plus diagnostics sink, shared by any number of lookups.
///
/// Holds no per-lookup state: every call re-walks and re-parses from scratch.
#[derive(Clone)]
pub struct Resolver {
    config: Arc<ResolverConfig>,
    sink: SharedSink,
}

impl Resolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self {
            config: Arc::new(config),
            sink: Arc::new(TracingSink),
        }
    }

    /// Resolver configured from `.symlocate.json` in `workspace_root`, if present.
    pub fn for_workspace(workspace_root: &Path) -> Self {
        Self::new(load_config(workspace_root))
    }

    pub fn with_sink(mut self, sink: SharedSink) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn locate_blocking(&self, req: &ResolutionRequest) -> Option<SymbolMatch> {
        locate_symbol(req, &self.config, self.sink.as_ref())
    }

    /// Run the lookup on tokio's blocking pool; the walk itself never yields.
    pub async fn locate(&self, req: ResolutionRequest) -> Option<SymbolMatch> {
        let this = self.clone();
        match tokio::task::spawn_blocking(move || this.locate_blocking(&req)).await {
            Ok(found) => found,
            Err(err) => {
                tracing::error!(error = %err, "symbol lookup task failed");
                None
            }
        }
    }

    pub async fn resolve(&self, req: ResolutionRequest) -> Option<PathBuf> {
        self.locate(req).await.map(|m| m.path)
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(ResolverConfig::default())
    }
}

/// Host entry point: the file defining `symbol` as imported via `import_path`, or `None`.
///
/// A returned entry file may be a heuristic hit; use [`Resolver::locate`] to tell.
pub async fn resolve_symbol_path(import_path: &str, symbol: &str, workspace_root: impl AsRef<Path>) -> Option<PathBuf> {
    let root = workspace_root.as_ref();
    Resolver::for_workspace(root)
        .resolve(ResolutionRequest::new(import_path, symbol, root))
        .await
}

pub fn resolve_symbol_path_blocking(import_path: &str, symbol: &str, workspace_root: impl AsRef<Path>) -> Option<PathBuf> {
    let root = workspace_root.as_ref();
    Resolver::for_workspace(root)
        .locate_blocking(&ResolutionRequest::new(import_path, symbol, root))
        .map(|m| m.path)
}
