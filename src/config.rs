use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// File name looked up in the workspace root for resolver overrides.
pub const CONFIG_FILE_NAME: &str = ".symlocate.json";

/// Hard safety ceiling: files larger than this are **always** skipped, regardless of config.
/// A minified bundle that slipped past the ignore list should never reach the parser.
pub const ABSOLUTE_MAX_FILE_BYTES: u64 = 1_000_000; // 1 MB

/// Order in which entries of a single directory level are visited.
///
/// Files are always visited before subdirectories; this only decides the order
/// *within* each group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WalkOrder {
    /// Sorted by file name, with entry files (`index.*`) ahead of other files.
    #[default]
    Sorted,
    /// Whatever order the filesystem lists entries in.
    Listing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Manifest whose presence marks a sibling directory as a package.
    pub manifest_file: String,

    /// Subdirectories of a package root searched in order. `"."` is the root itself.
    pub search_dirs: Vec<String>,

    /// Directory *names* never descended into (build output, fixtures, deps).
    ///
    /// These are compared against a single path component, not full paths.
    pub ignored_dirs: Vec<String>,

    /// Project-specific additions to `ignored_dirs`.
    pub extra_ignored_dirs: Vec<String>,

    /// Extensions (lowercase, without dot) of files that get parsed.
    pub source_extensions: Vec<String>,

    /// Conventional entry files, in preference order.
    pub entry_files: Vec<String>,

    pub walk_order: WalkOrder,

    /// Files above this size are skipped (clamped to [`ABSOLUTE_MAX_FILE_BYTES`]).
    pub max_file_bytes: u64,

    /// When true, the sibling manifest's `name` must agree with the import specifier.
    pub verify_manifest_name: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            manifest_file: "package.json".to_string(),
            search_dirs: vec!["src".to_string(), ".".to_string()],
            ignored_dirs: [
                "lib",
                "dist",
                "build",
                "node_modules",
                "test",
                "tests",
                "spec",
                "specs",
                "examples",
                "example",
                "demo",
                "demos",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            extra_ignored_dirs: vec![],
            source_extensions: ["ts", "tsx", "js", "jsx"].iter().map(|s| s.to_string()).collect(),
            entry_files: ["index.ts", "index.tsx", "index.js", "index.jsx"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            walk_order: WalkOrder::default(),
            // 512 KB default, enough for any hand-written module.
            max_file_bytes: 512 * 1024,
            verify_manifest_name: false,
        }
    }
}

impl ResolverConfig {
    /// Effective per-file size limit.
    pub fn file_size_limit(&self) -> u64 {
        self.max_file_bytes.min(ABSOLUTE_MAX_FILE_BYTES)
    }

    /// All pruned directory names (built-in list plus project extras).
    pub fn ignored_dir_set(&self) -> HashSet<String> {
        self.ignored_dirs
            .iter()
            .chain(self.extra_ignored_dirs.iter())
            .map(|d| d.trim().trim_matches('/').to_string())
            .filter(|d| !d.is_empty())
            .collect()
    }

    pub fn is_source_file(&self, path: &Path) -> bool {
        let ext = path_ext_lower(path);
        !ext.is_empty() && self.source_extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext))
    }

    pub fn is_entry_file(&self, path: &Path) -> bool {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        self.entry_files.iter().any(|e| e == name)
    }
}

pub(crate) fn path_ext_lower(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

/// Load `.symlocate.json` from `workspace_root`, falling back to defaults when the
/// file is missing or malformed.
pub fn load_config(workspace_root: &Path) -> ResolverConfig {
    let primary = workspace_root.join(CONFIG_FILE_NAME);

    let Ok(text) = std::fs::read_to_string(&primary) else {
        return ResolverConfig::default();
    };

    serde_json::from_str::<ResolverConfig>(&text).unwrap_or_else(|err| {
        tracing::warn!(path = %primary.display(), error = %err, "ignoring invalid resolver config");
        ResolverConfig::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_config_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let cfg = load_config(tmp.path());
        assert_eq!(cfg.manifest_file, "package.json");
        assert_eq!(cfg.search_dirs, vec!["src", "."]);
        assert_eq!(cfg.walk_order, WalkOrder::Sorted);
        assert!(cfg.ignored_dir_set().contains("node_modules"));
    }

    #[test]
    fn partial_config_overrides_only_given_fields() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join(CONFIG_FILE_NAME),
            r#"{ "walk_order": "listing", "extra_ignored_dirs": ["generated/"] }"#,
        )
        .unwrap();

        let cfg = load_config(tmp.path());
        assert_eq!(cfg.walk_order, WalkOrder::Listing);
        assert!(cfg.ignored_dir_set().contains("generated"));
        assert!(cfg.ignored_dir_set().contains("dist"));
        assert_eq!(cfg.entry_files.len(), 4);
    }

    #[test]
    fn malformed_config_falls_back() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(CONFIG_FILE_NAME), "{ not json").unwrap();
        let cfg = load_config(tmp.path());
        assert!(!cfg.verify_manifest_name);
    }

    #[test]
    fn size_limit_is_clamped() {
        let cfg = ResolverConfig {
            max_file_bytes: 50_000_000,
            ..ResolverConfig::default()
        };
        assert_eq!(cfg.file_size_limit(), ABSOLUTE_MAX_FILE_BYTES);
    }

    #[test]
    fn source_extension_filter() {
        let cfg = ResolverConfig::default();
        assert!(cfg.is_source_file(Path::new("a/Button.TSX")));
        assert!(cfg.is_source_file(Path::new("a/b.js")));
        assert!(!cfg.is_source_file(Path::new("a/b.json")));
        assert!(!cfg.is_source_file(Path::new("a/Makefile")));
        assert!(cfg.is_entry_file(Path::new("src/index.tsx")));
        assert!(!cfg.is_entry_file(Path::new("src/index.css")));
    }
}
