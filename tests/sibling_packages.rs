use std::path::{Path, PathBuf};

use symlocate::{
    resolve_symbol_path, resolve_symbol_path_blocking, CollectingSink, ExportKind, MatchProvenance, ResolutionRequest,
    Resolver, SearchEvent,
};
use tempfile::TempDir;

fn write(root: &Path, rel: &str, content: &str) {
    let p = root.join(rel);
    std::fs::create_dir_all(p.parent().expect("parent")).expect("mkdir");
    std::fs::write(p, content).expect("write fixture");
}

/// tmp/
///   app/            <- workspace root
///   ui/             <- sibling package "@acme/ui"
///   utils/          <- sibling package with only an entry file match
///   notapkg/        <- no manifest
fn monorepo() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().expect("tempdir");
    let root = tmp.path();

    write(root, "app/package.json", r#"{ "name": "app" }"#);
    write(root, "app/src/main.ts", "import { Button } from '@acme/ui';\n");

    write(root, "ui/package.json", r#"{ "name": "@acme/ui" }"#);
    write(root, "ui/src/index.ts", "export { Button } from './components/Button';\nexport * from './hooks';\n");
    write(
        root,
        "ui/src/components/Button.tsx",
        "export function Button() { return <button />; }\n",
    );
    write(root, "ui/src/components/Card.tsx", "const Card = () => <div />;\nexport default Card;\n");
    write(root, "ui/src/hooks/useToggle.ts", "export const useToggle = () => [false, () => {}];\n");
    write(root, "ui/src/Widget.tsx", "// placeholder\n");
    write(root, "ui/dist/Hidden.js", "export const Hidden = 1;\n");
    write(root, "ui/node_modules/dep/index.js", "export const Hidden = 2;\n");

    write(root, "utils/package.json", r#"{ "name": "utils" }"#);
    write(root, "utils/index.js", "module.exports = require('./impl');\n");

    write(root, "notapkg/src/Foo.ts", "export const Foo = 1;\n");

    let app = root.join("app");
    (tmp, app)
}

#[tokio::test]
async fn resolves_reexported_symbol_through_scoped_specifier() {
    let (tmp, app) = monorepo();
    let found = resolve_symbol_path("@acme/ui", "Button", &app).await;
    // The entry file re-exports it by name, and index.* is visited first.
    assert_eq!(found, Some(tmp.path().join("ui/src/index.ts")));
}

#[tokio::test]
async fn resolves_exported_variable() {
    let (tmp, app) = monorepo();
    let found = resolve_symbol_path("ui", "useToggle", &app).await;
    assert_eq!(found, Some(tmp.path().join("ui/src/hooks/useToggle.ts")));
}

#[tokio::test]
async fn default_export_and_literal_default() {
    let (tmp, app) = monorepo();
    let resolver = Resolver::default();

    let card = resolver
        .locate(ResolutionRequest::new("@acme/ui", "Card", &app))
        .await
        .expect("Card");
    assert_eq!(card.path, tmp.path().join("ui/src/components/Card.tsx"));
    // `const Card` is seen first, but the default export is the stronger match.
    assert_eq!(card.binding().map(|b| b.kind), Some(ExportKind::DefaultIdentifier));

    let any_default = resolver
        .locate(ResolutionRequest::new("@acme/ui", "default", &app))
        .await
        .expect("default");
    assert_eq!(any_default.path, tmp.path().join("ui/src/components/Card.tsx"));
}

#[tokio::test]
async fn file_name_heuristic() {
    let (tmp, app) = monorepo();
    let found = resolve_symbol_path("@acme/ui", "Widget", &app).await;
    assert_eq!(found, Some(tmp.path().join("ui/src/Widget.tsx")));
}

#[tokio::test]
async fn ignored_dirs_fall_back_to_entry_file() {
    let (tmp, app) = monorepo();
    let m = Resolver::default()
        .locate(ResolutionRequest::new("@acme/ui", "Hidden", &app))
        .await
        .expect("entry fallback");
    assert_eq!(m.path, tmp.path().join("ui/src/index.ts"));
    assert_eq!(m.provenance, MatchProvenance::EntryFallback);
    assert!(!m.is_verified());
}

#[tokio::test]
async fn entry_fallback_at_package_root() {
    let (tmp, app) = monorepo();
    let found = resolve_symbol_path("utils", "debounce", &app).await;
    assert_eq!(found, Some(tmp.path().join("utils/index.js")));
}

#[tokio::test]
async fn unresolved_cases() {
    let (_tmp, app) = monorepo();
    assert_eq!(resolve_symbol_path("notapkg", "Foo", &app).await, None);
    assert_eq!(resolve_symbol_path("missing", "Foo", &app).await, None);
    assert_eq!(resolve_symbol_path("../ui", "Button", &app).await, None);
    assert_eq!(resolve_symbol_path("./src/main", "Button", &app).await, None);
    assert_eq!(resolve_symbol_path("", "Button", &app).await, None);
}

#[tokio::test]
async fn concurrent_lookups_are_independent_and_stable() {
    let (tmp, app) = monorepo();
    let resolver = Resolver::default();

    let lookups = (0..8).map(|_| {
        let resolver = resolver.clone();
        let app = app.clone();
        tokio::spawn(async move { resolver.resolve(ResolutionRequest::new("@acme/ui", "useToggle", app)).await })
    });

    let expected = Some(tmp.path().join("ui/src/hooks/useToggle.ts"));
    for handle in lookups.collect::<Vec<_>>() {
        assert_eq!(handle.await.expect("join"), expected);
    }
}

#[tokio::test]
async fn diagnostics_are_delivered_to_injected_sink() {
    let (_tmp, app) = monorepo();
    let sink = CollectingSink::new();
    let resolver = Resolver::default().with_sink(sink.clone());

    assert!(resolver
        .locate(ResolutionRequest::new("notapkg", "Foo", &app))
        .await
        .is_none());
    let events = sink.take();
    assert!(matches!(events.as_slice(), [SearchEvent::PackageRejected { .. }]));

    assert!(resolver
        .locate(ResolutionRequest::new("ui", "useToggle", &app))
        .await
        .is_some());
    let events = sink.take();
    assert!(matches!(events.first(), Some(SearchEvent::PackageAccepted { .. })));
    assert!(matches!(events.last(), Some(SearchEvent::Matched { .. })));
}

#[test]
fn workspace_config_file_is_honoured() {
    let (tmp, app) = monorepo();
    write(tmp.path(), "app/.symlocate.json", r#"{ "verify_manifest_name": true }"#);

    // Directory matches but the manifest says "@acme/ui".
    assert_eq!(resolve_symbol_path_blocking("@other/ui", "Button", &app), None);
    assert!(resolve_symbol_path_blocking("@acme/ui", "Button", &app).is_some());

    let resolver = Resolver::for_workspace(&app);
    assert!(resolver.config().verify_manifest_name);
}
