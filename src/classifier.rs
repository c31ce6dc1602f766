//! Export-shape classification over a tree-sitter syntax tree.
//!
//! Every node is viewed through [`Shape`], a tagged variant over the node kinds that
//! can declare a symbol. One `match` decides whether a shape binds the searched name.

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use tree_sitter::{Language, Node, Parser, Tree, TreeCursor};

use crate::config::path_ext_lower;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportKind {
    /// `export { a, b as c }`, `export { a } from "./x"`, `export * as ns from "./x"`
    Named,
    /// `export default ident;`
    DefaultIdentifier,
    /// `export default function f() {}`, `export default class C {}`
    DefaultInline,
    /// `export const a = 1;`
    ExportedVariable,
    /// `export function f`, `export class C`, `export interface I`, ...
    ExportedDeclaration,
    /// A variable, function or class declared at module level without `export`.
    TopLevelUnexported,
    /// No declaration found, but the file stem equals the symbol.
    FileName,
}

impl ExportKind {
    /// Whether the shape proves the symbol is importable from the file.
    pub fn is_exported(self) -> bool {
        !matches!(self, ExportKind::TopLevelUnexported | ExportKind::FileName)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportBinding {
    pub kind: ExportKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declared_name: Option<String>,

    /// 0-indexed row of the matching node
    pub line: u32,

    /// 0-indexed column of the matching node
    pub column: u32,
}

impl ExportBinding {
    fn at(kind: ExportKind, declared_name: Option<&str>, node: Node) -> Self {
        let pos = node.start_position();
        Self {
            kind,
            declared_name: declared_name.map(str::to_string),
            line: pos.row as u32,
            column: pos.column as u32,
        }
    }
}

/// One parsed source file. Dropped as soon as it has been classified.
pub struct SourceUnit {
    path: PathBuf,
    source: String,
    tree: Tree,
}

impl SourceUnit {
    pub fn parse(path: &Path, source: String) -> Result<Self> {
        let language = language_for_path(path);

        let mut parser = Parser::new();
        parser
            .set_language(&language)
            .context("Failed to set tree-sitter language")?;

        let tree = parser
            .parse(source.as_str(), None)
            .ok_or_else(|| anyhow!("tree-sitter returned no tree"))?;

        Ok(Self {
            path: path.to_path_buf(),
            source,
            tree,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn has_syntax_errors(&self) -> bool {
        self.tree.root_node().has_error()
    }

    fn text(&self, node: Node) -> &str {
        node_text(self.source.as_bytes(), node)
    }
}

fn language_for_path(path: &Path) -> Language {
    match path_ext_lower(path).as_str() {
        "ts" | "mts" | "cts" => tree_sitter_typescript::language_typescript(),
        // TSX is a superset of plain JS including JSX, which React `.js` files use.
        _ => tree_sitter_typescript::language_tsx(),
    }
}

fn node_text<'a>(source: &'a [u8], node: Node) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}

fn strip_string_quotes(s: &str) -> &str {
    let t = s.trim();
    for q in ['"', '\''] {
        if t.len() >= 2 && t.starts_with(q) && t.ends_with(q) {
            return &t[1..t.len() - 1];
        }
    }
    t
}

/// Syntactic forms that may bind a name at module level.
enum Shape<'t> {
    /// `export_clause` of `export { ... }`
    ExportClause(Node<'t>),
    /// `namespace_export` of `export * as ns from ...`
    NamespaceExport(Node<'t>),
    /// Expression of `export default <expression>`
    DefaultValue(Node<'t>),
    /// Declaration of `export default <declaration>`
    DefaultDeclaration(Node<'t>),
    /// Declaration list of `export const|let|var ...`
    ExportedVariable(Node<'t>),
    /// Any other declaration under `export`
    ExportedDeclaration(Node<'t>),
    /// `const|let|var ...` directly in the program body.
    TopLevelVariable(Node<'t>),
    /// `function f` / `class C` directly in the program body.
    TopLevelDeclaration(Node<'t>),
    Unrecognized,
}

fn shape_of(node: Node<'_>) -> Shape<'_> {
    match node.kind() {
        "export_statement" => export_shape(node),
        "lexical_declaration" | "variable_declaration" if is_top_level(node) => Shape::TopLevelVariable(node),
        "function_declaration"
        | "generator_function_declaration"
        | "class_declaration"
        | "abstract_class_declaration"
            if is_top_level(node) =>
        {
            Shape::TopLevelDeclaration(node)
        }
        _ => Shape::Unrecognized,
    }
}

fn is_top_level(node: Node) -> bool {
    node.parent().is_some_and(|p| p.kind() == "program")
}

fn export_shape(node: Node<'_>) -> Shape<'_> {
    let mut is_default = false;
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "default" => is_default = true,
            "export_clause" => return Shape::ExportClause(child),
            "namespace_export" => return Shape::NamespaceExport(child),
            _ => {}
        }
    }

    match (is_default, node.child_by_field_name("declaration")) {
        (true, Some(decl)) => Shape::DefaultDeclaration(decl),
        (true, None) => node
            .child_by_field_name("value")
            .map_or(Shape::Unrecognized, Shape::DefaultValue),
        (false, Some(decl)) => exported_declaration_shape(decl),
        // `export * from`, `export = x`, `export as namespace X`
        (false, None) => Shape::Unrecognized,
    }
}

fn exported_declaration_shape(decl: Node<'_>) -> Shape<'_> {
    match decl.kind() {
        "lexical_declaration" | "variable_declaration" => Shape::ExportedVariable(decl),
        // export declare const x: T;
        "ambient_declaration" => decl
            .named_child(0)
            .map_or(Shape::Unrecognized, exported_declaration_shape),
        _ => Shape::ExportedDeclaration(decl),
    }
}

fn binding_for(unit: &SourceUnit, shape: Shape, symbol: &str) -> Option<ExportBinding> {
    match shape {
        Shape::ExportClause(clause) => {
            let mut cursor = clause.walk();
            let found = clause
                .named_children(&mut cursor)
                .filter(|spec| spec.kind() == "export_specifier")
                .find_map(|spec| {
                    ["name", "alias"]
                        .iter()
                        .filter_map(|field| spec.child_by_field_name(field))
                        .map(|n| strip_string_quotes(unit.text(n)))
                        .find(|name| *name == symbol)
                        .map(|name| ExportBinding::at(ExportKind::Named, Some(name), spec))
                });
            found
        }
        Shape::NamespaceExport(ns) => {
            let name_node = ns.named_child(0)?;
            let name = strip_string_quotes(unit.text(name_node));
            (name == symbol).then(|| ExportBinding::at(ExportKind::Named, Some(name), name_node))
        }
        Shape::DefaultValue(value) if value.kind() == "identifier" => {
            let name = unit.text(value);
            (name == symbol || symbol == "default")
                .then(|| ExportBinding::at(ExportKind::DefaultIdentifier, Some(name), value))
        }
        Shape::DefaultValue(decl) | Shape::DefaultDeclaration(decl) => {
            let name = decl.child_by_field_name("name").map(|n| unit.text(n));
            (name == Some(symbol) || symbol == "default")
                .then(|| ExportBinding::at(ExportKind::DefaultInline, name, decl))
        }
        Shape::ExportedVariable(decl) => variable_binding(unit, decl, symbol, ExportKind::ExportedVariable),
        Shape::ExportedDeclaration(decl) => named_declaration(unit, decl, symbol, ExportKind::ExportedDeclaration),
        Shape::TopLevelVariable(decl) => variable_binding(unit, decl, symbol, ExportKind::TopLevelUnexported),
        Shape::TopLevelDeclaration(decl) => named_declaration(unit, decl, symbol, ExportKind::TopLevelUnexported),
        Shape::Unrecognized => None,
    }
}

fn named_declaration(unit: &SourceUnit, decl: Node, symbol: &str, kind: ExportKind) -> Option<ExportBinding> {
    let name_node = decl.child_by_field_name("name")?;
    (unit.text(name_node) == symbol).then(|| ExportBinding::at(kind, Some(symbol), name_node))
}

fn variable_binding(unit: &SourceUnit, decl: Node, symbol: &str, kind: ExportKind) -> Option<ExportBinding> {
    let mut cursor = decl.walk();
    let found = decl
        .named_children(&mut cursor)
        .filter(|d| d.kind() == "variable_declarator")
        .filter_map(|d| d.child_by_field_name("name"))
        .find_map(|pattern| find_binding(unit, pattern, symbol))
        .map(|ident| ExportBinding::at(kind, Some(symbol), ident));
    found
}

/// Find the identifier bound to `symbol` inside a (possibly destructuring) pattern.
fn find_binding<'t>(unit: &SourceUnit, pattern: Node<'t>, symbol: &str) -> Option<Node<'t>> {
    match pattern.kind() {
        "identifier" | "shorthand_property_identifier_pattern" => {
            (unit.text(pattern) == symbol).then_some(pattern)
        }
        // { key: value }: only the value side binds.
        "pair_pattern" => find_binding(unit, pattern.child_by_field_name("value")?, symbol),
        // a = default is the default expression binds nothing.
        "assignment_pattern" | "object_assignment_pattern" => {
            find_binding(unit, pattern.child_by_field_name("left")?, symbol)
        }
        "object_pattern" | "array_pattern" | "rest_pattern" => {
            let mut cursor = pattern.walk();
            let found = pattern
                .named_children(&mut cursor)
                .find_map(|child| find_binding(unit, child, symbol));
            found
        }
        _ => None,
    }
}

/// Pre-order traversal over every node of a tree.
struct Preorder<'t> {
    cursor: TreeCursor<'t>,
    done: bool,
}

impl<'t> Preorder<'t> {
    fn new(root: Node<'t>) -> Self {
        Self {
            cursor: root.walk(),
            done: false,
        }
    }
}

impl<'t> Iterator for Preorder<'t> {
    type Item = Node<'t>;

    fn next(&mut self) -> Option<Node<'t>> {
        if self.done {
            return None;
        }
        let node = self.cursor.node();
        if self.cursor.goto_first_child() {
            return Some(node);
        }
        loop {
            if self.cursor.goto_next_sibling() {
                return Some(node);
            }
            if !self.cursor.goto_parent() {
                self.done = true;
                return Some(node);
            }
        }
    }
}

/// Decide whether `unit` defines `symbol`, and how.
///
/// The first exported shape found in document order wins immediately. An
/// unexported module-level declaration only counts when nothing exported matches,
/// and the file-name heuristic only when the tree yields nothing at all.
pub fn classify(unit: &SourceUnit, symbol: &str) -> Option<ExportBinding> {
    if symbol.is_empty() {
        return None;
    }

    let walk = Preorder::new(unit.tree.root_node()).try_fold(None, |weak: Option<ExportBinding>, node| {
        match binding_for(unit, shape_of(node), symbol) {
            Some(binding) if binding.kind.is_exported() => ControlFlow::Break(binding),
            Some(binding) => ControlFlow::Continue(weak.or(Some(binding))),
            None => ControlFlow::Continue(weak),
        }
    });

    let structural = match walk {
        ControlFlow::Break(binding) => Some(binding),
        ControlFlow::Continue(weak) => weak,
    };

    structural.or_else(|| file_name_match(unit, symbol))
}

pub fn classifies(unit: &SourceUnit, symbol: &str) -> bool {
    classify(unit, symbol).is_some()
}

fn file_name_match(unit: &SourceUnit, symbol: &str) -> Option<ExportBinding> {
    let stem = unit.path.file_stem().and_then(|s| s.to_str())?;
    (stem == symbol).then(|| ExportBinding {
        kind: ExportKind::FileName,
        declared_name: Some(stem.to_string()),
        line: 0,
        column: 0,
    })
}
