//! Tree-sitter based Python import extractor.
//!
//! Import statements are lowered into the same three import instructions the
//! interpreter executes (import a module, import a name from it, import all of
//! it) and folded by [`ImportStateMachine`]. Working on the syntax tree means
//! imports inside comments or string literals can never be reported.
use tree_sitter::{Node as TsNode, Parser, Tree};

use crate::extraction::LanguageExtractor;
use crate::types::FileImportList;

/// Extracts imported modules from Python source files.
pub struct PythonExtractor;

/// One step of a lowered import statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOp {
    /// Import a module and make it the current base.
    Name(String),
    /// Import one attribute of the current base.
    From(String),
    /// Import every public name of the current base.
    Star,
}

/// Folds a stream of [`ImportOp`]s into import identifiers.
///
/// A `From`/`Star` replaces the plain base entries sitting directly before it,
/// once per base: `import os; from os import path, sep` yields
/// `["os:path", "os:sep"]`.
#[derive(Debug, Default)]
pub struct ImportStateMachine {
    base: Option<String>,
    popped: bool,
    emitted: Vec<String>,
}

impl ImportStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a single instruction.
    pub fn apply(&mut self, op: ImportOp) {
        match op {
            ImportOp::Name(module) => {
                self.emitted.push(module.clone());
                self.base = Some(module);
                self.popped = false;
            }
            ImportOp::From(name) => self.qualify(&name),
            ImportOp::Star => self.qualify("*"),
        }
    }

    fn qualify(&mut self, name: &str) {
        let Some(base) = self.base.as_deref() else {
            return;
        };
        if !self.popped {
            while self.emitted.last().map(String::as_str) == Some(base) {
                self.emitted.pop();
            }
            self.popped = true;
        }
        self.emitted.push(format!("{base}:{name}"));
    }

    /// Returns the identifiers emitted so far, in order.
    pub fn finish(self) -> FileImportList {
        self.emitted
    }
}

impl LanguageExtractor for PythonExtractor {
    fn extensions(&self) -> &[&str] {
        &["py"]
    }

    fn language_name(&self) -> &str {
        "Python"
    }

    fn extract(&self, file_path: &str, source: &str) -> Option<FileImportList> {
        let tree = match Self::parse_source(source) {
            Ok(tree) => tree,
            Err(msg) => {
                tracing::debug!(path = file_path, "skipping file: {msg}");
                return None;
            }
        };
        let root = tree.root_node();
        if root.has_error() {
            tracing::debug!(path = file_path, "skipping file with syntax errors");
            return None;
        }
        if Self::has_python2_statement(root) {
            tracing::debug!(path = file_path, "skipping Python 2 source");
            return None;
        }

        let mut machine = ImportStateMachine::new();
        for op in Self::lower_imports(root, source.as_bytes()) {
            machine.apply(op);
        }
        Some(machine.finish())
    }
}

impl PythonExtractor {
    /// Parse source code into a tree-sitter AST.
    fn parse_source(source: &str) -> Result<Tree, String> {
        let mut parser = Parser::new();
        let language = tree_sitter_python::LANGUAGE;
        parser
            .set_language(&language.into())
            .map_err(|e| format!("failed to load Python grammar: {e}"))?;
        parser
            .parse(source, None)
            .ok_or_else(|| "tree-sitter parse returned None".to_string())
    }

    /// Lowers the module-level import statements under `root` in source order.
    ///
    /// Compound statements (`if`, `try`, `with`, loops) are entered; function
    /// and class bodies are not, since they run in their own scope.
    pub fn lower_imports(root: TsNode<'_>, source: &[u8]) -> Vec<ImportOp> {
        let mut ops = Vec::new();
        let mut cursor = root.walk();
        loop {
            let node = cursor.node();
            let descend = match node.kind() {
                "import_statement" => {
                    Self::lower_import(node, source, &mut ops);
                    false
                }
                "import_from_statement" | "future_import_statement" => {
                    Self::lower_import_from(node, source, &mut ops);
                    false
                }
                "function_definition" | "class_definition" => false,
                _ => true,
            };
            if descend && cursor.goto_first_child() {
                continue;
            }
            loop {
                if cursor.goto_next_sibling() {
                    break;
                }
                if !cursor.goto_parent() {
                    return ops;
                }
            }
        }
    }

    /// Whether the tree holds a `print`/`exec` statement, which only Python 2
    /// accepts.
    fn has_python2_statement(root: TsNode<'_>) -> bool {
        let mut cursor = root.walk();
        loop {
            if matches!(cursor.node().kind(), "print_statement" | "exec_statement") {
                return true;
            }
            if cursor.goto_first_child() {
                continue;
            }
            loop {
                if cursor.goto_next_sibling() {
                    break;
                }
                if !cursor.goto_parent() {
                    return false;
                }
            }
        }
    }

    /// `import a.b, c as d`
    fn lower_import(node: TsNode<'_>, source: &[u8], ops: &mut Vec<ImportOp>) {
        let mut cursor = node.walk();
        for name in node.children_by_field_name("name", &mut cursor) {
            if let Some(module) = Self::imported_name(name, source) {
                ops.push(ImportOp::Name(module));
            }
        }
    }

    /// `from m import x, y as z`, `from m import *`, `from __future__ import x`
    fn lower_import_from(node: TsNode<'_>, source: &[u8], ops: &mut Vec<ImportOp>) {
        let module = if node.kind() == "future_import_statement" {
            "__future__".to_string()
        } else {
            match node
                .child_by_field_name("module_name")
                .map(|m| Self::compact_text(m, source))
            {
                Some(module) if !module.is_empty() => module,
                _ => return,
            }
        };
        ops.push(ImportOp::Name(module));

        let mut cursor = node.walk();
        let has_wildcard = node
            .named_children(&mut cursor)
            .any(|child| child.kind() == "wildcard_import");
        if has_wildcard {
            ops.push(ImportOp::Star);
            return;
        }

        let mut cursor = node.walk();
        for name in node.children_by_field_name("name", &mut cursor) {
            if let Some(attr) = Self::imported_name(name, source) {
                ops.push(ImportOp::From(attr));
            }
        }
    }

    /// Name of a `dotted_name` or `aliased_import`, alias dropped.
    fn imported_name(node: TsNode<'_>, source: &[u8]) -> Option<String> {
        let target = match node.kind() {
            "aliased_import" => node.child_by_field_name("name")?,
            _ => node,
        };
        let text = Self::compact_text(target, source);
        (!text.is_empty()).then_some(text)
    }

    /// Node text with whitespace and line continuations removed.
    fn compact_text(node: TsNode<'_>, source: &[u8]) -> String {
        node.utf8_text(source)
            .unwrap_or_default()
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '\\')
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fold(ops: Vec<ImportOp>) -> Vec<String> {
        let mut machine = ImportStateMachine::new();
        for op in ops {
            machine.apply(op);
        }
        machine.finish()
    }

    #[test]
    fn test_plain_import_is_kept() {
        assert_eq!(fold(vec![ImportOp::Name("os".into())]), vec!["os"]);
    }

    #[test]
    fn test_from_replaces_base_once() {
        let ops = vec![
            ImportOp::Name("os".into()),
            ImportOp::From("path".into()),
            ImportOp::From("sep".into()),
        ];
        assert_eq!(fold(ops), vec!["os:path", "os:sep"]);
    }

    #[test]
    fn test_star_replaces_base() {
        let ops = vec![ImportOp::Name("pkg".into()), ImportOp::Star];
        assert_eq!(fold(ops), vec!["pkg:*"]);
    }

    #[test]
    fn test_from_absorbs_directly_preceding_plain_import() {
        let ops = vec![
            ImportOp::Name("os".into()),
            ImportOp::Name("os".into()),
            ImportOp::From("path".into()),
            ImportOp::Name("os".into()),
            ImportOp::Star,
        ];
        assert_eq!(fold(ops), vec!["os:path", "os:*"]);
    }

    #[test]
    fn test_other_modules_are_not_popped() {
        let ops = vec![
            ImportOp::Name("sys".into()),
            ImportOp::Name("os".into()),
            ImportOp::From("path".into()),
        ];
        assert_eq!(fold(ops), vec!["sys", "os:path"]);
    }

    #[test]
    fn test_from_without_base_is_ignored() {
        assert!(fold(vec![ImportOp::From("x".into()), ImportOp::Star]).is_empty());
    }
}
