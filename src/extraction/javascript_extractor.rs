//! JavaScript/TypeScript import extractor.
use std::sync::LazyLock;

use regex::Regex;

use crate::extraction::comments::strip_comments;
use crate::extraction::patterns::{all_captures, in_source_order};
use crate::extraction::LanguageExtractor;
use crate::types::FileImportList;

/// `require("x")` with a single string-literal argument.
static REQUIRE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"require\(["']([^"']+)["']\)"#).expect("require pattern is valid")
});

/// `import <bindings> from "x"`; only the module path is captured.
static IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"import\s+.+?\s+from\s+["']([^"']+)["']"#).expect("import pattern is valid")
});

/// Extracts required and imported module paths from `.js` and `.ts` files.
pub struct JavaScriptExtractor;

impl LanguageExtractor for JavaScriptExtractor {
    fn extensions(&self) -> &[&str] {
        &["js", "ts"]
    }

    fn language_name(&self) -> &str {
        "JavaScript/TypeScript"
    }

    /// Vendored dependencies are not part of the project.
    fn excluded_dirs(&self) -> &[&str] {
        &["node_modules"]
    }

    fn extract(&self, _file_path: &str, source: &str) -> Option<FileImportList> {
        let stripped = strip_comments(source);
        let mut imports = Vec::new();
        for line in stripped.lines() {
            let mut found = Vec::new();
            if line.contains("require") {
                found.extend(all_captures(&REQUIRE_RE, line));
            }
            if line.contains("import") {
                found.extend(all_captures(&IMPORT_RE, line));
            }
            imports.extend(in_source_order(found));
        }
        Some(imports)
    }
}
