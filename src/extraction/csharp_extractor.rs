//! C#-family import extractor.
use std::sync::LazyLock;

use regex::Regex;

use crate::extraction::comments::strip_comments;
use crate::extraction::patterns::{boundary_captures, in_source_order};
use crate::extraction::LanguageExtractor;
use crate::types::FileImportList;

/// `using X;`. A `using static X;` directive never matches: after `static`
/// the pattern expects the terminator.
static USING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|;)\s*using\s+([^;\s]+)\s*;").expect("using pattern is valid")
});

/// `using static X;`
static USING_STATIC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|;)\s*using\s+static\s+([^;\s]+)\s*;").expect("using static pattern is valid")
});

/// Extracts namespaces named by `using` directives in `.cs` files.
pub struct CSharpExtractor;

impl LanguageExtractor for CSharpExtractor {
    fn extensions(&self) -> &[&str] {
        &["cs"]
    }

    fn language_name(&self) -> &str {
        "C#"
    }

    fn extract(&self, _file_path: &str, source: &str) -> Option<FileImportList> {
        let stripped = strip_comments(source);
        let mut imports = Vec::new();
        for line in stripped.lines().filter(|line| line.contains("using")) {
            let mut found = boundary_captures(&USING_RE, line);
            found.extend(boundary_captures(&USING_STATIC_RE, line));
            imports.extend(in_source_order(found));
        }
        Some(imports)
    }
}
