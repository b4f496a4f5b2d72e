//! Java import extractor.
use std::sync::LazyLock;

use regex::Regex;

use crate::extraction::comments::strip_comments;
use crate::extraction::patterns::{boundary_captures, in_source_order};
use crate::extraction::LanguageExtractor;
use crate::types::FileImportList;

/// `import a.b.C;` or `import static a.b.C.d;` at a statement boundary.
static IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|;)\s*import\s+(?:static\s+)?([^;\s]+)\s*;").expect("import pattern is valid")
});

/// Extracts fully qualified import names from `.java` files.
pub struct JavaExtractor;

impl LanguageExtractor for JavaExtractor {
    fn extensions(&self) -> &[&str] {
        &["java"]
    }

    fn language_name(&self) -> &str {
        "Java"
    }

    fn extract(&self, _file_path: &str, source: &str) -> Option<FileImportList> {
        let stripped = strip_comments(source);
        let imports = stripped
            .lines()
            .filter(|line| line.contains("import"))
            .flat_map(|line| in_source_order(boundary_captures(&IMPORT_RE, line)))
            .collect();
        Some(imports)
    }
}
