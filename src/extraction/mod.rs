//! Per-language import extraction.
//!
//! Python is parsed with tree-sitter; the other languages are matched
//! lexically with statement-boundary regexes, after comment stripping where the
//! language has C-style comments.
pub mod comments;
mod csharp_extractor;
mod java_extractor;
mod javascript_extractor;
mod patterns;
mod php_extractor;
mod python_extractor;
mod ruby_extractor;

use std::path::Path;

pub use csharp_extractor::CSharpExtractor;
pub use java_extractor::JavaExtractor;
pub use javascript_extractor::JavaScriptExtractor;
pub use php_extractor::PhpExtractor;
pub use python_extractor::{ImportOp, ImportStateMachine, PythonExtractor};
pub use ruby_extractor::RubyExtractor;

use crate::config::ImportMapConfig;
use crate::scan::{normalize_path, read_source, scan_sources};
use crate::types::{FileImportList, LanguageTag, ProjectImportMap};

/// Trait for language-specific import extractors.
///
/// Each implementation handles a single language family and turns the text of
/// one file into its ordered import identifiers.
pub trait LanguageExtractor: Send + Sync {
    /// File extensions this extractor handles (without leading dot).
    fn extensions(&self) -> &[&str];

    /// Human-readable language name.
    fn language_name(&self) -> &str;

    /// Directory names whose contents are never scanned.
    fn excluded_dirs(&self) -> &[&str] {
        &[]
    }

    /// Extract the imports of one file.
    ///
    /// `file_path` is only used for diagnostics. Returns `None` when the file
    /// cannot be parsed; such files are left out of the project map.
    fn extract(&self, file_path: &str, source: &str) -> Option<FileImportList>;
}

/// Returns the extractor for a language.
pub fn extractor_for(language: LanguageTag) -> &'static dyn LanguageExtractor {
    match language {
        LanguageTag::Python => &PythonExtractor,
        LanguageTag::JavaScript => &JavaScriptExtractor,
        LanguageTag::Java => &JavaExtractor,
        LanguageTag::CSharp => &CSharpExtractor,
        LanguageTag::Php => &PhpExtractor,
        LanguageTag::Ruby => &RubyExtractor,
    }
}

/// Runs `extractor` over every matching file below `root`.
///
/// Files are read one at a time in file-name order. A file that cannot be
/// read or parsed is skipped without affecting the rest of the scan.
pub fn extract_tree(
    root: &Path,
    extractor: &dyn LanguageExtractor,
    config: &ImportMapConfig,
) -> ProjectImportMap {
    let mut imports = ProjectImportMap::new();
    let files = scan_sources(root, extractor, config);
    tracing::debug!(
        root = %root.display(),
        language = extractor.language_name(),
        files = files.len(),
        "scanning source tree"
    );

    for file in &files {
        let Some(source) = read_source(&file.path) else {
            continue;
        };
        match extractor.extract(&file.display_path, &source) {
            Some(file_imports) => {
                let key = normalize_path(&file.display_path, config.strip_prefix_segments);
                imports.insert(key, file_imports);
            }
            None => tracing::debug!(path = %file.display_path, "no imports recorded"),
        }
    }
    imports
}
