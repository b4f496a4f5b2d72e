use std::path::Path;

use crate::config::ImportMapConfig;
use crate::errors::Result;
use crate::extraction::{extract_tree, extractor_for};
use crate::types::{LanguageTag, ProjectImportMap};

/// Extractor selection for one invocation.
///
/// Unknown tags are kept as an explicit variant instead of silently mapping to
/// a no-op, so callers can report them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    Language(LanguageTag),
    Unknown(String),
}

impl Dispatch {
    /// Selects the extractor for a language tag.
    pub fn from_tag(tag: &str) -> Self {
        match LanguageTag::from_str(tag) {
            Some(language) => Dispatch::Language(language),
            None => Dispatch::Unknown(tag.to_string()),
        }
    }

    /// Runs the selected extractor over `root`.
    ///
    /// An unknown tag yields an empty map.
    pub fn extract(&self, root: &Path, config: &ImportMapConfig) -> ProjectImportMap {
        match self {
            Dispatch::Language(language) => {
                let imports = extract_tree(root, extractor_for(*language), config);
                tracing::info!(
                    root = %root.display(),
                    language = %language,
                    files = imports.len(),
                    "extracted imports"
                );
                imports
            }
            Dispatch::Unknown(tag) => {
                tracing::warn!(tag = %tag, "unsupported language tag; nothing extracted");
                ProjectImportMap::new()
            }
        }
    }
}

/// Serializes an import map as one compact JSON object.
///
/// Returns `None` for an empty map, which is emitted as no output at all.
pub fn render_json(imports: &ProjectImportMap) -> Result<Option<String>> {
    if imports.is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::to_string(imports)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_tag() {
        assert_eq!(Dispatch::from_tag("php"), Dispatch::Language(LanguageTag::Php));
        assert_eq!(
            Dispatch::from_tag("TypeScript"),
            Dispatch::Language(LanguageTag::JavaScript)
        );
        assert_eq!(Dispatch::from_tag("cobol"), Dispatch::Unknown("cobol".to_string()));
    }

    #[test]
    fn test_render_empty_map_is_silent() {
        assert_eq!(render_json(&ProjectImportMap::new()).unwrap(), None);
    }

    #[test]
    fn test_render_is_compact_json() {
        let mut imports = ProjectImportMap::new();
        imports.insert("a.py".to_string(), vec!["os".to_string(), "os:path".to_string()]);
        assert_eq!(
            render_json(&imports).unwrap().unwrap(),
            r#"{"a.py":["os","os:path"]}"#
        );
    }
}
