use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Ordered import identifiers of a single source file, in order of appearance.
pub type FileImportList = Vec<String>;

/// Normalized relative file path mapped to that file's imports.
///
/// A `BTreeMap` keeps serialization byte-identical across runs over the same
/// tree.
pub type ProjectImportMap = BTreeMap<String, FileImportList>;

/// Project identifier mapped to its import map, as stored in dataset archives.
pub type DatasetImportMap = BTreeMap<String, ProjectImportMap>;

/// Languages with a dedicated import extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageTag {
    Python,
    JavaScript,
    Java,
    CSharp,
    Php,
    Ruby,
}

#[allow(clippy::should_implement_trait)]
impl LanguageTag {
    /// All supported languages.
    pub const ALL: [LanguageTag; 6] = [
        LanguageTag::Python,
        LanguageTag::JavaScript,
        LanguageTag::Java,
        LanguageTag::CSharp,
        LanguageTag::Php,
        LanguageTag::Ruby,
    ];

    /// Returns the tag string used on the command line and in search queries.
    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageTag::Python => "python",
            LanguageTag::JavaScript => "javascript",
            LanguageTag::Java => "java",
            LanguageTag::CSharp => "csharp",
            LanguageTag::Php => "php",
            LanguageTag::Ruby => "ruby",
        }
    }

    /// Parses a tag case-insensitively, returning `None` for unrecognized values.
    ///
    /// `typescript` is an alias of `javascript`, whose extractor scans both.
    pub fn from_str(s: &str) -> Option<LanguageTag> {
        match s.trim().to_ascii_lowercase().as_str() {
            "python" => Some(LanguageTag::Python),
            "javascript" | "typescript" => Some(LanguageTag::JavaScript),
            "java" => Some(LanguageTag::Java),
            "csharp" => Some(LanguageTag::CSharp),
            "php" => Some(LanguageTag::Php),
            "ruby" => Some(LanguageTag::Ruby),
            _ => None,
        }
    }
}

impl std::fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A repository found by the discovery crawl.
///
/// Field names match the `gitGrab.json` format consumed by the crawl-script
/// generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoRecord {
    pub full_name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    pub git_url: String,
    pub stars: u64,
    pub watchers: u64,
    pub forks: u64,
    pub created: String,
    /// Repository size in kilobytes.
    pub size: u64,
    #[serde(default)]
    pub license: String,
    pub language: Option<String>,
    /// Either `[language]` or, in full mode, a map of language to byte count.
    pub languages: serde_json::Value,
    pub last_updated: String,
}

impl RepoRecord {
    /// Splits `owner/name` into its owner and the remaining name.
    pub fn owner_and_name(&self) -> (&str, &str) {
        match self.full_name.split_once('/') {
            Some((owner, name)) => (owner, name),
            None => (self.full_name.as_str(), ""),
        }
    }
}

/// Counts reported by the dataset assembler.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DatasetSummary {
    /// Number of `datasetNN` directories assembled.
    pub dataset_count: usize,
    /// Total projects written across all archives.
    pub project_count: usize,
    /// Project files that could not be read or decoded.
    pub skipped_files: usize,
}

/// Counts reported by the filter/dedup stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterSummary {
    /// Number of raw archives processed.
    pub archive_count: usize,
    /// Projects left after dropping sparse files and projects.
    pub raw_projects: usize,
    /// Projects left after duplicate removal.
    pub dedup_projects: usize,
}
