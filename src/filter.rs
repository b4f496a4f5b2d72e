//! Removal of sparse files, sparse projects and duplicate projects.
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::config::ImportMapConfig;
use crate::dataset::{load_json_gz, store_json_gz};
use crate::errors::{ImportMapError, Result};
use crate::types::{DatasetImportMap, FilterSummary, ProjectImportMap};

/// File-name prefix of raw archives.
const RAW_PREFIX: &str = "raw-import-ds";

/// SHA-256 hex digest of a project's import sets.
///
/// Each file's imports are sorted and `|`-joined, the per-file strings are
/// sorted and `|`-joined again, so two projects hash alike exactly when they
/// import the same things, regardless of file names or import order.
pub fn content_hash(project: &ProjectImportMap) -> String {
    let mut per_file: Vec<String> = project
        .values()
        .map(|imports| {
            let mut sorted: Vec<&str> = imports.iter().map(String::as_str).collect();
            sorted.sort_unstable();
            sorted.join("|")
        })
        .collect();
    per_file.sort_unstable();

    let mut hasher = Sha256::new();
    hasher.update(per_file.join("|").as_bytes());
    hex::encode(hasher.finalize())
}

/// Drops files with fewer than `min_file_imports` imports, then projects with
/// fewer than `min_project_files` remaining files.
pub fn drop_sparse(dataset: DatasetImportMap, config: &ImportMapConfig) -> DatasetImportMap {
    dataset
        .into_iter()
        .map(|(project, files)| {
            let files: ProjectImportMap = files
                .into_iter()
                .filter(|(_, imports)| imports.len() >= config.min_file_imports)
                .collect();
            (project, files)
        })
        .filter(|(_, files)| files.len() >= config.min_project_files)
        .collect()
}

/// Remembers content hashes across archives and drops repeated projects.
#[derive(Debug, Default)]
pub struct Deduplicator {
    seen: HashSet<String>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps the first project (in key order) of every distinct content hash.
    pub fn dedup(&mut self, dataset: DatasetImportMap) -> DatasetImportMap {
        dataset
            .into_iter()
            .filter(|(_, files)| self.seen.insert(content_hash(files)))
            .collect()
    }

    /// Number of distinct projects seen so far.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Raw archives below `basedir/raw`, in name order.
pub fn raw_archives(basedir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = basedir.join("raw").join(format!("{RAW_PREFIX}*.json.gz"));
    let pattern = pattern.to_string_lossy();
    let paths = glob::glob(&pattern).map_err(|e| ImportMapError::Config {
        message: format!("invalid archive pattern '{pattern}': {e}"),
    })?;
    let mut archives: Vec<PathBuf> = paths.flatten().collect();
    archives.sort();
    Ok(archives)
}

/// Output path for the processed counterpart of a raw archive.
pub fn processed_archive_path(basedir: &Path, raw_archive: &Path) -> PathBuf {
    let file_name = raw_archive
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let suffix = file_name.strip_prefix(RAW_PREFIX).unwrap_or(&file_name);
    basedir
        .join("processed")
        .join(format!("projectfileimports.{suffix}"))
}

/// Filters and deduplicates every raw archive below `basedir`.
pub fn filter_datasets(basedir: &Path, config: &ImportMapConfig) -> Result<FilterSummary> {
    let mut summary = FilterSummary::default();
    let mut dedup = Deduplicator::new();

    for archive in raw_archives(basedir)? {
        let dataset: DatasetImportMap = load_json_gz(&archive)?;
        let loaded = dataset.len();

        let mut dataset = drop_sparse(dataset, config);
        summary.raw_projects += dataset.len();
        if config.filter_duplicates {
            dataset = dedup.dedup(dataset);
        }
        summary.dedup_projects += dataset.len();
        summary.archive_count += 1;

        let output = processed_archive_path(basedir, &archive);
        tracing::info!(
            archive = %archive.display(),
            loaded,
            kept = dataset.len(),
            "filtered archive"
        );
        store_json_gz(&output, &dataset)?;
    }

    tracing::info!(
        raw = summary.raw_projects,
        dedup = summary.dedup_projects,
        "import deduplication finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(files: &[(&str, &[&str])]) -> ProjectImportMap {
        files
            .iter()
            .map(|(name, imports)| {
                (
                    name.to_string(),
                    imports.iter().map(|s| s.to_string()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn test_content_hash_ignores_order_and_file_names() {
        let a = project(&[("a.py", &["os", "sys"]), ("b.py", &["json"])]);
        let b = project(&[("x.py", &["json"]), ("y.py", &["sys", "os"])]);
        assert_eq!(content_hash(&a), content_hash(&b));
    }

    #[test]
    fn test_content_hash_differs_for_different_imports() {
        let a = project(&[("a.py", &["os"])]);
        let b = project(&[("a.py", &["sys"])]);
        assert_ne!(content_hash(&a), content_hash(&b));
    }

    #[test]
    fn test_processed_archive_path() {
        let path = processed_archive_path(Path::new("base"), Path::new("base/raw/raw-import-ds03.json.gz"));
        assert_eq!(path, Path::new("base/processed/projectfileimports.03.json.gz"));
    }
}
