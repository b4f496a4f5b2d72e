//! Assembly of per-project import maps into gzip-compressed dataset archives.
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::de::DeserializeOwned;
use serde::Serialize;
use walkdir::WalkDir;

use crate::errors::{ImportMapError, Result};
use crate::types::{DatasetImportMap, DatasetSummary, ProjectImportMap};

/// Directory holding the extracted import maps of dataset `ds`.
pub fn dataset_dir(basedir: &Path, ds: usize) -> PathBuf {
    basedir.join(format!("dataset{ds:02}"))
}

/// Path of the raw archive assembled from dataset `ds`.
pub fn raw_archive_path(basedir: &Path, ds: usize) -> PathBuf {
    basedir.join("raw").join(format!("raw-import-ds{ds:02}.json.gz"))
}

/// Reads a gzip-compressed JSON document.
pub fn load_json_gz<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).map_err(|e| ImportMapError::Dataset {
        message: format!("failed to open archive: {e}"),
        path: path.display().to_string(),
    })?;
    serde_json::from_reader(GzDecoder::new(BufReader::new(file))).map_err(|e| {
        ImportMapError::Dataset {
            message: format!("failed to decode archive: {e}"),
            path: path.display().to_string(),
        }
    })
}

/// Writes `value` as pretty-printed, gzip-compressed JSON.
pub fn store_json_gz<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(path).map_err(|e| ImportMapError::Dataset {
        message: format!("failed to create archive: {e}"),
        path: path.display().to_string(),
    })?;
    let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
    serde_json::to_writer_pretty(&mut encoder, value)?;
    encoder.finish()?;
    Ok(())
}

/// Loads every project import map below `dir`.
///
/// Projects are keyed by their path relative to `basedir`, without the
/// `.json` extension. Returns the projects and the number of files skipped
/// because they were empty or unreadable.
pub fn load_dataset(basedir: &Path, dir: &Path) -> (DatasetImportMap, usize) {
    let mut projects = DatasetImportMap::new();
    let mut skipped = 0;
    for entry in WalkDir::new(dir).sort_by_file_name().into_iter().flatten() {
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().and_then(|e| e.to_str()) != Some("json")
        {
            continue;
        }
        let name = path
            .strip_prefix(basedir)
            .unwrap_or(path)
            .with_extension("")
            .to_string_lossy()
            .replace('\\', "/");

        match read_project(path) {
            Ok(Some(imports)) => {
                projects.insert(name, imports);
            }
            Ok(None) => {
                tracing::debug!(project = %name, "empty import map");
                skipped += 1;
            }
            Err(err) => {
                tracing::warn!(project = %name, "problem with project file: {err}");
                skipped += 1;
            }
        }
    }
    (projects, skipped)
}

fn read_project(path: &Path) -> Result<Option<ProjectImportMap>> {
    let contents = fs::read_to_string(path)?;
    if contents.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(&contents)?))
}

/// Assembles `datasetNN` directories into raw archives, for NN = 01, 02, …
/// until the first missing directory.
pub fn assemble_datasets(basedir: &Path) -> Result<DatasetSummary> {
    let mut summary = DatasetSummary::default();
    let mut ds = 1;
    loop {
        let dir = dataset_dir(basedir, ds);
        if !dir.is_dir() {
            break;
        }
        tracing::info!(dataset = ds, "loading dataset");
        let (projects, skipped) = load_dataset(basedir, &dir);

        let archive = raw_archive_path(basedir, ds);
        tracing::info!(dataset = ds, projects = projects.len(), path = %archive.display(), "dumping dataset");
        store_json_gz(&archive, &projects)?;

        summary.dataset_count += 1;
        summary.project_count += projects.len();
        summary.skipped_files += skipped;
        ds += 1;
    }
    Ok(summary)
}
