use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::config::{is_excluded, ImportMapConfig};
use crate::extraction::LanguageExtractor;

/// A source file selected for extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Location on disk.
    pub path: PathBuf,
    /// The path as reached from the scanned root, `/`-separated, root included.
    pub display_path: String,
}

/// Lists the files below `root` that `extractor` should read, in file-name order.
///
/// Hidden entries, the extractor's excluded directories, files matching the
/// configured exclude patterns and files larger than `max_file_size` are
/// skipped. A `root` that is itself inside an excluded directory yields
/// nothing.
pub fn scan_sources(
    root: &Path,
    extractor: &dyn LanguageExtractor,
    config: &ImportMapConfig,
) -> Vec<SourceFile> {
    let excluded_dirs = extractor.excluded_dirs();
    if root
        .components()
        .any(|c| excluded_dirs.iter().any(|d| c.as_os_str() == *d))
    {
        return Vec::new();
    }

    let root_display = display_root(root);
    let mut files = Vec::new();
    for entry in WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| keep_entry(e, excluded_dirs))
    {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                tracing::debug!("skipping unreadable entry: {err}");
                continue;
            }
        };
        if !entry.file_type().is_file() || !has_extension(entry.path(), extractor.extensions()) {
            continue;
        }

        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        let rel_str = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        if is_excluded(&rel_str, config) {
            continue;
        }
        match entry.metadata() {
            Ok(metadata) if metadata.len() <= config.max_file_size => {}
            Ok(metadata) => {
                tracing::debug!(
                    path = %entry.path().display(),
                    size = metadata.len(),
                    limit = config.max_file_size,
                    "skipping oversized file"
                );
                continue;
            }
            Err(err) => {
                tracing::debug!(path = %entry.path().display(), "skipping file without metadata: {err}");
                continue;
            }
        }

        let display_path = if root_display.is_empty() {
            rel_str
        } else if root_display.ends_with('/') {
            format!("{root_display}{rel_str}")
        } else {
            format!("{root_display}/{rel_str}")
        };
        files.push(SourceFile {
            path: entry.into_path(),
            display_path,
        });
    }
    files
}

/// Reads a whole file, replacing undecodable bytes.
///
/// Returns `None` when the file cannot be read.
pub fn read_source(path: &Path) -> Option<String> {
    match std::fs::read(path) {
        Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        Err(err) => {
            tracing::debug!(path = %path.display(), "skipping unreadable file: {err}");
            None
        }
    }
}

/// Drops the first `strip` `/`-separated segments of `path`.
///
/// `normalize_path("dataset01/owner/project/root/src/a.py", 4)` is `"src/a.py"`.
pub fn normalize_path(path: &str, strip: usize) -> String {
    path.split('/').skip(strip).collect::<Vec<_>>().join("/")
}

/// The root as given by the caller, `/`-separated, without trailing slashes.
fn display_root(root: &Path) -> String {
    let display = root.to_string_lossy().replace('\\', "/");
    let trimmed = display.trim_end_matches('/');
    if trimmed.is_empty() && display.starts_with('/') {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Skips hidden entries and excluded directories below the root.
fn keep_entry(entry: &DirEntry, excluded_dirs: &[&str]) -> bool {
    if entry.depth() == 0 {
        return true;
    }
    let name = entry.file_name().to_string_lossy();
    if name.starts_with('.') {
        return false;
    }
    !(entry.file_type().is_dir() && excluded_dirs.iter().any(|d| name == *d))
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.contains(&ext))
}
