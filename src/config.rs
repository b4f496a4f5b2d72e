use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use glob::Pattern;
use serde::{Deserialize, Serialize};

use crate::errors::{ImportMapError, Result};

/// Conventional name of a configuration file in a dataset base directory.
pub const CONFIG_FILENAME: &str = "importmap.json";

/// Number of leading path segments removed from file paths by default.
///
/// Matches the `datasetNN/<owner>/<project>/<archive-root>/` nesting the
/// crawl scripts produce.
pub const DEFAULT_STRIP_SEGMENTS: usize = 4;

/// Configuration for the whole import-dataset pipeline.
///
/// Every field has a default, so a config file only needs to name what it
/// overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportMapConfig {
    /// Schema version of the configuration.
    pub version: u32,
    /// Leading path segments stripped from every file path in an import map.
    pub strip_prefix_segments: usize,
    /// Glob patterns (relative to the scanned root) for files to skip.
    pub exclude: Vec<String>,
    /// Maximum file size in bytes; larger files are skipped.
    pub max_file_size: u64,
    /// Minimum number of imports a file needs to stay in the dataset.
    pub min_file_imports: usize,
    /// Minimum number of remaining files a project needs to stay in the dataset.
    pub min_project_files: usize,
    /// Whether to drop projects whose import sets duplicate an earlier project.
    pub filter_duplicates: bool,
    /// Projects per generated crawl script (and per `datasetNN` directory).
    pub max_projects_per_script: usize,
    /// Generate `git clone` based crawl scripts instead of tarball downloads.
    pub git_clone: bool,
    /// Repository discovery settings.
    pub discovery: DiscoveryConfig,
}

/// Settings for crawling the GitHub search API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// File holding the API token, used when `GITHUB_TOKEN` is unset.
    pub api_key_file: String,
    /// Base URL of the GitHub REST API.
    pub api_url: String,
    pub min_stars: u64,
    pub max_stars: u64,
    /// Skip repositories larger than this many kilobytes (0 = no limit).
    pub max_size_kb: u64,
    /// Stop after this many repositories (0 = no limit).
    pub max_projects: usize,
    /// Fetch per-repository language breakdowns.
    pub full: bool,
    /// Oldest creation date crawled, `YYYY-MM-DD`.
    pub start_date: String,
    /// Seconds to wait when the rate limit is nearly exhausted.
    pub cooldown_secs: u64,
    /// Seconds to wait before retrying a failed request.
    pub retry_secs: u64,
    pub max_retries: u32,
    /// Write intermediate results every this many crawled days.
    pub dump_every_days: usize,
}

impl Default for ImportMapConfig {
    fn default() -> Self {
        Self {
            version: 1,
            strip_prefix_segments: DEFAULT_STRIP_SEGMENTS,
            exclude: Vec::new(),
            max_file_size: 10 * 1_048_576,
            min_file_imports: 1,
            min_project_files: 1,
            filter_duplicates: true,
            max_projects_per_script: 10_000,
            git_clone: false,
            discovery: DiscoveryConfig::default(),
        }
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            api_key_file: "apikey.txt".to_string(),
            api_url: "https://api.github.com".to_string(),
            min_stars: 2,
            max_stars: 1_000_000,
            max_size_kb: 0,
            max_projects: 0,
            full: false,
            start_date: "2008-01-01".to_string(),
            cooldown_secs: 60,
            retry_secs: 30,
            max_retries: 10,
            dump_every_days: 7,
        }
    }
}

/// Loads the configuration from `path`.
///
/// Returns the default configuration when no path is given or the file does
/// not exist.
pub fn load_config(path: Option<&Path>) -> Result<ImportMapConfig> {
    let Some(path) = path else {
        return Ok(ImportMapConfig::default());
    };
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(ImportMapConfig::default());
        }
        Err(err) => return Err(config_error("read", path, err)),
    };
    serde_json::from_str(&contents).map_err(|err| config_error("parse", path, err))
}

/// Writes the configuration as pretty JSON.
///
/// The JSON is staged next to `path` and renamed into place.
pub fn save_config(path: &Path, config: &ImportMapConfig) -> Result<()> {
    let mut json = serde_json::to_string_pretty(config)?;
    json.push('\n');

    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|err| config_error("create the directory of", path, err))?;
    }
    let staging = staging_path(path);
    fs::write(&staging, json).map_err(|err| config_error("stage", path, err))?;
    fs::rename(&staging, path).map_err(|err| config_error("replace", path, err))
}

/// `importmap.json` is staged as `importmap.json.tmp`.
fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}

fn config_error(action: &str, path: &Path, err: impl std::fmt::Display) -> ImportMapError {
    ImportMapError::Config {
        message: format!("failed to {action} config file '{}': {err}", path.display()),
    }
}

/// Returns `true` if `file_path` (relative to the scanned root) matches one of
/// the configured exclude patterns.
///
/// Invalid patterns never match.
pub fn is_excluded(file_path: &str, config: &ImportMapConfig) -> bool {
    let match_opts = glob::MatchOptions {
        case_sensitive: true,
        require_literal_separator: false,
        require_literal_leading_dot: false,
    };

    config.exclude.iter().any(|pattern_str| {
        Pattern::new(pattern_str)
            .map(|pattern| pattern.matches_with(file_path, match_opts))
            .unwrap_or(false)
    })
}
