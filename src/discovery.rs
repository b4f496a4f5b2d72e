//! Repository discovery through the GitHub search API.
//!
//! The search API returns at most 1000 results per query, so the crawl walks
//! creation dates one day at a time and splits busy days into star ranges
//! until every query fits.
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::config::DiscoveryConfig;
use crate::errors::{ImportMapError, Result};
use crate::types::RepoRecord;

/// Maximum number of results the search API serves for one query.
pub const SEARCH_RESULT_CAP: u64 = 1000;

/// Results requested per search page.
const PER_PAGE: usize = 100;

/// Upper star bound of the first range tried when a day has too many results.
const FIRST_SPLIT_MAX_STARS: u64 = 4;

/// Seconds to wait after a failed rate-limit probe.
const RATE_PROBE_RETRY_SECS: u64 = 5;

const USER_AGENT: &str = concat!("importmap/", env!("CARGO_PKG_VERSION"));

/// API token used for every GitHub request.
#[derive(Clone)]
pub struct Credentials {
    token: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials").finish_non_exhaustive()
    }
}

impl Credentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// Reads the token from `GITHUB_TOKEN`, falling back to the configured key file.
    pub fn load(config: &DiscoveryConfig) -> Result<Self> {
        if let Ok(token) = std::env::var("GITHUB_TOKEN") {
            if !token.trim().is_empty() {
                return Ok(Self::new(token.trim()));
            }
        }

        let contents =
            fs::read_to_string(&config.api_key_file).map_err(|e| ImportMapError::Config {
                message: format!(
                    "no GITHUB_TOKEN set and failed to read key file '{}': {}",
                    config.api_key_file, e
                ),
            })?;
        let token = contents.trim();
        if token.is_empty() {
            return Err(ImportMapError::Config {
                message: format!("key file '{}' is empty", config.api_key_file),
            });
        }
        Ok(Self::new(token))
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

/// A repository search backend.
pub trait RepoSearch {
    /// Total number of repositories matching `query`.
    fn count(&mut self, query: &str) -> Result<u64>;

    /// Repositories matching `query`, at most `limit` of them when non-zero.
    fn fetch(&mut self, query: &str, limit: usize) -> Result<Vec<RepoRecord>>;
}

// ---------------------------------------------------------------------------
// GitHub client
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SearchResponse {
    total_count: u64,
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    full_name: String,
    description: Option<String>,
    #[serde(default)]
    topics: Vec<String>,
    #[serde(default)]
    git_url: String,
    stargazers_count: u64,
    watchers_count: u64,
    forks_count: u64,
    created_at: String,
    size: u64,
    language: Option<String>,
    updated_at: String,
    license: Option<LicenseInfo>,
}

#[derive(Debug, Deserialize)]
struct LicenseInfo {
    key: String,
}

#[derive(Debug, Deserialize)]
struct RateLimitResponse {
    resources: RateResources,
}

#[derive(Debug, Deserialize)]
struct RateResources {
    core: RateWindow,
    search: RateWindow,
}

#[derive(Debug, Deserialize)]
struct RateWindow {
    remaining: u64,
    reset: i64,
}

/// Blocking GitHub REST client that waits out rate limits.
pub struct GitHubClient {
    agent: ureq::Agent,
    credentials: Credentials,
    config: DiscoveryConfig,
}

impl GitHubClient {
    pub fn new(credentials: Credentials, config: DiscoveryConfig) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(60)))
            .build()
            .into();
        Self {
            agent,
            credentials,
            config,
        }
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str, params: &[(&str, &str)]) -> Result<T> {
        let url = format!("{}{}", self.config.api_url.trim_end_matches('/'), path);
        let mut request = self
            .agent
            .get(&url)
            .header("Authorization", format!("token {}", self.credentials.token()))
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", USER_AGENT);
        for (key, value) in params {
            request = request.query(*key, *value);
        }
        let mut response = request.call()?;
        Ok(response.body_mut().read_json::<T>()?)
    }

    /// Blocks until both the core and the search quota have headroom.
    fn wait_for_quota(&self) -> Result<()> {
        let core_threshold = if self.config.full { 100 } else { 50 };
        let mut announced = false;
        let mut failures = 0;
        loop {
            match self.get_json::<RateLimitResponse>("/rate_limit", &[]) {
                Ok(limits) => {
                    let core = &limits.resources.core;
                    let search = &limits.resources.search;
                    if core.remaining >= core_threshold && search.remaining >= 5 {
                        return Ok(());
                    }
                    if !announced {
                        tracing::info!(
                            core_remaining = core.remaining,
                            core_reset = core.reset,
                            search_remaining = search.remaining,
                            search_reset = search.reset,
                            "cooling down until the rate limit resets"
                        );
                        announced = true;
                    }
                    thread::sleep(Duration::from_secs(self.config.cooldown_secs));
                }
                Err(err) => {
                    failures += 1;
                    if failures > self.config.max_retries {
                        return Err(ImportMapError::Discovery {
                            message: format!("rate limit probe kept failing: {err}"),
                            query: "/rate_limit".to_string(),
                        });
                    }
                    tracing::debug!("rate limit probe failed: {err}");
                    thread::sleep(Duration::from_secs(RATE_PROBE_RETRY_SECS));
                }
            }
        }
    }

    /// Runs `op` after waiting for quota, retrying failures.
    fn with_retries<T>(&self, query: &str, mut op: impl FnMut(&Self) -> Result<T>) -> Result<T> {
        let mut attempt = 0;
        loop {
            self.wait_for_quota()?;
            match op(self) {
                Ok(value) => return Ok(value),
                Err(err) if attempt < self.config.max_retries => {
                    attempt += 1;
                    tracing::warn!(query, attempt, "request failed, retrying: {err}");
                    thread::sleep(Duration::from_secs(self.config.retry_secs));
                }
                Err(err) => {
                    return Err(ImportMapError::Discovery {
                        message: format!("giving up after {attempt} retries: {err}"),
                        query: query.to_string(),
                    })
                }
            }
        }
    }

    fn search_page(&self, query: &str, page: usize) -> Result<SearchResponse> {
        let per_page = PER_PAGE.to_string();
        let page = page.to_string();
        self.with_retries(query, |client| {
            client.get_json(
                "/search/repositories",
                &[
                    ("q", query),
                    ("per_page", per_page.as_str()),
                    ("page", page.as_str()),
                ],
            )
        })
    }

    fn languages(&self, full_name: &str) -> Result<serde_json::Value> {
        let path = format!("/repos/{full_name}/languages");
        self.with_retries(&path, |client| client.get_json(&path, &[]))
    }

    fn to_record(&self, item: SearchItem) -> RepoRecord {
        let languages = if self.config.full {
            match self.languages(&item.full_name) {
                Ok(languages) => languages,
                Err(err) => {
                    tracing::debug!(repo = %item.full_name, "no language breakdown: {err}");
                    serde_json::json!([item.language])
                }
            }
        } else {
            serde_json::json!([item.language])
        };
        RepoRecord {
            full_name: item.full_name,
            description: item.description,
            topics: item.topics,
            git_url: item.git_url,
            stars: item.stargazers_count,
            watchers: item.watchers_count,
            forks: item.forks_count,
            created: item.created_at,
            size: item.size,
            license: item.license.map(|l| l.key).unwrap_or_default(),
            language: item.language,
            languages,
            last_updated: item.updated_at,
        }
    }
}

impl RepoSearch for GitHubClient {
    fn count(&mut self, query: &str) -> Result<u64> {
        Ok(self.search_page(query, 1)?.total_count)
    }

    fn fetch(&mut self, query: &str, limit: usize) -> Result<Vec<RepoRecord>> {
        let max_pages = SEARCH_RESULT_CAP as usize / PER_PAGE;
        let mut records = Vec::new();
        for page in 1..=max_pages {
            let response = self.search_page(query, page)?;
            let page_len = response.items.len();
            for item in response.items {
                if self.config.max_size_kb > 0 && item.size > self.config.max_size_kb {
                    tracing::info!(
                        repo = %item.full_name,
                        size_kb = item.size,
                        "skipping oversized project"
                    );
                    continue;
                }
                records.push(self.to_record(item));
                if limit > 0 && records.len() >= limit {
                    return Ok(records);
                }
            }
            if page_len < PER_PAGE {
                break;
            }
        }
        Ok(records)
    }
}

// ---------------------------------------------------------------------------
// Crawl
// ---------------------------------------------------------------------------

/// Language qualifier of every search query.
///
/// `javascript` also searches TypeScript; `all` searches every language.
pub fn base_query(language: &str) -> String {
    match language {
        "all" => String::new(),
        "javascript" => "language:javascript language:typescript".to_string(),
        other => format!("language:{other}"),
    }
}

/// Query for repositories created on `day` with stars in `min..=max`.
pub fn day_query(base: &str, min_stars: u64, max_stars: u64, day: NaiveDate) -> String {
    let query = format!(
        "{} stars:{}..{} created:{}",
        base,
        min_stars,
        max_stars,
        day.format("%Y-%m-%d")
    );
    query.trim_start().to_string()
}

/// Output file of a crawl.
pub fn output_path(basedir: &Path, full: bool) -> PathBuf {
    basedir.join(if full { "gitGrabFull.json" } else { "gitGrab.json" })
}

/// Fetches everything created on `day`, appending to `repos`.
///
/// Returns the number of repositories added.
pub fn crawl_day<S: RepoSearch>(
    search: &mut S,
    base: &str,
    day: NaiveDate,
    config: &DiscoveryConfig,
    repos: &mut Vec<RepoRecord>,
) -> Result<usize> {
    let before = repos.len();
    let query = day_query(base, config.min_stars, config.max_stars, day);
    let count = search.count(&query)?;
    tracing::debug!(%query, count, "day total");

    if count < SEARCH_RESULT_CAP {
        fetch_into(search, &query, config, repos)?;
        return Ok(repos.len() - before);
    }

    let mut lower = config.min_stars;
    let mut upper = config.min_stars.max(FIRST_SPLIT_MAX_STARS);
    while lower <= config.max_stars {
        let query = day_query(base, lower, upper, day);
        let count = search.count(&query)?;
        tracing::debug!(%query, count, "splitting star range");
        if count >= SEARCH_RESULT_CAP && upper > lower {
            upper -= ((upper - lower) / 2).max(1);
            continue;
        }
        fetch_into(search, &query, config, repos)?;
        lower = upper + 1;
        upper = config.max_stars;
    }
    Ok(repos.len() - before)
}

fn fetch_into<S: RepoSearch>(
    search: &mut S,
    query: &str,
    config: &DiscoveryConfig,
    repos: &mut Vec<RepoRecord>,
) -> Result<()> {
    let limit = if config.max_projects > 0 {
        match config.max_projects.checked_sub(repos.len()) {
            Some(0) | None => return Ok(()),
            Some(remaining) => remaining,
        }
    } else {
        0
    };
    repos.extend(search.fetch(query, limit)?);
    Ok(())
}

/// Crawls every creation day from `today` back to the configured start date.
///
/// Intermediate results are written every `dump_every_days` days; the final
/// list is written to [`output_path`] and returned.
pub fn discover<S: RepoSearch>(
    search: &mut S,
    basedir: &Path,
    language: &str,
    config: &DiscoveryConfig,
    today: NaiveDate,
) -> Result<Vec<RepoRecord>> {
    let start = NaiveDate::parse_from_str(&config.start_date, "%Y-%m-%d").map_err(|e| {
        ImportMapError::Config {
            message: format!("invalid start_date '{}': {}", config.start_date, e),
        }
    })?;
    let base = base_query(language);
    let out_path = output_path(basedir, config.full);
    fs::create_dir_all(basedir)?;

    let mut repos = Vec::new();
    let mut day = today;
    let mut walked = 0usize;
    while day >= start {
        let added = crawl_day(search, &base, day, config, &mut repos)?;

        if config.max_projects > 0 && repos.len() >= config.max_projects {
            repos.truncate(config.max_projects);
            break;
        }

        walked += 1;
        if config.dump_every_days > 0 && walked % config.dump_every_days == 0 {
            tracing::info!(total = repos.len(), added, "writing intermediate results");
            write_repos(&out_path, &repos)?;
        }

        day = match day.pred_opt() {
            Some(previous) => previous,
            None => break,
        };
    }

    write_repos(&out_path, &repos)?;
    tracing::info!(total = repos.len(), path = %out_path.display(), "discovery finished");
    Ok(repos)
}

fn write_repos(path: &Path, repos: &[RepoRecord]) -> Result<()> {
    let json = serde_json::to_string(repos)?;
    fs::write(path, json).map_err(|e| ImportMapError::File {
        message: format!("failed to write repository list: {e}"),
        path: path.display().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_query() {
        assert_eq!(base_query("python"), "language:python");
        assert_eq!(
            base_query("javascript"),
            "language:javascript language:typescript"
        );
        assert_eq!(base_query("all"), "");
    }

    #[test]
    fn test_day_query_without_language() {
        let day = NaiveDate::from_ymd_opt(2019, 3, 7).unwrap();
        assert_eq!(day_query("", 2, 10, day), "stars:2..10 created:2019-03-07");
    }

    #[test]
    fn test_credentials_debug_hides_token() {
        let creds = Credentials::new("secret-token");
        assert!(!format!("{creds:?}").contains("secret"));
    }
}
