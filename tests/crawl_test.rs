use std::fs;

use importmap::config::ImportMapConfig;
use importmap::crawl::{load_repos, render_script, script_path, write_crawl_scripts};
use importmap::types::RepoRecord;
use tempfile::TempDir;

fn repo(full_name: &str, stars: u64) -> RepoRecord {
    RepoRecord {
        full_name: full_name.to_string(),
        description: Some("demo".to_string()),
        topics: vec!["cli".to_string()],
        git_url: format!("git://github.com/{full_name}.git"),
        stars,
        watchers: stars,
        forks: 1,
        created: "2019-05-01T10:00:00Z".to_string(),
        size: 120,
        license: "mit".to_string(),
        language: Some("PHP".to_string()),
        languages: serde_json::json!(["PHP"]),
        last_updated: "2020-05-01T10:00:00Z".to_string(),
    }
}

#[test]
fn test_scripts_are_chunked_by_stars() {
    let dir = TempDir::new().unwrap();
    let repos = vec![
        repo("low/one", 3),
        repo("high/two", 900),
        repo("mid/three", 40),
    ];
    let config = ImportMapConfig {
        max_projects_per_script: 2,
        ..ImportMapConfig::default()
    };

    let scripts = write_crawl_scripts(dir.path(), &repos, "tok123", &config).unwrap();
    assert_eq!(scripts, vec![script_path(dir.path(), 1), script_path(dir.path(), 2)]);

    let first = fs::read_to_string(&scripts[0]).unwrap();
    assert!(first.starts_with("#!/bin/bash\n"));
    assert!(first.contains("APIKEY=tok123"));
    let high = first.find("download_git_project 01 high two").unwrap();
    let mid = first.find("download_git_project 01 mid three").unwrap();
    assert!(high < mid);
    assert!(first.contains("echo \"#0 [900 stars] - two\""));
    assert!(!first.contains("low one"));

    let second = fs::read_to_string(&scripts[1]).unwrap();
    assert!(second.contains("download_git_project 02 low one"));
}

#[cfg(unix)]
#[test]
fn test_scripts_are_executable() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let scripts =
        write_crawl_scripts(dir.path(), &[repo("a/b", 5)], "t", &ImportMapConfig::default())
            .unwrap();
    let mode = fs::metadata(&scripts[0]).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o755);
}

#[test]
fn test_tarball_script_handles_rate_limit() {
    let record = repo("acme/widget", 12);
    let script = render_script(3, "key", &ImportMapConfig::default(), &[(0, &record)]);
    assert!(script.contains("https://api.github.com/repos/$projdir/$projname/tarball"));
    assert!(script.contains("API rate limit exceeded"));
    assert!(script.contains("APIKEY=key\n\nfunction download_git_project\n{\n"));
    assert!(script.contains("/tarball\" 2>/dev/null > $fname\n"));
    assert!(script.ends_with("; download_git_project 03 acme widget\n"));
    assert!(!script.contains("git clone"));
}

#[test]
fn test_git_clone_script() {
    let record = repo("acme/widget", 12);
    let config = ImportMapConfig {
        git_clone: true,
        ..ImportMapConfig::default()
    };
    let script = render_script(1, "key", &config, &[(0, &record)]);
    assert!(script.contains("git clone https://github.com/$projdir/$projname.git"));
    assert!(script.contains("tar -czf"));
}

#[test]
fn test_load_repos_roundtrip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("gitGrab.json");
    let repos = vec![repo("x/y", 7)];
    fs::write(&path, serde_json::to_string(&repos).unwrap()).unwrap();
    assert_eq!(load_repos(&path).unwrap(), repos);

    fs::write(&path, "[{").unwrap();
    assert!(load_repos(&path).is_err());
}
