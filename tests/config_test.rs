use importmap::config::*;
use tempfile::TempDir;

#[test]
fn test_default_config_matches_dataset_layout() {
    let config = ImportMapConfig::default();
    assert_eq!(config.strip_prefix_segments, DEFAULT_STRIP_SEGMENTS);
    assert_eq!(config.strip_prefix_segments, 4);
    assert!(config.exclude.is_empty());
    assert!(config.filter_duplicates);
    assert_eq!(config.discovery.min_stars, 2);
    assert_eq!(config.discovery.start_date, "2008-01-01");
}

#[test]
fn test_save_and_load_config() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILENAME);
    let mut config = ImportMapConfig::default();
    config.exclude = vec!["vendor/**".to_string()];
    config.discovery.max_projects = 500;

    save_config(&path, &config).unwrap();
    assert!(!dir.path().join("importmap.json.tmp").exists());
    assert!(std::fs::read_to_string(&path).unwrap().ends_with("}\n"));
    let loaded = load_config(Some(&path)).unwrap();
    assert_eq!(config, loaded);
}

#[test]
fn test_missing_config_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let loaded = load_config(Some(&dir.path().join("absent.json"))).unwrap();
    assert_eq!(loaded, ImportMapConfig::default());
    assert_eq!(load_config(None).unwrap(), ImportMapConfig::default());
}

#[test]
fn test_partial_config_fills_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILENAME);
    std::fs::write(
        &path,
        r#"{"min_file_imports": 3, "discovery": {"min_stars": 10}}"#,
    )
    .unwrap();

    let loaded = load_config(Some(&path)).unwrap();
    assert_eq!(loaded.min_file_imports, 3);
    assert_eq!(loaded.discovery.min_stars, 10);
    assert_eq!(loaded.discovery.max_stars, 1_000_000);
    assert_eq!(loaded.max_projects_per_script, 10_000);
}

#[test]
fn test_invalid_config_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILENAME);
    std::fs::write(&path, "{ not json").unwrap();
    let err = load_config(Some(&path)).unwrap_err();
    assert!(err.to_string().contains("failed to parse config file"));
}

#[test]
fn test_save_config_creates_parent_and_overwrites() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested/conf").join(CONFIG_FILENAME);
    save_config(&path, &ImportMapConfig::default()).unwrap();

    let mut changed = ImportMapConfig::default();
    changed.min_project_files = 5;
    save_config(&path, &changed).unwrap();
    assert_eq!(load_config(Some(&path)).unwrap().min_project_files, 5);
}

#[test]
fn test_is_excluded() {
    let config = ImportMapConfig {
        exclude: vec!["tests/**".to_string(), "*_pb2.py".to_string()],
        ..ImportMapConfig::default()
    };
    assert!(is_excluded("tests/unit/test_a.py", &config));
    assert!(is_excluded("proto/api_pb2.py", &config));
    assert!(!is_excluded("src/main.py", &config));
    assert!(!is_excluded("src/main.py", &ImportMapConfig::default()));
}
