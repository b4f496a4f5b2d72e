use std::fs;
use std::path::Path;

use importmap::config::ImportMapConfig;
use importmap::dispatch::{render_json, Dispatch};
use importmap::scan::normalize_path;
use importmap::types::LanguageTag;
use tempfile::TempDir;

/// Config whose path stripping turns keys into paths relative to `root`.
fn config_relative_to(root: &Path) -> ImportMapConfig {
    let root = root.to_string_lossy().replace('\\', "/");
    ImportMapConfig {
        strip_prefix_segments: root.trim_end_matches('/').split('/').count(),
        ..ImportMapConfig::default()
    }
}

fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

#[test]
fn test_empty_directory_yields_empty_map_for_every_language() {
    let dir = TempDir::new().unwrap();
    let config = config_relative_to(dir.path());
    for language in LanguageTag::ALL {
        let imports = Dispatch::Language(language).extract(dir.path(), &config);
        assert!(imports.is_empty(), "{language} produced {imports:?}");
        assert_eq!(render_json(&imports).unwrap(), None);
    }
}

#[test]
fn test_unknown_language_yields_empty_map() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "main.py", "import os\n");
    let config = config_relative_to(dir.path());
    let imports = Dispatch::from_tag("cobol").extract(dir.path(), &config);
    assert!(imports.is_empty());
}

#[test]
fn test_python_project() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "pkg/__init__.py", "");
    write(root, "pkg/core.py", "import os\nfrom os import path\n");
    write(root, "pkg/broken.py", "def broken(:\n    pass\n");
    write(root, "README.md", "import nothing\n");

    let imports = Dispatch::from_tag("python").extract(root, &config_relative_to(root));
    let keys: Vec<&str> = imports.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["pkg/__init__.py", "pkg/core.py"]);
    assert!(imports["pkg/__init__.py"].is_empty());
    assert_eq!(imports["pkg/core.py"], vec!["os:path"]);
}

#[test]
fn test_node_modules_never_scanned() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "src/app.js", "const _ = require('lodash');\n");
    write(root, "node_modules/lodash/index.js", "const x = require('./x');\n");
    write(root, "src/node_modules/dep/lib.ts", "import a from 'b';\n");

    let imports = Dispatch::from_tag("javascript").extract(root, &config_relative_to(root));
    let keys: Vec<&str> = imports.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["src/app.js"]);

    let nested = Dispatch::from_tag("javascript").extract(
        &root.join("node_modules/lodash"),
        &config_relative_to(&root.join("node_modules/lodash")),
    );
    assert!(nested.is_empty());
}

#[test]
fn test_hidden_entries_and_excludes_are_skipped() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, ".venv/lib/site.py", "import site\n");
    write(root, "docs/conf.py", "import sphinx\n");
    write(root, "app.py", "import flask\n");

    let mut config = config_relative_to(root);
    config.exclude = vec!["docs/**".to_string()];
    let imports = Dispatch::from_tag("python").extract(root, &config);
    let keys: Vec<&str> = imports.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["app.py"]);
}

#[test]
fn test_keys_strip_dataset_nesting() {
    let dir = TempDir::new().unwrap();
    let project = dir.path().join("dataset01/owner/proj");
    write(&project, "owner-proj-1a2b3c/lib/util.rb", "require 'set'\n");

    let base_segments = config_relative_to(dir.path()).strip_prefix_segments;
    let config = ImportMapConfig {
        strip_prefix_segments: base_segments + 4,
        ..ImportMapConfig::default()
    };
    let imports = Dispatch::from_tag("ruby").extract(&project, &config);
    assert_eq!(imports["lib/util.rb"], vec!["set"]);
}

#[test]
fn test_extraction_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "b/Two.java", "import java.util.List;\nimport java.util.Map;\n");
    write(root, "a/One.java", "import java.io.File;\n");
    write(root, "c/Three.java", "class Three {}\n");

    let config = config_relative_to(root);
    let first = render_json(&Dispatch::from_tag("java").extract(root, &config)).unwrap();
    let second = render_json(&Dispatch::from_tag("java").extract(root, &config)).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        first.unwrap(),
        r#"{"a/One.java":["java.io.File"],"b/Two.java":["java.util.List","java.util.Map"],"c/Three.java":[]}"#
    );
}

#[test]
fn test_oversized_files_are_skipped() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "small.php", "<?php use A\\B;");
    write(root, "large.php", &format!("<?php use C\\D; // {}", "x".repeat(256)));

    let mut config = config_relative_to(root);
    config.max_file_size = 64;
    let imports = Dispatch::from_tag("php").extract(root, &config);
    let keys: Vec<&str> = imports.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["small.php"]);
    assert_eq!(imports["small.php"], vec!["A/B"]);
}

#[test]
fn test_normalize_path_matches_dataset_convention() {
    assert_eq!(
        normalize_path("dataset01/owner/proj/owner-proj-1a2b/src/main.cs", 4),
        "src/main.cs"
    );
}
