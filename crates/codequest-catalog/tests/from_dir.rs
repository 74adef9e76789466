//! Loading catalogs from a directory of YAML files.

#![allow(clippy::unwrap_used)]

use codequest_catalog::{Catalog, CatalogError};
use codequest_types::{EnvironmentSnapshot, Technology};

const FIXTURE_CSS: &str = r#"
technology: css
levels:
  - id: 1
    title: "Red heading"
    task: "Make the heading red"
    hint: "color: red"
    concept: "color sets text color"
    solution: "h1 { color: red; }"
    difficulty: beginner
    category: Colors
    xp_reward: 10
    environment: { kind: stylesheet, element: "h1" }
  - id: 2
    title: "Blue heading"
    task: "Make the heading blue"
    hint: "color: blue"
    concept: "color sets text color"
    solution: ["h1 { color: blue; }", "h1 { color: #00f; }"]
    difficulty: beginner
    category: Colors
    xp_reward: 20
    environment: { kind: stylesheet, element: "h1" }
"#;

#[test]
fn directory_file_replaces_builtin_track() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("css.yaml"), FIXTURE_CSS).unwrap();

    let catalog = Catalog::from_dir(dir.path()).unwrap();

    assert_eq!(catalog.count(Technology::Css), 2);
    let level = catalog.get_level(Technology::Css, 2).unwrap();
    assert_eq!(level.solutions.len(), 2);
    assert!(matches!(level.environment, EnvironmentSnapshot::Stylesheet(_)));
}

#[test]
fn missing_files_fall_back_to_builtin() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = Catalog::from_dir(dir.path()).unwrap();
    assert_eq!(catalog, Catalog::builtin().unwrap());
}

#[test]
fn invalid_file_is_reported_with_its_technology() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("docker.yaml"), "technology: [not, valid").unwrap();

    let result = Catalog::from_dir(dir.path());
    assert!(matches!(
        result,
        Err(CatalogError::Yaml {
            technology: Technology::Docker,
            ..
        })
    ));
}
