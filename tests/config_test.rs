//! Integration tests for Settings config loading with layered merge semantics.
//!
//! Merge Semantics:
//! - Defaults → Global → Local: scalars REPLACE when the overlay sets them
//! - Any → Env vars: REPLACE (explicit user override)
//!
//! Note: These tests write local configs into temp directories only.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use bubbletree::application::ApplicationError;
use bubbletree::config::{local_config_path, Settings};
use bubbletree::domain::{ForestOrder, UnresolvedPolicy};

// ============================================================
// Settings::load() local config tests
// ============================================================

#[test]
fn given_no_local_config_when_load_then_defaults() {
    let catalog_dir = TempDir::new().unwrap();

    let settings = Settings::load(Some(catalog_dir.path())).expect("load settings");

    assert_eq!(settings.search.limit, 15);
    assert_eq!(settings.search.root_placeholder, "Searching on root...");
}

#[test]
fn given_local_config_when_load_then_overrides_scalars() {
    // Arrange: local config next to the catalog
    let catalog_dir = TempDir::new().unwrap();
    let local_config = r#"
unresolved = "reject"
order = "label-desc"

[search]
limit = 30
"#;
    fs::write(local_config_path(catalog_dir.path()), local_config).unwrap();

    // Act
    let settings = Settings::load(Some(catalog_dir.path())).expect("load settings");

    // Assert: set values replaced, unset values keep defaults
    assert_eq!(settings.unresolved, UnresolvedPolicy::Reject);
    assert_eq!(settings.order, ForestOrder::LabelDesc);
    assert_eq!(settings.search.limit, 30);
    assert_eq!(settings.search.within_placeholder, "Searching in ");
}

#[test]
fn given_local_catalog_with_tilde_when_load_then_expanded() {
    let catalog_dir = TempDir::new().unwrap();
    fs::write(
        local_config_path(catalog_dir.path()),
        "catalog = \"~/items.toml\"\n",
    )
    .unwrap();

    let settings = Settings::load(Some(catalog_dir.path())).expect("load settings");

    let catalog = settings.catalog.expect("catalog set");
    assert!(!catalog.starts_with("~"), "tilde not expanded: {}", catalog.display());
    assert!(catalog.ends_with("items.toml"));
}

#[test]
fn given_invalid_enum_value_when_load_then_config_error() {
    let catalog_dir = TempDir::new().unwrap();
    fs::write(
        local_config_path(catalog_dir.path()),
        "unresolved = \"sometimes\"\n",
    )
    .unwrap();

    let result = Settings::load(Some(catalog_dir.path()));

    assert!(matches!(result, Err(ApplicationError::Config { .. })));
}

#[test]
fn given_malformed_toml_when_load_then_config_error_names_file() {
    let catalog_dir = TempDir::new().unwrap();
    let path = local_config_path(catalog_dir.path());
    fs::write(&path, "[search\nlimit = 1\n").unwrap();

    let err = Settings::load(Some(catalog_dir.path())).unwrap_err();

    assert!(err.to_string().contains(".bubbletree.toml"), "got: {err}");
}

// ============================================================
// Serialization
// ============================================================

#[test]
fn given_settings_when_to_toml_then_parses_back() {
    let settings = Settings {
        catalog: Some(PathBuf::from("/data/items.toml")),
        order: ForestOrder::Id,
        ..Settings::default()
    };

    let rendered = settings.to_toml().unwrap();

    assert!(rendered.contains("order = \"id\""));
    assert!(rendered.contains("unresolved = \"warn\""));
    let parsed: Settings = toml::from_str(&rendered).unwrap();
    assert_eq!(parsed, settings);
}

#[test]
fn given_template_when_parsed_then_equals_defaults() {
    let parsed: Settings = toml::from_str(&Settings::template()).unwrap();
    assert_eq!(parsed, Settings::default());
}

// ============================================================
// Settings::load_for_catalog()
// ============================================================

#[test]
fn given_cli_catalog_when_load_for_catalog_then_local_config_next_to_it() {
    // Arrange
    let catalog_dir = TempDir::new().unwrap();
    fs::write(
        local_config_path(catalog_dir.path()),
        "order = \"id-desc\"\n",
    )
    .unwrap();
    let catalog = catalog_dir.path().join("items.toml");

    // Act
    let settings = Settings::load_for_catalog(Some(&catalog)).expect("load settings");

    // Assert
    assert_eq!(settings.order, ForestOrder::IdDesc);
}
