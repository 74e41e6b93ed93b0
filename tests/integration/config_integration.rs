//! Integration tests for the configuration system

use recipe::config::{ConfigLoader, RecipeConfig};
use recipe::{BackendOven, DirectDispatchOven};
use tempfile::TempDir;

#[test]
fn test_config_file_drives_catalog_and_oven() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    std::fs::create_dir_all(root.join("cookbooks")).unwrap();
    std::fs::write(
        root.join("cookbooks/users.toml"),
        r#"
domain = "users"

[[ingredients]]
name = "CreateUser"
required = [{ name = "name", type = "string" }]
"#,
    )
    .unwrap();
    let config_file = root.join("recipe.toml");
    std::fs::write(
        &config_file,
        r#"
cookbooks = ["cookbooks/users.toml"]

[oven]
log_payloads = true

[logging]
level = "warn"
format = "json"
output = "stderr"

[logging.modules]
"recipe::oven" = "trace"
"#,
    )
    .unwrap();

    let config = ConfigLoader::load_from_file(&config_file).unwrap();
    assert!(config.validate().is_ok());
    assert_eq!(config.logging.modules.len(), 1);

    let catalog = config.load_catalog().unwrap();
    assert_eq!(catalog.cookbook_for("CreateUser").unwrap().domain(), "users");

    let oven = DirectDispatchOven::with_settings(BackendOven::new(), config.oven.clone());
    assert!(!oven.backend().has_hook("CreateUser"));
}

#[test]
fn test_invalid_file_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("recipe.toml");
    std::fs::write(&config_file, "cookbooks = 7\n").unwrap();
    assert!(ConfigLoader::load_from_file(&config_file).is_err());

    assert!(ConfigLoader::load_from_file(&temp_dir.path().join("missing.toml")).is_err());
}

#[test]
fn test_defaults_validate() {
    let config = ConfigLoader::defaults().unwrap();
    assert_eq!(config, RecipeConfig::default());
    assert!(config.validate().is_ok());
}
