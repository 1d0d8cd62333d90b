use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use proview::config::{Config, ConfigError, Overrides, ENV_PREFIX};
use std::fs;
use tempfile::tempdir;

#[test]
fn test_config_load_defaults() {
    // figment directly, without the Env layer
    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .extract()
        .unwrap();
    assert_eq!(config, Config::default());
    assert_eq!(config.search.min_query_len, 2);
    assert_eq!(config.duplicates.progress_interval, 10);
}

#[test]
fn test_config_load_from_env() {
    std::env::set_var("PROVIEW_SEARCH__MAX_DIRS", "77");
    std::env::set_var("PROVIEW_DUPLICATES__CHUNK_SIZE", "4096");

    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .unwrap();

    assert_eq!(config.search.max_dirs, 77);
    assert_eq!(config.duplicates.chunk_size, 4096);
    assert_eq!(config.search.max_matches, 200);

    std::env::remove_var("PROVIEW_SEARCH__MAX_DIRS");
    std::env::remove_var("PROVIEW_DUPLICATES__CHUNK_SIZE");
}

#[test]
fn test_config_load_from_toml() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(
        &config_path,
        r#"
workers = 6

[search]
max_matches = 25
skip_hidden = true

[delete]
permanent = true
"#,
    )
    .unwrap();

    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(&config_path))
        .extract()
        .unwrap();

    assert_eq!(config.workers, 6);
    assert_eq!(config.search.max_matches, 25);
    assert!(config.search.skip_hidden);
    assert!(!config.duplicates.skip_hidden);
    assert!(config.delete.permanent);
}

#[test]
fn test_explicit_missing_config_is_an_error() {
    let temp_dir = tempdir().unwrap();
    let missing = temp_dir.path().join("absent.toml");

    let err = Config::load(Some(&missing), &Overrides::default()).unwrap_err();
    assert!(matches!(err, ConfigError::NotFound(ref p) if *p == missing));
    assert!(err.to_string().contains("absent.toml"));
}

#[test]
fn test_malformed_toml_is_invalid() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("config.toml");
    fs::write(&path, "[search\nmax_matches = 1").unwrap();

    let err = Config::load(Some(&path), &Overrides::default()).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn test_cli_overrides_win_over_file() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("config.toml");
    fs::write(&path, "workers = 2\n[duplicates]\nmin_size = 10\n").unwrap();

    let overrides = Overrides {
        workers: Some(5),
        min_size: Some(2048),
        ..Overrides::default()
    };
    let config = Config::load(Some(&path), &overrides).unwrap();

    assert_eq!(config.workers, 5);
    assert_eq!(config.duplicates.min_size, 2048);
}

#[test]
fn test_saved_config_loads_back() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("dir/config.toml");

    let mut config = Config::default();
    config.search.max_matches = 12;
    config.delete.permanent = true;
    config.save_to(&path).unwrap();

    let loaded = Config::load(Some(&path), &Overrides::default()).unwrap();
    assert_eq!(loaded.search.max_matches, 12);
    assert!(loaded.delete.permanent);
}
