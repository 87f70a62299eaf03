use std::fs;
use tempfile::TempDir;

/// Test loading settings from a YAML file
#[test]
fn test_load_yaml_config() {
    let yaml = r#"
series_num: 12
close_deadline_ms: 2000
decay_interval_ms: 15000
max_attempts: 5
strategy: epsilon_greedy

pool:
  max_conns: 16
  max_idle_conns: 4
  connect_timeout_ms: 2500
"#;

    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("poolmux.yaml");
    fs::write(&config_path, yaml).unwrap();

    let settings = poolmux::config::load_from_yaml(&config_path).unwrap();

    assert_eq!(settings.series_num, 12);
    assert_eq!(settings.close_deadline_ms, 2000);
    assert_eq!(settings.decay_interval_ms, 15000);
    assert_eq!(settings.max_attempts, 5);
    assert_eq!(settings.strategy, "epsilon_greedy");
    assert_eq!(settings.pool.max_conns, 16);
    assert_eq!(settings.pool.max_idle_conns, 4);
    assert_eq!(settings.pool.connect_timeout_ms, 2500);

    // Unspecified pool fields fall back to defaults
    assert_eq!(settings.pool.max_idle_time_ms, 90_000);
}

/// Missing fields are filled with defaults
#[test]
fn test_load_partial_yaml_config() {
    let yaml = r#"
strategy: softmax
"#;

    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("poolmux.yaml");
    fs::write(&config_path, yaml).unwrap();

    let settings = poolmux::config::load_from_yaml(&config_path).unwrap();

    assert_eq!(settings.strategy, "softmax");
    assert_eq!(settings.series_num, poolmux::config::DEFAULT_SERIES_NUM);
    assert_eq!(settings.max_attempts, poolmux::config::DEFAULT_MAX_ATTEMPTS);
    assert_eq!(
        settings.decay_interval_ms,
        poolmux::config::DEFAULT_DECAY_INTERVAL_MS
    );
}

/// Invalid values are rejected at load time
#[test]
fn test_load_invalid_yaml_config() {
    let yaml = r#"
decay_interval_ms: 0
"#;

    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("poolmux.yaml");
    fs::write(&config_path, yaml).unwrap();

    assert!(poolmux::config::load_from_yaml(&config_path).is_err());
}

/// Missing file reports an error rather than silently defaulting
#[test]
fn test_load_missing_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("does-not-exist.yaml");

    assert!(poolmux::config::load_from_yaml(&config_path).is_err());
}

/// Environment variables drive the env loader, including the
/// no-path fallback in load_config
#[test]
fn test_load_from_env() {
    // Valid and invalid cases share one test body: env vars are
    // process-global and the harness runs tests in parallel
    std::env::set_var("POOLMUX_SERIES_NUM", "6");
    std::env::set_var("POOLMUX_MAX_ATTEMPTS", "9");
    std::env::set_var("POOLMUX_STRATEGY", "epsilon_greedy");
    std::env::set_var("POOLMUX_POOL_MAX_CONNS", "48");

    let settings = poolmux::config::load_from_env().unwrap();
    assert_eq!(settings.series_num, 6);
    assert_eq!(settings.max_attempts, 9);
    assert_eq!(settings.strategy, "epsilon_greedy");
    assert_eq!(settings.pool.max_conns, 48);

    // Untouched fields keep their defaults
    assert_eq!(
        settings.decay_interval_ms,
        poolmux::config::DEFAULT_DECAY_INTERVAL_MS
    );

    // load_config without a path falls through to the environment
    let settings = poolmux::config::load_config(None).unwrap();
    assert_eq!(settings.strategy, "epsilon_greedy");
    assert_eq!(settings.series_num, 6);

    // Non-integer values are rejected with an error
    std::env::set_var("POOLMUX_MAX_ATTEMPTS", "plenty");
    assert!(poolmux::config::load_from_env().is_err());

    for key in [
        "POOLMUX_SERIES_NUM",
        "POOLMUX_MAX_ATTEMPTS",
        "POOLMUX_STRATEGY",
        "POOLMUX_POOL_MAX_CONNS",
    ] {
        std::env::remove_var(key);
    }
}

/// A runtime configuration can be assembled from loaded settings
#[test]
fn test_runtime_config_from_settings() {
    let settings = poolmux::ServiceSettings {
        strategy: "softmax".to_string(),
        max_attempts: 7,
        ..Default::default()
    };

    let config = poolmux::ServiceConfig::from_settings(&settings);
    assert_eq!(config.max_attempts, 7);
    assert!(config.strategy.requires_scores());

    let settings = poolmux::ServiceSettings::default();
    let config = poolmux::ServiceConfig::from_settings(&settings);
    // The default strategy is label-only round-robin
    assert!(!config.strategy.requires_scores());
}
