use std::path::PathBuf;
use std::time::Duration;

use polyrun::Language;
use polyrun::config::Config;

use super::FIXTURES_PATH;

#[test]
fn test_load_valid_config() {
    let path = format!("{FIXTURES_PATH}/configs/valid_full.toml");
    let config = Config::from_file(&path).expect("Failed to load config");

    assert_eq!(config.base_dir, PathBuf::from("/tmp/polyrun-jobs"));
    assert_eq!(config.compile_timeout(), Duration::from_secs(20));
    assert_eq!(config.exec_timeout(), Duration::from_secs(2));
    assert_eq!(config.max_inputs, 50);
    assert_eq!(config.expected_key(), "s3cret");

    let registry = config.registry();
    assert_eq!(
        registry.get(Language::Python).run_template(),
        ["python3", "-I", "{source}"]
    );
    assert!(
        registry
            .get(Language::Cpp)
            .compile_template()
            .is_some_and(|argv| argv.contains(&"-std=c++17".to_owned()))
    );
}

#[test]
fn test_load_minimal_config() {
    let path = format!("{FIXTURES_PATH}/configs/valid_minimal.toml");
    let config = Config::from_file(&path).expect("Failed to load config");

    assert_eq!(config.exec_timeout(), Duration::from_secs(5));
    assert_eq!(config.max_code_size, 10_000);
    assert!(config.secret_key.is_none());
}

#[test]
fn test_load_invalid_zero_timeout() {
    let path = format!("{FIXTURES_PATH}/configs/invalid_zero_timeout.toml");
    assert!(Config::from_file(&path).is_err());
}

#[test]
fn test_load_invalid_empty_run_command() {
    let path = format!("{FIXTURES_PATH}/configs/invalid_empty_run_command.toml");
    assert!(Config::from_file(&path).is_err());
}
