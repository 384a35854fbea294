use std::io::Write;
use std::time::Duration;

use super::*;

#[test]
fn empty_file_uses_defaults() {
    let config = ServeConfig::parse("").unwrap();
    assert_eq!(config.logging.level, "info");
    assert!(!config.logging.json);
    assert_eq!(config.plugin.operation_timeout(), Duration::from_secs(30));
    assert_eq!(config.redis.pool_size, 10);
    assert_eq!(config.redis.connection_timeout_seconds, 5);
}

#[test]
fn custom_sections() {
    let toml = r#"
        [logging]
        level = "tfredis_provider=debug,info"
        json = true

        [plugin]
        operation_timeout_seconds = 90

        [redis]
        pool_size = 4
        connection_timeout_seconds = 2
    "#;

    let config = ServeConfig::parse(toml).unwrap();
    assert_eq!(config.logging.level, "tfredis_provider=debug,info");
    assert!(config.logging.json);
    assert_eq!(config.plugin.operation_timeout_seconds, 90);

    let redis = config.redis.to_redis_config();
    assert_eq!(redis.pool_size, 4);
    assert_eq!(redis.connection_timeout, Duration::from_secs(2));
}

#[test]
fn partial_sections_keep_remaining_defaults() {
    let config = ServeConfig::parse("[redis]\npool_size = 2\n").unwrap();
    assert_eq!(config.redis.pool_size, 2);
    assert_eq!(config.redis.connection_timeout_seconds, 5);
    assert_eq!(config.plugin.operation_timeout_seconds, 30);
}

#[test]
fn malformed_toml_is_a_config_error() {
    let err = ServeConfig::parse("[plugin]\noperation_timeout_seconds = \"soon\"\n").unwrap_err();
    assert!(matches!(err, ServerError::Config(_)));
}

#[test]
fn zero_operation_timeout_is_rejected() {
    let err = ServeConfig::parse("[plugin]\noperation_timeout_seconds = 0\n").unwrap_err();
    assert_eq!(
        err.to_string(),
        "configuration error: plugin.operation_timeout_seconds must be at least 1"
    );
}

#[test]
fn missing_file_means_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = ServeConfig::load(dir.path().join("absent.toml")).unwrap();
    assert_eq!(config.plugin.operation_timeout_seconds, 30);
}

#[test]
fn load_reads_the_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[logging]\njson = true").unwrap();
    let config = ServeConfig::load(file.path()).unwrap();
    assert!(config.logging.json);
}
