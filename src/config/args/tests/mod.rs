#![cfg(test)]

use std::io::Write;

use tempfile::NamedTempFile;

use crate::config::args::config_file::{DEFAULT_CONCURRENCY, DEFAULT_MAX_RETRIES};
use crate::config::args::*;

const CONFIG_WITH_CREDENTIALS: &str = r#"{
    "source": {"access_key": "source_access_key", "secret_key": "source_secret_key", "region": "us-east-1", "bucket": "source-bucket"},
    "destination": {"access_key": "target_access_key", "secret_key": "target_secret_key", "region": "ap-northeast-1", "bucket": "target-bucket"},
    "concurrency": 20,
    "max_retries": 5
}"#;

const CONFIG_WITHOUT_OPTIONAL_VALUES: &str = r#"{
    "source": {"bucket": "source-bucket"},
    "destination": {"bucket": "target-bucket", "region": ""}
}"#;

#[test]
fn build_from_config_file() {
    init_dummy_tracing_subscriber();

    let config_file = write_config_file(CONFIG_WITH_CREDENTIALS);
    let args = vec![
        "s3mirror",
        "--config",
        config_file.path().to_str().unwrap(),
    ];

    let config = build_config_from_args(args).unwrap();

    assert_eq!(config.source.bucket, "source-bucket");
    assert_eq!(config.target.bucket, "target-bucket");
    assert_eq!(config.concurrency, 20);
    assert_eq!(config.max_keys, DEFAULT_MAX_KEYS);
    assert!(!config.dry_run);
    assert!(!config.show_no_progress);

    let source_client_config = &config.source.client_config;
    assert_eq!(source_client_config.region.as_deref(), Some("us-east-1"));
    assert_eq!(source_client_config.retry_config.aws_max_attempts, 5);
    assert_eq!(
        source_client_config.retry_config.initial_backoff_milliseconds,
        DEFAULT_INITIAL_BACKOFF_MILLISECONDS
    );
    assert!(source_client_config.endpoint_url.is_none());
    assert!(!source_client_config.force_path_style);

    if let S3Credentials::Credentials { access_keys } = &source_client_config.credential {
        assert_eq!(access_keys.access_key, "source_access_key");
        assert_eq!(access_keys.secret_access_key, "source_secret_key");
    } else {
        // skipcq: RS-W1021
        assert!(false, "no credential");
    }

    let target_client_config = &config.target.client_config;
    assert_eq!(target_client_config.region.as_deref(), Some("ap-northeast-1"));
    if let S3Credentials::Credentials { access_keys } = &target_client_config.credential {
        assert_eq!(access_keys.access_key, "target_access_key");
        assert_eq!(access_keys.secret_access_key, "target_secret_key");
    } else {
        // skipcq: RS-W1021
        assert!(false, "no credential");
    }

    let tracing_config = config.tracing_config.unwrap();
    assert_eq!(tracing_config.tracing_level, log::Level::Warn);
    assert!(!tracing_config.json_tracing);
}

#[test]
fn build_with_default_values() {
    init_dummy_tracing_subscriber();

    let config_file = write_config_file(CONFIG_WITHOUT_OPTIONAL_VALUES);
    let args = vec![
        "s3mirror",
        "--config",
        config_file.path().to_str().unwrap(),
    ];

    let config = build_config_from_args(args).unwrap();

    assert_eq!(config.concurrency, DEFAULT_CONCURRENCY);
    assert_eq!(
        config.source.client_config.retry_config.aws_max_attempts,
        DEFAULT_MAX_RETRIES
    );
    assert!(matches!(
        config.source.client_config.credential,
        S3Credentials::FromEnvironment
    ));
    assert!(config.source.client_config.region.is_none());
    assert!(config.target.client_config.region.is_none());
}

#[test]
fn build_with_cli_overrides() {
    init_dummy_tracing_subscriber();

    let config_file = write_config_file(CONFIG_WITH_CREDENTIALS);
    let args = vec![
        "s3mirror",
        "--config",
        config_file.path().to_str().unwrap(),
        "--concurrency",
        "64",
        "--max-retries",
        "9",
        "--initial-backoff-milliseconds",
        "500",
        "--max-keys",
        "100",
        "--source-endpoint-url",
        "http://localhost:9000",
        "--source-force-path-style",
        "--target-endpoint-url",
        "http://localhost:9001",
        "--target-force-path-style",
        "--show-no-progress",
    ];

    let config = build_config_from_args(args).unwrap();

    assert_eq!(config.concurrency, 64);
    assert_eq!(config.max_keys, 100);
    assert!(config.show_no_progress);
    assert_eq!(config.source.client_config.retry_config.aws_max_attempts, 9);
    assert_eq!(config.target.client_config.retry_config.aws_max_attempts, 9);
    assert_eq!(
        config
            .target
            .client_config
            .retry_config
            .initial_backoff_milliseconds,
        500
    );
    assert_eq!(
        config.source.client_config.endpoint_url.as_deref(),
        Some("http://localhost:9000")
    );
    assert!(config.source.client_config.force_path_style);
    assert_eq!(
        config.target.client_config.endpoint_url.as_deref(),
        Some("http://localhost:9001")
    );
    assert!(config.target.client_config.force_path_style);
}

#[test]
fn build_dry_run_raises_tracing_level() {
    init_dummy_tracing_subscriber();

    let config_file = write_config_file(CONFIG_WITH_CREDENTIALS);
    let args = vec![
        "s3mirror",
        "--config",
        config_file.path().to_str().unwrap(),
        "--dry-run",
    ];
    let config = build_config_from_args(args).unwrap();
    assert!(config.dry_run);
    assert_eq!(
        config.tracing_config.unwrap().tracing_level,
        log::Level::Info
    );

    let args = vec![
        "s3mirror",
        "--config",
        config_file.path().to_str().unwrap(),
        "--dry-run",
        "-qq",
    ];
    let config = build_config_from_args(args).unwrap();
    assert_eq!(
        config.tracing_config.unwrap().tracing_level,
        log::Level::Info
    );

    let args = vec![
        "s3mirror",
        "--config",
        config_file.path().to_str().unwrap(),
        "--dry-run",
        "-vv",
    ];
    let config = build_config_from_args(args).unwrap();
    assert_eq!(
        config.tracing_config.unwrap().tracing_level,
        log::Level::Debug
    );
}

#[test]
fn build_tracing_options() {
    init_dummy_tracing_subscriber();

    let config_file = write_config_file(CONFIG_WITH_CREDENTIALS);
    let args = vec![
        "s3mirror",
        "--config",
        config_file.path().to_str().unwrap(),
        "-v",
        "--json-tracing",
        "--aws-sdk-tracing",
        "--span-events-tracing",
        "--disable-color-tracing",
    ];
    let config = build_config_from_args(args).unwrap();
    let tracing_config = config.tracing_config.unwrap();
    assert_eq!(tracing_config.tracing_level, log::Level::Info);
    assert!(tracing_config.json_tracing);
    assert!(tracing_config.aws_sdk_tracing);
    assert!(tracing_config.span_events_tracing);
    assert!(tracing_config.disable_color_tracing);

    let args = vec![
        "s3mirror",
        "--config",
        config_file.path().to_str().unwrap(),
        "-qq",
    ];
    let config = build_config_from_args(args).unwrap();
    assert!(config.tracing_config.is_none());
}

#[test]
fn build_error_incomplete_credentials() {
    init_dummy_tracing_subscriber();

    let config_file = write_config_file(
        r#"{"source": {"access_key": "ak", "bucket": "a"}, "destination": {"bucket": "b"}}"#,
    );
    let args = vec![
        "s3mirror",
        "--config",
        config_file.path().to_str().unwrap(),
    ];
    assert_eq!(
        build_config_from_args(args).unwrap_err(),
        SOURCE_CREDENTIAL_INCOMPLETE
    );

    let config_file = write_config_file(
        r#"{"source": {"bucket": "a"}, "destination": {"secret_key": "sk", "bucket": "b"}}"#,
    );
    let args = vec![
        "s3mirror",
        "--config",
        config_file.path().to_str().unwrap(),
    ];
    assert_eq!(
        build_config_from_args(args).unwrap_err(),
        DESTINATION_CREDENTIAL_INCOMPLETE
    );
}

#[test]
fn build_error_missing_config_file() {
    init_dummy_tracing_subscriber();

    let args = vec!["s3mirror", "--config", "./no_such_dir/config.json"];
    assert!(build_config_from_args(args).is_err());
}

#[test]
fn parse_error_invalid_values() {
    init_dummy_tracing_subscriber();

    assert!(parse_from_args(vec!["s3mirror", "--concurrency", "0"]).is_err());
    assert!(parse_from_args(vec!["s3mirror", "--max-retries", "0"]).is_err());
    assert!(parse_from_args(vec!["s3mirror", "--max-keys", "0"]).is_err());
    assert!(parse_from_args(vec!["s3mirror", "--max-keys", "32768"]).is_err());
    assert!(parse_from_args(vec!["s3mirror", "--source-endpoint-url", ""]).is_err());
}

fn write_config_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn init_dummy_tracing_subscriber() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("dummy=trace")
        .try_init();
}
