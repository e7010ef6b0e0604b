/*!
 * Tests for application configuration functionality
 */

use log::LevelFilter;

use bimtrans::app_config::{Config, LogLevel};
use bimtrans::translation::{ClientOptions, ModelUpdater, PipelineConfig};

use crate::common::{create_temp_dir, create_test_file};

fn configured() -> Config {
    let mut config = Config::default();
    config.api.api_key = "0000-1111:fx".to_string();
    config
}

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.source_language, "");
    assert_eq!(config.target_language, "fr");
    assert_eq!(config.api.timeout_secs, 30);
    assert_eq!(config.dispatch.max_concurrent_requests, 5);
    assert_eq!(config.dispatch.burst_capacity, 10);
    assert_eq!(config.dispatch.retry_count, 5);
    assert_eq!(config.dispatch.retry_backoff_ms, 1000);
    assert!(config.dispatch.check_usage_before_run);
    assert!(config.write_back.reload_families);
    assert_eq!(config.log_level, LogLevel::Info);
}

/// Test configuration validation
#[test]
fn test_config_validation_withVariousConfigs_shouldValidateCorrectly() {
    let mut config = configured();
    assert!(config.validate().is_ok());

    config.source_language = "xyz".to_string();
    assert!(config.validate().is_err());
    config.source_language = "en".to_string();
    assert!(config.validate().is_ok());

    config.target_language = "".to_string();
    assert!(config.validate().is_err());
    config.target_language = "en-gb".to_string();
    assert!(config.validate().is_ok());

    config.api.timeout_secs = 0;
    assert!(config.validate().is_err());
    config.api.timeout_secs = 10;

    config.dispatch.max_concurrent_requests = 0;
    assert!(config.validate().is_err());
    config.dispatch.max_concurrent_requests = 5;

    config.dispatch.retry_count = 0;
    assert!(config.validate().is_err());
    config.dispatch.retry_count = 5;

    config.dispatch.retry_backoff_ms = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_loadOrCreate_withExistingFile_shouldReadIt() {
    let dir = create_temp_dir().unwrap();
    let path = create_test_file(
        dir.path(),
        "conf.json",
        r##"{
            "target_language": "de",
            "api": { "api_key": "abc", "endpoint": "http://localhost:8080/v2" },
            "dispatch": { "max_concurrent_requests": 3, "usage_poll_secs": 0 },
            "write_back": { "forbidden_characters": "#", "reload_families": false },
            "log_level": "debug"
        }"##,
    )
    .unwrap();

    let config = Config::load_or_create(&path).unwrap();

    assert_eq!(config.target_language, "de");
    assert_eq!(config.resolved_endpoint(), "http://localhost:8080/v2");
    assert_eq!(config.dispatch.max_concurrent_requests, 3);
    assert_eq!(config.dispatch.burst_capacity, 10);
    assert_eq!(config.dispatch.usage_poll_secs, 0);
    assert_eq!(config.write_back.forbidden_characters, "#");
    assert_eq!(LevelFilter::from(config.log_level), LevelFilter::Debug);
}

#[test]
fn test_loadOrCreate_withInvalidJson_shouldFail() {
    let dir = create_temp_dir().unwrap();
    let path = create_test_file(dir.path(), "conf.json", "{ not json").unwrap();

    assert!(Config::load_or_create(&path).is_err());
}

#[test]
fn test_save_thenLoad_shouldPreserveValues() {
    let dir = create_temp_dir().unwrap();
    let path = dir.path().join("conf.json");
    let mut config = configured();
    config.source_language = "en".to_string();
    config.dispatch.retry_backoff_ms = 250;

    config.save(&path).unwrap();
    let loaded = Config::load_or_create(&path).unwrap();

    assert_eq!(loaded.source_language, "en");
    assert_eq!(loaded.api.api_key, "0000-1111:fx");
    assert_eq!(loaded.dispatch.retry_backoff_ms, 250);
}

#[test]
fn test_resolvedEndpoint_withoutOverride_shouldPickTierFromKey() {
    let mut config = configured();
    assert!(config.resolved_endpoint().contains("api-free"));

    config.api.api_key = "0000-1111".to_string();
    assert!(!config.resolved_endpoint().contains("api-free"));
}

#[test]
fn test_derivedSettings_shouldFollowConfig() {
    let mut config = configured();
    config.source_language = "en-us".to_string();
    config.target_language = "deu".to_string();
    config.api.context = "   ".to_string();
    config.dispatch.max_concurrent_requests = 2;
    config.dispatch.usage_poll_secs = 0;
    config.write_back.forbidden_characters = "#".to_string();

    let options = ClientOptions::from_config(&config).unwrap();
    assert_eq!(options.target_lang, "DE");
    assert_eq!(options.source_lang.as_deref(), Some("EN"));
    assert_eq!(options.max_concurrent_requests, 2);
    assert!(options.context.is_none());

    let pipeline = PipelineConfig::from_config(&config.dispatch);
    assert!(pipeline.preflight_usage_check);
    assert!(pipeline.usage_poll_interval.is_none());

    let updater = ModelUpdater::from_config(&config.write_back);
    assert_eq!(updater.forbidden_character("a#b"), Some('#'));
    assert_eq!(updater.forbidden_character("a:b"), None);
}
