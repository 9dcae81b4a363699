//! Integration tests for detective-core infrastructure

use detective_core::{
    config_error, init_logging, storage_error, validation_error, DetectiveConfig, DetectiveError,
    ErrorContext, LogFormat, LoggingConfig,
};

#[test]
fn test_error_handling() {
    let error = storage_error!("Disk full", "test_component");

    match &error {
        DetectiveError::Storage {
            message, context, ..
        } => {
            assert_eq!(message, "Disk full");
            assert_eq!(context.component, "test_component");
            assert!(!context.error_id.is_empty());
        }
        _ => panic!("Expected Storage error"),
    }

    // Should not panic
    error.log();

    let config_error = config_error!("Invalid config", "test");
    assert_eq!(config_error.suggestions().len(), 2);

    let validation = validation_error!("too short", "api_key", "test");
    match validation {
        DetectiveError::Validation { field, .. } => assert_eq!(field.as_deref(), Some("api_key")),
        _ => panic!("Expected Validation error"),
    }
}

#[test]
fn test_message_strips_category_prefix() {
    let error = DetectiveError::Network {
        message: "Request failed: 401 Unauthorized".to_string(),
        source: None,
        context: ErrorContext::new("test"),
    };

    assert_eq!(error.message(), "Request failed: 401 Unauthorized");
    assert_eq!(
        error.to_string(),
        "Network error: Request failed: 401 Unauthorized"
    );
}

#[test]
fn test_error_context_builder() {
    let context = ErrorContext::new("gemini_client")
        .with_operation("generate_content")
        .with_metadata("status", "401")
        .with_suggestion("Re-enter your API key");

    assert_eq!(context.operation.as_deref(), Some("generate_content"));
    assert_eq!(context.metadata.get("status").map(String::as_str), Some("401"));
    assert_eq!(context.recovery_suggestions.len(), 1);
}

#[test]
fn test_logging_initialization() {
    let config = LoggingConfig {
        level: "debug".to_string(),
        format: LogFormat::Compact,
        filter_directives: vec!["detective_core=debug".to_string()],
        ..LoggingConfig::default()
    };

    // The global subscriber can only be set once per process; a second call must
    // report an error instead of panicking.
    let _ = init_logging(&config);
    assert!(init_logging(&config).is_err());
}

#[test]
fn test_config_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut config = DetectiveConfig::default();
    config.analysis.model = "gemini-2.0-flash".to_string();
    config.storage.data_dir = dir.path().to_string_lossy().to_string();
    config.save_to_file(&path).unwrap();

    let loaded = DetectiveConfig::load(Some(&path)).unwrap();
    assert_eq!(loaded.analysis.model, "gemini-2.0-flash");
    assert_eq!(loaded.storage.store_path(), dir.path().join("local_storage.json"));
    assert!(loaded.validate().is_ok());
}

#[test]
fn test_config_without_logging_section_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[analysis]
model = "gemini-2.5-flash"
base_url = "https://generativelanguage.googleapis.com"
temperature = 0.2
timeout_seconds = 30
user_agent = "test"

[storage]
data_dir = "/tmp/detective"
store_file = "store.json"
"#,
    )
    .unwrap();

    let config = DetectiveConfig::from_file(&path).unwrap();
    assert_eq!(config.logging.level, "warn");
    assert_eq!(config.analysis.timeout_seconds, 30);
}

#[test]
fn test_config_validation() {
    let mut config = DetectiveConfig::default();
    config.analysis.temperature = 3.5;
    assert!(matches!(
        config.validate(),
        Err(DetectiveError::Config { .. })
    ));

    let mut config = DetectiveConfig::default();
    config.analysis.model = "  ".to_string();
    assert!(config.validate().is_err());

    let mut config = DetectiveConfig::default();
    config.analysis.base_url = "generativelanguage.googleapis.com".to_string();
    assert!(config.validate().is_err());

    let mut config = DetectiveConfig::default();
    config.analysis.timeout_seconds = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_missing_config_file_is_config_error() {
    let result = DetectiveConfig::from_file("/nonexistent/detective.toml");
    match result {
        Err(DetectiveError::Config { context, .. }) => {
            assert_eq!(context.operation.as_deref(), Some("read_file"));
        }
        other => panic!("Expected Config error, got {:?}", other.map(|_| ())),
    }
}
