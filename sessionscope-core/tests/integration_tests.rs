//! Integration tests for sessionscope-core infrastructure

use std::time::Duration;
use tokio::time::sleep;
use sessionscope_core::{
    config_error, init_logging, invariant_error, not_found_error, retrieval_error,
    try_join_ordered, unauthorized_error, with_timeout, ErrorSurface, LogFormat, LoggingConfig,
    ScopeConfig, ScopeError,
};

#[tokio::test]
async fn test_error_handling() {
    let error = unauthorized_error!("entity type not supported", "gate");

    match &error {
        ScopeError::Unauthorized { message, context } => {
            assert_eq!(message, "entity type not supported");
            assert_eq!(context.component, "gate");
            assert!(!context.error_id.is_empty());
        }
        _ => panic!("Expected Unauthorized error"),
    }

    // Logging should not panic without a subscriber
    error.log();

    assert_eq!(error.surface(), ErrorSurface::AccessDenied);
    assert!(!error.is_retryable());

    let failure = retrieval_error!("backend unavailable", "retriever");
    assert_eq!(failure.surface(), ErrorSurface::ServerError);
    assert!(failure.is_retryable());

    let violation = invariant_error!("duplicate membership", "shaping");
    assert_eq!(violation.surface(), ErrorSurface::ServerError);
    assert!(!violation.is_retryable());

    let missing = not_found_error!("course CS999", "selector");
    assert_eq!(missing.surface(), ErrorSurface::NotFound);
    assert!(missing.to_string().contains("CS999"));
}

#[tokio::test]
async fn test_config_error_macro_has_suggestions() {
    match config_error!("bad value", "loader") {
        ScopeError::Config { context, .. } => {
            assert_eq!(context.component, "loader");
            assert!(!context.recovery_suggestions.is_empty());
        }
        _ => panic!("Expected Config error"),
    }
}

#[tokio::test]
async fn test_logging_initialization() {
    let config = LoggingConfig {
        level: "debug".to_string(),
        format: LogFormat::Compact,
        include_location: false,
        include_thread: false,
        log_to_file: false,
        log_file_path: None,
        enable_performance_monitoring: false,
        filter_directives: vec!["sessionscope_core=debug".to_string()],
    };

    // The first call installs the subscriber; a second one must fail, not panic
    let _ = init_logging(&config);
    assert!(init_logging(&config).is_err());
}

#[tokio::test]
async fn test_timeout_mechanism() {
    let quick = async {
        sleep(Duration::from_millis(5)).await;
        Ok::<_, ScopeError>("Success")
    };
    let result = with_timeout(quick, 200, "quick_test").await;
    assert_eq!(result.unwrap(), "Success");

    let slow = async {
        sleep(Duration::from_millis(200)).await;
        Ok::<_, ScopeError>("Should not reach here")
    };
    match with_timeout(slow, 20, "slow_test").await {
        Err(ScopeError::RetrievalFailure { message, context, .. }) => {
            assert!(message.contains("slow_test"));
            assert_eq!(context.metadata.get("timeout_ms").map(String::as_str), Some("20"));
        }
        other => panic!("Expected RetrievalFailure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_timeout_passes_inner_error_through() {
    let failing = async { Err::<(), _>(retrieval_error!("store offline", "test")) };
    match with_timeout(failing, 100, "failing").await {
        Err(ScopeError::RetrievalFailure { message, .. }) => assert_eq!(message, "store offline"),
        other => panic!("Expected inner RetrievalFailure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_ordered_join_preserves_input_order() {
    let items: Vec<u64> = (1..=6).collect();

    // Later items finish first; output must still follow input order
    let results = try_join_ordered(items, 3, |item| async move {
        sleep(Duration::from_millis(30 - item * 4)).await;
        Ok::<u64, ScopeError>(item * 10)
    })
    .await
    .unwrap();

    assert_eq!(results, vec![10, 20, 30, 40, 50, 60]);
}

#[tokio::test]
async fn test_ordered_join_fails_fast() {
    let items = vec!["CS101", "CS102", "CS103"];

    let result = try_join_ordered(items, 2, |course| async move {
        if course == "CS102" {
            Err(retrieval_error!(format!("{} unavailable", course), "test"))
        } else {
            Ok(course.to_string())
        }
    })
    .await;

    match result {
        Err(ScopeError::RetrievalFailure { message, .. }) => {
            assert_eq!(message, "CS102 unavailable");
        }
        other => panic!("Expected RetrievalFailure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_config_round_trip_and_validation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sessionscope.toml");

    let mut config = ScopeConfig::default();
    config.retrieval.max_concurrent_courses = 2;
    config.save_to_file(&path).unwrap();

    let loaded = ScopeConfig::from_file(&path).unwrap();
    assert_eq!(loaded.retrieval.max_concurrent_courses, 2);
    assert_eq!(loaded.retrieval.backend_timeout_ms, 5_000);

    config.retrieval.backend_timeout_ms = 0;
    match config.validate() {
        Err(ScopeError::Config { message, .. }) => assert!(message.contains("backend_timeout_ms")),
        other => panic!("Expected Config error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_partial_config_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("partial.toml");
    std::fs::write(&path, "[retrieval]\nmax_concurrent_courses = 1\n").unwrap();

    let loaded = ScopeConfig::from_file(&path).unwrap();
    assert_eq!(loaded.retrieval.max_concurrent_courses, 1);
    assert_eq!(loaded.logging.level, "info");
}
