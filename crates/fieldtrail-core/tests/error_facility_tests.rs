use fieldtrail_core::errors::{ExError, ExErrorKind, TrackError};
use fieldtrail_core_types::OperationId;

#[test]
fn test_invalid_pattern_verifiable_by_kind() {
    let err = TrackError::InvalidPattern {
        pattern: "orders.(".to_string(),
        reason: "segment `(` contains irregular character '('".to_string(),
    };

    let ex_err: ExError = err.into();

    assert_eq!(ex_err.kind(), ExErrorKind::InvalidPattern);
    assert_eq!(ex_err.code(), "ERR_INVALID_PATTERN");
    assert_eq!(ex_err.path(), Some("orders.("));
    assert!(ex_err.message().contains("irregular character"));
}

#[test]
fn test_invalid_config_conversion() {
    let err = TrackError::InvalidConfig {
        reason: "ledger_field must not be empty".to_string(),
    };

    let ex_err: ExError = err.into();

    assert_eq!(ex_err.kind(), ExErrorKind::InvalidConfig);
    assert_eq!(ex_err.code(), "ERR_INVALID_CONFIG");
    assert_eq!(ex_err.op(), Some("validate_config"));
}

#[test]
fn test_malformed_ledger_conversion() {
    let err = TrackError::MalformedLedger {
        field: "history".to_string(),
        reason: "invalid type: string, expected a sequence".to_string(),
    };

    let ex_err: ExError = err.into();

    assert_eq!(ex_err.kind(), ExErrorKind::MalformedLedger);
    assert_eq!(ex_err.code(), "ERR_MALFORMED_LEDGER");
    assert_eq!(ex_err.path(), Some("history"));
}

#[test]
fn test_serde_error_conversion() {
    let serde_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let ex_err: ExError = serde_err.into();
    assert_eq!(ex_err.kind(), ExErrorKind::Serialization);
}

#[test]
fn test_error_kind_code_mapping() {
    // Test that each kind has a stable, unique code
    let kinds = vec![
        (ExErrorKind::InvalidPattern, "ERR_INVALID_PATTERN"),
        (ExErrorKind::InvalidConfig, "ERR_INVALID_CONFIG"),
        (ExErrorKind::InvalidInput, "ERR_INVALID_INPUT"),
        (ExErrorKind::NotFound, "ERR_NOT_FOUND"),
        (ExErrorKind::MalformedLedger, "ERR_MALFORMED_LEDGER"),
        (ExErrorKind::Io, "ERR_IO"),
        (ExErrorKind::Serialization, "ERR_SERIALIZATION"),
        (ExErrorKind::Persistence, "ERR_PERSISTENCE"),
        (ExErrorKind::Internal, "ERR_INTERNAL"),
    ];

    for (kind, expected_code) in kinds {
        assert_eq!(kind.code(), expected_code);
    }
}

#[test]
fn test_ex_error_builder_pattern() {
    let operation_id = OperationId::new();
    let ex_err = ExError::new(ExErrorKind::NotFound)
        .with_op("find_by_id")
        .with_record_id("order-1")
        .with_path("supplier")
        .with_message("Record not found in store")
        .with_operation_id(operation_id.clone());

    assert_eq!(ex_err.kind(), ExErrorKind::NotFound);
    assert_eq!(ex_err.op(), Some("find_by_id"));
    assert_eq!(ex_err.record_id(), Some("order-1"));
    assert_eq!(ex_err.path(), Some("supplier"));
    assert!(ex_err.message().contains("not found"));
    assert_eq!(ex_err.operation_id(), Some(&operation_id));
}

#[test]
fn test_ex_error_display() {
    let ex_err = ExError::new(ExErrorKind::Persistence)
        .with_op("update_one")
        .with_message("database is locked");

    let display = format!("{}", ex_err);
    assert_eq!(
        display,
        "[ERR_PERSISTENCE] in operation 'update_one': database is locked"
    );
}
