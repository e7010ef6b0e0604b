/*!
 * Tests for error types
 */

use bimtrans::errors::{AppError, HostError, ProviderError, WriteBackError};

#[test]
fn test_providerError_fromStatus_shouldKeepMessage() {
    let error = ProviderError::from_status(456, "Quota exceeded");
    assert!(matches!(error, ProviderError::QuotaExceeded(ref m) if m == "Quota exceeded"));
    assert_eq!(error.to_string(), "Quota exceeded: Quota exceeded");

    let error = ProviderError::from_status(500, "boom");
    assert_eq!(error.to_string(), "API responded with error: 500 - boom");
}

#[test]
fn test_hostError_display_shouldNameTarget() {
    let error = HostError::ParameterNotFound {
        element: "12".to_string(),
        parameter: "Comments".to_string(),
    };
    assert_eq!(error.to_string(), "Parameter 'Comments' not found on element 12");

    let error = HostError::CellOutOfRange {
        schedule: "s1".to_string(),
        row: 4,
        column: 2,
    };
    assert!(error.to_string().contains("(4, 2)"));
}

#[test]
fn test_writeBackError_fromHostError_shouldWrap() {
    let error: WriteBackError = HostError::ReadOnly("parameter 'Mark' of element 1".to_string()).into();
    assert!(matches!(error, WriteBackError::Host(HostError::ReadOnly(_))));
    assert!(error.to_string().contains("Mark"));
}

#[test]
fn test_appError_conversions_shouldPickVariant() {
    let error: AppError = ProviderError::ConnectionError("refused".to_string()).into();
    assert!(matches!(error, AppError::Provider(_)));

    let error: AppError = HostError::Transaction("nested".to_string()).into();
    assert!(matches!(error, AppError::WriteBack(WriteBackError::Host(_))));

    let error: AppError = std::io::Error::new(std::io::ErrorKind::NotFound, "model.json").into();
    assert!(matches!(error, AppError::File(_)));

    let error: AppError = anyhow::anyhow!("something else").into();
    assert_eq!(error.to_string(), "Unknown error: something else");
}
