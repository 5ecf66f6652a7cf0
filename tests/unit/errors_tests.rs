/*!
 * Tests for error types and conversions
 */

use sqlshift::errors::{AppError, ConversionError, ExportError, ServiceError, SessionError};

#[test]
fn test_serviceError_apiError_shouldDisplayStatusAndMessage() {
    let error = ServiceError::ApiError {
        status_code: 422,
        message: "Unsupported dialect".to_string(),
    };
    let display = format!("{}", error);
    assert!(display.contains("422"));
    assert!(display.contains("Unsupported dialect"));
}

#[test]
fn test_serviceError_detail_shouldOnlyExposeServiceMessages() {
    let api = ServiceError::ApiError {
        status_code: 400,
        message: "No SQL statements found in file".to_string(),
    };
    assert_eq!(api.detail(), Some("No SQL statements found in file"));

    let blank = ServiceError::ApiError {
        status_code: 500,
        message: "   ".to_string(),
    };
    assert_eq!(blank.detail(), None);

    assert_eq!(ServiceError::Timeout("convert".to_string()).detail(), None);
}

#[test]
fn test_serviceError_isTransport_shouldSeparateTransportFromContract() {
    assert!(ServiceError::ConnectionError("refused".to_string()).is_transport());
    assert!(ServiceError::Timeout("parse".to_string()).is_transport());
    assert!(!ServiceError::InvalidResponse("bad status".to_string()).is_transport());
    assert!(!ServiceError::ApiError { status_code: 500, message: String::new() }.is_transport());
}

#[test]
fn test_sessionError_guards_shouldDisplayUserMessages() {
    assert_eq!(
        SessionError::EmptyInput.to_string(),
        "Please provide SQL statements to convert"
    );
    assert_eq!(
        SessionError::IdenticalDialects.to_string(),
        "Source and target dialects must be different"
    );
    assert_eq!(SessionError::NothingToExport.to_string(), "No results to export");
    assert_eq!(
        SessionError::UnknownDialect("DB2".to_string()).to_string(),
        "Unsupported dialect: DB2"
    );
}

#[test]
fn test_conversionError_fromSessionError_shouldWrapCorrectly() {
    let error: ConversionError = SessionError::EmptyInput.into();
    assert!(matches!(error, ConversionError::Rejected(SessionError::EmptyInput)));
    assert!(error.to_string().contains("Please provide SQL statements"));
}

#[test]
fn test_conversionError_countMismatch_shouldDisplayBothCounts() {
    let error = ConversionError::CountMismatch { expected: 3, actual: 2 };
    let display = error.to_string();
    assert!(display.contains('3'));
    assert!(display.contains('2'));
}

#[test]
fn test_exportError_fromServiceError_shouldWrapCorrectly() {
    let error: ExportError = ServiceError::RequestFailed("broken pipe".to_string()).into();
    assert!(matches!(error, ExportError::Service(_)));
    assert!(error.to_string().contains("broken pipe"));
}

#[test]
fn test_appError_fromIoError_shouldBecomeFileError() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.sql");
    let error: AppError = io.into();
    assert!(matches!(error, AppError::File(_)));
}

#[test]
fn test_appError_fromAnyhow_shouldKeepMessage() {
    let error: AppError = anyhow::anyhow!("something odd").into();
    assert!(matches!(error, AppError::Unknown(ref message) if message == "something odd"));
}
