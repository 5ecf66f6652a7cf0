/*!
 * Integration tests for single and multi-format export
 */

use std::time::Duration;

use sqlshift::app_config::Config;
use sqlshift::errors::{ExportError, SessionError};
use sqlshift::notifications::NotificationKind;
use sqlshift::services::mock::MockService;

use crate::common::TestSession;

#[tokio::test]
async fn test_export_beforeConversion_shouldBeRejectedLocally() {
    let mut session = TestSession::started_with(MockService::working(), "SELECT 1;").await;
    session.drain();

    let outcome = session.controller.export("PDF").await;
    assert_eq!(outcome, Err(ExportError::Rejected(SessionError::NothingToExport)));
    assert!(session.service.calls().export.is_empty());
    assert_eq!(
        session.messages(NotificationKind::Warning),
        vec!["No results to export".to_string()]
    );
}

#[tokio::test]
async fn test_export_withOnlyErrors_shouldSendEmptyPayload() {
    let session = TestSession::started_with(MockService::working(), "SELECT FAIL; DROP FAIL;").await;
    session.controller.convert().await.unwrap();

    session.controller.export("PDF").await.unwrap();

    let calls = session.service.calls();
    assert_eq!(calls.export.len(), 1);
    assert!(calls.export[0].results.is_empty());
    assert_eq!(session.sink.file_names(), vec!["converted_sql.pdf".to_string()]);
}

#[tokio::test]
async fn test_exportAll_withOneFailingFormat_shouldReportEachIndependently() {
    let service = MockService::working().with_failing_format("Excel");
    let mut session = TestSession::started_with(service, "SELECT 1; SELECT 2;").await;
    session.controller.convert().await.unwrap();
    session.drain();

    let exports = session.controller.export_all().await.unwrap();
    assert_eq!(exports.len(), 4);
    for export in &exports {
        assert_eq!(export.result.is_ok(), export.format != "Excel", "{}", export.format);
    }

    let mut saved = session.sink.file_names();
    saved.sort();
    assert_eq!(
        saved,
        vec![
            "converted_sql.docx".to_string(),
            "converted_sql.pdf".to_string(),
            "converted_sql.sql".to_string(),
        ]
    );

    let notifications = session.drain();
    let errors: Vec<_> = notifications
        .iter()
        .filter(|n| n.kind == NotificationKind::Error)
        .map(|n| n.message.as_str())
        .collect();
    assert_eq!(errors, vec!["Failed to export Excel"]);
    let successes = notifications
        .iter()
        .filter(|n| n.kind == NotificationKind::Success)
        .count();
    assert_eq!(successes, 3);
}

#[tokio::test]
async fn test_exportAll_withoutResults_shouldSendNothing() {
    let session = TestSession::started_with(MockService::working(), "SELECT 1;").await;

    let outcome = session.controller.export_all().await;
    assert!(matches!(outcome, Err(ExportError::Rejected(SessionError::NothingToExport))));
    assert!(session.service.calls().export.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_exportAll_shouldRunFormatsConcurrently() {
    let service = MockService::working().with_export_delay(Duration::from_secs(3));
    let session = TestSession::started_with(service, "SELECT 1;").await;
    session.controller.convert().await.unwrap();

    let started = tokio::time::Instant::now();
    let exports = session.controller.export_all().await.unwrap();
    assert!(exports.iter().all(|e| e.result.is_ok()));
    assert!(started.elapsed() < Duration::from_secs(6));
}

#[tokio::test]
async fn test_export_afterStatementsReplaced_shouldBeRejected() {
    let session = TestSession::started_with(MockService::working(), "SELECT 1;").await;
    session.controller.convert().await.unwrap();

    session.controller.submit_text("SELECT 2; SELECT 3;").await.unwrap();
    let outcome = session.controller.export("SQL File").await;
    assert_eq!(outcome, Err(ExportError::Rejected(SessionError::NothingToExport)));
}

#[tokio::test]
async fn test_export_withUniqueFilenames_shouldAppendTimestamp() {
    let mut config = Config::default();
    config.export.unique_filenames = true;
    let session = TestSession::with_config(config, MockService::working());
    session.controller.start().await.unwrap();
    session.controller.submit_text("SELECT 1;").await.unwrap();
    session.controller.convert().await.unwrap();

    session.controller.export("SQL File").await.unwrap();

    let names = session.sink.file_names();
    assert_eq!(names.len(), 1);
    assert!(names[0].starts_with("converted_sql_"));
    assert!(names[0].ends_with(".sql"));
    assert!(names[0].len() > "converted_sql.sql".len());
}
