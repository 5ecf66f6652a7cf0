/*!
 * Integration tests for the full conversion session lifecycle
 */

use std::time::Duration;

use sqlshift::acquisition::{ExtractionOutcome, FileUpload};
use sqlshift::app_config::Config;
use sqlshift::conversion::ConversionOutcome;
use sqlshift::errors::{ConversionError, ServiceError, SessionError};
use sqlshift::notifications::NotificationKind;
use sqlshift::services::mock::MockService;
use sqlshift::session::{ConversionSummary, SessionState};

use crate::common::TestSession;

/// Three statements, one of which the service cannot convert
#[tokio::test]
async fn test_convert_withOneFailingStatement_shouldReportMixedResults() {
    let mut session = TestSession::started_with(
        MockService::working(),
        "SELECT 1; SELECT FAIL FROM t; SELECT 3;",
    )
    .await;

    let outcome = session.controller.convert().await.unwrap();
    assert_eq!(
        outcome,
        ConversionOutcome::Completed(ConversionSummary { total: 3, success: 2, error: 1 })
    );

    let snapshot = session.controller.snapshot();
    assert_eq!(snapshot.state, SessionState::Converted);
    let results = snapshot.results.as_deref().unwrap();
    assert_eq!(results.len(), 3);
    for (i, result) in results.iter().enumerate() {
        assert_eq!(result.index, i);
        assert_eq!(Some(result.original.as_str()), snapshot.statements.get(i));
    }

    session.controller.export("SQL File").await.unwrap();
    let payload = &session.service.calls().export[0];
    assert_eq!(payload.format, "SQL File");
    assert_eq!(payload.results.len(), 2);
    assert!(payload.results.iter().all(|r| r.converted.is_some()));
    assert_eq!(session.sink.file_names(), vec!["converted_sql.sql".to_string()]);

    let successes = session.messages(NotificationKind::Success);
    assert!(successes.contains(&"Successfully converted 2 statement(s)".to_string()));
    assert!(successes.contains(&"SQL File downloaded successfully".to_string()));
}

#[tokio::test]
async fn test_convert_withRequestSent_shouldForwardSelectionAndStatements() {
    let session = TestSession::started_with(MockService::working(), "SELECT 1; SELECT 2;").await;
    session.controller.select_dialects("Oracle", "MySQL").unwrap();

    session.controller.convert().await.unwrap();

    let request = &session.service.calls().convert[0];
    assert_eq!(request.statements, vec!["SELECT 1;".to_string(), "SELECT 2;".to_string()]);
    assert_eq!(request.source_dialect, "Oracle");
    assert_eq!(request.target_dialect, "MySQL");
    assert_eq!(request.api_key, None);
}

#[tokio::test]
async fn test_convert_withConfiguredApiKey_shouldForwardIt() {
    let mut config = Config::default();
    config.service.api_key = "secret".to_string();
    let session = TestSession::with_config(config, MockService::working());
    session.controller.start().await.unwrap();
    session.controller.submit_text("SELECT 1;").await.unwrap();

    session.controller.convert().await.unwrap();
    assert_eq!(session.service.calls().convert[0].api_key.as_deref(), Some("secret"));
}

#[tokio::test]
async fn test_convert_withIdenticalDialects_shouldSendNoRequest() {
    let mut session = TestSession::started_with(MockService::working(), "SELECT 1;").await;
    session.controller.select_dialects("PostgreSQL", "PostgreSQL").unwrap();
    assert!(!session.controller.can_convert());

    let outcome = session.controller.convert().await;
    assert_eq!(outcome, Err(ConversionError::Rejected(SessionError::IdenticalDialects)));
    assert!(session.service.calls().convert.is_empty());
    assert_eq!(
        session.messages(NotificationKind::Warning),
        vec!["Source and target dialects must be different".to_string()]
    );
}

#[tokio::test]
async fn test_convert_withIdenticalDialectsAfterResults_shouldKeepResults() {
    let mut session = TestSession::started_with(
        MockService::working(),
        "SELECT 1; SELECT FAIL FROM t; SELECT 3;",
    )
    .await;
    session.controller.convert().await.unwrap();
    let before = session.controller.snapshot();
    assert_eq!(before.summary, ConversionSummary { total: 3, success: 2, error: 1 });
    session.drain();

    session.controller.select_dialects("Oracle", "Oracle").unwrap();
    let outcome = session.controller.convert().await;
    assert_eq!(outcome, Err(ConversionError::Rejected(SessionError::IdenticalDialects)));
    assert_eq!(session.service.calls().convert.len(), 1);

    let after = session.controller.snapshot();
    assert_eq!(after.state, SessionState::Converted);
    assert_eq!(after.summary, before.summary);
    assert_eq!(after.results, before.results);
    assert_eq!(
        session.messages(NotificationKind::Warning),
        vec!["Source and target dialects must be different".to_string()]
    );
}

#[tokio::test]
async fn test_selectSource_withoutSelection_shouldAskForBothDialects() {
    let mut session = TestSession::new(MockService::working().with_dialects(&["MySQL"]));
    session.controller.start().await.unwrap();
    session.controller.submit_text("SELECT 1;").await.unwrap();
    assert!(session.controller.snapshot().selection.is_none());
    session.drain();

    session.controller.select_source("MySQL").unwrap();
    let outcome = session.controller.convert().await;
    assert_eq!(outcome, Err(ConversionError::Rejected(SessionError::NoDialectSelected)));
    assert_eq!(
        session.messages(NotificationKind::Warning),
        vec!["Please select a source and a target dialect".to_string()]
    );
}

#[tokio::test]
async fn test_clear_afterConversion_shouldRequireNewInput() {
    let mut session = TestSession::started_with(MockService::working(), "SELECT 1; SELECT 2;").await;
    session.controller.convert().await.unwrap();

    session.controller.clear();
    let snapshot = session.controller.snapshot();
    assert_eq!(snapshot.state, SessionState::Empty);
    assert!(snapshot.statements.is_empty());
    assert!(snapshot.results.is_none());
    assert_eq!(snapshot.summary, ConversionSummary::default());
    session.drain();

    let outcome = session.controller.convert().await;
    assert_eq!(outcome, Err(ConversionError::Rejected(SessionError::EmptyInput)));
    assert_eq!(session.service.calls().convert.len(), 1);
    assert_eq!(
        session.messages(NotificationKind::Warning),
        vec!["Please provide SQL statements to convert".to_string()]
    );
}

#[tokio::test]
async fn test_reconvert_withNewTarget_shouldReplaceResults() {
    let session = TestSession::started_with(MockService::working(), "SELECT 1;").await;
    session.controller.convert().await.unwrap();

    session.controller.select_target("Oracle").unwrap();
    session.controller.convert().await.unwrap();

    let snapshot = session.controller.snapshot();
    let results = snapshot.results.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].converted.as_deref(), Some("/* Oracle */ SELECT 1;"));
}

#[tokio::test]
async fn test_submitFile_withFailure_shouldReportServiceDetail() {
    let service = MockService::working().failing_parse(ServiceError::ApiError {
        status_code: 400,
        message: "Unsupported file format".to_string(),
    });
    let mut session = TestSession::new(service);
    session.controller.start().await.unwrap();

    let upload = FileUpload::new("schema.xls", b"SELECT 1;".to_vec());
    assert!(session.controller.submit_file(&upload).await.is_err());

    assert_eq!(session.controller.snapshot().state, SessionState::Empty);
    assert_eq!(
        session.messages(NotificationKind::Error),
        vec!["Unsupported file format".to_string()]
    );
}

#[tokio::test]
async fn test_submitPath_shouldExtractFromDisk() {
    let temp_dir = crate::common::create_temp_dir().unwrap();
    let path = crate::common::create_test_file(
        temp_dir.path(),
        "schema.sql",
        "CREATE TABLE a (id INT);\nCREATE TABLE b (id INT);\n",
    )
    .unwrap();
    let session = TestSession::new(MockService::working());
    session.controller.start().await.unwrap();

    let outcome = session.controller.submit_path(&path).await.unwrap();
    assert_eq!(outcome, ExtractionOutcome::Applied { count: 2 });
    assert_eq!(session.service.calls().parse_file, vec!["schema.sql".to_string()]);
}

#[tokio::test]
async fn test_start_withCatalogFailure_shouldBlockConversion() {
    let mut session = TestSession::new(MockService::working().failing_catalog());
    assert!(session.controller.start().await.is_err());
    assert_eq!(
        session.messages(NotificationKind::Error),
        vec!["Failed to load configuration".to_string()]
    );

    assert_eq!(
        session.controller.select_dialects("NotADialect", "AlsoMadeUp"),
        Err(SessionError::CatalogNotLoaded)
    );
    assert_eq!(
        session.controller.select_source("MySQL"),
        Err(SessionError::CatalogNotLoaded)
    );

    session.controller.submit_text("SELECT 1;").await.unwrap();
    assert!(!session.controller.can_convert());
    let outcome = session.controller.convert().await;
    assert_eq!(outcome, Err(ConversionError::Rejected(SessionError::CatalogNotLoaded)));
    assert!(session.service.calls().convert.is_empty());
    assert!(session.controller.snapshot().selection.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_convert_whenServiceHangs_shouldTimeOutAndAllowRetry() {
    let mut config = Config::default();
    config.service.conversion_timeout_secs = 2;
    let service = MockService::working().with_conversion_delay(Duration::from_secs(30));
    let mut session = TestSession::with_config(config, service);
    session.controller.start().await.unwrap();
    session.controller.submit_text("SELECT 1;").await.unwrap();

    let outcome = session.controller.convert().await;
    assert!(matches!(outcome, Err(ConversionError::Service(ServiceError::Timeout(_)))));
    assert_eq!(session.controller.snapshot().state, SessionState::Ready);
    assert!(session.controller.can_convert());
    assert_eq!(
        session.messages(NotificationKind::Error),
        vec!["Conversion failed".to_string()]
    );
}

#[tokio::test(start_paused = true)]
async fn test_typeText_shouldParseOnceAfterTypingPauses() {
    let session = TestSession::new(MockService::working());
    session.controller.start().await.unwrap();

    for text in ["S", "SEL", "SELECT", "SELECT 1", "SELECT 1;"] {
        session.controller.type_text(text);
        tokio::time::sleep(Duration::from_millis(300)).await;
    }
    tokio::time::sleep(Duration::from_secs(2)).await;

    assert_eq!(session.service.calls().parse_text, vec!["SELECT 1;".to_string()]);
    assert_eq!(session.controller.snapshot().state, SessionState::Ready);
}

#[tokio::test(start_paused = true)]
async fn test_clear_withPendingTyping_shouldDropIt() {
    let session = TestSession::new(MockService::working());
    session.controller.start().await.unwrap();

    session.controller.type_text("SELECT 1;");
    session.controller.clear();
    tokio::time::sleep(Duration::from_secs(2)).await;

    assert!(session.service.calls().parse_text.is_empty());
    assert_eq!(session.controller.snapshot().state, SessionState::Empty);
}

#[tokio::test(start_paused = true)]
async fn test_clear_duringConversion_shouldDiscardLateResults() {
    let service = MockService::working().with_conversion_delay(Duration::from_secs(1));
    let session = TestSession::started_with(service, "SELECT 1;").await;

    let clear_midway = async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(session.controller.snapshot().state, SessionState::Converting);
        session.controller.clear();
    };
    let (outcome, ()) = tokio::join!(session.controller.convert(), clear_midway);
    assert_eq!(outcome, Ok(ConversionOutcome::Discarded));

    let snapshot = session.controller.snapshot();
    assert_eq!(snapshot.state, SessionState::Empty);
    assert!(snapshot.results.is_none());
}
