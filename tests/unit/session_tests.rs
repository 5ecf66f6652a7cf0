/*!
 * Tests for the session data model
 */

use sqlshift::services::models::ResultRecord;
use sqlshift::session::{
    summarize, ConversionResult, ConversionStatus, ConversionSummary, DialectCatalog, DialectSelection,
    SessionStateMachine, SessionState, StatementSet,
};
use sqlshift::ServiceError;

fn record(status: &str, converted: Option<&str>, notes: Option<&str>) -> ResultRecord {
    ResultRecord {
        original: "ignored".to_string(),
        converted: converted.map(str::to_string),
        status: status.to_string(),
        notes: notes.map(str::to_string),
    }
}

#[test]
fn test_dialectCatalog_withDuplicates_shouldKeepFirstOccurrence() {
    let catalog = DialectCatalog::new(
        vec!["MySQL".to_string(), "Oracle".to_string(), "MySQL".to_string()],
        vec!["PDF".to_string()],
    );
    assert_eq!(catalog.dialects(), &["MySQL".to_string(), "Oracle".to_string()]);
    assert_eq!(catalog.default_selection(), Some(DialectSelection::new("MySQL", "Oracle")));
}

#[test]
fn test_statementSet_shouldDropBlankEntries() {
    let set = StatementSet::new(vec!["SELECT 1;", "", "  \n ", "SELECT 2;"]);
    assert_eq!(set.len(), 2);
    assert_eq!(set.get(1), Some("SELECT 2;"));
}

#[test]
fn test_statementSet_preview_shouldCollapseAndTruncate() {
    let set = StatementSet::new(vec!["SELECT id,\n       name\nFROM   customers WHERE active = 1;"]);
    assert_eq!(set.preview(0, 200).as_deref(), Some("SELECT id, name FROM customers WHERE active = 1;"));
    assert_eq!(set.preview(0, 10).as_deref(), Some("SELECT id,..."));
    assert_eq!(set.preview(5, 10), None);
}

#[test]
fn test_fromRecord_withErrorStatus_shouldDropConvertedText() {
    let result = ConversionResult::from_record(2, "SELECT 3;", record("error", Some("junk"), None)).unwrap();
    assert_eq!(result.index, 2);
    assert_eq!(result.original, "SELECT 3;");
    assert_eq!(result.status, ConversionStatus::Error);
    assert!(result.converted.is_none());
    assert_eq!(result.notes.as_deref(), Some("Conversion failed"));
}

#[test]
fn test_fromRecord_withSuccessWithoutSql_shouldBeInvalid() {
    let outcome = ConversionResult::from_record(0, "SELECT 1;", record("success", None, None));
    assert!(matches!(outcome, Err(ServiceError::InvalidResponse(_))));
}

#[test]
fn test_fromRecord_withUnknownStatus_shouldBeInvalid() {
    let outcome = ConversionResult::from_record(0, "SELECT 1;", record("partial", Some("SELECT 1;"), None));
    assert!(matches!(outcome, Err(ServiceError::InvalidResponse(_))));
}

#[test]
fn test_fromRecord_withBlankNotes_shouldTreatAsAbsent() {
    let result = ConversionResult::from_record(0, "SELECT 1;", record("success", Some("SELECT 1;"), Some(" "))).unwrap();
    assert!(result.notes.is_none());
}

#[test]
fn test_copyText_shouldFallBackToOriginal() {
    assert_eq!(ConversionResult::success(0, "a", "b").copy_text(), "b");
    assert_eq!(ConversionResult::error(0, "a", "nope").copy_text(), "a");
}

#[test]
fn test_summarize_shouldCountEachStatus() {
    let results = vec![
        ConversionResult::success(0, "a", "a"),
        ConversionResult::error(1, "b", "nope"),
        ConversionResult::success(2, "c", "c"),
    ];
    assert_eq!(summarize(&results), ConversionSummary { total: 3, success: 2, error: 1 });
    assert_eq!(summarize(&[]), ConversionSummary::default());
}

#[test]
fn test_snapshot_copyAllText_shouldJoinSuccessfulResults() {
    let mut machine = SessionStateMachine::new();
    machine.apply_catalog(DialectCatalog::new(
        vec!["MySQL".to_string(), "Oracle".to_string()],
        vec![],
    ));
    let extraction = machine.begin_extraction();
    machine.apply_extraction(&extraction, StatementSet::new(vec!["a;", "b;", "c;"]));
    let ticket = machine.begin_conversion().unwrap();
    machine
        .complete_conversion(
            &ticket,
            vec![
                ConversionResult::success(0, "a;", "A;"),
                ConversionResult::error(1, "b;", "nope"),
                ConversionResult::success(2, "c;", "C;"),
            ],
        )
        .unwrap();

    let snapshot = machine.snapshot();
    assert_eq!(snapshot.state, SessionState::Converted);
    assert_eq!(snapshot.copy_all_text(), "A;\n\nC;");
    assert!(snapshot.can_convert());
}

#[test]
fn test_sessionState_displayName_shouldNameEachState() {
    assert_eq!(SessionState::Empty.display_name(), "Empty");
    assert_eq!(SessionState::Converting.display_name(), "Converting");
    assert_eq!(SessionState::Converted.display_name(), "Converted");
}
