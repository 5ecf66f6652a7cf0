/*!
 * Conversion session module.
 *
 * This module provides:
 * - The session data model (catalog, statements, selection, results)
 * - The state machine that owns the session and enforces its guards
 */

pub mod machine;
pub mod models;

// Re-export main types
pub use machine::{shared, ConversionTicket, ExportSnapshot, ExtractionTicket, SessionStateMachine, SharedSession};
pub use models::{
    summarize, ConversionResult, ConversionStatus, ConversionSummary, DialectCatalog, DialectSelection,
    SessionSnapshot, SessionState, StatementSet,
};
