/*!
 * Conversion session state machine.
 *
 * `SessionStateMachine` is the only owner of the session aggregate. The
 * acquisition, conversion and export components never mutate it directly:
 * they ask for a ticket before issuing a request and hand the response back
 * together with that ticket. Each channel (extraction, conversion) keeps a
 * monotonically increasing generation; a response is adopted only when its
 * ticket carries the latest generation for its channel, so late answers for
 * superseded or cleared work are discarded no matter when they arrive.
 *
 * ```text
 *   Empty --extract--> Ready --convert--> Converting --results--> Converted
 *     ^                  ^                    |                      |
 *     |                  +------failure-------+                      |
 *     |                  +-----------------extract-------------------+
 *     +------------------------------clear (any state)---------------+
 * ```
 */

use log::{debug, info, warn};
use parking_lot::Mutex;
use std::sync::Arc;

use crate::errors::{ConversionError, SessionError};

use super::models::{
    summarize, ConversionResult, ConversionSummary, DialectCatalog, DialectSelection, SessionSnapshot, SessionState,
    StatementSet,
};

/// Session handle shared by the components of one session.
///
/// The lock is only ever held for the duration of a synchronous transition,
/// never across an await point.
pub type SharedSession = Arc<Mutex<SessionStateMachine>>;

/// Create a new empty shared session
pub fn shared() -> SharedSession {
    Arc::new(Mutex::new(SessionStateMachine::new()))
}

/// Proof that an extraction request was issued at a given generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionTicket {
    generation: u64,
}

impl ExtractionTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Everything a conversion request needs, captured when it was started
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionTicket {
    generation: u64,
    statements: StatementSet,
    selection: DialectSelection,
}

impl ConversionTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn statements(&self) -> &StatementSet {
        &self.statements
    }

    pub fn selection(&self) -> &DialectSelection {
        &self.selection
    }
}

/// Results and selection frozen at the time an export was requested
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSnapshot {
    pub results: Vec<ConversionResult>,
    pub selection: DialectSelection,
}

/// One side of the selection picked before the other
#[derive(Debug, Clone, Default)]
struct PartialSelection {
    source: Option<String>,
    target: Option<String>,
}

/// The session aggregate
#[derive(Debug, Clone, Default)]
struct ConversionSession {
    statements: StatementSet,
    selection: Option<DialectSelection>,
    partial: PartialSelection,
    results: Option<Vec<ConversionResult>>,
    summary: ConversionSummary,
}

impl ConversionSession {
    /// Promote a partial selection once both sides are known
    fn complete_partial(&mut self) {
        if let PartialSelection {
            source: Some(source),
            target: Some(target),
        } = &self.partial
        {
            self.selection = Some(DialectSelection::new(source.clone(), target.clone()));
            self.partial = PartialSelection::default();
        }
    }

    fn set_results(&mut self, results: Option<Vec<ConversionResult>>) {
        self.summary = results.as_deref().map(summarize).unwrap_or_default();
        self.results = results;
    }
}

/// State machine driving one conversion session
#[derive(Debug)]
pub struct SessionStateMachine {
    state: SessionState,
    catalog: Option<DialectCatalog>,
    session: ConversionSession,
    extraction_generation: u64,
    conversion_generation: u64,
}

impl Default for SessionStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStateMachine {
    pub fn new() -> Self {
        Self {
            state: SessionState::Empty,
            catalog: None,
            session: ConversionSession::default(),
            extraction_generation: 0,
            conversion_generation: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn catalog(&self) -> Option<&DialectCatalog> {
        self.catalog.as_ref()
    }

    pub fn statements(&self) -> &StatementSet {
        &self.session.statements
    }

    pub fn selection(&self) -> Option<&DialectSelection> {
        self.session.selection.as_ref()
    }

    pub fn results(&self) -> Option<&[ConversionResult]> {
        self.session.results.as_deref()
    }

    pub fn summary(&self) -> ConversionSummary {
        self.session.summary
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state,
            catalog: self.catalog.clone(),
            statements: self.session.statements.clone(),
            selection: self.session.selection.clone(),
            results: self.session.results.clone(),
            summary: self.session.summary,
        }
    }

    // =========================================================================
    // Catalog and selection
    // =========================================================================

    /// Publish a freshly loaded catalog, replacing any previous one, and
    /// reset the selection to the catalog default
    pub fn apply_catalog(&mut self, catalog: DialectCatalog) {
        self.session.selection = catalog.default_selection();
        self.session.partial = PartialSelection::default();
        match &self.session.selection {
            Some(selection) => debug!("Default dialect selection: {}", selection),
            None => warn!("Catalog offers fewer than two dialects, no default selection"),
        }
        self.catalog = Some(catalog);
    }

    fn check_dialect(&self, dialect: &str) -> Result<(), SessionError> {
        let catalog = self.catalog.as_ref().ok_or(SessionError::CatalogNotLoaded)?;
        if !catalog.contains_dialect(dialect) {
            return Err(SessionError::UnknownDialect(dialect.to_string()));
        }
        Ok(())
    }

    /// Choose both dialects at once. Identical dialects are accepted here and
    /// rejected when conversion is requested.
    pub fn select(&mut self, selection: DialectSelection) -> Result<(), SessionError> {
        self.check_dialect(&selection.source)?;
        self.check_dialect(&selection.target)?;
        self.session.selection = Some(selection);
        self.session.partial = PartialSelection::default();
        Ok(())
    }

    /// Change the source dialect. Without a full selection the other side
    /// stays unset until it is chosen too.
    pub fn select_source(&mut self, dialect: &str) -> Result<(), SessionError> {
        self.check_dialect(dialect)?;
        match self.session.selection.as_mut() {
            Some(selection) => selection.source = dialect.to_string(),
            None => {
                self.session.partial.source = Some(dialect.to_string());
                self.session.complete_partial();
            }
        }
        Ok(())
    }

    pub fn select_target(&mut self, dialect: &str) -> Result<(), SessionError> {
        self.check_dialect(dialect)?;
        match self.session.selection.as_mut() {
            Some(selection) => selection.target = dialect.to_string(),
            None => {
                self.session.partial.target = Some(dialect.to_string());
                self.session.complete_partial();
            }
        }
        Ok(())
    }

    // =========================================================================
    // Extraction
    // =========================================================================

    /// Register a new extraction request. Any older request still in flight
    /// is superseded.
    pub fn begin_extraction(&mut self) -> ExtractionTicket {
        self.extraction_generation += 1;
        ExtractionTicket {
            generation: self.extraction_generation,
        }
    }

    pub fn is_current_extraction(&self, ticket: &ExtractionTicket) -> bool {
        ticket.generation == self.extraction_generation
    }

    /// Replace the statement set with an extraction result.
    ///
    /// Returns the new statement count, or `None` when the ticket was
    /// superseded and the result discarded.
    pub fn apply_extraction(&mut self, ticket: &ExtractionTicket, statements: StatementSet) -> Option<usize> {
        if !self.is_current_extraction(ticket) {
            debug!(
                "Discarding extraction result for generation {} (latest is {})",
                ticket.generation, self.extraction_generation
            );
            return None;
        }

        if self.state == SessionState::Converting {
            // The in-flight conversion refers to statements that no longer exist
            self.conversion_generation += 1;
            info!("New input replaced the statements of an in-flight conversion");
        }

        let count = statements.len();
        self.session.statements = statements;
        self.session.set_results(None);
        self.state = if count == 0 {
            SessionState::Empty
        } else {
            SessionState::Ready
        };
        Some(count)
    }

    // =========================================================================
    // Conversion
    // =========================================================================

    /// Check the conversion guards without changing anything. Only the first
    /// violated guard is reported.
    pub fn check_conversion(&self) -> Result<DialectSelection, SessionError> {
        if self.state == SessionState::Converting {
            return Err(SessionError::ConversionInProgress);
        }
        if self.catalog.is_none() {
            return Err(SessionError::CatalogNotLoaded);
        }
        if self.session.statements.is_empty() {
            return Err(SessionError::EmptyInput);
        }
        let selection = self
            .session
            .selection
            .clone()
            .ok_or(SessionError::NoDialectSelected)?;
        if selection.is_identity() {
            return Err(SessionError::IdenticalDialects);
        }
        Ok(selection)
    }

    pub fn can_convert(&self) -> bool {
        self.check_conversion().is_ok()
    }

    /// Move to `Converting`, discarding any previous results
    pub fn begin_conversion(&mut self) -> Result<ConversionTicket, SessionError> {
        let selection = self.check_conversion()?;

        self.conversion_generation += 1;
        self.session.set_results(None);
        self.state = SessionState::Converting;

        Ok(ConversionTicket {
            generation: self.conversion_generation,
            statements: self.session.statements.clone(),
            selection,
        })
    }

    pub fn is_current_conversion(&self, ticket: &ConversionTicket) -> bool {
        self.state == SessionState::Converting && ticket.generation == self.conversion_generation
    }

    /// Adopt a full result sequence.
    ///
    /// Returns `Ok(None)` when the ticket is stale and the results were
    /// discarded. A sequence whose length does not match the statements is
    /// rejected as a whole and the session returns to `Ready`.
    pub fn complete_conversion(
        &mut self,
        ticket: &ConversionTicket,
        results: Vec<ConversionResult>,
    ) -> Result<Option<ConversionSummary>, ConversionError> {
        if !self.is_current_conversion(ticket) {
            debug!(
                "Discarding conversion results for generation {} (latest is {})",
                ticket.generation, self.conversion_generation
            );
            return Ok(None);
        }

        let expected = self.session.statements.len();
        if results.len() != expected {
            self.state = SessionState::Ready;
            return Err(ConversionError::CountMismatch {
                expected,
                actual: results.len(),
            });
        }

        self.session.set_results(Some(results));
        self.state = SessionState::Converted;
        Ok(Some(self.session.summary))
    }

    /// Revert a failed conversion to `Ready`.
    ///
    /// Returns false when the ticket is stale and nothing changed.
    pub fn fail_conversion(&mut self, ticket: &ConversionTicket) -> bool {
        if !self.is_current_conversion(ticket) {
            return false;
        }
        self.session.set_results(None);
        self.state = SessionState::Ready;
        true
    }

    // =========================================================================
    // Export and clear
    // =========================================================================

    /// Freeze the current results for an export request
    pub fn export_snapshot(&self) -> Result<ExportSnapshot, SessionError> {
        let results = self
            .session
            .results
            .clone()
            .ok_or(SessionError::NothingToExport)?;
        let selection = self
            .session
            .selection
            .clone()
            .ok_or(SessionError::NoDialectSelected)?;
        Ok(ExportSnapshot { results, selection })
    }

    /// Discard statements and results together and return to `Empty`.
    ///
    /// Work still in flight on either channel becomes stale.
    pub fn clear(&mut self) {
        self.session.statements = StatementSet::empty();
        self.session.set_results(None);
        self.extraction_generation += 1;
        self.conversion_generation += 1;
        self.state = SessionState::Empty;
    }
}
