/*!
 * Conversion aggregation.
 *
 * Submits the whole statement set in one request, validates the answer and
 * adopts it all-or-nothing. A result sequence whose length or content does
 * not line up with the submitted statements is treated as a failure of the
 * whole request; partial results are never shown.
 */

use log::{debug, error, info};
use std::sync::Arc;
use std::time::Duration;

use crate::errors::{ConversionError, ServiceError};
use crate::notifications::Notifier;
use crate::services::models::{ConvertRequest, ConvertResponse};
use crate::services::{with_timeout, ConversionService};
use crate::session::{ConversionResult, ConversionSummary, ConversionTicket, SharedSession};

/// What happened to a conversion request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionOutcome {
    /// The results were adopted
    Completed(ConversionSummary),
    /// The session moved on (clear or new input) while the request was in flight
    Discarded,
}

/// Runs conversion requests against a session
#[derive(Debug, Clone)]
pub struct ConversionAggregator {
    service: Arc<dyn ConversionService>,
    timeout: Duration,
    api_key: Option<String>,
}

impl ConversionAggregator {
    pub fn new(service: Arc<dyn ConversionService>, timeout: Duration, api_key: Option<String>) -> Self {
        Self {
            service,
            timeout,
            api_key,
        }
    }

    /// Convert the current statement set.
    ///
    /// Guard violations are reported as a warning without contacting the
    /// service. Every other failure returns the session to `Ready`.
    pub async fn run(&self, session: &SharedSession, notifier: &Notifier) -> Result<ConversionOutcome, ConversionError> {
        let ticket = match session.lock().begin_conversion() {
            Ok(ticket) => ticket,
            Err(e) => {
                notifier.warning(e.to_string());
                return Err(e.into());
            }
        };

        info!(
            "Converting {} statement(s) {}",
            ticket.statements().len(),
            ticket.selection()
        );
        notifier.info("Converting SQL statements...");

        let request = ConvertRequest {
            statements: ticket.statements().to_vec(),
            source_dialect: ticket.selection().source.clone(),
            target_dialect: ticket.selection().target.clone(),
            api_key: self.api_key.clone(),
        };

        let response = match with_timeout(self.timeout, "convert", self.service.convert(request)).await {
            Ok(response) => response,
            Err(e) => return Err(self.fail(session, notifier, &ticket, e.into())),
        };

        let results = match assemble_results(&ticket, response) {
            Ok(results) => results,
            Err(e) => return Err(self.fail(session, notifier, &ticket, e)),
        };

        let adopted = session.lock().complete_conversion(&ticket, results);
        match adopted {
            Ok(Some(summary)) => {
                info!(
                    "Conversion finished: {} succeeded, {} failed",
                    summary.success, summary.error
                );
                if summary.success > 0 {
                    notifier.success(format!("Successfully converted {} statement(s)", summary.success));
                }
                if summary.error > 0 {
                    notifier.warning(format!("{} statement(s) failed to convert", summary.error));
                }
                Ok(ConversionOutcome::Completed(summary))
            }
            Ok(None) => Ok(ConversionOutcome::Discarded),
            Err(e) => {
                error!("{}", e);
                notifier.error("Conversion failed");
                Err(e)
            }
        }
    }

    /// Revert the session and raise one error notification, unless the
    /// request was already superseded
    fn fail(
        &self,
        session: &SharedSession,
        notifier: &Notifier,
        ticket: &ConversionTicket,
        failure: ConversionError,
    ) -> ConversionError {
        if !session.lock().fail_conversion(ticket) {
            debug!("Ignoring failure of a superseded conversion: {}", failure);
            return failure;
        }

        error!("Conversion failed: {}", failure);
        let message = match &failure {
            ConversionError::Service(e) => e.detail().unwrap_or("Conversion failed").to_string(),
            _ => "Conversion failed".to_string(),
        };
        notifier.error(message);
        failure
    }
}

/// Pair each returned record with the statement submitted at the same
/// position. The whole response is rejected if any record is unusable.
fn assemble_results(ticket: &ConversionTicket, response: ConvertResponse) -> Result<Vec<ConversionResult>, ConversionError> {
    let statements = ticket.statements();
    if response.results.len() != statements.len() {
        return Err(ConversionError::CountMismatch {
            expected: statements.len(),
            actual: response.results.len(),
        });
    }
    if response.total_count != response.results.len() {
        debug!(
            "Service reported a total of {} but returned {} result(s)",
            response.total_count,
            response.results.len()
        );
    }

    response
        .results
        .into_iter()
        .enumerate()
        .map(|(index, record)| -> Result<ConversionResult, ConversionError> {
            let original = statements.get(index).ok_or_else(|| {
                ServiceError::InvalidResponse(format!("No statement at position {}", index + 1))
            })?;
            Ok(ConversionResult::from_record(index, original, record)?)
        })
        .collect()
}
