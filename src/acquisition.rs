/*!
 * Input acquisition: turns a file upload or a text blob into a statement set.
 *
 * Both entry points go through the same extraction contract and apply the
 * same replace-and-notify rules:
 * - a successful extraction replaces the whole statement set
 * - a failed extraction leaves the previous statement set untouched
 * - a result for a superseded submission is discarded
 *
 * `TextInput` sits in front of the text path and models an editor: pasting
 * submits right away, typing submits once the input has been quiet for the
 * configured period.
 */

use bytes::Bytes;
use log::{debug, warn};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::errors::{AppError, ServiceError};
use crate::notifications::Notifier;
use crate::services::{with_timeout, ExtractionService};
use crate::session::{ExtractionTicket, SharedSession, StatementSet};

/// A single uploaded document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub file_name: String,
    pub content: Bytes,
}

impl FileUpload {
    pub fn new(file_name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            content: content.into(),
        }
    }

    /// Read a file from disk, keeping only its file name as the declared name
    pub async fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, AppError> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| AppError::File(format!("Not a file path: {:?}", path)))?;
        let content = tokio::fs::read(path)
            .await
            .map_err(|e| AppError::File(format!("Failed to read {:?}: {}", path, e)))?;
        Ok(Self::new(file_name, content))
    }
}

/// What happened to a submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionOutcome {
    /// The statement set was replaced
    Applied { count: usize },
    /// Blank input, nothing was sent
    Ignored,
    /// A newer submission (or a clear) overtook this one; its result was dropped
    Superseded,
}

enum Source<'a> {
    File(&'a FileUpload),
    Text(&'a str),
}

impl Source<'_> {
    fn generic_failure(&self) -> &'static str {
        match self {
            Source::File(_) => "Failed to parse file",
            Source::Text(_) => "Failed to parse SQL",
        }
    }

    fn success_message(&self, count: usize) -> String {
        match self {
            Source::File(_) => format!("Extracted {} SQL statement(s)", count),
            Source::Text(_) => format!("Parsed {} SQL statement(s)", count),
        }
    }
}

/// Forwards input to the extraction service and proposes the result to the session
#[derive(Debug, Clone)]
pub struct InputAcquisition {
    service: Arc<dyn ExtractionService>,
    session: SharedSession,
    notifier: Notifier,
    timeout: Duration,
}

impl InputAcquisition {
    pub fn new(
        service: Arc<dyn ExtractionService>,
        session: SharedSession,
        notifier: Notifier,
        timeout: Duration,
    ) -> Self {
        Self {
            service,
            session,
            notifier,
            timeout,
        }
    }

    /// Extract statements from one uploaded file
    pub async fn submit_file(&self, upload: &FileUpload) -> Result<ExtractionOutcome, ServiceError> {
        debug!("Submitting file {} ({} bytes)", upload.file_name, upload.content.len());
        self.notifier.info("Parsing file...");
        self.extract(Source::File(upload)).await
    }

    /// Extract statements from a text blob. Blank text is a no-op.
    pub async fn submit_text(&self, sql_text: &str) -> Result<ExtractionOutcome, ServiceError> {
        if sql_text.trim().is_empty() {
            return Ok(ExtractionOutcome::Ignored);
        }
        self.extract(Source::Text(sql_text)).await
    }

    /// Extract statements from a text blob, but only if `still_wanted` holds
    /// at the moment the extraction is registered. The check runs under the
    /// session lock, so nothing can register a newer extraction in between.
    ///
    /// Returns `None` when the check failed and nothing was sent.
    pub async fn submit_text_if<F>(&self, sql_text: &str, still_wanted: F) -> Option<Result<ExtractionOutcome, ServiceError>>
    where
        F: FnOnce() -> bool,
    {
        if sql_text.trim().is_empty() {
            return Some(Ok(ExtractionOutcome::Ignored));
        }
        let ticket = {
            let mut session = self.session.lock();
            if !still_wanted() {
                return None;
            }
            session.begin_extraction()
        };
        Some(self.run(Source::Text(sql_text), ticket).await)
    }

    async fn extract(&self, source: Source<'_>) -> Result<ExtractionOutcome, ServiceError> {
        let ticket = self.session.lock().begin_extraction();
        self.run(source, ticket).await
    }

    async fn run(&self, source: Source<'_>, ticket: ExtractionTicket) -> Result<ExtractionOutcome, ServiceError> {
        let call = async {
            match &source {
                Source::File(upload) => {
                    self.service
                        .parse_file(&upload.file_name, upload.content.clone())
                        .await
                }
                Source::Text(text) => self.service.parse_text(text).await,
            }
        };
        let response = with_timeout(self.timeout, "parse", call).await;

        match response {
            Ok(parsed) => {
                if parsed.count != parsed.statements.len() {
                    debug!(
                        "Service reported {} statement(s) but returned {}",
                        parsed.count,
                        parsed.statements.len()
                    );
                }
                let statements = StatementSet::new(parsed.statements);
                let applied = self.session.lock().apply_extraction(&ticket, statements);
                match applied {
                    Some(count) => {
                        self.notifier.success(source.success_message(count));
                        Ok(ExtractionOutcome::Applied { count })
                    }
                    None => Ok(ExtractionOutcome::Superseded),
                }
            }
            Err(e) => {
                if !self.session.lock().is_current_extraction(&ticket) {
                    debug!("Ignoring failure of a superseded extraction: {}", e);
                    return Ok(ExtractionOutcome::Superseded);
                }
                warn!("Extraction failed: {}", e);
                let message = e.detail().unwrap_or(source.generic_failure()).to_string();
                self.notifier.error(message);
                Err(e)
            }
        }
    }
}

/// Editor front-end for the text path
#[derive(Debug)]
pub struct TextInput {
    acquisition: InputAcquisition,
    quiet_period: Duration,
    keystrokes: Arc<AtomicU64>,
    text: Mutex<String>,
}

impl TextInput {
    pub fn new(acquisition: InputAcquisition, quiet_period: Duration) -> Self {
        Self {
            acquisition,
            quiet_period,
            keystrokes: Arc::new(AtomicU64::new(0)),
            text: Mutex::new(String::new()),
        }
    }

    /// Current editor content
    pub fn text(&self) -> String {
        self.text.lock().clone()
    }

    /// Record an edit. The text is submitted only if no further edit arrives
    /// within the quiet period; every edit restarts the wait.
    pub fn on_edit(&self, text: impl Into<String>) -> JoinHandle<Option<ExtractionOutcome>> {
        let text = text.into();
        *self.text.lock() = text.clone();
        let seq = self.next_keystroke();

        let keystrokes = Arc::clone(&self.keystrokes);
        let acquisition = self.acquisition.clone();
        let quiet_period = self.quiet_period;
        tokio::spawn(async move {
            tokio::time::sleep(quiet_period).await;
            acquisition
                .submit_text_if(&text, || keystrokes.load(Ordering::SeqCst) == seq)
                .await
                .and_then(Result::ok)
        })
    }

    /// Bump the keystroke sequence. Done under the session lock so that a
    /// pending edit either registers its extraction before this point or
    /// sees the newer sequence.
    fn next_keystroke(&self) -> u64 {
        let _session = self.acquisition.session.lock();
        self.keystrokes.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Drop any edit still waiting for its quiet period and empty the editor
    pub fn cancel_pending(&self) {
        self.next_keystroke();
        self.text.lock().clear();
    }

    /// Record a paste and submit it immediately, cancelling any pending edit
    pub fn on_paste(&self, text: impl Into<String>) -> JoinHandle<Option<ExtractionOutcome>> {
        let text = text.into();
        *self.text.lock() = text.clone();
        self.next_keystroke();

        let acquisition = self.acquisition.clone();
        tokio::spawn(async move { acquisition.submit_text(&text).await.ok() })
    }
}
