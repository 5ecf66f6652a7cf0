use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::acquisition::{ExtractionOutcome, FileUpload, InputAcquisition, TextInput};
use crate::app_config::Config;
use crate::catalog::CatalogLoader;
use crate::conversion::{ConversionAggregator, ConversionOutcome};
use crate::errors::{AppError, ConversionError, ExportError, ServiceError, SessionError};
use crate::export::{DirectorySink, DownloadSink, ExportDispatcher, FormatExport};
use crate::notifications::{Notification, Notifier};
use crate::services::http::HttpService;
use crate::services::models::{HealthStatus, KeyValidation};
use crate::services::{with_timeout, AccountService, SqlServices};
use crate::session::{self, DialectCatalog, DialectSelection, SessionSnapshot, SharedSession};

// @module: Application controller for SQL conversion sessions

/// One conversion session wired to its collaborators.
///
/// The controller is the entry point used by presentation layers: it owns
/// the shared session and hands each user action to the component that
/// handles it. Notifications for the user arrive on the receiver returned
/// at construction.
#[derive(Debug)]
pub struct Controller {
    id: Uuid,
    config: Config,
    session: SharedSession,
    notifier: Notifier,
    services: Arc<dyn SqlServices>,
    catalog: CatalogLoader,
    acquisition: InputAcquisition,
    text_input: TextInput,
    conversion: ConversionAggregator,
    export: ExportDispatcher,
}

impl Controller {
    // @method: Create a controller talking to the configured HTTP service
    pub fn with_config(config: Config) -> Result<(Self, UnboundedReceiver<Notification>)> {
        config.validate().context("Invalid configuration")?;
        let services = Arc::new(HttpService::new(&config.service).context("Failed to create service client")?);
        let sink = Arc::new(DirectorySink::new(config.export.resolved_output_dir()));
        Ok(Self::with_services(config, services, sink))
    }

    /// Create a controller on top of arbitrary collaborators
    pub fn with_services<S: SqlServices + 'static>(
        config: Config,
        services: Arc<S>,
        sink: Arc<dyn DownloadSink>,
    ) -> (Self, UnboundedReceiver<Notification>) {
        let (notifier, rx) = Notifier::channel();
        let session = session::shared();
        let request_timeout = config.service.request_timeout();

        let catalog = CatalogLoader::new(services.clone(), request_timeout);
        let acquisition = InputAcquisition::new(services.clone(), session.clone(), notifier.clone(), request_timeout);
        let text_input = TextInput::new(acquisition.clone(), config.input.quiet_period());
        let conversion = ConversionAggregator::new(
            services.clone(),
            config.service.conversion_timeout(),
            config.service.api_key().map(str::to_string),
        );
        let export = ExportDispatcher::new(
            services.clone(),
            sink,
            request_timeout,
            config.export.file_base.clone(),
            config.export.unique_filenames,
        );

        let id = Uuid::new_v4();
        debug!("Created conversion session {}", id);

        let controller = Self {
            id,
            config,
            session,
            notifier,
            services,
            catalog,
            acquisition,
            text_input,
            conversion,
            export,
        };
        (controller, rx)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Load the catalog. The session cannot convert until this succeeds.
    pub async fn start(&self) -> Result<DialectCatalog, ServiceError> {
        info!("Starting session {}", self.id);
        self.catalog.load(&self.session, &self.notifier).await
    }

    // =========================================================================
    // Selection
    // =========================================================================

    pub fn select_dialects(&self, source: &str, target: &str) -> Result<(), SessionError> {
        self.session.lock().select(DialectSelection::new(source, target))
    }

    pub fn select_source(&self, dialect: &str) -> Result<(), SessionError> {
        self.session.lock().select_source(dialect)
    }

    pub fn select_target(&self, dialect: &str) -> Result<(), SessionError> {
        self.session.lock().select_target(dialect)
    }

    // =========================================================================
    // Input
    // =========================================================================

    pub async fn submit_file(&self, upload: &FileUpload) -> Result<ExtractionOutcome, ServiceError> {
        self.acquisition.submit_file(upload).await
    }

    /// Read a file from disk and submit it
    pub async fn submit_path<P: AsRef<Path>>(&self, path: P) -> Result<ExtractionOutcome, AppError> {
        let upload = FileUpload::from_path(path).await?;
        Ok(self.acquisition.submit_file(&upload).await?)
    }

    /// Submit pasted text immediately
    pub fn paste_text(&self, text: &str) -> JoinHandle<Option<ExtractionOutcome>> {
        self.text_input.on_paste(text)
    }

    /// Record typed text; it is submitted once typing pauses
    pub fn type_text(&self, text: &str) -> JoinHandle<Option<ExtractionOutcome>> {
        self.text_input.on_edit(text)
    }

    /// Submit text and wait for the outcome
    pub async fn submit_text(&self, text: &str) -> Result<ExtractionOutcome, ServiceError> {
        self.acquisition.submit_text(text).await
    }

    // =========================================================================
    // Conversion and export
    // =========================================================================

    pub async fn convert(&self) -> Result<ConversionOutcome, ConversionError> {
        self.conversion.run(&self.session, &self.notifier).await
    }

    pub async fn export(&self, format: &str) -> Result<std::path::PathBuf, ExportError> {
        self.export.export(&self.session, &self.notifier, format).await
    }

    pub async fn export_all(&self) -> Result<Vec<FormatExport>, ExportError> {
        self.export.export_all(&self.session, &self.notifier).await
    }

    /// Discard statements and results. Requests still in flight are ignored
    /// when they come back.
    pub fn clear(&self) {
        self.text_input.cancel_pending();
        self.session.lock().clear();
        self.notifier.info("Cleared all data");
    }

    // =========================================================================
    // Presentation helpers
    // =========================================================================

    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.lock().snapshot()
    }

    pub fn can_convert(&self) -> bool {
        self.session.lock().can_convert()
    }

    /// Converted SQL of every successful result, ready for the clipboard
    pub fn copy_all(&self) -> String {
        let text = self.snapshot().copy_all_text();
        if !text.is_empty() {
            self.notifier.success("Copied to clipboard");
        }
        text
    }

    // =========================================================================
    // Account and service status
    // =========================================================================

    /// Check an API key with the service. An empty key is rejected locally.
    pub async fn validate_api_key(&self, api_key: &str) -> Result<KeyValidation, ServiceError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            self.notifier.warning("Please enter an API key");
            return Ok(KeyValidation {
                valid: false,
                message: "API key is empty".to_string(),
            });
        }

        let timeout = self.config.service.request_timeout();
        match with_timeout(timeout, "validate key", self.services.validate_key(api_key)).await {
            Ok(validation) => {
                if validation.valid {
                    self.notifier.success("API key is valid");
                } else {
                    self.notifier.error("Invalid API key");
                }
                Ok(validation)
            }
            Err(e) => {
                warn!("Key validation failed: {}", e);
                self.notifier.error("Failed to validate API key");
                Err(e)
            }
        }
    }

    pub async fn health(&self) -> Result<HealthStatus, ServiceError> {
        with_timeout(self.config.service.request_timeout(), "health", self.services.health()).await
    }
}
