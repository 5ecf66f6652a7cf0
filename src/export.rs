/*!
 * Export dispatch.
 *
 * Each requested format is rendered by the export service and saved through
 * a `DownloadSink`. Only successful results are ever sent; error entries are
 * excluded from every artifact. Formats are independent: when several are
 * requested at once, each one succeeds or fails on its own.
 */

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Local;
use futures::future::join_all;
use log::{debug, error, info};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::errors::ExportError;
use crate::notifications::Notifier;
use crate::services::models::ExportPayload;
use crate::services::{with_timeout, ExportService};
use crate::session::{ExportSnapshot, SharedSession};

/// Formats the export service is known to render
pub const KNOWN_FORMATS: [&str; 4] = ["PDF", "Word Document", "Excel", "SQL File"];

/// File extension for a format identifier. Unrecognized formats get `.txt`.
pub fn extension_for_format(format: &str) -> &'static str {
    match format {
        "PDF" => ".pdf",
        "Word Document" => ".docx",
        "Excel" => ".xlsx",
        "SQL File" => ".sql",
        _ => ".txt",
    }
}

/// Build the download file name for a format
pub fn export_filename(base: &str, format: &str, unique_token: Option<&str>) -> String {
    match unique_token {
        Some(token) => format!("{}_{}{}", base, token, extension_for_format(format)),
        None => format!("{}{}", base, extension_for_format(format)),
    }
}

/// File-name friendly form of a format name, e.g. `Word Document` -> `word_document`
pub fn format_slug(format: &str) -> String {
    format
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect()
}

/// Drop repeated formats, keeping the first occurrence of each
fn distinct_formats(formats: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    formats.into_iter().filter(|f| seen.insert(f.clone())).collect()
}

/// Extensions shared by more than one of the given formats
fn colliding_extensions(formats: &[String]) -> HashSet<&'static str> {
    let mut counts: HashMap<&'static str, usize> = HashMap::new();
    for format in formats {
        *counts.entry(extension_for_format(format)).or_default() += 1;
    }
    counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(extension, _)| extension)
        .collect()
}

/// Where rendered documents end up
#[async_trait]
pub trait DownloadSink: Send + Sync + Debug {
    /// Save a document and return where it was stored
    async fn save(&self, file_name: &str, content: Bytes) -> Result<PathBuf, ExportError>;
}

/// Saves documents into a directory on disk
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }
}

#[async_trait]
impl DownloadSink for DirectorySink {
    async fn save(&self, file_name: &str, content: Bytes) -> Result<PathBuf, ExportError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| ExportError::Save(format!("Failed to create {:?}: {}", self.dir, e)))?;

        let path = self.dir.join(file_name);
        tokio::fs::write(&path, &content)
            .await
            .map_err(|e| ExportError::Save(format!("Failed to write {:?}: {}", path, e)))?;

        debug!("Saved {} bytes to {:?}", content.len(), path);
        Ok(path)
    }
}

/// Keeps documents in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    files: Mutex<Vec<(String, Bytes)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Saved documents, in save order
    pub fn files(&self) -> Vec<(String, Bytes)> {
        self.files.lock().clone()
    }

    pub fn file_names(&self) -> Vec<String> {
        self.files.lock().iter().map(|(name, _)| name.clone()).collect()
    }
}

#[async_trait]
impl DownloadSink for MemorySink {
    async fn save(&self, file_name: &str, content: Bytes) -> Result<PathBuf, ExportError> {
        self.files.lock().push((file_name.to_string(), content));
        Ok(PathBuf::from(file_name))
    }
}

/// Outcome of one format of an export
#[derive(Debug, Clone, PartialEq)]
pub struct FormatExport {
    pub format: String,
    pub result: Result<PathBuf, ExportError>,
}

/// Sends export requests and saves what comes back
#[derive(Debug, Clone)]
pub struct ExportDispatcher {
    service: Arc<dyn ExportService>,
    sink: Arc<dyn DownloadSink>,
    timeout: Duration,
    file_base: String,
    unique_filenames: bool,
}

impl ExportDispatcher {
    pub fn new(
        service: Arc<dyn ExportService>,
        sink: Arc<dyn DownloadSink>,
        timeout: Duration,
        file_base: impl Into<String>,
        unique_filenames: bool,
    ) -> Self {
        Self {
            service,
            sink,
            timeout,
            file_base: file_base.into(),
            unique_filenames,
        }
    }

    fn snapshot(session: &SharedSession, notifier: &Notifier) -> Result<ExportSnapshot, ExportError> {
        let snapshot = session.lock().export_snapshot();
        snapshot.map_err(|e| {
            notifier.warning(e.to_string());
            ExportError::Rejected(e)
        })
    }

    /// Export the current results in one format
    pub async fn export(&self, session: &SharedSession, notifier: &Notifier, format: &str) -> Result<PathBuf, ExportError> {
        let snapshot = Self::snapshot(session, notifier)?;
        self.dispatch(&snapshot, notifier, format, false).await
    }

    /// Export the current results in every format. The guard is checked once;
    /// after that each format is requested concurrently and reported on its own.
    pub async fn export_all(&self, session: &SharedSession, notifier: &Notifier) -> Result<Vec<FormatExport>, ExportError> {
        let snapshot = Self::snapshot(session, notifier)?;
        let formats: Vec<String> = {
            let machine = session.lock();
            match machine.catalog() {
                Some(catalog) if !catalog.formats().is_empty() => catalog.formats().to_vec(),
                _ => KNOWN_FORMATS.iter().map(|f| f.to_string()).collect(),
            }
        };
        let formats = distinct_formats(formats);
        let colliding = colliding_extensions(&formats);

        info!("Exporting {} format(s)", formats.len());
        let snapshot = &snapshot;
        let colliding = &colliding;
        let exports = formats.iter().map(|format| async move {
            let qualify = colliding.contains(extension_for_format(format));
            FormatExport {
                format: format.clone(),
                result: self.dispatch(snapshot, notifier, format, qualify).await,
            }
        });
        Ok(join_all(exports).await)
    }

    /// Render and save one format. `qualify` adds the format name to the file
    /// name, for formats that share an extension with another one.
    async fn dispatch(
        &self,
        snapshot: &ExportSnapshot,
        notifier: &Notifier,
        format: &str,
        qualify: bool,
    ) -> Result<PathBuf, ExportError> {
        let results: Vec<_> = snapshot
            .results
            .iter()
            .filter(|r| r.is_success())
            .map(|r| r.to_record())
            .collect();
        debug!(
            "Exporting {} of {} result(s) as {}",
            results.len(),
            snapshot.results.len(),
            format
        );

        let payload = ExportPayload {
            results,
            source_dialect: snapshot.selection.source.clone(),
            target_dialect: snapshot.selection.target.clone(),
            format: format.to_string(),
        };

        notifier.info(format!("Generating {}...", format));

        let saved = async {
            let document = with_timeout(self.timeout, "export", self.service.export(payload)).await?;
            let token = self
                .unique_filenames
                .then(|| Local::now().format("%Y%m%d_%H%M%S").to_string());
            let base = if qualify {
                format!("{}_{}", self.file_base, format_slug(format))
            } else {
                self.file_base.clone()
            };
            let file_name = export_filename(&base, format, token.as_deref());
            self.sink.save(&file_name, document).await
        }
        .await;

        match &saved {
            Ok(path) => {
                info!("{} export saved to {:?}", format, path);
                notifier.success(format!("{} downloaded successfully", format));
            }
            Err(e) => {
                error!("{} export failed: {}", format, e);
                notifier.error(format!("Failed to export {}", format));
            }
        }
        saved
    }
}
