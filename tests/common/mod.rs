/*!
 * Common test utilities for the sqlshift test suite
 */

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Once};
use tempfile::TempDir;
use tokio::sync::mpsc::UnboundedReceiver;

use sqlshift::app_config::Config;
use sqlshift::app_controller::Controller;
use sqlshift::export::MemorySink;
use sqlshift::notifications::{drain, Notification, NotificationKind};
use sqlshift::services::mock::MockService;

static INIT_LOGGER: Once = Once::new();

/// Route library logs to the test output
pub fn init_logger() {
    INIT_LOGGER.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// A controller wired to a mock service and an in-memory download sink
pub struct TestSession {
    pub controller: Controller,
    pub service: MockService,
    pub sink: Arc<MemorySink>,
    pub notifications: UnboundedReceiver<Notification>,
}

impl TestSession {
    pub fn new(service: MockService) -> Self {
        Self::with_config(Config::default(), service)
    }

    pub fn with_config(config: Config, service: MockService) -> Self {
        init_logger();
        let sink = Arc::new(MemorySink::new());
        let (controller, notifications) =
            Controller::with_services(config, Arc::new(service.clone()), sink.clone());
        Self {
            controller,
            service,
            sink,
            notifications,
        }
    }

    /// Start the session and load the given text as the statement set
    pub async fn started_with(service: MockService, sql_text: &str) -> Self {
        let session = Self::new(service);
        session.controller.start().await.expect("catalog should load");
        session
            .controller
            .submit_text(sql_text)
            .await
            .expect("text should parse");
        session
    }

    /// Notifications raised so far
    pub fn drain(&mut self) -> Vec<Notification> {
        drain(&mut self.notifications)
    }

    /// Messages of the notifications of one kind raised so far
    pub fn messages(&mut self, kind: NotificationKind) -> Vec<String> {
        self.drain()
            .into_iter()
            .filter(|n| n.kind == kind)
            .map(|n| n.message)
            .collect()
    }
}
