/*!
 * Catalog loading at session start.
 *
 * Both listings are requested concurrently. The load is all-or-nothing: if
 * either request fails nothing is published and a single error notification
 * is raised. There is no automatic retry; a new load only happens when the
 * session is started again.
 */

use log::{debug, info};
use std::sync::Arc;
use std::time::Duration;

use crate::errors::ServiceError;
use crate::notifications::Notifier;
use crate::services::{with_timeout, CatalogService};
use crate::session::{DialectCatalog, SharedSession};

/// Loads the dialect and format catalog into a session
#[derive(Debug, Clone)]
pub struct CatalogLoader {
    service: Arc<dyn CatalogService>,
    timeout: Duration,
}

impl CatalogLoader {
    pub fn new(service: Arc<dyn CatalogService>, timeout: Duration) -> Self {
        Self { service, timeout }
    }

    /// Fetch both listings and publish them to the session
    pub async fn load(&self, session: &SharedSession, notifier: &Notifier) -> Result<DialectCatalog, ServiceError> {
        debug!("Loading dialect and format catalog");

        let dialects = with_timeout(self.timeout, "list dialects", self.service.list_dialects());
        let formats = with_timeout(self.timeout, "list formats", self.service.list_formats());

        let catalog = match tokio::try_join!(dialects, formats) {
            Ok((dialects, formats)) => DialectCatalog::new(dialects, formats),
            Err(e) => {
                notifier.error("Failed to load configuration");
                return Err(e);
            }
        };

        info!(
            "Catalog loaded: {} dialect(s), {} format(s)",
            catalog.dialects().len(),
            catalog.formats().len()
        );
        session.lock().apply_catalog(catalog.clone());
        Ok(catalog)
    }
}
