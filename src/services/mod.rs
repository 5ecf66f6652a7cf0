/*!
 * Client contracts for the external SQL services.
 *
 * The core never parses, converts or renders SQL itself. It talks to four
 * collaborators through the traits below:
 * - `CatalogService`: supported dialects and export formats
 * - `ExtractionService`: splits raw text or an uploaded document into statements
 * - `ConversionService`: translates statements between dialects
 * - `ExportService`: renders successful results into a downloadable document
 *
 * `AccountService` covers the auxiliary key-validation and health endpoints.
 * `http::HttpService` implements all of them over HTTP and `mock::MockService`
 * implements them in-process for tests.
 */

use async_trait::async_trait;
use bytes::Bytes;
use std::fmt::Debug;
use std::future::Future;
use std::time::Duration;

use crate::errors::ServiceError;

pub mod http;
pub mod mock;
pub mod models;

use models::{ConvertRequest, ConvertResponse, ExportPayload, HealthStatus, KeyValidation, ParseResponse};

/// Enumerates the dialects and formats a session may choose from
#[async_trait]
pub trait CatalogService: Send + Sync + Debug {
    /// Ordered list of dialect names
    async fn list_dialects(&self) -> Result<Vec<String>, ServiceError>;

    /// Ordered list of export format names
    async fn list_formats(&self) -> Result<Vec<String>, ServiceError>;
}

/// Splits SQL input into individual statements
#[async_trait]
pub trait ExtractionService: Send + Sync + Debug {
    /// Extract statements from an uploaded document
    ///
    /// # Arguments
    /// * `file_name` - Declared name of the upload, used by the service to pick a parser
    /// * `content` - Raw file bytes
    async fn parse_file(&self, file_name: &str, content: Bytes) -> Result<ParseResponse, ServiceError>;

    /// Extract statements from typed or pasted SQL text
    async fn parse_text(&self, sql_text: &str) -> Result<ParseResponse, ServiceError>;
}

/// Translates statements from a source to a target dialect
#[async_trait]
pub trait ConversionService: Send + Sync + Debug {
    /// Convert every statement of the request in one call
    ///
    /// # Returns
    /// * One result per submitted statement, in submission order
    async fn convert(&self, request: ConvertRequest) -> Result<ConvertResponse, ServiceError>;
}

/// Renders conversion results into a document
#[async_trait]
pub trait ExportService: Send + Sync + Debug {
    /// Render the payload, returning the raw document bytes
    async fn export(&self, payload: ExportPayload) -> Result<Bytes, ServiceError>;
}

/// Auxiliary account and liveness endpoints
#[async_trait]
pub trait AccountService: Send + Sync + Debug {
    /// Ask the service whether an API key is usable
    async fn validate_key(&self, api_key: &str) -> Result<KeyValidation, ServiceError>;

    /// Service liveness and version information
    async fn health(&self) -> Result<HealthStatus, ServiceError>;
}

/// Everything a full session needs from the outside world
pub trait SqlServices:
    CatalogService + ExtractionService + ConversionService + ExportService + AccountService
{
}

impl<T> SqlServices for T where
    T: CatalogService + ExtractionService + ConversionService + ExportService + AccountService
{
}

/// Bound a service call. An elapsed timer is reported exactly like a service failure.
pub async fn with_timeout<T, F>(limit: Duration, operation: &str, call: F) -> Result<T, ServiceError>
where
    F: Future<Output = Result<T, ServiceError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(ServiceError::Timeout(format!(
            "{} did not answer within {:?}",
            operation, limit
        ))),
    }
}
