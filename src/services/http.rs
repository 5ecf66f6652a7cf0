use async_trait::async_trait;
use bytes::Bytes;
use log::{debug, error};
use reqwest::{multipart, Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::app_config::ServiceConfig;
use crate::errors::ServiceError;
use crate::services::models::{
    ConvertRequest, ConvertResponse, DialectsResponse, ErrorBody, ExportPayload, FormatsResponse,
    HealthStatus, KeyValidation, ParseResponse, ParseTextRequest,
};
use crate::services::{AccountService, CatalogService, ConversionService, ExportService, ExtractionService};

/// HTTP client for the SQL conversion backend
#[derive(Debug, Clone)]
pub struct HttpService {
    /// HTTP client for API requests
    client: Client,
    /// Base URL of the backend
    base_url: String,
    /// Timeout for short calls
    request_timeout: Duration,
    /// Timeout for the conversion call
    conversion_timeout: Duration,
}

impl HttpService {
    /// Create a new client from the service configuration
    pub fn new(config: &ServiceConfig) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ServiceError::ConnectionError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.endpoint.trim_end_matches('/').to_string(),
            request_timeout: config.request_timeout(),
            conversion_timeout: config.conversion_timeout(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request and turn non-2xx answers into `ApiError`
    async fn send(&self, request: RequestBuilder) -> Result<Response, ServiceError> {
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            let message = error_detail(&error_text);
            error!("SQL service error ({}): {}", status, message);
            return Err(ServiceError::ApiError {
                status_code: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ServiceError> {
        let response = self.send(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ServiceError::ParseError(e.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ServiceError> {
        debug!("GET {}", path);
        let request = self.client.get(self.url(path)).timeout(self.request_timeout);
        self.send_json(request).await
    }
}

/// Extract the service diagnostic from an error body, falling back to the raw text
pub(crate) fn error_detail(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .map(|parsed| parsed.message())
        .unwrap_or_else(|_| body.trim().to_string())
}

#[async_trait]
impl CatalogService for HttpService {
    async fn list_dialects(&self) -> Result<Vec<String>, ServiceError> {
        let response: DialectsResponse = self.get_json("/api/dialects").await?;
        Ok(response.dialects)
    }

    async fn list_formats(&self) -> Result<Vec<String>, ServiceError> {
        let response: FormatsResponse = self.get_json("/api/formats").await?;
        Ok(response.formats)
    }
}

#[async_trait]
impl ExtractionService for HttpService {
    async fn parse_file(&self, file_name: &str, content: Bytes) -> Result<ParseResponse, ServiceError> {
        debug!("POST /api/parse-file ({}, {} bytes)", file_name, content.len());
        let part = multipart::Part::bytes(content.to_vec()).file_name(file_name.to_string());
        let form = multipart::Form::new().part("file", part);
        let request = self
            .client
            .post(self.url("/api/parse-file"))
            .timeout(self.request_timeout)
            .multipart(form);
        self.send_json(request).await
    }

    async fn parse_text(&self, sql_text: &str) -> Result<ParseResponse, ServiceError> {
        debug!("POST /api/parse-sql ({} chars)", sql_text.len());
        let body = ParseTextRequest {
            sql_text: sql_text.to_string(),
        };
        let request = self
            .client
            .post(self.url("/api/parse-sql"))
            .timeout(self.request_timeout)
            .json(&body);
        self.send_json(request).await
    }
}

#[async_trait]
impl ConversionService for HttpService {
    async fn convert(&self, request: ConvertRequest) -> Result<ConvertResponse, ServiceError> {
        debug!(
            "POST /api/convert ({} statements, {} -> {})",
            request.statements.len(),
            request.source_dialect,
            request.target_dialect
        );
        let builder = self
            .client
            .post(self.url("/api/convert"))
            .timeout(self.conversion_timeout)
            .json(&request);
        self.send_json(builder).await
    }
}

#[async_trait]
impl ExportService for HttpService {
    async fn export(&self, payload: ExportPayload) -> Result<Bytes, ServiceError> {
        debug!("POST /api/export ({}, {} results)", payload.format, payload.results.len());
        let request = self
            .client
            .post(self.url("/api/export"))
            .timeout(self.request_timeout)
            .json(&payload);
        let response = self.send(request).await?;
        Ok(response.bytes().await?)
    }
}

#[async_trait]
impl AccountService for HttpService {
    async fn validate_key(&self, api_key: &str) -> Result<KeyValidation, ServiceError> {
        let request = self
            .client
            .post(self.url("/api/validate-key"))
            .timeout(self.request_timeout)
            .form(&[("api_key", api_key)]);
        self.send_json(request).await
    }

    async fn health(&self) -> Result<HealthStatus, ServiceError> {
        self.get_json("/").await
    }
}
