/*!
 * Mock service implementations for testing.
 *
 * `MockService` implements every collaborator trait in-process:
 * - `MockService::working()` - catalog, parsing, conversion and export all succeed
 * - `failing_catalog()`, `failing_parse()`, `failing_conversion()` - whole-call failures
 * - `with_parse_delay()`, `with_conversion_delay()`, `with_account_delay()` - slow answers for race and timeout tests
 * - `with_failing_format()` - export fails for one format only
 *
 * Every call is recorded so tests can assert what was (or was not) sent.
 */

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use crate::errors::ServiceError;
use crate::services::models::{
    ConvertRequest, ConvertResponse, ExportPayload, HealthStatus, KeyValidation, ParseResponse, ResultRecord,
};
use crate::services::{AccountService, CatalogService, ConversionService, ExportService, ExtractionService};

/// Statements containing this marker come back as conversion errors
pub const FAIL_MARKER: &str = "FAIL";

/// Key accepted by the mock key validation
pub const VALID_KEY: &str = "valid-key";

/// How the mock answers conversion requests
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockConversion {
    /// One result per statement; statements containing `FAIL_MARKER` fail
    Working,
    /// The whole request fails with a 500
    Failing,
    /// Drops the last result so the count no longer matches
    ShortResponse,
    /// Reports a status other than success/error
    UnknownStatus,
}

/// Calls received by the mock, in arrival order
#[derive(Debug, Clone, Default)]
pub struct MockCalls {
    pub list_dialects: usize,
    pub list_formats: usize,
    pub parse_text: Vec<String>,
    pub parse_file: Vec<String>,
    pub convert: Vec<ConvertRequest>,
    pub export: Vec<ExportPayload>,
    pub validate_key: Vec<String>,
}

/// In-process stand-in for the SQL services
#[derive(Debug)]
pub struct MockService {
    dialects: Vec<String>,
    formats: Vec<String>,
    catalog_failure: bool,
    parse_failure: Option<ServiceError>,
    parse_delays: HashMap<String, Duration>,
    conversion: MockConversion,
    conversion_delay: Option<Duration>,
    failing_formats: HashSet<String>,
    export_delay: Option<Duration>,
    account_delay: Option<Duration>,
    calls: Arc<Mutex<MockCalls>>,
}

impl MockService {
    /// Create a mock where every collaborator succeeds
    pub fn working() -> Self {
        Self {
            dialects: vec![
                "MySQL".to_string(),
                "PostgreSQL".to_string(),
                "Oracle".to_string(),
            ],
            formats: vec![
                "PDF".to_string(),
                "Word Document".to_string(),
                "Excel".to_string(),
                "SQL File".to_string(),
            ],
            catalog_failure: false,
            parse_failure: None,
            parse_delays: HashMap::new(),
            conversion: MockConversion::Working,
            conversion_delay: None,
            failing_formats: HashSet::new(),
            export_delay: None,
            account_delay: None,
            calls: Arc::new(Mutex::new(MockCalls::default())),
        }
    }

    pub fn with_dialects(mut self, dialects: &[&str]) -> Self {
        self.dialects = dialects.iter().map(|d| d.to_string()).collect();
        self
    }

    pub fn with_formats(mut self, formats: &[&str]) -> Self {
        self.formats = formats.iter().map(|f| f.to_string()).collect();
        self
    }

    /// Make the format listing fail
    pub fn failing_catalog(mut self) -> Self {
        self.catalog_failure = true;
        self
    }

    /// Make every parse call fail with the given error
    pub fn failing_parse(mut self, error: ServiceError) -> Self {
        self.parse_failure = Some(error);
        self
    }

    /// Delay the answer to a parse request for this exact text
    pub fn with_parse_delay(mut self, sql_text: &str, delay: Duration) -> Self {
        self.parse_delays.insert(sql_text.to_string(), delay);
        self
    }

    pub fn with_conversion(mut self, conversion: MockConversion) -> Self {
        self.conversion = conversion;
        self
    }

    pub fn failing_conversion(self) -> Self {
        self.with_conversion(MockConversion::Failing)
    }

    pub fn with_conversion_delay(mut self, delay: Duration) -> Self {
        self.conversion_delay = Some(delay);
        self
    }

    /// Make export fail for one format
    pub fn with_failing_format(mut self, format: &str) -> Self {
        self.failing_formats.insert(format.to_string());
        self
    }

    pub fn with_export_delay(mut self, delay: Duration) -> Self {
        self.export_delay = Some(delay);
        self
    }

    /// Snapshot of the calls received so far
    /// Delay key validation and health answers
    pub fn with_account_delay(mut self, delay: Duration) -> Self {
        self.account_delay = Some(delay);
        self
    }

    pub fn calls(&self) -> MockCalls {
        self.calls.lock().clone()
    }

    /// Total number of requests that reached the mock
    pub fn request_count(&self) -> usize {
        let calls = self.calls.lock();
        calls.list_dialects
            + calls.list_formats
            + calls.parse_text.len()
            + calls.parse_file.len()
            + calls.convert.len()
            + calls.export.len()
            + calls.validate_key.len()
    }

    /// The naive splitter the mock uses in place of a real SQL parser
    pub fn split_statements(sql_text: &str) -> Vec<String> {
        sql_text
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("{};", s))
            .collect()
    }

    fn convert_one(statement: &str, target: &str) -> ResultRecord {
        if statement.contains(FAIL_MARKER) {
            ResultRecord {
                original: statement.to_string(),
                converted: None,
                status: "error".to_string(),
                notes: Some(format!("Unsupported construct for {}", target)),
            }
        } else {
            ResultRecord {
                original: statement.to_string(),
                converted: Some(format!("/* {} */ {}", target, statement)),
                status: "success".to_string(),
                notes: None,
            }
        }
    }
}

impl Clone for MockService {
    fn clone(&self) -> Self {
        Self {
            dialects: self.dialects.clone(),
            formats: self.formats.clone(),
            catalog_failure: self.catalog_failure,
            parse_failure: self.parse_failure.clone(),
            parse_delays: self.parse_delays.clone(),
            conversion: self.conversion,
            conversion_delay: self.conversion_delay,
            failing_formats: self.failing_formats.clone(),
            export_delay: self.export_delay,
            account_delay: self.account_delay,
            calls: Arc::clone(&self.calls),
        }
    }
}

#[async_trait]
impl CatalogService for MockService {
    async fn list_dialects(&self) -> Result<Vec<String>, ServiceError> {
        self.calls.lock().list_dialects += 1;
        Ok(self.dialects.clone())
    }

    async fn list_formats(&self) -> Result<Vec<String>, ServiceError> {
        self.calls.lock().list_formats += 1;
        if self.catalog_failure {
            return Err(ServiceError::ApiError {
                status_code: 503,
                message: "Simulated catalog failure".to_string(),
            });
        }
        Ok(self.formats.clone())
    }
}

#[async_trait]
impl ExtractionService for MockService {
    async fn parse_file(&self, file_name: &str, content: Bytes) -> Result<ParseResponse, ServiceError> {
        self.calls.lock().parse_file.push(file_name.to_string());
        if let Some(error) = &self.parse_failure {
            return Err(error.clone());
        }

        let text = String::from_utf8_lossy(&content);
        let mut response = ParseResponse::new(Self::split_statements(&text));
        response.filename = Some(file_name.to_string());
        Ok(response)
    }

    async fn parse_text(&self, sql_text: &str) -> Result<ParseResponse, ServiceError> {
        self.calls.lock().parse_text.push(sql_text.to_string());

        if let Some(delay) = self.parse_delays.get(sql_text) {
            tokio::time::sleep(*delay).await;
        }
        if let Some(error) = &self.parse_failure {
            return Err(error.clone());
        }

        Ok(ParseResponse::new(Self::split_statements(sql_text)))
    }
}

#[async_trait]
impl ConversionService for MockService {
    async fn convert(&self, request: ConvertRequest) -> Result<ConvertResponse, ServiceError> {
        self.calls.lock().convert.push(request.clone());

        if let Some(delay) = self.conversion_delay {
            tokio::time::sleep(delay).await;
        }

        let mut results: Vec<ResultRecord> = request
            .statements
            .iter()
            .map(|s| Self::convert_one(s, &request.target_dialect))
            .collect();

        match self.conversion {
            MockConversion::Working => {}
            MockConversion::Failing => {
                return Err(ServiceError::ApiError {
                    status_code: 500,
                    message: "Simulated conversion failure".to_string(),
                });
            }
            MockConversion::ShortResponse => {
                results.pop();
            }
            MockConversion::UnknownStatus => {
                if let Some(first) = results.first_mut() {
                    first.status = "pending".to_string();
                }
            }
        }

        let success_count = results.iter().filter(|r| r.status == "success").count();
        let total_count = results.len();
        Ok(ConvertResponse {
            results,
            success_count,
            error_count: total_count - success_count,
            total_count,
        })
    }
}

#[async_trait]
impl ExportService for MockService {
    async fn export(&self, payload: ExportPayload) -> Result<Bytes, ServiceError> {
        self.calls.lock().export.push(payload.clone());

        if let Some(delay) = self.export_delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing_formats.contains(&payload.format) {
            return Err(ServiceError::ApiError {
                status_code: 500,
                message: format!("Simulated {} rendering failure", payload.format),
            });
        }

        let document = payload
            .results
            .iter()
            .filter_map(|r| r.converted.as_deref())
            .collect::<Vec<_>>()
            .join("\n");
        Ok(Bytes::from(format!("{}\n{}", payload.format, document)))
    }
}

#[async_trait]
impl AccountService for MockService {
    async fn validate_key(&self, api_key: &str) -> Result<KeyValidation, ServiceError> {
        self.calls.lock().validate_key.push(api_key.to_string());
        if let Some(delay) = self.account_delay {
            tokio::time::sleep(delay).await;
        }
        let valid = api_key == VALID_KEY;
        Ok(KeyValidation {
            valid,
            message: if valid { "API key is valid" } else { "API key is invalid" }.to_string(),
        })
    }

    async fn health(&self) -> Result<HealthStatus, ServiceError> {
        if let Some(delay) = self.account_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(HealthStatus {
            message: "SQL Dialect Converter API".to_string(),
            version: "1.0.0".to_string(),
            status: "running".to_string(),
        })
    }
}
