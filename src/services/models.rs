/*!
 * Wire types exchanged with the SQL services.
 */

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Response of the dialect listing endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialectsResponse {
    pub dialects: Vec<String>,
}

/// Response of the format listing endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatsResponse {
    pub formats: Vec<String>,
}

/// Body of a free-text parse request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseTextRequest {
    pub sql_text: String,
}

/// Statements extracted from one input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseResponse {
    pub statements: Vec<String>,

    /// Statement count as reported by the service
    #[serde(default)]
    pub count: usize,

    /// Echo of the uploaded file name (file uploads only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl ParseResponse {
    pub fn new(statements: Vec<String>) -> Self {
        let count = statements.len();
        Self {
            statements,
            count,
            filename: None,
        }
    }
}

/// Body of a conversion request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertRequest {
    pub statements: Vec<String>,
    pub source_dialect: String,
    pub target_dialect: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

/// One statement outcome as it travels on the wire.
///
/// Used both in conversion responses and in export payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub original: String,

    #[serde(default)]
    pub converted: Option<String>,

    /// `success` or `error`
    pub status: String,

    #[serde(default)]
    pub notes: Option<String>,
}

/// Response of the conversion endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertResponse {
    pub results: Vec<ResultRecord>,

    // Service-side tallies; the session recomputes its own
    #[serde(default)]
    pub success_count: usize,
    #[serde(default)]
    pub error_count: usize,
    #[serde(default)]
    pub total_count: usize,
}

/// Body of an export request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportPayload {
    pub results: Vec<ResultRecord>,
    pub source_dialect: String,
    pub target_dialect: String,
    pub format: String,
}

/// Response of the key validation endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyValidation {
    pub valid: bool,
    #[serde(default)]
    pub message: String,
}

/// Response of the service root endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub status: String,
}

/// Error body returned with a non-2xx status
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub detail: Value,
}

impl ErrorBody {
    /// Flatten the detail into a single message. Validation errors carry a
    /// structured detail rather than a string.
    pub fn message(&self) -> String {
        match &self.detail {
            Value::String(text) => text.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}
