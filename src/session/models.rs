/*!
 * Session data model.
 *
 * These types are the values the session state machine owns. Counts are
 * never stored independently of the results they describe: `summarize`
 * derives them whenever the result sequence changes.
 */

use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;
use crate::services::models::ResultRecord;

/// Dialects and export formats offered by the catalog service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialectCatalog {
    dialects: Vec<String>,
    formats: Vec<String>,
}

impl DialectCatalog {
    /// Build a catalog, keeping the first occurrence of any repeated dialect
    pub fn new(dialects: Vec<String>, formats: Vec<String>) -> Self {
        let mut unique: Vec<String> = Vec::with_capacity(dialects.len());
        for dialect in dialects {
            if !unique.contains(&dialect) {
                unique.push(dialect);
            }
        }
        Self {
            dialects: unique,
            formats,
        }
    }

    pub fn dialects(&self) -> &[String] {
        &self.dialects
    }

    pub fn formats(&self) -> &[String] {
        &self.formats
    }

    pub fn contains_dialect(&self, dialect: &str) -> bool {
        self.dialects.iter().any(|d| d == dialect)
    }

    /// First two dialects in catalog order, if there are at least two
    pub fn default_selection(&self) -> Option<DialectSelection> {
        match self.dialects.as_slice() {
            [source, target, ..] => Some(DialectSelection::new(source.clone(), target.clone())),
            _ => None,
        }
    }
}

/// Ordered statements extracted from a single input source.
///
/// Never contains empty or whitespace-only entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementSet {
    statements: Vec<String>,
}

impl StatementSet {
    pub fn new<I, S>(statements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            statements: statements
                .into_iter()
                .map(Into::into)
                .filter(|s: &String| !s.trim().is_empty())
                .collect(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.statements
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.statements.clone()
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.statements.get(index).map(String::as_str)
    }

    /// Collapsed preview of one statement: at most `max_chars` characters,
    /// with an ellipsis when the statement was cut
    pub fn preview(&self, index: usize, max_chars: usize) -> Option<String> {
        self.get(index).map(|statement| truncate_chars(statement, max_chars))
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    let single_line = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if single_line.chars().count() <= max_chars {
        return single_line;
    }
    let cut: String = single_line.chars().take(max_chars).collect();
    format!("{}...", cut.trim_end())
}

/// Source and target dialect pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialectSelection {
    pub source: String,
    pub target: String,
}

impl DialectSelection {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    pub fn is_identity(&self) -> bool {
        self.source == self.target
    }
}

impl std::fmt::Display for DialectSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.source, self.target)
    }
}

/// Per-statement conversion outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversionStatus {
    Success,
    Error,
}

impl ConversionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

impl std::str::FromStr for ConversionStatus {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "success" => Ok(Self::Success),
            "error" => Ok(Self::Error),
            other => Err(ServiceError::InvalidResponse(format!(
                "Unknown conversion status: {}",
                other
            ))),
        }
    }
}

/// Result for one statement of the session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionResult {
    pub index: usize,
    pub original: String,
    pub status: ConversionStatus,
    /// Present iff `status` is `Success`
    pub converted: Option<String>,
    pub notes: Option<String>,
}

impl ConversionResult {
    pub fn success(index: usize, original: impl Into<String>, converted: impl Into<String>) -> Self {
        Self {
            index,
            original: original.into(),
            status: ConversionStatus::Success,
            converted: Some(converted.into()),
            notes: None,
        }
    }

    pub fn error(index: usize, original: impl Into<String>, notes: impl Into<String>) -> Self {
        Self {
            index,
            original: original.into(),
            status: ConversionStatus::Error,
            converted: None,
            notes: Some(notes.into()),
        }
    }

    /// Build a result from its wire form, pairing it with the statement that
    /// was submitted at `index`
    pub fn from_record(index: usize, original: &str, record: ResultRecord) -> Result<Self, ServiceError> {
        let status: ConversionStatus = record.status.parse()?;
        let notes = record.notes.filter(|n| !n.trim().is_empty());

        match status {
            ConversionStatus::Success => {
                let converted = record.converted.ok_or_else(|| {
                    ServiceError::InvalidResponse(format!(
                        "Statement {} reported success without converted SQL",
                        index + 1
                    ))
                })?;
                Ok(Self {
                    index,
                    original: original.to_string(),
                    status,
                    converted: Some(converted),
                    notes,
                })
            }
            ConversionStatus::Error => Ok(Self {
                index,
                original: original.to_string(),
                status,
                converted: None,
                notes: Some(notes.unwrap_or_else(|| "Conversion failed".to_string())),
            }),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ConversionStatus::Success
    }

    /// Text placed on the clipboard for this item: the converted SQL when
    /// there is one, otherwise the original statement
    pub fn copy_text(&self) -> &str {
        self.converted.as_deref().unwrap_or(&self.original)
    }

    /// Wire form used when sending this result to the export service
    pub fn to_record(&self) -> ResultRecord {
        ResultRecord {
            original: self.original.clone(),
            converted: self.converted.clone(),
            status: self.status.as_str().to_string(),
            notes: self.notes.clone(),
        }
    }
}

/// Tallies derived from a result sequence
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionSummary {
    pub total: usize,
    pub success: usize,
    pub error: usize,
}

/// Derive the tallies of a result sequence
pub fn summarize(results: &[ConversionResult]) -> ConversionSummary {
    let success = results.iter().filter(|r| r.is_success()).count();
    ConversionSummary {
        total: results.len(),
        success,
        error: results.len() - success,
    }
}

/// Lifecycle state of a conversion session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// No statements
    Empty,
    /// Statements present, no results
    Ready,
    /// A conversion request is in flight
    Converting,
    /// Results present
    Converted,
}

impl SessionState {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Empty => "Empty",
            Self::Ready => "Ready",
            Self::Converting => "Converting",
            Self::Converted => "Converted",
        }
    }
}

/// Read-only copy of the session for presentation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub catalog: Option<DialectCatalog>,
    pub statements: StatementSet,
    pub selection: Option<DialectSelection>,
    pub results: Option<Vec<ConversionResult>>,
    pub summary: ConversionSummary,
}

impl SessionSnapshot {
    /// Whether the convert control should be enabled
    pub fn can_convert(&self) -> bool {
        self.state != SessionState::Converting
            && !self.statements.is_empty()
            && self.selection.as_ref().is_some_and(|s| !s.is_identity())
    }

    /// Converted SQL of every successful result, in order, separated by a blank line
    pub fn copy_all_text(&self) -> String {
        self.results
            .as_deref()
            .unwrap_or_default()
            .iter()
            .filter_map(|r| r.converted.as_deref())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
