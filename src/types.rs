//! Data structures shared across the lookup pipeline
//!
//! `WorkItem` goes in, `LookupOutcome` comes out. `RawDocument` only lives
//! for the duration of a single lookup (or in the document cache).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::{FailureKind, LookupError};

/// Validated Russian taxpayer number: 10 digits (organization) or 12 (individual)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Inn(String);

impl Inn {
    pub fn parse(raw: &str) -> Result<Self, LookupError> {
        let trimmed = raw.trim();
        let digits_only = trimmed.bytes().all(|b| b.is_ascii_digit());
        if digits_only && matches!(trimmed.len(), 10 | 12) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(LookupError::InvalidIdentifier(trimmed.to_string()))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Organizations have 10 digit INNs, individual entrepreneurs 12
    #[must_use]
    pub fn is_organization(&self) -> bool {
        self.0.len() == 10
    }
}

impl TryFrom<String> for Inn {
    type Error = LookupError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Inn> for String {
    fn from(inn: Inn) -> Self {
        inn.0
    }
}

impl fmt::Display for Inn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Metadata a batch source may already know about a company
///
/// Spreadsheet exports often carry bare numbers here; they are kept as text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownMetadata {
    #[serde(default, deserialize_with = "loose_text", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "loose_text", skip_serializing_if = "Option::is_none")]
    pub revenue: Option<String>,
    #[serde(default, deserialize_with = "loose_text", skip_serializing_if = "Option::is_none")]
    pub taxes_paid: Option<String>,
    #[serde(default, deserialize_with = "loose_text", skip_serializing_if = "Option::is_none")]
    pub employees: Option<String>,
}

fn loose_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

/// One identifier to look up, as supplied by the caller or a batch source
///
/// The identifier is kept verbatim (trimmed) so that an invalid input can
/// still be echoed back in its outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    pub inn: String,
    #[serde(flatten)]
    pub metadata: KnownMetadata,
}

impl WorkItem {
    pub fn new(inn: impl Into<String>) -> Self {
        Self {
            inn: inn.into().trim().to_string(),
            metadata: KnownMetadata::default(),
        }
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: KnownMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn validate(&self) -> Result<Inn, LookupError> {
        Inn::parse(&self.inn)
    }
}

/// How a raw document was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentOrigin {
    Browser,
    HttpFallback,
}

/// HTML and terminal URL captured after a navigation attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    pub html: String,
    pub url: String,
    pub fetched_at: DateTime<Utc>,
    pub origin: DocumentOrigin,
}

impl RawDocument {
    pub fn new(html: impl Into<String>, url: impl Into<String>, origin: DocumentOrigin) -> Self {
        Self {
            html: html.into(),
            url: url.into(),
            fetched_at: Utc::now(),
            origin,
        }
    }
}

/// Which path produced a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordSource {
    /// Live browser navigation
    Live,
    /// Plain HTTP fetch of the query URL after the browser path failed
    HttpFallback,
    /// Document served from the in-memory cache
    Cache,
    /// A document was obtained but no page field could be read from it
    Fallback,
}

impl RecordSource {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::HttpFallback => "http_fallback",
            Self::Cache => "cache",
            Self::Fallback => "fallback",
        }
    }
}

/// Monetary figure as shown on the page, e.g. `12 500 тыс. руб.`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxFigure {
    /// Amount as printed (`"12 500"`)
    pub value: String,
    /// Unit qualifier (`"тыс. руб."` or `"млн руб."`)
    pub unit: String,
    /// `"<value> <unit>"`
    pub full: String,
}

impl TaxFigure {
    pub fn new(value: impl Into<String>, unit: impl Into<String>) -> Self {
        let value = value.into();
        let unit = unit.into();
        let full = format!("{value} {unit}");
        Self { value, unit, full }
    }
}

/// Normalized output of a successful (or degraded) lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedRecord {
    pub name: String,
    /// Always the looked-up INN, never empty
    pub primary_id: String,
    pub ogrn: String,
    pub kpp: Option<String>,
    pub address: Option<String>,
    pub status: String,
    pub in_registry: bool,
    pub registry_message: String,
    pub registration_date: Option<String>,
    pub authorized_capital: Option<String>,
    pub main_activity: Option<String>,
    pub taxes: Option<TaxFigure>,
    pub source: RecordSource,
    pub parsed_at: DateTime<Utc>,
}

/// Tax figures exposed to API callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxFields {
    pub taxes_value: String,
    pub taxes_full: String,
}

/// Row id returned by a record sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedId(pub i64);

/// Result of the best-effort persistence step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PersistStatus {
    NotAttempted,
    Persisted { id: i64 },
    Failed { message: String },
}

/// Typed failure of one lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl From<&LookupError> for LookupFailure {
    fn from(error: &LookupError) -> Self {
        Self {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// Record or failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeResult {
    Found { record: ExtractedRecord },
    Failed { failure: LookupFailure },
}

/// Exactly one per work item per attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupOutcome {
    pub item: WorkItem,
    #[serde(flatten)]
    pub result: OutcomeResult,
    pub persistence: PersistStatus,
}

impl LookupOutcome {
    pub fn found(item: WorkItem, record: ExtractedRecord, persistence: PersistStatus) -> Self {
        Self {
            item,
            result: OutcomeResult::Found { record },
            persistence,
        }
    }

    pub fn failed(item: WorkItem, error: &LookupError) -> Self {
        Self {
            item,
            result: OutcomeResult::Failed {
                failure: error.into(),
            },
            persistence: PersistStatus::NotAttempted,
        }
    }

    /// The identifier that was looked up, echoed even on failure
    #[must_use]
    pub fn primary_id(&self) -> &str {
        match &self.result {
            OutcomeResult::Found { record } => &record.primary_id,
            OutcomeResult::Failed { .. } => &self.item.inn,
        }
    }

    /// Registry membership; `false` for every failed lookup
    #[must_use]
    pub fn in_registry(&self) -> bool {
        match &self.result {
            OutcomeResult::Found { record } => record.in_registry,
            OutcomeResult::Failed { .. } => false,
        }
    }

    #[must_use]
    pub fn record(&self) -> Option<&ExtractedRecord> {
        match &self.result {
            OutcomeResult::Found { record } => Some(record),
            OutcomeResult::Failed { .. } => None,
        }
    }

    #[must_use]
    pub fn failure(&self) -> Option<&LookupFailure> {
        match &self.result {
            OutcomeResult::Found { .. } => None,
            OutcomeResult::Failed { failure } => Some(failure),
        }
    }

    /// Failure kind, `None` for successful lookups
    #[must_use]
    pub fn kind(&self) -> Option<FailureKind> {
        self.failure().map(|f| f.kind)
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.result, OutcomeResult::Found { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inn_accepts_ten_and_twelve_digits() {
        assert!(Inn::parse("7707083893").is_ok());
        assert!(Inn::parse(" 500100732259 ").is_ok());
        assert!(Inn::parse("77070838").is_err());
        assert!(Inn::parse("77070838931").is_err());
        assert!(Inn::parse("77070838９3").is_err());
        assert!(Inn::parse("Нет данных").is_err());
    }

    #[test]
    fn failed_outcome_echoes_identifier_and_is_not_in_registry() {
        let outcome = LookupOutcome::failed(
            WorkItem::new("7707083893"),
            &LookupError::navigation("connection refused"),
        );
        assert_eq!(outcome.primary_id(), "7707083893");
        assert!(!outcome.in_registry());
        assert!(outcome.record().is_none());
        assert_eq!(outcome.kind(), Some(FailureKind::NavigationFailed));
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let error = LookupError::InvalidIdentifier("123".into());
        let outcome = LookupOutcome::failed(WorkItem::new("123"), &error);
        let json = serde_json::to_value(&outcome).expect("serialize");
        assert_eq!(json["status"], "failed");
        assert_eq!(json["failure"]["kind"], "invalid_identifier");
        assert_eq!(json["item"]["inn"], "123");
        assert_eq!(json["persistence"]["state"], "not_attempted");
    }
}
