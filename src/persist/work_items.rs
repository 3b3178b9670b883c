//! Work items from a file
//!
//! Two formats are accepted:
//! * a JSON array of objects (`{"inn": "7707083893", "name": "...", ...}`);
//!   `inn` may be a string or a number
//! * plain text, one INN per line, optionally followed by `;name`; blank
//!   lines and `#` comments are ignored
//!
//! Entries whose INN is not 10 or 12 digits (e.g. "Нет данных") are skipped.

use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::WorkItemSource;
use crate::error::{LookupError, LookupResult};
use crate::types::{Inn, KnownMetadata, WorkItem};

#[derive(Debug, Deserialize)]
struct JsonItem {
    inn: Value,
    #[serde(flatten)]
    metadata: KnownMetadata,
}

#[derive(Debug, Clone)]
pub struct FileWorkItems {
    path: PathBuf,
}

impl FileWorkItems {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl WorkItemSource for FileWorkItems {
    async fn load(&self) -> LookupResult<Vec<WorkItem>> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            LookupError::Config(format!("cannot read {}: {e}", self.path.display()))
        })?;
        let items = parse_work_items(&raw)?;
        info!("Loaded {} work items from {}", items.len(), self.path.display());
        Ok(items)
    }
}

/// Parse either supported format
///
/// # Errors
///
/// [`LookupError::Config`] for malformed JSON.
pub fn parse_work_items(raw: &str) -> LookupResult<Vec<WorkItem>> {
    let candidates = if raw.trim_start().starts_with('[') {
        let parsed: Vec<JsonItem> = serde_json::from_str(raw)
            .map_err(|e| LookupError::Config(format!("invalid work item JSON: {e}")))?;
        parsed
            .into_iter()
            .map(|item| {
                let inn = match item.inn {
                    Value::String(s) => s,
                    Value::Number(n) => n.to_string(),
                    other => other.to_string(),
                };
                WorkItem::new(inn).with_metadata(item.metadata)
            })
            .collect::<Vec<_>>()
    } else {
        raw.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(|line| {
                let (inn, name) = match line.split_once(';') {
                    Some((inn, name)) => (inn, Some(name.trim())),
                    None => (line, None),
                };
                let metadata = KnownMetadata {
                    name: name.filter(|n| !n.is_empty()).map(str::to_string),
                    ..KnownMetadata::default()
                };
                WorkItem::new(inn).with_metadata(metadata)
            })
            .collect()
    };

    Ok(candidates
        .into_iter()
        .filter(|item| match Inn::parse(&item.inn) {
            Ok(_) => true,
            Err(_) => {
                warn!("Skipping work item with invalid INN '{}'", item.inn);
                false
            }
        })
        .collect())
}
