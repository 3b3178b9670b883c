//! Interfaces to the outside world: where records go and where work comes from

pub mod sqlite;
pub mod work_items;

pub use sqlite::SqliteRecordStore;
pub use work_items::FileWorkItems;

use std::future::Future;

use crate::error::{LookupError, LookupResult};
use crate::types::{ExtractedRecord, PersistedId, WorkItem};

/// Destination for extracted records
///
/// Called at most once per lookup, only after navigation succeeded. Errors
/// are recorded on the outcome and never fail the lookup.
pub trait RecordSink: Send + Sync {
    fn persist(
        &self,
        record: &ExtractedRecord,
    ) -> impl Future<Output = LookupResult<PersistedId>> + Send;
}

/// Placeholder sink type for orchestrators without persistence
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSink;

impl RecordSink for NoSink {
    async fn persist(&self, _record: &ExtractedRecord) -> LookupResult<PersistedId> {
        Err(LookupError::PersistenceFailed(
            "no record sink configured".to_string(),
        ))
    }
}

/// Source of work items for a batch
pub trait WorkItemSource {
    fn load(&self) -> impl Future<Output = LookupResult<Vec<WorkItem>>> + Send;
}
