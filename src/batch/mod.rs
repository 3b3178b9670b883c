//! Sequential, throttled batch lookups
//!
//! Items run one after another on the orchestrator's single browser
//! session, with the inter-request delay between consecutive items. One
//! outcome is produced per input item, in input order, whatever happens.

pub mod progress;

pub use progress::{BatchSummary, NoOpProgress, ProgressReporter, TracingProgress};

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::LookupError;
use crate::lookup::LookupOrchestrator;
use crate::navigator::PageDriver;
use crate::persist::RecordSink;
use crate::types::{LookupOutcome, WorkItem};
use crate::utils::cancellable_sleep;

/// JSON written after every item when a snapshot path is set
#[derive(Debug, Serialize)]
struct Snapshot<'a> {
    summary: BatchSummary,
    completed: usize,
    updated_at: DateTime<Utc>,
    outcomes: &'a [LookupOutcome],
}

pub struct BatchRunner<'a, D, S> {
    orchestrator: &'a mut LookupOrchestrator<D, S>,
    delay: Duration,
    snapshot_path: Option<PathBuf>,
    progress: Box<dyn ProgressReporter>,
    cancel: CancellationToken,
}

impl<'a, D: PageDriver, S: RecordSink> BatchRunner<'a, D, S> {
    /// Runner using the orchestrator's delay and cancellation token
    pub fn new(orchestrator: &'a mut LookupOrchestrator<D, S>) -> Self {
        let delay = orchestrator.inter_request_delay();
        let cancel = orchestrator.cancellation_token();
        Self {
            orchestrator,
            delay,
            snapshot_path: None,
            progress: Box::new(NoOpProgress),
            cancel,
        }
    }

    #[must_use]
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Write a JSON progress snapshot to `path` after every item
    #[must_use]
    pub fn snapshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn progress(mut self, progress: Box<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    /// Look up every item; the result is index-aligned with `items`
    ///
    /// On cancellation the remaining items get `cancelled` outcomes and the
    /// browser session is released.
    pub async fn run(self, items: Vec<WorkItem>) -> Vec<LookupOutcome> {
        let total = items.len();
        self.progress.batch_started(total);

        let mut outcomes = Vec::with_capacity(total);
        let mut pending = items.into_iter().enumerate();
        let mut cancelled = false;

        for (index, item) in pending.by_ref() {
            let may_start = if index > 0 {
                cancellable_sleep(&self.cancel, self.delay).await.is_ok()
            } else {
                !self.cancel.is_cancelled()
            };
            if !may_start {
                outcomes.push(LookupOutcome::failed(item, &LookupError::Cancelled));
                cancelled = true;
                break;
            }

            self.progress.item_started(index, total, &item.inn);
            let outcome = self.orchestrator.lookup_item(item).await;
            self.progress.item_finished(index, total, &outcome);
            outcomes.push(outcome);
            self.write_snapshot(&outcomes, total).await;

            if self.cancel.is_cancelled() {
                cancelled = true;
                break;
            }
        }

        if cancelled {
            let completed = outcomes.iter().filter(|o| o.kind().is_none()).count();
            self.progress.batch_cancelled(completed, total);
            outcomes.extend(
                pending.map(|(_, item)| LookupOutcome::failed(item, &LookupError::Cancelled)),
            );
            if let Err(e) = self.orchestrator.shutdown().await {
                warn!("Failed to release browser session after cancellation: {}", e);
            }
            self.write_snapshot(&outcomes, total).await;
        }

        self.progress
            .batch_finished(&BatchSummary::from_outcomes(total, &outcomes));
        outcomes
    }

    async fn write_snapshot(&self, outcomes: &[LookupOutcome], total: usize) {
        let Some(path) = &self.snapshot_path else {
            return;
        };
        let snapshot = Snapshot {
            summary: BatchSummary::from_outcomes(total, outcomes),
            completed: outcomes.len(),
            updated_at: Utc::now(),
            outcomes,
        };
        match serde_json::to_vec_pretty(&snapshot) {
            Ok(bytes) => write_atomic(path, &bytes).await,
            Err(e) => warn!("Failed to serialize batch snapshot: {}", e),
        }
    }
}

/// Write via a sibling temp file and rename so readers never see a partial file
async fn write_atomic(path: &Path, bytes: &[u8]) {
    let tmp = path.with_extension("json.tmp");
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && let Err(e) = tokio::fs::create_dir_all(parent).await
    {
        warn!("Cannot create snapshot directory {}: {}", parent.display(), e);
        return;
    }
    if let Err(e) = tokio::fs::write(&tmp, bytes).await {
        warn!("Failed to write snapshot {}: {}", tmp.display(), e);
        return;
    }
    match tokio::fs::rename(&tmp, path).await {
        Ok(()) => debug!("Snapshot written to {}", path.display()),
        Err(e) => warn!("Failed to move snapshot into place at {}: {}", path.display(), e),
    }
}
