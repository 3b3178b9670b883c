//! Progress reporting abstraction for batch runs
//!
//! Defines the `ProgressReporter` trait for batch lifecycle events and
//! provides a no-op and a tracing-backed implementation.

use serde::Serialize;
use tracing::{info, warn};

use crate::error::FailureKind;
use crate::types::LookupOutcome;

/// Counts reported when a batch ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub in_registry: usize,
}

impl BatchSummary {
    #[must_use]
    pub fn from_outcomes(total: usize, outcomes: &[LookupOutcome]) -> Self {
        let mut summary = Self {
            total,
            ..Self::default()
        };
        for outcome in outcomes {
            match outcome.kind() {
                None => summary.succeeded += 1,
                Some(FailureKind::Cancelled) => summary.cancelled += 1,
                Some(_) => summary.failed += 1,
            }
            if outcome.in_registry() {
                summary.in_registry += 1;
            }
        }
        summary
    }
}

/// Trait for reporting batch progress at key lifecycle events
pub trait ProgressReporter: Send + Sync {
    fn batch_started(&self, total: usize);

    /// `index` is 0-based
    fn item_started(&self, index: usize, total: usize, inn: &str);

    fn item_finished(&self, index: usize, total: usize, outcome: &LookupOutcome);

    fn batch_cancelled(&self, completed: usize, total: usize);

    fn batch_finished(&self, summary: &BatchSummary);
}

/// Progress reporter that does nothing
#[derive(Debug, Clone, Copy)]
pub struct NoOpProgress;

impl ProgressReporter for NoOpProgress {
    #[inline(always)]
    fn batch_started(&self, _total: usize) {}

    #[inline(always)]
    fn item_started(&self, _index: usize, _total: usize, _inn: &str) {}

    #[inline(always)]
    fn item_finished(&self, _index: usize, _total: usize, _outcome: &LookupOutcome) {}

    #[inline(always)]
    fn batch_cancelled(&self, _completed: usize, _total: usize) {}

    #[inline(always)]
    fn batch_finished(&self, _summary: &BatchSummary) {}
}

/// Logs every event through `tracing`
#[derive(Debug, Clone, Copy)]
pub struct TracingProgress;

impl ProgressReporter for TracingProgress {
    fn batch_started(&self, total: usize) {
        info!("Starting batch of {} companies", total);
    }

    fn item_started(&self, index: usize, total: usize, inn: &str) {
        info!("[{}/{}] Looking up INN {}", index + 1, total, inn);
    }

    fn item_finished(&self, index: usize, total: usize, outcome: &LookupOutcome) {
        match (outcome.record(), outcome.failure()) {
            (Some(record), _) => info!(
                "[{}/{}] {} -> {} (in registry: {})",
                index + 1,
                total,
                record.primary_id,
                record.name,
                record.in_registry
            ),
            (None, Some(failure)) => warn!(
                "[{}/{}] {} failed ({}): {}",
                index + 1,
                total,
                outcome.primary_id(),
                failure.kind,
                failure.message
            ),
            (None, None) => {}
        }
    }

    fn batch_cancelled(&self, completed: usize, total: usize) {
        warn!("Batch cancelled after {} of {} items", completed, total);
    }

    fn batch_finished(&self, summary: &BatchSummary) {
        info!(
            "Batch finished: {} ok, {} failed, {} cancelled, {} in registry (of {})",
            summary.succeeded, summary.failed, summary.cancelled, summary.in_registry, summary.total
        );
    }
}
