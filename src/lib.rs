pub mod batch;
pub mod browser_setup;
pub mod classifier;
pub mod config;
pub mod error;
pub mod extractor;
pub mod lookup;
pub mod navigator;
pub mod persist;
pub mod types;
pub mod utils;

pub use batch::{BatchRunner, BatchSummary, NoOpProgress, ProgressReporter, TracingProgress};
pub use browser_setup::{download_managed_browser, find_browser_executable, launch_browser};
pub use classifier::{
    Classification, INDETERMINATE_POLICY, IndeterminatePolicy, RegistryClassifier,
    RegistryDecision, RegistryStatus,
};
pub use config::{Candidate, ExtractionRules, LookupConfig, TargetProfile, Timings};
pub use error::{FailureKind, LookupError, LookupResult};
pub use extractor::{ExtractedFields, FieldExtractor, ParsedDocument, Probe};
pub use lookup::{LookupOrchestrator, RetryPolicy};
pub use navigator::{ChromiumDriver, HttpFallback, InputHandle, Navigator, PageDriver};
pub use persist::{FileWorkItems, NoSink, RecordSink, SqliteRecordStore, WorkItemSource};
pub use types::{
    DocumentOrigin, ExtractedRecord, Inn, KnownMetadata, LookupFailure, LookupOutcome,
    OutcomeResult, PersistStatus, PersistedId, RawDocument, RecordSource, TaxFields, TaxFigure,
    WorkItem,
};

/// Launch Chrome and build an orchestrator for `config`
///
/// # Errors
///
/// [`LookupError::NavigationFailed`] when the browser cannot be started,
/// [`LookupError::Config`] when the profile does not compile.
pub async fn launch(config: &LookupConfig) -> LookupResult<LookupOrchestrator<ChromiumDriver>> {
    let driver = ChromiumDriver::launch(config)
        .await
        .map_err(|e| LookupError::navigation(format!("failed to start browser: {e:#}")))?;
    LookupOrchestrator::new(driver, config)
}
