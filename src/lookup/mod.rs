//! Lookup orchestration
//!
//! `LookupOrchestrator` owns the single browser session and runs one lookup
//! at a time through
//! `Idle -> Navigating -> Extracting -> Persisting -> Done`, with any stage
//! able to end in `Failed(kind)`. A failure of one lookup never affects the
//! next.

pub mod cache;
pub mod retry;

pub use cache::DocumentCache;
pub use retry::RetryPolicy;

use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::batch::BatchRunner;
use crate::classifier::RegistryClassifier;
use crate::config::LookupConfig;
use crate::error::{FailureKind, LookupError, LookupResult};
use crate::extractor::{FieldExtractor, ParsedDocument};
use crate::navigator::{HttpFallback, Navigator, PageDriver};
use crate::persist::{NoSink, RecordSink};
use crate::types::{
    ExtractedRecord, Inn, LookupOutcome, OutcomeResult, PersistStatus, RawDocument, RecordSource,
    TaxFields, WorkItem,
};
use crate::utils::cancellable_sleep;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LookupState {
    Idle,
    Navigating,
    Extracting,
    Persisting,
    Done,
    Failed(FailureKind),
}

fn transition(inn: &str, state: &mut LookupState, next: LookupState) {
    debug!("[{}] {:?} -> {:?}", inn, state, next);
    *state = next;
}

pub struct LookupOrchestrator<D, S = NoSink> {
    navigator: Navigator<D>,
    extractor: FieldExtractor,
    classifier: RegistryClassifier,
    fallback: Option<HttpFallback>,
    cache: DocumentCache,
    sink: Option<S>,
    retry: RetryPolicy,
    inter_request_delay: Duration,
    /// When the last live navigation ended
    last_navigation: Option<Instant>,
    cancel: CancellationToken,
}

impl<D: PageDriver> LookupOrchestrator<D, NoSink> {
    /// Build an orchestrator around `driver`
    ///
    /// # Errors
    ///
    /// [`LookupError::Config`] when the profile's candidates do not compile.
    pub fn new(driver: D, config: &LookupConfig) -> LookupResult<Self> {
        let profile = config.profile();
        let fallback = match &profile.query_url {
            Some(template) => Some(HttpFallback::new(template.clone(), config.request_timeout())?),
            None => None,
        };
        Ok(Self {
            navigator: Navigator::new(driver, config),
            extractor: FieldExtractor::new(&profile.extraction)?,
            classifier: RegistryClassifier::new(profile),
            fallback,
            cache: DocumentCache::new(config.cache_capacity()),
            sink: None,
            retry: config.retry(),
            inter_request_delay: config.inter_request_delay(),
            last_navigation: None,
            cancel: CancellationToken::new(),
        })
    }
}

impl<D: PageDriver, S: RecordSink> LookupOrchestrator<D, S> {
    /// Persist every successful record to `sink`
    pub fn with_sink<S2: RecordSink>(self, sink: S2) -> LookupOrchestrator<D, S2> {
        LookupOrchestrator {
            navigator: self.navigator,
            extractor: self.extractor,
            classifier: self.classifier,
            fallback: self.fallback,
            cache: self.cache,
            sink: Some(sink),
            retry: self.retry,
            inter_request_delay: self.inter_request_delay,
            last_navigation: self.last_navigation,
            cancel: self.cancel,
        }
    }

    /// Use an externally owned cancellation token
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    #[must_use]
    pub fn inter_request_delay(&self) -> Duration {
        self.inter_request_delay
    }

    #[must_use]
    pub fn sink(&self) -> Option<&S> {
        self.sink.as_ref()
    }

    #[must_use]
    pub fn navigator(&self) -> &Navigator<D> {
        &self.navigator
    }

    /// Seed the document cache, e.g. from a previous run
    pub fn cache_document(&mut self, inn: Inn, doc: RawDocument) {
        self.cache.put(inn, doc);
    }

    /// Look up a single INN
    pub async fn lookup_one(&mut self, inn: &str) -> LookupOutcome {
        self.lookup_item(WorkItem::new(inn)).await
    }

    /// Look up one work item; never panics, always returns an outcome
    pub async fn lookup_item(&mut self, item: WorkItem) -> LookupOutcome {
        let mut state = LookupState::Idle;
        let label = item.inn.clone();

        let inn = match item.validate() {
            Ok(inn) => inn,
            Err(e) => return Self::fail(&label, &mut state, item, &e),
        };
        if self.cancel.is_cancelled() {
            return Self::fail(&label, &mut state, item, &LookupError::Cancelled);
        }

        transition(&label, &mut state, LookupState::Navigating);
        let (doc, source) = match self.fetch_document(&inn).await {
            Ok(found) => found,
            Err(e) => return Self::fail(&label, &mut state, item, &e),
        };

        transition(&label, &mut state, LookupState::Extracting);
        let record = match self.build_record(&inn, &item, &doc, source) {
            Ok(record) => record,
            Err(e) => return Self::fail(&label, &mut state, item, &e),
        };
        info!(
            "[{}] {} (in registry: {}, source: {:?})",
            label, record.name, record.in_registry, record.source
        );

        let persistence = match &self.sink {
            Some(sink) => {
                transition(&label, &mut state, LookupState::Persisting);
                match sink.persist(&record).await {
                    Ok(id) => PersistStatus::Persisted { id: id.0 },
                    Err(e) => {
                        warn!("[{}] Persisting record failed: {}", label, e);
                        PersistStatus::Failed {
                            message: e.to_string(),
                        }
                    }
                }
            }
            None => PersistStatus::NotAttempted,
        };

        transition(&label, &mut state, LookupState::Done);
        LookupOutcome::found(item, record, persistence)
    }

    /// Look up each INN in order with `delay` between consecutive lookups
    ///
    /// Live navigations still stay `inter_request_delay` apart.
    pub async fn lookup_many(&mut self, inns: &[String], delay: Duration) -> Vec<LookupOutcome> {
        let items = inns.iter().map(WorkItem::new).collect();
        BatchRunner::new(self).delay(delay).run(items).await
    }

    /// Tax figure for one INN
    ///
    /// # Errors
    ///
    /// [`LookupError::NotFound`] when the lookup fails or the page shows no tax figure.
    pub async fn tax_fields(&mut self, inn: &str) -> LookupResult<TaxFields> {
        let outcome = self.lookup_one(inn).await;
        match outcome.result {
            OutcomeResult::Found { record } => record
                .taxes
                .map(|taxes| TaxFields {
                    taxes_value: taxes.value,
                    taxes_full: taxes.full,
                })
                .ok_or_else(|| LookupError::NotFound(format!("no tax figure for INN {inn}"))),
            OutcomeResult::Failed { failure } => Err(LookupError::NotFound(format!(
                "lookup for INN {inn} failed: {}",
                failure.message
            ))),
        }
    }

    /// Release the browser session
    pub async fn shutdown(&mut self) -> LookupResult<()> {
        info!("Shutting down browser session");
        self.navigator.close().await
    }

    fn fail(
        label: &str,
        state: &mut LookupState,
        item: WorkItem,
        error: &LookupError,
    ) -> LookupOutcome {
        transition(label, state, LookupState::Failed(error.kind()));
        warn!("[{}] Lookup failed: {}", label, error);
        LookupOutcome::failed(item, error)
    }

    async fn fetch_document(&mut self, inn: &Inn) -> LookupResult<(RawDocument, RecordSource)> {
        if let Some(doc) = self.cache.get(inn) {
            debug!("[{}] Serving document from cache", inn);
            return Ok((doc, RecordSource::Cache));
        }

        self.wait_for_turn(inn).await?;
        let navigated = self.navigate_with_retry(inn).await;
        self.last_navigation = Some(Instant::now());

        let error = match navigated {
            Ok(doc) => {
                self.cache.put(inn.clone(), doc.clone());
                return Ok((doc, RecordSource::Live));
            }
            Err(error) => error,
        };

        let Some(fallback) = self
            .fallback
            .as_ref()
            .filter(|_| error.kind() == FailureKind::NavigationFailed)
        else {
            return Err(error);
        };

        warn!("[{}] Browser navigation failed ({}), trying HTTP fallback", inn, error);
        match fallback.fetch(inn).await {
            Ok(doc) => Ok((doc, RecordSource::HttpFallback)),
            Err(fallback_error) => {
                warn!("[{}] HTTP fallback failed: {}", inn, fallback_error);
                Err(error)
            }
        }
    }

    /// Keep live navigations at least `inter_request_delay` apart
    async fn wait_for_turn(&self, inn: &Inn) -> LookupResult<()> {
        let Some(last) = self.last_navigation else {
            return Ok(());
        };
        let remaining = self.inter_request_delay.saturating_sub(last.elapsed());
        if !remaining.is_zero() {
            debug!("[{}] Waiting {}ms before navigating", inn, remaining.as_millis());
        }
        cancellable_sleep(&self.cancel, remaining).await
    }

    async fn navigate_with_retry(&mut self, inn: &Inn) -> LookupResult<RawDocument> {
        let mut attempt = 0;
        loop {
            match self.navigator.navigate(inn, &self.cancel).await {
                Ok(doc) => return Ok(doc),
                Err(e) if self.retry.should_retry(&e, attempt) => {
                    let delay = self.retry.delay_for(attempt);
                    warn!(
                        "[{}] Retryable error, attempt {}/{}, retrying in {}ms: {}",
                        inn,
                        attempt + 1,
                        self.retry.max_retries,
                        delay.as_millis(),
                        e
                    );
                    cancellable_sleep(&self.cancel, delay).await?;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Classify and extract on one parsed document
    fn build_record(
        &self,
        inn: &Inn,
        item: &WorkItem,
        doc: &RawDocument,
        source: RecordSource,
    ) -> LookupResult<ExtractedRecord> {
        let parsed = ParsedDocument::parse(doc);
        let classification = self.classifier.classify(&parsed);
        let fields = self
            .extractor
            .extract(&parsed, inn, item.metadata.name.as_deref())?;
        let decision = self.classifier.resolve(&classification, fields.name_found);

        let source = if fields.page_hits() == 0 {
            warn!("[{}] No field could be read from the page", inn);
            RecordSource::Fallback
        } else {
            source
        };

        Ok(ExtractedRecord {
            name: fields.name,
            primary_id: inn.to_string(),
            ogrn: fields.ogrn.unwrap_or_default(),
            kpp: fields.kpp,
            address: fields.address,
            status: fields
                .status
                .unwrap_or_else(|| decision.status.as_str().to_string()),
            in_registry: decision.in_registry,
            registry_message: decision.message,
            registration_date: fields.registration_date,
            authorized_capital: fields.authorized_capital,
            main_activity: fields.main_activity,
            taxes: fields.taxes,
            source,
            parsed_at: doc.fetched_at,
        })
    }
}
