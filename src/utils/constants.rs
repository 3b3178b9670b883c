//! Shared configuration constants for inn_registry
//!
//! Default values used by `LookupConfig`, the navigator and the batch runner.

use std::time::Duration;

/// Settle after the entry page loads
pub const DEFAULT_AFTER_LOAD: Duration = Duration::from_secs(3);

/// Settle after clicking the "search again" affordance
pub const DEFAULT_AFTER_SEARCH_AGAIN: Duration = Duration::from_secs(2);

/// Settle between typing the INN and pressing Enter
pub const DEFAULT_AFTER_TYPING: Duration = Duration::from_secs(1);

/// Settle after submitting the search
///
/// The registry renders its answer client-side; shorter values produce
/// documents that still show the search form.
pub const DEFAULT_AFTER_SUBMIT: Duration = Duration::from_secs(5);

/// Settle after clicking through from a results list to a detail page
pub const DEFAULT_AFTER_RESULT_CLICK: Duration = Duration::from_secs(3);

/// Upper bound for finding an interactable search input
pub const DEFAULT_INPUT_WAIT: Duration = Duration::from_secs(5);

/// Upper bound for the ready signal after submit
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(10);

/// Upper bound for one whole navigation
pub const DEFAULT_NAVIGATION_TIMEOUT: Duration = Duration::from_secs(60);

/// Interval between element polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Pause between consecutive lookups in a batch
pub const DEFAULT_INTER_REQUEST_DELAY: Duration = Duration::from_secs(3);

/// Timeout for the plain HTTP fallback fetch
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Retry attempts after the first failed navigation
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Base delay for exponential backoff (doubles each attempt)
pub const DEFAULT_RETRY_BASE_DELAY: Duration = Duration::from_secs(1);

/// Random jitter added on top of each backoff delay
pub const DEFAULT_RETRY_JITTER: Duration = Duration::from_secs(1);

/// Documents kept in the in-memory LRU cache
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// Chrome user agent string for stealth mode
///
/// Updated: 2025-01-29 to Chrome 132 (current stable)
pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36";

/// Accept-Language sent by the HTTP fallback
pub const ACCEPT_LANGUAGE: &str = "ru-RU,ru;q=0.9,en-US;q=0.8,en;q=0.7";
