use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::profile::TargetProfile;
use crate::lookup::RetryPolicy;
use crate::utils::{
    DEFAULT_AFTER_LOAD, DEFAULT_AFTER_RESULT_CLICK, DEFAULT_AFTER_SEARCH_AGAIN,
    DEFAULT_AFTER_SUBMIT, DEFAULT_AFTER_TYPING, DEFAULT_INPUT_WAIT, DEFAULT_NAVIGATION_TIMEOUT,
    DEFAULT_POLL_INTERVAL, DEFAULT_READY_TIMEOUT,
};

/// Settle delays and wait bounds used by the navigator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timings {
    pub after_load: Duration,
    pub after_search_again: Duration,
    pub after_typing: Duration,
    pub after_submit: Duration,
    pub after_result_click: Duration,
    pub input_wait: Duration,
    pub ready_timeout: Duration,
    pub navigation_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            after_load: DEFAULT_AFTER_LOAD,
            after_search_again: DEFAULT_AFTER_SEARCH_AGAIN,
            after_typing: DEFAULT_AFTER_TYPING,
            after_submit: DEFAULT_AFTER_SUBMIT,
            after_result_click: DEFAULT_AFTER_RESULT_CLICK,
            input_wait: DEFAULT_INPUT_WAIT,
            ready_timeout: DEFAULT_READY_TIMEOUT,
            navigation_timeout: DEFAULT_NAVIGATION_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl Timings {
    /// Worst case of every bounded step in one navigation
    #[must_use]
    pub fn worst_case_steps(&self) -> Duration {
        self.after_load
            + self.input_wait
            + self.after_search_again
            + self.input_wait
            + self.after_typing
            + self.after_submit
            + self.ready_timeout
            + self.input_wait
            + self.after_result_click
    }
}

/// Validated lookup configuration
///
/// Built through [`LookupConfig::builder`]; a profile is required.
#[derive(Debug, Clone)]
pub struct LookupConfig {
    pub(crate) profile: TargetProfile,
    pub(crate) timings: Timings,
    pub(crate) retry: RetryPolicy,
    pub(crate) inter_request_delay: Duration,
    pub(crate) cache_capacity: usize,
    pub(crate) dump_dir: Option<PathBuf>,
    pub(crate) headless: bool,
    pub(crate) chrome_data_dir: Option<PathBuf>,
    pub(crate) request_timeout: Duration,
}

impl LookupConfig {
    #[must_use]
    pub fn profile(&self) -> &TargetProfile {
        &self.profile
    }

    #[must_use]
    pub fn timings(&self) -> &Timings {
        &self.timings
    }

    #[must_use]
    pub fn retry(&self) -> RetryPolicy {
        self.retry
    }

    /// Pause between consecutive lookups in a batch
    #[must_use]
    pub fn inter_request_delay(&self) -> Duration {
        self.inter_request_delay
    }

    /// LRU capacity for raw documents; 0 disables the cache
    #[must_use]
    pub fn cache_capacity(&self) -> usize {
        self.cache_capacity
    }

    /// Directory for `result_<inn>.html` debug dumps
    #[must_use]
    pub fn dump_dir(&self) -> Option<&Path> {
        self.dump_dir.as_deref()
    }

    #[must_use]
    pub fn headless(&self) -> bool {
        self.headless
    }

    #[must_use]
    pub fn chrome_data_dir(&self) -> Option<&Path> {
        self.chrome_data_dir.as_deref()
    }

    /// Timeout for the HTTP fallback client
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
}
