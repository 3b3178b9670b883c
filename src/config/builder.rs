//! Type-safe builder for `LookupConfig` using the typestate pattern
//!
//! A target profile must be chosen before `build()` becomes available.

use std::marker::PhantomData;
use std::path::PathBuf;
use std::time::Duration;

use super::profile::TargetProfile;
use super::types::{LookupConfig, Timings};
use crate::error::{LookupError, LookupResult};
use crate::lookup::RetryPolicy;
use crate::utils::{DEFAULT_CACHE_CAPACITY, DEFAULT_INTER_REQUEST_DELAY, DEFAULT_REQUEST_TIMEOUT};

// Type states for the builder
pub struct WithProfile;

pub struct LookupConfigBuilder<State = ()> {
    pub(crate) profile: Option<TargetProfile>,
    pub(crate) timings: Timings,
    pub(crate) retry: RetryPolicy,
    pub(crate) inter_request_delay: Duration,
    pub(crate) cache_capacity: usize,
    pub(crate) dump_dir: Option<PathBuf>,
    pub(crate) headless: bool,
    pub(crate) chrome_data_dir: Option<PathBuf>,
    pub(crate) request_timeout: Duration,
    pub(crate) _phantom: PhantomData<State>,
}

impl Default for LookupConfigBuilder<()> {
    fn default() -> Self {
        Self {
            profile: None,
            timings: Timings::default(),
            retry: RetryPolicy::default(),
            inter_request_delay: DEFAULT_INTER_REQUEST_DELAY,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            dump_dir: None,
            headless: true,
            chrome_data_dir: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            _phantom: PhantomData,
        }
    }
}

impl LookupConfig {
    /// Create a builder for configuring a `LookupConfig` with a fluent interface
    #[must_use]
    pub fn builder() -> LookupConfigBuilder<()> {
        LookupConfigBuilder::default()
    }
}

impl LookupConfigBuilder<()> {
    pub fn profile(self, profile: TargetProfile) -> LookupConfigBuilder<WithProfile> {
        LookupConfigBuilder {
            profile: Some(profile),
            timings: self.timings,
            retry: self.retry,
            inter_request_delay: self.inter_request_delay,
            cache_capacity: self.cache_capacity,
            dump_dir: self.dump_dir,
            headless: self.headless,
            chrome_data_dir: self.chrome_data_dir,
            request_timeout: self.request_timeout,
            _phantom: PhantomData,
        }
    }
}

// Build method only available once a profile is set
impl LookupConfigBuilder<WithProfile> {
    pub fn build(self) -> LookupResult<LookupConfig> {
        let profile = self
            .profile
            .ok_or_else(|| LookupError::Config("profile is required".to_string()))?;
        profile.validate()?;

        let timings = self.timings;
        if timings.poll_interval.is_zero() {
            return Err(LookupError::Config(
                "poll_interval must be greater than zero".to_string(),
            ));
        }
        let steps = timings.worst_case_steps();
        if timings.navigation_timeout <= steps {
            return Err(LookupError::Config(format!(
                "navigation_timeout {:?} must exceed the sum of settle delays and waits {:?}",
                timings.navigation_timeout, steps
            )));
        }

        // Enforce headless mode in release builds for production safety
        #[cfg(not(debug_assertions))]
        let headless = if !self.headless {
            tracing::warn!(
                "Forcing headless mode in release build. \
                Headed mode is only available in debug builds for development."
            );
            true
        } else {
            self.headless
        };

        #[cfg(debug_assertions)]
        let headless = self.headless;

        Ok(LookupConfig {
            profile,
            timings,
            retry: self.retry,
            inter_request_delay: self.inter_request_delay,
            cache_capacity: self.cache_capacity,
            dump_dir: self.dump_dir,
            headless,
            chrome_data_dir: self.chrome_data_dir,
            request_timeout: self.request_timeout,
        })
    }
}

// Builder methods available at any state
impl<State> LookupConfigBuilder<State> {
    #[must_use]
    pub fn timings(mut self, timings: Timings) -> Self {
        self.timings = timings;
        self
    }

    /// Set retry behavior for transient navigation failures
    ///
    /// Use [`RetryPolicy::none`] to make every failure final.
    #[must_use]
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.retry.max_retries = retries;
        self
    }

    /// Pause between consecutive lookups (default: 3s)
    #[must_use]
    pub fn inter_request_delay(mut self, delay: Duration) -> Self {
        self.inter_request_delay = delay;
        self
    }

    /// Number of raw documents kept in memory; 0 disables caching
    #[must_use]
    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Write the captured HTML of every navigation to `dir/result_<inn>.html`
    #[must_use]
    pub fn dump_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dump_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    #[must_use]
    pub fn chrome_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.chrome_data_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}
