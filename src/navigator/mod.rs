//! Page navigation for one registry lookup
//!
//! Drives a [`PageDriver`] through the search flow of a [`TargetProfile`]:
//! open the entry page, find the search input, type the INN, submit, wait
//! for a ready signal, optionally click through a results list, capture the
//! document. Every wait is bounded and every settle honors cancellation.

pub mod chromium;
pub mod debug_dump;
pub mod driver;
pub mod http;

pub use chromium::ChromiumDriver;
pub use driver::{InputHandle, PageDriver};
pub use http::HttpFallback;

use std::path::PathBuf;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::config::{LookupConfig, TargetProfile, Timings};
use crate::error::{LookupError, LookupResult};
use crate::types::{DocumentOrigin, Inn, RawDocument};
use crate::utils::cancellable_sleep;

fn driver_fault(error: anyhow::Error) -> LookupError {
    LookupError::navigation(format!("{error:#}"))
}

pub struct Navigator<D> {
    driver: D,
    profile: TargetProfile,
    timings: Timings,
    dump_dir: Option<PathBuf>,
}

impl<D: PageDriver> Navigator<D> {
    pub fn new(driver: D, config: &LookupConfig) -> Self {
        Self {
            driver,
            profile: config.profile().clone(),
            timings: *config.timings(),
            dump_dir: config.dump_dir().map(PathBuf::from),
        }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Search for `inn` and capture the resulting document
    ///
    /// # Errors
    ///
    /// * [`LookupError::NavigationFailed`] for driver faults or a missing search input
    /// * [`LookupError::Timeout`] when the ready signal or the whole navigation runs over
    /// * [`LookupError::Cancelled`] when `cancel` fires during a wait
    pub async fn navigate(
        &mut self,
        inn: &Inn,
        cancel: &CancellationToken,
    ) -> LookupResult<RawDocument> {
        let limit = self.timings.navigation_timeout;
        let doc = match tokio::time::timeout(limit, self.run(inn, cancel)).await {
            Ok(result) => result?,
            Err(_) => {
                warn!("Navigation for INN {} exceeded {:?}", inn, limit);
                return Err(LookupError::Timeout {
                    stage: "navigation",
                    waited: limit,
                });
            }
        };

        if let Some(dir) = &self.dump_dir {
            debug_dump::spawn_dump(dir.clone(), inn.clone(), doc.html.clone());
        }
        Ok(doc)
    }

    /// Release the browser session
    pub async fn close(&mut self) -> LookupResult<()> {
        self.driver.close().await.map_err(driver_fault)
    }

    async fn run(&mut self, inn: &Inn, cancel: &CancellationToken) -> LookupResult<RawDocument> {
        let timings = self.timings;

        info!("Opening {} for INN {}", self.profile.entry_url, inn);
        self.driver
            .goto(&self.profile.entry_url)
            .await
            .map_err(driver_fault)?;
        cancellable_sleep(cancel, timings.after_load).await?;

        let input = match self.find_input(cancel).await? {
            Some(input) => input,
            None => self.search_again(cancel).await?,
        };

        debug!("Typing INN {} into {}", inn, input.selector);
        self.driver
            .type_into(&input, inn.as_str())
            .await
            .map_err(driver_fault)?;
        cancellable_sleep(cancel, timings.after_typing).await?;

        self.driver.press_enter(&input).await.map_err(driver_fault)?;
        cancellable_sleep(cancel, timings.after_submit).await?;

        self.wait_ready(cancel).await?;
        self.open_first_result(cancel).await?;

        let html = self.driver.content().await.map_err(driver_fault)?;
        let url = self.driver.current_url().await.map_err(driver_fault)?;
        info!("Captured {} bytes from {}", html.len(), url);
        Ok(RawDocument::new(html, url, DocumentOrigin::Browser))
    }

    /// Poll every input selector until one is interactable or `input_wait` elapses
    async fn find_input(
        &mut self,
        cancel: &CancellationToken,
    ) -> LookupResult<Option<InputHandle>> {
        let deadline = Instant::now() + self.timings.input_wait;
        loop {
            for selector in &self.profile.input_selectors {
                match self.driver.find_interactable(selector).await {
                    Ok(Some(handle)) => {
                        debug!("Found search input: {}", selector);
                        return Ok(Some(handle));
                    }
                    Ok(None) => {}
                    Err(e) => trace!("Selector {} failed: {:#}", selector, e),
                }
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            cancellable_sleep(cancel, self.timings.poll_interval).await?;
        }
    }

    /// Reset the search form and look for the input once more
    async fn search_again(&mut self, cancel: &CancellationToken) -> LookupResult<InputHandle> {
        let not_found = || LookupError::navigation("search input not found");

        let Some(text) = self.profile.search_again_text.clone() else {
            return Err(not_found());
        };
        debug!("Search input not found, clicking '{}'", text);
        if !self.driver.click_text(&text).await.map_err(driver_fault)? {
            return Err(not_found());
        }
        cancellable_sleep(cancel, self.timings.after_search_again).await?;

        self.find_input(cancel).await?.ok_or_else(not_found)
    }

    async fn wait_ready(&mut self, cancel: &CancellationToken) -> LookupResult<()> {
        let started = Instant::now();
        let limit = self.timings.ready_timeout;
        loop {
            if self.is_ready().await? {
                debug!("Ready after {:.2}s", started.elapsed().as_secs_f64());
                return Ok(());
            }
            if started.elapsed() >= limit {
                return Err(LookupError::Timeout {
                    stage: "ready signal",
                    waited: limit,
                });
            }
            cancellable_sleep(cancel, self.timings.poll_interval).await?;
        }
    }

    async fn is_ready(&mut self) -> LookupResult<bool> {
        let url = self.driver.current_url().await.map_err(driver_fault)?;
        if self
            .profile
            .detail_url_markers
            .iter()
            .any(|marker| url.contains(marker.as_str()))
        {
            return Ok(true);
        }

        for selector in &self.profile.ready_selectors {
            if self
                .driver
                .has_element(selector)
                .await
                .map_err(driver_fault)?
            {
                return Ok(true);
            }
        }

        if self.profile.absent_phrases.is_empty() {
            return Ok(false);
        }
        let content = self
            .driver
            .content()
            .await
            .map_err(driver_fault)?
            .to_lowercase();
        Ok(self
            .profile
            .absent_phrases
            .iter()
            .any(|phrase| content.contains(&phrase.to_lowercase())))
    }

    /// Click through from a results list to the first company, if on one
    async fn open_first_result(&mut self, cancel: &CancellationToken) -> LookupResult<()> {
        let Some(marker) = &self.profile.results_list_marker else {
            return Ok(());
        };
        if self.profile.result_link_selectors.is_empty() {
            return Ok(());
        }

        let url = self.driver.current_url().await.map_err(driver_fault)?;
        let on_detail = self
            .profile
            .detail_url_markers
            .iter()
            .any(|m| url.contains(m.as_str()));
        if on_detail || !url.contains(marker.as_str()) {
            return Ok(());
        }

        debug!("On results list {}, opening first company", url);
        let deadline = Instant::now() + self.timings.input_wait;
        loop {
            for selector in &self.profile.result_link_selectors {
                match self.driver.click_first(selector).await {
                    Ok(true) => {
                        info!("Opened company page via {}", selector);
                        cancellable_sleep(cancel, self.timings.after_result_click).await?;
                        return Ok(());
                    }
                    Ok(false) => {}
                    Err(e) => trace!("Clicking {} failed: {:#}", selector, e),
                }
            }
            if Instant::now() >= deadline {
                warn!("No clickable result on {}, capturing the list page", url);
                return Ok(());
            }
            cancellable_sleep(cancel, self.timings.poll_interval).await?;
        }
    }
}
