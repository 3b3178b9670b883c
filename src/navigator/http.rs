//! Plain HTTP fetch of a profile's query URL
//!
//! Used when the browser path fails with a navigation fault. Only works for
//! sites that render results server-side.

use reqwest::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{LookupError, LookupResult};
use crate::types::{DocumentOrigin, Inn, RawDocument};
use crate::utils::constants::{ACCEPT_LANGUAGE as ACCEPT_LANGUAGE_VALUE, CHROME_USER_AGENT};
use crate::utils::truncate_chars;

pub struct HttpFallback {
    client: Client,
    template: String,
    timeout: Duration,
}

impl HttpFallback {
    /// Client for `template` (must contain `{inn}`)
    ///
    /// # Errors
    ///
    /// [`LookupError::Config`] if the template has no placeholder or the client cannot be built.
    pub fn new(template: impl Into<String>, timeout: Duration) -> LookupResult<Self> {
        let template = template.into();
        if !template.contains("{inn}") {
            return Err(LookupError::Config(format!(
                "query_url '{template}' has no {{inn}} placeholder"
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_VALUE));

        let client = Client::builder()
            .user_agent(CHROME_USER_AGENT)
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| LookupError::Config(format!("cannot build HTTP client: {e}")))?;

        Ok(Self {
            client,
            template,
            timeout,
        })
    }

    #[must_use]
    pub fn url_for(&self, inn: &Inn) -> String {
        self.template.replace("{inn}", inn.as_str())
    }

    /// GET the query URL for `inn`
    ///
    /// # Errors
    ///
    /// [`LookupError::Timeout`] when the request times out, otherwise
    /// [`LookupError::NavigationFailed`] for transport errors and non-2xx statuses.
    pub async fn fetch(&self, inn: &Inn) -> LookupResult<RawDocument> {
        let url = self.url_for(inn);
        info!("HTTP fallback fetch {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            if let Ok(body) = response.text().await {
                debug!("HTTP fallback error body: {}", truncate_chars(&body, 200));
            }
            return Err(LookupError::navigation(format!(
                "HTTP fallback got {status} from {url}"
            )));
        }

        let final_url = response.url().to_string();
        let html = response.text().await.map_err(|e| self.transport_error(&e))?;
        debug!("HTTP fallback read {} bytes from {}", html.len(), final_url);
        Ok(RawDocument::new(html, final_url, DocumentOrigin::HttpFallback))
    }

    fn transport_error(&self, error: &reqwest::Error) -> LookupError {
        if error.is_timeout() {
            LookupError::Timeout {
                stage: "http fallback",
                waited: self.timeout,
            }
        } else {
            LookupError::navigation(format!("HTTP fallback request failed: {error}"))
        }
    }
}
