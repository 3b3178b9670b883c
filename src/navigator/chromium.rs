//! chromiumoxide-backed [`PageDriver`]

use anyhow::{Context, Result, anyhow};
use chromiumoxide::browser::Browser;
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use std::path::PathBuf;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use super::driver::{InputHandle, PageDriver};
use crate::browser_setup::{apply_stealth_measures, launch_browser};
use crate::config::LookupConfig;

const INTERACTABLE_JS: &str = r"function() {
    const style = window.getComputedStyle(this);
    const rect = this.getBoundingClientRect();
    return !this.disabled && !this.readOnly
        && style.visibility !== 'hidden' && style.display !== 'none'
        && rect.width > 0 && rect.height > 0;
}";

const CLEAR_JS: &str = r"function() {
    this.focus();
    this.value = '';
    this.dispatchEvent(new Event('input', { bubbles: true }));
    return true;
}";

/// Browser plus its event handler task
///
/// The handler MUST be aborted when the browser goes away, and the profile
/// directory removed only after Chrome has exited.
pub struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
    user_data_dir: Option<PathBuf>,
}

impl BrowserSession {
    pub async fn launch(headless: bool, chrome_data_dir: Option<PathBuf>) -> Result<Self> {
        let (browser, handler, user_data_dir) = launch_browser(headless, chrome_data_dir).await?;
        Ok(Self {
            browser,
            handler,
            user_data_dir: Some(user_data_dir),
        })
    }

    /// Close Chrome, wait for the process, then remove the profile directory
    pub async fn shutdown(&mut self) -> Result<()> {
        if let Err(e) = self.browser.close().await {
            warn!("Failed to close browser cleanly: {}", e);
        }
        if let Err(e) = self.browser.wait().await {
            warn!("Failed to wait for browser exit: {}", e);
        }
        self.handler.abort();
        self.cleanup_temp_dir();
        Ok(())
    }

    fn cleanup_temp_dir(&mut self) {
        if let Some(path) = self.user_data_dir.take() {
            info!("Cleaning up temp directory: {}", path.display());
            if let Err(e) = std::fs::remove_dir_all(&path) {
                warn!(
                    "Failed to clean up temp directory {}: {}. Manual cleanup may be required.",
                    path.display(),
                    e
                );
            }
        }
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.handler.abort();
        if self.user_data_dir.is_some() {
            warn!("BrowserSession dropped without shutdown - removing temp dir in Drop");
            self.cleanup_temp_dir();
        }
    }
}

/// One browser, one page, reused across lookups
pub struct ChromiumDriver {
    session: Option<BrowserSession>,
    page: Option<Page>,
}

impl ChromiumDriver {
    pub async fn launch(config: &LookupConfig) -> Result<Self> {
        let session = BrowserSession::launch(
            config.headless(),
            config.chrome_data_dir().map(PathBuf::from),
        )
        .await?;
        Ok(Self {
            session: Some(session),
            page: None,
        })
    }

    async fn page(&mut self) -> Result<&Page> {
        if self.page.is_none() {
            let session = self
                .session
                .as_ref()
                .ok_or_else(|| anyhow!("browser closed"))?;
            let page = session
                .browser
                .new_page("about:blank")
                .await
                .context("Failed to create blank page")?;
            if let Err(e) = apply_stealth_measures(&page).await {
                warn!("Stealth injection failed: {:#}", e);
            }
            self.page = Some(page);
        }
        self.page.as_ref().ok_or_else(|| anyhow!("page closed"))
    }

    async fn element(&mut self, handle: &InputHandle) -> Result<Element> {
        let page = self.page().await?;
        let mut elements = page
            .find_elements(handle.selector.as_str())
            .await
            .with_context(|| format!("Failed to query {}", handle.selector))?;
        if handle.index >= elements.len() {
            return Err(anyhow!(
                "element {}[{}] is gone",
                handle.selector,
                handle.index
            ));
        }
        Ok(elements.swap_remove(handle.index))
    }
}

async fn is_interactable(element: &Element) -> bool {
    match element.call_js_fn(INTERACTABLE_JS, false).await {
        Ok(returns) => returns
            .result
            .value
            .and_then(|v| v.as_bool())
            .unwrap_or(false),
        Err(e) => {
            trace!("Interactable check failed: {}", e);
            false
        }
    }
}

impl PageDriver for ChromiumDriver {
    async fn goto(&mut self, url: &str) -> Result<()> {
        let page = self.page().await?;
        page.goto(url)
            .await
            .with_context(|| format!("Failed to navigate to {url}"))?;
        Ok(())
    }

    async fn current_url(&mut self) -> Result<String> {
        let page = self.page().await?;
        Ok(page
            .url()
            .await
            .context("Failed to read page URL")?
            .unwrap_or_else(|| "about:blank".to_string()))
    }

    async fn content(&mut self) -> Result<String> {
        let page = self.page().await?;
        page.content().await.context("Failed to read page content")
    }

    async fn has_element(&mut self, selector: &str) -> Result<bool> {
        let page = self.page().await?;
        Ok(page.find_element(selector).await.is_ok())
    }

    async fn find_interactable(&mut self, selector: &str) -> Result<Option<InputHandle>> {
        let page = self.page().await?;
        let Ok(elements) = page.find_elements(selector).await else {
            return Ok(None);
        };
        for (index, element) in elements.iter().enumerate() {
            if is_interactable(element).await {
                return Ok(Some(InputHandle {
                    selector: selector.to_string(),
                    index,
                }));
            }
        }
        Ok(None)
    }

    async fn type_into(&mut self, handle: &InputHandle, text: &str) -> Result<()> {
        let element = self.element(handle).await?;
        element
            .call_js_fn(CLEAR_JS, false)
            .await
            .context("Failed to clear search input")?;
        element.click().await.context("Failed to focus search input")?;
        element
            .type_str(text)
            .await
            .context("Failed to type into search input")?;
        Ok(())
    }

    async fn press_enter(&mut self, handle: &InputHandle) -> Result<()> {
        let element = self.element(handle).await?;
        element
            .press_key("Enter")
            .await
            .context("Failed to press Enter")?;
        Ok(())
    }

    async fn click_text(&mut self, text: &str) -> Result<bool> {
        let needle = serde_json::to_string(text)?;
        let script = format!(
            r"(() => {{
                const needle = {needle};
                const candidates = document.querySelectorAll('a, button, [role=button]');
                for (const el of candidates) {{
                    if ((el.textContent || '').includes(needle)) {{ el.click(); return true; }}
                }}
                return false;
            }})()"
        );
        let page = self.page().await?;
        let clicked: bool = page
            .evaluate(script.as_str())
            .await
            .context("Failed to click by text")?
            .into_value()
            .context("Unexpected click result")?;
        debug!("click_text('{}') -> {}", text, clicked);
        Ok(clicked)
    }

    async fn click_first(&mut self, selector: &str) -> Result<bool> {
        let page = self.page().await?;
        let Ok(elements) = page.find_elements(selector).await else {
            return Ok(false);
        };
        for element in &elements {
            if is_interactable(element).await {
                element
                    .click()
                    .await
                    .with_context(|| format!("Failed to click {selector}"))?;
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(page) = self.page.take()
            && let Err(e) = page.close().await
        {
            debug!("Page close failed: {}", e);
        }
        if let Some(mut session) = self.session.take() {
            session.shutdown().await?;
        }
        Ok(())
    }
}
