//! Browser seam used by the navigator
//!
//! Methods return `anyhow::Result`; the navigator turns every error into
//! [`LookupError::NavigationFailed`](crate::LookupError::NavigationFailed).

use std::future::Future;

/// Element located by `find_interactable`
///
/// Identified by selector and position so drivers do not have to keep live
/// element references between calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputHandle {
    pub selector: String,
    pub index: usize,
}

/// The minimal set of page operations a lookup needs
pub trait PageDriver: Send {
    /// Load `url` in the (single) page, creating it on first use
    fn goto(&mut self, url: &str) -> impl Future<Output = anyhow::Result<()>> + Send;

    fn current_url(&mut self) -> impl Future<Output = anyhow::Result<String>> + Send;

    /// Serialized DOM of the current page
    fn content(&mut self) -> impl Future<Output = anyhow::Result<String>> + Send;

    /// Whether any element matches `selector`
    fn has_element(&mut self, selector: &str)
    -> impl Future<Output = anyhow::Result<bool>> + Send;

    /// First element matching `selector` that is visible and enabled
    fn find_interactable(
        &mut self,
        selector: &str,
    ) -> impl Future<Output = anyhow::Result<Option<InputHandle>>> + Send;

    /// Clear the field, then type `text` into it
    fn type_into(
        &mut self,
        handle: &InputHandle,
        text: &str,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;

    fn press_enter(&mut self, handle: &InputHandle)
    -> impl Future<Output = anyhow::Result<()>> + Send;

    /// Click the first link or button whose text contains `text`
    fn click_text(&mut self, text: &str) -> impl Future<Output = anyhow::Result<bool>> + Send;

    /// Click the first clickable element matching `selector`
    fn click_first(&mut self, selector: &str)
    -> impl Future<Output = anyhow::Result<bool>> + Send;

    /// Release the browser session; later calls may fail
    fn close(&mut self) -> impl Future<Output = anyhow::Result<()>> + Send;
}
