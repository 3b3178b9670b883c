pub mod constants;
pub mod text;

pub use constants::*;
pub use text::{normalize_whitespace, truncate_chars};

use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::error::{LookupError, LookupResult};

/// Sleep for `duration` unless `cancel` fires first
///
/// # Errors
///
/// Returns [`LookupError::Cancelled`] if the token is (or becomes) cancelled.
pub async fn cancellable_sleep(cancel: &CancellationToken, duration: Duration) -> LookupResult<()> {
    if cancel.is_cancelled() {
        return Err(LookupError::Cancelled);
    }
    if duration.is_zero() {
        return Ok(());
    }
    tokio::select! {
        () = cancel.cancelled() => Err(LookupError::Cancelled),
        () = tokio::time::sleep(duration) => Ok(()),
    }
}
