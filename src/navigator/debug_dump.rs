//! Best-effort HTML dumps for debugging selector problems

use std::path::{Path, PathBuf};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::types::Inn;

#[must_use]
pub fn dump_path(dir: &Path, inn: &Inn) -> PathBuf {
    dir.join(format!("result_{inn}.html"))
}

/// Write `html` to `<dir>/result_<inn>.html` on a background task
///
/// The lookup never waits for the write; failures are only logged.
pub fn spawn_dump(dir: PathBuf, inn: Inn, html: String) -> JoinHandle<()> {
    tokio::spawn(async move { dump_html(&dir, &inn, &html).await })
}

async fn dump_html(dir: &Path, inn: &Inn, html: &str) {
    if let Err(e) = tokio::fs::create_dir_all(dir).await {
        warn!("Cannot create dump directory {}: {}", dir.display(), e);
        return;
    }
    let path = dump_path(dir, inn);
    match tokio::fs::write(&path, html.as_bytes()).await {
        Ok(()) => debug!("Saved page HTML to {}", path.display()),
        Err(e) => warn!("Failed to save page HTML to {}: {}", path.display(), e),
    }
}
