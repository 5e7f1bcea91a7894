//! Static-vs-rendered page loading
//!
//! Decides per site and per page whether static HTML is enough, and drives a
//! shared headless Chromium when it is not. The browser is reached through
//! the [`Renderer`] trait so a scrape run only ever sees a lease on it.

mod browser;
mod detect;
mod lease;
mod loader;

pub use browser::BrowserManager;
pub use detect::{needs_browser_rendering, FRAMEWORK_FINGERPRINTS, JS_PLATFORM_HOSTS};
pub use lease::RenderLease;
pub use loader::PageLoader;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Rendering failures
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to launch browser: {0}")]
    Launch(String),

    #[error("failed to open page: {0}")]
    Page(String),

    #[error("navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("rendering {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("failed to read content of {url}: {message}")]
    Content { url: String, message: String },
}

/// A browser-backed page renderer
///
/// `acquire`/`release` bracket one scrape run. Implementations that hold an
/// external process tear it down when the last run releases.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Returns the DOM serialized after navigation and a settle delay
    async fn render(&self, url: &str, timeout: Duration) -> Result<String, RenderError>;

    async fn acquire(&self) {}

    async fn release(&self) {}
}
