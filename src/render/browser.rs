//! Shared headless Chromium
//!
//! One browser process (with one isolated context) is launched lazily on the
//! first render and shared by every scrape run holding a lease. Each render
//! opens its own page and closes it afterwards; the browser itself is only
//! closed when the last lease is released.

use super::{RenderError, Renderer};
use crate::config::RenderConfig;
use crate::fetch::random_user_agent;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::NavigateParams;
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

const READY_POLL: Duration = Duration::from_millis(100);

/// `document.readyState` values at which the DOM is parsed
fn is_dom_ready(ready_state: &str) -> bool {
    matches!(ready_state, "interactive" | "complete")
}

/// Browser process plus its CDP event-handler task
struct BrowserWrapper {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl Drop for BrowserWrapper {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

#[derive(Default)]
struct BrowserState {
    browser: Option<BrowserWrapper>,
    leases: usize,
}

/// Process-wide renderer over a lazily launched Chromium
///
/// Cloning is cheap and clones share the same browser.
#[derive(Clone)]
pub struct BrowserManager {
    config: RenderConfig,
    state: Arc<Mutex<BrowserState>>,
}

impl BrowserManager {
    /// Creates a manager; no browser is launched yet
    pub fn new(config: RenderConfig) -> Self {
        Self {
            config,
            state: Arc::new(Mutex::new(BrowserState::default())),
        }
    }

    /// Returns true while a browser process is running
    pub async fn is_running(&self) -> bool {
        self.state.lock().await.browser.is_some()
    }

    /// Number of scrape runs currently holding a lease
    pub async fn active_leases(&self) -> usize {
        self.state.lock().await.leases
    }

    async fn launch(&self) -> Result<BrowserWrapper, RenderError> {
        tracing::info!("Starting headless browser");

        let mut builder = BrowserConfig::builder()
            .request_timeout(self.config.timeout())
            .window_size(self.config.window_width, self.config.window_height)
            .incognito()
            .arg(format!("--user-agent={}", random_user_agent()))
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu")
            .arg("--disable-extensions")
            .arg("--disable-background-networking")
            .arg("--disable-software-rasterizer")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--no-sandbox")
            .arg("--mute-audio");

        if let Some(path) = &self.config.chrome_executable {
            builder = builder.chrome_executable(path);
        }

        let browser_config = builder.build().map_err(RenderError::Launch)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| RenderError::Launch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("Browser handler error: {:?}", e);
                }
            }
        });

        Ok(BrowserWrapper { browser, handler })
    }

    /// Opens a blank page, launching the browser first if needed
    async fn open_page(&self) -> Result<Page, RenderError> {
        let mut state = self.state.lock().await;

        if state.browser.is_none() {
            state.browser = Some(self.launch().await?);
        }

        let wrapper = state
            .browser
            .as_ref()
            .ok_or_else(|| RenderError::Launch("browser unavailable".to_string()))?;

        wrapper
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| RenderError::Page(e.to_string()))
    }

    /// Navigates, waits for DOM readiness, then for the settle delay
    ///
    /// `Page.navigate` returns once the navigation commits, so the load
    /// event (images, fonts) is never awaited.
    async fn navigate_and_read(&self, page: &Page, url: &str) -> Result<String, RenderError> {
        let navigation = page
            .execute(NavigateParams::new(url))
            .await
            .map_err(|e| RenderError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        if let Some(error) = navigation.result.error_text.as_deref() {
            return Err(RenderError::Navigation {
                url: url.to_string(),
                message: error.to_string(),
            });
        }

        wait_for_dom_ready(page).await;
        tokio::time::sleep(self.config.settle()).await;

        page.content().await.map_err(|e| RenderError::Content {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

}

#[async_trait]
impl Renderer for BrowserManager {
    async fn render(&self, url: &str, timeout: Duration) -> Result<String, RenderError> {
        tracing::info!("Rendering {} in browser", url);
        let page = self.open_page().await?;

        let outcome = tokio::time::timeout(timeout, self.navigate_and_read(&page, url)).await;

        if let Err(e) = page.close().await {
            tracing::debug!("Failed to close page for {}: {}", url, e);
        }

        match outcome {
            Ok(Ok(html)) => {
                tracing::debug!("Rendered {} ({} bytes)", url, html.len());
                Ok(html)
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(RenderError::Timeout {
                url: url.to_string(),
                timeout,
            }),
        }
    }

    async fn acquire(&self) {
        let mut state = self.state.lock().await;
        state.leases += 1;
    }

    async fn release(&self) {
        let wrapper = {
            let mut state = self.state.lock().await;
            state.leases = state.leases.saturating_sub(1);
            if state.leases == 0 {
                state.browser.take()
            } else {
                None
            }
        };

        if let Some(wrapper) = wrapper {
            close_browser(wrapper).await;
        }
    }
}

/// Polls `document.readyState`; the caller's render timeout bounds the wait
async fn wait_for_dom_ready(page: &Page) {
    loop {
        let state = match page.evaluate("document.readyState").await {
            Ok(result) => result.into_value::<String>().unwrap_or_default(),
            Err(e) => {
                tracing::debug!("readyState check failed: {}", e);
                String::new()
            }
        };
        if is_dom_ready(&state) {
            return;
        }
        tokio::time::sleep(READY_POLL).await;
    }
}

async fn close_browser(mut wrapper: BrowserWrapper) {
    tracing::info!("Closing headless browser");

    if let Err(e) = wrapper.browser.close().await {
        tracing::warn!("Failed to close browser cleanly: {}", e);
    }
    if let Err(e) = wrapper.browser.wait().await {
        tracing::warn!("Failed to wait for browser exit: {}", e);
    }
}
