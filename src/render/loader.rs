use super::{needs_browser_rendering, Renderer};
use crate::fetch::{FetchClient, FetchOptions};
use std::sync::Arc;
use std::time::Duration;

/// Produces page content from the fetch client and, when needed, a renderer
///
/// Static fetches whose body looks script-rendered are re-fetched through
/// the renderer and the rendered DOM supersedes the static body.
#[derive(Clone)]
pub struct PageLoader {
    fetch: Arc<FetchClient>,
    renderer: Option<Arc<dyn Renderer>>,
    render_timeout: Duration,
}

impl PageLoader {
    pub fn new(
        fetch: Arc<FetchClient>,
        renderer: Option<Arc<dyn Renderer>>,
        render_timeout: Duration,
    ) -> Self {
        Self {
            fetch,
            renderer,
            render_timeout,
        }
    }

    pub fn fetch_client(&self) -> &FetchClient {
        &self.fetch
    }

    pub fn can_render(&self) -> bool {
        self.renderer.is_some()
    }

    /// Renders `url` in the browser; `None` when unavailable or failed
    pub async fn render(&self, url: &str) -> Option<String> {
        let renderer = self.renderer.as_ref()?;

        match renderer.render(url, self.render_timeout).await {
            Ok(html) if !html.is_empty() => Some(html),
            Ok(_) => {
                tracing::warn!("Browser rendering of {} returned an empty document", url);
                None
            }
            Err(e) => {
                tracing::warn!("Browser rendering failed for {}: {}", url, e);
                None
            }
        }
    }

    /// Static fetch with reactive re-render
    pub async fn load(&self, url: &str, options: FetchOptions) -> Option<String> {
        let result = self.fetch.fetch(url, options).await?;

        if self.can_render() && needs_browser_rendering(&result.body, url) {
            tracing::info!("Detected JavaScript-rendered page {}, rendering in browser", url);
            if let Some(rendered) = self.render(url).await {
                return Some(rendered);
            }
            tracing::warn!("Rendering failed for {}, using static HTML (may be incomplete)", url);
        }

        Some(result.body)
    }

    /// Render first, falling back to a plain static fetch
    pub async fn load_rendered(&self, url: &str, options: FetchOptions) -> Option<String> {
        if let Some(rendered) = self.render(url).await {
            return Some(rendered);
        }

        self.fetch.fetch(url, options).await.map(|result| result.body)
    }

    /// Picks [`PageLoader::load_rendered`] in render mode, [`PageLoader::load`] otherwise
    pub async fn load_with_mode(
        &self,
        url: &str,
        options: FetchOptions,
        render_mode: bool,
    ) -> Option<String> {
        if render_mode {
            self.load_rendered(url, options).await
        } else {
            self.load(url, options).await
        }
    }
}
