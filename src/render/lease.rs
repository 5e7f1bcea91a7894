use super::{RenderError, Renderer};
use std::sync::Arc;
use std::time::Duration;

/// One scrape run's hold on a shared renderer
///
/// Call [`RenderLease::release`] once the run is over. A lease dropped
/// without being released (early return, panic unwinding) releases itself
/// on the current runtime.
pub struct RenderLease {
    renderer: Arc<dyn Renderer>,
    released: bool,
}

impl RenderLease {
    pub async fn acquire(renderer: Arc<dyn Renderer>) -> Self {
        renderer.acquire().await;
        Self {
            renderer,
            released: false,
        }
    }

    pub fn renderer(&self) -> Arc<dyn Renderer> {
        self.renderer.clone()
    }

    pub async fn render(&self, url: &str, timeout: Duration) -> Result<String, RenderError> {
        self.renderer.render(url, timeout).await
    }

    pub async fn release(mut self) {
        self.released = true;
        self.renderer.release().await;
    }
}

impl Drop for RenderLease {
    fn drop(&mut self) {
        if self.released {
            return;
        }

        tracing::warn!("Render lease dropped without release, releasing in background");
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let renderer = self.renderer.clone();
            handle.spawn(async move {
                renderer.release().await;
            });
        }
    }
}
