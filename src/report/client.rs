use super::{ReportError, ScrapeProgress};
use crate::config::ReporterConfig;
use crate::extract::ProductRecord;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::time::Duration;

const PROGRESS_PATH: &str = "/v4/auto-onboard/progress";
const ITEMS_PATH: &str = "/v4/auto-onboard/items";

/// Item as the collaborator API expects it
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ItemPayload<'a> {
    name: &'a str,
    description: &'a str,
    price: &'a str,
    image_url: &'a str,
    source_item_id: &'a str,
}

impl<'a> From<&'a ProductRecord> for ItemPayload<'a> {
    fn from(record: &'a ProductRecord) -> Self {
        Self {
            name: &record.name,
            description: &record.description,
            price: &record.price,
            image_url: &record.image_url,
            source_item_id: &record.url,
        }
    }
}

struct Endpoint {
    base_url: String,
    token: String,
}

/// Best-effort progress and item delivery
///
/// Active only when both an API base URL and a token were supplied;
/// otherwise every call is a no-op. Failures are logged, never returned.
pub struct Reporter {
    endpoint: Option<Endpoint>,
    client: Client,
    progress_timeout: Duration,
    item_timeout: Duration,
}

impl Reporter {
    /// Creates a reporter over an existing HTTP client
    pub fn with_client(
        client: Client,
        api_base_url: Option<&str>,
        agent_token: Option<&str>,
        config: &ReporterConfig,
    ) -> Self {
        let endpoint = match (api_base_url, agent_token) {
            (Some(base), Some(token)) if !base.trim().is_empty() && !token.trim().is_empty() => {
                Some(Endpoint {
                    base_url: base.trim().trim_end_matches('/').to_string(),
                    token: token.trim().to_string(),
                })
            }
            _ => None,
        };

        Self {
            endpoint,
            client,
            progress_timeout: Duration::from_secs(config.progress_timeout_secs),
            item_timeout: Duration::from_secs(config.item_timeout_secs),
        }
    }

    pub fn is_active(&self) -> bool {
        self.endpoint.is_some()
    }

    /// Sends a progress update; empty updates are not sent
    pub async fn report_progress(&self, progress: &ScrapeProgress) {
        if !self.is_active() || progress.is_empty() {
            return;
        }

        match self.post(PROGRESS_PATH, progress, self.progress_timeout).await {
            Ok(()) => tracing::info!(
                "Progress update sent: {}",
                progress.message.as_deref().unwrap_or("(no message)")
            ),
            Err(e) => tracing::warn!("Progress update failed: {}", e),
        }
    }

    /// Forwards one record; true only when the collaborator accepted it
    pub async fn deliver_item(&self, record: &ProductRecord) -> bool {
        if !self.is_active() {
            return false;
        }

        let label: String = record.name.chars().take(50).collect();
        match self
            .post(ITEMS_PATH, &ItemPayload::from(record), self.item_timeout)
            .await
        {
            Ok(()) => {
                tracing::info!("Item sent to API: {}", label);
                true
            }
            Err(e) => {
                tracing::warn!("Failed to send item {}: {}", label, e);
                false
            }
        }
    }

    async fn post<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
        timeout: Duration,
    ) -> Result<(), ReportError> {
        let Some(endpoint) = &self.endpoint else {
            return Ok(());
        };

        let response = self
            .client
            .post(format!("{}{}", endpoint.base_url, path))
            .bearer_auth(&endpoint.token)
            .timeout(timeout)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::ACCEPTED {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(ReportError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}
