//! Retry loop with backoff and bot-block escalation

use super::{
    build_rotating_headers, choose_proxy, looks_like_bot_block, ChallengeTransport, FetchError,
    FetchRequest, FetchResult, ReqwestTransport, Transport, TransportFactory,
};
use crate::config::FetchConfig;
use rand::Rng;
use reqwest::Method;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;

const JITTER_MAX_MS: u64 = 250;
const MAX_BACKOFF: Duration = Duration::from_secs(300);

/// Per-call fetch options
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub method: Method,
    pub timeout: Duration,
    pub allow_escalation: bool,
    pub referer: Option<String>,
}

impl FetchOptions {
    /// GET with escalation allowed and the default referer
    pub fn get(timeout: Duration) -> Self {
        Self {
            method: Method::GET,
            timeout,
            allow_escalation: true,
            referer: None,
        }
    }

    pub fn without_escalation(mut self) -> Self {
        self.allow_escalation = false;
        self
    }

    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = Some(referer.into());
        self
    }
}

/// Computes the sleep before `attempt` (1-based)
///
/// The first attempt never waits. Later attempts wait
/// `base * 2^(attempt-2)` plus up to 250 ms of jitter; a zero base disables
/// both. The exponential part is capped at five minutes.
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    if attempt <= 1 || base.is_zero() {
        return Duration::ZERO;
    }

    let exponent = (attempt - 2).min(16);
    let scaled = base
        .checked_mul(2u32.pow(exponent))
        .map_or(MAX_BACKOFF, |delay| delay.min(MAX_BACKOFF));
    let jitter = rand::rng().random_range(0..=JITTER_MAX_MS);
    scaled.saturating_add(Duration::from_millis(jitter))
}

/// The plain reqwest transport plus a factory for challenge sessions
///
/// The plain transport holds no cookies and may be shared between site
/// scrapes; each [`FetchClient`] calls the factory at most once.
pub fn default_transports(
    config: &FetchConfig,
) -> Result<(Arc<dyn Transport>, TransportFactory), FetchError> {
    let primary: Arc<dyn Transport> = Arc::new(ReqwestTransport::new()?);
    let challenge_wait = Duration::from_millis(config.challenge_wait_ms);
    let factory: TransportFactory = Arc::new(move || {
        let transport: Arc<dyn Transport> = Arc::new(ChallengeTransport::new(challenge_wait)?);
        Ok(transport)
    });

    Ok((primary, factory))
}

/// Block-aware HTTP client for one site scrape
///
/// The escalation transport is created on the first blocked response and
/// cached for the lifetime of this client, so its cookies never leak into a
/// concurrent scrape of another site.
pub struct FetchClient {
    primary: Arc<dyn Transport>,
    escalation_factory: TransportFactory,
    escalation: OnceCell<Arc<dyn Transport>>,
    proxies: Vec<String>,
    total_attempts: u32,
    backoff_base: Duration,
}

impl FetchClient {
    /// Creates a client with the reqwest transports
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let (primary, factory) = default_transports(config)?;
        Ok(Self::with_transports(config, primary, factory))
    }

    /// Creates a client over caller-supplied transports
    pub fn with_transports(
        config: &FetchConfig,
        primary: Arc<dyn Transport>,
        escalation_factory: TransportFactory,
    ) -> Self {
        Self {
            primary,
            escalation_factory,
            escalation: OnceCell::new(),
            proxies: config.proxies.clone(),
            total_attempts: config.total_attempts.max(1),
            backoff_base: config.backoff_base(),
        }
    }

    fn build_request(&self, url: &str, options: &FetchOptions) -> FetchRequest {
        FetchRequest {
            url: url.to_string(),
            method: options.method.clone(),
            headers: build_rotating_headers(options.referer.as_deref()),
            timeout: options.timeout,
            proxy: choose_proxy(&self.proxies),
        }
    }

    /// Fetches `url`, retrying transport failures and escalating on blocks
    ///
    /// Returns `None` once all attempts are spent or a non-retryable
    /// transport error occurs.
    pub async fn fetch(&self, url: &str, options: FetchOptions) -> Option<FetchResult> {
        let mut last_problem: Option<String> = None;

        for attempt in 1..=self.total_attempts {
            let delay = backoff_delay(self.backoff_base, attempt);
            if !delay.is_zero() {
                tracing::debug!(
                    "Backing off {:?} before attempt {}/{} for {}",
                    delay,
                    attempt,
                    self.total_attempts,
                    url
                );
                tokio::time::sleep(delay).await;
            }

            let request = self.build_request(url, &options);

            match self.primary.execute(&request).await {
                Ok(result) if !looks_like_bot_block(&result) => return Some(result),
                Ok(result) => {
                    tracing::warn!(
                        "Bot protection triggered on attempt {} for {} (status {})",
                        attempt,
                        url,
                        result.status_code
                    );
                    last_problem = Some(format!("blocked with status {}", result.status_code));

                    if options.allow_escalation {
                        if let Some(escalated) = self.escalate(&request).await {
                            return Some(escalated);
                        }
                    }
                }
                Err(e) if e.is_retryable() => {
                    tracing::warn!("Request error for {}: {}", url, e);
                    last_problem = Some(e.to_string());
                }
                Err(e) => {
                    tracing::warn!("Non-retryable error for {}: {}", url, e);
                    return None;
                }
            }
        }

        if let Some(problem) = last_problem {
            tracing::warn!("Giving up on {}: {}", url, problem);
        }
        None
    }

    /// Single attempt with no retry and no escalation
    pub async fn fetch_once(&self, url: &str, timeout: Duration) -> Option<FetchResult> {
        let request = self.build_request(url, &FetchOptions::get(timeout));
        match self.primary.execute(&request).await {
            Ok(result) => Some(result),
            Err(e) => {
                tracing::debug!("Single-shot request to {} failed: {}", url, e);
                None
            }
        }
    }

    /// Replays the identical request through the escalation transport
    async fn escalate(&self, request: &FetchRequest) -> Option<FetchResult> {
        let transport = match self
            .escalation
            .get_or_try_init(|| async { (self.escalation_factory)() })
            .await
        {
            Ok(transport) => transport,
            Err(e) => {
                tracing::warn!("Escalation client unavailable: {}", e);
                return None;
            }
        };

        match transport.execute(request).await {
            Ok(result) if !looks_like_bot_block(&result) => {
                tracing::info!("Escalated client got through on {}", request.url);
                Some(result)
            }
            Ok(result) => {
                tracing::warn!(
                    "Escalated client still blocked on {} (status {})",
                    request.url,
                    result.status_code
                );
                None
            }
            Err(e) => {
                tracing::warn!("Escalated client error for {}: {}", request.url, e);
                None
            }
        }
    }
}
