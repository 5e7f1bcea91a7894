//! Client variants behind the fetch loop
//!
//! [`ReqwestTransport`] is the plain client. [`ChallengeTransport`] is the
//! escalation variant: a cookie-persisting session that warms up on the site
//! root and replays a challenged request once after a wait.

use super::{looks_like_bot_block, FetchError, FetchResult, TransportKind};
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{redirect::Policy, Client, Method};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use url::Url;

/// One outbound request, fully resolved
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: String,
    pub method: Method,
    pub headers: HeaderMap,
    pub timeout: Duration,
    pub proxy: Option<String>,
}

/// A client variant able to execute a [`FetchRequest`]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Which variant this is, stamped onto every result
    fn kind(&self) -> TransportKind;

    async fn execute(&self, request: &FetchRequest) -> Result<FetchResult, FetchError>;
}

/// Builds an escalation transport on first use
pub type TransportFactory = Arc<dyn Fn() -> Result<Arc<dyn Transport>, FetchError> + Send + Sync>;

/// Builds a reqwest client, optionally routed through a proxy
fn build_client(proxy: Option<&str>, cookies: bool) -> Result<Client, FetchError> {
    let mut builder = Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .cookie_store(cookies)
        .gzip(true)
        .deflate(true)
        .brotli(true);

    if let Some(proxy_url) = proxy {
        let proxy = reqwest::Proxy::all(proxy_url).map_err(|e| FetchError::Proxy {
            proxy: proxy_url.to_string(),
            message: e.to_string(),
        })?;
        builder = builder.proxy(proxy);
    }

    builder.build().map_err(|e| FetchError::Client(e.to_string()))
}

/// Plain HTTP transport over reqwest
///
/// Proxies are configured per `Client` in reqwest, so one client is kept per
/// proxy endpoint (plus one direct client).
pub struct ReqwestTransport {
    kind: TransportKind,
    cookies: bool,
    clients: Mutex<HashMap<Option<String>, Client>>,
}

impl ReqwestTransport {
    /// Creates the plain transport
    ///
    /// Fails only if the TLS backend cannot be initialized.
    pub fn new() -> Result<Self, FetchError> {
        Self::build(TransportKind::Plain, false)
    }

    /// Creates a cookie-persisting transport stamped as `kind`
    pub fn with_cookies(kind: TransportKind) -> Result<Self, FetchError> {
        Self::build(kind, true)
    }

    fn build(kind: TransportKind, cookies: bool) -> Result<Self, FetchError> {
        let direct = build_client(None, cookies)?;
        let mut clients = HashMap::new();
        clients.insert(None, direct);

        Ok(Self {
            kind,
            cookies,
            clients: Mutex::new(clients),
        })
    }

    fn client_for(&self, proxy: Option<&str>) -> Result<Client, FetchError> {
        let key = proxy.map(str::to_string);
        let mut clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(client) = clients.get(&key) {
            return Ok(client.clone());
        }

        let client = build_client(proxy, self.cookies)?;
        clients.insert(key, client.clone());
        Ok(client)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    fn kind(&self) -> TransportKind {
        self.kind
    }

    async fn execute(&self, request: &FetchRequest) -> Result<FetchResult, FetchError> {
        let client = self.client_for(request.proxy.as_deref())?;
        let started = Instant::now();

        let response = client
            .request(request.method.clone(), &request.url)
            .headers(request.headers.clone())
            .timeout(request.timeout)
            .send()
            .await
            .map_err(|source| FetchError::Http {
                url: request.url.clone(),
                source,
            })?;

        let status_code = response.status().as_u16();
        let final_url = response.url().to_string();

        let body = response.text().await.map_err(|source| FetchError::Http {
            url: request.url.clone(),
            source,
        })?;

        Ok(FetchResult {
            status_code,
            body,
            final_url,
            elapsed: started.elapsed(),
            transport: self.kind,
        })
    }
}

/// Escalation transport for challenge-protected sites
///
/// Holds cookies for the lifetime of one site scrape. The first request to
/// an origin is preceded by a visit to the origin root so challenge cookies
/// are collected before the real request goes out.
pub struct ChallengeTransport {
    session: ReqwestTransport,
    challenge_wait: Duration,
    warmed: tokio::sync::Mutex<HashSet<String>>,
}

impl ChallengeTransport {
    pub fn new(challenge_wait: Duration) -> Result<Self, FetchError> {
        Ok(Self {
            session: ReqwestTransport::with_cookies(TransportKind::Escalated)?,
            challenge_wait,
            warmed: tokio::sync::Mutex::new(HashSet::new()),
        })
    }

    async fn warm_up(&self, request: &FetchRequest) {
        let Ok(url) = Url::parse(&request.url) else {
            return;
        };
        let origin = url.origin().ascii_serialization();

        let mut warmed = self.warmed.lock().await;
        if !warmed.insert(origin.clone()) {
            return;
        }
        drop(warmed);

        let root = FetchRequest {
            url: format!("{}/", origin),
            method: Method::GET,
            ..request.clone()
        };

        match self.session.execute(&root).await {
            Ok(result) => tracing::debug!(
                "Challenge session warmed on {} (status {})",
                root.url,
                result.status_code
            ),
            Err(e) => tracing::debug!("Challenge warm-up failed for {}: {}", root.url, e),
        }
    }
}

#[async_trait]
impl Transport for ChallengeTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Escalated
    }

    async fn execute(&self, request: &FetchRequest) -> Result<FetchResult, FetchError> {
        self.warm_up(request).await;

        let result = self.session.execute(request).await?;
        if !looks_like_bot_block(&result) {
            return Ok(result);
        }

        tracing::debug!(
            "Challenge still present on {}, replaying after {:?}",
            request.url,
            self.challenge_wait
        );
        tokio::time::sleep(self.challenge_wait).await;
        self.session.execute(request).await
    }
}
