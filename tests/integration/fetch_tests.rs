use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use storefront_harvester::config::FetchConfig;
use storefront_harvester::fetch::{
    FetchClient, FetchError, FetchOptions, FetchRequest, FetchResult, Transport, TransportFactory,
    TransportKind,
};
use wiremock::matchers::{header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Answers from a script; the last entry repeats once the script runs out
struct ScriptedTransport {
    kind: TransportKind,
    script: Mutex<VecDeque<(u16, &'static str)>>,
    calls: AtomicUsize,
}

impl ScriptedTransport {
    fn new(kind: TransportKind, script: &[(u16, &'static str)]) -> Arc<Self> {
        Arc::new(Self {
            kind,
            script: Mutex::new(script.iter().copied().collect()),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    fn kind(&self) -> TransportKind {
        self.kind
    }

    async fn execute(&self, request: &FetchRequest) -> Result<FetchResult, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut script = self.script.lock().unwrap();
        let (status, body) = if script.len() > 1 {
            script.pop_front().unwrap()
        } else {
            *script.front().unwrap()
        };

        Ok(FetchResult {
            status_code: status,
            body: body.to_string(),
            final_url: request.url.clone(),
            elapsed: Duration::ZERO,
            transport: self.kind,
        })
    }
}

fn fast_config(total_attempts: u32) -> FetchConfig {
    FetchConfig {
        total_attempts,
        backoff_base_secs: 0.0,
        ..FetchConfig::default()
    }
}

fn factory_for(transport: Arc<ScriptedTransport>, created: Arc<AtomicUsize>) -> TransportFactory {
    Arc::new(move || {
        created.fetch_add(1, Ordering::SeqCst);
        let transport: Arc<dyn Transport> = transport.clone();
        Ok(transport)
    })
}

#[tokio::test]
async fn test_escalation_recovers_before_budget_is_spent() {
    let primary = ScriptedTransport::new(
        TransportKind::Plain,
        &[(403, "<html>Please solve the captcha</html>")],
    );
    let escalated = ScriptedTransport::new(
        TransportKind::Escalated,
        &[
            (403, "<html>captcha</html>"),
            (200, "<html><h1>Welcome</h1></html>"),
        ],
    );
    let created = Arc::new(AtomicUsize::new(0));

    let client = FetchClient::with_transports(
        &fast_config(3),
        primary.clone(),
        factory_for(escalated.clone(), created.clone()),
    );

    let result = client
        .fetch(
            "https://shop.test/",
            FetchOptions::get(Duration::from_secs(5)),
        )
        .await
        .expect("escalated response");

    assert_eq!(result.status_code, 200);
    assert_eq!(result.transport, TransportKind::Escalated);
    assert_eq!(primary.calls(), 2);
    assert_eq!(escalated.calls(), 2);
    assert_eq!(created.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_probe_without_escalation_exhausts_attempts() {
    let primary = ScriptedTransport::new(TransportKind::Plain, &[(429, "slow down")]);
    let escalated = ScriptedTransport::new(TransportKind::Escalated, &[(200, "ok")]);
    let created = Arc::new(AtomicUsize::new(0));

    let client = FetchClient::with_transports(
        &fast_config(3),
        primary.clone(),
        factory_for(escalated.clone(), created.clone()),
    );

    let result = client
        .fetch(
            "https://shop.test/shop/",
            FetchOptions::get(Duration::from_secs(5)).without_escalation(),
        )
        .await;

    assert!(result.is_none());
    assert_eq!(primary.calls(), 3);
    assert_eq!(escalated.calls(), 0);
    assert_eq!(created.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_block_page_is_retried_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Access Denied"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>Storefront</html>"))
        .mount(&server)
        .await;

    let client = FetchClient::new(&fast_config(2)).unwrap();
    let result = client
        .fetch(
            &format!("{}/", server.uri()),
            FetchOptions::get(Duration::from_secs(5)).without_escalation(),
        )
        .await
        .expect("second attempt succeeds");

    assert_eq!(result.status_code, 200);
    assert_eq!(result.body, "<html>Storefront</html>");
    assert_eq!(result.transport, TransportKind::Plain);
}

#[tokio::test]
async fn test_rotating_headers_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(header_exists("user-agent"))
        .and(header_exists("accept-language"))
        .and(header("referer", "https://shop.test/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let client = FetchClient::new(&fast_config(1)).unwrap();
    let result = client
        .fetch(
            &format!("{}/", server.uri()),
            FetchOptions::get(Duration::from_secs(5)).with_referer("https://shop.test/"),
        )
        .await
        .expect("response");

    assert_eq!(result.status_code, 200);
}
