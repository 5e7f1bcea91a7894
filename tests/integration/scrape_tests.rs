use crate::common::{
    html, listing_page, mount_not_found, mount_page, simple_product_page, test_config,
    variable_product_page, StubRenderer,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use storefront_harvester::fetch::{ReqwestTransport, Transport, TransportFactory};
use storefront_harvester::Scraper;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{any, header, method, path, path_regex};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Storefront with `/shop/` listing the given simple products
async fn storefront(products: &[(&str, &str, &str)]) -> MockServer {
    let server = MockServer::start().await;

    mount_page(&server, "/shop", "<html><body><h1>Shop</h1></body></html>").await;
    let slugs: Vec<&str> = products.iter().map(|(slug, _, _)| *slug).collect();
    mount_page(&server, "/shop/", listing_page(&slugs)).await;

    for (slug, name, price) in products {
        mount_page(
            &server,
            &format!("/product/{slug}/"),
            simple_product_page(name, price, slug),
        )
        .await;
    }

    mount_not_found(&server).await;
    server
}

fn progress_bodies(requests: &[wiremock::Request]) -> Vec<serde_json::Value> {
    requests
        .iter()
        .filter(|request| request.url.path() == "/v4/auto-onboard/progress")
        .map(|request| serde_json::from_slice(&request.body).unwrap())
        .collect()
}

#[tokio::test]
async fn test_two_products_through_category_probe() {
    let server = storefront(&[
        ("blue-mug", "Blue Mug", "$12.00"),
        ("red-mug", "Red Mug", "$14.50"),
    ])
    .await;

    let scraper = Scraper::new(test_config()).unwrap().with_renderer(None);
    let records = scraper
        .scrape_site(&format!("{}/shop", server.uri()), None, None)
        .await;

    assert_eq!(records.len(), 2);
    for record in &records {
        assert!(!record.name.is_empty());
        assert!(!record.price.is_empty());
    }

    let urls: HashSet<String> = records.iter().map(|r| r.url.clone()).collect();
    let expected: HashSet<String> = ["blue-mug", "red-mug"]
        .iter()
        .map(|slug| format!("{}/product/{}/", server.uri(), slug))
        .collect();
    assert_eq!(urls, expected);

    let blue = records.iter().find(|r| r.name == "Blue Mug").unwrap();
    assert_eq!(blue.price, "$12.00");
    assert_eq!(blue.image_url, format!("{}/uploads/blue-mug.jpg", server.uri()));
}

#[tokio::test]
async fn test_failing_collaborator_does_not_affect_results() {
    let server = storefront(&[
        ("one", "Item One", "$1.00"),
        ("two", "Item Two", "$2.00"),
        ("three", "Item Three", "$3.00"),
    ])
    .await;

    let collaborator = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .mount(&collaborator)
        .await;

    let scraper = Scraper::new(test_config()).unwrap().with_renderer(None);
    let records = scraper
        .scrape_site(
            &format!("{}/shop", server.uri()),
            Some(&collaborator.uri()),
            Some("token"),
        )
        .await;

    assert_eq!(records.len(), 3);

    let requests = collaborator.received_requests().await.unwrap();
    let items = requests
        .iter()
        .filter(|r| r.url.path() == "/v4/auto-onboard/items")
        .count();
    assert_eq!(items, 3);

    // Nothing was accepted, so the completion message counts zero imports
    let progress = progress_bodies(&requests);
    let last = progress.last().unwrap();
    assert_eq!(last["phase"], "complete");
    assert_eq!(last["message"], "Completed: 0 products imported, 0 skipped");
}

#[tokio::test]
async fn test_progress_sequence_and_delivery() {
    let server = storefront(&[("lamp", "Desk Lamp", "$40.00")]).await;

    let collaborator = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v4/auto-onboard/items"))
        .and(header("authorization", "Bearer agent-token"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&collaborator)
        .await;
    Mock::given(method("POST"))
        .and(path("/v4/auto-onboard/progress"))
        .respond_with(ResponseTemplate::new(202))
        .mount(&collaborator)
        .await;

    let scraper = Scraper::new(test_config()).unwrap().with_renderer(None);
    let records = scraper
        .scrape_site(
            &format!("{}/shop", server.uri()),
            Some(&format!("{}/", collaborator.uri())),
            Some("agent-token"),
        )
        .await;

    assert_eq!(records.len(), 1);

    let requests = collaborator.received_requests().await.unwrap();
    let progress = progress_bodies(&requests);
    let phases: Vec<&str> = progress
        .iter()
        .map(|body| body["phase"].as_str().unwrap())
        .collect();
    assert_eq!(phases, ["discovery", "scraping", "importing", "complete"]);

    assert_eq!(progress[0]["discoveredCount"], 1);
    assert_eq!(progress[1]["sentCount"], 0);
    assert_eq!(progress[2]["message"], "Imported 1 of 1 products (0 skipped)");
    assert_eq!(progress[3]["createdCount"], 1);
    assert_eq!(progress[3]["message"], "Completed: 1 products imported, 0 skipped");
}

#[tokio::test]
async fn test_variable_products_are_skipped() {
    let server = MockServer::start().await;
    mount_page(&server, "/shop/", listing_page(&["tee", "mug"])).await;
    mount_page(&server, "/product/tee/", variable_product_page("Tee")).await;
    mount_page(
        &server,
        "/product/mug/",
        simple_product_page("Mug", "$9.00", "mug"),
    )
    .await;
    mount_not_found(&server).await;

    let scraper = Scraper::new(test_config()).unwrap().with_renderer(None);
    let records = scraper.scrape_site(&server.uri(), None, None).await;

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "Mug");
}

#[tokio::test]
async fn test_renderer_released_exactly_once() {
    let server = storefront(&[("vase", "Glass Vase", "$30.00")]).await;
    let renderer = Arc::new(StubRenderer::default());

    let mut config = test_config();
    config.render.enabled = true;
    let scraper = Scraper::new(config)
        .unwrap()
        .with_renderer(Some(renderer.clone()));

    let records = scraper
        .scrape_site(&format!("{}/shop", server.uri()), None, None)
        .await;

    assert_eq!(records.len(), 1);
    assert_eq!(renderer.acquired(), 1);
    assert_eq!(renderer.released(), 1);
    // Static pages never needed the browser
    assert_eq!(renderer.renders(), 0);
}

#[tokio::test]
async fn test_empty_site_still_releases_renderer() {
    let server = MockServer::start().await;
    mount_page(&server, "/", "<html><body><p>Coming soon</p></body></html>").await;
    mount_not_found(&server).await;

    let renderer = Arc::new(StubRenderer::default());
    let scraper = Scraper::new(test_config())
        .unwrap()
        .with_renderer(Some(renderer.clone()));

    let records = scraper.scrape_site(&server.uri(), None, None).await;

    assert!(records.is_empty());
    // Static tiers found nothing, so the late render fallback was tried
    assert_eq!(renderer.renders(), 1);
    assert_eq!(renderer.released(), 1);
}

/// Serves a product page and cancels the run as a side effect
struct CancelOnProductPage {
    cancel: CancellationToken,
}

impl Respond for CancelOnProductPage {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        self.cancel.cancel();
        let slug = request
            .url
            .path()
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or("item")
            .to_string();
        html(simple_product_page(&slug, "$5.00", &slug))
    }
}

#[tokio::test]
async fn test_cancellation_between_product_urls() {
    let cancel = CancellationToken::new();

    let server = MockServer::start().await;
    mount_page(&server, "/shop", "<html><body><h1>Shop</h1></body></html>").await;
    mount_page(&server, "/shop/", listing_page(&["one", "two", "three"])).await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/product/[a-z]+/$"))
        .respond_with(CancelOnProductPage {
            cancel: cancel.clone(),
        })
        .expect(1)
        .mount(&server)
        .await;
    mount_not_found(&server).await;

    let collaborator = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(202))
        .mount(&collaborator)
        .await;

    let renderer = Arc::new(StubRenderer::default());
    let scraper = Scraper::new(test_config())
        .unwrap()
        .with_renderer(Some(renderer.clone()));

    let records = scraper
        .scrape_site_with_cancel(
            &format!("{}/shop", server.uri()),
            Some(&collaborator.uri()),
            Some("token"),
            cancel,
        )
        .await;

    assert_eq!(records.len(), 1);
    assert_eq!(renderer.acquired(), 1);
    assert_eq!(renderer.released(), 1);

    let requests = collaborator.received_requests().await.unwrap();
    let progress = progress_bodies(&requests);
    let last = progress.last().unwrap();
    assert_eq!(last["phase"], "error");
    assert_eq!(last["discoveredCount"], 3);
    assert!(!progress.iter().any(|body| body["phase"] == "complete"));
}

async fn blocked_site() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(403).set_body_string("Access Denied"))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_concurrent_sites_get_their_own_escalation_client() {
    let first = blocked_site().await;
    let second = blocked_site().await;

    let created = Arc::new(AtomicUsize::new(0));
    let counter = created.clone();
    let factory: TransportFactory = Arc::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        let transport: Arc<dyn Transport> = Arc::new(ReqwestTransport::new()?);
        Ok(transport)
    });
    let primary: Arc<dyn Transport> = Arc::new(ReqwestTransport::new().unwrap());

    let scraper = Scraper::new(test_config())
        .unwrap()
        .with_renderer(None)
        .with_transports(primary, factory);

    let first_uri = first.uri();
    let second_uri = second.uri();
    let (first_records, second_records) = tokio::join!(
        scraper.scrape_site(&first_uri, None, None),
        scraper.scrape_site(&second_uri, None, None),
    );

    assert!(first_records.is_empty());
    assert!(second_records.is_empty());
    assert_eq!(created.load(Ordering::SeqCst), 2);
}
