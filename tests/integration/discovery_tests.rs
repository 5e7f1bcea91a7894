use crate::common::{listing_page, loader, mount_not_found, mount_page, test_config};
use storefront_harvester::discovery::LinkDiscoverer;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn base_url(server: &MockServer) -> Url {
    Url::parse(&format!("{}/", server.uri())).unwrap()
}

#[tokio::test]
async fn test_sitemap_hit_skips_category_probe() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/sitemap.xml",
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
            <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
                <url><loc>{base}/product/blue-mug/</loc></url>
                <url><loc>{base}/product/red-mug/</loc></url>
                <url><loc>{base}/about-us/</loc></url>
                <url><loc>https://elsewhere.test/product/stolen/</loc></url>
            </urlset>"#
        ),
    )
    .await;

    for category in ["/shop/", "/store/", "/products/"] {
        Mock::given(method("GET"))
            .and(path(category))
            .respond_with(ResponseTemplate::new(200).set_body_string("products"))
            .expect(0)
            .mount(&server)
            .await;
    }
    mount_not_found(&server).await;

    let config = test_config();
    let loader = loader(&config, None);
    let discoverer = LinkDiscoverer::new(&loader, &config.fetch, &config.discovery);

    let outcome = discoverer
        .discover_product_links(&base_url(&server), false)
        .await;

    assert_eq!(outcome.links.len(), 2);
    assert!(outcome.links.contains(&format!("{base}/product/blue-mug/")));
    assert!(outcome.links.contains(&format!("{base}/product/red-mug/")));
    assert!(!outcome.rendered);
}

#[tokio::test]
async fn test_sitemap_index_descends_into_product_children_only() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/sitemap.xml",
        format!(
            r#"<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
                <sitemap><loc>{base}/post-sitemap.xml</loc></sitemap>
                <sitemap><loc>{base}/product-sitemap1.xml</loc></sitemap>
            </sitemapindex>"#
        ),
    )
    .await;
    mount_page(
        &server,
        "/product-sitemap1.xml",
        format!(
            r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
                <url><loc>{base}/product/lamp/</loc></url>
            </urlset>"#
        ),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/post-sitemap.xml"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    mount_not_found(&server).await;

    let config = test_config();
    let loader = loader(&config, None);
    let discoverer = LinkDiscoverer::new(&loader, &config.fetch, &config.discovery);

    let links = discoverer.sitemap_links(&base_url(&server)).await;

    assert_eq!(links.len(), 1);
    assert!(links.contains(&format!("{base}/product/lamp/")));
}

#[tokio::test]
async fn test_self_referencing_sitemap_index_terminates() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/sitemap.xml",
        format!(
            r#"<sitemapindex>
                <sitemap><loc>{base}/product-sitemap.xml</loc></sitemap>
            </sitemapindex>"#
        ),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/product-sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"<sitemapindex>
                <sitemap><loc>{base}/product-sitemap.xml</loc></sitemap>
                <sitemap><loc>{base}/sitemap.xml</loc></sitemap>
            </sitemapindex>"#
        )))
        .expect(1)
        .mount(&server)
        .await;
    mount_not_found(&server).await;

    let config = test_config();
    let loader = loader(&config, None);
    let discoverer = LinkDiscoverer::new(&loader, &config.fetch, &config.discovery);

    assert!(discoverer.sitemap_links(&base_url(&server)).await.is_empty());
}

#[tokio::test]
async fn test_sitemap_index_ignores_children_on_other_hosts() {
    let shop = MockServer::start().await;
    let other = MockServer::start().await;
    let foreign = other.uri();

    mount_page(
        &shop,
        "/sitemap.xml",
        format!(
            r#"<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
                <sitemap><loc>{foreign}/product-sitemap.xml</loc></sitemap>
            </sitemapindex>"#
        ),
    )
    .await;
    mount_not_found(&shop).await;

    Mock::given(method("GET"))
        .and(path("/product-sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
                <url><loc>{foreign}/product/foreign/</loc></url>
            </urlset>"#
        )))
        .expect(0)
        .mount(&other)
        .await;
    mount_not_found(&other).await;

    let config = test_config();
    let loader = loader(&config, None);
    let discoverer = LinkDiscoverer::new(&loader, &config.fetch, &config.discovery);

    let links = discoverer.sitemap_links(&base_url(&shop)).await;

    assert!(links.is_empty());
    assert!(!links.contains(&format!("{foreign}/product/foreign/")));
}

#[tokio::test]
async fn test_discovery_is_idempotent() {
    let server = MockServer::start().await;
    mount_page(&server, "/shop/", listing_page(&["a", "b", "c"])).await;
    mount_not_found(&server).await;

    let config = test_config();
    let loader = loader(&config, None);
    let discoverer = LinkDiscoverer::new(&loader, &config.fetch, &config.discovery);
    let base = base_url(&server);

    let first = discoverer.discover_product_links(&base, false).await;
    let second = discoverer.discover_product_links(&base, false).await;

    assert_eq!(first.links.len(), 3);
    assert_eq!(first.links, second.links);
    assert_eq!(first.listing_url, second.listing_url);
}

#[tokio::test]
async fn test_listing_links_keep_listing_origin() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/shop/",
        format!(
            r#"<html><body><p>Our products</p>
                <a class="product-link" href="/product/local-one/">Local</a>
                <a class="product-link" href="{base}/product/local-two/">Local two</a>
                <a class="product-link" href="https://cdn.elsewhere.test/product/remote/">Remote</a>
                <a class="product-link" href="//other.test/product/protocol-relative/">Other</a>
            </body></html>"#
        ),
    )
    .await;
    mount_not_found(&server).await;

    let config = test_config();
    let loader = loader(&config, None);
    let discoverer = LinkDiscoverer::new(&loader, &config.fetch, &config.discovery);

    let outcome = discoverer
        .discover_product_links(&base_url(&server), false)
        .await;

    let listing_origin = outcome.listing_url.origin();
    assert_eq!(outcome.links.len(), 2);
    for link in outcome.links.iter() {
        assert_eq!(Url::parse(link).unwrap().origin(), listing_origin);
    }
}

#[tokio::test]
async fn test_pagination_is_followed_and_unioned() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/shop/",
        r#"<html><body>products
            <a class="product-link" href="/product/one/">One</a>
            <a rel="next" href="/shop/page/2/">Next</a>
        </body></html>"#,
    )
    .await;
    mount_page(
        &server,
        "/shop/page/2/",
        r#"<html><body>
            <a class="product-link" href="/product/two/">Two</a>
            <a class="product-link" href="/product/one/">One again</a>
            <a rel="next" href="/shop/">Back to start</a>
        </body></html>"#,
    )
    .await;
    mount_not_found(&server).await;

    let config = test_config();
    let loader = loader(&config, None);
    let discoverer = LinkDiscoverer::new(&loader, &config.fetch, &config.discovery);

    let outcome = discoverer
        .discover_product_links(&base_url(&server), false)
        .await;

    assert_eq!(outcome.links.len(), 2);
}

#[tokio::test]
async fn test_homepage_fallback_when_listing_is_empty() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/shop/",
        "<html><body><p>No products in this category yet.</p></body></html>",
    )
    .await;
    mount_page(
        &server,
        "/",
        r#"<html><body>
            <div class="product-card"><a href="/products/featured-bowl">Bowl</a></div>
        </body></html>"#,
    )
    .await;
    mount_not_found(&server).await;

    let config = test_config();
    let loader = loader(&config, None);
    let discoverer = LinkDiscoverer::new(&loader, &config.fetch, &config.discovery);
    let base = base_url(&server);

    let outcome = discoverer.discover_product_links(&base, false).await;

    assert_eq!(outcome.listing_url, base.join("/shop/").unwrap());
    assert_eq!(outcome.links.len(), 1);
    assert!(outcome
        .links
        .contains(&format!("{}/products/featured-bowl", server.uri())));
}
