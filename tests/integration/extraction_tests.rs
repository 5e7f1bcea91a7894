use crate::common::{loader, mount_not_found, mount_page, simple_product_page, test_config};
use scraper::Html;
use std::time::Duration;
use storefront_harvester::extract::{
    extract_from_html, extract_product, is_simple_product, SkipReason,
};
use url::Url;

fn shopify_page(options: &[&str]) -> String {
    let options: String = options
        .iter()
        .map(|option| format!("<option value=\"{option}\">{option}</option>"))
        .collect();

    format!(
        r#"<html><body class="template-product">
            <h1 class="product__title">Linen Apron</h1>
            <form action="/cart/add">
                <div class="product-form__variants">
                    <select name="id">{options}</select>
                </div>
            </form>
            <span class="price-item price-item--regular">$28.00</span>
        </body></html>"#
    )
}

#[test]
fn test_single_option_select_is_simple() {
    let single = Html::parse_document(&shopify_page(&["Default Title"]));
    assert!(is_simple_product(&single));

    let double = Html::parse_document(&shopify_page(&["Small", "Large"]));
    assert!(!is_simple_product(&double));
}

#[test]
fn test_sale_price_wins_over_struck_original() {
    let html = r#"<html><body class="product-type-simple">
        <h1 class="product_title">Walnut Board</h1>
        <p class="price">
            <del><span class="woocommerce-Price-amount amount">$45.00</span></del>
            <ins><span class="woocommerce-Price-amount amount">£39.50</span></ins>
        </p>
    </body></html>"#;
    let page = Url::parse("https://shop.test/product/walnut-board/").unwrap();

    let record = extract_from_html(html, &page).unwrap();
    assert_eq!(record.name, "Walnut Board");
    assert_eq!(record.price, "£39.50");
}

#[test]
fn test_grouped_body_class_is_skipped() {
    let html = r#"<html><body class="product-type-grouped"><h1>Gift Set</h1></body></html>"#;
    let page = Url::parse("https://shop.test/product/gift-set/").unwrap();

    assert_eq!(extract_from_html(html, &page), Err(SkipReason::NotSimple));
}

#[tokio::test]
async fn test_product_page_over_http() {
    let server = mockserver_with_product().await;
    let config = test_config();
    let loader = loader(&config, None);
    let url = format!("{}/product/oak-stool/", server.uri());

    let record = extract_product(&loader, &url, Duration::from_secs(5), false)
        .await
        .unwrap();

    assert_eq!(record.name, "Oak Stool");
    assert_eq!(record.price, "$120.00");
    assert_eq!(record.description, "Oak Stool, made by hand.");
    assert_eq!(
        record.image_url,
        format!("{}/uploads/oak-stool.jpg", server.uri())
    );
    assert_eq!(record.url, url);
}

#[tokio::test]
async fn test_unreachable_product_page_is_skipped() {
    let config = test_config();
    let loader = loader(&config, None);

    let result = extract_product(
        &loader,
        "http://127.0.0.1:9/product/gone/",
        Duration::from_secs(2),
        false,
    )
    .await;

    assert_eq!(result, Err(SkipReason::Unavailable));
}

async fn mockserver_with_product() -> wiremock::MockServer {
    let server = wiremock::MockServer::start().await;
    mount_page(
        &server,
        "/product/oak-stool/",
        simple_product_page("Oak Stool", "$120.00", "oak-stool"),
    )
    .await;
    mount_not_found(&server).await;
    server
}
