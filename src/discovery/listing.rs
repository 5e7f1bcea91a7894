//! Product links on a listing page: selector cascade, broad scan, next page

use super::DiscoverySet;
use crate::html::compile_selectors;
use crate::url::{is_broad_scan_candidate, is_listing_product_href, resolve_link, same_origin};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use url::Url;

/// Platform-tuned listing selectors, most specific first
pub const LISTING_SELECTORS: &[&str] = &[
    "a.woocommerce-LoopProduct-link",
    "a.product-item-link",
    "a.product-link",
    "a[href*='/product/']",
    "a[href*='/products/']",
    "a[href*='/product-page/']",
    "a[href*='/p/']",
    "a[href*='/item/']",
    "a[href*='/pd/']",
    ".product-item a",
    ".product a",
    "article.product a",
    "[itemtype*='Product'] a",
    ".grid-product a",
    ".product-card a",
];

/// "Next page" controls, tried in order
pub const NEXT_PAGE_SELECTORS: &[&str] = &[
    "a.next",
    ".pagination a[rel='next']",
    "a[aria-label='Next']",
    "a[rel='next']",
];

static LISTING: Lazy<Vec<Selector>> = Lazy::new(|| compile_selectors(LISTING_SELECTORS));
static NEXT_PAGE: Lazy<Vec<Selector>> = Lazy::new(|| compile_selectors(NEXT_PAGE_SELECTORS));
static ANCHORS: Lazy<Vec<Selector>> = Lazy::new(|| compile_selectors(&["a[href]"]));

/// What one listing page contributed
#[derive(Debug, Default)]
pub struct ListingPage {
    pub links: DiscoverySet,
    pub next_page: Option<Url>,
}

/// Extracts same-origin product links and the next-page URL
///
/// Every selector in the cascade contributes. Only when none of them yields
/// a link is every anchor on the page scanned instead.
pub fn extract_listing_links(html: &str, page_url: &Url) -> ListingPage {
    let document = Html::parse_document(html);
    let mut links = DiscoverySet::new();

    for selector in LISTING.iter() {
        for anchor in document.select(selector) {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            if !is_listing_product_href(href) {
                continue;
            }
            if let Some(link) = resolve_link(href, page_url) {
                links.insert_same_origin(&link, page_url);
            }
        }
    }

    if links.is_empty() {
        tracing::debug!("No selector matched on {}, trying broader search", page_url);
        for selector in ANCHORS.iter() {
            for anchor in document.select(selector) {
                let Some(href) = anchor.value().attr("href") else {
                    continue;
                };
                if !is_broad_scan_candidate(href) {
                    continue;
                }
                if let Some(link) = resolve_link(href, page_url) {
                    links.insert_same_origin(&link, page_url);
                }
            }
        }
    }

    ListingPage {
        links,
        next_page: find_next_page(&document, page_url),
    }
}

fn find_next_page(document: &Html, page_url: &Url) -> Option<Url> {
    for selector in NEXT_PAGE.iter() {
        if let Some(anchor) = document.select(selector).next() {
            let next = anchor
                .value()
                .attr("href")
                .and_then(|href| resolve_link(href, page_url))
                .filter(|next| same_origin(next, page_url));
            return next;
        }
    }
    None
}
