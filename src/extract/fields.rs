//! Ordered field extractor tables
//!
//! Each field is read from a table of selectors running from the most
//! platform-specific to the most generic; the first non-empty match wins.
//! Every extractor degrades to an empty string.

use super::price::{clean_price_text, first_symbol_amount, table_cell_price};
use crate::html::{collapse_whitespace, compile_selectors, element_text};
use crate::url::resolve_asset;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use url::Url;

pub const NAME_SELECTORS: &[&str] = &[
    "h1.product_title",
    "h1.product-title",
    "h1[itemprop='name']",
    "[data-hook='product-title']",
    ".product-title",
    "h1.entry-title",
    ".page-title",
    ".product-name",
    "h1.h2",
    "h1",
];

/// Discounted/current price, tried before the regular price
pub const SALE_PRICE_SELECTORS: &[&str] = &[
    "p.price ins .woocommerce-Price-amount",
    "ins .amount",
    ".sale-price",
    ".current-price",
    ".price__sale .price-item--sale",
    "span.price-item--sale",
];

pub const REGULAR_PRICE_SELECTORS: &[&str] = &[
    "[data-hook='formatted-primary-price']",
    "[data-hook='product-price']",
    "p.price .woocommerce-Price-amount",
    "span.woocommerce-Price-amount",
    "p.price",
    ".product-price",
    "[itemprop='price']",
    ".price__regular .price-item",
    ".price",
    ".price-box .price",
    "span.money",
];

pub const DESCRIPTION_SELECTORS: &[&str] = &[
    "div.woocommerce-product-details__short-description",
    ".product-description",
    "[itemprop='description']",
    ".short-description",
    ".description",
    ".product-short-description",
    ".product-info-description",
    ".product__description",
];

/// Keywords marking a paragraph as page chrome rather than a description
pub const DESCRIPTION_SKIP_KEYWORDS: &[&str] = &[
    "cookie",
    "copyright",
    "menu",
    "navigation",
    "products -",
    "quick view",
    "mailing list",
    "all products",
];

pub const IMAGE_SELECTORS: &[&str] = &[
    "img.wp-post-image",
    ".woocommerce-product-gallery__image img",
    ".product-image img",
    "[itemprop='image']",
    "img[src*='product']",
    ".product-gallery img",
    ".product-media img",
    ".product__media img",
    "meta[property='og:image']",
    ".main-image img",
];

/// Source attributes in order of preference (lazy-load first)
pub const IMAGE_ATTRIBUTES: &[&str] = &["data-src", "src", "data-lazy-src", "content"];

/// Tokens that make a primary image unusable
pub const REJECTED_IMAGE_TOKENS: &[&str] = &["logo", "transparent", "placeholder", "default"];

/// Tokens excluded when searching galleries and the whole page
pub const EXCLUDED_IMAGE_TOKENS: &[&str] = &["logo", "transparent", "placeholder", "stripe", "payment"];

/// Path fragments typical of product photos
pub const PRODUCT_IMAGE_PATHS: &[&str] = &["/large/", "/medium/", "/product", "/item", "/files/"];

const DESCRIPTION_MIN_CHARS: usize = 50;
const DESCRIPTION_MAX_CHARS: usize = 1000;

static NAME: Lazy<Vec<Selector>> = Lazy::new(|| compile_selectors(NAME_SELECTORS));
static SALE_PRICE: Lazy<Vec<Selector>> = Lazy::new(|| compile_selectors(SALE_PRICE_SELECTORS));
static REGULAR_PRICE: Lazy<Vec<Selector>> =
    Lazy::new(|| compile_selectors(REGULAR_PRICE_SELECTORS));
static DESCRIPTION: Lazy<Vec<Selector>> = Lazy::new(|| compile_selectors(DESCRIPTION_SELECTORS));
static IMAGE: Lazy<Vec<Selector>> = Lazy::new(|| compile_selectors(IMAGE_SELECTORS));
static GALLERY_IMAGES: Lazy<Vec<Selector>> = Lazy::new(|| {
    compile_selectors(&[
        ".product-gallery img, .product-images img, .product-media img, .woocommerce-product-gallery img",
    ])
});
static TABLE_CELLS: Lazy<Vec<Selector>> = Lazy::new(|| compile_selectors(&["td"]));
static PRICE_CLASS_CANDIDATES: Lazy<Vec<Selector>> =
    Lazy::new(|| compile_selectors(&["span, div, p"]));
static PARAGRAPHS: Lazy<Vec<Selector>> = Lazy::new(|| compile_selectors(&["p"]));
static IMAGES: Lazy<Vec<Selector>> = Lazy::new(|| compile_selectors(&["img"]));

fn elements<'a>(
    document: &'a Html,
    selectors: &'a [Selector],
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    selectors
        .iter()
        .flat_map(move |selector| document.select(selector))
}

/// Text of the first match in table order that has any text
fn first_text(document: &Html, table: &[Selector]) -> Option<String> {
    table.iter().find_map(|selector| {
        document
            .select(selector)
            .map(|element| element_text(&element))
            .find(|text| !text.is_empty())
    })
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    let lower = haystack.to_lowercase();
    needles.iter().any(|needle| lower.contains(needle))
}

pub fn extract_name(document: &Html) -> String {
    first_text(document, &NAME).unwrap_or_default()
}

/// Extracts the charged price as displayed, currency symbol included
///
/// Sale price first, then regular price (both cleaned), then unit-price
/// table cells, then any element with "price" in its class.
pub fn extract_price(document: &Html) -> String {
    let raw = first_text(document, &SALE_PRICE).or_else(|| first_text(document, &REGULAR_PRICE));

    if let Some(raw) = raw {
        let cleaned = clean_price_text(&raw);
        if !cleaned.is_empty() {
            return cleaned;
        }
    }

    if let Some(price) =
        elements(document, &TABLE_CELLS).find_map(|cell| table_cell_price(&element_text(&cell)))
    {
        return price;
    }

    elements(document, &PRICE_CLASS_CANDIDATES)
        .filter(|element| {
            element
                .value()
                .attr("class")
                .is_some_and(|class| class.to_lowercase().contains("price"))
        })
        .find_map(|element| first_symbol_amount(&element_text(&element)))
        .unwrap_or_default()
}

/// Extracts the description with whitespace collapsed
///
/// Falls back to the first paragraph of plausible length that does not
/// look like page chrome.
pub fn extract_description(document: &Html) -> String {
    let text = first_text(document, &DESCRIPTION).or_else(|| {
        elements(document, &PARAGRAPHS)
            .map(|paragraph| element_text(&paragraph))
            .find(|text| {
                let chars = text.chars().count();
                chars > DESCRIPTION_MIN_CHARS
                    && chars < DESCRIPTION_MAX_CHARS
                    && !contains_any(text, DESCRIPTION_SKIP_KEYWORDS)
            })
    });

    text.map(|text| collapse_whitespace(&text)).unwrap_or_default()
}

fn preferred_source(element: &ElementRef) -> Option<String> {
    IMAGE_ATTRIBUTES
        .iter()
        .filter_map(|attr| element.value().attr(attr))
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

/// `src`, falling back to `data-src`
fn plain_source(element: &ElementRef) -> Option<String> {
    ["src", "data-src"]
        .iter()
        .filter_map(|attr| element.value().attr(attr))
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

fn is_unusable(image_url: &str) -> bool {
    image_url.is_empty() || contains_any(image_url, REJECTED_IMAGE_TOKENS)
}

/// Extracts an absolute product image URL
///
/// A primary image that is missing or looks like a logo/placeholder is
/// replaced from the product gallery, then from any image whose path looks
/// like a product photo.
pub fn extract_image(document: &Html, page_url: &Url) -> String {
    let mut image_url = IMAGE
        .iter()
        .find_map(|selector| document.select(selector).find_map(|el| preferred_source(&el)))
        .map(|src| resolve_asset(&src, page_url))
        .unwrap_or_default();

    if !is_unusable(&image_url) {
        return image_url;
    }

    if let Some(src) = elements(document, &GALLERY_IMAGES)
        .filter_map(|img| plain_source(&img))
        .find(|src| !contains_any(src, EXCLUDED_IMAGE_TOKENS))
    {
        image_url = resolve_asset(&src, page_url);
    }

    if !is_unusable(&image_url) {
        return image_url;
    }

    if let Some(src) = elements(document, &IMAGES)
        .filter_map(|img| plain_source(&img))
        .find(|src| {
            contains_any(src, PRODUCT_IMAGE_PATHS) && !contains_any(src, EXCLUDED_IMAGE_TOKENS)
        })
    {
        image_url = resolve_asset(&src, page_url);
    }

    image_url
}
