//! Product classification and field extraction
//!
//! A product page is first classified; only "simple" single-SKU pages have
//! their name, price, description and image extracted.

mod classify;
mod fields;
mod price;

pub use classify::{is_simple_product, NON_SIMPLE_BODY_CLASSES};
pub use fields::{
    extract_description, extract_image, extract_name, extract_price, DESCRIPTION_SELECTORS,
    IMAGE_SELECTORS, NAME_SELECTORS, REGULAR_PRICE_SELECTORS, SALE_PRICE_SELECTORS,
};
pub use price::{clean_price_text, first_symbol_amount, table_cell_price};

use crate::fetch::FetchOptions;
use crate::render::PageLoader;
use scraper::Html;
use serde::{Deserialize, Serialize};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Duration;
use url::Url;

/// One extracted simple product
///
/// Every field defaults to an empty string; a record with empty name and
/// price is still a valid record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductRecord {
    pub name: String,
    /// Displayed price including its currency symbol, not parsed
    pub price: String,
    pub description: String,
    /// Absolute image URL, or empty
    pub image_url: String,
    /// Source page URL, doubling as the external identifier
    pub url: String,
}

/// Why a product page produced no record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// No content could be fetched or rendered
    Unavailable,
    /// The page has variants, groups or bundles
    NotSimple,
    /// Extraction failed unexpectedly
    Failed(String),
}

/// Classifies and extracts a product from already-loaded HTML
pub fn extract_from_html(html: &str, page_url: &Url) -> Result<ProductRecord, SkipReason> {
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        let document = Html::parse_document(html);

        if !is_simple_product(&document) {
            return None;
        }

        Some(ProductRecord {
            name: extract_name(&document),
            price: extract_price(&document),
            description: extract_description(&document),
            image_url: extract_image(&document, page_url),
            url: page_url.to_string(),
        })
    }));

    match outcome {
        Ok(Some(record)) => Ok(record),
        Ok(None) => Err(SkipReason::NotSimple),
        Err(panic) => {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(SkipReason::Failed(message))
        }
    }
}

/// Loads a product page and extracts it
///
/// In `render_mode` the page is rendered first and fetched statically only
/// if rendering yields nothing.
pub async fn extract_product(
    loader: &PageLoader,
    url: &str,
    timeout: Duration,
    render_mode: bool,
) -> Result<ProductRecord, SkipReason> {
    let page_url = Url::parse(url).map_err(|e| SkipReason::Failed(e.to_string()))?;

    let Some(html) = loader
        .load_with_mode(url, FetchOptions::get(timeout), render_mode)
        .await
    else {
        tracing::warn!("Skipping {} after repeated blocks", url);
        return Err(SkipReason::Unavailable);
    };

    match extract_from_html(&html, &page_url) {
        Ok(record) => Ok(record),
        Err(SkipReason::NotSimple) => {
            tracing::info!("Skipping (not simple): {}", url);
            Err(SkipReason::NotSimple)
        }
        Err(reason) => {
            tracing::warn!("Error processing {}: {:?}", url, reason);
            Err(reason)
        }
    }
}
