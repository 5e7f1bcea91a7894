//! Price text cleanup

use once_cell::sync::Lazy;
use regex::Regex;

static PRICE_LABELS: Lazy<Option<Regex>> =
    Lazy::new(|| compile(r"(?i)(Regular price|Sale price|Unit price|per|Sold out)"));

static CURRENCY_AMOUNT: Lazy<Option<Regex>> =
    Lazy::new(|| compile(r"(?:Rs\.?\s*|[$₹€£¥])[\d,]+\.?\d*"));

static TABLE_CELL_AMOUNT: Lazy<Option<Regex>> = Lazy::new(|| compile(r"\$[\d.]+(?:/lbs)?"));

static SYMBOL_AMOUNT: Lazy<Option<Regex>> = Lazy::new(|| compile(r"[$₹€£¥][\d,]+\.?\d*"));

fn compile(pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(regex) => Some(regex),
        Err(e) => {
            tracing::warn!("Invalid price pattern {:?}: {}", pattern, e);
            None
        }
    }
}

/// Strips price labels and keeps the last currency amount
///
/// When no currency amount is present the label-stripped text is kept.
///
/// # Examples
///
/// ```
/// use storefront_harvester::extract::clean_price_text;
///
/// assert_eq!(clean_price_text("Regular price$30.00Sale price$24.00"), "$24.00");
/// assert_eq!(clean_price_text("Rs. 1,299.00"), "Rs. 1,299.00");
/// assert_eq!(clean_price_text("Call for price"), "Call for price");
/// ```
pub fn clean_price_text(raw: &str) -> String {
    let stripped = match PRICE_LABELS.as_ref() {
        Some(labels) => labels.replace_all(raw, "").into_owned(),
        None => raw.to_string(),
    };

    let last_amount = CURRENCY_AMOUNT
        .as_ref()
        .and_then(|pattern| pattern.find_iter(&stripped).last())
        .map(|m| m.as_str().trim().to_string());

    last_amount.unwrap_or_else(|| stripped.trim().to_string())
}

/// Dollar amount inside a unit-price table cell, e.g. `$4.50/lbs`
pub fn table_cell_price(cell_text: &str) -> Option<String> {
    let looks_like_unit_price = cell_text.contains('$')
        && (cell_text.contains('=') || cell_text.contains("/lbs") || cell_text.contains("lb"));
    if !looks_like_unit_price {
        return None;
    }

    TABLE_CELL_AMOUNT
        .as_ref()?
        .find(cell_text)
        .map(|m| m.as_str().to_string())
}

/// First symbol-prefixed amount in arbitrary text
pub fn first_symbol_amount(text: &str) -> Option<String> {
    SYMBOL_AMOUNT
        .as_ref()?
        .find(text)
        .map(|m| m.as_str().to_string())
}
