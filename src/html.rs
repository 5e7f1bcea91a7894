//! Shared HTML helpers: selector tables and text extraction

use scraper::{ElementRef, Selector};

/// Compiles a selector table, skipping entries that fail to parse
///
/// Tables are static, so a bad entry is a programming error; it is logged
/// and dropped rather than taking the whole table down.
pub fn compile_selectors(sources: &[&str]) -> Vec<Selector> {
    sources
        .iter()
        .filter_map(|source| compile_selector(source))
        .collect()
}

pub fn compile_selector(source: &str) -> Option<Selector> {
    match Selector::parse(source) {
        Ok(selector) => Some(selector),
        Err(e) => {
            tracing::warn!("Skipping invalid selector {:?}: {:?}", source, e);
            None
        }
    }
}

/// Concatenates the element's text nodes, each trimmed
///
/// # Examples
///
/// ```
/// use scraper::{Html, Selector};
/// use storefront_harvester::html::element_text;
///
/// let doc = Html::parse_fragment("<p class=\"price\"> Sale price <span> $12.00 </span></p>");
/// let p = doc.select(&Selector::parse("p").unwrap()).next().unwrap();
/// assert_eq!(element_text(&p), "Sale price$12.00");
/// ```
pub fn element_text(element: &ElementRef) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty())
        .collect()
}

/// Collapses runs of whitespace to a single space
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
