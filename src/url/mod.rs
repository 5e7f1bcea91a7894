//! URL handling module
//!
//! This module provides link resolution, same-origin checks, and the
//! product-URL pattern tables shared by the discovery tiers.

mod domain;
mod matcher;
mod normalize;

pub use domain::{extract_domain, is_www_alias, origin_string, same_origin};
pub use matcher::{
    contains_any, is_broad_scan_candidate, is_listing_product_href, is_sitemap_product_url,
    LISTING_PRODUCT_PATTERNS, NON_PRODUCT_KEYWORDS, SITEMAP_PRODUCT_PATTERNS,
    WIX_PRODUCT_MARKER,
};
pub use normalize::{normalize_proxy, parse_site_url, resolve_asset, resolve_link};
