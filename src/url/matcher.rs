/// Path fragments that mark a sitemap `<loc>` as a product page
pub const SITEMAP_PRODUCT_PATTERNS: &[&str] = &[
    "/product/",
    "/products/",
    "/p/",
    "/item/",
    "/items/",
    "/shop/",
    "/store/",
    ".html",
    "/buy/",
    "/pd/",
    "/product-page/",
];

/// Path fragments that mark a listing-page href as a product page
pub const LISTING_PRODUCT_PATTERNS: &[&str] = &[
    "/product/",
    "/products/",
    "/p/",
    "/item/",
    "/items/",
    "/pd/",
    "/shop/",
    ".html",
    "/product-page/",
];

/// Keywords that disqualify an href during the broad anchor scan
pub const NON_PRODUCT_KEYWORDS: &[&str] = &[
    "category",
    "collection",
    "tag",
    "page",
    "cart",
    "checkout",
    "account",
];

/// Wix product pages live under this segment and are always kept
pub const WIX_PRODUCT_MARKER: &str = "product-page";

/// Returns true if `haystack` contains any of `needles`, ignoring ASCII case
///
/// Needles are expected to be lowercase already.
///
/// # Examples
///
/// ```
/// use storefront_harvester::url::contains_any;
///
/// assert!(contains_any("https://x.test/Product/1", &["/product/"]));
/// assert!(!contains_any("https://x.test/about", &["/product/", "/item/"]));
/// ```
pub fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    let lower = haystack.to_lowercase();
    needles.iter().any(|needle| lower.contains(needle))
}

/// Checks a sitemap `<loc>` against the sitemap product patterns
pub fn is_sitemap_product_url(loc: &str) -> bool {
    contains_any(loc, SITEMAP_PRODUCT_PATTERNS)
}

/// Checks a listing-page href against the listing product patterns
pub fn is_listing_product_href(href: &str) -> bool {
    contains_any(href, LISTING_PRODUCT_PATTERNS)
}

/// Broad-scan filter: product pattern, and no navigation keyword unless it
/// is a Wix product page
pub fn is_broad_scan_candidate(href: &str) -> bool {
    if !is_listing_product_href(href) {
        return false;
    }

    let lower = href.to_lowercase();
    lower.contains(WIX_PRODUCT_MARKER) || !contains_any(&lower, NON_PRODUCT_KEYWORDS)
}
