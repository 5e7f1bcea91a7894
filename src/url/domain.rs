use url::Url;

/// Extracts the lowercase host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use storefront_harvester::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns true if both URLs share scheme, host and port
///
/// # Examples
///
/// ```
/// use url::Url;
/// use storefront_harvester::url::same_origin;
///
/// let listing = Url::parse("https://shop.example.com/shop/").unwrap();
/// let product = Url::parse("https://shop.example.com/product/mug").unwrap();
/// let external = Url::parse("https://cdn.example.com/product/mug").unwrap();
/// assert!(same_origin(&listing, &product));
/// assert!(!same_origin(&listing, &external));
/// ```
pub fn same_origin(a: &Url, b: &Url) -> bool {
    a.origin() == b.origin()
}

/// Returns true if the hosts match once a leading `www.` is ignored
///
/// Scheme and port may differ, which covers the usual `http://shop` to
/// `https://www.shop` redirect.
pub fn is_www_alias(a: &Url, b: &Url) -> bool {
    match (extract_domain(a), extract_domain(b)) {
        (Some(a), Some(b)) => a.trim_start_matches("www.") == b.trim_start_matches("www."),
        _ => false,
    }
}

/// Returns the scheme/host/port prefix of a URL, e.g. `https://example.com:8443`
pub fn origin_string(url: &Url) -> String {
    url.origin().ascii_serialization()
}
