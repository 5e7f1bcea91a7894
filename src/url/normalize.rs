use crate::UrlError;
use url::Url;

/// Parses the caller-supplied site URL
///
/// A bare host such as `shop.example.com` is treated as `https://shop.example.com`.
/// Only HTTP and HTTPS URLs with a host are accepted.
///
/// # Examples
///
/// ```
/// use storefront_harvester::url::parse_site_url;
///
/// let url = parse_site_url("shop.example.com/store").unwrap();
/// assert_eq!(url.as_str(), "https://shop.example.com/store");
/// ```
pub fn parse_site_url(raw: &str) -> Result<Url, UrlError> {
    let trimmed = raw.trim();
    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let url = Url::parse(&candidate).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingDomain);
    }

    Ok(url)
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - fragment-only anchors
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
pub fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) => {
            if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
                Some(absolute_url)
            } else {
                None
            }
        }
        Err(_) => None,
    }
}

/// Resolves an asset reference (image src, meta content) against a page URL
///
/// Values already starting with `http` are returned untouched; anything else
/// is joined onto the page URL. Unresolvable values come back as-is.
pub fn resolve_asset(src: &str, page_url: &Url) -> String {
    let src = src.trim();
    if src.is_empty() || src.starts_with("http") {
        return src.to_string();
    }

    page_url
        .join(src)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| src.to_string())
}

/// Ensures a proxy entry carries a scheme (`http://` when absent)
pub fn normalize_proxy(raw: &str) -> String {
    let proxy = raw.trim();
    if proxy.contains("://") {
        proxy.to_string()
    } else {
        format!("http://{}", proxy)
    }
}
