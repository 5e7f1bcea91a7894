/// Hosts that always serve script-rendered storefronts
pub const JS_PLATFORM_HOSTS: &[&str] = &["wix.com", "squarespace.com", "webflow.io"];

/// Markup fragments left behind by client-side frameworks
pub const FRAMEWORK_FINGERPRINTS: &[&str] = &[
    "wix.com",
    "wixstatic.com",
    "parastorage.com",
    "__next_data__",
    "_next/",
    "ng-app",
    "ng-controller",
    "__nuxt__",
    "data-reactroot",
    "__react_devtools",
    "data-v-",
    "data-vue",
];

const SCRIPT_COUNT_THRESHOLD: usize = 20;
const SCRIPT_OVERHEAD_BYTES: i64 = 500;
const VISIBLE_TEXT_THRESHOLD: i64 = 5000;

/// Decides whether a page needs a real browser to show its content
///
/// Any one signal is enough: a known JS-platform host in the URL, a framework
/// fingerprint in the body, or a script-heavy page with little else in it.
///
/// # Examples
///
/// ```
/// use storefront_harvester::render::needs_browser_rendering;
///
/// assert!(needs_browser_rendering("<div id=\"__NEXT_DATA__\"></div>", "https://shop.test/"));
/// assert!(!needs_browser_rendering("<h1>Mug</h1>", "https://shop.test/"));
/// ```
pub fn needs_browser_rendering(body: &str, url: &str) -> bool {
    let url_lower = url.to_lowercase();
    if JS_PLATFORM_HOSTS.iter().any(|host| url_lower.contains(host)) {
        return true;
    }

    let body_lower = body.to_lowercase();
    if FRAMEWORK_FINGERPRINTS
        .iter()
        .any(|fingerprint| body_lower.contains(fingerprint))
    {
        return true;
    }

    let script_count = body_lower.matches("<script").count();
    let visible_estimate = body.len() as i64 - script_count as i64 * SCRIPT_OVERHEAD_BYTES;

    script_count > SCRIPT_COUNT_THRESHOLD && visible_estimate < VISIBLE_TEXT_THRESHOLD
}
