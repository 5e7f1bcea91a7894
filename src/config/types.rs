use serde::Deserialize;
use std::time::Duration;

/// Largest accepted backoff base (seconds)
pub const MAX_BACKOFF_BASE_SECS: f64 = 60.0;

/// Main configuration structure for the harvester
///
/// Every section has defaults, so an empty TOML document is a valid config.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub fetch: FetchConfig,
    pub render: RenderConfig,
    pub pacing: PacingConfig,
    pub discovery: DiscoveryConfig,
    pub reporter: ReporterConfig,
}

/// HTTP fetching behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Total attempts per fetch (overridden by `SCRAPER_TOTAL_ATTEMPTS`)
    #[serde(rename = "total-attempts")]
    pub total_attempts: u32,

    /// Exponential backoff base in seconds (overridden by `SCRAPER_BACKOFF`)
    #[serde(rename = "backoff-base-secs")]
    pub backoff_base_secs: f64,

    /// Proxy endpoints, picked uniformly per request (overridden by `SCRAPER_PROXIES`)
    pub proxies: Vec<String>,

    /// Timeout for generic page fetches (seconds)
    #[serde(rename = "page-timeout-secs")]
    pub page_timeout_secs: u64,

    /// Timeout for category-path probes (seconds)
    #[serde(rename = "probe-timeout-secs")]
    pub probe_timeout_secs: u64,

    /// Timeout for sitemap documents (seconds)
    #[serde(rename = "sitemap-timeout-secs")]
    pub sitemap_timeout_secs: u64,

    /// Timeout for product pages (seconds)
    #[serde(rename = "product-timeout-secs")]
    pub product_timeout_secs: u64,

    /// Timeout for the single-shot site check before discovery (seconds)
    #[serde(rename = "site-check-timeout-secs")]
    pub site_check_timeout_secs: u64,

    /// How long the escalation session waits before replaying a challenged request
    #[serde(rename = "challenge-wait-ms")]
    pub challenge_wait_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            total_attempts: 3,
            backoff_base_secs: 0.7,
            proxies: Vec::new(),
            page_timeout_secs: 15,
            probe_timeout_secs: 12,
            sitemap_timeout_secs: 15,
            product_timeout_secs: 20,
            site_check_timeout_secs: 10,
            challenge_wait_ms: 5000,
        }
    }
}

impl FetchConfig {
    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn sitemap_timeout(&self) -> Duration {
        Duration::from_secs(self.sitemap_timeout_secs)
    }

    pub fn product_timeout(&self) -> Duration {
        Duration::from_secs(self.product_timeout_secs)
    }

    pub fn site_check_timeout(&self) -> Duration {
        Duration::from_secs(self.site_check_timeout_secs)
    }

    /// Backoff base clamped to `[0, MAX_BACKOFF_BASE_SECS]`; NaN maps to zero
    pub fn backoff_base(&self) -> Duration {
        let secs = self.backoff_base_secs.clamp(0.0, MAX_BACKOFF_BASE_SECS);
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::ZERO)
    }
}

/// Headless browser rendering
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Allow falling back to a headless browser for script-rendered sites
    pub enabled: bool,

    /// Navigation timeout per rendered page (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Fixed wait after DOM readiness before reading content (milliseconds)
    #[serde(rename = "settle-ms")]
    pub settle_ms: u64,

    #[serde(rename = "window-width")]
    pub window_width: u32,

    #[serde(rename = "window-height")]
    pub window_height: u32,

    /// Explicit Chrome/Chromium binary; auto-detected when absent
    #[serde(rename = "chrome-executable")]
    pub chrome_executable: Option<String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_secs: 30,
            settle_ms: 1000,
            window_width: 1280,
            window_height: 720,
            chrome_executable: None,
        }
    }
}

impl RenderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

/// Delay between product page requests
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    #[serde(rename = "min-ms")]
    pub min_ms: u64,

    #[serde(rename = "max-ms")]
    pub max_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            min_ms: 1200,
            max_ms: 2700,
        }
    }
}

/// Link discovery limits
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Upper bound on sitemap documents fetched by one discovery call
    #[serde(rename = "max-sitemaps")]
    pub max_sitemaps: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self { max_sitemaps: 50 }
    }
}

/// Collaborator API calls
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReporterConfig {
    #[serde(rename = "progress-timeout-secs")]
    pub progress_timeout_secs: u64,

    #[serde(rename = "item-timeout-secs")]
    pub item_timeout_secs: u64,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            progress_timeout_secs: 10,
            item_timeout_secs: 15,
        }
    }
}
