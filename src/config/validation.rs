use crate::config::types::{
    Config, DiscoveryConfig, FetchConfig, PacingConfig, RenderConfig, MAX_BACKOFF_BASE_SECS,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_fetch_config(&config.fetch)?;
    validate_render_config(&config.render)?;
    validate_pacing_config(&config.pacing)?;
    validate_discovery_config(&config.discovery)?;
    Ok(())
}

/// Validates fetch configuration
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.total_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "total_attempts must be >= 1, got {}",
            config.total_attempts
        )));
    }

    let backoff = config.backoff_base_secs;
    if !(0.0..=MAX_BACKOFF_BASE_SECS).contains(&backoff)
        || std::time::Duration::try_from_secs_f64(backoff).is_err()
    {
        return Err(ConfigError::Validation(format!(
            "backoff_base_secs must be between 0 and {}, got {}",
            MAX_BACKOFF_BASE_SECS, backoff
        )));
    }

    for (name, value) in [
        ("page_timeout_secs", config.page_timeout_secs),
        ("probe_timeout_secs", config.probe_timeout_secs),
        ("sitemap_timeout_secs", config.sitemap_timeout_secs),
        ("product_timeout_secs", config.product_timeout_secs),
        ("site_check_timeout_secs", config.site_check_timeout_secs),
    ] {
        if value == 0 {
            return Err(ConfigError::Validation(format!("{} must be > 0", name)));
        }
    }

    for proxy in &config.proxies {
        validate_proxy(proxy)?;
    }

    Ok(())
}

/// Validates a proxy endpoint (must already carry a scheme)
fn validate_proxy(proxy: &str) -> Result<(), ConfigError> {
    let url = Url::parse(proxy)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid proxy '{}': {}", proxy, e)))?;

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "Proxy '{}' has no host",
            proxy
        )));
    }

    Ok(())
}

/// Validates render configuration
fn validate_render_config(config: &RenderConfig) -> Result<(), ConfigError> {
    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "render timeout_secs must be > 0".to_string(),
        ));
    }

    if config.window_width == 0 || config.window_height == 0 {
        return Err(ConfigError::Validation(format!(
            "render window must be non-empty, got {}x{}",
            config.window_width, config.window_height
        )));
    }

    Ok(())
}

/// Validates pacing configuration
fn validate_pacing_config(config: &PacingConfig) -> Result<(), ConfigError> {
    if config.min_ms > config.max_ms {
        return Err(ConfigError::Validation(format!(
            "pacing min_ms ({}) must be <= max_ms ({})",
            config.min_ms, config.max_ms
        )));
    }

    Ok(())
}

fn validate_discovery_config(config: &DiscoveryConfig) -> Result<(), ConfigError> {
    if config.max_sitemaps == 0 {
        return Err(ConfigError::Validation(
            "max_sitemaps must be >= 1".to_string(),
        ));
    }

    Ok(())
}
