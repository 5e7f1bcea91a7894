use crate::config::types::Config;
use crate::config::validation::validate;
use crate::url::normalize_proxy;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Environment variable overriding `fetch.total-attempts`
pub const ENV_TOTAL_ATTEMPTS: &str = "SCRAPER_TOTAL_ATTEMPTS";

/// Environment variable overriding `fetch.backoff-base-secs`
pub const ENV_BACKOFF: &str = "SCRAPER_BACKOFF";

/// Environment variable overriding `fetch.proxies` (comma-separated)
pub const ENV_PROXIES: &str = "SCRAPER_PROXIES";

/// Loads and parses a configuration file from the given path
///
/// Environment knobs are applied on top of the file before validation.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use storefront_harvester::config::load_config;
///
/// let config = load_config(Path::new("harvester.toml")).unwrap();
/// println!("Attempts per fetch: {}", config.fetch.total_attempts);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut config: Config = toml::from_str(&content)?;

    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;
    validate(&config)?;

    Ok(config)
}

/// Builds a configuration from defaults plus environment knobs only
pub fn load_config_from_env() -> Result<Config, ConfigError> {
    let mut config = Config::default();
    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;
    validate(&config)?;
    Ok(config)
}

/// Applies the environment-level tuning knobs to a configuration
///
/// `lookup` abstracts the environment so callers (and tests) can supply
/// values without touching process state. Proxy entries are trimmed, blanks
/// dropped, and entries without a scheme get `http://`.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(raw) = lookup(ENV_TOTAL_ATTEMPTS) {
        let attempts: u32 = raw.trim().parse().map_err(|_| ConfigError::InvalidEnv {
            name: ENV_TOTAL_ATTEMPTS.to_string(),
            value: raw.clone(),
        })?;
        config.fetch.total_attempts = attempts.max(1);
    }

    if let Some(raw) = lookup(ENV_BACKOFF) {
        let backoff: f64 = raw.trim().parse().map_err(|_| ConfigError::InvalidEnv {
            name: ENV_BACKOFF.to_string(),
            value: raw.clone(),
        })?;
        config.fetch.backoff_base_secs = backoff;
    }

    if let Some(raw) = lookup(ENV_PROXIES) {
        config.fetch.proxies = parse_proxy_list(&raw);
    }

    Ok(())
}

/// Splits a comma-separated proxy list into normalized entries
pub fn parse_proxy_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(normalize_proxy)
        .collect()
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at start-up so two runs can be compared.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}
