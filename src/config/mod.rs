//! Configuration module for the harvester
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files, layered with the `SCRAPER_*` environment knobs.
//!
//! # Example
//!
//! ```no_run
//! use storefront_harvester::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvester.toml")).unwrap();
//! println!("Backoff base: {}s", config.fetch.backoff_base_secs);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, DiscoveryConfig, FetchConfig, PacingConfig, RenderConfig, ReporterConfig,
    MAX_BACKOFF_BASE_SECS,
};

// Re-export parser functions
pub use parser::{
    apply_env_overrides, compute_config_hash, load_config, load_config_from_env,
    load_config_with_hash, parse_proxy_list, ENV_BACKOFF, ENV_PROXIES, ENV_TOTAL_ATTEMPTS,
};
pub use validation::validate;
