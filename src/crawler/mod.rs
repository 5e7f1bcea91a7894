//! Crawler module for per-site scrape orchestration
//!
//! This module contains the top-level scrape logic, including:
//! - Render-mode detection and renderer lease handling
//! - Link discovery followed by paced product extraction
//! - Progress reporting and item delivery
//! - Cancellation between product URLs

mod coordinator;
mod pacing;

pub use coordinator::Scraper;
pub use pacing::{human_delay, pacing_delay};

use crate::config::{load_config_from_env, Config};
use crate::extract::ProductRecord;

/// Scrapes one site with the default configuration plus environment knobs
///
/// This is the single entry point for callers that need no tuning. It
/// builds a [`Scraper`], runs it once, and tears the browser down again.
/// Invalid environment values fall back to the defaults; no records are
/// returned if the HTTP clients cannot be constructed.
///
/// # Arguments
///
/// * `url` - Site URL; a bare host is treated as `https://`
/// * `api_base_url` - Collaborator API base for progress and item delivery
/// * `agent_token` - Bearer token for the collaborator API
pub async fn scrape_site(
    url: &str,
    api_base_url: Option<&str>,
    agent_token: Option<&str>,
) -> Vec<ProductRecord> {
    let config = load_config_from_env().unwrap_or_else(|e| {
        tracing::warn!("Ignoring environment overrides: {}", e);
        Config::default()
    });

    match Scraper::new(config) {
        Ok(scraper) => scraper.scrape_site(url, api_base_url, agent_token).await,
        Err(e) => {
            tracing::error!("Failed to initialize scraper: {}", e);
            Vec::new()
        }
    }
}
