//! Progress and item delivery to an external collaborator API
//!
//! Both calls are best-effort: a failure is logged and swallowed so the
//! scrape always completes with its local results.

mod client;
mod progress;

pub use client::Reporter;
pub use progress::{Phase, ScrapeProgress};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("collaborator answered {status}: {body}")]
    Rejected { status: u16, body: String },
}
