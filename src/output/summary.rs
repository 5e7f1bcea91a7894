//! Per-run statistics
//!
//! Counts are accumulated by the orchestrator while it works through the
//! discovered links and logged once the run is over.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Summary of one site scrape
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeSummary {
    /// Site URL the run started from
    pub site: String,

    pub started_at: DateTime<Utc>,

    pub finished_at: Option<DateTime<Utc>>,

    /// Candidate product URLs found by discovery
    pub discovered: usize,

    /// Simple products extracted
    pub scraped: usize,

    /// URLs that produced no record (unavailable, not simple, or failed)
    pub skipped: usize,

    /// Records accepted by the collaborator API
    pub sent: usize,

    /// Whether pages were rendered in the browser first
    pub render_mode: bool,

    /// Whether the run stopped early on cancellation
    pub cancelled: bool,
}

impl ScrapeSummary {
    pub fn start(site: impl Into<String>) -> Self {
        Self {
            site: site.into(),
            started_at: Utc::now(),
            finished_at: None,
            discovered: 0,
            scraped: 0,
            skipped: 0,
            sent: 0,
            render_mode: false,
            cancelled: false,
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Whole seconds between start and finish, if finished
    pub fn duration_seconds(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_seconds())
    }

    /// URLs handled so far, whether scraped or skipped
    pub fn processed(&self) -> usize {
        self.scraped + self.skipped
    }

    pub fn log(&self, integrated: bool) {
        tracing::info!(
            "Summary: {} simple products scraped, {} skipped ({} discovered{})",
            self.scraped,
            self.skipped,
            self.discovered,
            if self.render_mode { ", browser rendered" } else { "" }
        );

        if integrated {
            tracing::info!("Sent {} items to API", self.sent);
        }

        if self.cancelled {
            tracing::warn!(
                "Run cancelled after {} of {} product URLs",
                self.processed(),
                self.discovered
            );
        }

        if let Some(seconds) = self.duration_seconds() {
            tracing::debug!("Scrape of {} took {}s", self.site, seconds);
        }
    }
}
