use serde::{Deserialize, Serialize};

/// Scrape lifecycle phase reported to the collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Discovery,
    Scraping,
    Importing,
    Complete,
    Error,
}

/// Partial progress update; only fields that are set get transmitted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeProgress {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discovered_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sent_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<Phase>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ScrapeProgress {
    pub fn new(phase: Phase) -> Self {
        Self {
            phase: Some(phase),
            ..Self::default()
        }
    }

    pub fn discovered(mut self, count: usize) -> Self {
        self.discovered_count = Some(count);
        self
    }

    pub fn sent(mut self, count: usize) -> Self {
        self.sent_count = Some(count);
        self
    }

    pub fn created(mut self, count: usize) -> Self {
        self.created_count = Some(count);
        self
    }

    pub fn total(mut self, count: usize) -> Self {
        self.total_count = Some(count);
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// True when no field is set
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
