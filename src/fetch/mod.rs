//! Resilient HTTP fetching
//!
//! This module handles every page request the harvester makes:
//! - Rotating browser-fingerprint headers and proxy selection
//! - Bounded retries with exponential backoff for transport failures
//! - Bot-block detection and escalation to a challenge-aware session
//!
//! Exhausting the attempt budget yields `None`, never an error; callers treat
//! that as "page unavailable".

mod block;
mod client;
mod fingerprint;
mod transport;

pub use block::{
    error_chain, is_retryable_message, looks_like_bot_block, BLOCK_INDICATORS,
    BLOCK_STATUS_CODES, RETRYABLE_VOCABULARY,
};
pub use client::{backoff_delay, default_transports, FetchClient, FetchOptions};
pub use fingerprint::{build_rotating_headers, choose_proxy, random_user_agent, USER_AGENTS};
pub use transport::{
    ChallengeTransport, FetchRequest, ReqwestTransport, Transport, TransportFactory,
};

use std::time::Duration;
use thiserror::Error;

/// Which client variant produced a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// Plain rotating-header client
    Plain,
    /// Challenge-aware escalation session
    Escalated,
}

/// A structurally successful response
///
/// Transient: owned by the call that produced it and never persisted.
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// HTTP status code
    pub status_code: u16,
    /// Response body decoded as text
    pub body: String,
    /// Final URL after redirects
    pub final_url: String,
    /// Wall time spent on the request
    pub elapsed: Duration,
    /// Client variant that produced this response
    pub transport: TransportKind,
}

impl FetchResult {
    pub fn is_ok(&self) -> bool {
        self.status_code == 200
    }
}

/// Transport-level failures
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("transport error for {url}: {message}")]
    Transport { url: String, message: String },

    #[error("invalid proxy {proxy}: {message}")]
    Proxy { proxy: String, message: String },

    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

impl FetchError {
    /// Returns true for TLS/connection/proxy/timeout-class failures
    ///
    /// reqwest timeouts and connect failures are retryable outright; anything
    /// else is matched against the retryable vocabulary over the full error
    /// chain text.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Http { source, .. } => {
                source.is_timeout()
                    || source.is_connect()
                    || is_retryable_message(&error_chain(source))
            }
            FetchError::Transport { message, .. } => is_retryable_message(message),
            FetchError::Proxy { .. } => true,
            FetchError::Client(_) => false,
        }
    }
}
