//! Bot-block detection and transport error classification

use super::FetchResult;

/// Phrases that show up on challenge/denial pages
pub const BLOCK_INDICATORS: &[&str] = &[
    "bot detection",
    "access denied",
    "just a moment",
    "captcha",
    "are you human",
    "verify your identity",
    "request blocked",
];

/// Status codes treated as deliberate blocking
pub const BLOCK_STATUS_CODES: &[u16] = &[403, 429, 503];

/// Error text fragments that mark a transport failure as transient
pub const RETRYABLE_VOCABULARY: &[&str] = &[
    "timed out",
    "timeout",
    "connection",
    "connect",
    "tls",
    "ssl",
    "certificate",
    "handshake",
    "proxy",
    "reset",
    "broken pipe",
    "dns",
    "eof",
];

/// Returns true if a response looks like automated-traffic denial
///
/// A response is blocked when it has an empty body, carries 403/429/503, or
/// its body contains any block indicator (case-insensitive).
pub fn looks_like_bot_block(result: &FetchResult) -> bool {
    if result.body.is_empty() {
        return true;
    }

    if BLOCK_STATUS_CODES.contains(&result.status_code) {
        return true;
    }

    let lower = result.body.to_lowercase();
    BLOCK_INDICATORS.iter().any(|phrase| lower.contains(phrase))
}

/// Returns true if the error text matches the retryable vocabulary
pub fn is_retryable_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    RETRYABLE_VOCABULARY.iter().any(|word| lower.contains(word))
}

/// Flattens an error and its sources into one line
pub fn error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = inner.source();
    }
    message
}
