//! Human-like pacing between product page requests

use crate::config::PacingConfig;
use rand::Rng;
use std::time::Duration;

/// Picks a delay uniformly in `[min_ms, max_ms]`
///
/// A range with `max_ms` below `min_ms` collapses to `min_ms`.
pub fn pacing_delay(config: &PacingConfig) -> Duration {
    let min = config.min_ms;
    let max = config.max_ms.max(min);

    if max == 0 {
        return Duration::ZERO;
    }

    Duration::from_millis(rand::rng().random_range(min..=max))
}

/// Sleeps for one randomized pacing delay
pub async fn human_delay(config: &PacingConfig) {
    let delay = pacing_delay(config);
    if delay.is_zero() {
        return;
    }

    tracing::debug!("Pacing for {:?}", delay);
    tokio::time::sleep(delay).await;
}
