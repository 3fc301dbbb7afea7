use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::warn;

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Inclusive `[oldest, latest]` range of epoch seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub oldest: i64,
    pub latest: i64,
}

impl TimeWindow {
    /// The `hours_before` hours leading up to `now` (epoch seconds).
    ///
    /// Negative or non-finite spans collapse to an empty span ending at `now`.
    #[must_use]
    pub fn ending_at(now: i64, hours_before: f64) -> Self {
        let hours = if hours_before.is_finite() && hours_before >= 0.0 {
            hours_before
        } else {
            warn!(hours_before, "Invalid lookback window; using 0 hours");
            0.0
        };

        #[allow(clippy::cast_possible_truncation)]
        let span = (hours * SECONDS_PER_HOUR) as i64;
        let oldest = now.saturating_sub(span).max(0);

        Self {
            oldest,
            latest: now,
        }
    }

    #[must_use]
    pub fn ending_now(hours_before: f64) -> Self {
        Self::ending_at(Utc::now().timestamp(), hours_before)
    }
}
