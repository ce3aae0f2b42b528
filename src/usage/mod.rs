//! Contains the contract for reading usage statistics from the platform.
//! [UsageSource] is the main artifact of this module. [json_source::JsonUsageSource] reads the
//! statistics from an export of the platform's usage-stats service.

pub mod json_source;

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

/// How far back usage is looked up when building the app list.
pub const LOOKBACK_DAYS: i64 = 6 * 30;

/// One app's aggregated usage for a query window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageRecord {
    /// Package identifier. For example `com.android.chrome`
    pub package_name: Arc<str>,
    pub last_time_used: DateTime<Utc>,
    pub last_time_visible: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Window ending at `end` and reaching `LOOKBACK_DAYS` into the past.
    pub fn lookback_from(end: DateTime<Utc>) -> Self {
        Self {
            start: end - Duration::days(LOOKBACK_DAYS),
            end,
        }
    }

    /// Returns true if interval `[from, to]` shares at least one moment with the window.
    pub fn overlaps(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> bool {
        from <= self.end && to >= self.start
    }
}

#[derive(Debug, Error)]
pub enum SourceError {
    /// The platform refused access to usage statistics. Usually means the permission wasn't
    /// granted yet.
    #[error("usage statistics are unavailable: {0}")]
    Unavailable(String),
    #[error("usage statistics are malformed: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("failed to read usage statistics: {0}")]
    Io(#[from] std::io::Error),
}

/// Intended to serve as a contract every usage-statistics provider must implement.
#[cfg_attr(test, mockall::automock)]
pub trait UsageSource: Send + Sync {
    /// Returns records of all packages whose usage overlaps `window`.
    fn query(&self, window: TimeWindow) -> Result<Vec<UsageRecord>, SourceError>;
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::{TimeWindow, LOOKBACK_DAYS};

    #[test]
    fn lookback_reaches_180_days() {
        let now = Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap();
        let window = TimeWindow::lookback_from(now);
        assert_eq!(LOOKBACK_DAYS, 180);
        assert_eq!(window.end - window.start, Duration::days(180));
        assert_eq!(window.end, now);
    }

    #[test]
    fn overlap_is_inclusive() {
        let now = Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap();
        let window = TimeWindow::lookback_from(now);

        assert!(window.overlaps(window.start - Duration::days(1), window.start));
        assert!(window.overlaps(now, now + Duration::days(1)));
        assert!(!window.overlaps(now + Duration::seconds(1), now + Duration::days(1)));
        assert!(!window.overlaps(
            window.start - Duration::days(2),
            window.start - Duration::days(1)
        ));
    }
}
