use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A requested rental interval. Only windows with `drop_off > pickup` are
/// usable for pricing; callers validate with [`TimeWindow::is_valid`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub pickup: NaiveDateTime,
    pub drop_off: NaiveDateTime,
}

impl TimeWindow {
    pub fn new(pickup: NaiveDateTime, drop_off: NaiveDateTime) -> Self {
        Self { pickup, drop_off }
    }

    pub fn is_valid(&self) -> bool {
        self.drop_off > self.pickup
    }

    /// Billable hours, rounded up. A 61-minute window is 2 hours.
    pub fn diff_hours(&self) -> i64 {
        let secs = (self.drop_off - self.pickup).num_seconds();
        (secs + 3599) / 3600
    }

    /// Whole days spanned. Partial days do not count, so a 3-hour window is
    /// 0 days and stays in the hourly tier.
    pub fn diff_days(&self) -> i64 {
        (self.drop_off - self.pickup).num_seconds() / 86_400
    }
}
