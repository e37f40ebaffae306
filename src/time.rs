use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};

/// Source of "now", swappable in tests.
pub trait Clock: Send + Sync {
    /// Unix seconds.
    fn now(&self) -> i64;

    fn today(&self) -> NaiveDate {
        DateTime::<Utc>::from_timestamp(self.now(), 0)
            .unwrap_or_default()
            .date_naive()
    }
}

struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        Utc::now().timestamp()
    }
}

pub fn system_clock() -> Arc<dyn Clock> {
    Arc::new(SystemClock)
}

#[cfg(test)]
struct FixedClock(i64);

#[cfg(test)]
impl Clock for FixedClock {
    fn now(&self) -> i64 {
        self.0
    }
}

#[cfg(test)]
pub fn fixed_clock(timestamp: i64) -> Arc<dyn Clock> {
    Arc::new(FixedClock(timestamp))
}

pub fn now_unix() -> u64 {
    Utc::now().timestamp().max(0) as u64
}

/// "just now", "5m ago", "3h ago", "2d ago", "4mo ago", "1y ago".
pub fn format_relative(timestamp: i64, now: i64) -> String {
    let delta = now.saturating_sub(timestamp).max(0);
    match delta {
        0..60 => "just now".to_string(),
        60..3_600 => format!("{}m ago", delta / 60),
        3_600..86_400 => format!("{}h ago", delta / 3_600),
        86_400..2_592_000 => format!("{}d ago", delta / 86_400),
        2_592_000..31_536_000 => format!("{}mo ago", delta / 2_592_000),
        _ => format!("{}y ago", delta / 31_536_000),
    }
}
