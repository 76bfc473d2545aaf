//! Daily maintenance window handling.
//!
//! The external platform goes down every day at a fixed UTC time; checks
//! inside the window are suppressed and status is reported honestly as
//! maintenance instead of guessed from a dead page.

use chrono::{DateTime, Duration, NaiveTime, Utc};

use crate::error::{AppError, Result};
use crate::models::MaintenanceConfig;

/// A daily UTC time window, possibly wrapping past midnight.
#[derive(Debug, Clone, Copy)]
pub struct MaintenanceWindow {
    start: NaiveTime,
    end: NaiveTime,
    wraps: bool,
}

impl MaintenanceWindow {
    pub fn from_config(config: &MaintenanceConfig) -> Result<Self> {
        let start = config.parse_start().ok_or_else(|| {
            AppError::config(format!(
                "maintenance.start_utc '{}' is not HH:MM",
                config.start_utc
            ))
        })?;
        let duration = Duration::hours(i64::from(config.duration_hours));
        // NaiveTime addition wraps at midnight, which is exactly the
        // window semantics needed here.
        let end = start.overflowing_add_signed(duration).0;
        Ok(Self {
            start,
            end,
            wraps: end < start,
        })
    }

    /// Whether the given instant falls inside the window.
    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        let time = now.time();
        if self.wraps {
            time >= self.start || time <= self.end
        } else {
            time >= self.start && time <= self.end
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn window(start: &str, hours: u32) -> MaintenanceWindow {
        MaintenanceWindow::from_config(&MaintenanceConfig {
            start_utc: start.to_string(),
            duration_hours: hours,
        })
        .unwrap()
    }

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 10, 26, hour, minute, 0).unwrap()
    }

    #[test]
    fn window_wrapping_midnight() {
        // 22:00 + 3h -> 01:00 next day
        let w = window("22:00", 3);
        assert!(w.contains(at(23, 30)));
        assert!(w.contains(at(0, 30)));
        assert!(w.contains(at(22, 0)));
        assert!(!w.contains(at(6, 0)));
        assert!(!w.contains(at(21, 59)));
    }

    #[test]
    fn window_within_one_day() {
        let w = window("08:00", 2);
        assert!(w.contains(at(9, 0)));
        assert!(!w.contains(at(11, 0)));
        assert!(!w.contains(at(7, 59)));
    }

    #[test]
    fn malformed_start_is_config_error() {
        let result = MaintenanceWindow::from_config(&MaintenanceConfig {
            start_utc: "25:99".to_string(),
            duration_hours: 1,
        });
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
