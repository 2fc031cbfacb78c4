//! Fixed analysis windows measured from a spot's air time
//!
//! Every window starts at the air time: `[air_time, air_time + duration)`.
//! Windows overlap by construction, they are not consecutive slices.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::WindowDurations;

/// Named window relative to a spot's air time
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimeWindow {
    /// First 30 minutes
    Immediate,
    /// First 4 hours
    ShortTerm,
    /// First 7 days
    MediumTerm,
    /// First 30 days (configurable)
    LongTerm,
}

impl TimeWindow {
    /// All windows, in processing order
    pub const ALL: [TimeWindow; 4] = [
        TimeWindow::Immediate,
        TimeWindow::ShortTerm,
        TimeWindow::MediumTerm,
        TimeWindow::LongTerm,
    ];

    /// Wire key
    pub fn key(&self) -> &'static str {
        match self {
            Self::Immediate => "immediate",
            Self::ShortTerm => "shortTerm",
            Self::MediumTerm => "mediumTerm",
            Self::LongTerm => "longTerm",
        }
    }

    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Immediate => "Inmediato (0-30 min)",
            Self::ShortTerm => "Corto plazo (0-4 h)",
            Self::MediumTerm => "Medio plazo (1-7 días)",
            Self::LongTerm => "Largo plazo (1-4 semanas)",
        }
    }

    /// Hex color for charts
    pub fn display_color(&self) -> &'static str {
        match self {
            Self::Immediate => "#ef4444",
            Self::ShortTerm => "#f59e0b",
            Self::MediumTerm => "#3b82f6",
            Self::LongTerm => "#10b981",
        }
    }

    /// Window length under the given durations
    pub fn duration(&self, durations: &WindowDurations) -> Duration {
        match self {
            Self::Immediate => Duration::minutes(i64::from(durations.immediate_minutes)),
            Self::ShortTerm => Duration::hours(i64::from(durations.short_term_hours)),
            Self::MediumTerm => Duration::days(i64::from(durations.medium_term_days)),
            Self::LongTerm => Duration::days(i64::from(durations.long_term_days)),
        }
    }

    /// Half-open bounds `[start, end)` for a spot at `air_time`
    ///
    /// Returns `None` when the end overflows the calendar.
    pub fn bounds(
        &self,
        air_time: NaiveDateTime,
        durations: &WindowDurations,
    ) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let end = air_time.checked_add_signed(self.duration(durations))?;
        Some((air_time, end))
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_default_durations() {
        let d = WindowDurations::default();
        assert_eq!(TimeWindow::Immediate.duration(&d), Duration::minutes(30));
        assert_eq!(TimeWindow::ShortTerm.duration(&d), Duration::hours(4));
        assert_eq!(TimeWindow::MediumTerm.duration(&d), Duration::days(7));
        assert_eq!(TimeWindow::LongTerm.duration(&d), Duration::days(30));
    }

    #[test]
    fn test_windows_share_anchor() {
        let air = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(19, 0, 0)
            .unwrap();
        let d = WindowDurations::default();
        for window in TimeWindow::ALL {
            let (start, end) = window.bounds(air, &d).unwrap();
            assert_eq!(start, air, "{} must start at air time", window);
            assert!(end > start);
        }
    }

    #[test]
    fn test_window_serializes_as_key() {
        for window in TimeWindow::ALL {
            let json = serde_json::to_string(&window).unwrap();
            assert_eq!(json, format!("\"{}\"", window.key()));
        }
    }
}
