//! Historical period matching
//!
//! A historical sample is comparable to a spot when its weekday and its hour
//! are both close to the spot's. Distances are plain numeric differences
//! (weekday 0 = Sunday) unless wraparound is switched on, so by default
//! Saturday/Sunday and 23h/0h are never neighbours.

use chrono::{Datelike, NaiveDateTime, Timelike};

use crate::config::MatchingConfig;

/// Predicate selecting historical samples comparable to an anchor time
#[derive(Debug, Clone)]
pub struct SimilarityMatcher {
    weekday: u32,
    hour: u32,
    config: MatchingConfig,
}

impl SimilarityMatcher {
    pub fn new(anchor: NaiveDateTime, config: &MatchingConfig) -> Self {
        Self {
            weekday: anchor.weekday().num_days_from_sunday(),
            hour: anchor.hour(),
            config: config.clone(),
        }
    }

    /// True when `timestamp` falls in a comparable weekday and hour
    pub fn matches(&self, timestamp: &NaiveDateTime) -> bool {
        let weekday = timestamp.weekday().num_days_from_sunday();
        let hour = timestamp.hour();

        distance(self.weekday, weekday, 7, self.config.wrap_weekdays)
            <= self.config.weekday_tolerance
            && distance(self.hour, hour, 24, self.config.wrap_hours) <= self.config.hour_tolerance
    }
}

fn distance(a: u32, b: u32, modulus: u32, wrap: bool) -> u32 {
    let d = a.abs_diff(b);
    if wrap {
        d.min(modulus - d)
    } else {
        d
    }
}
