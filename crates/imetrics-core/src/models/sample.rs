//! Time-stamped traffic observation from the analytics backend

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::metric::Metric;

/// One observation of traffic at a point in time
///
/// Optional numeric fields default to 0. Samples are never mutated by the
/// analysis, only aggregated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSample {
    pub timestamp: NaiveDateTime,

    #[serde(default)]
    pub active_users: u64,

    #[serde(default)]
    pub sessions: u64,

    #[serde(default)]
    pub pageviews: u64,

    #[serde(default)]
    pub bounces: f64,

    /// Aggregate session duration in seconds
    #[serde(default)]
    pub session_duration: f64,

    #[serde(default)]
    pub conversions: f64,
}

impl MetricSample {
    /// Sample with every metric at zero
    pub fn new(timestamp: NaiveDateTime) -> Self {
        Self {
            timestamp,
            active_users: 0,
            sessions: 0,
            pageviews: 0,
            bounces: 0.0,
            session_duration: 0.0,
            conversions: 0.0,
        }
    }

    pub fn with_active_users(mut self, value: u64) -> Self {
        self.active_users = value;
        self
    }

    pub fn with_sessions(mut self, value: u64) -> Self {
        self.sessions = value;
        self
    }

    pub fn with_pageviews(mut self, value: u64) -> Self {
        self.pageviews = value;
        self
    }

    pub fn with_bounces(mut self, value: f64) -> Self {
        self.bounces = value;
        self
    }

    pub fn with_session_duration(mut self, value: f64) -> Self {
        self.session_duration = value;
        self
    }

    pub fn with_conversions(mut self, value: f64) -> Self {
        self.conversions = value;
        self
    }

    /// Value of `metric` for this single sample
    ///
    /// Rate metrics are derived per sample and are 0 when the sample has
    /// no sessions.
    pub fn value(&self, metric: Metric) -> f64 {
        let sessions = self.sessions as f64;
        match metric {
            Metric::ActiveUsers => self.active_users as f64,
            Metric::Sessions => sessions,
            Metric::Pageviews => self.pageviews as f64,
            Metric::BounceRate => ratio(self.bounces, sessions) * 100.0,
            Metric::AvgSessionDuration => ratio(self.session_duration, sessions),
            Metric::ConversionRate => ratio(self.conversions, sessions) * 100.0,
        }
    }
}

/// `numerator / denominator`, 0 when the denominator is 0
pub(crate) fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}
