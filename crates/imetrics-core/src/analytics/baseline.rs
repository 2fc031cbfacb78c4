//! Baseline builder
//!
//! Builds the traffic level expected without the spot from historically
//! comparable periods (same weekday ± 1, same hour ± 2 by default).

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::matching::SimilarityMatcher;
use super::stats::Statistics;
use crate::config::AnalysisConfig;
use crate::models::{Metric, MetricSample, TimeWindow};

/// Statistical reference for one metric in one window
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricBaseline {
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    /// 0-95, grows with sample size
    pub confidence: u8,
    pub sample_size: usize,
}

impl MetricBaseline {
    /// Baseline with no historical support
    pub fn zero() -> Self {
        Self::default()
    }

    /// Build from matched values; an empty set gives `zero()`
    pub fn from_values(values: &[f64], config: &AnalysisConfig) -> Self {
        if values.is_empty() {
            return Self::zero();
        }

        let stats = Statistics::compute(values);
        Self {
            mean: stats.mean,
            median: stats.median,
            std_dev: stats.std_dev,
            confidence: baseline_confidence(stats.count, config),
            sample_size: stats.count,
        }
    }

    /// `std_dev / mean`, `None` when the mean is not positive
    pub fn coefficient_of_variation(&self) -> Option<f64> {
        (self.mean > 0.0).then(|| self.std_dev / self.mean)
    }
}

/// `min(max, floor + slope * n)`, and 0 without samples
pub fn baseline_confidence(sample_size: usize, config: &AnalysisConfig) -> u8 {
    if sample_size == 0 {
        return 0;
    }
    let raw = usize::from(config.baseline_confidence_floor)
        .saturating_add(usize::from(config.sample_size_confidence_slope).saturating_mul(sample_size));
    let capped = raw.min(usize::from(config.confidence_max));
    u8::try_from(capped).unwrap_or(config.confidence_max)
}

/// Per-metric baselines of one window
pub type WindowBaseline = BTreeMap<Metric, MetricBaseline>;

/// Baselines for every window
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Baseline {
    pub windows: BTreeMap<TimeWindow, WindowBaseline>,
}

impl Baseline {
    /// Baseline of `metric` in `window`; metrics without one compare against zero
    pub fn get(&self, window: TimeWindow, metric: Metric) -> MetricBaseline {
        self.windows
            .get(&window)
            .and_then(|metrics| metrics.get(&metric))
            .copied()
            .unwrap_or_default()
    }

    /// Baselines of one window
    pub fn window(&self, window: TimeWindow) -> Option<&WindowBaseline> {
        self.windows.get(&window)
    }

    /// Representative baseline of a window (sessions, else first tracked metric)
    pub fn representative(&self, window: TimeWindow) -> MetricBaseline {
        let Some(metrics) = self.windows.get(&window) else {
            return MetricBaseline::zero();
        };
        metrics
            .get(&Metric::Sessions)
            .or_else(|| metrics.values().next())
            .copied()
            .unwrap_or_default()
    }
}

/// Build baselines for every window from historical samples
///
/// # Algorithm
/// - Keep samples whose weekday and hour are close to the spot's
///   (see [`SimilarityMatcher`])
/// - Per tracked metric: mean, population std-dev, median
/// - Confidence = `min(95, 60 + 2 * n)`, 0 when nothing matched
///
/// Every window receives the same matched set: matching depends only on the
/// spot's weekday and hour, not on the window length.
///
/// # Graceful Degradation
/// - Empty history or no matches: all-zero baselines, never NaN
pub fn build_baseline(
    spot_time: NaiveDateTime,
    historical: &[MetricSample],
    config: &AnalysisConfig,
) -> Baseline {
    let matcher = SimilarityMatcher::new(spot_time, &config.matching);
    let matched: Vec<&MetricSample> = historical
        .iter()
        .filter(|s| matcher.matches(&s.timestamp))
        .collect();

    if matched.is_empty() {
        tracing::debug!(
            %spot_time,
            candidates = historical.len(),
            "No comparable historical periods, baseline is zero"
        );
    } else {
        tracing::debug!(
            %spot_time,
            matched = matched.len(),
            candidates = historical.len(),
            "Matched historical periods"
        );
    }

    let metrics: &[Metric] = if config.baseline_rate_metrics {
        &Metric::ALL
    } else {
        &Metric::TRACKED
    };

    let window_baseline: WindowBaseline = metrics
        .iter()
        .map(|&metric| {
            let values: Vec<f64> = matched.iter().map(|s| s.value(metric)).collect();
            (metric, MetricBaseline::from_values(&values, config))
        })
        .collect();

    Baseline {
        windows: TimeWindow::ALL
            .iter()
            .map(|&window| (window, window_baseline.clone()))
            .collect(),
    }
}
