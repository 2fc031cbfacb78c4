//! Window impact analyzer
//!
//! Aggregates actual traffic in each window and compares it against the
//! window's baseline: deltas, significance, effect size and a confidence score.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::baseline::{Baseline, MetricBaseline};
use super::stats::finite_or_zero;
use crate::config::AnalysisConfig;
use crate::error::{CoreError, Result};
use crate::models::sample::ratio;
use crate::models::{Metric, MetricSample, TimeWindow};

/// Baseline sample size that earns the large confidence bonus
const LARGE_SAMPLE_SIZE: usize = 30;
const LARGE_SAMPLE_BONUS: i32 = 10;
/// Baseline sample size that earns the medium confidence bonus
const MEDIUM_SAMPLE_SIZE: usize = 15;
const MEDIUM_SAMPLE_BONUS: i32 = 5;
/// Bonus when the baseline's coefficient of variation is low
const LOW_VARIABILITY_BONUS: i32 = 5;

/// Aggregated traffic of one window
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowMetrics {
    pub active_users: u64,
    pub sessions: u64,
    pub pageviews: u64,
    pub bounces: f64,
    pub session_duration: f64,
    pub conversions: f64,
    /// `bounces / sessions * 100`
    pub bounce_rate: f64,
    /// `session_duration / sessions`
    pub avg_session_duration: f64,
    /// `conversions / sessions * 100`
    pub conversion_rate: f64,
    /// Number of samples aggregated
    pub sample_count: usize,
}

impl WindowMetrics {
    /// Sum samples and derive the rates; no samples gives all zeros
    pub fn from_samples<'a>(samples: impl IntoIterator<Item = &'a MetricSample>) -> Self {
        let mut m = Self::default();
        for sample in samples {
            m.active_users = m.active_users.saturating_add(sample.active_users);
            m.sessions = m.sessions.saturating_add(sample.sessions);
            m.pageviews = m.pageviews.saturating_add(sample.pageviews);
            m.bounces += sample.bounces;
            m.session_duration += sample.session_duration;
            m.conversions += sample.conversions;
            m.sample_count += 1;
        }

        let sessions = m.sessions as f64;
        m.bounce_rate = finite_or_zero(ratio(m.bounces, sessions) * 100.0);
        m.avg_session_duration = finite_or_zero(ratio(m.session_duration, sessions));
        m.conversion_rate = finite_or_zero(ratio(m.conversions, sessions) * 100.0);
        m
    }

    /// Aggregate value of `metric`
    pub fn value(&self, metric: Metric) -> f64 {
        match metric {
            Metric::ActiveUsers => self.active_users as f64,
            Metric::Sessions => self.sessions as f64,
            Metric::Pageviews => self.pageviews as f64,
            Metric::BounceRate => self.bounce_rate,
            Metric::AvgSessionDuration => self.avg_session_duration,
            Metric::ConversionRate => self.conversion_rate,
        }
    }
}

/// One metric of one window against its baseline
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowComparison {
    pub window_value: f64,
    pub baseline_value: f64,
    pub absolute_change: f64,
    /// 0 when the baseline value is 0
    pub percentage_change: f64,
    /// `|percentage_change| > threshold` (strict)
    pub is_significant: bool,
    /// Cohen's d: `(window - baseline) / std_dev`, 0 when `std_dev == 0`
    pub effect_size: f64,
}

impl WindowComparison {
    /// Compare an observed window value with a metric baseline
    pub fn compute(window_value: f64, baseline: &MetricBaseline, threshold_pct: f64) -> Self {
        let window_value = finite_or_zero(window_value);
        let baseline_value = finite_or_zero(baseline.mean);
        let absolute_change = window_value - baseline_value;

        let percentage_change = if baseline_value > 0.0 {
            finite_or_zero(absolute_change * 100.0 / baseline_value)
        } else {
            0.0
        };

        let effect_size = if baseline.std_dev > 0.0 {
            finite_or_zero(absolute_change / baseline.std_dev)
        } else {
            0.0
        };

        Self {
            window_value,
            baseline_value,
            absolute_change,
            percentage_change,
            is_significant: percentage_change.abs() > threshold_pct,
            effect_size,
        }
    }
}

/// Significance summary of a window
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Significance {
    /// Fraction of compared metrics that are significant
    pub overall: f64,
    pub significant_metrics: usize,
    pub total_metrics: usize,
    /// Effect sizes in metric order
    pub effect_sizes: Vec<f64>,
}

impl Significance {
    pub fn summarize(comparison: &BTreeMap<Metric, WindowComparison>) -> Self {
        let total_metrics = comparison.len();
        let significant_metrics = comparison.values().filter(|c| c.is_significant).count();
        let overall = if total_metrics > 0 {
            significant_metrics as f64 / total_metrics as f64
        } else {
            0.0
        };

        Self {
            overall,
            significant_metrics,
            total_metrics,
            effect_sizes: comparison.values().map(|c| c.effect_size).collect(),
        }
    }
}

/// Result of one window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowImpact {
    pub window: TimeWindow,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub metrics: WindowMetrics,
    pub comparison: BTreeMap<Metric, WindowComparison>,
    pub significance: Significance,
    /// 50-95
    pub confidence: u8,
}

impl WindowImpact {
    /// Comparison of `metric`, if it was compared
    pub fn comparison(&self, metric: Metric) -> Option<&WindowComparison> {
        self.comparison.get(&metric)
    }

    /// Significant metrics, in metric order
    pub fn significant_metrics(&self) -> Vec<Metric> {
        self.comparison
            .iter()
            .filter(|(_, c)| c.is_significant)
            .map(|(&m, _)| m)
            .collect()
    }
}

/// Impact of one spot, keyed by window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemporalImpactResult {
    pub spot_time: NaiveDateTime,
    pub windows: BTreeMap<TimeWindow, WindowImpact>,
}

impl TemporalImpactResult {
    pub fn window(&self, window: TimeWindow) -> Option<&WindowImpact> {
        self.windows.get(&window)
    }
}

/// Window confidence from its baseline
///
/// Starts from the representative (sessions) baseline confidence, adds +10
/// for n ≥ 30 or +5 for n ≥ 15, +5 more when `std_dev / mean` is below the
/// low-variability threshold, then clamps to `[50, 95]`.
pub fn window_confidence(baseline: &MetricBaseline, config: &AnalysisConfig) -> u8 {
    let mut confidence = i32::from(baseline.confidence);

    if baseline.sample_size >= LARGE_SAMPLE_SIZE {
        confidence += LARGE_SAMPLE_BONUS;
    } else if baseline.sample_size >= MEDIUM_SAMPLE_SIZE {
        confidence += MEDIUM_SAMPLE_BONUS;
    }

    if baseline
        .coefficient_of_variation()
        .is_some_and(|cv| cv < config.low_variability_cv)
    {
        confidence += LOW_VARIABILITY_BONUS;
    }

    let clamped = confidence.clamp(
        i32::from(config.window_confidence_min),
        i32::from(config.confidence_max),
    );
    u8::try_from(clamped).unwrap_or(config.confidence_max)
}

/// Analyze every window of a spot against its baseline
///
/// `actual` may contain samples outside the windows and need not be sorted;
/// each window only aggregates samples in `[spot_time, spot_time + duration)`.
///
/// # Errors
/// `InvalidInput` when a window end overflows the calendar. Empty or
/// missing data is never an error: it yields zero aggregates.
pub fn analyze_impact(
    spot_time: NaiveDateTime,
    actual: &[MetricSample],
    baseline: &Baseline,
    config: &AnalysisConfig,
) -> Result<TemporalImpactResult> {
    let mut windows = BTreeMap::new();

    for window in TimeWindow::ALL {
        let (start, end) = window.bounds(spot_time, &config.windows).ok_or_else(|| {
            CoreError::invalid_input(format!(
                "spot time {} is too close to the calendar limit for the {} window",
                spot_time, window
            ))
        })?;

        let metrics = WindowMetrics::from_samples(
            actual
                .iter()
                .filter(|s| s.timestamp >= start && s.timestamp < end),
        );

        let comparison: BTreeMap<Metric, WindowComparison> = Metric::ALL
            .iter()
            .map(|&metric| {
                let reference = baseline.get(window, metric);
                (
                    metric,
                    WindowComparison::compute(
                        metrics.value(metric),
                        &reference,
                        config.significance_threshold_pct,
                    ),
                )
            })
            .collect();

        let significance = Significance::summarize(&comparison);
        let confidence = window_confidence(&baseline.representative(window), config);

        tracing::debug!(
            window = window.key(),
            samples = metrics.sample_count,
            significant = significance.significant_metrics,
            confidence,
            "Window analyzed"
        );

        windows.insert(
            window,
            WindowImpact {
                window,
                start,
                end,
                metrics,
                comparison,
                significance,
                confidence,
            },
        );
    }

    Ok(TemporalImpactResult { spot_time, windows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn air() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(19, 0, 0)
            .unwrap()
    }

    fn baseline_with(mean: f64, std_dev: f64, sample_size: usize, confidence: u8) -> MetricBaseline {
        MetricBaseline {
            mean,
            median: mean,
            std_dev,
            confidence,
            sample_size,
        }
    }

    #[test]
    fn test_aggregate_sums_and_rates() {
        let samples = vec![
            MetricSample::new(air())
                .with_active_users(10)
                .with_sessions(20)
                .with_pageviews(40)
                .with_bounces(5.0)
                .with_session_duration(1200.0)
                .with_conversions(1.0),
            MetricSample::new(air() + Duration::minutes(10))
                .with_active_users(30)
                .with_sessions(20)
                .with_pageviews(60)
                .with_bounces(5.0)
                .with_session_duration(2800.0)
                .with_conversions(3.0),
        ];

        let m = WindowMetrics::from_samples(&samples);
        assert_eq!(m.active_users, 40);
        assert_eq!(m.sessions, 40);
        assert_eq!(m.pageviews, 100);
        assert_eq!(m.bounce_rate, 25.0);
        assert_eq!(m.avg_session_duration, 100.0);
        assert_eq!(m.conversion_rate, 10.0);
        assert_eq!(m.sample_count, 2);
    }

    #[test]
    fn test_aggregate_empty_is_zero() {
        let m = WindowMetrics::from_samples(std::iter::empty());
        assert_eq!(m, WindowMetrics::default());
    }

    #[test]
    fn test_comparison_threshold_is_strict() {
        let base = baseline_with(100.0, 10.0, 20, 95);
        assert!(!WindowComparison::compute(110.0, &base, 10.0).is_significant);
        assert!(!WindowComparison::compute(90.0, &base, 10.0).is_significant);
        assert!(WindowComparison::compute(110.5, &base, 10.0).is_significant);
        assert!(WindowComparison::compute(89.0, &base, 10.0).is_significant);
    }

    #[test]
    fn test_comparison_zero_baseline_guards() {
        let c = WindowComparison::compute(42.0, &MetricBaseline::zero(), 10.0);
        assert_eq!(c.absolute_change, 42.0);
        assert_eq!(c.percentage_change, 0.0);
        assert_eq!(c.effect_size, 0.0);
        assert!(!c.is_significant);
    }

    #[test]
    fn test_comparison_effect_size() {
        let c = WindowComparison::compute(150.0, &baseline_with(100.0, 10.0, 20, 95), 10.0);
        assert_eq!(c.absolute_change, 50.0);
        assert_eq!(c.percentage_change, 50.0);
        assert_eq!(c.effect_size, 5.0);
    }

    #[test]
    fn test_window_confidence_brackets() {
        let config = AnalysisConfig::default();

        // No samples: clamps up to the floor
        assert_eq!(window_confidence(&MetricBaseline::zero(), &config), 50);

        // n = 10, noisy: 80, no bonus
        assert_eq!(window_confidence(&baseline_with(100.0, 50.0, 10, 80), &config), 80);

        // n = 15: +5 bracket, stable: +5
        assert_eq!(window_confidence(&baseline_with(100.0, 10.0, 15, 90), &config), 95);

        // n = 12, stable: 84 + 5
        assert_eq!(window_confidence(&baseline_with(100.0, 10.0, 12, 84), &config), 89);

        // n = 30 bracket wins over n = 15, then the cap applies
        assert_eq!(window_confidence(&baseline_with(100.0, 50.0, 30, 95), &config), 95);
    }

    #[test]
    fn test_samples_outside_windows_ignored() {
        let config = AnalysisConfig::default();
        let actual = vec![
            MetricSample::new(air() - Duration::minutes(1)).with_sessions(1000),
            MetricSample::new(air()).with_sessions(10),
            MetricSample::new(air() + Duration::minutes(30)).with_sessions(20),
            MetricSample::new(air() + Duration::days(30)).with_sessions(5000),
        ];

        let result = analyze_impact(air(), &actual, &Baseline::default(), &config).unwrap();
        let sessions = |w| result.window(w).unwrap().metrics.sessions;
        assert_eq!(sessions(TimeWindow::Immediate), 10);
        assert_eq!(sessions(TimeWindow::ShortTerm), 30);
        assert_eq!(sessions(TimeWindow::MediumTerm), 30);
        assert_eq!(sessions(TimeWindow::LongTerm), 30);
    }

    #[test]
    fn test_every_window_compares_six_metrics() {
        let config = AnalysisConfig::default();
        let result = analyze_impact(air(), &[], &Baseline::default(), &config).unwrap();
        assert_eq!(result.windows.len(), 4);
        for impact in result.windows.values() {
            assert_eq!(impact.comparison.len(), 6);
            assert_eq!(impact.significance.total_metrics, 6);
            assert_eq!(impact.significance.overall, 0.0);
            assert_eq!(impact.confidence, 50);
        }
    }

    #[test]
    fn test_calendar_overflow_is_invalid_input() {
        let config = AnalysisConfig::default();
        let err = analyze_impact(NaiveDateTime::MAX, &[], &Baseline::default(), &config).unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput { .. }));
    }
}
