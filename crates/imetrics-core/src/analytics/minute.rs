//! Minute-by-minute comparison around a spot's air time
//!
//! Compares the per-minute level of one metric in the minutes after the spot
//! with the minutes right before it. Used for "direct correlation" of short
//! spots with immediate traffic bumps.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::impact::WindowMetrics;
use super::stats::finite_or_zero;
use crate::config::AnalysisConfig;
use crate::models::{Metric, MetricSample, Spot};

/// Value of the metric in one minute
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MinutePoint {
    /// Minutes from air time (negative = before)
    pub offset_minutes: i64,
    pub value: f64,
}

/// Minute-level uplift of one metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MinuteByMinuteAnalysis {
    pub metric: Metric,
    pub minutes_before: u32,
    pub minutes_after: u32,
    /// Minutes with data, ascending by offset
    pub points: Vec<MinutePoint>,
    /// Mean over observed pre-spot minutes
    pub pre_average: f64,
    /// Mean over observed post-spot minutes
    pub post_average: f64,
    /// 0 when there is no pre-spot traffic
    pub uplift_pct: f64,
    pub peak: Option<MinutePoint>,
    pub direct_correlation: bool,
}

/// Analyze one metric minute by minute around a spot
///
/// Range: `[-minutes_before, minutes_after + ceil(duration / 60))` minutes
/// from air time. Samples falling in the same minute are aggregated
/// together (rates are derived from the summed components).
pub fn analyze_minute_by_minute(
    spot: &Spot,
    samples: &[MetricSample],
    metric: Metric,
    config: &AnalysisConfig,
) -> MinuteByMinuteAnalysis {
    let minutes_before = config.minute.minutes_before;
    let minutes_after = config
        .minute
        .minutes_after
        .saturating_add(spot.duration_minutes());

    let lower = -i64::from(minutes_before);
    let upper = i64::from(minutes_after);

    let mut buckets: BTreeMap<i64, Vec<&MetricSample>> = BTreeMap::new();
    for sample in samples {
        let offset = sample
            .timestamp
            .signed_duration_since(spot.air_time)
            .num_seconds()
            .div_euclid(60);
        if (lower..upper).contains(&offset) {
            buckets.entry(offset).or_default().push(sample);
        }
    }

    let points: Vec<MinutePoint> = buckets
        .into_iter()
        .map(|(offset_minutes, bucket)| MinutePoint {
            offset_minutes,
            value: WindowMetrics::from_samples(bucket).value(metric),
        })
        .collect();

    let (pre, post): (Vec<&MinutePoint>, Vec<&MinutePoint>) =
        points.iter().partition(|p| p.offset_minutes < 0);

    let pre_average = mean(&pre);
    let post_average = mean(&post);
    let uplift_pct = if pre_average > 0.0 {
        finite_or_zero((post_average - pre_average) * 100.0 / pre_average)
    } else {
        0.0
    };

    let peak = post
        .iter()
        .copied()
        .fold(None, |best: Option<&MinutePoint>, p| match best {
            Some(b) if b.value >= p.value => Some(b),
            _ => Some(p),
        })
        .copied();

    let direct_correlation = uplift_pct > config.significance_threshold_pct;

    tracing::debug!(
        air_time = %spot.air_time,
        metric = metric.name(),
        pre_minutes = pre.len(),
        post_minutes = post.len(),
        uplift_pct,
        "Minute-by-minute analysis"
    );

    MinuteByMinuteAnalysis {
        metric,
        minutes_before,
        minutes_after,
        points,
        pre_average,
        post_average,
        uplift_pct,
        peak,
        direct_correlation,
    }
}

fn mean(points: &[&MinutePoint]) -> f64 {
    if points.is_empty() {
        return 0.0;
    }
    points.iter().map(|p| p.value).sum::<f64>() / points.len() as f64
}
