//! Campaign summary over many spots
//!
//! Runs the spot analysis for each spot and rolls the results up: total cost,
//! total incremental value, campaign ROI, best spot and per-hour effectiveness.

use chrono::Timelike;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::insights::{format_change, Insight, InsightKind};
use super::roi::RoiEstimate;
use super::{analyze_spot, SpotAnalysis};
use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::models::{Metric, MetricSample, Spot, TimeWindow};

/// Immediate-window response of spots aired in one hour of the day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourEffectiveness {
    pub hour: u32,
    pub spot_count: usize,
    /// Mean immediate-window sessions percentage change
    pub avg_immediate_uplift_pct: f64,
    /// Mean immediate-window confidence
    pub avg_confidence: u8,
}

/// Roll-up of a multi-spot campaign
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignSummary {
    pub spots: Vec<SpotAnalysis>,
    pub total_cost: f64,
    pub roi: RoiEstimate,
    /// Index into `spots` of the best spot by ROI, then incremental value
    pub best_spot: Option<usize>,
    /// Ascending by hour
    pub hourly_effectiveness: Vec<HourEffectiveness>,
    pub insights: Vec<Insight>,
}

/// Analyze every spot of a campaign
///
/// # Errors
/// Fails fast with the first spot that cannot be analyzed; no partial summary.
pub fn analyze_campaign(
    spots: &[Spot],
    historical: &[MetricSample],
    actual: &[MetricSample],
    config: &AnalysisConfig,
) -> Result<CampaignSummary> {
    let analyses = spots
        .iter()
        .map(|spot| analyze_spot(spot, historical, actual, config))
        .collect::<Result<Vec<_>>>()?;

    let total_cost: f64 = analyses.iter().map(|a| a.spot.cost).sum();
    let total_value: f64 = analyses.iter().map(|a| a.roi.total_incremental_value).sum();
    let roi = RoiEstimate::from_value(total_value, total_cost);

    let best_spot = analyses
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| {
            a.roi
                .roi
                .total_cmp(&b.roi.roi)
                .then(
                    a.roi
                        .total_incremental_value
                        .total_cmp(&b.roi.total_incremental_value),
                )
                // Earlier spot wins ties
                .then(std::cmp::Ordering::Greater)
        })
        .map(|(idx, _)| idx);

    let hourly_effectiveness = hourly_effectiveness(&analyses);
    let insights = timing_insight(&hourly_effectiveness).into_iter().collect();

    tracing::info!(
        spots = analyses.len(),
        total_cost,
        roi = roi.roi,
        "Campaign analyzed"
    );

    Ok(CampaignSummary {
        spots: analyses,
        total_cost,
        roi,
        best_spot,
        hourly_effectiveness,
        insights,
    })
}

fn hourly_effectiveness(analyses: &[SpotAnalysis]) -> Vec<HourEffectiveness> {
    let mut by_hour: BTreeMap<u32, Vec<(f64, u8)>> = BTreeMap::new();
    for analysis in analyses {
        let Some(immediate) = analysis.impact.window(TimeWindow::Immediate) else {
            continue;
        };
        let uplift = immediate
            .comparison(Metric::Sessions)
            .map(|c| c.percentage_change)
            .unwrap_or_default();
        by_hour
            .entry(analysis.spot.air_time.hour())
            .or_default()
            .push((uplift, immediate.confidence));
    }

    by_hour
        .into_iter()
        .map(|(hour, entries)| {
            let n = entries.len();
            let uplift_sum: f64 = entries.iter().map(|(u, _)| u).sum();
            let confidence_sum: usize = entries.iter().map(|&(_, c)| usize::from(c)).sum();
            HourEffectiveness {
                hour,
                spot_count: n,
                avg_immediate_uplift_pct: uplift_sum / n as f64,
                avg_confidence: u8::try_from(confidence_sum / n).unwrap_or(u8::MAX),
            }
        })
        .collect()
}

/// Best air hour, only when at least two distinct hours were used
fn timing_insight(hours: &[HourEffectiveness]) -> Option<Insight> {
    if hours.len() < 2 {
        return None;
    }

    // Earliest hour wins ties
    let best = hours.iter().reduce(|best, h| {
        if h.avg_immediate_uplift_pct > best.avg_immediate_uplift_pct {
            h
        } else {
            best
        }
    })?;

    Some(Insight {
        kind: InsightKind::TimingEffectiveness,
        window: TimeWindow::Immediate,
        message: format!(
            "Mejor franja horaria: {:02}:00 ({} spots, {} sesiones en la ventana inmediata)",
            best.hour,
            best.spot_count,
            format_change(best.avg_immediate_uplift_pct)
        ),
        confidence: best.avg_confidence,
        metrics: Some(vec![Metric::Sessions]),
    })
}
