//! Temporal baseline-and-impact analysis for broadcast spots
//!
//! Builds a baseline from historically comparable traffic, measures each
//! post-spot window against it, and turns the comparison into insights and
//! an ROI estimate. Everything here is synchronous and pure: inputs are
//! borrowed, results are freshly built, nothing is cached or shared.

use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::models::{MetricSample, Spot};

pub mod baseline;
pub mod campaign;
pub mod impact;
pub mod insights;
pub mod matching;
pub mod minute;
pub mod roi;
pub mod stats;


pub use baseline::{build_baseline, Baseline, MetricBaseline, WindowBaseline};
pub use campaign::{analyze_campaign, CampaignSummary, HourEffectiveness};
pub use impact::{
    analyze_impact, window_confidence, Significance, TemporalImpactResult, WindowComparison,
    WindowImpact, WindowMetrics,
};
pub use insights::{generate_insights, Insight, InsightKind};
pub use matching::SimilarityMatcher;
pub use minute::{analyze_minute_by_minute, MinuteByMinuteAnalysis, MinutePoint};
pub use roi::{estimate_roi, RoiEstimate};
pub use stats::Statistics;

/// Complete analysis of one spot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotAnalysis {
    pub spot: Spot,
    pub baseline: Baseline,
    pub impact: TemporalImpactResult,
    pub insights: Vec<Insight>,
    pub roi: RoiEstimate,
}

/// Run the full pipeline for one spot
///
/// baseline (from `historical`) → window impact (from `actual`) → insights + ROI.
///
/// # Performance
/// Linear in `historical.len() + 4 * actual.len()`.
pub fn analyze_spot(
    spot: &Spot,
    historical: &[MetricSample],
    actual: &[MetricSample],
    config: &AnalysisConfig,
) -> Result<SpotAnalysis> {
    let baseline = build_baseline(spot.air_time, historical, config);
    let impact = analyze_impact(spot.air_time, actual, &baseline, config)?;
    let insights = generate_insights(&impact, config);
    let roi = estimate_roi(&impact, spot.cost, config);

    tracing::debug!(
        air_time = %spot.air_time,
        insights = insights.len(),
        roi = roi.roi,
        "Spot analyzed"
    );

    Ok(SpotAnalysis {
        spot: spot.clone(),
        baseline,
        impact,
        insights,
        roi,
    })
}
