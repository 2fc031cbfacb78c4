//! ROI estimation from incremental sessions
//!
//! Windows overlap, so the same session can count in more than one window.
//! Negative windows subtract value unless `floor_negative_roi_windows` is set.

use serde::{Deserialize, Serialize};

use super::impact::TemporalImpactResult;
use super::stats::finite_or_zero;
use crate::config::AnalysisConfig;
use crate::models::Metric;

/// Estimated return of one spot (or a campaign)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoiEstimate {
    pub total_incremental_value: f64,
    pub spot_cost: f64,
    /// Percent; 0 when the cost is not positive
    pub roi: f64,
    pub is_profitable: bool,
}

impl RoiEstimate {
    /// Build from a value and a cost
    pub fn from_value(total_incremental_value: f64, spot_cost: f64) -> Self {
        let total_incremental_value = finite_or_zero(total_incremental_value);
        let roi = if spot_cost > 0.0 {
            finite_or_zero((total_incremental_value - spot_cost) / spot_cost * 100.0)
        } else {
            0.0
        };

        Self {
            total_incremental_value,
            spot_cost,
            roi,
            is_profitable: roi > 0.0,
        }
    }
}

/// Incremental value of one spot: Σ windows `sessions.absolute_change * value_per_session`
pub fn incremental_value(impact: &TemporalImpactResult, config: &AnalysisConfig) -> f64 {
    impact
        .windows
        .values()
        .filter_map(|w| w.comparison(Metric::Sessions))
        .map(|c| {
            let delta = if config.floor_negative_roi_windows {
                c.absolute_change.max(0.0)
            } else {
                c.absolute_change
            };
            delta * config.value_per_session_usd
        })
        .sum()
}

/// Estimate ROI of a spot
pub fn estimate_roi(
    impact: &TemporalImpactResult,
    spot_cost: f64,
    config: &AnalysisConfig,
) -> RoiEstimate {
    RoiEstimate::from_value(incremental_value(impact, config), spot_cost)
}
