//! Confidence-annotated insights
//!
//! Rule-based statements over a spot's window impact. Rules are evaluated
//! per window, in window order; a rule whose condition is false emits nothing.

use serde::{Deserialize, Serialize};

use super::impact::{TemporalImpactResult, WindowImpact};
use crate::config::AnalysisConfig;
use crate::models::{Metric, TimeWindow};

/// Insight category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    /// At least one metric moved significantly in a window
    TemporalImpact,
    /// Short-term window keeps most metrics significant
    Sustainability,
    /// Long-term conversion rate lift
    DelayedConversion,
    /// Best air hour across a campaign
    TimingEffectiveness,
}

/// Human-readable, confidence-scored statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    #[serde(rename = "type")]
    pub kind: InsightKind,
    pub window: TimeWindow,
    pub message: String,
    pub confidence: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Vec<Metric>>,
}

/// Format a percentage with its sign
pub fn format_change(pct: f64) -> String {
    let sign = if pct >= 0.0 { "+" } else { "" };
    format!("{}{:.0}%", sign, pct)
}

/// Generate insights for one spot
///
/// Rules:
/// - `temporal_impact` (every window): names the significant metrics
/// - `sustainability` (short term): significant share > 0.5
/// - `delayed_conversion` (long term): conversion rate change > +20%
///
/// Within a window `temporal_impact` comes first. When `delayed_conversion`
/// fires, the conversion rate is reported there and left out of the
/// window's `temporal_impact` list.
///
/// That long-term `temporal_impact` list is then no longer the full set of
/// significant metrics: read `WindowImpact::significant_metrics` for it.
pub fn generate_insights(impact: &TemporalImpactResult, config: &AnalysisConfig) -> Vec<Insight> {
    let mut insights = Vec::new();

    for window in TimeWindow::ALL {
        let Some(window_impact) = impact.window(window) else {
            continue;
        };

        let delayed = match window {
            TimeWindow::LongTerm => delayed_conversion(window_impact, config),
            _ => None,
        };

        let mut significant = window_impact.significant_metrics();
        if delayed.is_some() {
            significant.retain(|&m| m != Metric::ConversionRate);
        }

        if !significant.is_empty() {
            insights.push(temporal_impact(window_impact, significant));
        }

        if window == TimeWindow::ShortTerm {
            if let Some(insight) = sustainability(window_impact, config) {
                insights.push(insight);
            }
        }

        insights.extend(delayed);
    }

    insights
}

fn temporal_impact(impact: &WindowImpact, metrics: Vec<Metric>) -> Insight {
    let described: Vec<String> = metrics
        .iter()
        .map(|&m| {
            let pct = impact
                .comparison(m)
                .map(|c| c.percentage_change)
                .unwrap_or_default();
            format!("{} ({})", m.display_name(), format_change(pct))
        })
        .collect();

    Insight {
        kind: InsightKind::TemporalImpact,
        window: impact.window,
        message: format!(
            "{}: impacto significativo en {}",
            impact.window.label(),
            described.join(", ")
        ),
        confidence: impact.confidence,
        metrics: Some(metrics),
    }
}

fn sustainability(impact: &WindowImpact, config: &AnalysisConfig) -> Option<Insight> {
    let overall = impact.significance.overall;
    if overall <= config.sustained_effect_ratio {
        return None;
    }

    Some(Insight {
        kind: InsightKind::Sustainability,
        window: impact.window,
        message: format!(
            "Efecto sostenido en {}: el {:.0}% de las métricas siguen siendo significativas",
            impact.window.label(),
            overall * 100.0
        ),
        confidence: impact.confidence,
        metrics: None,
    })
}

fn delayed_conversion(impact: &WindowImpact, config: &AnalysisConfig) -> Option<Insight> {
    let change = impact.comparison(Metric::ConversionRate)?.percentage_change;
    if change <= config.delayed_conversion_pct {
        return None;
    }

    Some(Insight {
        kind: InsightKind::DelayedConversion,
        window: impact.window,
        message: format!(
            "Conversión diferida en {}: la tasa de conversión varía un {} frente a la línea base",
            impact.window.label(),
            format_change(change)
        ),
        confidence: impact.confidence,
        metrics: Some(vec![Metric::ConversionRate]),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::impact::{Significance, WindowComparison, WindowMetrics};
    use chrono::{NaiveDate, NaiveDateTime};
    use std::collections::BTreeMap;

    fn air() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(19, 0, 0)
            .unwrap()
    }

    fn comparison(pct: f64) -> WindowComparison {
        WindowComparison {
            window_value: 100.0 + pct,
            baseline_value: 100.0,
            absolute_change: pct,
            percentage_change: pct,
            is_significant: pct.abs() > 10.0,
            effect_size: pct / 10.0,
        }
    }

    /// Window with the given percentage change per metric (in `Metric::ALL` order)
    fn window(window: TimeWindow, changes: [f64; 6], confidence: u8) -> WindowImpact {
        let comparison: BTreeMap<Metric, WindowComparison> = Metric::ALL
            .iter()
            .zip(changes)
            .map(|(&m, pct)| (m, comparison(pct)))
            .collect();
        WindowImpact {
            window,
            start: air(),
            end: air(),
            metrics: WindowMetrics::default(),
            significance: Significance::summarize(&comparison),
            comparison,
            confidence,
        }
    }

    fn result(windows: Vec<WindowImpact>) -> TemporalImpactResult {
        TemporalImpactResult {
            spot_time: air(),
            windows: windows.into_iter().map(|w| (w.window, w)).collect(),
        }
    }

    #[test]
    fn test_quiet_windows_emit_nothing() {
        let impact = result(
            TimeWindow::ALL
                .iter()
                .map(|&w| window(w, [0.0; 6], 70))
                .collect(),
        );
        assert!(generate_insights(&impact, &AnalysisConfig::default()).is_empty());
    }

    #[test]
    fn test_temporal_impact_names_significant_metrics() {
        let impact = result(vec![window(
            TimeWindow::Immediate,
            [50.0, 25.0, 5.0, 0.0, 0.0, 0.0],
            82,
        )]);

        let insights = generate_insights(&impact, &AnalysisConfig::default());
        assert_eq!(insights.len(), 1);
        let insight = &insights[0];
        assert_eq!(insight.kind, InsightKind::TemporalImpact);
        assert_eq!(insight.window, TimeWindow::Immediate);
        assert_eq!(insight.confidence, 82);
        assert_eq!(
            insight.metrics.as_deref(),
            Some(&[Metric::ActiveUsers, Metric::Sessions][..])
        );
        assert!(insight.message.contains("usuarios activos (+50%)"));
        assert!(insight.message.contains("sesiones (+25%)"));
        assert!(!insight.message.contains("páginas vistas"));
    }

    #[test]
    fn test_sustainability_requires_more_than_half() {
        let config = AnalysisConfig::default();

        // 3 of 6 significant: exactly 0.5, not sustained
        let half = result(vec![window(
            TimeWindow::ShortTerm,
            [20.0, 20.0, 20.0, 0.0, 0.0, 0.0],
            70,
        )]);
        let insights = generate_insights(&half, &config);
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].kind, InsightKind::TemporalImpact);

        // 4 of 6 significant
        let most = result(vec![window(
            TimeWindow::ShortTerm,
            [20.0, 20.0, 20.0, -30.0, 0.0, 0.0],
            70,
        )]);
        let kinds: Vec<_> = generate_insights(&most, &config)
            .into_iter()
            .map(|i| i.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![InsightKind::TemporalImpact, InsightKind::Sustainability]
        );
    }

    #[test]
    fn test_sustainability_only_for_short_term() {
        let impact = result(vec![window(TimeWindow::MediumTerm, [30.0; 6], 70)]);
        let insights = generate_insights(&impact, &AnalysisConfig::default());
        assert!(insights
            .iter()
            .all(|i| i.kind != InsightKind::Sustainability));
    }

    #[test]
    fn test_delayed_conversion_alone() {
        let impact = result(vec![window(
            TimeWindow::LongTerm,
            [2.0, -3.0, 1.0, 0.0, 4.0, 25.0],
            77,
        )]);

        let insights = generate_insights(&impact, &AnalysisConfig::default());
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].kind, InsightKind::DelayedConversion);
        assert_eq!(insights[0].window, TimeWindow::LongTerm);
        assert_eq!(insights[0].confidence, 77);
        assert!(insights[0].message.contains("+25%"));
    }

    #[test]
    fn test_delayed_conversion_threshold_is_strict() {
        let impact = result(vec![window(
            TimeWindow::LongTerm,
            [0.0, 0.0, 0.0, 0.0, 0.0, 20.0],
            77,
        )]);
        let insights = generate_insights(&impact, &AnalysisConfig::default());
        // 20% is significant but not a delayed conversion
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].kind, InsightKind::TemporalImpact);
        assert_eq!(insights[0].metrics.as_deref(), Some(&[Metric::ConversionRate][..]));
    }

    #[test]
    fn test_delayed_conversion_after_temporal_impact() {
        let impact = result(vec![window(
            TimeWindow::LongTerm,
            [40.0, 0.0, 0.0, 0.0, 0.0, 30.0],
            60,
        )]);
        let insights = generate_insights(&impact, &AnalysisConfig::default());
        assert_eq!(insights.len(), 2);
        assert_eq!(insights[0].kind, InsightKind::TemporalImpact);
        assert_eq!(insights[0].metrics.as_deref(), Some(&[Metric::ActiveUsers][..]));
        assert_eq!(insights[1].kind, InsightKind::DelayedConversion);

        // The window itself still counts conversion rate as significant
        let long_term = impact.window(TimeWindow::LongTerm).unwrap();
        assert_eq!(
            long_term.significant_metrics(),
            vec![Metric::ActiveUsers, Metric::ConversionRate]
        );
    }

    #[test]
    fn test_windows_processed_in_order() {
        let impact = result(vec![
            window(TimeWindow::LongTerm, [50.0; 6], 60),
            window(TimeWindow::Immediate, [50.0; 6], 60),
            window(TimeWindow::MediumTerm, [50.0; 6], 60),
            window(TimeWindow::ShortTerm, [50.0; 6], 60),
        ]);

        let windows: Vec<_> = generate_insights(&impact, &AnalysisConfig::default())
            .into_iter()
            .filter(|i| i.kind == InsightKind::TemporalImpact)
            .map(|i| i.window)
            .collect();
        assert_eq!(windows, TimeWindow::ALL.to_vec());
    }

    #[test]
    fn test_insight_json_shape() {
        let impact = result(vec![window(
            TimeWindow::ShortTerm,
            [20.0, 20.0, 20.0, 20.0, 0.0, 0.0],
            70,
        )]);
        let insights = generate_insights(&impact, &AnalysisConfig::default());
        let json = serde_json::to_value(&insights).unwrap();

        assert_eq!(json[0]["type"], "temporal_impact");
        assert_eq!(json[0]["window"], "shortTerm");
        assert_eq!(json[0]["metrics"][0], "activeUsers");
        assert_eq!(json[1]["type"], "sustainability");
        assert!(json[1].get("metrics").is_none());
    }

    #[test]
    fn test_format_change_sign() {
        assert_eq!(format_change(50.0), "+50%");
        assert_eq!(format_change(-12.4), "-12%");
        assert_eq!(format_change(0.0), "+0%");
    }
}
