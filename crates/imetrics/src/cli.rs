//! Terminal rendering for analysis results
//!
//! Tables via comfy-table for humans, `--json` for machines. Values are
//! rounded here and only here; the core keeps full precision.

use chrono::NaiveDateTime;
use comfy_table::{Cell, Color, ContentArrangement, Row, Table};
use imetrics_core::analytics::insights::format_change;
use imetrics_core::analytics::{
    Baseline, CampaignSummary, Insight, MinuteByMinuteAnalysis, RoiEstimate, SpotAnalysis,
    TemporalImpactResult,
};
use imetrics_core::{LoadReport, Metric, MetricSample};

// ============================================================================
// Input Helpers
// ============================================================================

/// Split sample data into (historical, actual)
///
/// With no dedicated history file the same samples serve both roles, but
/// history only keeps what precedes `cutoff` so the post-spot traffic never
/// leaks into its own baseline.
pub fn split_history(
    samples: Vec<MetricSample>,
    history: Option<Vec<MetricSample>>,
    cutoff: NaiveDateTime,
) -> (Vec<MetricSample>, Vec<MetricSample>) {
    match history {
        Some(history) => (history, samples),
        None => {
            let history = samples
                .iter()
                .filter(|s| s.timestamp < cutoff)
                .cloned()
                .collect();
            (history, samples)
        }
    }
}

/// Skipped or adjusted records, one per line; None when the load was clean
pub fn format_load_warnings(report: &LoadReport) -> Option<String> {
    if !report.has_errors() {
        return None;
    }

    let mut lines = vec![format!(
        "Warnings ({} of {} records skipped):",
        report.records_skipped, report.records_read
    )];
    for error in &report.errors {
        lines.push(format!("  - {}: {}", error.source, error.message));
        if let Some(suggestion) = &error.suggestion {
            lines.push(format!("    hint: {}", suggestion));
        }
    }
    Some(lines.join("\n"))
}

// ============================================================================
// Formatters
// ============================================================================

/// Baseline per window and metric
pub fn format_baseline(baseline: &Baseline, no_color: bool) -> String {
    let mut table = new_table(
        &[
            "Window", "Metric", "Mean", "Median", "Std dev", "Confidence", "Samples",
        ],
        no_color,
    );

    for (window, metrics) in &baseline.windows {
        for (metric, b) in metrics {
            table.add_row(Row::from(vec![
                window.key().to_string(),
                metric.name().to_string(),
                format_value(*metric, b.mean),
                format_value(*metric, b.median),
                format_value(*metric, b.std_dev),
                format!("{}%", b.confidence),
                b.sample_size.to_string(),
            ]));
        }
    }

    table.to_string()
}

/// Window-by-window comparison against the baseline
pub fn format_impact(impact: &TemporalImpactResult, no_color: bool) -> String {
    let mut table = new_table(
        &[
            "Window", "Metric", "Actual", "Baseline", "Change", "Effect", "Significant",
        ],
        no_color,
    );

    for (window, w) in &impact.windows {
        for (metric, c) in &w.comparison {
            let significant = if c.is_significant { "yes" } else { "-" };
            let significant = if no_color || !c.is_significant {
                Cell::new(significant)
            } else if c.percentage_change >= 0.0 {
                Cell::new(significant).fg(Color::Green)
            } else {
                Cell::new(significant).fg(Color::Red)
            };

            table.add_row(Row::from(vec![
                Cell::new(window.key()),
                Cell::new(metric.name()),
                Cell::new(format_value(*metric, c.window_value)),
                Cell::new(format_value(*metric, c.baseline_value)),
                Cell::new(format_change(c.percentage_change)),
                Cell::new(format!("{:.2}", c.effect_size)),
                significant,
            ]));
        }
    }

    let mut summary = new_table(&["Window", "From", "To", "Significant", "Confidence"], no_color);
    for (window, w) in &impact.windows {
        summary.add_row(Row::from(vec![
            window.key().to_string(),
            w.start.format("%Y-%m-%d %H:%M").to_string(),
            w.end.format("%Y-%m-%d %H:%M").to_string(),
            format!(
                "{}/{}",
                w.significance.significant_metrics, w.significance.total_metrics
            ),
            format!("{}%", w.confidence),
        ]));
    }

    format!("{}\n{}", table, summary)
}

/// Bulleted insight list
pub fn format_insights(insights: &[Insight]) -> String {
    if insights.is_empty() {
        return "No significant effects detected.".to_string();
    }

    insights
        .iter()
        .map(|i| format!("  • [{}] {} ({}%)", i.window.key(), i.message, i.confidence))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_roi(roi: &RoiEstimate) -> String {
    let verdict = if roi.is_profitable {
        "profitable"
    } else {
        "not profitable"
    };
    [
        format!("Incremental value: ${:.2}", roi.total_incremental_value),
        format!("Spot cost:         ${:.2}", roi.spot_cost),
        format!("ROI:               {:.1}% ({})", roi.roi, verdict),
    ]
    .join("\n")
}

/// Full single-spot report
pub fn format_analysis(analysis: &SpotAnalysis, no_color: bool) -> String {
    let spot = &analysis.spot;
    let mut lines = vec![format!(
        "Spot: {}{}",
        spot.air_time.format("%Y-%m-%d %H:%M"),
        spot.label
            .as_deref()
            .map(|l| format!(" ({})", l))
            .unwrap_or_default()
    )];
    lines.push(String::new());
    lines.push(format_impact(&analysis.impact, no_color));
    lines.push(String::new());
    lines.push("Insights:".to_string());
    lines.push(format_insights(&analysis.insights));
    lines.push(String::new());
    lines.push(format_roi(&analysis.roi));
    lines.join("\n")
}

/// Per-minute series around air time
pub fn format_minute(analysis: &MinuteByMinuteAnalysis, no_color: bool) -> String {
    let mut table = new_table(&["Offset", analysis.metric.name()], no_color);
    let peak_offset = analysis.peak.as_ref().map(|p| p.offset_minutes);

    for point in &analysis.points {
        let mut offset = format!("{:+} min", point.offset_minutes);
        if point.offset_minutes == 0 {
            offset.push_str("  <- air");
        }
        if Some(point.offset_minutes) == peak_offset {
            offset.push_str("  <- peak");
        }
        table.add_row(Row::from(vec![
            offset,
            format_value(analysis.metric, point.value),
        ]));
    }

    let correlation = if analysis.direct_correlation {
        "yes"
    } else {
        "no"
    };
    [
        table.to_string(),
        format!(
            "Before (avg): {}",
            format_value(analysis.metric, analysis.pre_average)
        ),
        format!(
            "After (avg):  {}",
            format_value(analysis.metric, analysis.post_average)
        ),
        format!("Uplift:       {}", format_change(analysis.uplift_pct)),
        format!("Direct correlation: {}", correlation),
    ]
    .join("\n")
}

/// Campaign summary: per-spot ROI, hourly effectiveness, totals
pub fn format_campaign(summary: &CampaignSummary, no_color: bool) -> String {
    if summary.spots.is_empty() {
        return "No spots to analyze.".to_string();
    }

    let mut spots = new_table(
        &["#", "Air time", "Label", "Cost", "Value", "ROI", "Insights"],
        no_color,
    );
    for (idx, analysis) in summary.spots.iter().enumerate() {
        let marker = if summary.best_spot == Some(idx) {
            format!("{} *", idx + 1)
        } else {
            (idx + 1).to_string()
        };
        spots.add_row(Row::from(vec![
            marker,
            analysis.spot.air_time.format("%Y-%m-%d %H:%M").to_string(),
            analysis.spot.label.clone().unwrap_or_else(|| "-".to_string()),
            format!("${:.2}", analysis.spot.cost),
            format!("${:.2}", analysis.roi.total_incremental_value),
            format!("{:.1}%", analysis.roi.roi),
            analysis.insights.len().to_string(),
        ]));
    }

    let mut hours = new_table(&["Hour", "Spots", "Immediate uplift", "Confidence"], no_color);
    for h in &summary.hourly_effectiveness {
        hours.add_row(Row::from(vec![
            format!("{:02}:00", h.hour),
            h.spot_count.to_string(),
            format_change(h.avg_immediate_uplift_pct),
            format!("{}%", h.avg_confidence),
        ]));
    }

    let mut lines = vec![
        spots.to_string(),
        "(* best spot)".to_string(),
        String::new(),
        hours.to_string(),
        String::new(),
        format_roi(&summary.roi),
    ];
    if !summary.insights.is_empty() {
        lines.push(String::new());
        lines.push(format_insights(&summary.insights));
    }
    lines.join("\n")
}

// ============================================================================
// Utilities
// ============================================================================

fn new_table(headers: &[&str], no_color: bool) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    // Apply colors only if enabled
    if no_color {
        table.set_header(headers.to_vec());
    } else {
        table.set_header(
            headers
                .iter()
                .map(|h| Cell::new(h).fg(Color::Cyan))
                .collect::<Vec<_>>(),
        );
    }
    table
}

/// Metric value rounded for display
pub fn format_value(metric: Metric, value: f64) -> String {
    match metric {
        Metric::BounceRate | Metric::ConversionRate => format!("{:.2}%", value),
        Metric::AvgSessionDuration => format!("{:.0}s", value),
        _ => format_number(value),
    }
}

fn format_number(n: f64) -> String {
    if n.abs() >= 1_000_000.0 {
        format!("{:.2}M", n / 1_000_000.0)
    } else if n.abs() >= 10_000.0 {
        format!("{:.1}K", n / 1_000.0)
    } else {
        format!("{:.1}", n)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use imetrics_core::{analyze_spot, AnalysisConfig, Spot, TimeWindow};

    fn air() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(19, 0, 0)
            .unwrap()
    }

    fn sample_analysis() -> SpotAnalysis {
        let history: Vec<_> = (1..=8)
            .map(|w| MetricSample::new(air() - Duration::weeks(w)).with_sessions(100))
            .collect();
        let actual = vec![MetricSample::new(air()).with_sessions(180)];
        let spot = Spot::new(air()).with_cost(20.0).with_label("Prime");
        analyze_spot(&spot, &history, &actual, &AnalysisConfig::default()).unwrap()
    }

    #[test]
    fn test_split_history_without_file_cuts_at_spot() {
        let samples = vec![
            MetricSample::new(air() - Duration::weeks(1)),
            MetricSample::new(air()),
            MetricSample::new(air() + Duration::hours(1)),
        ];

        let (history, actual) = split_history(samples, None, air());
        assert_eq!(history.len(), 1);
        assert_eq!(actual.len(), 3);
    }

    #[test]
    fn test_split_history_with_file() {
        let samples = vec![MetricSample::new(air())];
        let history = vec![MetricSample::new(air() + Duration::days(1))];

        let (history, actual) = split_history(samples, Some(history), air());
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].timestamp, air() + Duration::days(1));
        assert_eq!(actual.len(), 1);
    }

    #[test]
    fn test_format_value_units() {
        assert_eq!(format_value(Metric::ConversionRate, 2.5), "2.50%");
        assert_eq!(format_value(Metric::AvgSessionDuration, 90.4), "90s");
        assert_eq!(format_value(Metric::Sessions, 150.0), "150.0");
        assert_eq!(format_value(Metric::Sessions, 25_000.0), "25.0K");
        assert_eq!(format_value(Metric::Pageviews, 2_500_000.0), "2.50M");
    }

    #[test]
    fn test_format_analysis_contains_sections() {
        let output = format_analysis(&sample_analysis(), true);
        assert!(output.contains("Spot: 2024-03-05 19:00 (Prime)"));
        assert!(output.contains("immediate"));
        assert!(output.contains("+80%"));
        assert!(output.contains("Insights:"));
        assert!(output.contains("ROI:"));
    }

    #[test]
    fn test_format_insights_empty() {
        assert_eq!(format_insights(&[]), "No significant effects detected.");
    }

    #[test]
    fn test_format_baseline_lists_windows() {
        let output = format_baseline(&sample_analysis().baseline, true);
        for window in TimeWindow::ALL {
            assert!(output.contains(window.key()));
        }
        assert!(output.contains("sessions"));
    }

    #[test]
    fn test_format_load_warnings() {
        let mut report = LoadReport::new();
        report.records_read = 3;
        assert!(format_load_warnings(&report).is_none());

        report.skip("samples[1]", "missing timestamp");
        let output = format_load_warnings(&report).unwrap();
        assert!(output.contains("1 of 3 records skipped"));
        assert!(output.contains("samples[1]: missing timestamp"));
    }
}
