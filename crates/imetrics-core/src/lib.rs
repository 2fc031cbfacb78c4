//! imetrics-core - Core library for iMetrics
//!
//! Provides models, ingestion, configuration, and the temporal
//! baseline-and-impact analysis of broadcast spots against web traffic.

pub mod analytics;
pub mod cache;
pub mod config;
pub mod error;
pub mod ingest;
pub mod models;

pub use analytics::{
    analyze_campaign, analyze_impact, analyze_minute_by_minute, analyze_spot, build_baseline,
    estimate_roi, generate_insights, Baseline, CampaignSummary, Insight, InsightKind,
    MinuteByMinuteAnalysis, RoiEstimate, SpotAnalysis, TemporalImpactResult,
};
pub use cache::CachedAnalyzer;
pub use config::AnalysisConfig;
pub use error::{CoreError, LoadReport, Result};
pub use ingest::{load_samples, load_spots, parse_samples, parse_spots};
pub use models::{Metric, MetricSample, Spot, SpotDescriptor, TimeWindow};
