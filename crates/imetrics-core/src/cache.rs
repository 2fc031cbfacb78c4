//! Memoizing wrapper around the spot analysis
//!
//! The analysis functions never cache. Callers that re-render the same spot
//! over the same data (dashboards, exports) wrap them in a `CachedAnalyzer`,
//! keyed by every spot field and a fingerprint of both sample sets.

use chrono::NaiveDateTime;
use moka::sync::Cache;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use crate::analytics::{analyze_spot, SpotAnalysis};
use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::models::{MetricSample, Spot};

/// Default number of cached analyses
const DEFAULT_CAPACITY: u64 = 1_000;
/// Entries unused for this long are evicted
const DEFAULT_TIME_TO_IDLE: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct AnalysisKey {
    air_time: NaiveDateTime,
    duration_seconds: u32,
    cost_bits: u64,
    label: Option<String>,
    historical: SampleSetKey,
    actual: SampleSetKey,
}

/// Identity of a sample set: length and time span plus a content hash
///
/// The hash is 64-bit, so two different sets of equal length and span can
/// in principle collide and share an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct SampleSetKey {
    len: usize,
    first: Option<NaiveDateTime>,
    last: Option<NaiveDateTime>,
    hash: u64,
}

impl SampleSetKey {
    fn of(samples: &[MetricSample]) -> Self {
        Self {
            len: samples.len(),
            first: samples.first().map(|s| s.timestamp),
            last: samples.last().map(|s| s.timestamp),
            hash: fingerprint(samples),
        }
    }
}

/// Fingerprint of a sample set (order-sensitive, 64-bit)
pub fn fingerprint(samples: &[MetricSample]) -> u64 {
    let mut hasher = DefaultHasher::new();
    samples.len().hash(&mut hasher);
    for s in samples {
        s.timestamp.hash(&mut hasher);
        s.active_users.hash(&mut hasher);
        s.sessions.hash(&mut hasher);
        s.pageviews.hash(&mut hasher);
        s.bounces.to_bits().hash(&mut hasher);
        s.session_duration.to_bits().hash(&mut hasher);
        s.conversions.to_bits().hash(&mut hasher);
    }
    hasher.finish()
}

/// Thread-safe cache of spot analyses for one configuration
pub struct CachedAnalyzer {
    config: AnalysisConfig,
    cache: Cache<AnalysisKey, Arc<SpotAnalysis>>,
}

impl CachedAnalyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self::with_capacity(config, DEFAULT_CAPACITY, DEFAULT_TIME_TO_IDLE)
    }

    pub fn with_capacity(config: AnalysisConfig, capacity: u64, time_to_idle: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(capacity)
            .time_to_idle(time_to_idle)
            .build();
        Self { config, cache }
    }

    /// Analyze a spot, reusing a previous result for identical inputs
    pub fn analyze(
        &self,
        spot: &Spot,
        historical: &[MetricSample],
        actual: &[MetricSample],
    ) -> Result<Arc<SpotAnalysis>> {
        let key = AnalysisKey {
            air_time: spot.air_time,
            duration_seconds: spot.duration_seconds,
            cost_bits: spot.cost.to_bits(),
            label: spot.label.clone(),
            historical: SampleSetKey::of(historical),
            actual: SampleSetKey::of(actual),
        };

        if let Some(hit) = self.cache.get(&key) {
            tracing::debug!(air_time = %spot.air_time, "Analysis cache hit");
            return Ok(hit);
        }

        let analysis = Arc::new(analyze_spot(spot, historical, actual, &self.config)?);
        self.cache.insert(key, Arc::clone(&analysis));
        Ok(analysis)
    }

    /// Drop every cached analysis
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    /// Approximate number of cached analyses
    pub fn entry_count(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, NaiveDate};

    fn air() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(19, 0, 0)
            .unwrap()
    }

    fn history() -> Vec<MetricSample> {
        (1..=6)
            .map(|w| MetricSample::new(air() - ChronoDuration::weeks(w)).with_sessions(100))
            .collect()
    }

    #[test]
    fn test_identical_inputs_share_result() {
        let analyzer = CachedAnalyzer::new(AnalysisConfig::default());
        let spot = Spot::new(air()).with_cost(50.0);
        let actual = vec![MetricSample::new(air()).with_sessions(180)];

        let first = analyzer.analyze(&spot, &history(), &actual).unwrap();
        let second = analyzer.analyze(&spot, &history(), &actual).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(analyzer.entry_count(), 1);
    }

    #[test]
    fn test_changed_inputs_miss() {
        let analyzer = CachedAnalyzer::new(AnalysisConfig::default());
        let spot = Spot::new(air());
        let actual = vec![MetricSample::new(air()).with_sessions(180)];
        let changed = vec![MetricSample::new(air()).with_sessions(181)];

        let first = analyzer.analyze(&spot, &history(), &actual).unwrap();
        let second = analyzer.analyze(&spot, &history(), &changed).unwrap();
        let third = analyzer
            .analyze(&spot.clone().with_cost(10.0), &history(), &actual)
            .unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(analyzer.entry_count(), 3);
    }

    #[test]
    fn test_cached_result_matches_direct_call() {
        let config = AnalysisConfig::default();
        let analyzer = CachedAnalyzer::new(config.clone());
        let spot = Spot::new(air()).with_cost(25.0);
        let actual = vec![MetricSample::new(air()).with_sessions(130)];

        let cached = analyzer.analyze(&spot, &history(), &actual).unwrap();
        let direct = analyze_spot(&spot, &history(), &actual, &config).unwrap();
        assert_eq!(*cached, direct);
    }

    #[test]
    fn test_invalidate_all() {
        let analyzer = CachedAnalyzer::new(AnalysisConfig::default());
        let spot = Spot::new(air());
        let before = analyzer.analyze(&spot, &history(), &[]).unwrap();
        assert_eq!(analyzer.entry_count(), 1);

        analyzer.invalidate_all();
        let after = analyzer.analyze(&spot, &history(), &[]).unwrap();
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(*before, *after);
    }

    #[test]
    fn test_fingerprint_sensitivity() {
        let a = history();
        let mut b = history();
        assert_eq!(fingerprint(&a), fingerprint(&b));

        b[0].conversions = 1.0;
        assert_ne!(fingerprint(&a), fingerprint(&b));
        assert_ne!(fingerprint(&a), fingerprint(&a[..5]));
    }

    #[test]
    fn test_label_is_part_of_key() {
        let analyzer = CachedAnalyzer::new(AnalysisConfig::default());
        let actual = vec![MetricSample::new(air()).with_sessions(180)];
        let antena = Spot::new(air()).with_cost(500.0).with_label("Antena 3");
        let telecinco = Spot::new(air()).with_cost(500.0).with_label("Telecinco");

        let first = analyzer.analyze(&antena, &history(), &actual).unwrap();
        let second = analyzer.analyze(&telecinco, &history(), &actual).unwrap();

        assert_eq!(first.spot.label.as_deref(), Some("Antena 3"));
        assert_eq!(second.spot.label.as_deref(), Some("Telecinco"));
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(analyzer.entry_count(), 2);

        let again = analyzer.analyze(&telecinco, &history(), &actual).unwrap();
        assert!(Arc::ptr_eq(&second, &again));
    }

    #[test]
    fn test_sample_set_key_tracks_length_and_span() {
        let full = history();
        let key = SampleSetKey::of(&full);
        assert_eq!(key.len, 6);
        assert_eq!(key.first, Some(air() - ChronoDuration::weeks(1)));
        assert_eq!(key.last, Some(air() - ChronoDuration::weeks(6)));
        assert_eq!(key, SampleSetKey::of(&history()));

        let shifted: Vec<MetricSample> = full
            .iter()
            .map(|s| MetricSample::new(s.timestamp + ChronoDuration::hours(1)).with_sessions(100))
            .collect();
        let shifted_key = SampleSetKey::of(&shifted);
        assert_ne!(key.first, shifted_key.first);
        assert_ne!(key, shifted_key);

        let empty = SampleSetKey::of(&[]);
        assert_eq!(empty.len, 0);
        assert_eq!(empty.first, None);
        assert_eq!(empty.last, None);
    }
}
