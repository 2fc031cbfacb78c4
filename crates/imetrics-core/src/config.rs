//! Analysis configuration
//!
//! Every threshold the engine uses is a named field here, defaulting to the
//! constants below. Loaded from `<config_dir>/imetrics/config.toml` when present.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CoreError, Result};

/// A comparison is significant when `|percentage change|` exceeds this (strict)
pub const SIGNIFICANCE_THRESHOLD_PCT: f64 = 10.0;
/// Monetary value attributed to one incremental session
pub const VALUE_PER_SESSION_USD: f64 = 0.5;
/// Baseline confidence with a single matched sample, before the slope
pub const BASELINE_CONFIDENCE_FLOOR: u8 = 60;
/// Lower clamp for window confidence
pub const WINDOW_CONFIDENCE_MIN: u8 = 50;
/// Upper clamp for every confidence value
pub const CONFIDENCE_MAX: u8 = 95;
/// Confidence points added per matched historical sample
pub const SAMPLE_SIZE_CONFIDENCE_SLOPE: u8 = 2;
/// Share of significant metrics above which short-term impact is "sustained"
pub const SUSTAINED_EFFECT_RATIO: f64 = 0.5;
/// Long-term conversion-rate lift (%) above which conversion is "delayed"
pub const DELAYED_CONVERSION_PCT: f64 = 20.0;
/// Coefficient of variation below which a baseline counts as stable
pub const LOW_VARIABILITY_CV: f64 = 0.3;

/// Window lengths
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowDurations {
    pub immediate_minutes: u32,
    pub short_term_hours: u32,
    pub medium_term_days: u32,
    /// 30 days as historically coded; 28 gives exactly four weeks
    pub long_term_days: u32,
}

impl Default for WindowDurations {
    fn default() -> Self {
        Self {
            immediate_minutes: 30,
            short_term_hours: 4,
            medium_term_days: 7,
            long_term_days: 30,
        }
    }
}

/// Historical period matching (same weekday ± n, same hour ± m)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    pub weekday_tolerance: u32,
    pub hour_tolerance: u32,
    /// Treat Saturday and Sunday as adjacent
    pub wrap_weekdays: bool,
    /// Treat 23h and 0h as adjacent
    pub wrap_hours: bool,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            weekday_tolerance: 1,
            hour_tolerance: 2,
            wrap_weekdays: false,
            wrap_hours: false,
        }
    }
}

/// Minute-by-minute comparison widths
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinuteConfig {
    /// Reference minutes before air time
    pub minutes_before: u32,
    /// Minutes after air time, extended by the spot's own duration
    pub minutes_after: u32,
}

impl Default for MinuteConfig {
    fn default() -> Self {
        Self {
            minutes_before: 5,
            minutes_after: 5,
        }
    }
}

/// Complete analysis configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub significance_threshold_pct: f64,
    pub value_per_session_usd: f64,
    pub baseline_confidence_floor: u8,
    pub sample_size_confidence_slope: u8,
    pub window_confidence_min: u8,
    pub confidence_max: u8,
    pub sustained_effect_ratio: f64,
    pub delayed_conversion_pct: f64,
    pub low_variability_cv: f64,

    /// Also build baselines for bounce rate, session duration and conversion rate
    pub baseline_rate_metrics: bool,
    /// Floor each window's incremental value at zero before summing ROI
    pub floor_negative_roi_windows: bool,

    pub windows: WindowDurations,
    pub matching: MatchingConfig,
    pub minute: MinuteConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            significance_threshold_pct: SIGNIFICANCE_THRESHOLD_PCT,
            value_per_session_usd: VALUE_PER_SESSION_USD,
            baseline_confidence_floor: BASELINE_CONFIDENCE_FLOOR,
            sample_size_confidence_slope: SAMPLE_SIZE_CONFIDENCE_SLOPE,
            window_confidence_min: WINDOW_CONFIDENCE_MIN,
            confidence_max: CONFIDENCE_MAX,
            sustained_effect_ratio: SUSTAINED_EFFECT_RATIO,
            delayed_conversion_pct: DELAYED_CONVERSION_PCT,
            low_variability_cv: LOW_VARIABILITY_CV,
            baseline_rate_metrics: false,
            floor_negative_roi_windows: false,
            windows: WindowDurations::default(),
            matching: MatchingConfig::default(),
            minute: MinuteConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Default config file location: `<config_dir>/imetrics/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("imetrics").join("config.toml"))
    }

    /// Parse and validate TOML; missing keys take their defaults
    pub fn from_toml_str(content: &str, path: &Path) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| CoreError::TomlParse {
            path: path.to_path_buf(),
            message: e.message().to_string(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CoreError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|source| CoreError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::from_toml_str(&content, path)?;
        tracing::debug!(path = %path.display(), "Loaded analysis config");
        Ok(config)
    }

    /// Load from `path`, falling back to defaults when the file is absent or broken
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(CoreError::FileNotFound { .. }) => Self::default(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring config file, using defaults");
                Self::default()
            }
        }
    }

    /// Serialize to TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| CoreError::invalid_config(e.to_string()))
    }

    /// Reject values the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        let non_negative = [
            ("significance_threshold_pct", self.significance_threshold_pct),
            ("value_per_session_usd", self.value_per_session_usd),
            ("sustained_effect_ratio", self.sustained_effect_ratio),
            ("delayed_conversion_pct", self.delayed_conversion_pct),
            ("low_variability_cv", self.low_variability_cv),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(CoreError::invalid_config(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }

        if self.confidence_max > 100 {
            return Err(CoreError::invalid_config(format!(
                "confidence_max must be at most 100, got {}",
                self.confidence_max
            )));
        }

        if self.window_confidence_min > self.confidence_max {
            return Err(CoreError::invalid_config(format!(
                "window_confidence_min ({}) exceeds confidence_max ({})",
                self.window_confidence_min, self.confidence_max
            )));
        }

        let w = &self.windows;
        if w.immediate_minutes == 0
            || w.short_term_hours == 0
            || w.medium_term_days == 0
            || w.long_term_days == 0
        {
            return Err(CoreError::invalid_config("window durations must be non-zero"));
        }

        if self.matching.weekday_tolerance > 6 || self.matching.hour_tolerance > 23 {
            return Err(CoreError::invalid_config(
                "matching tolerances must stay within a week / a day",
            ));
        }

        Ok(())
    }
}
