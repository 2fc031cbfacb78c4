//! Traffic metrics compared between a spot window and its baseline

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Metric compared per window
///
/// Variant order is the output order of every per-metric map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    ActiveUsers,
    Sessions,
    Pageviews,
    BounceRate,
    AvgSessionDuration,
    ConversionRate,
}

impl Metric {
    /// All compared metrics, in output order
    pub const ALL: [Metric; 6] = [
        Metric::ActiveUsers,
        Metric::Sessions,
        Metric::Pageviews,
        Metric::BounceRate,
        Metric::AvgSessionDuration,
        Metric::ConversionRate,
    ];

    /// Volume metrics that always get a historical baseline
    pub const TRACKED: [Metric; 3] = [Metric::ActiveUsers, Metric::Sessions, Metric::Pageviews];

    /// Wire name (camelCase, as sent by the analytics backend)
    pub fn name(&self) -> &'static str {
        match self {
            Self::ActiveUsers => "activeUsers",
            Self::Sessions => "sessions",
            Self::Pageviews => "pageviews",
            Self::BounceRate => "bounceRate",
            Self::AvgSessionDuration => "avgSessionDuration",
            Self::ConversionRate => "conversionRate",
        }
    }

    /// Display name used in insight messages
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::ActiveUsers => "usuarios activos",
            Self::Sessions => "sesiones",
            Self::Pageviews => "páginas vistas",
            Self::BounceRate => "tasa de rebote",
            Self::AvgSessionDuration => "duración media de sesión",
            Self::ConversionRate => "tasa de conversión",
        }
    }

}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::ALL
            .iter()
            .copied()
            .find(|m| m.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CoreError::invalid_input(format!("unknown metric '{}'", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_order_is_stable() {
        let mut sorted = Metric::ALL;
        sorted.sort();
        assert_eq!(sorted, Metric::ALL);
    }

    #[test]
    fn test_metric_from_str() {
        assert_eq!("sessions".parse::<Metric>().unwrap(), Metric::Sessions);
        assert_eq!(
            "ConversionRate".parse::<Metric>().unwrap(),
            Metric::ConversionRate
        );
        assert!("revenue".parse::<Metric>().is_err());
    }

    #[test]
    fn test_metric_serializes_camel_case() {
        let json = serde_json::to_string(&Metric::AvgSessionDuration).unwrap();
        assert_eq!(json, "\"avgSessionDuration\"");
    }
}
