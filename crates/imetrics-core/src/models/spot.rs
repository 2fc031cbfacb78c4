//! Broadcast spot (TV/radio airing) used as the temporal anchor

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::time::parse_timestamp;
use crate::error::{CoreError, Result};

/// Loosely shaped spot as it arrives from a spot list
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotDescriptor {
    #[serde(default)]
    pub date_time: Option<String>,

    #[serde(default)]
    pub duration_seconds: Option<u32>,

    #[serde(default)]
    pub cost: Option<f64>,

    /// Free-form label (channel, programme)
    #[serde(default)]
    pub label: Option<String>,
}

/// Validated spot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spot {
    pub air_time: NaiveDateTime,
    pub duration_seconds: u32,
    pub cost: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Spot {
    pub fn new(air_time: NaiveDateTime) -> Self {
        Self {
            air_time,
            duration_seconds: 0,
            cost: 0.0,
            label: None,
        }
    }

    /// Parse the air time from text; fails with `InvalidInput`
    pub fn parse(date_time: &str) -> Result<Self> {
        parse_timestamp(date_time)
            .map(Self::new)
            .ok_or_else(|| {
                CoreError::invalid_input(format!("unparsable spot dateTime '{}'", date_time))
            })
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = cost;
        self
    }

    pub fn with_duration(mut self, seconds: u32) -> Self {
        self.duration_seconds = seconds;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Spot length rounded up to whole minutes
    pub fn duration_minutes(&self) -> u32 {
        self.duration_seconds.div_ceil(60)
    }
}

impl TryFrom<SpotDescriptor> for Spot {
    type Error = CoreError;

    fn try_from(descriptor: SpotDescriptor) -> Result<Self> {
        let raw = descriptor
            .date_time
            .as_deref()
            .ok_or_else(|| CoreError::invalid_input("spot dateTime is missing"))?;

        let cost = descriptor.cost.unwrap_or(0.0);
        if !cost.is_finite() {
            return Err(CoreError::invalid_input(format!(
                "spot cost must be a finite number, got {}",
                cost
            )));
        }

        let mut spot = Spot::parse(raw)?
            .with_cost(cost)
            .with_duration(descriptor.duration_seconds.unwrap_or(0));
        spot.label = descriptor.label;
        Ok(spot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_descriptor_to_spot() {
        let descriptor = SpotDescriptor {
            date_time: Some("2024-03-05 19:00".to_string()),
            duration_seconds: Some(20),
            cost: Some(1500.0),
            label: Some("Antena 3".to_string()),
        };

        let spot = Spot::try_from(descriptor).unwrap();
        assert_eq!(spot.air_time.hour(), 19);
        assert_eq!(spot.cost, 1500.0);
        assert_eq!(spot.duration_minutes(), 1);
        assert_eq!(spot.label.as_deref(), Some("Antena 3"));
    }

    #[test]
    fn test_missing_date_time_is_invalid_input() {
        let err = Spot::try_from(SpotDescriptor::default()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput { .. }));
    }

    #[test]
    fn test_unparsable_date_time_is_invalid_input() {
        let descriptor = SpotDescriptor {
            date_time: Some("tomorrow evening".to_string()),
            ..Default::default()
        };
        let err = Spot::try_from(descriptor).unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput { .. }));
    }

    #[test]
    fn test_nan_cost_is_invalid_input() {
        let descriptor = SpotDescriptor {
            date_time: Some("2024-03-05 19:00".to_string()),
            cost: Some(f64::NAN),
            ..Default::default()
        };
        assert!(Spot::try_from(descriptor).is_err());
    }

    #[test]
    fn test_defaults_when_optional_fields_missing() {
        let spot: Spot = SpotDescriptor {
            date_time: Some("2024030519".to_string()),
            ..Default::default()
        }
        .try_into()
        .unwrap();
        assert_eq!(spot.cost, 0.0);
        assert_eq!(spot.duration_seconds, 0);
    }
}
