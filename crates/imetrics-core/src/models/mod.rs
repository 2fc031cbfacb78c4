//! Data models for iMetrics

pub mod metric;
pub mod sample;
pub mod spot;
pub mod time;
pub mod window;

pub use metric::Metric;
pub use sample::MetricSample;
pub use spot::{Spot, SpotDescriptor};
pub use time::parse_timestamp;
pub use window::TimeWindow;
