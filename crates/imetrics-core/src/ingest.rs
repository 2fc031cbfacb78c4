//! JSON ingestion for traffic samples and spot lists
//!
//! Accepts GA-style exports: camelCase keys, numbers possibly encoded as
//! strings, and one of several timestamp keys. Individual bad records are
//! skipped into a [`LoadReport`]; only unreadable files or malformed JSON as
//! a whole fail the load.

use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::{CoreError, LoadError, LoadReport, Result};
use crate::models::{parse_timestamp, MetricSample, Spot, SpotDescriptor};

/// Numeric field as GA sends it: a JSON number or a numeric string
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum NumberLike {
    Integer(u64),
    Float(f64),
    Text(String),
}

impl NumberLike {
    fn as_f64(&self) -> Option<f64> {
        let value = match self {
            NumberLike::Integer(n) => *n as f64,
            NumberLike::Float(f) => *f,
            NumberLike::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }

    fn as_text(&self) -> String {
        match self {
            NumberLike::Integer(n) => n.to_string(),
            NumberLike::Float(f) => f.to_string(),
            NumberLike::Text(s) => s.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSample {
    timestamp: Option<NumberLike>,
    date: Option<NumberLike>,
    date_hour_minute: Option<NumberLike>,
    date_hour: Option<NumberLike>,

    active_users: Option<NumberLike>,
    sessions: Option<NumberLike>,
    #[serde(alias = "screenPageViews")]
    pageviews: Option<NumberLike>,
    bounces: Option<NumberLike>,
    session_duration: Option<NumberLike>,
    #[serde(alias = "keyEvents")]
    conversions: Option<NumberLike>,
}

impl RawSample {
    /// First timestamp key present, in priority order
    fn raw_timestamp(&self) -> Option<String> {
        [
            &self.timestamp,
            &self.date,
            &self.date_hour_minute,
            &self.date_hour,
        ]
        .into_iter()
        .flatten()
        .next()
        .map(NumberLike::as_text)
    }
}

/// Read a numeric field; missing is 0, negative or garbage is 0 with a warning
fn non_negative(
    field: &Option<NumberLike>,
    name: &str,
    source: &str,
    report: &mut LoadReport,
) -> f64 {
    let Some(raw) = field else {
        return 0.0;
    };

    match raw.as_f64() {
        Some(v) if v >= 0.0 => v,
        Some(v) => {
            report.add_error(
                LoadError::warning(source, format!("negative {} ({}) clamped to 0", name, v))
                    .with_suggestion("Check the export for refunds or corrections"),
            );
            0.0
        }
        None => {
            report.add_warning(
                source,
                format!("non-numeric {} '{}' treated as 0", name, raw.as_text()),
            );
            0.0
        }
    }
}

fn count(
    field: &Option<NumberLike>,
    name: &str,
    source: &str,
    report: &mut LoadReport,
) -> u64 {
    non_negative(field, name, source, report).round() as u64
}

fn parse_array(json: &str, source_name: &str) -> Result<Vec<Value>> {
    serde_json::from_str::<Vec<Value>>(json).map_err(|e| CoreError::JsonParse {
        source_name: source_name.to_string(),
        message: e.to_string(),
        source: e,
    })
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            CoreError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            CoreError::FileRead {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })
}

/// Parse a JSON array of sample records, sorted ascending by timestamp
pub fn parse_samples(json: &str, source_name: &str) -> Result<(Vec<MetricSample>, LoadReport)> {
    let records = parse_array(json, source_name)?;
    let mut report = LoadReport::new();
    let mut samples = Vec::with_capacity(records.len());

    for (i, record) in records.into_iter().enumerate() {
        report.records_read += 1;
        let source = format!("{}[{}]", source_name, i);

        let raw: RawSample = match serde_json::from_value(record) {
            Ok(raw) => raw,
            Err(e) => {
                report.skip(source, format!("malformed record: {}", e));
                continue;
            }
        };

        let Some(text) = raw.raw_timestamp() else {
            report.skip(source, "missing timestamp");
            continue;
        };
        let Some(timestamp) = parse_timestamp(&text) else {
            report.skip(source, format!("unparsable timestamp '{}'", text));
            continue;
        };

        samples.push(MetricSample {
            timestamp,
            active_users: count(&raw.active_users, "activeUsers", &source, &mut report),
            sessions: count(&raw.sessions, "sessions", &source, &mut report),
            pageviews: count(&raw.pageviews, "pageviews", &source, &mut report),
            bounces: non_negative(&raw.bounces, "bounces", &source, &mut report),
            session_duration: non_negative(
                &raw.session_duration,
                "sessionDuration",
                &source,
                &mut report,
            ),
            conversions: non_negative(&raw.conversions, "conversions", &source, &mut report),
        });
    }

    samples.sort_by_key(|s| s.timestamp);

    debug!(
        source = source_name,
        read = report.records_read,
        skipped = report.records_skipped,
        "Parsed samples"
    );
    Ok((samples, report))
}

/// Parse a JSON array of spot descriptors, keeping input order
pub fn parse_spots(json: &str, source_name: &str) -> Result<(Vec<Spot>, LoadReport)> {
    let records = parse_array(json, source_name)?;
    let mut report = LoadReport::new();
    let mut spots = Vec::with_capacity(records.len());

    for (i, record) in records.into_iter().enumerate() {
        report.records_read += 1;
        let source = format!("{}[{}]", source_name, i);

        let descriptor: SpotDescriptor = match serde_json::from_value(record) {
            Ok(d) => d,
            Err(e) => {
                report.skip(source, format!("malformed spot: {}", e));
                continue;
            }
        };

        match Spot::try_from(descriptor) {
            Ok(spot) => spots.push(spot),
            Err(e) => report.skip(source, e.to_string()),
        }
    }

    Ok((spots, report))
}

/// Load samples from a JSON file
pub fn load_samples(path: &Path) -> Result<(Vec<MetricSample>, LoadReport)> {
    let content = read_file(path)?;
    let source = path.display().to_string();
    let (samples, report) = parse_samples(&content, &source)?;

    if report.records_skipped > 0 {
        warn!(
            path = %path.display(),
            skipped = report.records_skipped,
            "Some sample records were skipped"
        );
    }
    info!(path = %path.display(), count = samples.len(), "Loaded samples");
    Ok((samples, report))
}

/// Load spots from a JSON file
pub fn load_spots(path: &Path) -> Result<(Vec<Spot>, LoadReport)> {
    let content = read_file(path)?;
    let source = path.display().to_string();
    let (spots, report) = parse_spots(&content, &source)?;

    if report.records_skipped > 0 {
        warn!(
            path = %path.display(),
            skipped = report.records_skipped,
            "Some spots were skipped"
        );
    }
    info!(path = %path.display(), count = spots.len(), "Loaded spots");
    Ok((spots, report))
}
