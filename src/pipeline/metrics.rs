use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::pipeline::geo;
use crate::types::activity::{FileFormat, ParsedActivity, Sample};

/// Values a source format supplies directly. Anything left `None` is derived
/// from the samples, then defaulted.
#[derive(Debug, Clone, Default)]
pub struct SourceSummary {
    pub activity_type: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub distance_km: Option<f64>,
    pub duration_seconds: Option<u64>,
    pub elevation_gain_m: Option<f64>,
    pub average_power: Option<u16>,
    pub average_heart_rate: Option<u16>,
    pub start_time: Option<DateTime<Utc>>,
    pub fallback_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SegmentMetrics {
    pub distance_km: f64,
    pub elapsed_seconds: Option<f64>,
    pub speed_kmh: Option<f64>,
    pub pace_min_per_km: Option<f64>,
}

pub fn derive(samples: Vec<Sample>, summary: SourceSummary, file_format: FileFormat) -> ParsedActivity {
    derive_on(samples, summary, file_format, Utc::now().date_naive())
}

/// Builds the final activity. `today` backs the date and title when the source
/// carries no time information at all.
pub fn derive_on(
    samples: Vec<Sample>,
    summary: SourceSummary,
    file_format: FileFormat,
    today: NaiveDate,
) -> ParsedActivity {
    let first_timestamp = samples.iter().find_map(|s| s.timestamp);
    let last_timestamp = samples.iter().rev().find_map(|s| s.timestamp);

    let start_time = summary.start_time.or(first_timestamp);
    let end_time = last_timestamp;

    let duration = summary.duration_seconds.or_else(|| match (first_timestamp, last_timestamp) {
        (Some(start), Some(end)) => Some((end - start).num_seconds().max(0) as u64),
        _ => None,
    });

    let distance_km = summary
        .distance_km
        .or_else(|| geo::track_distance(&samples))
        .unwrap_or(0.0);
    let elevation_gain_m = summary
        .elevation_gain_m
        .or_else(|| geo::elevation_gain(&samples))
        .unwrap_or(0.0);

    let average_power = summary
        .average_power
        .or_else(|| mean(samples.iter().filter_map(|s| s.power)));
    let average_heart_rate = summary
        .average_heart_rate
        .or_else(|| mean(samples.iter().filter_map(|s| s.heart_rate)));

    let label = summary
        .activity_type
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(capitalize);
    let known_type = label.as_deref().filter(|t| *t != "Unknown");

    let date = start_time
        .map(|t| t.date_naive())
        .or(summary.fallback_date)
        .unwrap_or(today);

    let title = match summary.name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => synthesize_title(known_type, duration, start_time, today),
    };

    ParsedActivity {
        activity_type: label.unwrap_or_else(|| "Unknown".to_string()),
        title,
        date,
        description: summary.description.filter(|d| !d.trim().is_empty()),
        distance_km,
        duration_seconds: duration.unwrap_or(0),
        elevation_gain_m,
        average_power,
        average_heart_rate,
        start_time,
        end_time,
        samples,
        file_format,
    }
}

pub fn synthesize_title(
    activity_type: Option<&str>,
    duration_seconds: Option<u64>,
    start_time: Option<DateTime<Utc>>,
    today: NaiveDate,
) -> String {
    match (activity_type, duration_seconds, start_time) {
        (Some(kind), Some(duration), _) => format!("{} - {}min", kind, duration / 60),
        (Some(kind), None, _) => format!("{} Activity", kind),
        (None, _, Some(start)) => format!("Activity on {}", start.format("%B %d, %Y")),
        (None, _, None) => format!("Activity {}", today.format("%Y-%m-%d")),
    }
}

/// Speed and pace between two consecutive samples. Both stay undefined when
/// elapsed time is not positive or no distance was covered.
pub fn segment_metrics(prev: &Sample, curr: &Sample) -> SegmentMetrics {
    let distance_km = geo::segment_distance(prev, curr);
    let elapsed_seconds = match (prev.timestamp, curr.timestamp) {
        (Some(a), Some(b)) => Some((b - a).num_milliseconds() as f64 / 1000.0),
        _ => None,
    };

    let (speed_kmh, pace_min_per_km) = match elapsed_seconds {
        Some(secs) if secs > 0.0 && distance_km > 0.0 => (
            Some((distance_km / secs) * 3600.0),
            Some((secs / 60.0) / distance_km),
        ),
        _ => (None, None),
    };

    SegmentMetrics {
        distance_km,
        elapsed_seconds,
        speed_kmh,
        pace_min_per_km,
    }
}

pub fn segments(samples: &[Sample]) -> Vec<SegmentMetrics> {
    samples
        .windows(2)
        .map(|pair| segment_metrics(&pair[0], &pair[1]))
        .collect()
}

fn mean(values: impl Iterator<Item = u16>) -> Option<u16> {
    let (sum, count) = values.fold((0u64, 0u64), |(sum, count), v| (sum + v as u64, count + 1));
    if count == 0 {
        None
    } else {
        Some((sum / count) as u16)
    }
}

fn capitalize(label: &str) -> String {
    let lower = label.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
