use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One recorded instant. A sample missing either coordinate is not geolocated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: Option<DateTime<Utc>>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub elevation: Option<f64>,
    pub heart_rate: Option<u16>,
    pub cadence: Option<u16>,
    pub power: Option<u16>,
    pub speed: Option<f64>,
}

impl Sample {
    pub fn position(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileFormat {
    Gpx,
    Fit,
    FitGzip,
    Unsupported,
}

impl FileFormat {
    /// Classifies a filename by extension. `.gz` only counts as FIT when the
    /// name left after stripping it ends in `.fit`.
    pub fn detect(filename: &str) -> Self {
        let lower = filename.to_lowercase();
        let Some((stem, ext)) = lower.rsplit_once('.') else {
            return FileFormat::Unsupported;
        };
        match ext {
            "gpx" => FileFormat::Gpx,
            "fit" => FileFormat::Fit,
            "gz" if stem.ends_with(".fit") => FileFormat::FitGzip,
            _ => FileFormat::Unsupported,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FileFormat::Gpx => "gpx",
            FileFormat::Fit => "fit",
            FileFormat::FitGzip => "fit.gz",
            FileFormat::Unsupported => "unsupported",
        }
    }
}

/// Normalized output of one decoded source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedActivity {
    pub activity_type: String,
    pub title: String,
    pub date: NaiveDate,
    pub description: Option<String>,
    pub distance_km: f64,
    pub duration_seconds: u64,
    pub elevation_gain_m: f64,
    pub average_power: Option<u16>,
    pub average_heart_rate: Option<u16>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub samples: Vec<Sample>,
    pub file_format: FileFormat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivitySummary {
    pub activity_type: String,
    pub title: String,
    pub date: NaiveDate,
    pub distance_km: f64,
    pub duration_seconds: u64,
    pub elevation_gain_m: f64,
    pub average_power: Option<u16>,
    pub average_heart_rate: Option<u16>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub sample_count: usize,
}

impl From<&ParsedActivity> for ActivitySummary {
    fn from(activity: &ParsedActivity) -> Self {
        Self {
            activity_type: activity.activity_type.clone(),
            title: activity.title.clone(),
            date: activity.date,
            distance_km: activity.distance_km,
            duration_seconds: activity.duration_seconds,
            elevation_gain_m: activity.elevation_gain_m,
            average_power: activity.average_power,
            average_heart_rate: activity.average_heart_rate,
            start_time: activity.start_time,
            end_time: activity.end_time,
            sample_count: activity.samples.len(),
        }
    }
}
