use std::collections::HashSet;

use chrono::{DateTime, Utc};
use fitparser::de::{from_bytes_with_options, DecodeOption};
use fitparser::profile::MesgNum;
use fitparser::{FitDataRecord, Value};

use crate::error::DecodeError;
use crate::pipeline::metrics::{self, SourceSummary};
use crate::pipeline::parse::Parser;
use crate::types::activity::{FileFormat, ParsedActivity, Sample};

pub struct FitParser;

impl Parser for FitParser {
    fn parse(&self, bytes: &[u8]) -> Result<ParsedActivity, DecodeError> {
        let options: HashSet<DecodeOption> = [DecodeOption::ReturnNumericEnumValues]
            .into_iter()
            .collect();

        let records = from_bytes_with_options(bytes, &options)
            .map_err(|e| DecodeError::InvalidFit(format!("Failed to parse FIT file: {}", e)))?;

        let state = records
            .into_iter()
            .map(FitMessage::from)
            .fold(DecodeState::default(), DecodeState::apply);

        tracing::info!(
            "Parsed FIT file: {} messages, {} samples kept, {} without position, session: {}",
            state.messages,
            state.samples.len(),
            state.discarded,
            state.session.is_some()
        );

        Ok(state.finish())
    }
}

/// Message kinds the importer reads. Everything else decodes to `Other`.
#[derive(Debug)]
enum FitMessage {
    FileId { time_created: Option<DateTime<Utc>> },
    Session(Session),
    Record(Sample),
    Activity { timestamp: Option<DateTime<Utc>> },
    Other,
}

#[derive(Debug, Default)]
struct Session {
    sport: Option<String>,
    start_time: Option<DateTime<Utc>>,
    total_elapsed_time: Option<f64>,
    total_distance: Option<f64>,
    total_ascent: Option<f64>,
    avg_power: Option<u16>,
    avg_heart_rate: Option<u16>,
}

impl From<FitDataRecord> for FitMessage {
    fn from(record: FitDataRecord) -> Self {
        match record.kind() {
            MesgNum::FileId => FitMessage::FileId {
                time_created: timestamp_field(&record, "time_created"),
            },
            MesgNum::Activity => FitMessage::Activity {
                timestamp: timestamp_field(&record, "timestamp"),
            },
            MesgNum::Session => FitMessage::Session(session_from(&record)),
            MesgNum::Record => FitMessage::Record(sample_from(&record)),
            _ => FitMessage::Other,
        }
    }
}

#[derive(Default)]
struct DecodeState {
    session: Option<Session>,
    samples: Vec<Sample>,
    activity_timestamp: Option<DateTime<Utc>>,
    file_created: Option<DateTime<Utc>>,
    discarded: usize,
    messages: usize,
}

impl DecodeState {
    fn apply(mut self, message: FitMessage) -> Self {
        self.messages += 1;
        match message {
            FitMessage::FileId { time_created } => {
                self.file_created = self.file_created.or(time_created);
            }
            FitMessage::Activity { timestamp } => {
                self.activity_timestamp = self.activity_timestamp.or(timestamp);
            }
            FitMessage::Session(next) => {
                // later sessions overwrite the fields they carry
                let current = self.session.get_or_insert_with(Session::default);
                current.sport = next.sport.or(current.sport.take());
                current.start_time = current.start_time.or(next.start_time);
                current.total_elapsed_time = next.total_elapsed_time.or(current.total_elapsed_time);
                current.total_distance = next.total_distance.or(current.total_distance);
                current.total_ascent = next.total_ascent.or(current.total_ascent);
                current.avg_power = next.avg_power.or(current.avg_power);
                current.avg_heart_rate = next.avg_heart_rate.or(current.avg_heart_rate);
            }
            FitMessage::Record(sample) => {
                if sample.position().is_some() {
                    self.samples.push(sample);
                } else {
                    self.discarded += 1;
                }
            }
            FitMessage::Other => {}
        }
        self
    }

    fn finish(self) -> ParsedActivity {
        let session = self.session.unwrap_or_default();

        let summary = SourceSummary {
            activity_type: session.sport,
            distance_km: session.total_distance.map(|meters| meters / 1000.0),
            duration_seconds: session
                .total_elapsed_time
                .filter(|secs| *secs >= 0.0)
                .map(|secs| secs.round() as u64),
            elevation_gain_m: session.total_ascent,
            average_power: session.avg_power,
            average_heart_rate: session.avg_heart_rate,
            start_time: session.start_time,
            fallback_date: self
                .activity_timestamp
                .or(self.file_created)
                .map(|t| t.date_naive()),
            ..SourceSummary::default()
        };

        metrics::derive(self.samples, summary, FileFormat::Fit)
    }
}

fn session_from(record: &FitDataRecord) -> Session {
    let mut session = Session::default();

    for field in record.fields() {
        match field.name() {
            "sport" => session.sport = sport_from(field.value()),
            "start_time" => session.start_time = to_utc(field.value()),
            "total_elapsed_time" => session.total_elapsed_time = fit_value_to_f64(field.value()),
            "total_distance" => session.total_distance = fit_value_to_f64(field.value()),
            "total_ascent" => session.total_ascent = fit_value_to_f64(field.value()),
            "avg_power" => session.avg_power = fit_value_to_u16(field.value()),
            "avg_heart_rate" => session.avg_heart_rate = fit_value_to_u16(field.value()),
            _ => {}
        }
    }

    session
}

fn sample_from(record: &FitDataRecord) -> Sample {
    let mut sample = Sample::default();

    for field in record.fields() {
        match field.name() {
            "timestamp" => sample.timestamp = to_utc(field.value()),
            "position_lat" => sample.latitude = semicircles_to_degrees(field.value()),
            "position_long" => sample.longitude = semicircles_to_degrees(field.value()),
            "enhanced_altitude" => sample.elevation = fit_value_to_f64(field.value()),
            "altitude" => {
                if sample.elevation.is_none() {
                    sample.elevation = fit_value_to_f64(field.value());
                }
            }
            "enhanced_speed" => sample.speed = fit_value_to_f64(field.value()),
            "speed" => {
                if sample.speed.is_none() {
                    sample.speed = fit_value_to_f64(field.value());
                }
            }
            "heart_rate" => sample.heart_rate = fit_value_to_u16(field.value()),
            "cadence" => sample.cadence = fit_value_to_u16(field.value()),
            "power" => sample.power = fit_value_to_u16(field.value()),
            _ => {}
        }
    }

    sample
}

fn timestamp_field(record: &FitDataRecord, name: &str) -> Option<DateTime<Utc>> {
    record
        .fields()
        .iter()
        .find(|field| field.name() == name)
        .and_then(|field| to_utc(field.value()))
}

fn to_utc(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Timestamp(ts) => Some(ts.with_timezone(&Utc)),
        _ => None,
    }
}

fn sport_from(value: &Value) -> Option<String> {
    match value {
        Value::String(name) => Some(name.clone()),
        other => fit_value_to_f64(other).map(|code| sport_label(code as u8).to_string()),
    }
}

/// FIT `sport` enum code to its activity-type label.
pub fn sport_label(code: u8) -> &'static str {
    match code {
        0 => "generic",
        1 => "running",
        2 => "cycling",
        3 => "transition",
        4 => "fitness_equipment",
        5 => "swimming",
        6 => "basketball",
        7 => "soccer",
        8 => "tennis",
        9 => "american_football",
        10 => "training",
        11 => "walking",
        12 => "cross_country_skiing",
        13 => "alpine_skiing",
        14 => "snowboarding",
        15 => "rowing",
        16 => "mountaineering",
        17 => "hiking",
        18 => "multisport",
        19 => "paddling",
        20 => "flying",
        21 => "e_biking",
        22 => "motorcycling",
        23 => "boating",
        24 => "driving",
        25 => "golf",
        26 => "hang_gliding",
        27 => "horseback_riding",
        28 => "hunting",
        29 => "fishing",
        30 => "inline_skating",
        31 => "rock_climbing",
        32 => "sailing",
        33 => "ice_skating",
        34 => "sky_diving",
        35 => "snowshoeing",
        36 => "snowmobiling",
        37 => "stand_up_paddleboarding",
        38 => "surfing",
        39 => "wakeboarding",
        40 => "water_skiing",
        41 => "kayaking",
        42 => "rafting",
        43 => "windsurfing",
        44 => "kitesurfing",
        45 => "tactical",
        46 => "jumpmaster",
        47 => "boxing",
        48 => "floor_climbing",
        53 => "all",
        _ => "unknown",
    }
}

fn semicircles_to_degrees(value: &Value) -> Option<f64> {
    let semicircles = match value {
        Value::SInt32(val) => *val as f64,
        other => fit_value_to_f64(other)?,
    };
    Some(semicircles * (180.0 / 2_147_483_648.0))
}

fn fit_value_to_u16(value: &Value) -> Option<u16> {
    fit_value_to_f64(value)
        .filter(|v| *v >= 0.0 && *v <= u16::MAX as f64)
        .map(|v| v.round() as u16)
}

fn fit_value_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Float32(v) => Some(*v as f64),
        Value::Float64(v) => Some(*v),
        Value::SInt8(v) => Some(*v as f64),
        Value::UInt8(v) => Some(*v as f64),
        Value::UInt8z(v) => Some(*v as f64),
        Value::Byte(v) => Some(*v as f64),
        Value::Enum(v) => Some(*v as f64),
        Value::SInt16(v) => Some(*v as f64),
        Value::UInt16(v) => Some(*v as f64),
        Value::UInt16z(v) => Some(*v as f64),
        Value::SInt32(v) => Some(*v as f64),
        Value::UInt32(v) => Some(*v as f64),
        Value::UInt32z(v) => Some(*v as f64),
        Value::SInt64(v) => Some(*v as f64),
        Value::UInt64(v) => Some(*v as f64),
        Value::UInt64z(v) => Some(*v as f64),
        Value::Array(values) => values.iter().find_map(fit_value_to_f64),
        _ => None,
    }
}
