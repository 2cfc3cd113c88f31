#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, TimeZone, Utc};
use zip::write::SimpleFileOptions;

const FIT_EPOCH_OFFSET: i64 = 631_065_600;

const CRC_TABLE: [u16; 16] = [
    0x0000, 0xCC01, 0xD801, 0x1400, 0xF001, 0x3C00, 0x2800, 0xE401, 0xA001, 0x6C00, 0x7800,
    0xB401, 0x5000, 0x9C01, 0x8801, 0x4400,
];

pub fn at(secs_after_start: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 4, 9, 30, 0).unwrap() + chrono::Duration::seconds(secs_after_start)
}

pub fn gpx_three_points() -> String {
    r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test" xmlns="http://www.topografix.com/GPX/1/1">
  <trk><name>Equator Run</name><type>Running</type><trkseg>
    <trkpt lat="0" lon="0"><ele>0</ele><time>2024-05-04T09:30:00Z</time></trkpt>
    <trkpt lat="0" lon="1"><ele>0</ele><time>2024-05-04T09:31:00Z</time></trkpt>
    <trkpt lat="0" lon="2"><ele>0</ele><time>2024-05-04T09:32:00Z</time></trkpt>
  </trkseg></trk>
</gpx>"#
        .to_string()
}

pub fn gpx_ride(start_minute: u32) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test">
  <trk><name>Morning Ride {m}</name><type>cycling</type><trkseg>
    <trkpt lat="52.5200" lon="13.4050"><ele>34.0</ele><time>2024-05-04T07:{m:02}:00Z</time></trkpt>
    <trkpt lat="52.5205" lon="13.4060"><ele>39.0</ele><time>2024-05-04T07:{m:02}:10Z</time></trkpt>
    <trkpt lat="52.5210" lon="13.4070"><ele>37.0</ele><time>2024-05-04T07:{m:02}:20Z</time></trkpt>
  </trkseg></trk>
</gpx>"#,
        m = start_minute
    )
}

#[derive(Clone, Copy)]
pub enum FitField {
    Enum(u8, u8),
    UInt8(u8, u8),
    UInt16(u8, u16),
    SInt32(u8, i32),
    UInt32(u8, u32),
}

impl FitField {
    fn definition(self) -> [u8; 3] {
        match self {
            FitField::Enum(num, _) => [num, 1, 0x00],
            FitField::UInt8(num, _) => [num, 1, 0x02],
            FitField::UInt16(num, _) => [num, 2, 0x84],
            FitField::SInt32(num, _) => [num, 4, 0x85],
            FitField::UInt32(num, _) => [num, 4, 0x86],
        }
    }

    fn write(self, out: &mut Vec<u8>) {
        match self {
            FitField::Enum(_, v) | FitField::UInt8(_, v) => out.push(v),
            FitField::UInt16(_, v) => out.extend_from_slice(&v.to_le_bytes()),
            FitField::SInt32(_, v) => out.extend_from_slice(&v.to_le_bytes()),
            FitField::UInt32(_, v) => out.extend_from_slice(&v.to_le_bytes()),
        }
    }
}

/// Minimal FIT writer: every message carries its own definition on local type 0.
#[derive(Default)]
pub struct FitBuilder {
    data: Vec<u8>,
}

impl FitBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn message(mut self, global: u16, fields: &[FitField]) -> Self {
        self.data.push(0x40);
        self.data.push(0);
        self.data.push(0);
        self.data.extend_from_slice(&global.to_le_bytes());
        self.data.push(fields.len() as u8);
        for field in fields {
            self.data.extend_from_slice(&field.definition());
        }
        self.data.push(0x00);
        for field in fields {
            field.write(&mut self.data);
        }
        self
    }

    pub fn file_id(self, created: DateTime<Utc>) -> Self {
        self.message(
            0,
            &[
                FitField::Enum(0, 4),
                FitField::UInt16(1, 1),
                FitField::UInt32(4, fit_time(created)),
            ],
        )
    }

    pub fn record(self, time: DateTime<Utc>, position: Option<(f64, f64)>, altitude_m: f64, heart_rate: u8) -> Self {
        let mut fields = vec![FitField::UInt32(253, fit_time(time))];
        if let Some((lat, lon)) = position {
            fields.push(FitField::SInt32(0, semicircles(lat)));
            fields.push(FitField::SInt32(1, semicircles(lon)));
        }
        fields.push(FitField::UInt16(2, ((altitude_m + 500.0) * 5.0).round() as u16));
        fields.push(FitField::UInt8(3, heart_rate));
        self.message(20, &fields)
    }

    pub fn session(self, start: DateTime<Utc>, sport: u8, elapsed_s: u32, distance_m: u32, ascent_m: u16) -> Self {
        self.message(
            18,
            &[
                FitField::UInt32(253, fit_time(start) + elapsed_s),
                FitField::UInt32(2, fit_time(start)),
                FitField::Enum(5, sport),
                FitField::UInt32(7, elapsed_s * 1000),
                FitField::UInt32(9, distance_m * 100),
                FitField::UInt16(22, ascent_m),
                FitField::UInt8(16, 150),
                FitField::UInt16(20, 210),
            ],
        )
    }

    pub fn activity(self, time: DateTime<Utc>) -> Self {
        self.message(34, &[FitField::UInt32(253, fit_time(time))])
    }

    pub fn build(self) -> Vec<u8> {
        let mut out = vec![14, 0x20];
        out.extend_from_slice(&2132u16.to_le_bytes());
        out.extend_from_slice(&(self.data.len() as u32).to_le_bytes());
        out.extend_from_slice(b".FIT");
        let header_crc = fit_crc(&out);
        out.extend_from_slice(&header_crc.to_le_bytes());
        out.extend_from_slice(&self.data);
        let file_crc = fit_crc(&out);
        out.extend_from_slice(&file_crc.to_le_bytes());
        out
    }
}

/// Three geolocated records plus one without position, and a running session.
pub fn fit_run() -> Vec<u8> {
    FitBuilder::new()
        .file_id(at(-60))
        .record(at(0), Some((0.0, 0.0)), 10.0, 120)
        .record(at(30), None, 10.0, 125)
        .record(at(60), Some((0.0, 0.01)), 15.0, 130)
        .record(at(120), Some((0.0, 0.02)), 12.0, 140)
        .session(at(0), 1, 125, 2300, 7)
        .activity(at(125))
        .build()
}

pub fn fit_time(t: DateTime<Utc>) -> u32 {
    (t.timestamp() - FIT_EPOCH_OFFSET) as u32
}

fn semicircles(degrees: f64) -> i32 {
    (degrees * (2_147_483_648.0 / 180.0)).round() as i32
}

fn fit_crc(bytes: &[u8]) -> u16 {
    let mut crc = 0u16;
    for &byte in bytes {
        let mut tmp = CRC_TABLE[(crc & 0xF) as usize];
        crc = (crc >> 4) & 0x0FFF;
        crc = crc ^ tmp ^ CRC_TABLE[(byte & 0xF) as usize];
        tmp = CRC_TABLE[(crc & 0xF) as usize];
        crc = (crc >> 4) & 0x0FFF;
        crc = crc ^ tmp ^ CRC_TABLE[((byte >> 4) & 0xF) as usize];
    }
    crc
}

pub fn gzip(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(bytes).expect("gzip write");
    encoder.finish().expect("gzip finish")
}

pub fn write_zip(path: &Path, entries: &[(&str, Vec<u8>)]) {
    let file = File::create(path).expect("create zip");
    let mut writer = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    for (name, bytes) in entries {
        if name.ends_with('/') {
            writer.add_directory(*name, options).expect("zip dir");
        } else {
            writer.start_file(*name, options).expect("zip entry");
            writer.write_all(bytes).expect("zip write");
        }
    }
    writer.finish().expect("zip finish");
}
