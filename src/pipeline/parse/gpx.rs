use chrono::{DateTime, NaiveDateTime, Utc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::DecodeError;
use crate::pipeline::metrics::{self, SourceSummary};
use crate::pipeline::parse::Parser;
use crate::types::activity::{FileFormat, ParsedActivity, Sample};

pub struct GpxParser;

impl Parser for GpxParser {
    fn parse(&self, bytes: &[u8]) -> Result<ParsedActivity, DecodeError> {
        let mut reader = Reader::from_reader(bytes);
        reader.trim_text(true);

        let mut builder = TrackBuilder::default();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => builder.open(&e)?,
                Ok(Event::Empty(e)) => {
                    builder.open(&e)?;
                    builder.close()?;
                }
                Ok(Event::End(_)) => builder.close()?,
                Ok(Event::Text(e)) => {
                    let text = e
                        .unescape()
                        .map_err(|e| DecodeError::InvalidGpx(e.to_string()))?;
                    builder.text(&text);
                }
                Ok(Event::CData(e)) => {
                    let text = std::str::from_utf8(&e)
                        .map_err(|e| DecodeError::InvalidGpx(e.to_string()))?;
                    builder.text(text);
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(DecodeError::InvalidGpx(e.to_string())),
                _ => {}
            }
            buf.clear();
        }

        builder.finish()
    }
}

#[derive(Debug, Default, Clone, Copy)]
enum TrackState {
    #[default]
    Searching,
    Inside(usize),
    Done,
}

/// Collects the first `<trk>`: its metadata and every `<trkpt>` across all of
/// its `<trkseg>` children, flattened in document order.
#[derive(Default)]
struct TrackBuilder {
    stack: Vec<String>,
    track: TrackState,
    summary: SourceSummary,
    samples: Vec<Sample>,
    current: Option<Sample>,
    segments: usize,
}

impl TrackBuilder {
    fn open(&mut self, e: &BytesStart) -> Result<(), DecodeError> {
        let name = element_name(e.local_name().as_ref())?;
        let depth = self.stack.len();

        match self.track {
            TrackState::Searching if name == "trk" => self.track = TrackState::Inside(depth),
            TrackState::Inside(trk) => {
                if name == "trkseg" && depth == trk + 1 {
                    self.segments += 1;
                } else if name == "trkpt"
                    && depth == trk + 2
                    && self.stack.last().map(String::as_str) == Some("trkseg")
                {
                    self.current = Some(sample_from_attributes(e)?);
                }
            }
            _ => {}
        }

        self.stack.push(name);
        Ok(())
    }

    fn close(&mut self) -> Result<(), DecodeError> {
        let name = self
            .stack
            .pop()
            .ok_or_else(|| DecodeError::InvalidGpx("unexpected closing tag".to_string()))?;

        if let TrackState::Inside(trk) = self.track {
            let depth = self.stack.len();
            if name == "trkpt" && depth == trk + 2 {
                if let Some(sample) = self.current.take() {
                    self.samples.push(sample);
                }
            } else if name == "trk" && depth == trk {
                self.track = TrackState::Done;
            }
        }
        Ok(())
    }

    fn text(&mut self, text: &str) {
        let TrackState::Inside(trk) = self.track else {
            return;
        };
        let Some(element) = self.stack.last() else {
            return;
        };
        let text = text.trim();

        if let Some(sample) = self.current.as_mut() {
            match element.as_str() {
                "ele" => sample.elevation = text.parse().ok(),
                "time" => sample.timestamp = parse_time(text),
                "hr" => sample.heart_rate = text.parse().ok(),
                "cad" => sample.cadence = text.parse().ok(),
                "power" => sample.power = text.parse().ok(),
                "speed" => sample.speed = text.parse().ok(),
                _ => {}
            }
        } else if self.stack.len() == trk + 2 {
            match element.as_str() {
                "name" => self.summary.name = Some(text.to_string()),
                "desc" => self.summary.description = Some(text.to_string()),
                "type" => self.summary.activity_type = Some(text.to_lowercase()),
                _ => {}
            }
        }
    }

    fn finish(self) -> Result<ParsedActivity, DecodeError> {
        if !self.stack.is_empty() {
            return Err(DecodeError::InvalidGpx(format!(
                "unexpected end of document inside <{}>",
                self.stack.last().map(String::as_str).unwrap_or_default()
            )));
        }
        if matches!(self.track, TrackState::Searching) {
            return Err(DecodeError::MissingTrack);
        }

        tracing::info!(
            "Parsed GPX track {:?}: {} segments, {} samples",
            self.summary.name,
            self.segments,
            self.samples.len()
        );

        Ok(metrics::derive(self.samples, self.summary, FileFormat::Gpx))
    }
}

fn sample_from_attributes(e: &BytesStart) -> Result<Sample, DecodeError> {
    let mut sample = Sample::default();

    for attr in e.attributes() {
        let attr = attr.map_err(|e| DecodeError::InvalidGpx(e.to_string()))?;
        let value = std::str::from_utf8(&attr.value)
            .map_err(|e| DecodeError::InvalidGpx(e.to_string()))?;

        match attr.key.local_name().as_ref() {
            b"lat" => sample.latitude = value.trim().parse().ok(),
            b"lon" => sample.longitude = value.trim().parse().ok(),
            _ => {}
        }
    }

    Ok(sample)
}

/// `xsd:dateTime` with or without an offset; offset-less times are read as UTC.
fn parse_time(text: &str) -> Option<DateTime<Utc>> {
    text.parse::<DateTime<Utc>>()
        .ok()
        .or_else(|| text.parse::<NaiveDateTime>().ok().map(|t| t.and_utc()))
}

fn element_name(raw: &[u8]) -> Result<String, DecodeError> {
    std::str::from_utf8(raw)
        .map(str::to_string)
        .map_err(|e| DecodeError::InvalidGpx(e.to_string()))
}
