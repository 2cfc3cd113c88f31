mod fit;
mod gpx;
mod gzip;

pub use fit::{sport_label, FitParser};
pub use gpx::GpxParser;
pub use gzip::{GzipFitParser, DEFAULT_MAX_INFLATED_BYTES};

use crate::error::{DecodeError, ImportError};
use crate::types::activity::{FileFormat, ParsedActivity};

pub trait Parser {
    fn parse(&self, bytes: &[u8]) -> Result<ParsedActivity, DecodeError>;
}

/// `max_inflated_bytes` bounds what a compressed payload may expand to.
pub fn parse(bytes: &[u8], format: FileFormat, max_inflated_bytes: u64) -> Result<ParsedActivity, ImportError> {
    let parsed = match format {
        FileFormat::Gpx => GpxParser.parse(bytes)?,
        FileFormat::Fit => FitParser.parse(bytes)?,
        FileFormat::FitGzip => GzipFitParser { max_inflated_bytes }.parse(bytes)?,
        FileFormat::Unsupported => {
            return Err(ImportError::UnsupportedFormat(format.name().to_string()))
        }
    };
    Ok(parsed)
}
