use std::io::Read;

use flate2::read::GzDecoder;

use crate::error::DecodeError;
use crate::pipeline::parse::{FitParser, Parser};
use crate::types::activity::{FileFormat, ParsedActivity};

pub const DEFAULT_MAX_INFLATED_BYTES: u64 = 25 * 1024 * 1024;

/// Gunzips a FIT payload and hands it to [`FitParser`]. Inflation stops past
/// `max_inflated_bytes` and the payload is rejected.
pub struct GzipFitParser {
    pub max_inflated_bytes: u64,
}

impl Default for GzipFitParser {
    fn default() -> Self {
        Self {
            max_inflated_bytes: DEFAULT_MAX_INFLATED_BYTES,
        }
    }
}

impl Parser for GzipFitParser {
    fn parse(&self, bytes: &[u8]) -> Result<ParsedActivity, DecodeError> {
        let limit = self.max_inflated_bytes;
        let mut decoder = GzDecoder::new(bytes).take(limit.saturating_add(1));
        let mut fit = Vec::new();
        decoder
            .read_to_end(&mut fit)
            .map_err(|e| DecodeError::InvalidGzip(e.to_string()))?;

        if fit.len() as u64 > limit {
            return Err(DecodeError::InvalidGzip(format!(
                "payload inflates to more than {} bytes",
                limit
            )));
        }

        tracing::debug!("Decompressed {} gzip bytes into {} FIT bytes", bytes.len(), fit.len());

        let mut parsed = FitParser.parse(&fit)?;
        parsed.file_format = FileFormat::FitGzip;
        Ok(parsed)
    }
}
