use serde::{Deserialize, Serialize};

use crate::error::ImportError;
use crate::pipeline::duplicate::find_duplicate;
use crate::pipeline::parse;
use crate::store::ActivityStore;
use crate::types::activity::{ActivitySummary, FileFormat, ParsedActivity};
use crate::types::import::{ActivityId, DuplicateCandidate, UserId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportedActivity {
    pub id: ActivityId,
    pub file_type: FileFormat,
    pub summary: ActivitySummary,
}

/// Detects the format from `filename` and decodes `bytes` into an activity.
/// Compressed payloads may not inflate past `max_bytes`.
pub fn decode_file(filename: &str, bytes: &[u8], max_bytes: u64) -> Result<ParsedActivity, ImportError> {
    let format = FileFormat::detect(filename);
    if format == FileFormat::Unsupported {
        return Err(ImportError::UnsupportedFormat(filename.to_string()));
    }

    tracing::info!("Parsing {} file: {} ({} bytes)", format.name(), filename, bytes.len());
    parse::parse(bytes, format, max_bytes)
}

/// Decode, reject re-imports of an activity already recorded for the same
/// day, then persist.
pub fn ingest(
    store: &dyn ActivityStore,
    user_id: UserId,
    filename: &str,
    bytes: &[u8],
    max_bytes: u64,
) -> Result<ImportedActivity, ImportError> {
    let activity = decode_file(filename, bytes, max_bytes)?;

    let candidate = DuplicateCandidate::from_activity(user_id, &activity);
    let existing = store.existing_same_day_activities(user_id, activity.date)?;
    if let Some(duplicate) = find_duplicate(&existing, &candidate) {
        return Err(ImportError::DuplicateDetected(duplicate.id));
    }

    let file_type = activity.file_format;
    let summary = ActivitySummary::from(&activity);
    let id = store.create_activity(user_id, activity)?;

    tracing::info!(
        "Imported {} for user {} as {} ({} samples, {:.2} km)",
        filename,
        user_id,
        id,
        summary.sample_count,
        summary.distance_km
    );

    Ok(ImportedActivity {
        id,
        file_type,
        summary,
    })
}
