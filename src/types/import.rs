use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::pipeline::duplicate::normalize_type_key;
use crate::types::activity::ParsedActivity;

pub type UserId = Uuid;
pub type ActivityId = Uuid;

/// Fields compared when deciding whether an import is a re-import.
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateCandidate {
    pub user_id: UserId,
    pub date: NaiveDate,
    pub activity_type_key: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub sample_count: usize,
}

impl DuplicateCandidate {
    pub fn from_activity(user_id: UserId, activity: &ParsedActivity) -> Self {
        Self {
            user_id,
            date: activity.date,
            activity_type_key: normalize_type_key(&activity.activity_type),
            start_time: activity.start_time,
            end_time: activity.end_time,
            sample_count: activity.samples.len(),
        }
    }
}

/// What the storage layer reports about an already-recorded activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExistingActivity {
    pub id: ActivityId,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub activity_type_key: Option<String>,
    pub sample_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImportOutcome {
    Created(ActivityId),
    Skipped(String),
    Failed(String),
}

/// Created/skipped/failed counters for one archive plus every per-entry message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchTally {
    pub created: usize,
    pub skipped: usize,
    pub failed: usize,
    pub messages: Vec<String>,
}

impl BatchTally {
    pub fn record(&mut self, entry_name: &str, outcome: ImportOutcome) {
        match outcome {
            ImportOutcome::Created(_) => self.created += 1,
            ImportOutcome::Skipped(reason) => {
                self.skipped += 1;
                self.messages.push(format!("{}: {}", entry_name, reason));
            }
            ImportOutcome::Failed(reason) => {
                self.failed += 1;
                self.messages.push(format!("{}: {}", entry_name, reason));
            }
        }
    }

    pub fn total(&self) -> usize {
        self.created + self.skipped + self.failed
    }

    pub fn preview(&self, limit: usize) -> &[String] {
        &self.messages[..self.messages.len().min(limit)]
    }
}
