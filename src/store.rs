use chrono::{DateTime, NaiveDate, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use crate::error::StoreError;
use crate::pipeline::duplicate::normalize_type_key;
use crate::types::activity::{ActivitySummary, ParsedActivity};
use crate::types::import::{ActivityId, ExistingActivity, UserId};

/// Persistence seam. `create_activity` must store the activity and its sample
/// batch atomically: either both land or neither does.
pub trait ActivityStore: Send + Sync {
    fn create_activity(&self, user_id: UserId, activity: ParsedActivity) -> Result<ActivityId, StoreError>;

    fn existing_same_day_activities(
        &self,
        user_id: UserId,
        date: NaiveDate,
    ) -> Result<Vec<ExistingActivity>, StoreError>;
}

#[derive(Debug, Clone)]
pub struct StoredActivity {
    pub id: ActivityId,
    pub activity_type_key: Option<String>,
    pub activity: ParsedActivity,
    pub created_at: DateTime<Utc>,
}

impl StoredActivity {
    fn existing(&self) -> ExistingActivity {
        ExistingActivity {
            id: self.id,
            start_time: self.activity.start_time,
            end_time: self.activity.end_time,
            activity_type_key: self.activity_type_key.clone(),
            sample_count: self.activity.samples.len(),
        }
    }
}

#[derive(Default)]
pub struct MemoryStore {
    activities: DashMap<UserId, Vec<StoredActivity>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Newest first, by date then insertion.
    pub fn list(&self, user_id: UserId) -> Vec<(ActivityId, ActivitySummary)> {
        let Some(entries) = self.activities.get(&user_id) else {
            return Vec::new();
        };
        let mut stored: Vec<&StoredActivity> = entries.iter().collect();
        stored.sort_by(|a, b| {
            b.activity
                .date
                .cmp(&a.activity.date)
                .then(b.created_at.cmp(&a.created_at))
        });
        stored
            .into_iter()
            .map(|s| (s.id, ActivitySummary::from(&s.activity)))
            .collect()
    }

    pub fn get(&self, user_id: UserId, activity_id: ActivityId) -> Option<ParsedActivity> {
        self.activities
            .get(&user_id)?
            .iter()
            .find(|s| s.id == activity_id)
            .map(|s| s.activity.clone())
    }

    pub fn count(&self, user_id: UserId) -> usize {
        self.activities.get(&user_id).map(|e| e.len()).unwrap_or(0)
    }
}

impl ActivityStore for MemoryStore {
    fn create_activity(&self, user_id: UserId, activity: ParsedActivity) -> Result<ActivityId, StoreError> {
        validate(&activity)?;

        let stored = StoredActivity {
            id: Uuid::new_v4(),
            activity_type_key: normalize_type_key(&activity.activity_type),
            activity,
            created_at: Utc::now(),
        };
        let id = stored.id;

        self.activities.entry(user_id).or_default().push(stored);
        Ok(id)
    }

    fn existing_same_day_activities(
        &self,
        user_id: UserId,
        date: NaiveDate,
    ) -> Result<Vec<ExistingActivity>, StoreError> {
        Ok(self
            .activities
            .get(&user_id)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|s| s.activity.date == date)
                    .map(StoredActivity::existing)
                    .collect()
            })
            .unwrap_or_default())
    }
}

fn validate(activity: &ParsedActivity) -> Result<(), StoreError> {
    if activity.title.trim().is_empty() {
        return Err(StoreError::Constraint("title can't be blank".to_string()));
    }
    if !activity.distance_km.is_finite() || activity.distance_km < 0.0 {
        return Err(StoreError::Constraint(format!(
            "distance must be a non-negative number, got {}",
            activity.distance_km
        )));
    }
    if !activity.elevation_gain_m.is_finite() || activity.elevation_gain_m < 0.0 {
        return Err(StoreError::Constraint(format!(
            "elevation must be a non-negative number, got {}",
            activity.elevation_gain_m
        )));
    }
    Ok(())
}
