use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::pipeline::metrics;
use crate::state::AppState;
use crate::types::activity::{ActivitySummary, Sample};
use crate::types::import::{ActivityId, UserId};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/users/:user_id/activities", get(list))
        .route("/api/users/:user_id/activities/:activity_id/chart", get(chart))
}

#[derive(Serialize, Deserialize)]
pub struct ActivityListItem {
    pub id: ActivityId,
    #[serde(flatten)]
    pub summary: ActivitySummary,
}

/// Per-sample series for charting. Speed and pace describe the segment ending
/// at each sample, so the first entry is always `None`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ChartData {
    pub cumulative_distance_km: Vec<f64>,
    pub elapsed_seconds: Vec<Option<f64>>,
    pub elevation: Vec<Option<f64>>,
    pub heart_rate: Vec<Option<u16>>,
    pub power: Vec<Option<u16>>,
    pub cadence: Vec<Option<u16>>,
    pub speed_kmh: Vec<Option<f64>>,
    pub pace_min_per_km: Vec<Option<f64>>,
}

async fn list(State(state): State<AppState>, Path(user_id): Path<UserId>) -> Json<Vec<ActivityListItem>> {
    let items = state
        .store
        .list(user_id)
        .into_iter()
        .map(|(id, summary)| ActivityListItem { id, summary })
        .collect();
    Json(items)
}

async fn chart(
    State(state): State<AppState>,
    Path((user_id, activity_id)): Path<(UserId, ActivityId)>,
) -> Result<Json<ChartData>, AppError> {
    let activity = state
        .store
        .get(user_id, activity_id)
        .ok_or_else(|| AppError::NotFound(activity_id.to_string()))?;

    Ok(Json(chart_data(&activity.samples)))
}

pub fn chart_data(samples: &[Sample]) -> ChartData {
    let points: Vec<&Sample> = samples.iter().filter(|s| s.position().is_some()).collect();
    let mut data = ChartData::default();
    let Some(first) = points.first() else {
        return data;
    };

    let mut total_km = 0.0;
    let mut prev: Option<&Sample> = None;

    for point in &points {
        let (speed, pace) = match prev {
            Some(prev) => {
                let segment = metrics::segment_metrics(prev, point);
                total_km += segment.distance_km;
                (segment.speed_kmh, segment.pace_min_per_km)
            }
            None => (None, None),
        };

        data.cumulative_distance_km.push(total_km);
        data.elapsed_seconds.push(match (first.timestamp, point.timestamp) {
            (Some(start), Some(t)) => Some((t - start).num_milliseconds() as f64 / 1000.0),
            _ => None,
        });
        data.elevation.push(point.elevation);
        data.heart_rate.push(point.heart_rate);
        data.power.push(point.power);
        data.cadence.push(point.cadence);
        data.speed_kmh.push(speed);
        data.pace_min_per_km.push(pace);

        prev = Some(*point);
    }

    data
}
