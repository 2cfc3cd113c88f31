use std::sync::Arc;

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::admission::{AdmissionGuard, JobAdmission};
use crate::error::{AppError, BulkError};
use crate::pipeline::bulk::BulkJob;
use crate::routes::read_file_field;
use crate::state::AppState;
use crate::types::import::UserId;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/users/:user_id/activities/bulk", post(bulk_upload))
        .route("/api/users/:user_id/activities/bulk/status", get(bulk_status))
}

#[derive(Serialize, Deserialize)]
pub struct BulkStarted {
    pub status: String,
    pub archive: String,
}

#[derive(Serialize, Deserialize)]
pub struct BulkStatus {
    pub in_progress: bool,
    pub last_result: Option<BulkResult>,
}

#[derive(Serialize, Deserialize)]
pub struct BulkResult {
    pub created: usize,
    pub skipped: usize,
    pub failed: usize,
    pub errors: Vec<String>,
    pub total_errors: usize,
}

async fn bulk_upload(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<BulkStarted>), AppError> {
    let admission: Arc<dyn JobAdmission> = state.admission.clone();
    let guard = AdmissionGuard::acquire(admission, user_id).ok_or(BulkError::AlreadyRunning)?;

    let (filename, bytes) = read_file_field(multipart).await?;
    if !filename.to_lowercase().ends_with(".zip") {
        return Err(AppError::BadRequest("Bulk uploads must be a ZIP archive".to_string()));
    }

    tokio::fs::create_dir_all(&state.config.upload_dir)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to create upload directory: {}", e)))?;
    let archive_path = state
        .config
        .upload_dir
        .join(format!("bulk_upload_{}_{}.zip", user_id, Uuid::new_v4()));
    tokio::fs::write(&archive_path, &bytes)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to save archive: {}", e)))?;

    tracing::info!(
        "Bulk upload {} ({} bytes) queued for user {}",
        filename,
        bytes.len(),
        user_id
    );

    let job_state = state.clone();
    tokio::task::spawn_blocking(move || {
        let config = &job_state.config;
        let job = BulkJob {
            store: &*job_state.store,
            scratch_root: &config.scratch_dir,
            max_entry_bytes: config.max_file_size as u64,
            preview_limit: config.tally_preview_limit,
        };
        let tally = job.run_admitted(&guard, &archive_path);
        job_state.record_tally(user_id, tally);
        drop(guard);
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(BulkStarted {
            status: "started".to_string(),
            archive: filename,
        }),
    ))
}

async fn bulk_status(State(state): State<AppState>, Path(user_id): Path<UserId>) -> Json<BulkStatus> {
    let limit = state.config.tally_preview_limit;
    let last_result = state.last_tally(user_id).map(|tally| BulkResult {
        created: tally.created,
        skipped: tally.skipped,
        failed: tally.failed,
        errors: tally.preview(limit).to_vec(),
        total_errors: tally.messages.len(),
    });

    Json(BulkStatus {
        in_progress: state.admission.is_active(user_id),
        last_result,
    })
}
