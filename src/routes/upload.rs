use axum::extract::{Multipart, Path, State};
use axum::{routing::post, Json, Router};

use crate::error::AppError;
use crate::pipeline::import::{self, ImportedActivity};
use crate::routes::read_file_field;
use crate::state::AppState;
use crate::types::import::UserId;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/users/:user_id/activities/upload", post(upload))
}

async fn upload(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    multipart: Multipart,
) -> Result<Json<ImportedActivity>, AppError> {
    let (filename, bytes) = read_file_field(multipart).await?;

    let store = state.store.clone();
    let max_bytes = state.config.max_file_size as u64;
    let imported = tokio::task::spawn_blocking(move || import::ingest(&*store, user_id, &filename, &bytes, max_bytes))
        .await
        .map_err(|e| AppError::Internal(format!("Import task failed: {}", e)))??;

    Ok(Json(imported))
}
