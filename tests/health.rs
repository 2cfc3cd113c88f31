use std::time::Duration;

use activity_importer::{config::Config, routes, state::AppState};
use axum::{body::to_bytes, http::Request, Router};
use tower::ServiceExt;

fn app() -> Router {
    let root = std::env::temp_dir().join("activity-importer-health-test");
    let config = Config {
        port: 0,
        max_file_size: 1024 * 1024,
        upload_dir: root.join("uploads"),
        scratch_dir: root.join("scratch"),
        bulk_job_ttl: Duration::from_secs(60),
        tally_preview_limit: 10,
    };
    let state = AppState::new(config);
    Router::new()
        .merge(routes::health::router())
        .merge(routes::upload::router())
        .with_state(state)
}

#[tokio::test]
async fn health_returns_ok() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/health")
                .method("GET")
                .body(axum::body::Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), axum::http::StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let text = String::from_utf8(body.to_vec()).expect("utf8");
    assert!(text.contains("\"status\":\"ok\""));
    assert!(text.contains("\"service\":\"activity-importer\""));
}
