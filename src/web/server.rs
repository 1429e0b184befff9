use super::state::AppState;
use crate::backup::{execute, wait_for_shutdown, BackupKind};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

pub const BACKUP_SUCCESS_BODY: &str = "Backup completed successfully";

#[derive(Serialize)]
struct ApiResponse<T: Serialize> {
    success: bool,
    data: T,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/backup", get(backup_handler).post(backup_handler))
        .route("/api/status", get(status_handler))
        .route("/api/history", get(history_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server(state: Arc<AppState>, port: u16, shutdown: Arc<AtomicUsize>) {
    let app = router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!("Listening for backup requests on http://localhost:{}/api/backup", port);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return;
        }
    };

    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move { wait_for_shutdown(&shutdown).await });
    if let Err(e) = server.await {
        error!("Web server error: {}", e);
    }
    info!("Web server stopped");
}

/// Runs the active-databases backup; the error text goes back verbatim as a 400.
async fn backup_handler(State(state): State<Arc<AppState>>) -> Response {
    match execute(&state, "http", BackupKind::Active).await {
        Ok(_) => (StatusCode::OK, BACKUP_SUCCESS_BODY).into_response(),
        Err(e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    }
}

async fn status_handler(State(state): State<Arc<AppState>>) -> Response {
    let schedules = state.schedules.read().await;
    let history = state.history.read().await;

    #[derive(Serialize)]
    struct StatusData {
        container: String,
        active_databases: Vec<String>,
        schedules: Vec<super::state::ScheduleStatus>,
        total_runs: usize,
        successful_runs: usize,
        last_run: Option<String>,
    }

    let data = StatusData {
        container: state.context.config.container.clone(),
        active_databases: state.context.config.active_databases.clone(),
        schedules: schedules.clone(),
        total_runs: history.len(),
        successful_runs: history.iter().filter(|b| b.success).count(),
        last_run: history
            .first()
            .map(|b| b.timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()),
    };

    Json(ApiResponse { success: true, data }).into_response()
}

async fn history_handler(State(state): State<Arc<AppState>>) -> Response {
    let history = state.history.read().await;
    Json(ApiResponse {
        success: true,
        data: history.clone(),
    })
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{context, MockDatabase, MockStorage};
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request};
    use tower::ServiceExt;

    async fn call(state: Arc<AppState>, method: Method, uri: &str) -> (StatusCode, String, String) {
        let response = router(state)
            .oneshot(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string())
            .unwrap_or_default();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, content_type, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_backup_success_returns_200() {
        let storage = MockStorage::new();
        let state = AppState::new(context(MockDatabase::new(), storage.clone(), vec!["aw", "Extocare"]));

        let (status, content_type, body) = call(state.clone(), Method::POST, "/api/backup").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type, "text/plain; charset=utf-8");
        assert_eq!(body, "Backup completed successfully");

        let names = storage.blob_names();
        assert_eq!(names.len(), 2);
        assert!(names[0].starts_with("db_aw_") && names[0].ends_with(".sql"));
        assert!(names[1].starts_with("db_Extocare_") && names[1].ends_with(".sql"));
        assert_eq!(state.history.read().await[0].trigger, "http");
    }

    #[tokio::test]
    async fn test_backup_accepts_get() {
        let state = AppState::new(context(MockDatabase::new(), MockStorage::new(), vec!["aw"]));

        let (status, _, body) = call(state, Method::GET, "/api/backup").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, BACKUP_SUCCESS_BODY);
    }

    #[tokio::test]
    async fn test_backup_failure_returns_400_with_message() {
        let db = MockDatabase::new().failing_export("Extocare");
        let state = AppState::new(context(db, MockStorage::new(), vec!["aw", "Extocare"]));

        let (status, content_type, body) = call(state, Method::POST, "/api/backup").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(content_type, "text/plain; charset=utf-8");
        assert_eq!(body, "Database error: export of Extocare failed");
    }

    #[tokio::test]
    async fn test_status_reports_runs() {
        let state = AppState::new(context(MockDatabase::new(), MockStorage::new(), vec!["aw"]));
        call(state.clone(), Method::POST, "/api/backup").await;

        let (status, _, body) = call(state, Method::GET, "/api/status").await;
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["total_runs"], 1);
        assert_eq!(json["data"]["successful_runs"], 1);
        assert_eq!(json["data"]["container"], "sqlbackups");
    }

    #[tokio::test]
    async fn test_history_lists_uploaded_blobs() {
        let state = AppState::new(context(MockDatabase::new(), MockStorage::new(), vec!["aw"]));
        call(state.clone(), Method::GET, "/api/backup").await;

        let (_, _, body) = call(state, Method::GET, "/api/history").await;
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();

        assert_eq!(json["data"][0]["kind"], "active");
        assert_eq!(json["data"][0]["blobs"][0]["database"], "aw");
    }
}
