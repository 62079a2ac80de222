//! Liveness and readiness checks. Public, no token needed.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tracing::warn;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health/", get(index))
        .route("/health/liveness/", get(liveness))
        .route("/health/readiness/", get(readiness))
}

async fn index() -> impl IntoResponse {
    Json(json!({
        "liveness": "/health/liveness/",
        "readiness": "/health/readiness/",
    }))
}

/// The process is up.
async fn liveness() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// The process can serve traffic: the database answers `SELECT 1`.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    match state.db.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "checks": { "database": "Database connection OK" },
            })),
        ),
        Err(e) => {
            warn!(error = %e, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "error",
                    "checks": { "database": format!("Database error: {}", e) },
                })),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};

    use crate::routes::test_support::{app, send};

    #[tokio::test]
    async fn test_liveness() {
        let (app, _) = app().await;
        let (status, body) = send(&app, Method::GET, "/health/liveness/", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_readiness_ok() {
        let (app, _) = app().await;
        let (status, body) = send(&app, Method::GET, "/health/readiness/", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["checks"]["database"], "Database connection OK");
    }

    #[tokio::test]
    async fn test_readiness_fails_when_database_closed() {
        let (app, state) = app().await;
        state.db.close().await;

        let (status, body) = send(&app, Method::GET, "/health/readiness/", None, None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "error");
        assert!(body["checks"]["database"]
            .as_str()
            .unwrap()
            .starts_with("Database error:"));
    }

    #[tokio::test]
    async fn test_index_lists_checks() {
        let (app, _) = app().await;
        let (status, body) = send(&app, Method::GET, "/health/", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["readiness"], "/health/readiness/");
    }
}
