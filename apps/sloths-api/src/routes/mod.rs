//! HTTP routes.
//!
//! ```text
//! /health/...                    public health checks
//! /auth/login|logout|me          session handling
//! /api/{lookup}[/{id}]           categories, manufacturers, models, types,
//!                                locations, statuses
//! /api/responsibles[/{id}]
//! /api/devices[/{id}]
//! /api/items[/{id}[/current|/operations]]
//! /api/operations[/{id}]
//! ```
//!
//! Everything under `/api` and `/auth` except login requires a bearer token.

pub mod auth;
pub mod devices;
pub mod health;
pub mod items;
pub mod lookups;
pub mod operations;
pub mod responsibles;

use axum::extract::{FromRequest, FromRequestParts};
use axum::Router;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sloths_core::validation::validate_search_query;
use sloths_core::{CreatedRange, Page};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// `Json` body extractor whose rejections use the API error format.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `Query` extractor whose rejections use the API error format.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// Query string shared by the plain list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub q: Option<String>,
    /// RFC 3339, inclusive.
    pub created_after: Option<DateTime<Utc>>,
    /// RFC 3339, exclusive.
    pub created_before: Option<DateTime<Utc>>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl ListQuery {
    pub fn page(&self) -> Page {
        Page::new(self.limit, self.offset)
    }

    pub fn search(&self) -> ApiResult<Option<String>> {
        Ok(validate_search_query(self.q.as_deref())?)
    }

    pub fn created(&self) -> ApiResult<CreatedRange> {
        created_range(self.created_after, self.created_before)
    }
}

/// Builds the `created_after`/`created_before` window of a list query.
///
/// An inverted window is a validation error rather than an empty result.
pub fn created_range(
    after: Option<DateTime<Utc>>,
    before: Option<DateTime<Utc>>,
) -> ApiResult<CreatedRange> {
    Ok(CreatedRange::new(after, before)?)
}

/// A resource together with its human-readable label.
#[derive(Debug, Clone, Serialize)]
pub struct Displayed<T> {
    #[serde(flatten)]
    pub inner: T,
    pub display: String,
}

impl<T> Displayed<T> {
    pub fn new(inner: T, display: String) -> Self {
        Displayed { inner, display }
    }
}

/// Routes mounted under `/api`.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .merge(lookups::router())
        .merge(responsibles::router())
        .merge(devices::router())
        .merge(items::router())
        .merge(operations::router())
}

#[cfg(test)]
pub(crate) mod test_support {
    //! In-process request helpers for route tests.

    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use axum::Router;
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    use sloths_core::NewUser;
    use sloths_db::{Database, DbConfig};

    use crate::auth::JwtManager;
    use crate::state::AppState;

    pub const USERNAME: &str = "admin";
    pub const PASSWORD: &str = "correct horse";

    /// Router over a fresh in-memory database with one active user.
    pub async fn app() -> (Router, AppState) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.users()
            .create(NewUser {
                username: USERNAME.to_string(),
                password: PASSWORD.to_string(),
            })
            .await
            .unwrap();

        let state = AppState::new(db, JwtManager::new("test-secret", 3600));
        (crate::build_router(state.clone()), state)
    }

    /// Sends one request and returns the status and the JSON body
    /// (`Value::Null` for an empty body).
    pub async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    pub async fn login(app: &Router) -> String {
        let (status, body) = send(
            app,
            Method::POST,
            "/auth/login",
            None,
            Some(serde_json::json!({ "username": USERNAME, "password": PASSWORD })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        body["access_token"].as_str().unwrap().to_string()
    }

    /// POSTs a JSON body and returns the created resource's id.
    pub async fn create(app: &Router, token: &str, uri: &str, body: Value) -> String {
        let (status, body) = send(app, Method::POST, uri, Some(token), Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "POST {} failed: {}", uri, body);
        body["id"].as_str().unwrap().to_string()
    }

    /// Creates the four lookups and a device named after `tag`.
    pub async fn device(app: &Router, token: &str, tag: &str) -> String {
        let mut ids = Vec::new();
        for (slug, prefix) in [
            ("categories", "Category"),
            ("types", "Type"),
            ("manufacturers", "Maker"),
            ("models", "Model"),
        ] {
            let id = create(
                app,
                token,
                &format!("/api/{}", slug),
                serde_json::json!({ "name": format!("{} {}", prefix, tag) }),
            )
            .await;
            ids.push(id);
        }

        create(
            app,
            token,
            "/api/devices",
            serde_json::json!({
                "category_id": ids[0],
                "type_id": ids[1],
                "manufacturer_id": ids[2],
                "model_id": ids[3],
            }),
        )
        .await
    }

    /// Status, location and responsible ids usable in an operation.
    pub async fn operation_refs(app: &Router, token: &str, tag: &str) -> (String, String, String) {
        let status = create(
            app,
            token,
            "/api/statuses",
            serde_json::json!({ "name": format!("Status {}", tag) }),
        )
        .await;
        let location = create(
            app,
            token,
            "/api/locations",
            serde_json::json!({ "name": format!("Room {}", tag) }),
        )
        .await;
        let responsible = create(
            app,
            token,
            "/api/responsibles",
            serde_json::json!({ "last_name": "Ivanov", "first_name": tag }),
        )
        .await;
        (status, location, responsible)
    }
}
