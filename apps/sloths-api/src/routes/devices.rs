//! Devices: the (category, type, manufacturer, model) combinations items
//! are instances of.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;

use sloths_core::validation::validate_search_query;
use sloths_core::{DeviceView, NewDevice, Page};
use sloths_db::DeviceFilter;

use super::{created_range, ApiJson, ApiQuery, Displayed};
use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::state::AppState;

type DeviceBody = Displayed<DeviceView>;

fn displayed(device: DeviceView) -> DeviceBody {
    let display = device.display();
    Displayed::new(device, display)
}

#[derive(Debug, Default, Deserialize)]
pub struct DeviceQuery {
    pub q: Option<String>,
    pub category_id: Option<String>,
    pub type_id: Option<String>,
    pub manufacturer_id: Option<String>,
    pub model_id: Option<String>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/devices", get(list).post(create))
        .route("/devices/{id}", get(fetch).put(update).delete(remove))
}

async fn list(
    State(state): State<AppState>,
    _auth: AuthUser,
    ApiQuery(query): ApiQuery<DeviceQuery>,
) -> ApiResult<Json<Vec<DeviceBody>>> {
    let filter = DeviceFilter {
        search: validate_search_query(query.q.as_deref())?,
        category_id: query.category_id,
        type_id: query.type_id,
        manufacturer_id: query.manufacturer_id,
        model_id: query.model_id,
        created: created_range(query.created_after, query.created_before)?,
    };
    let page = Page::new(query.limit, query.offset);

    let devices = state.db.devices().list(&filter, page).await?;
    Ok(Json(devices.into_iter().map(displayed).collect()))
}

async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(input): ApiJson<NewDevice>,
) -> ApiResult<(StatusCode, Json<DeviceBody>)> {
    let repo = state.db.devices();
    let device = repo.create(input).await?;
    info!(id = %device.id, by = %auth.user.username, "Device created");

    let view = repo.get(&device.id).await?;
    Ok((StatusCode::CREATED, Json(displayed(view))))
}

async fn fetch(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<DeviceBody>> {
    let device = state.db.devices().get(&id).await?;
    Ok(Json(displayed(device)))
}

async fn update(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<NewDevice>,
) -> ApiResult<Json<DeviceBody>> {
    let device = state.db.devices().update(&id, input).await?;
    Ok(Json(displayed(device)))
}

async fn remove(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.devices().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::routes::test_support::{app, create, device, login, send};

    #[tokio::test]
    async fn test_create_returns_joined_names() {
        let (app, _) = app().await;
        let token = login(&app).await;

        let id = device(&app, &token, "A").await;
        let (status, body) = send(
            &app,
            Method::GET,
            &format!("/api/devices/{}", id),
            Some(&token),
            None,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["category_name"], "Category A");
        assert_eq!(body["display"], "Category A | Type A | Maker A | Model A");
    }

    #[tokio::test]
    async fn test_same_combination_conflicts() {
        let (app, _) = app().await;
        let token = login(&app).await;

        let id = device(&app, &token, "A").await;
        let (_, existing) = send(
            &app,
            Method::GET,
            &format!("/api/devices/{}", id),
            Some(&token),
            None,
        )
        .await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/devices",
            Some(&token),
            Some(json!({
                "category_id": existing["category_id"],
                "type_id": existing["type_id"],
                "manufacturer_id": existing["manufacturer_id"],
                "model_id": existing["model_id"],
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "DUPLICATE");
    }

    #[tokio::test]
    async fn test_unknown_reference() {
        let (app, _) = app().await;
        let token = login(&app).await;
        let category = create(&app, &token, "/api/categories", json!({ "name": "Laptops" })).await;
        let missing = "6f1c1a52-0000-4000-8000-000000000000";

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/devices",
            Some(&token),
            Some(json!({
                "category_id": category,
                "type_id": missing,
                "manufacturer_id": missing,
                "model_id": missing,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "INVALID_REFERENCE");
    }

    #[tokio::test]
    async fn test_filter_and_search() {
        let (app, _) = app().await;
        let token = login(&app).await;

        let a = device(&app, &token, "Alpha").await;
        device(&app, &token, "Beta").await;

        let (_, body) = send(&app, Method::GET, "/api/devices", Some(&token), None).await;
        assert_eq!(body.as_array().unwrap().len(), 2);
        assert_eq!(body[0]["id"], a.as_str());

        let (_, body) = send(&app, Method::GET, "/api/devices?q=beta", Some(&token), None).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["model_name"], "Model Beta");

        let category_id = body[0]["category_id"].as_str().unwrap().to_string();
        let (_, body) = send(
            &app,
            Method::GET,
            &format!("/api/devices?category_id={}", category_id),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["category_name"], "Category Beta");
    }

    #[tokio::test]
    async fn test_device_with_items_is_protected() {
        let (app, _) = app().await;
        let token = login(&app).await;

        let id = device(&app, &token, "A").await;
        create(
            &app,
            &token,
            "/api/items",
            json!({ "inventory_number": "INV-1", "device_id": id }),
        )
        .await;

        let (status, body) = send(
            &app,
            Method::DELETE,
            &format!("/api/devices/{}", id),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "PROTECTED");
    }
}
