//! Items, their current state and their operation history.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;

use sloths_core::validation::validate_search_query;
use sloths_core::{CurrentState, ItemView, NewItem, NewOperation, OperationView, Page};
use sloths_db::ItemFilter;

use super::{created_range, ApiJson, ApiQuery, Displayed};
use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::state::AppState;

type ItemBody = Displayed<ItemView>;
type OperationBody = Displayed<OperationView>;

fn displayed(item: ItemView) -> ItemBody {
    let display = item.display();
    Displayed::new(item, display)
}

pub(crate) fn displayed_operation(op: OperationView) -> OperationBody {
    let display = op.display();
    Displayed::new(op, display)
}

#[derive(Debug, Default, Deserialize)]
pub struct ItemQuery {
    pub q: Option<String>,
    pub device_id: Option<String>,
    pub category_id: Option<String>,
    pub type_id: Option<String>,
    pub manufacturer_id: Option<String>,
    /// Status of the latest operation.
    pub status_id: Option<String>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/items", get(list).post(create))
        .route("/items/{id}", get(fetch).put(update).delete(remove))
        .route("/items/{id}/current", get(current))
        .route("/items/{id}/operations", get(history).post(record))
}

async fn list(
    State(state): State<AppState>,
    _auth: AuthUser,
    ApiQuery(query): ApiQuery<ItemQuery>,
) -> ApiResult<Json<Vec<ItemBody>>> {
    let filter = ItemFilter {
        search: validate_search_query(query.q.as_deref())?,
        device_id: query.device_id,
        category_id: query.category_id,
        type_id: query.type_id,
        manufacturer_id: query.manufacturer_id,
        status_id: query.status_id,
        created: created_range(query.created_after, query.created_before)?,
    };
    let page = Page::new(query.limit, query.offset);

    let items = state.db.items().list(&filter, page).await?;
    Ok(Json(items.into_iter().map(displayed).collect()))
}

async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(input): ApiJson<NewItem>,
) -> ApiResult<(StatusCode, Json<ItemBody>)> {
    let item = state.db.items().create(input).await?;
    info!(
        inventory_number = %item.inventory_number,
        by = %auth.user.username,
        "Item created"
    );
    Ok((StatusCode::CREATED, Json(displayed(item))))
}

async fn fetch(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<ItemBody>> {
    let item = state.db.items().get(&id).await?;
    Ok(Json(displayed(item)))
}

async fn update(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<NewItem>,
) -> ApiResult<Json<ItemBody>> {
    let item = state.db.items().update(&id, input).await?;
    Ok(Json(displayed(item)))
}

/// Deletes the item together with its history.
async fn remove(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.items().delete(&id).await?;
    info!(id = %id, by = %auth.user.username, "Item deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// `null` while the item has no operations.
async fn current(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Option<CurrentState>>> {
    let current = state.db.operations().current_state(&id).await?;
    Ok(Json(current))
}

/// Newest first.
async fn history(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<OperationBody>>> {
    let history = state.db.operations().history(&id).await?;
    Ok(Json(history.into_iter().map(displayed_operation).collect()))
}

async fn record(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<NewOperation>,
) -> ApiResult<(StatusCode, Json<OperationBody>)> {
    let op = state.db.operations().record(&id, input).await?;
    info!(
        item = %op.inventory_number,
        status = %op.status_name,
        location = %op.location_name,
        by = %auth.user.username,
        "Operation recorded"
    );
    Ok((StatusCode::CREATED, Json(displayed_operation(op))))
}
