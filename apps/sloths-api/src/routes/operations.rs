//! Read-only view of the operation log across all items.
//!
//! Operations are recorded through `/api/items/{id}/operations`; there is
//! no update or delete.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use sloths_core::{OperationView, Page};
use sloths_db::OperationFilter;

use super::items::displayed_operation;
use super::{created_range, ApiQuery, Displayed};
use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct OperationQuery {
    pub item_id: Option<String>,
    pub status_id: Option<String>,
    pub location_id: Option<String>,
    pub responsible_id: Option<String>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/operations", get(list))
        .route("/operations/{id}", get(fetch))
}

/// Newest first.
async fn list(
    State(state): State<AppState>,
    _auth: AuthUser,
    ApiQuery(query): ApiQuery<OperationQuery>,
) -> ApiResult<Json<Vec<Displayed<OperationView>>>> {
    let page = Page::new(query.limit, query.offset);
    let filter = OperationFilter {
        item_id: query.item_id,
        status_id: query.status_id,
        location_id: query.location_id,
        responsible_id: query.responsible_id,
        created: created_range(query.created_after, query.created_before)?,
    };

    let operations = state.db.operations().list(&filter, page).await?;
    Ok(Json(operations.into_iter().map(displayed_operation).collect()))
}

async fn fetch(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Displayed<OperationView>>> {
    let op = state.db.operations().get(&id).await?;
    Ok(Json(displayed_operation(op)))
}
