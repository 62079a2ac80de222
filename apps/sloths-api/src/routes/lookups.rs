//! CRUD for the six lookup tables, addressed by their plural slug.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use sloths_core::{LookupEntry, LookupKind, NewLookup};
use sloths_db::LookupRepository;

use super::{ApiJson, ApiQuery, ListQuery};
use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{kind}", get(list).post(create))
        .route("/{kind}/{id}", get(fetch).put(update).delete(remove))
}

fn repository(state: &AppState, slug: &str) -> ApiResult<LookupRepository> {
    let kind = LookupKind::from_slug(slug)?;
    Ok(state.db.lookups(kind))
}

async fn list(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(kind): Path<String>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> ApiResult<Json<Vec<LookupEntry>>> {
    let repo = repository(&state, &kind)?;
    let entries = repo.list(query.search()?.as_deref(), query.created()?, query.page()).await?;
    Ok(Json(entries))
}

async fn create(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(kind): Path<String>,
    ApiJson(input): ApiJson<NewLookup>,
) -> ApiResult<(StatusCode, Json<LookupEntry>)> {
    let entry = repository(&state, &kind)?.create(input).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn fetch(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path((kind, id)): Path<(String, String)>,
) -> ApiResult<Json<LookupEntry>> {
    let entry = repository(&state, &kind)?.get(&id).await?;
    Ok(Json(entry))
}

async fn update(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path((kind, id)): Path<(String, String)>,
    ApiJson(input): ApiJson<NewLookup>,
) -> ApiResult<Json<LookupEntry>> {
    let entry = repository(&state, &kind)?.update(&id, input).await?;
    Ok(Json(entry))
}

async fn remove(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path((kind, id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    repository(&state, &kind)?.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
