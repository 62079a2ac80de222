//! Responsible persons.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use sloths_core::{NewResponsible, Responsible};

use super::{ApiJson, ApiQuery, Displayed, ListQuery};
use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::state::AppState;

type ResponsibleBody = Displayed<Responsible>;

fn displayed(person: Responsible) -> ResponsibleBody {
    let display = person.full_name();
    Displayed::new(person, display)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/responsibles", get(list).post(create))
        .route("/responsibles/{id}", get(fetch).put(update).delete(remove))
}

async fn list(
    State(state): State<AppState>,
    _auth: AuthUser,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> ApiResult<Json<Vec<ResponsibleBody>>> {
    let people = state
        .db
        .responsibles()
        .list(query.search()?.as_deref(), query.created()?, query.page())
        .await?;
    Ok(Json(people.into_iter().map(displayed).collect()))
}

async fn create(
    State(state): State<AppState>,
    _auth: AuthUser,
    ApiJson(input): ApiJson<NewResponsible>,
) -> ApiResult<(StatusCode, Json<ResponsibleBody>)> {
    let person = state.db.responsibles().create(input).await?;
    Ok((StatusCode::CREATED, Json(displayed(person))))
}

async fn fetch(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<ResponsibleBody>> {
    let person = state.db.responsibles().get(&id).await?;
    Ok(Json(displayed(person)))
}

async fn update(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<NewResponsible>,
) -> ApiResult<Json<ResponsibleBody>> {
    let person = state.db.responsibles().update(&id, input).await?;
    Ok(Json(displayed(person)))
}

async fn remove(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.responsibles().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
