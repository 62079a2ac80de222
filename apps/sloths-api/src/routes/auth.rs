//! Login, logout and the current-user endpoint.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use sloths_core::{Responsible, User};

use super::ApiJson;
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: User,
    pub responsible: Option<Responsible>,
}

/// Exchanges username and password for an access token.
async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let user = state
        .db
        .users()
        .authenticate(&request.username, &request.password)
        .await?
        .ok_or_else(|| {
            warn!(username = %request.username, "Login rejected");
            ApiError::unauthorized("Invalid username or password")
        })?;

    let issued = state.jwt.issue(&user)?;
    info!(username = %user.username, "User logged in");

    Ok(Json(LoginResponse {
        access_token: issued.token,
        token_type: "Bearer",
        expires_in: state.jwt.access_lifetime_secs(),
        user,
    }))
}

/// Revokes the presented token.
async fn logout(State(state): State<AppState>, auth: AuthUser) -> ApiResult<StatusCode> {
    state
        .db
        .users()
        .revoke_token(&auth.claims.jti, &auth.user.id, auth.claims.expires_at())
        .await?;

    info!(username = %auth.user.username, "User logged out");
    Ok(StatusCode::NO_CONTENT)
}

async fn me(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<MeResponse>> {
    let responsible = state.db.responsibles().find_by_user(&auth.user.id).await?;
    Ok(Json(MeResponse {
        user: auth.user,
        responsible,
    }))
}
