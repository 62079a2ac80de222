//! # Sloths API
//!
//! HTTP JSON server for the inventory: lookup catalogs, devices, items and
//! the append-only operation log that decides each item's current state.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           API Server                                    │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │  /auth         │  │  /api          │  │  /health                   ││
//! │  │                │  │                │  │                            ││
//! │  │ • login        │  │ • lookups      │  │ • liveness                 ││
//! │  │ • logout       │  │ • responsibles │  │ • readiness (SELECT 1)     ││
//! │  │ • me           │  │ • devices      │  │                            ││
//! │  │                │  │ • items        │  │                            ││
//! │  │                │  │ • operations   │  │                            ││
//! │  └────────────────┘  └────────────────┘  └────────────────────────────┘│
//! │           │                   │                                         │
//! │           ▼                   ▼                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  JwtManager (HS256)     sloths-db repositories (SQLite)          │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! See [`config::ApiConfig`]. Environment variables use the `SLOTHS_`
//! prefix:
//! - `SLOTHS_HTTP_PORT` - HTTP port (default: 8000)
//! - `SLOTHS_DATABASE_PATH` - SQLite file (default: ./sloths.db)
//! - `SLOTHS_JWT_SECRET` - Secret for JWT signing
//! - `SLOTHS_JWT_ACCESS_LIFETIME_SECS` - Token lifetime (default: 3600)

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use axum::Router;
use tower_http::trace::TraceLayer;

// Re-exports
pub use config::ApiConfig;
pub use error::{ApiError, ErrorCode};
pub use state::AppState;

/// Builds the complete application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::router())
        .nest("/auth", routes::auth::router())
        .nest("/api", routes::api_router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
