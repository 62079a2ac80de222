//! # sloths-db: Database Layer for Sloths Inventory
//!
//! SQLite persistence for catalogs, items and their operation history, using
//! sqlx for async access.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Sloths Inventory Data Flow                         │
//! │                                                                         │
//! │  HTTP handler (sloths-api)                                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     sloths-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ LookupRepo    │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ DeviceRepo    │    │ 0001_initial │  │   │
//! │  │   │ WAL, FKs on   │    │ ItemRepo      │    │ _schema.sql  │  │   │
//! │  │   │               │    │ OperationRepo │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (database_path)                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sloths_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./sloths.db")).await?;
//!
//! let item = db.items().get(&item_id).await?;
//! let state = db.operations().current_state(&item.id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::{
    DeviceFilter, DeviceRepository, ItemFilter, ItemRepository, LookupRepository,
    OperationFilter, OperationRepository, ResponsibleRepository, UserRepository,
};
