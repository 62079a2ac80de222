//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← Adds context and categorization               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ApiError (in sloths-api) ← Mapped to HTTP status + error code         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Client receives {"code": ..., "message": ...}                         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Foreign Keys
//! SQLite reports every foreign key failure with the same message. What it
//! means depends on the statement:
//!
//! | Statement        | Meaning                             | Variant            |
//! |------------------|-------------------------------------|--------------------|
//! | INSERT / UPDATE  | referenced row does not exist       | `InvalidReference` |
//! | DELETE           | row is still referenced (RESTRICT)  | `Protected`        |
//!
//! The generic conversion produces `InvalidReference`; repositories turn it
//! into `Protected` on their delete paths via [`DbError::protect_delete`].

use sloths_core::CoreError;
use thiserror::Error;

/// Message raised by the trigger that guards the operations table.
pub(crate) const APPEND_ONLY_MESSAGE: &str = "operations are append-only";

/// Database operation errors.
///
/// These errors wrap sqlx errors and provide additional context
/// for debugging and user feedback.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    ///
    /// ## When This Occurs
    /// - `fetch_optional` returns no rows
    /// - UPDATE/DELETE touches zero rows
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Duplicate lookup name
    /// - Duplicate inventory number
    /// - Same (category, type, manufacturer, model) twice
    /// - A user already linked to another responsible person
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Insert or update points at a row that does not exist.
    #[error("Invalid reference: {message}")]
    InvalidReference { message: String },

    /// Delete blocked because other rows still reference this one.
    #[error("Cannot delete {entity} {id}: it is still referenced by {referenced_by}")]
    Protected {
        entity: String,
        id: String,
        referenced_by: String,
    },

    /// Attempt to modify an append-only row.
    #[error("{0}")]
    ImmutableRow(String),

    /// Input failed domain validation before reaching SQL.
    #[error(transparent)]
    Validation(#[from] sloths_core::ValidationError),

    /// Database connection failed.
    ///
    /// ## When This Occurs
    /// - Database file can't be created
    /// - File permissions issue
    /// - Disk full
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a UniqueViolation error.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Creates a Protected error.
    pub fn protected(
        entity: impl Into<String>,
        id: impl Into<String>,
        referenced_by: impl Into<String>,
    ) -> Self {
        DbError::Protected {
            entity: entity.into(),
            id: id.into(),
            referenced_by: referenced_by.into(),
        }
    }

    /// Reinterprets a foreign key failure raised by a DELETE.
    pub fn protect_delete(self, entity: &str, id: &str, referenced_by: &str) -> Self {
        match self {
            DbError::InvalidReference { .. } => DbError::protected(entity, id, referenced_by),
            other => other,
        }
    }

    /// Fills in the offending value of a UniqueViolation.
    pub fn with_value(self, value: impl Into<String>) -> Self {
        match self {
            DbError::UniqueViolation { field, .. } => DbError::UniqueViolation {
                field,
                value: value.into(),
            },
            other => other,
        }
    }

    /// True for errors caused by the caller's data rather than the database.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            DbError::NotFound { .. }
                | DbError::UniqueViolation { .. }
                | DbError::InvalidReference { .. }
                | DbError::Protected { .. }
                | DbError::ImmutableRow(_)
                | DbError::Validation(_)
        )
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Analyze message for constraint type
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // UNIQUE constraint: "UNIQUE constraint failed: <table>.<column>[, ...]"
                // FK constraint: "FOREIGN KEY constraint failed"
                if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field,
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::InvalidReference {
                        message: msg.to_string(),
                    }
                } else if msg.contains(APPEND_ONLY_MESSAGE) {
                    DbError::ImmutableRow(msg.to_string())
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

impl From<CoreError> for DbError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound { entity, id } => DbError::NotFound { entity, id },
            CoreError::Validation(e) => DbError::Validation(e),
        }
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protect_delete_only_rewrites_fk_failures() {
        let fk = DbError::InvalidReference {
            message: "FOREIGN KEY constraint failed".to_string(),
        };
        assert!(matches!(
            fk.protect_delete("Category", "c1", "devices"),
            DbError::Protected { .. }
        ));

        let missing = DbError::not_found("Category", "c1");
        assert!(matches!(
            missing.protect_delete("Category", "c1", "devices"),
            DbError::NotFound { .. }
        ));
    }

    #[test]
    fn test_protected_message() {
        let err = DbError::protected("Status", "s1", "operations");
        assert_eq!(
            err.to_string(),
            "Cannot delete Status s1: it is still referenced by operations"
        );
    }

    #[test]
    fn test_with_value() {
        let err = DbError::duplicate("items.inventory_number", "unknown").with_value("INV-1");
        assert_eq!(
            err.to_string(),
            "Duplicate items.inventory_number: 'INV-1' already exists"
        );
    }
}
