//! # Repository Module
//!
//! Database repository implementations for Sloths Inventory.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Layout                                    │
//! │                                                                         │
//! │  HTTP handler                                                          │
//! │       │                                                                 │
//! │       │  db.items().list(&filter, page)                                │
//! │       ▼                                                                 │
//! │  ItemRepository                                                        │
//! │  ├── create(input)        validate → check references → INSERT        │
//! │  ├── get(id)              item + device names + current state         │
//! │  ├── list(filter, page)                                                │
//! │  ├── update(id, input)    full replacement                             │
//! │  └── delete(id)           RESTRICT → Protected, CASCADE history       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every repository validates its input with `into_valid()` before touching
//! SQL, so callers cannot bypass the field rules.
//!
//! ## Available Repositories
//!
//! - [`LookupRepository`] - The six name-only lookup tables
//! - [`DeviceRepository`] - Category/type/manufacturer/model combinations
//! - [`ResponsibleRepository`] - People items are assigned to
//! - [`ItemRepository`] - Inventory items with their current state
//! - [`OperationRepository`] - Append-only history and the current-state query
//! - [`UserRepository`] - Login accounts and revoked tokens

pub mod device;
pub mod item;
pub mod lookup;
pub mod operation;
pub mod responsible;
pub mod user;

pub use device::{DeviceFilter, DeviceRepository};
pub use item::{ItemFilter, ItemRepository};
pub use lookup::LookupRepository;
pub use operation::{OperationFilter, OperationRepository};
pub use responsible::ResponsibleRepository;
pub use user::UserRepository;

use chrono::{DateTime, Utc};
use sloths_core::search::fold_case;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::{DbError, DbResult};

/// Generates a new row ID.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Current time, truncated to microseconds.
///
/// Stored timestamps round-trip through RFC 3339 text; dropping the
/// nanoseconds keeps values read back equal to values written.
pub(crate) fn now() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_micros(now.timestamp_micros()).unwrap_or(now)
}

/// Builds a `LIKE` pattern for a case-insensitive substring search.
///
/// The query is Unicode-folded, so match it against the pre-folded
/// `search_text`/`name_key` columns, never the raw ones. Use with
/// `ESCAPE '\'` in SQL.
pub(crate) fn like_pattern(search: Option<&str>) -> Option<String> {
    search.map(|q| {
        let escaped = fold_case(q)
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        format!("%{}%", escaped)
    })
}

/// Fails with `InvalidReference` unless `id` exists in `table`.
///
/// `table` is always a static table name, never user input.
pub(crate) async fn ensure_reference(
    pool: &SqlitePool,
    table: &str,
    entity: &str,
    id: &str,
) -> DbResult<()> {
    let sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1)", table);
    let exists: i64 = sqlx::query_scalar(&sql).bind(id).fetch_one(pool).await?;

    if exists == 0 {
        return Err(DbError::InvalidReference {
            message: format!("{} does not exist: {}", entity, id),
        });
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Shared fixtures for repository tests.

    use sloths_core::{
        Device, ItemView, LookupEntry, LookupKind, NewDevice, NewItem, NewLookup, NewResponsible,
        Responsible,
    };

    use crate::{Database, DbConfig};

    pub async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    pub async fn lookup(db: &Database, kind: LookupKind, name: &str) -> LookupEntry {
        db.lookups(kind)
            .create(NewLookup {
                name: name.to_string(),
                notes: String::new(),
            })
            .await
            .unwrap()
    }

    /// Creates a device with freshly named lookups.
    pub async fn device(db: &Database, tag: &str) -> Device {
        let category = lookup(db, LookupKind::Category, &format!("Category {}", tag)).await;
        let kind = lookup(db, LookupKind::Type, &format!("Type {}", tag)).await;
        let manufacturer = lookup(db, LookupKind::Manufacturer, &format!("Maker {}", tag)).await;
        let model = lookup(db, LookupKind::Model, &format!("Model {}", tag)).await;

        db.devices()
            .create(NewDevice {
                category_id: category.id,
                type_id: kind.id,
                manufacturer_id: manufacturer.id,
                model_id: model.id,
                notes: String::new(),
            })
            .await
            .unwrap()
    }

    pub async fn item(db: &Database, device: &Device, inventory_number: &str) -> ItemView {
        db.items()
            .create(NewItem {
                inventory_number: inventory_number.to_string(),
                serial_number: String::new(),
                device_id: device.id.clone(),
                notes: String::new(),
            })
            .await
            .unwrap()
    }

    pub async fn responsible(db: &Database, last: &str, first: &str) -> Responsible {
        db.responsibles()
            .create(NewResponsible {
                last_name: last.to_string(),
                first_name: first.to_string(),
                middle_name: None,
                employee_id: String::new(),
                user_id: None,
                notes: String::new(),
            })
            .await
            .unwrap()
    }
}
