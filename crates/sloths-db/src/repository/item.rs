//! # Item Repository
//!
//! Inventory items. Every read joins the device names and the item's current
//! state, which is the latest row of its operation log:
//!
//! ```text
//! items i
//!   ├── devices d ── categories / types / manufacturers / models
//!   └── LEFT JOIN operations o ON o.id = (latest operation of i)
//!         ├── statuses s
//!         ├── locations l
//!         └── responsibles r
//!
//! latest = ORDER BY created_at DESC, rowid DESC LIMIT 1
//! ```
//!
//! Nothing about the current state is stored on the item itself.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};

use sloths_core::search::search_text;
use sloths_core::{
    device_display, person_full_name, CreatedRange, CurrentState, ItemView, NewItem, Page,
};

use super::{ensure_reference, like_pattern, new_id, now};
use crate::error::{DbError, DbResult};

const ITEM_VIEW_SELECT: &str = r#"
    SELECT
        i.id,
        i.inventory_number,
        i.serial_number,
        i.device_id,
        i.notes,
        i.created_at,
        i.updated_at,
        c.name AS category_name,
        t.name AS type_name,
        mf.name AS manufacturer_name,
        md.name AS model_name,
        o.id AS op_id,
        o.status_id AS op_status_id,
        s.name AS op_status_name,
        o.location_id AS op_location_id,
        l.name AS op_location_name,
        o.responsible_id AS op_responsible_id,
        r.last_name AS op_last_name,
        r.first_name AS op_first_name,
        r.middle_name AS op_middle_name,
        o.created_at AS op_created_at
    FROM items i
    INNER JOIN devices d ON d.id = i.device_id
    INNER JOIN categories c ON c.id = d.category_id
    INNER JOIN types t ON t.id = d.type_id
    INNER JOIN manufacturers mf ON mf.id = d.manufacturer_id
    INNER JOIN models md ON md.id = d.model_id
    LEFT JOIN operations o ON o.id = (
        SELECT latest.id
        FROM operations latest
        WHERE latest.item_id = i.id
        ORDER BY latest.created_at DESC, latest.rowid DESC
        LIMIT 1
    )
    LEFT JOIN statuses s ON s.id = o.status_id
    LEFT JOIN locations l ON l.id = o.location_id
    LEFT JOIN responsibles r ON r.id = o.responsible_id
"#;

/// Flat row produced by [`ITEM_VIEW_SELECT`].
#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    id: String,
    inventory_number: String,
    serial_number: String,
    device_id: String,
    notes: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    category_name: String,
    type_name: String,
    manufacturer_name: String,
    model_name: String,
    op_id: Option<String>,
    op_status_id: Option<String>,
    op_status_name: Option<String>,
    op_location_id: Option<String>,
    op_location_name: Option<String>,
    op_responsible_id: Option<String>,
    op_last_name: Option<String>,
    op_first_name: Option<String>,
    op_middle_name: Option<String>,
    op_created_at: Option<DateTime<Utc>>,
}

impl From<ItemRow> for ItemView {
    fn from(row: ItemRow) -> Self {
        // The joined columns are all present exactly when an operation exists.
        let current = match (row.op_id, row.op_created_at) {
            (Some(operation_id), Some(since)) => Some(CurrentState {
                operation_id,
                status_id: row.op_status_id.unwrap_or_default(),
                status_name: row.op_status_name.unwrap_or_default(),
                location_id: row.op_location_id.unwrap_or_default(),
                location_name: row.op_location_name.unwrap_or_default(),
                responsible_id: row.op_responsible_id.unwrap_or_default(),
                responsible_name: person_full_name(
                    row.op_last_name.as_deref().unwrap_or_default(),
                    row.op_first_name.as_deref().unwrap_or_default(),
                    row.op_middle_name.as_deref(),
                ),
                since,
            }),
            _ => None,
        };

        ItemView {
            device: device_display(
                &row.category_name,
                &row.type_name,
                &row.manufacturer_name,
                &row.model_name,
            ),
            id: row.id,
            inventory_number: row.inventory_number,
            serial_number: row.serial_number,
            device_id: row.device_id,
            notes: row.notes,
            current,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Filters for [`ItemRepository::list`]. All present filters must match.
#[derive(Debug, Clone, Default)]
pub struct ItemFilter {
    pub device_id: Option<String>,
    pub category_id: Option<String>,
    pub type_id: Option<String>,
    pub manufacturer_id: Option<String>,
    /// Matches the status of the item's latest operation.
    pub status_id: Option<String>,
    /// Case-insensitive substring of inventory number, serial number, notes,
    /// any device lookup name or the device notes.
    pub search: Option<String>,
    /// Window on the item's own `created_at`.
    pub created: CreatedRange,
}

fn item_search_text(input: &NewItem) -> String {
    search_text([
        input.inventory_number.as_str(),
        input.serial_number.as_str(),
        input.notes.as_str(),
    ])
}

/// Repository for inventory items.
#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    /// Creates a new ItemRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ItemRepository { pool }
    }

    /// Inserts a new item. It starts with no history and no current state.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - inventory number taken
    /// * `Err(DbError::InvalidReference)` - unknown device
    pub async fn create(&self, input: NewItem) -> DbResult<ItemView> {
        let input = input.into_valid()?;
        ensure_reference(&self.pool, "devices", "Device", &input.device_id).await?;

        let id = new_id();
        let now = now();

        debug!(id = %id, inventory_number = %input.inventory_number, "Creating item");

        sqlx::query(
            r#"
            INSERT INTO items (
                id, inventory_number, serial_number, device_id,
                notes, search_text, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&id)
        .bind(&input.inventory_number)
        .bind(&input.serial_number)
        .bind(&input.device_id)
        .bind(&input.notes)
        .bind(item_search_text(&input))
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_value(&input.inventory_number))?;

        self.get(&id).await
    }

    /// Gets an item with its device names and current state.
    pub async fn get(&self, id: &str) -> DbResult<ItemView> {
        let sql = format!("{} WHERE i.id = ?1", ITEM_VIEW_SELECT);
        sqlx::query_as::<_, ItemRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(ItemView::from)
            .ok_or_else(|| DbError::not_found("Item", id))
    }

    /// Finds an item by its exact inventory number.
    pub async fn find_by_inventory_number(
        &self,
        inventory_number: &str,
    ) -> DbResult<Option<ItemView>> {
        let sql = format!("{} WHERE i.inventory_number = ?1", ITEM_VIEW_SELECT);
        let row = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(inventory_number)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(ItemView::from))
    }

    /// Lists items ordered by inventory number.
    pub async fn list(&self, filter: &ItemFilter, page: Page) -> DbResult<Vec<ItemView>> {
        debug!(?filter, "Listing items");

        let sql = format!(
            r#"{}
            WHERE (?1 IS NULL OR i.device_id = ?1)
              AND (?2 IS NULL OR d.category_id = ?2)
              AND (?3 IS NULL OR d.type_id = ?3)
              AND (?4 IS NULL OR d.manufacturer_id = ?4)
              AND (?5 IS NULL OR o.status_id = ?5)
              AND (?6 IS NULL
                   OR i.search_text LIKE ?6 ESCAPE '\'
                   OR d.search_text LIKE ?6 ESCAPE '\'
                   OR c.name_key LIKE ?6 ESCAPE '\'
                   OR t.name_key LIKE ?6 ESCAPE '\'
                   OR mf.name_key LIKE ?6 ESCAPE '\'
                   OR md.name_key LIKE ?6 ESCAPE '\')
              AND (?7 IS NULL OR i.created_at >= ?7)
              AND (?8 IS NULL OR i.created_at < ?8)
            ORDER BY i.inventory_number
            LIMIT ?9 OFFSET ?10
            "#,
            ITEM_VIEW_SELECT
        );

        let rows = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(&filter.device_id)
            .bind(&filter.category_id)
            .bind(&filter.type_id)
            .bind(&filter.manufacturer_id)
            .bind(&filter.status_id)
            .bind(like_pattern(filter.search.as_deref()))
            .bind(filter.created.after)
            .bind(filter.created.before)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = rows.len(), "Listed items");
        Ok(rows.into_iter().map(ItemView::from).collect())
    }

    /// Replaces inventory number, serial number, device and notes.
    ///
    /// History is untouched, so the current state is unchanged.
    pub async fn update(&self, id: &str, input: NewItem) -> DbResult<ItemView> {
        let input = input.into_valid()?;
        ensure_reference(&self.pool, "devices", "Device", &input.device_id).await?;

        debug!(id = %id, "Updating item");

        let result = sqlx::query(
            r#"
            UPDATE items SET
                inventory_number = ?2,
                serial_number = ?3,
                device_id = ?4,
                notes = ?5,
                search_text = ?6,
                updated_at = ?7
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&input.inventory_number)
        .bind(&input.serial_number)
        .bind(&input.device_id)
        .bind(&input.notes)
        .bind(item_search_text(&input))
        .bind(now())
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_value(&input.inventory_number))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Item", id));
        }

        self.get(id).await
    }

    /// Deletes an item together with its whole operation history.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let history: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM operations WHERE item_id = ?1")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM items WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Item", id));
        }

        tx.commit().await?;

        info!(id = %id, operations = history, "Deleted item and its history");
        Ok(())
    }

    /// Counts items.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
