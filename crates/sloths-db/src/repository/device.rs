//! # Device Repository
//!
//! A device is one combination of category, type, manufacturer and model.
//! Reads always return the joined names ([`DeviceView`]) so callers can print
//! `"{category} | {type} | {manufacturer} | {model}"` without extra queries.

use sqlx::SqlitePool;
use tracing::debug;

use sloths_core::search::search_text;
use sloths_core::{CreatedRange, Device, DeviceView, NewDevice, Page};

use super::{ensure_reference, like_pattern, new_id, now};
use crate::error::{DbError, DbResult};

const DEVICE_VIEW_SELECT: &str = r#"
    SELECT
        d.id,
        d.category_id,
        c.name AS category_name,
        d.type_id,
        t.name AS type_name,
        d.manufacturer_id,
        mf.name AS manufacturer_name,
        d.model_id,
        md.name AS model_name,
        d.notes,
        d.created_at,
        d.updated_at
    FROM devices d
    INNER JOIN categories c ON c.id = d.category_id
    INNER JOIN types t ON t.id = d.type_id
    INNER JOIN manufacturers mf ON mf.id = d.manufacturer_id
    INNER JOIN models md ON md.id = d.model_id
"#;

/// Filters for [`DeviceRepository::list`]. All present filters must match.
#[derive(Debug, Clone, Default)]
pub struct DeviceFilter {
    pub category_id: Option<String>,
    pub type_id: Option<String>,
    pub manufacturer_id: Option<String>,
    pub model_id: Option<String>,
    /// Case-insensitive substring of any lookup name or the notes.
    pub search: Option<String>,
    pub created: CreatedRange,
}

/// Repository for device database operations.
#[derive(Debug, Clone)]
pub struct DeviceRepository {
    pool: SqlitePool,
}

impl DeviceRepository {
    /// Creates a new DeviceRepository.
    pub fn new(pool: SqlitePool) -> Self {
        DeviceRepository { pool }
    }

    async fn ensure_references(&self, input: &NewDevice) -> DbResult<()> {
        ensure_reference(&self.pool, "categories", "Category", &input.category_id).await?;
        ensure_reference(&self.pool, "types", "Type", &input.type_id).await?;
        ensure_reference(&self.pool, "manufacturers", "Manufacturer", &input.manufacturer_id)
            .await?;
        ensure_reference(&self.pool, "models", "Model", &input.model_id).await?;
        Ok(())
    }

    /// Inserts a new device.
    ///
    /// ## Returns
    /// * `Err(DbError::InvalidReference)` - one of the four lookups is missing
    /// * `Err(DbError::UniqueViolation)` - the combination already exists
    pub async fn create(&self, input: NewDevice) -> DbResult<Device> {
        let input = input.into_valid()?;
        self.ensure_references(&input).await?;

        let now = now();
        let device = Device {
            id: new_id(),
            category_id: input.category_id,
            type_id: input.type_id,
            manufacturer_id: input.manufacturer_id,
            model_id: input.model_id,
            notes: input.notes,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %device.id, "Creating device");

        sqlx::query(
            r#"
            INSERT INTO devices (
                id, category_id, type_id, manufacturer_id, model_id,
                notes, search_text, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&device.id)
        .bind(&device.category_id)
        .bind(&device.type_id)
        .bind(&device.manufacturer_id)
        .bind(&device.model_id)
        .bind(&device.notes)
        .bind(search_text([device.notes.as_str()]))
        .bind(device.created_at)
        .bind(device.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| duplicate_combination(e.into()))?;

        Ok(device)
    }

    /// Gets a device with its lookup names.
    pub async fn get(&self, id: &str) -> DbResult<DeviceView> {
        let sql = format!("{} WHERE d.id = ?1", DEVICE_VIEW_SELECT);
        sqlx::query_as::<_, DeviceView>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Device", id))
    }

    /// Finds the device for an exact combination of lookups.
    pub async fn find_by_parts(
        &self,
        category_id: &str,
        type_id: &str,
        manufacturer_id: &str,
        model_id: &str,
    ) -> DbResult<Option<Device>> {
        let device = sqlx::query_as::<_, Device>(
            r#"
            SELECT id, category_id, type_id, manufacturer_id, model_id,
                   notes, created_at, updated_at
            FROM devices
            WHERE category_id = ?1 AND type_id = ?2
              AND manufacturer_id = ?3 AND model_id = ?4
            "#,
        )
        .bind(category_id)
        .bind(type_id)
        .bind(manufacturer_id)
        .bind(model_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(device)
    }

    /// Lists devices ordered by category, type, manufacturer and model names,
    /// ignoring case.
    pub async fn list(&self, filter: &DeviceFilter, page: Page) -> DbResult<Vec<DeviceView>> {
        debug!(?filter, "Listing devices");

        let sql = format!(
            r#"{}
            WHERE (?1 IS NULL OR d.category_id = ?1)
              AND (?2 IS NULL OR d.type_id = ?2)
              AND (?3 IS NULL OR d.manufacturer_id = ?3)
              AND (?4 IS NULL OR d.model_id = ?4)
              AND (?5 IS NULL
                   OR c.name_key LIKE ?5 ESCAPE '\'
                   OR t.name_key LIKE ?5 ESCAPE '\'
                   OR mf.name_key LIKE ?5 ESCAPE '\'
                   OR md.name_key LIKE ?5 ESCAPE '\'
                   OR d.search_text LIKE ?5 ESCAPE '\')
              AND (?6 IS NULL OR d.created_at >= ?6)
              AND (?7 IS NULL OR d.created_at < ?7)
            ORDER BY c.name_key, t.name_key, mf.name_key, md.name_key
            LIMIT ?8 OFFSET ?9
            "#,
            DEVICE_VIEW_SELECT
        );

        let devices = sqlx::query_as::<_, DeviceView>(&sql)
            .bind(&filter.category_id)
            .bind(&filter.type_id)
            .bind(&filter.manufacturer_id)
            .bind(&filter.model_id)
            .bind(like_pattern(filter.search.as_deref()))
            .bind(filter.created.after)
            .bind(filter.created.before)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = devices.len(), "Listed devices");
        Ok(devices)
    }

    /// Replaces all four references and the notes.
    pub async fn update(&self, id: &str, input: NewDevice) -> DbResult<DeviceView> {
        let input = input.into_valid()?;
        self.ensure_references(&input).await?;

        debug!(id = %id, "Updating device");

        let result = sqlx::query(
            r#"
            UPDATE devices SET
                category_id = ?2,
                type_id = ?3,
                manufacturer_id = ?4,
                model_id = ?5,
                notes = ?6,
                search_text = ?7,
                updated_at = ?8
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&input.category_id)
        .bind(&input.type_id)
        .bind(&input.manufacturer_id)
        .bind(&input.model_id)
        .bind(&input.notes)
        .bind(search_text([input.notes.as_str()]))
        .bind(now())
        .execute(&self.pool)
        .await
        .map_err(|e| duplicate_combination(e.into()))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Device", id));
        }

        self.get(id).await
    }

    /// Deletes a device. Fails with `Protected` while any item uses it.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting device");

        let result = sqlx::query("DELETE FROM devices WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| DbError::from(e).protect_delete("Device", id, "items"))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Device", id));
        }

        Ok(())
    }

    /// Counts devices.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM devices")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

fn duplicate_combination(err: DbError) -> DbError {
    match err {
        DbError::UniqueViolation { .. } => DbError::duplicate(
            "device",
            "category, type, manufacturer and model combination",
        ),
        other => other,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
