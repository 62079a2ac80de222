//! # Lookup Repository
//!
//! One repository type serves all six lookup tables. They share a schema, so
//! the table name is the only thing that varies.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  LookupKind        table           blocked from deletion by            │
//! │  ──────────────    ─────────────   ─────────────────────────           │
//! │  Category          categories      devices                             │
//! │  Manufacturer      manufacturers   devices                             │
//! │  Model             models          devices                             │
//! │  Type              types           devices                             │
//! │  Location          locations       operations                          │
//! │  Status            statuses        operations                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::SqlitePool;
use tracing::debug;

use sloths_core::search::{name_key, search_text};
use sloths_core::{CreatedRange, LookupEntry, LookupKind, NewLookup, Page};

use super::{like_pattern, new_id, now};
use crate::error::{DbError, DbResult};

/// Repository for one lookup table.
#[derive(Debug, Clone)]
pub struct LookupRepository {
    pool: SqlitePool,
    kind: LookupKind,
}

impl LookupRepository {
    /// Creates a new LookupRepository for `kind`.
    pub fn new(pool: SqlitePool, kind: LookupKind) -> Self {
        LookupRepository { pool, kind }
    }

    /// The lookup table this repository works on.
    pub fn kind(&self) -> LookupKind {
        self.kind
    }

    fn table(&self) -> &'static str {
        self.kind.table()
    }

    /// Inserts a new row.
    ///
    /// ## Returns
    /// * `Ok(LookupEntry)` - the stored row
    /// * `Err(DbError::UniqueViolation)` - name already taken
    /// * `Err(DbError::Validation)` - blank or over-long name
    pub async fn create(&self, input: NewLookup) -> DbResult<LookupEntry> {
        let input = input.into_valid()?;
        let now = now();

        let entry = LookupEntry {
            id: new_id(),
            name: input.name,
            notes: input.notes,
            created_at: now,
            updated_at: now,
        };

        debug!(table = self.table(), name = %entry.name, "Creating lookup entry");

        let sql = format!(
            r#"
            INSERT INTO {} (id, name, notes, name_key, search_text, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            self.table()
        );
        sqlx::query(&sql)
            .bind(&entry.id)
            .bind(&entry.name)
            .bind(&entry.notes)
            .bind(name_key([entry.name.as_str()]))
            .bind(search_text([entry.name.as_str(), entry.notes.as_str()]))
            .bind(entry.created_at)
            .bind(entry.updated_at)
            .execute(&self.pool)
            .await
            .map_err(|e| DbError::from(e).with_value(&entry.name))?;

        Ok(entry)
    }

    /// Gets a row by ID.
    pub async fn get(&self, id: &str) -> DbResult<LookupEntry> {
        let sql = format!(
            "SELECT id, name, notes, created_at, updated_at FROM {} WHERE id = ?1",
            self.table()
        );
        sqlx::query_as::<_, LookupEntry>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found(self.kind.entity_name(), id))
    }

    /// Finds a row by its exact (case-sensitive) name.
    pub async fn find_by_name(&self, name: &str) -> DbResult<Option<LookupEntry>> {
        let sql = format!(
            "SELECT id, name, notes, created_at, updated_at FROM {} WHERE name = ?1",
            self.table()
        );
        let entry = sqlx::query_as::<_, LookupEntry>(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(entry)
    }

    /// Lists rows ordered by name, ignoring case.
    ///
    /// `search` matches a case-insensitive substring of name or notes;
    /// `created` keeps rows created inside the window.
    pub async fn list(
        &self,
        search: Option<&str>,
        created: CreatedRange,
        page: Page,
    ) -> DbResult<Vec<LookupEntry>> {
        debug!(table = self.table(), search = ?search, created = ?created, "Listing lookup entries");

        let sql = format!(
            r#"
            SELECT id, name, notes, created_at, updated_at
            FROM {}
            WHERE (?1 IS NULL OR search_text LIKE ?1 ESCAPE '\')
              AND (?2 IS NULL OR created_at >= ?2)
              AND (?3 IS NULL OR created_at < ?3)
            ORDER BY name_key, name
            LIMIT ?4 OFFSET ?5
            "#,
            self.table()
        );
        let entries = sqlx::query_as::<_, LookupEntry>(&sql)
            .bind(like_pattern(search))
            .bind(created.after)
            .bind(created.before)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = entries.len(), "Listed lookup entries");
        Ok(entries)
    }

    /// Replaces name and notes, bumping `updated_at`.
    pub async fn update(&self, id: &str, input: NewLookup) -> DbResult<LookupEntry> {
        let input = input.into_valid()?;

        debug!(table = self.table(), id = %id, "Updating lookup entry");

        let sql = format!(
            r#"
            UPDATE {}
            SET name = ?2, notes = ?3, name_key = ?4, search_text = ?5, updated_at = ?6
            WHERE id = ?1
            "#,
            self.table()
        );
        let result = sqlx::query(&sql)
            .bind(id)
            .bind(&input.name)
            .bind(&input.notes)
            .bind(name_key([input.name.as_str()]))
            .bind(search_text([input.name.as_str(), input.notes.as_str()]))
            .bind(now())
            .execute(&self.pool)
            .await
            .map_err(|e| DbError::from(e).with_value(&input.name))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(self.kind.entity_name(), id));
        }

        self.get(id).await
    }

    /// Deletes a row.
    ///
    /// ## Returns
    /// * `Err(DbError::Protected)` - still referenced; nothing was removed
    /// * `Err(DbError::NotFound)` - no such row
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(table = self.table(), id = %id, "Deleting lookup entry");

        let sql = format!("DELETE FROM {} WHERE id = ?1", self.table());
        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                DbError::from(e).protect_delete(
                    self.kind.entity_name(),
                    id,
                    self.kind.referenced_by(),
                )
            })?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(self.kind.entity_name(), id));
        }

        Ok(())
    }

    /// Counts rows (for diagnostics and seeding).
    pub async fn count(&self) -> DbResult<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.table());
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
