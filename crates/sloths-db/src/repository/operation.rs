//! # Operation Repository
//!
//! The append-only history log. Recording an operation is the only way to
//! change an item's status, location or responsible person.
//!
//! ## Current State
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  record(item, {status, responsible, location})                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  INSERT INTO operations (..., created_at = now)                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  current_state(item)                                                    │
//! │    = latest row: ORDER BY created_at DESC, rowid DESC LIMIT 1           │
//! │    = None when the item has no history                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rows are never updated: the schema rejects UPDATE with a trigger, and they
//! are removed only when their item is deleted.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};

use sloths_core::{CreatedRange, CurrentState, NewOperation, OperationView, Page};

use super::{ensure_reference, new_id, now};
use crate::error::{DbError, DbResult};

const OPERATION_VIEW_SELECT: &str = r#"
    SELECT
        o.id,
        o.rowid AS sequence,
        o.item_id,
        i.inventory_number,
        c.name AS category_name,
        t.name AS type_name,
        mf.name AS manufacturer_name,
        md.name AS model_name,
        o.status_id,
        s.name AS status_name,
        o.location_id,
        l.name AS location_name,
        o.responsible_id,
        r.last_name AS responsible_last_name,
        r.first_name AS responsible_first_name,
        r.middle_name AS responsible_middle_name,
        o.notes,
        o.created_at,
        o.updated_at
    FROM operations o
    INNER JOIN items i ON i.id = o.item_id
    INNER JOIN devices d ON d.id = i.device_id
    INNER JOIN categories c ON c.id = d.category_id
    INNER JOIN types t ON t.id = d.type_id
    INNER JOIN manufacturers mf ON mf.id = d.manufacturer_id
    INNER JOIN models md ON md.id = d.model_id
    INNER JOIN statuses s ON s.id = o.status_id
    INNER JOIN locations l ON l.id = o.location_id
    INNER JOIN responsibles r ON r.id = o.responsible_id
"#;

/// Filters for [`OperationRepository::list`]. All present filters must match.
#[derive(Debug, Clone, Default)]
pub struct OperationFilter {
    pub item_id: Option<String>,
    pub status_id: Option<String>,
    pub location_id: Option<String>,
    pub responsible_id: Option<String>,
    pub created: CreatedRange,
}

/// Repository for the operation log.
#[derive(Debug, Clone)]
pub struct OperationRepository {
    pool: SqlitePool,
}

impl OperationRepository {
    /// Creates a new OperationRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OperationRepository { pool }
    }

    /// Records an operation for an item, timestamped now.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - the item does not exist
    /// * `Err(DbError::InvalidReference)` - unknown status, location or person
    pub async fn record(&self, item_id: &str, input: NewOperation) -> DbResult<OperationView> {
        self.record_at(item_id, input, now()).await
    }

    /// Records an operation with an explicit creation time.
    ///
    /// Used when importing existing history. Any status may follow any
    /// other; the latest `created_at` decides the current state.
    pub async fn record_at(
        &self,
        item_id: &str,
        input: NewOperation,
        created_at: DateTime<Utc>,
    ) -> DbResult<OperationView> {
        let input = input.into_valid()?;
        self.ensure_item(item_id).await?;
        ensure_reference(&self.pool, "statuses", "Status", &input.status_id).await?;
        ensure_reference(&self.pool, "locations", "Location", &input.location_id).await?;
        ensure_reference(&self.pool, "responsibles", "Responsible", &input.responsible_id)
            .await?;

        let id = new_id();

        sqlx::query(
            r#"
            INSERT INTO operations (
                id, item_id, status_id, responsible_id, location_id,
                notes, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
            "#,
        )
        .bind(&id)
        .bind(item_id)
        .bind(&input.status_id)
        .bind(&input.responsible_id)
        .bind(&input.location_id)
        .bind(&input.notes)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        let operation = self.get(&id).await?;

        info!(
            item = %operation.inventory_number,
            status = %operation.status_name,
            location = %operation.location_name,
            "Recorded operation"
        );

        Ok(operation)
    }

    async fn ensure_item(&self, item_id: &str) -> DbResult<()> {
        let exists: i64 = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM items WHERE id = ?1)")
            .bind(item_id)
            .fetch_one(&self.pool)
            .await?;

        if exists == 0 {
            return Err(DbError::not_found("Item", item_id));
        }
        Ok(())
    }

    /// Gets one operation with all referenced names.
    pub async fn get(&self, id: &str) -> DbResult<OperationView> {
        let sql = format!("{} WHERE o.id = ?1", OPERATION_VIEW_SELECT);
        sqlx::query_as::<_, OperationView>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Operation", id))
    }

    /// Full history of one item, newest first.
    pub async fn history(&self, item_id: &str) -> DbResult<Vec<OperationView>> {
        self.ensure_item(item_id).await?;

        let sql = format!(
            "{} WHERE o.item_id = ?1 ORDER BY o.created_at DESC, o.rowid DESC",
            OPERATION_VIEW_SELECT
        );
        let history = sqlx::query_as::<_, OperationView>(&sql)
            .bind(item_id)
            .fetch_all(&self.pool)
            .await?;

        debug!(item_id = %item_id, count = history.len(), "Loaded item history");
        Ok(history)
    }

    /// Lists operations across items, newest first.
    pub async fn list(&self, filter: &OperationFilter, page: Page) -> DbResult<Vec<OperationView>> {
        debug!(?filter, "Listing operations");

        let sql = format!(
            r#"{}
            WHERE (?1 IS NULL OR o.item_id = ?1)
              AND (?2 IS NULL OR o.status_id = ?2)
              AND (?3 IS NULL OR o.location_id = ?3)
              AND (?4 IS NULL OR o.responsible_id = ?4)
              AND (?5 IS NULL OR o.created_at >= ?5)
              AND (?6 IS NULL OR o.created_at < ?6)
            ORDER BY o.created_at DESC, o.rowid DESC
            LIMIT ?7 OFFSET ?8
            "#,
            OPERATION_VIEW_SELECT
        );

        let operations = sqlx::query_as::<_, OperationView>(&sql)
            .bind(&filter.item_id)
            .bind(&filter.status_id)
            .bind(&filter.location_id)
            .bind(&filter.responsible_id)
            .bind(filter.created.after)
            .bind(filter.created.before)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(operations)
    }

    /// Current status, location and responsible person of an item.
    ///
    /// ## Returns
    /// * `Ok(Some(_))` - fields of the latest operation
    /// * `Ok(None)` - the item exists but has no history
    /// * `Err(DbError::NotFound)` - no such item
    pub async fn current_state(&self, item_id: &str) -> DbResult<Option<CurrentState>> {
        self.ensure_item(item_id).await?;

        let sql = format!(
            "{} WHERE o.item_id = ?1 ORDER BY o.created_at DESC, o.rowid DESC LIMIT 1",
            OPERATION_VIEW_SELECT
        );
        let latest = sqlx::query_as::<_, OperationView>(&sql)
            .bind(item_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(latest.as_ref().map(CurrentState::from))
    }

    /// Counts operations.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM operations")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support;
    use crate::Database;
    use chrono::{Duration, TimeZone};
    use sloths_core::{project_current_state, ItemView, LookupEntry, LookupKind, Responsible};

    struct Fixture {
        db: Database,
        item: ItemView,
        available: LookupEntry,
        in_use: LookupEntry,
        repair: LookupEntry,
        warehouse: LookupEntry,
        room: LookupEntry,
        ivanov: Responsible,
        petrov: Responsible,
    }

    async fn fixture() -> Fixture {
        let db = test_support::db().await;
        let device = test_support::device(&db, "A").await;
        let item = test_support::item(&db, &device, "INV-42").await;

        Fixture {
            available: test_support::lookup(&db, LookupKind::Status, "Available").await,
            in_use: test_support::lookup(&db, LookupKind::Status, "In use").await,
            repair: test_support::lookup(&db, LookupKind::Status, "Repair").await,
            warehouse: test_support::lookup(&db, LookupKind::Location, "Warehouse").await,
            room: test_support::lookup(&db, LookupKind::Location, "Room 101").await,
            ivanov: test_support::responsible(&db, "Ivanov", "Ivan").await,
            petrov: test_support::responsible(&db, "Petrov", "Petr").await,
            item,
            db,
        }
    }

    fn op(status: &LookupEntry, person: &Responsible, location: &LookupEntry) -> NewOperation {
        NewOperation {
            status_id: status.id.clone(),
            responsible_id: person.id.clone(),
            location_id: location.id.clone(),
            notes: String::new(),
        }
    }

    fn at(day: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap() + Duration::days(day)
    }

    #[tokio::test]
    async fn test_no_history_means_no_state() {
        let f = fixture().await;
        let repo = f.db.operations();

        assert_eq!(repo.current_state(&f.item.id).await.unwrap(), None);
        assert!(repo.history(&f.item.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_record_moves_current_state() {
        let f = fixture().await;
        let repo = f.db.operations();

        let first = repo
            .record(&f.item.id, op(&f.available, &f.petrov, &f.warehouse))
            .await
            .unwrap();
        assert_eq!(
            first.display(),
            "INV-42 - Category A | Type A | Maker A | Model A - Available (Warehouse)"
        );

        let state = repo.current_state(&f.item.id).await.unwrap().unwrap();
        assert_eq!(state.status_name, "Available");
        assert_eq!(state.responsible_name, "Petrov Petr");

        repo.record(&f.item.id, op(&f.in_use, &f.ivanov, &f.room))
            .await
            .unwrap();

        let state = repo.current_state(&f.item.id).await.unwrap().unwrap();
        assert_eq!(state.status_id, f.in_use.id);
        assert_eq!(state.location_id, f.room.id);
        assert_eq!(state.responsible_id, f.ivanov.id);

        // The item view carries the same projection.
        let item = f.db.items().get(&f.item.id).await.unwrap();
        assert_eq!(item.current, Some(state));
    }

    #[tokio::test]
    async fn test_latest_created_at_wins_not_insert_order() {
        let f = fixture().await;
        let repo = f.db.operations();

        repo.record_at(&f.item.id, op(&f.repair, &f.ivanov, &f.room), at(10))
            .await
            .unwrap();
        // Back-dated import arrives later but is older.
        repo.record_at(&f.item.id, op(&f.available, &f.petrov, &f.warehouse), at(1))
            .await
            .unwrap();

        let state = repo.current_state(&f.item.id).await.unwrap().unwrap();
        assert_eq!(state.status_name, "Repair");
        assert_eq!(state.since, at(10));

        let history = repo.history(&f.item.id).await.unwrap();
        let statuses: Vec<_> = history.iter().map(|o| o.status_name.as_str()).collect();
        assert_eq!(statuses, ["Repair", "Available"]);
    }

    #[tokio::test]
    async fn test_equal_timestamps_latest_insert_wins() {
        let f = fixture().await;
        let repo = f.db.operations();

        repo.record_at(&f.item.id, op(&f.in_use, &f.ivanov, &f.room), at(3))
            .await
            .unwrap();
        repo.record_at(&f.item.id, op(&f.repair, &f.ivanov, &f.warehouse), at(3))
            .await
            .unwrap();

        let state = repo.current_state(&f.item.id).await.unwrap().unwrap();
        assert_eq!(state.status_name, "Repair");
    }

    #[tokio::test]
    async fn test_sql_matches_in_memory_projection() {
        let f = fixture().await;
        let repo = f.db.operations();

        for (day, status) in [(5, &f.in_use), (2, &f.available), (5, &f.repair), (4, &f.in_use)] {
            repo.record_at(&f.item.id, op(status, &f.ivanov, &f.room), at(day))
                .await
                .unwrap();
        }

        let history = repo.history(&f.item.id).await.unwrap();
        let expected = project_current_state(&history);
        let actual = repo.current_state(&f.item.id).await.unwrap();

        assert_eq!(actual, expected);
        assert_eq!(actual.unwrap().status_name, "Repair");
    }

    #[tokio::test]
    async fn test_any_status_may_follow_any_other() {
        let f = fixture().await;
        let repo = f.db.operations();

        for status in [&f.repair, &f.repair, &f.available, &f.repair] {
            repo.record(&f.item.id, op(status, &f.ivanov, &f.room))
                .await
                .unwrap();
        }
        assert_eq!(repo.history(&f.item.id).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_unknown_item_and_references() {
        let f = fixture().await;
        let repo = f.db.operations();
        let missing = "00000000-0000-4000-8000-000000000000";

        let err = repo
            .record(missing, op(&f.in_use, &f.ivanov, &f.room))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        let mut bad = op(&f.in_use, &f.ivanov, &f.room);
        bad.location_id = missing.to_string();
        let err = repo.record(&f.item.id, bad).await.unwrap_err();
        assert!(matches!(err, DbError::InvalidReference { .. }));

        assert!(matches!(
            repo.current_state(missing).await,
            Err(DbError::NotFound { .. })
        ));
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_operations_are_append_only() {
        let f = fixture().await;
        let recorded = f
            .db
            .operations()
            .record(&f.item.id, op(&f.in_use, &f.ivanov, &f.room))
            .await
            .unwrap();

        let err = sqlx::query("UPDATE operations SET notes = 'edited' WHERE id = ?1")
            .bind(&recorded.id)
            .execute(f.db.pool())
            .await
            .map_err(DbError::from)
            .unwrap_err();
        assert!(matches!(err, DbError::ImmutableRow(_)));

        let reloaded = f.db.operations().get(&recorded.id).await.unwrap();
        assert_eq!(reloaded.notes, "");
        assert_eq!(reloaded.updated_at, reloaded.created_at);
    }

    #[tokio::test]
    async fn test_referenced_rows_are_protected() {
        let f = fixture().await;
        f.db.operations()
            .record(&f.item.id, op(&f.in_use, &f.ivanov, &f.room))
            .await
            .unwrap();

        let err = f
            .db
            .lookups(LookupKind::Status)
            .delete(&f.in_use.id)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Protected { .. }));

        let err = f
            .db
            .lookups(LookupKind::Location)
            .delete(&f.room.id)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Protected { .. }));

        let err = f.db.responsibles().delete(&f.ivanov.id).await.unwrap_err();
        assert!(matches!(err, DbError::Protected { .. }));

        // Unreferenced rows of the same tables can go.
        f.db.lookups(LookupKind::Status)
            .delete(&f.repair.id)
            .await
            .unwrap();
        f.db.responsibles().delete(&f.petrov.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_item_delete_cascades_history() {
        let f = fixture().await;
        let repo = f.db.operations();

        repo.record(&f.item.id, op(&f.available, &f.petrov, &f.warehouse))
            .await
            .unwrap();
        repo.record(&f.item.id, op(&f.in_use, &f.ivanov, &f.room))
            .await
            .unwrap();
        assert_eq!(repo.count().await.unwrap(), 2);

        f.db.items().delete(&f.item.id).await.unwrap();

        assert_eq!(repo.count().await.unwrap(), 0);
        assert!(matches!(
            repo.current_state(&f.item.id).await,
            Err(DbError::NotFound { .. })
        ));

        // With the history gone, the status is free to delete.
        f.db.lookups(LookupKind::Status)
            .delete(&f.in_use.id)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_list_filters_newest_first() {
        let f = fixture().await;
        let repo = f.db.operations();

        repo.record_at(&f.item.id, op(&f.available, &f.petrov, &f.warehouse), at(1))
            .await
            .unwrap();
        repo.record_at(&f.item.id, op(&f.in_use, &f.ivanov, &f.room), at(2))
            .await
            .unwrap();
        repo.record_at(&f.item.id, op(&f.repair, &f.ivanov, &f.warehouse), at(3))
            .await
            .unwrap();

        let all = repo
            .list(&OperationFilter::default(), Page::default())
            .await
            .unwrap();
        let statuses: Vec<_> = all.iter().map(|o| o.status_name.as_str()).collect();
        assert_eq!(statuses, ["Repair", "In use", "Available"]);

        let by_person = repo
            .list(
                &OperationFilter {
                    responsible_id: Some(f.ivanov.id.clone()),
                    ..Default::default()
                },
                Page::default(),
            )
            .await
            .unwrap();
        assert_eq!(by_person.len(), 2);

        let in_warehouse = repo
            .list(
                &OperationFilter {
                    location_id: Some(f.warehouse.id.clone()),
                    ..Default::default()
                },
                Page::new(Some(1), None),
            )
            .await
            .unwrap();
        assert_eq!(in_warehouse.len(), 1);
        assert_eq!(in_warehouse[0].status_name, "Repair");
    }

    #[tokio::test]
    async fn test_list_filters_by_creation_window() {
        let f = fixture().await;
        let repo = f.db.operations();

        for (day, status) in [(1, &f.available), (2, &f.in_use), (3, &f.repair), (4, &f.in_use)] {
            repo.record_at(&f.item.id, op(status, &f.ivanov, &f.room), at(day))
                .await
                .unwrap();
        }

        let window = |after: Option<i64>, before: Option<i64>| OperationFilter {
            created: CreatedRange::new(after.map(at), before.map(at)).unwrap(),
            ..Default::default()
        };
        let statuses = |ops: Vec<OperationView>| {
            ops.into_iter().map(|o| o.status_name).collect::<Vec<_>>()
        };

        // The lower bound is inclusive and the upper bound exclusive.
        let middle = repo.list(&window(Some(2), Some(4)), Page::default()).await.unwrap();
        assert_eq!(statuses(middle), ["Repair", "In use"]);

        let since = repo.list(&window(Some(3), None), Page::default()).await.unwrap();
        assert_eq!(statuses(since), ["In use", "Repair"]);

        let until = repo.list(&window(None, Some(2)), Page::default()).await.unwrap();
        assert_eq!(statuses(until), ["Available"]);

        // Combines with the other filters.
        let mut in_use_since = window(Some(3), None);
        in_use_since.status_id = Some(f.in_use.id.clone());
        let found = repo.list(&in_use_since, Page::default()).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].created_at, at(4));
    }
}
