//! # Responsible Repository
//!
//! People items can be assigned to. A responsible person may be linked to at
//! most one login account, and each account to at most one person.

use sqlx::SqlitePool;
use tracing::debug;

use sloths_core::search::{name_key, search_text};
use sloths_core::{CreatedRange, NewResponsible, Page, Responsible};

use super::{ensure_reference, like_pattern, new_id, now};
use crate::error::{DbError, DbResult};

const RESPONSIBLE_COLUMNS: &str = r#"
    id, last_name, first_name, middle_name, employee_id, user_id,
    notes, created_at, updated_at
"#;

/// Folded `(name_key, search_text)` for one person.
fn folded(
    last_name: &str,
    first_name: &str,
    middle_name: Option<&str>,
    employee_id: &str,
    notes: &str,
) -> (String, String) {
    let middle_name = middle_name.unwrap_or_default();
    (
        name_key([last_name, first_name, middle_name]),
        search_text([last_name, first_name, middle_name, employee_id, notes]),
    )
}

/// Repository for responsible persons.
#[derive(Debug, Clone)]
pub struct ResponsibleRepository {
    pool: SqlitePool,
}

impl ResponsibleRepository {
    /// Creates a new ResponsibleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ResponsibleRepository { pool }
    }

    /// Inserts a new responsible person.
    ///
    /// ## Returns
    /// * `Err(DbError::InvalidReference)` - `user_id` names no account
    /// * `Err(DbError::UniqueViolation)` - that account is already linked
    pub async fn create(&self, input: NewResponsible) -> DbResult<Responsible> {
        let input = input.into_valid()?;
        if let Some(user_id) = &input.user_id {
            ensure_reference(&self.pool, "users", "User", user_id).await?;
        }

        let now = now();
        let responsible = Responsible {
            id: new_id(),
            last_name: input.last_name,
            first_name: input.first_name,
            middle_name: input.middle_name,
            employee_id: input.employee_id,
            user_id: input.user_id,
            notes: input.notes,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %responsible.id, name = %responsible.full_name(), "Creating responsible");

        let (key, text) = folded(
            &responsible.last_name,
            &responsible.first_name,
            responsible.middle_name.as_deref(),
            &responsible.employee_id,
            &responsible.notes,
        );

        sqlx::query(
            r#"
            INSERT INTO responsibles (
                id, last_name, first_name, middle_name, employee_id, user_id,
                notes, name_key, search_text, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&responsible.id)
        .bind(&responsible.last_name)
        .bind(&responsible.first_name)
        .bind(&responsible.middle_name)
        .bind(&responsible.employee_id)
        .bind(&responsible.user_id)
        .bind(&responsible.notes)
        .bind(key)
        .bind(text)
        .bind(responsible.created_at)
        .bind(responsible.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_value(responsible.user_id.clone().unwrap_or_default()))?;

        Ok(responsible)
    }

    /// Gets a responsible person by ID.
    pub async fn get(&self, id: &str) -> DbResult<Responsible> {
        let sql = format!("SELECT {} FROM responsibles WHERE id = ?1", RESPONSIBLE_COLUMNS);
        sqlx::query_as::<_, Responsible>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Responsible", id))
    }

    /// Finds the person linked to a login account.
    pub async fn find_by_user(&self, user_id: &str) -> DbResult<Option<Responsible>> {
        let sql = format!(
            "SELECT {} FROM responsibles WHERE user_id = ?1",
            RESPONSIBLE_COLUMNS
        );
        let responsible = sqlx::query_as::<_, Responsible>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(responsible)
    }

    /// Lists people ordered by last, first and middle name, ignoring case.
    ///
    /// `search` matches any name part, the employee ID or the notes.
    pub async fn list(
        &self,
        search: Option<&str>,
        created: CreatedRange,
        page: Page,
    ) -> DbResult<Vec<Responsible>> {
        debug!(search = ?search, created = ?created, "Listing responsibles");

        let sql = format!(
            r#"
            SELECT {}
            FROM responsibles
            WHERE (?1 IS NULL OR search_text LIKE ?1 ESCAPE '\')
              AND (?2 IS NULL OR created_at >= ?2)
              AND (?3 IS NULL OR created_at < ?3)
            ORDER BY name_key, id
            LIMIT ?4 OFFSET ?5
            "#,
            RESPONSIBLE_COLUMNS
        );
        let people = sqlx::query_as::<_, Responsible>(&sql)
            .bind(like_pattern(search))
            .bind(created.after)
            .bind(created.before)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(people)
    }

    /// Replaces every field of a responsible person.
    pub async fn update(&self, id: &str, input: NewResponsible) -> DbResult<Responsible> {
        let input = input.into_valid()?;
        if let Some(user_id) = &input.user_id {
            ensure_reference(&self.pool, "users", "User", user_id).await?;
        }

        debug!(id = %id, "Updating responsible");

        let (key, text) = folded(
            &input.last_name,
            &input.first_name,
            input.middle_name.as_deref(),
            &input.employee_id,
            &input.notes,
        );

        let result = sqlx::query(
            r#"
            UPDATE responsibles SET
                last_name = ?2,
                first_name = ?3,
                middle_name = ?4,
                employee_id = ?5,
                user_id = ?6,
                notes = ?7,
                name_key = ?8,
                search_text = ?9,
                updated_at = ?10
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&input.last_name)
        .bind(&input.first_name)
        .bind(&input.middle_name)
        .bind(&input.employee_id)
        .bind(&input.user_id)
        .bind(&input.notes)
        .bind(key)
        .bind(text)
        .bind(now())
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_value(input.user_id.clone().unwrap_or_default()))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Responsible", id));
        }

        self.get(id).await
    }

    /// Deletes a person. Fails with `Protected` while any operation names them.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting responsible");

        let result = sqlx::query("DELETE FROM responsibles WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| DbError::from(e).protect_delete("Responsible", id, "operations"))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Responsible", id));
        }

        Ok(())
    }

    /// Counts responsible persons.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM responsibles")
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
    use sloths_core::NewUser;

    fn person(last: &str, first: &str, middle: Option<&str>) -> NewResponsible {
        NewResponsible {
            last_name: last.to_string(),
            first_name: first.to_string(),
            middle_name: middle.map(str::to_string),
            employee_id: String::new(),
            user_id: None,
            notes: String::new(),
        }
    }

    #[tokio::test]
    async fn test_full_name() {
        let db = test_support::db().await;
        let repo = db.responsibles();

        let with_middle = repo
            .create(person("Ivanov", "Ivan", Some("Ivanovich")))
            .await
            .unwrap();
        assert_eq!(with_middle.full_name(), "Ivanov Ivan Ivanovich");

        let without = repo.create(person("Petrov", "Petr", Some(" "))).await.unwrap();
        assert_eq!(without.middle_name, None);
        assert_eq!(repo.get(&without.id).await.unwrap().full_name(), "Petrov Petr");
    }

    #[tokio::test]
    async fn test_list_ordering_and_search() {
        let db = test_support::db().await;
        let repo = db.responsibles();

        repo.create(person("Sidorov", "Anton", None)).await.unwrap();
        repo.create(person("Ivanov", "Boris", None)).await.unwrap();
        let mut with_number = person("Ivanov", "Anna", None);
        with_number.employee_id = "E-0042".to_string();
        repo.create(with_number).await.unwrap();

        let all = repo
            .list(None, CreatedRange::default(), Page::default())
            .await
            .unwrap();
        let names: Vec<_> = all.iter().map(Responsible::full_name).collect();
        assert_eq!(names, ["Ivanov Anna", "Ivanov Boris", "Sidorov Anton"]);

        let found = repo
            .list(Some("0042"), CreatedRange::default(), Page::default())
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].first_name, "Anna");
    }

    #[tokio::test]
    async fn test_cyrillic_search_and_ordering() {
        let db = test_support::db().await;
        let repo = db.responsibles();

        repo.create(person("Петров", "Пётр", None)).await.unwrap();
        repo.create(person("иванова", "Анна", Some("Сергеевна"))).await.unwrap();
        repo.create(person("Иванов", "Борис", None)).await.unwrap();

        let all = repo
            .list(None, CreatedRange::default(), Page::default())
            .await
            .unwrap();
        let names: Vec<_> = all.iter().map(Responsible::full_name).collect();
        assert_eq!(
            names,
            ["Иванов Борис", "иванова Анна Сергеевна", "Петров Пётр"]
        );

        let found = repo
            .list(Some("СЕРГЕЕВНА"), CreatedRange::default(), Page::default())
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].first_name, "Анна");

        let found = repo
            .list(Some("иванов"), CreatedRange::default(), Page::default())
            .await
            .unwrap();
        assert_eq!(found.len(), 2);
    }

    #[tokio::test]
    async fn test_user_link_is_one_to_one() {
        let db = test_support::db().await;
        let user = db
            .users()
            .create(NewUser {
                username: "ivanov".to_string(),
                password: "correct horse".to_string(),
            })
            .await
            .unwrap();

        let mut first = person("Ivanov", "Ivan", None);
        first.user_id = Some(user.id.clone());
        let linked = db.responsibles().create(first).await.unwrap();

        let mut second = person("Petrov", "Petr", None);
        second.user_id = Some(user.id.clone());
        let err = db.responsibles().create(second).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));

        let found = db.responsibles().find_by_user(&user.id).await.unwrap();
        assert_eq!(found.map(|r| r.id), Some(linked.id));
    }

    #[tokio::test]
    async fn test_unknown_user_rejected() {
        let db = test_support::db().await;
        let mut input = person("Ivanov", "Ivan", None);
        input.user_id = Some("00000000-0000-4000-8000-000000000000".to_string());

        let err = db.responsibles().create(input).await.unwrap_err();
        assert!(matches!(err, DbError::InvalidReference { .. }));
    }

    #[tokio::test]
    async fn test_deleting_user_unlinks_responsible() {
        let db = test_support::db().await;
        let user = db
            .users()
            .create(NewUser {
                username: "temp".to_string(),
                password: "correct horse".to_string(),
            })
            .await
            .unwrap();

        let mut input = person("Ivanov", "Ivan", None);
        input.user_id = Some(user.id.clone());
        let responsible = db.responsibles().create(input).await.unwrap();

        db.users().delete(&user.id).await.unwrap();

        let reloaded = db.responsibles().get(&responsible.id).await.unwrap();
        assert_eq!(reloaded.user_id, None);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let db = test_support::db().await;
        let repo = db.responsibles();

        let created = repo.create(person("Ivanov", "Ivan", None)).await.unwrap();
        let updated = repo
            .update(&created.id, person("Ivanova", "Maria", Some("Petrovna")))
            .await
            .unwrap();
        assert_eq!(updated.full_name(), "Ivanova Maria Petrovna");

        repo.delete(&created.id).await.unwrap();
        assert!(matches!(
            repo.get(&created.id).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
