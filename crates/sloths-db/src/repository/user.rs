//! # User Repository
//!
//! Login accounts and the revoked-token list used by logout.
//!
//! Passwords are stored as Argon2 PHC strings; the plain text never leaves
//! this module.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use sloths_core::{NewUser, User};

use super::{new_id, now};
use crate::error::{DbError, DbResult};

const USER_COLUMNS: &str = "id, username, password_hash, is_active, created_at, last_login_at";

/// Repository for user accounts.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Creates an active account.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - username taken
    /// * `Err(DbError::Validation)` - bad username or short password
    pub async fn create(&self, input: NewUser) -> DbResult<User> {
        let input = input.into_valid()?;
        let password_hash = hash_password(&input.password)?;

        let user = User {
            id: new_id(),
            username: input.username,
            password_hash,
            is_active: true,
            created_at: now(),
            last_login_at: None,
        };

        info!(username = %user.username, "Creating user");

        sqlx::query(
            r#"
            INSERT INTO users (id, username, password_hash, is_active, created_at, last_login_at)
            VALUES (?1, ?2, ?3, ?4, ?5, NULL)
            "#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.is_active)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_value(&user.username))?;

        Ok(user)
    }

    /// Gets a user by ID.
    pub async fn get(&self, id: &str) -> DbResult<User> {
        let sql = format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS);
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("User", id))
    }

    /// Finds a user by username.
    pub async fn find_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE username = ?1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Checks credentials and records the login time.
    ///
    /// ## Returns
    /// * `Ok(Some(User))` - password matches and the account is active
    /// * `Ok(None)` - unknown user, wrong password or inactive account
    pub async fn authenticate(&self, username: &str, password: &str) -> DbResult<Option<User>> {
        let Some(mut user) = self.find_by_username(username.trim()).await? else {
            debug!(username = %username, "Login for unknown user");
            return Ok(None);
        };

        if !verify_password(password, &user.password_hash) {
            warn!(username = %user.username, "Login with wrong password");
            return Ok(None);
        }

        if !user.is_active {
            warn!(username = %user.username, "Login for inactive user");
            return Ok(None);
        }

        let logged_in_at = now();
        sqlx::query("UPDATE users SET last_login_at = ?2 WHERE id = ?1")
            .bind(&user.id)
            .bind(logged_in_at)
            .execute(&self.pool)
            .await?;
        user.last_login_at = Some(logged_in_at);

        Ok(Some(user))
    }

    /// Activates or deactivates an account.
    pub async fn set_active(&self, id: &str, active: bool) -> DbResult<()> {
        let result = sqlx::query("UPDATE users SET is_active = ?2 WHERE id = ?1")
            .bind(id)
            .bind(active)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        info!(id = %id, active, "Changed user activity");
        Ok(())
    }

    /// Replaces a user's password.
    pub async fn set_password(&self, id: &str, password: &str) -> DbResult<()> {
        sloths_core::validation::validate_password(password)?;
        let hash = hash_password(password)?;

        let result = sqlx::query("UPDATE users SET password_hash = ?2 WHERE id = ?1")
            .bind(id)
            .bind(hash)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }
        Ok(())
    }

    /// Deletes an account. A linked responsible person stays, unlinked.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        info!(id = %id, "Deleted user");
        Ok(())
    }

    /// Counts accounts.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    // =========================================================================
    // Revoked tokens
    // =========================================================================

    /// Adds a token ID to the revocation list. Revoking twice is a no-op.
    pub async fn revoke_token(
        &self,
        jti: &str,
        user_id: &str,
        expires_at: DateTime<Utc>,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO revoked_tokens (jti, user_id, expires_at, revoked_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(jti) DO NOTHING
            "#,
        )
        .bind(jti)
        .bind(user_id)
        .bind(expires_at)
        .bind(now())
        .execute(&self.pool)
        .await?;

        debug!(user_id = %user_id, "Revoked token");
        Ok(())
    }

    /// True if the token ID was revoked.
    pub async fn is_token_revoked(&self, jti: &str) -> DbResult<bool> {
        let revoked: i64 =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM revoked_tokens WHERE jti = ?1)")
                .bind(jti)
                .fetch_one(&self.pool)
                .await?;
        Ok(revoked != 0)
    }

    /// Drops revocation entries for tokens that have expired anyway.
    pub async fn purge_expired_tokens(&self, before: DateTime<Utc>) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM revoked_tokens WHERE expires_at < ?1")
            .bind(before)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

// =============================================================================
// Password hashing
// =============================================================================

/// Hashes a password with Argon2 and a random salt.
pub fn hash_password(password: &str) -> DbResult<String> {
    use argon2::{
        password_hash::{rand_core::OsRng, SaltString},
        Argon2, PasswordHasher,
    };

    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| DbError::Internal(format!("Failed to hash password: {}", e)))?;

    Ok(hash.to_string())
}

/// Verifies a password against a stored PHC string.
pub fn verify_password(password: &str, hash: &str) -> bool {
    use argon2::{Argon2, PasswordHash, PasswordVerifier};

    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

// =============================================================================
// Unit Tests
// =============================================================================
