//! # User Repository
//!
//! Owners of receipts. Authentication happens outside this workspace; the
//! store only needs a row to hang receipts off and to cascade deletes.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use tally_core::validation::validate_username;
use tally_core::UserId;

/// A `users` row.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

/// Repository for user rows.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Registers a username.
    ///
    /// ## Errors
    /// - `UniqueViolation` if the username is taken
    /// - `InvalidInput` if the username is malformed
    pub async fn create(&self, username: &str) -> DbResult<User> {
        let username = username.trim();
        validate_username(username).map_err(|e| DbError::InvalidInput {
            message: e.to_string(),
        })?;

        debug!(username = %username, "Creating user");

        let created_at = Utc::now();
        let result = sqlx::query("INSERT INTO users (username, created_at) VALUES (?1, ?2)")
            .bind(username)
            .bind(created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::UniqueViolation { field, .. } => DbError::duplicate(field, username),
                other => other,
            })?;

        let user = User {
            id: result.last_insert_rowid(),
            username: username.to_string(),
            created_at,
        };
        info!(user_id = user.id, username = %user.username, "User created");

        Ok(user)
    }

    /// Gets a user by ID.
    pub async fn get_by_id(&self, id: UserId) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, created_at FROM users WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Gets a user by username.
    pub async fn get_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, created_at FROM users WHERE username = ?1",
        )
        .bind(username.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Deletes a user. Their receipts and line items go with them.
    pub async fn delete(&self, id: UserId) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id.to_string()));
        }

        info!(user_id = id, "User deleted");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
