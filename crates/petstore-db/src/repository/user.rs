//! # User Repository
//!
//! Database operations for store accounts.
//!
//! Password hashes never leave this module except through
//! [`UserRepository::credentials`]; [`User`] carries no credentials.
//! Hashing itself happens in the caller, this crate only stores PHC strings.

use std::collections::HashSet;

use chrono::Utc;
use sqlx::sqlite::SqliteConnection;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::pool::Database;
use petstore_core::validation::validate_new_user;
use petstore_core::{BatchOutcome, NewUser, User, UserId, UserPatch, MAX_BATCH_USERS};

const USER_COLUMNS: &str = "id, username, role, email, first_name, last_name, phone, user_status, created_at";

/// Repository for user database operations.
///
/// ## Usage
/// ```rust,ignore
/// let hash = hash_password(&new_user.password)?;
/// let user = db.users().insert(&new_user, &hash).await?;
/// ```
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: Database,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(db: Database) -> Self {
        UserRepository { db }
    }

    /// Gets a user by ID.
    pub async fn get_by_id(&self, id: UserId) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"))
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(user)
    }

    /// Gets a user by username.
    pub async fn get_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let mut conn = self.db.pool().acquire().await?;
        get_by_username(&mut conn, username).await
    }

    /// Returns the user and stored password hash, for login.
    pub async fn credentials(&self, username: &str) -> DbResult<Option<(User, String)>> {
        let Some(user) = self.get_by_username(username).await? else {
            return Ok(None);
        };

        let hash: String = sqlx::query_scalar("SELECT password_hash FROM users WHERE id = ?1")
            .bind(user.id)
            .fetch_one(self.db.pool())
            .await?;

        Ok(Some((user, hash)))
    }

    /// Inserts a user with an already hashed password.
    ///
    /// ## Returns
    /// * `Ok(User)` - The stored user
    /// * `Err(DbError::UniqueViolation)` - Username taken
    pub async fn insert(&self, user: &NewUser, password_hash: &str) -> DbResult<User> {
        debug!(username = %user.username, "Inserting user");

        let mut unit = self.db.atomic().await?;
        let created = insert(unit.conn(), user, password_hash).await?;
        unit.commit().await?;

        info!(user_id = created.id, username = %created.username, "User created");
        Ok(created)
    }

    /// Creates many users, reporting one outcome per input in input order.
    ///
    /// Invalid items and usernames already taken (in the store or earlier in
    /// the batch) are reported, not dropped. Valid items are written together
    /// in one atomic unit. `hash` runs before the unit is opened.
    pub async fn create_with_list<F>(&self, items: &[NewUser], hash: F) -> DbResult<Vec<BatchOutcome>>
    where
        F: Fn(&str) -> Result<String, String>,
    {
        if items.len() > MAX_BATCH_USERS {
            return Err(DbError::Internal(format!(
                "batch of {} exceeds {MAX_BATCH_USERS} users",
                items.len()
            )));
        }

        info!(count = items.len(), "Creating users from list");

        // Validate and hash outside the write gate.
        let prepared: Vec<Result<String, String>> = items
            .iter()
            .map(|item| {
                validate_new_user(item).map_err(|e| e.to_string())?;
                hash(&item.password)
            })
            .collect();

        let mut unit = self.db.atomic().await?;
        let conn = unit.conn();

        let mut seen = HashSet::new();
        let mut outcomes = Vec::with_capacity(items.len());

        for (item, prepared) in items.iter().zip(prepared) {
            let username = item.username.trim().to_string();

            let password_hash = match prepared {
                Ok(hash) => hash,
                Err(reason) => {
                    outcomes.push(BatchOutcome::Invalid { username, reason });
                    continue;
                }
            };

            if !seen.insert(username.clone()) || get_by_username(conn, &username).await?.is_some() {
                outcomes.push(BatchOutcome::Duplicate { username });
                continue;
            }

            let user = insert(conn, item, &password_hash).await?;
            outcomes.push(BatchOutcome::Created { user });
        }

        unit.commit().await?;
        Ok(outcomes)
    }

    /// Applies a profile patch. `password_hash` replaces the stored hash when given.
    ///
    /// ## Returns
    /// * `Ok(User)` - The user after the patch
    /// * `Err(DbError::NotFound)` - No such username
    pub async fn update(&self, username: &str, patch: &UserPatch, password_hash: Option<&str>) -> DbResult<User> {
        debug!(username = %username, "Updating user");

        let mut unit = self.db.atomic().await?;
        let conn = unit.conn();

        let current = get_by_username(conn, username)
            .await?
            .ok_or_else(|| DbError::not_found("User", username))?;

        let email = patch.email.clone().unwrap_or(current.email);
        let first_name = patch.first_name.clone().unwrap_or(current.first_name);
        let last_name = patch.last_name.clone().unwrap_or(current.last_name);
        let phone = patch.phone.clone().unwrap_or(current.phone);
        let user_status = patch.user_status.unwrap_or(current.user_status);
        let role = patch.role.unwrap_or(current.role);

        let updated = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET email = ?2, first_name = ?3, last_name = ?4, phone = ?5,
                user_status = ?6, role = ?7,
                password_hash = COALESCE(?8, password_hash),
                updated_at = ?9
            WHERE id = ?1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(current.id)
        .bind(email)
        .bind(first_name)
        .bind(last_name)
        .bind(phone)
        .bind(user_status)
        .bind(role)
        .bind(password_hash)
        .bind(Utc::now())
        .fetch_one(&mut *conn)
        .await?;

        unit.commit().await?;
        Ok(updated)
    }

    /// Counts total users (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(self.db.pool())
            .await?;

        Ok(count)
    }
}

// =============================================================================
// In-unit Operations
// =============================================================================

pub(crate) async fn get_by_username(conn: &mut SqliteConnection, username: &str) -> DbResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"))
        .bind(username.trim())
        .fetch_optional(&mut *conn)
        .await?;
    Ok(user)
}

async fn insert(conn: &mut SqliteConnection, user: &NewUser, password_hash: &str) -> DbResult<User> {
    let username = user.username.trim();
    let now = Utc::now();

    sqlx::query_as::<_, User>(&format!(
        r#"
        INSERT INTO users (username, password_hash, role, email, first_name, last_name, phone,
                           user_status, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1, ?8, ?8)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(username)
    .bind(password_hash)
    .bind(user.role.unwrap_or_default())
    .bind(&user.email)
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(&user.phone)
    .bind(now)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| match DbError::from(e) {
        DbError::UniqueViolation { .. } => DbError::duplicate("username", username),
        other => other,
    })
}

/// Deletes the user row; historical orders cascade.
pub(crate) async fn delete(conn: &mut SqliteConnection, id: UserId) -> DbResult<bool> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?1")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() == 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DbConfig;
    use petstore_core::Role;

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn new_user(username: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            password: "correct-horse".to_string(),
            email: Some(format!("{username}@example.com")),
            ..Default::default()
        }
    }

    fn fake_hash(password: &str) -> Result<String, String> {
        Ok(format!("hashed:{password}"))
    }

    #[tokio::test]
    async fn test_insert_defaults_to_customer() {
        let db = db().await;
        let user = db.users().insert(&new_user("alice"), "h").await.unwrap();

        assert_eq!(user.role, Role::Customer);
        assert_eq!(user.user_status, 1);

        let (found, hash) = db.users().credentials("alice").await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(hash, "h");
        assert!(db.users().credentials("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username() {
        let db = db().await;
        db.users().insert(&new_user("alice"), "h").await.unwrap();

        let err = db.users().insert(&new_user("alice"), "h").await.unwrap_err();
        match err {
            DbError::UniqueViolation { field, value } => {
                assert_eq!(field, "username");
                assert_eq!(value, "alice");
            }
            other => panic!("expected UniqueViolation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_with_list_reports_every_item() {
        let db = db().await;
        db.users().insert(&new_user("taken"), "h").await.unwrap();

        let items = vec![
            new_user("bob"),
            new_user("taken"),
            new_user("bob"),
            NewUser {
                password: "short".to_string(),
                ..new_user("carol")
            },
            NewUser {
                role: Some(Role::StoreOwner),
                ..new_user("dave")
            },
        ];

        let outcomes = db.users().create_with_list(&items, fake_hash).await.unwrap();
        assert_eq!(outcomes.len(), items.len());

        assert!(matches!(&outcomes[0], BatchOutcome::Created { user } if user.username == "bob"));
        assert!(matches!(&outcomes[1], BatchOutcome::Duplicate { username } if username == "taken"));
        assert!(matches!(&outcomes[2], BatchOutcome::Duplicate { username } if username == "bob"));
        assert!(matches!(&outcomes[3], BatchOutcome::Invalid { username, .. } if username == "carol"));
        assert!(matches!(&outcomes[4], BatchOutcome::Created { user } if user.role == Role::StoreOwner));

        let (_, hash) = db.users().credentials("bob").await.unwrap().unwrap();
        assert_eq!(hash, "hashed:correct-horse");
    }

    #[tokio::test]
    async fn test_update_patch_and_password() {
        let db = db().await;
        db.users().insert(&new_user("alice"), "old").await.unwrap();

        let patch = UserPatch {
            email: Some(None),
            first_name: Some(Some("Alice".to_string())),
            role: Some(Role::Admin),
            ..Default::default()
        };
        let updated = db.users().update("alice", &patch, Some("new")).await.unwrap();

        assert!(updated.email.is_none());
        assert_eq!(updated.first_name.as_deref(), Some("Alice"));
        assert_eq!(updated.role, Role::Admin);

        let (_, hash) = db.users().credentials("alice").await.unwrap().unwrap();
        assert_eq!(hash, "new");

        let untouched = db.users().update("alice", &UserPatch::default(), None).await.unwrap();
        assert_eq!(untouched.first_name.as_deref(), Some("Alice"));
        let (_, hash) = db.users().credentials("alice").await.unwrap().unwrap();
        assert_eq!(hash, "new");
    }

    #[tokio::test]
    async fn test_update_unknown_user() {
        let db = db().await;
        let err = db.users().update("ghost", &UserPatch::default(), None).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
