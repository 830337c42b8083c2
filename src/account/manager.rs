/// Account manager: persistence for users and their credentials
use crate::{
    account::{password, Role, User, UserWithPassword},
    db,
    error::{CatalogError, CatalogResult},
};
use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

const USER_COLUMNS: &str = "id, username, email, role, bio, created_at, deleted_at";

/// Account manager service
#[derive(Clone)]
pub struct AccountManager {
    db: SqlitePool,
}

impl AccountManager {
    /// Create a new account manager
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Register a new account with the given role
    ///
    /// The password must already have passed the password policy.
    pub async fn create_account(
        &self,
        username: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> CatalogResult<User> {
        if self.username_exists(username).await? {
            return Err(CatalogError::already_exists("user", "username", username));
        }

        if self.email_exists(email).await? {
            return Err(CatalogError::already_exists("user", "email", email));
        }

        let password_hash = password::hash_password(password)?;
        let now = Utc::now();

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO users (username, email, pass_hash, role, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING id",
        )
        .bind(username)
        .bind(email)
        .bind(&password_hash)
        .bind(role.as_str())
        .bind(now)
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            // Lost a race against a concurrent registration
            if db::is_unique_violation(&e) {
                CatalogError::already_exists("user", "username or email", username)
            } else {
                e.into()
            }
        })?;

        tracing::info!(user_id = id, username, role = role.as_str(), "user registered");

        Ok(User {
            id,
            username: username.to_string(),
            email: email.to_string(),
            role,
            bio: None,
            created_at: now,
            deleted_at: None,
        })
    }

    /// Check credentials and return the matching user
    ///
    /// Unknown or deleted email is `NotFound`, a wrong password is
    /// `Authentication`.
    pub async fn login(&self, email: &str, password: &str) -> CatalogResult<User> {
        let account = self.get_account_by_email(email).await?;

        if !password::verify_password(password, &account.password_hash)? {
            return Err(CatalogError::Authentication("Invalid credentials".to_string()));
        }

        Ok(account.user)
    }

    /// Get user by id
    pub async fn get_account(&self, id: i64) -> CatalogResult<User> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM users WHERE id = ?1 AND deleted_at IS NULL",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| CatalogError::not_found("user", "id", id))?;

        user_from_row(&row)
    }

    /// Get user by username
    pub async fn get_account_by_username(&self, username: &str) -> CatalogResult<User> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM users WHERE username = ?1 AND deleted_at IS NULL",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| CatalogError::not_found("user", "username", username))?;

        user_from_row(&row)
    }

    /// Get user by email, together with the password hash
    async fn get_account_by_email(&self, email: &str) -> CatalogResult<UserWithPassword> {
        let row = sqlx::query(&format!(
            "SELECT {}, pass_hash FROM users WHERE email = ?1 AND deleted_at IS NULL",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| CatalogError::not_found("user", "email", email))?;

        Ok(UserWithPassword {
            user: user_from_row(&row)?,
            password_hash: row.get("pass_hash"),
        })
    }

    /// Replace the user's bio
    pub async fn update_bio(&self, id: i64, bio: Option<&str>) -> CatalogResult<User> {
        let result = sqlx::query("UPDATE users SET bio = ?1 WHERE id = ?2 AND deleted_at IS NULL")
            .bind(bio)
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CatalogError::not_found("user", "id", id));
        }

        tracing::info!(user_id = id, "user updated");

        self.get_account(id).await
    }

    /// Change the user's role
    pub async fn update_role(&self, id: i64, role: Role) -> CatalogResult<User> {
        let result = sqlx::query("UPDATE users SET role = ?1 WHERE id = ?2 AND deleted_at IS NULL")
            .bind(role.as_str())
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CatalogError::not_found("user", "id", id));
        }

        tracing::info!(user_id = id, role = role.as_str(), "user role updated");

        self.get_account(id).await
    }

    /// Soft-delete a user
    pub async fn delete_account(&self, id: i64) -> CatalogResult<()> {
        let result = sqlx::query(
            "UPDATE users SET deleted_at = ?1 WHERE id = ?2 AND deleted_at IS NULL",
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CatalogError::not_found("user", "id", id));
        }

        tracing::info!(user_id = id, "user deleted");

        Ok(())
    }

    async fn username_exists(&self, username: &str) -> CatalogResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE username = ?1")
            .bind(username)
            .fetch_one(&self.db)
            .await?;

        Ok(count > 0)
    }

    async fn email_exists(&self, email: &str) -> CatalogResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = ?1")
            .bind(email)
            .fetch_one(&self.db)
            .await?;

        Ok(count > 0)
    }
}

fn user_from_row(row: &SqliteRow) -> CatalogResult<User> {
    let role: String = row.get("role");

    Ok(User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        role: Role::parse(&role).map_err(|_| {
            CatalogError::internal(format!("Stored role {} is not recognized", role))
        })?,
        bio: row.get("bio"),
        created_at: row.get("created_at"),
        deleted_at: row.get("deleted_at"),
    })
}
