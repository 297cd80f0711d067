//! Authentication Module
//!
//! Handles user signup, login, password changes and session lookup.
//! User records live in the SQLite database named by `DATABASE_URL`.

pub mod handlers;
pub mod middleware;
pub mod token;

use bcrypt::{hash, verify};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::error::{Error, Result};

pub const DEFAULT_AVATAR: &str = "/default-avatar.png";

/// User record stored in database
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub avatar: String,
    pub created_at: DateTime<Utc>,
}

/// Public user info (no sensitive data)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: String,
    pub username: String,
    pub email: String,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
        }
    }
}

/// Public profile, as shown on the settings page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub username: String,
    pub email: String,
    pub avatar: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for Profile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            avatar: user.avatar,
            created_at: user.created_at,
        }
    }
}

/// Credential store backed by SQLite
pub struct CredentialStore {
    pool: SqlitePool,
    cost: u32,
    /// Hash checked against when the email is unknown, so a miss costs
    /// the same as a wrong password.
    dummy_hash: String,
}

impl CredentialStore {
    /// Connect to the database and create the schema if needed
    pub async fn new(database_url: &str, cost: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        // Every connection to `:memory:` is its own database.
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        let dummy_hash = hash_password("timing-equaliser".to_string(), cost).await?;

        let store = Self {
            pool,
            cost,
            dummy_hash,
        };
        store.init_db().await?;

        info!("[Auth] Credential store ready at {}", database_url);

        Ok(store)
    }

    async fn init_db(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT UNIQUE NOT NULL,
                email TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                avatar TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Register a new user
    pub async fn signup(&self, username: &str, email: &str, password: &str) -> Result<UserInfo> {
        let username = username.trim();
        let email = email.trim();
        if username.is_empty() || email.is_empty() || password.is_empty() {
            return Err(Error::Validation(
                "Username, email and password are required".to_string(),
            ));
        }

        let existing: Option<(String,)> =
            sqlx::query_as("SELECT id FROM users WHERE email = ? OR username = ?")
                .bind(email)
                .bind(username)
                .fetch_optional(&self.pool)
                .await?;

        if existing.is_some() {
            return Err(user_exists());
        }

        let user = User {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash: hash_password(password.to_string(), self.cost).await?,
            avatar: DEFAULT_AVATAR.to_string(),
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO users (id, username, email, password_hash, avatar, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.avatar)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            // Lost a race with a concurrent signup for the same name or email.
            if let sqlx::Error::Database(db) = &e {
                if db.is_unique_violation() {
                    return user_exists();
                }
            }
            Error::from(e)
        })?;

        info!("[Auth] User registered: {} ({})", user.username, user.email);

        Ok(user.into())
    }

    /// Check credentials and return the matching user
    pub async fn login(&self, email: &str, password: &str) -> Result<UserInfo> {
        let user = self.find_by_email(email.trim()).await?;

        let (stored_hash, user) = match user {
            Some(user) => (user.password_hash.clone(), Some(user)),
            None => (self.dummy_hash.clone(), None),
        };

        let valid = verify_password(password.to_string(), stored_hash).await?;

        match user {
            Some(user) if valid => {
                info!("[Auth] User logged in: {}", user.username);
                Ok(user.into())
            }
            _ => {
                warn!("[Auth] Failed login attempt for {}", email);
                Err(Error::InvalidCredentials)
            }
        }
    }

    /// Replace the password after checking the current one
    pub async fn change_password(
        &self,
        user_id: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<()> {
        if old_password.is_empty() || new_password.is_empty() {
            return Err(Error::Validation(
                "Please provide old and new passwords".to_string(),
            ));
        }

        let user = self.find_by_id(user_id).await?.ok_or_else(user_not_found)?;

        if !verify_password(old_password.to_string(), user.password_hash).await? {
            warn!("[Auth] Wrong current password for {}", user.username);
            return Err(Error::InvalidCredentials);
        }

        let password_hash = hash_password(new_password.to_string(), self.cost).await?;

        sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
            .bind(password_hash)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        info!("[Auth] Password changed for {}", user.username);

        Ok(())
    }

    /// Public info for an already authenticated identity
    pub async fn verify_session(&self, user_id: &str) -> Result<UserInfo> {
        self.find_by_id(user_id)
            .await?
            .map(UserInfo::from)
            .ok_or_else(user_not_found)
    }

    pub async fn get_profile(&self, user_id: &str) -> Result<Profile> {
        self.find_by_id(user_id)
            .await?
            .map(Profile::from)
            .ok_or_else(user_not_found)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(sqlx::query_as::<_, User>(
            "SELECT id, username, email, password_hash, avatar, created_at FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn find_by_id(&self, user_id: &str) -> Result<Option<User>> {
        Ok(sqlx::query_as::<_, User>(
            "SELECT id, username, email, password_hash, avatar, created_at FROM users WHERE id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }
}

fn user_exists() -> Error {
    Error::Conflict("User already exists".to_string())
}

fn user_not_found() -> Error {
    Error::NotFound("User not found".to_string())
}

// bcrypt runs on the blocking pool.
async fn hash_password(password: String, cost: u32) -> Result<String> {
    Ok(tokio::task::spawn_blocking(move || hash(password, cost)).await??)
}

async fn verify_password(password: String, password_hash: String) -> Result<bool> {
    Ok(tokio::task::spawn_blocking(move || verify(password, &password_hash)).await??)
}
