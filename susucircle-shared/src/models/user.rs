/// User model and database operations
///
/// This module provides the User model for account identity and profile
/// information. Users are created on registration; the identity handle
/// issued by the external Identity Provider is attached at registration and
/// never changes afterwards. Users can belong to multiple savings groups
/// via the Membership model.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     external_id VARCHAR(255) UNIQUE,
///     username VARCHAR(50) NOT NULL UNIQUE,
///     full_name VARCHAR(100) NOT NULL,
///     email VARCHAR(120) NOT NULL UNIQUE,
///     phone VARCHAR(20) NOT NULL UNIQUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     last_login_at TIMESTAMPTZ
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use susucircle_shared::models::user::{User, CreateUser};
/// use susucircle_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let user = User::create(&pool, CreateUser {
///     external_id: Some("idp|9f41c".to_string()),
///     username: "ama".to_string(),
///     full_name: "Ama Mensah".to_string(),
///     email: "ama@example.com".to_string(),
///     phone: "+233201234567".to_string(),
/// }).await?;
///
/// println!("Created user: {}", user.id);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// User model representing a registered account
///
/// Email, phone, and username are unique across all users. Credentials are
/// not stored here; authentication is delegated to the Identity Provider
/// and only the provider's stable handle is kept.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Stable handle issued by the Identity Provider
    ///
    /// None until the account is linked to an external credential
    pub external_id: Option<String>,

    /// Unique short handle chosen at registration
    pub username: String,

    /// Display name
    pub full_name: String,

    /// Email address (must be unique)
    pub email: String,

    /// Phone number (must be unique)
    pub phone: String,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,

    /// When the user last logged in (None if never logged in)
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Input for creating a new user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Identity Provider handle, if the account is created from a resolved
    /// credential
    pub external_id: Option<String>,

    /// Unique username
    pub username: String,

    /// Display name
    pub full_name: String,

    /// Email address
    pub email: String,

    /// Phone number
    pub phone: String,
}

/// Input for updating a user's profile
///
/// Only the mutable profile fields are exposed; identity fields (email,
/// username, external handle) are frozen after creation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProfile {
    /// New display name
    pub full_name: Option<String>,

    /// New phone number
    pub phone: Option<String>,
}

impl User {
    /// Creates a new user in the database
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Email, phone, or username already exists (unique constraint violation)
    /// - Database connection fails
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (external_id, username, full_name, email, phone)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, external_id, username, full_name, email, phone,
                      created_at, updated_at, last_login_at
            "#,
        )
        .bind(data.external_id)
        .bind(data.username)
        .bind(data.full_name)
        .bind(data.email)
        .bind(data.phone)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, external_id, username, full_name, email, phone,
                   created_at, updated_at, last_login_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by email address
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, external_id, username, full_name, email, phone,
                   created_at, updated_at, last_login_at
            FROM users
            WHERE lower(email) = lower($1)
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by username
    pub async fn find_by_username(
        pool: &PgPool,
        username: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, external_id, username, full_name, email, phone,
                   created_at, updated_at, last_login_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by the Identity Provider's stable handle
    ///
    /// This is the lookup the authentication middleware performs on every
    /// request carrying a resolved credential.
    pub async fn find_by_external_id(
        pool: &PgPool,
        external_id: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, external_id, username, full_name, email, phone,
                   created_at, updated_at, last_login_at
            FROM users
            WHERE external_id = $1
            "#,
        )
        .bind(external_id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Updates a user's profile
    ///
    /// Only non-None fields in `data` are written. The `updated_at`
    /// timestamp is always refreshed.
    ///
    /// # Returns
    ///
    /// The updated user if found, None if the user doesn't exist
    pub async fn update_profile(
        pool: &PgPool,
        id: Uuid,
        data: UpdateProfile,
    ) -> Result<Option<Self>, sqlx::Error> {
        // Build dynamic update query based on which fields are present
        let mut query = String::from("UPDATE users SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.full_name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", full_name = ${}", bind_count));
        }
        if data.phone.is_some() {
            bind_count += 1;
            query.push_str(&format!(", phone = ${}", bind_count));
        }

        query.push_str(
            " WHERE id = $1 RETURNING id, external_id, username, full_name, email, phone, \
             created_at, updated_at, last_login_at",
        );

        let mut q = sqlx::query_as::<_, User>(&query).bind(id);

        if let Some(full_name) = data.full_name {
            q = q.bind(full_name);
        }
        if let Some(phone) = data.phone {
            q = q.bind(phone);
        }

        let user = q.fetch_optional(pool).await?;

        Ok(user)
    }

    /// Updates the last login timestamp for a user
    ///
    /// Called after a credential resolves successfully.
    pub async fn update_last_login(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET last_login_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_user_struct() {
        let create_user = CreateUser {
            external_id: None,
            username: "kofi".to_string(),
            full_name: "Kofi Boateng".to_string(),
            email: "kofi@example.com".to_string(),
            phone: "+233501234567".to_string(),
        };

        assert_eq!(create_user.username, "kofi");
        assert!(create_user.external_id.is_none());
    }

    #[test]
    fn test_update_profile_default() {
        let update = UpdateProfile::default();
        assert!(update.full_name.is_none());
        assert!(update.phone.is_none());
    }

    // Integration tests for database operations are in tests/engine_tests.rs
}
