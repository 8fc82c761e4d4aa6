// ABOUTME: User row storage with body-profile columns and the cached calorie target
// ABOUTME: Handles creation, lookup, and in-transaction profile/target updates
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 kcal-engine contributors

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use super::Database;
use crate::errors::{AppError, AppResult};
use crate::models::{ActivityLevel, BodyProfile, Gender, NewUser, User};

impl Database {
    /// Create the users table
    ///
    /// # Errors
    ///
    /// Returns an error if table or index creation fails
    pub(super) async fn migrate_users(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT UNIQUE NOT NULL,
                display_name TEXT,
                height_cm REAL,
                age_years INTEGER,
                gender TEXT,
                activity_level TEXT,
                target_calories INTEGER,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create users table: {e}")))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_email ON users(email)")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to create users email index: {e}")))?;

        Ok(())
    }
}

/// Database manager for user records
#[derive(Clone)]
pub struct UserStore {
    pool: SqlitePool,
}

impl UserStore {
    /// Create a new user store
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new user with an empty body profile
    ///
    /// # Errors
    ///
    /// Returns an error if the email is blank, already taken, or the
    /// database operation fails
    pub async fn create_user(&self, new_user: &NewUser) -> AppResult<User> {
        if new_user.email.trim().is_empty() {
            return Err(AppError::invalid_input("Email must not be empty"));
        }

        let user = User {
            id: Uuid::new_v4(),
            email: new_user.email.clone(),
            display_name: new_user.display_name.clone(),
            profile: BodyProfile::default(),
            target_calories: None,
            created_at: Utc::now(),
        };

        sqlx::query(
            r"
            INSERT INTO users (id, email, display_name, created_at)
            VALUES (?, ?, ?, ?)
            ",
        )
        .bind(user.id.to_string())
        .bind(&user.email)
        .bind(&user.display_name)
        .bind(user.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::already_exists(format!("User with email {}", user.email))
            }
            other => AppError::database(format!("Failed to create user: {other}")),
        })?;

        debug!(user_id = %user.id, "Created user");
        Ok(user)
    }

    /// Get a user by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn get_user(&self, user_id: Uuid) -> AppResult<Option<User>> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| AppError::database(format!("Failed to acquire connection: {e}")))?;
        get_user_with(&mut conn, user_id).await
    }

    /// Get a user by email
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn get_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let row = sqlx::query(
            r"
            SELECT id, email, display_name, height_cm, age_years, gender,
                   activity_level, target_calories, created_at
            FROM users
            WHERE email = ?
            ",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get user by email: {e}")))?;

        row.map(|r| row_to_user(&r)).transpose()
    }
}

/// Get a user by ID on an existing connection (usable inside a transaction)
pub(crate) async fn get_user_with(
    conn: &mut SqliteConnection,
    user_id: Uuid,
) -> AppResult<Option<User>> {
    let row = sqlx::query(
        r"
        SELECT id, email, display_name, height_cm, age_years, gender,
               activity_level, target_calories, created_at
        FROM users
        WHERE id = ?
        ",
    )
    .bind(user_id.to_string())
    .fetch_optional(&mut *conn)
    .await
    .map_err(|e| AppError::database(format!("Failed to get user: {e}")))?;

    row.map(|r| row_to_user(&r)).transpose()
}

/// Overwrite the body-profile columns of a user row
pub(crate) async fn update_profile_with(
    conn: &mut SqliteConnection,
    user_id: Uuid,
    profile: &BodyProfile,
) -> AppResult<()> {
    sqlx::query(
        r"
        UPDATE users
        SET height_cm = ?, age_years = ?, gender = ?, activity_level = ?
        WHERE id = ?
        ",
    )
    .bind(profile.height_cm)
    .bind(profile.age_years.map(i64::from))
    .bind(profile.gender.map(Gender::as_str))
    .bind(profile.activity_level.map(ActivityLevel::as_str))
    .bind(user_id.to_string())
    .execute(&mut *conn)
    .await
    .map_err(|e| AppError::database(format!("Failed to update user profile: {e}")))?;

    Ok(())
}

/// Store a freshly computed target-calorie value on a user row
pub(crate) async fn update_target_with(
    conn: &mut SqliteConnection,
    user_id: Uuid,
    target_calories: i64,
) -> AppResult<()> {
    sqlx::query("UPDATE users SET target_calories = ? WHERE id = ?")
        .bind(target_calories)
        .bind(user_id.to_string())
        .execute(&mut *conn)
        .await
        .map_err(|e| AppError::database(format!("Failed to update target calories: {e}")))?;

    Ok(())
}

pub(crate) fn row_to_user(row: &SqliteRow) -> AppResult<User> {
    let id_str: String = row.get("id");
    let gender: Option<String> = row.get("gender");
    let activity_level: Option<String> = row.get("activity_level");
    let created_at_str: String = row.get("created_at");

    let id = Uuid::parse_str(&id_str)
        .map_err(|e| AppError::database(format!("Invalid user id in users row: {e}")))?;
    let created_at = DateTime::parse_from_rfc3339(&created_at_str)
        .map_err(|e| AppError::database(format!("Invalid created_at in users row: {e}")))?
        .with_timezone(&Utc);

    Ok(User {
        id,
        email: row.get("email"),
        display_name: row.get("display_name"),
        profile: BodyProfile {
            height_cm: row.get("height_cm"),
            age_years: row
                .get::<Option<i64>, _>("age_years")
                .and_then(|age| u32::try_from(age).ok()),
            gender: gender.as_deref().map(Gender::parse),
            activity_level: activity_level.as_deref().map(ActivityLevel::parse),
        },
        target_calories: row.get("target_calories"),
        created_at,
    })
}
