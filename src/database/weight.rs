// ABOUTME: Body-weight sample storage with per-day upsert semantics
// ABOUTME: Holds exactly one sample per (user, date) via a conflict-target upsert
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 kcal-engine contributors

use chrono::NaiveDate;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use super::Database;
use crate::errors::{AppError, AppResult};
use crate::models::WeightSample;

impl Database {
    /// Create the weight samples table
    ///
    /// The UNIQUE constraint on (`user_id`, `date`) is what the upsert
    /// conflicts against; it guarantees at most one row per user and day.
    ///
    /// # Errors
    ///
    /// Returns an error if table creation fails
    pub(super) async fn migrate_weight(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS weight_samples (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                date TEXT NOT NULL,
                weight_kg REAL NOT NULL,
                UNIQUE (user_id, date)
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create weight_samples table: {e}")))?;

        Ok(())
    }
}

/// Database manager for body-weight samples
#[derive(Clone)]
pub struct WeightTracker {
    pool: SqlitePool,
}

impl WeightTracker {
    /// Create a new weight tracker
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Record a weight sample, overwriting any existing sample for the
    /// same (user, date)
    ///
    /// # Errors
    ///
    /// Returns an error if the weight is not a positive number or the
    /// database operation fails
    pub async fn record_sample(
        &self,
        user_id: Uuid,
        date: NaiveDate,
        weight_kg: f64,
    ) -> AppResult<WeightSample> {
        validate_weight(weight_kg)?;

        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| AppError::database(format!("Failed to acquire connection: {e}")))?;
        upsert_sample_with(&mut conn, user_id, date, weight_kg).await?;

        let row = sqlx::query(
            "SELECT id, user_id, date, weight_kg FROM weight_samples WHERE user_id = ? AND date = ?",
        )
        .bind(user_id.to_string())
        .bind(date.to_string())
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| AppError::database(format!("Failed to read back weight sample: {e}")))?;

        debug!(user_id = %user_id, date = %date, weight_kg = weight_kg, "Recorded weight sample");
        row_to_weight_sample(&row)
    }

    /// The sample with the maximum date for a user, if any
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn latest(&self, user_id: Uuid) -> AppResult<Option<WeightSample>> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, date, weight_kg
            FROM weight_samples
            WHERE user_id = ?
            ORDER BY date DESC
            LIMIT 1
            ",
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get latest weight sample: {e}")))?;

        row.map(|r| row_to_weight_sample(&r)).transpose()
    }

    /// All samples for a user, ascending by date (chart order)
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn history(&self, user_id: Uuid) -> AppResult<Vec<WeightSample>> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, date, weight_kg
            FROM weight_samples
            WHERE user_id = ?
            ORDER BY date ASC
            ",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list weight samples: {e}")))?;

        rows.iter().map(row_to_weight_sample).collect()
    }

    /// Exact-date lookup
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn sample_on(
        &self,
        user_id: Uuid,
        date: NaiveDate,
    ) -> AppResult<Option<WeightSample>> {
        let row = sqlx::query(
            "SELECT id, user_id, date, weight_kg FROM weight_samples WHERE user_id = ? AND date = ?",
        )
        .bind(user_id.to_string())
        .bind(date.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get weight sample: {e}")))?;

        row.map(|r| row_to_weight_sample(&r)).transpose()
    }
}

/// Upsert a weight sample on an existing connection (usable inside a
/// transaction)
pub(crate) async fn upsert_sample_with(
    conn: &mut SqliteConnection,
    user_id: Uuid,
    date: NaiveDate,
    weight_kg: f64,
) -> AppResult<()> {
    sqlx::query(
        r"
        INSERT INTO weight_samples (user_id, date, weight_kg)
        VALUES (?, ?, ?)
        ON CONFLICT (user_id, date) DO UPDATE SET weight_kg = excluded.weight_kg
        ",
    )
    .bind(user_id.to_string())
    .bind(date.to_string())
    .bind(weight_kg)
    .execute(&mut *conn)
    .await
    .map_err(|e| AppError::database(format!("Failed to upsert weight sample: {e}")))?;

    Ok(())
}

/// Weight of the most recent sample on an existing connection
pub(crate) async fn latest_weight_with(
    conn: &mut SqliteConnection,
    user_id: Uuid,
) -> AppResult<Option<f64>> {
    let row = sqlx::query(
        r"
        SELECT weight_kg
        FROM weight_samples
        WHERE user_id = ?
        ORDER BY date DESC
        LIMIT 1
        ",
    )
    .bind(user_id.to_string())
    .fetch_optional(&mut *conn)
    .await
    .map_err(|e| AppError::database(format!("Failed to get latest weight: {e}")))?;

    Ok(row.map(|r| r.get("weight_kg")))
}

pub(crate) fn validate_weight(weight_kg: f64) -> AppResult<()> {
    if !weight_kg.is_finite() || weight_kg <= 0.0 {
        return Err(AppError::invalid_input(format!(
            "Weight {weight_kg} kg must be a positive number"
        )));
    }
    Ok(())
}

fn row_to_weight_sample(row: &SqliteRow) -> AppResult<WeightSample> {
    let user_id_str: String = row.get("user_id");
    let date_str: String = row.get("date");

    let user_id = Uuid::parse_str(&user_id_str)
        .map_err(|e| AppError::database(format!("Invalid user id in weight_samples row: {e}")))?;
    let date = date_str
        .parse::<NaiveDate>()
        .map_err(|e| AppError::database(format!("Invalid date in weight_samples row: {e}")))?;

    Ok(WeightSample {
        id: row.get("id"),
        user_id,
        date,
        weight_kg: row.get("weight_kg"),
    })
}
