// ABOUTME: Meal ledger storage recording timestamped meal events with snapshot semantics
// ABOUTME: Entries copy name and calories at recording time so later catalog edits never affect history
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 kcal-engine contributors

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use super::catalog::FoodCatalog;
use super::Database;
use crate::errors::{AppError, AppResult};
use crate::models::MealLogEntry;

impl Database {
    /// Create the meal ledger table
    ///
    /// `food_item_id` is a weak reference: deleting the catalog item sets
    /// it to NULL while the snapshot columns keep the recorded values.
    ///
    /// # Errors
    ///
    /// Returns an error if table or index creation fails
    pub(super) async fn migrate_meals(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS meal_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                food_item_id INTEGER REFERENCES food_items(id) ON DELETE SET NULL,
                name TEXT NOT NULL,
                calories INTEGER NOT NULL,
                amount REAL NOT NULL,
                eaten_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create meal_logs table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_meal_logs_user_eaten ON meal_logs(user_id, eaten_at)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create meal log index: {e}")))?;

        Ok(())
    }
}

/// Database manager for meal log entries
#[derive(Clone)]
pub struct MealLedger {
    pool: SqlitePool,
    catalog: FoodCatalog,
}

impl MealLedger {
    /// Create a new meal ledger
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        let catalog = FoodCatalog::new(pool.clone());
        Self { pool, catalog }
    }

    /// Record a meal from a catalog item, eaten now
    ///
    /// # Errors
    ///
    /// Returns an error if the amount is not a positive number, the item
    /// does not exist, or the database operation fails
    pub async fn record_from_master(
        &self,
        user_id: Uuid,
        food_id: i64,
        amount: f64,
    ) -> AppResult<MealLogEntry> {
        self.record_from_master_at(user_id, food_id, amount, Utc::now())
            .await
    }

    /// Record a meal from a catalog item with an explicit timestamp
    ///
    /// Snapshots the item's name and computes calories as
    /// `round(item.calories * amount)`; the stored values never change
    /// afterwards, even if the item is edited or removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the amount is not a positive number, the item
    /// does not exist, or the database operation fails
    pub async fn record_from_master_at(
        &self,
        user_id: Uuid,
        food_id: i64,
        amount: f64,
        eaten_at: DateTime<Utc>,
    ) -> AppResult<MealLogEntry> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(AppError::invalid_input(format!(
                "Amount {amount} must be a positive number"
            )));
        }

        let item = self
            .catalog
            .get_food(food_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Food item {food_id}")))?;

        let calories = (item.calories as f64 * amount).round() as i64;
        let entry = MealLogEntry {
            id: 0,
            user_id,
            food_item_id: Some(food_id),
            name: item.name,
            calories,
            amount,
            eaten_at,
        };
        self.insert_entry(entry).await
    }

    /// Record a manually entered meal, eaten now
    ///
    /// # Errors
    ///
    /// Returns an error if the name is blank, calories are negative, or
    /// the database operation fails
    pub async fn record_manual(
        &self,
        user_id: Uuid,
        name: &str,
        calories: i64,
    ) -> AppResult<MealLogEntry> {
        self.record_manual_at(user_id, name, calories, Utc::now())
            .await
    }

    /// Record a manually entered meal with an explicit timestamp
    ///
    /// The amount is fixed at 1.0; there is no catalog reference.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is blank, calories are negative, or
    /// the database operation fails
    pub async fn record_manual_at(
        &self,
        user_id: Uuid,
        name: &str,
        calories: i64,
        eaten_at: DateTime<Utc>,
    ) -> AppResult<MealLogEntry> {
        if name.trim().is_empty() {
            return Err(AppError::invalid_input("Meal name must not be empty"));
        }
        if calories < 0 {
            return Err(AppError::invalid_input(format!(
                "Calories must not be negative, got {calories}"
            )));
        }

        let entry = MealLogEntry {
            id: 0,
            user_id,
            food_item_id: None,
            name: name.to_owned(),
            calories,
            amount: 1.0,
            eaten_at,
        };
        self.insert_entry(entry).await
    }

    /// List the user's entries for the current UTC day
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn list_today(&self, user_id: Uuid) -> AppResult<Vec<MealLogEntry>> {
        self.list_on(user_id, Utc::now().date_naive()).await
    }

    /// List the user's entries for a UTC calendar day, ordered by eaten
    /// time then id
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn list_on(&self, user_id: Uuid, date: NaiveDate) -> AppResult<Vec<MealLogEntry>> {
        let (start, end) = day_window(date);
        let rows = sqlx::query(
            r"
            SELECT id, user_id, food_item_id, name, calories, amount, eaten_at
            FROM meal_logs
            WHERE user_id = ? AND eaten_at BETWEEN ? AND ?
            ORDER BY eaten_at, id
            ",
        )
        .bind(user_id.to_string())
        .bind(start.to_rfc3339())
        .bind(end.to_rfc3339())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list meal logs: {e}")))?;

        rows.iter().map(row_to_meal_entry).collect()
    }

    /// Sum of snapshot calories inside a UTC calendar day, 0 when empty
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn total_on(&self, user_id: Uuid, date: NaiveDate) -> AppResult<i64> {
        let (start, end) = day_window(date);
        let row = sqlx::query(
            r"
            SELECT COALESCE(SUM(calories), 0) AS total
            FROM meal_logs
            WHERE user_id = ? AND eaten_at BETWEEN ? AND ?
            ",
        )
        .bind(user_id.to_string())
        .bind(start.to_rfc3339())
        .bind(end.to_rfc3339())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to total meal logs: {e}")))?;

        Ok(row.get("total"))
    }

    /// Delete an entry owned by the acting user
    ///
    /// # Errors
    ///
    /// Returns an error if the entry does not exist, belongs to another
    /// user, or the database operation fails
    pub async fn delete_entry(&self, user_id: Uuid, entry_id: i64) -> AppResult<()> {
        let row = sqlx::query("SELECT user_id FROM meal_logs WHERE id = ?")
            .bind(entry_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to load meal log {entry_id}: {e}")))?;

        let owner_str: String = match row {
            Some(r) => r.get("user_id"),
            None => return Err(AppError::not_found(format!("Meal log entry {entry_id}"))),
        };
        let owner = Uuid::parse_str(&owner_str)
            .map_err(|e| AppError::database(format!("Invalid user id in meal_logs row: {e}")))?;
        if owner != user_id {
            return Err(AppError::permission_denied(format!(
                "Meal log entry {entry_id} belongs to another user"
            )));
        }

        sqlx::query("DELETE FROM meal_logs WHERE id = ?")
            .bind(entry_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete meal log: {e}")))?;

        debug!(entry_id = entry_id, "Deleted meal log entry");
        Ok(())
    }

    async fn insert_entry(&self, entry: MealLogEntry) -> AppResult<MealLogEntry> {
        let result = sqlx::query(
            r"
            INSERT INTO meal_logs (user_id, food_item_id, name, calories, amount, eaten_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(entry.user_id.to_string())
        .bind(entry.food_item_id)
        .bind(&entry.name)
        .bind(entry.calories)
        .bind(entry.amount)
        .bind(entry.eaten_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to insert meal log: {e}")))?;

        debug!(
            entry_id = result.last_insert_rowid(),
            user_id = %entry.user_id,
            calories = entry.calories,
            "Recorded meal"
        );
        Ok(MealLogEntry {
            id: result.last_insert_rowid(),
            ..entry
        })
    }
}

/// Inclusive UTC window `[00:00:00, 23:59:59.999999999]` of a calendar day
fn day_window(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = date.and_time(NaiveTime::MIN).and_utc();
    let end = start + Duration::days(1) - Duration::nanoseconds(1);
    (start, end)
}

pub(crate) fn row_to_meal_entry(row: &SqliteRow) -> AppResult<MealLogEntry> {
    let user_id_str: String = row.get("user_id");
    let eaten_at_str: String = row.get("eaten_at");

    let user_id = Uuid::parse_str(&user_id_str)
        .map_err(|e| AppError::database(format!("Invalid user id in meal_logs row: {e}")))?;
    let eaten_at = DateTime::parse_from_rfc3339(&eaten_at_str)
        .map_err(|e| AppError::database(format!("Invalid eaten_at in meal_logs row: {e}")))?
        .with_timezone(&Utc);

    Ok(MealLogEntry {
        id: row.get("id"),
        user_id,
        food_item_id: row.get("food_item_id"),
        name: row.get("name"),
        calories: row.get("calories"),
        amount: row.get("amount"),
        eaten_at,
    })
}
