// ABOUTME: Read-side aggregation for the daily dashboard and weight chart
// ABOUTME: Combines the cached target, the day's meal total, and weight history
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 kcal-engine contributors

//! Dashboard service
//!
//! Read-only views over data the write paths maintain. The daily summary
//! uses the cached `target_calories` from the user row, which the profile
//! coordinator keeps in sync with the profile and latest weight; rows
//! written before any coordinator pass fall back to the configured
//! default.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::config::MetabolismConfig;
use crate::database::{MealLedger, UserStore, WeightTracker};
use crate::errors::{AppError, AppResult};

/// One day of intake measured against the calorie target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySummary {
    /// Daily calorie target in kcal
    pub target_calories: i64,
    /// Calories consumed so far that day
    pub consumed_calories: i64,
    /// Target minus consumed; negative once the target is exceeded
    pub remaining_calories: i64,
    /// Consumed as a truncated percentage of the target, capped at 100
    pub progress_percent: u8,
}

impl DailySummary {
    /// Build a summary from a target and a consumed total
    ///
    /// Progress truncates toward zero and caps at 100; a target of zero
    /// or less reports zero progress.
    #[must_use]
    pub fn new(target_calories: i64, consumed_calories: i64) -> Self {
        let progress_percent = if target_calories > 0 {
            let pct = (consumed_calories as f64 / target_calories as f64 * 100.0) as i64;
            pct.clamp(0, 100) as u8
        } else {
            0
        };

        Self {
            target_calories,
            consumed_calories,
            remaining_calories: target_calories - consumed_calories,
            progress_percent,
        }
    }
}

/// Weight history shaped for a line chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightChart {
    /// One "M/D" label per sample, oldest first
    pub labels: Vec<String>,
    /// Weight in kilograms, aligned with `labels`
    pub values: Vec<f64>,
}

/// Builds the dashboard read models
#[derive(Clone)]
pub struct DashboardService {
    users: UserStore,
    ledger: MealLedger,
    tracker: WeightTracker,
    config: MetabolismConfig,
}

impl DashboardService {
    /// Create a dashboard service over the given pool and settings
    #[must_use]
    pub fn new(pool: SqlitePool, config: MetabolismConfig) -> Self {
        Self {
            users: UserStore::new(pool.clone()),
            ledger: MealLedger::new(pool.clone()),
            tracker: WeightTracker::new(pool),
            config,
        }
    }

    /// Summary for the current UTC day
    ///
    /// # Errors
    /// Returns [`AppError`] with a `RESOURCE_NOT_FOUND` code when the user
    /// does not exist, or a database error code when a query fails.
    pub async fn daily_summary(&self, user_id: Uuid) -> AppResult<DailySummary> {
        self.summary_on(user_id, Utc::now().date_naive()).await
    }

    /// Summary for a specific UTC day
    ///
    /// # Errors
    /// Returns [`AppError`] with a `RESOURCE_NOT_FOUND` code when the user
    /// does not exist, or a database error code when a query fails.
    pub async fn summary_on(&self, user_id: Uuid, date: NaiveDate) -> AppResult<DailySummary> {
        let user = self
            .users
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User {user_id}")))?;
        let consumed = self.ledger.total_on(user_id, date).await?;
        let target = user
            .target_calories
            .unwrap_or(self.config.default_target_calories);

        Ok(DailySummary::new(target, consumed))
    }

    /// Full weight history shaped for charting, oldest first
    ///
    /// # Errors
    /// Returns [`AppError`] with a database error code when the query
    /// fails.
    pub async fn weight_chart(&self, user_id: Uuid) -> AppResult<WeightChart> {
        let samples = self.tracker.history(user_id).await?;

        Ok(WeightChart {
            labels: samples.iter().map(|s| chart_label(s.date)).collect(),
            values: samples.iter().map(|s| s.weight_kg).collect(),
        })
    }
}

/// "M/D" without zero padding, e.g. "1/5" for January 5th
fn chart_label(date: NaiveDate) -> String {
    date.format("%-m/%-d").to_string()
}
