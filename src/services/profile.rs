// ABOUTME: Profile and weight writes coupled to the daily target recompute
// ABOUTME: Every write path recomputes the cached target inside the same transaction
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 kcal-engine contributors

//! Profile coordination service
//!
//! The cached `target_calories` on a user row must always match what the
//! formula produces from the stored profile and the latest weight sample,
//! or the configured default when either is incomplete. [`ProfileCoordinator`]
//! owns that invariant: profile saves and weight recordings go through it,
//! and each one updates the data and recomputes the target in a single
//! transaction. Writing straight to the stores bypasses the recompute.
//!
//! The recompute always reads the latest sample by date, so backfilling
//! an older weight never overrides a newer measurement's target.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::config::MetabolismConfig;
use crate::database::users::{get_user_with, update_profile_with, update_target_with};
use crate::database::weight::{latest_weight_with, upsert_sample_with, validate_weight};
use crate::database::{retry_transaction, TransactionGuard};
use crate::errors::{AppError, AppResult};
use crate::intelligence::metabolism::{check_age, check_height, energy_targets_for_profile};
use crate::models::{ActivityLevel, BodyProfile, Gender};

/// Everything collected by the first-run profile form
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InitialProfile {
    /// Height in centimeters
    pub height_cm: f64,
    /// Current body weight in kilograms
    pub weight_kg: f64,
    /// Age in years
    pub age_years: u32,
    /// Biological sex for the formula constant
    pub gender: Gender,
    /// Habitual activity level
    pub activity_level: ActivityLevel,
}

/// Coordinates profile and weight writes with the target recompute
#[derive(Clone)]
pub struct ProfileCoordinator {
    pool: SqlitePool,
    config: MetabolismConfig,
}

impl ProfileCoordinator {
    /// Create a coordinator over the given pool and metabolism settings
    #[must_use]
    pub const fn new(pool: SqlitePool, config: MetabolismConfig) -> Self {
        Self { pool, config }
    }

    /// Replace the user's body profile and recompute the cached target
    ///
    /// All four profile fields are overwritten with the given values,
    /// including any that are `None`. The new target is computed from the
    /// new profile plus the latest stored weight; with no weight sample or
    /// missing formula fields the configured default applies.
    ///
    /// # Errors
    /// Returns [`AppError`] with an `INVALID_INPUT` code when a set field
    /// is out of range, a `RESOURCE_NOT_FOUND` code when the user does not
    /// exist, or a database error code when the write fails.
    pub async fn save_profile(&self, user_id: Uuid, profile: BodyProfile) -> AppResult<i64> {
        validate_profile(&profile)?;
        retry_transaction(|| self.save_profile_tx(user_id, profile), 3).await
    }

    async fn save_profile_tx(&self, user_id: Uuid, profile: BodyProfile) -> AppResult<i64> {
        let mut guard = self.begin().await?;

        if get_user_with(guard.executor()?, user_id).await?.is_none() {
            return Err(AppError::not_found(format!("User {user_id}")));
        }

        update_profile_with(guard.executor()?, user_id, &profile).await?;
        let latest = latest_weight_with(guard.executor()?, user_id).await?;
        let target = resolve_target(&profile, latest, &self.config)?;
        update_target_with(guard.executor()?, user_id, target).await?;
        guard.commit().await?;

        info!(
            user_id = %user_id,
            target_calories = target,
            "Saved body profile and recomputed target"
        );
        Ok(target)
    }

    /// Record a weight sample and recompute the cached target
    ///
    /// One sample per user per day; recording the same date again
    /// overwrites the value. The recompute uses the latest sample by date,
    /// which is not necessarily the one just written.
    ///
    /// # Errors
    /// Returns [`AppError`] with an `INVALID_INPUT` code for a
    /// non-positive or out-of-range weight, a `RESOURCE_NOT_FOUND` code
    /// when the user does not exist, or a database error code when the
    /// write fails.
    pub async fn record_weight(
        &self,
        user_id: Uuid,
        date: NaiveDate,
        weight_kg: f64,
    ) -> AppResult<i64> {
        validate_weight(weight_kg)?;
        retry_transaction(|| self.record_weight_tx(user_id, date, weight_kg), 3).await
    }

    async fn record_weight_tx(
        &self,
        user_id: Uuid,
        date: NaiveDate,
        weight_kg: f64,
    ) -> AppResult<i64> {
        let mut guard = self.begin().await?;

        let user = get_user_with(guard.executor()?, user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User {user_id}")))?;

        upsert_sample_with(guard.executor()?, user_id, date, weight_kg).await?;
        let latest = latest_weight_with(guard.executor()?, user_id).await?;
        let target = resolve_target(&user.profile, latest, &self.config)?;
        update_target_with(guard.executor()?, user_id, target).await?;
        guard.commit().await?;

        info!(
            user_id = %user_id,
            date = %date,
            weight_kg = weight_kg,
            target_calories = target,
            "Recorded weight and recomputed target"
        );
        Ok(target)
    }

    /// Store the first-run profile, today's weight, and the target at once
    ///
    /// Equivalent to a profile save plus a weight recording for the
    /// current UTC date, in one transaction.
    ///
    /// # Errors
    /// Returns [`AppError`] with an `INVALID_INPUT` code when a
    /// measurement is out of range, a `RESOURCE_NOT_FOUND` code when the
    /// user does not exist, or a database error code when the write fails.
    pub async fn complete_initial_profile(
        &self,
        user_id: Uuid,
        initial: InitialProfile,
    ) -> AppResult<i64> {
        check_height(initial.height_cm)?;
        check_age(initial.age_years)?;
        validate_weight(initial.weight_kg)?;
        retry_transaction(|| self.complete_initial_profile_tx(user_id, initial), 3).await
    }

    async fn complete_initial_profile_tx(
        &self,
        user_id: Uuid,
        initial: InitialProfile,
    ) -> AppResult<i64> {
        let mut guard = self.begin().await?;

        if get_user_with(guard.executor()?, user_id).await?.is_none() {
            return Err(AppError::not_found(format!("User {user_id}")));
        }

        let profile = BodyProfile {
            height_cm: Some(initial.height_cm),
            age_years: Some(initial.age_years),
            gender: Some(initial.gender),
            activity_level: Some(initial.activity_level),
        };
        update_profile_with(guard.executor()?, user_id, &profile).await?;

        let today = Utc::now().date_naive();
        upsert_sample_with(guard.executor()?, user_id, today, initial.weight_kg).await?;

        let latest = latest_weight_with(guard.executor()?, user_id).await?;
        let target = resolve_target(&profile, latest, &self.config)?;
        update_target_with(guard.executor()?, user_id, target).await?;
        guard.commit().await?;

        info!(
            user_id = %user_id,
            target_calories = target,
            "Completed initial profile"
        );
        Ok(target)
    }

    /// Whether the user has finished first-run setup
    ///
    /// Completed means a height is stored and at least one weight sample
    /// exists.
    ///
    /// # Errors
    /// Returns [`AppError`] with a `RESOURCE_NOT_FOUND` code when the user
    /// does not exist, or a database error code when a query fails.
    pub async fn is_profile_completed(&self, user_id: Uuid) -> AppResult<bool> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| AppError::database(format!("Failed to acquire connection: {e}")))?;

        let user = get_user_with(&mut conn, user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User {user_id}")))?;
        let latest = latest_weight_with(&mut conn, user_id).await?;

        Ok(user.profile.height_cm.is_some() && latest.is_some())
    }

    async fn begin(&self) -> AppResult<TransactionGuard<'static>> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;
        Ok(TransactionGuard::new(tx))
    }
}

/// Target from the formula when profile and weight are complete, the
/// configured default otherwise. Out-of-range stored values surface as
/// errors rather than silently falling back.
fn resolve_target(
    profile: &BodyProfile,
    latest_weight: Option<f64>,
    config: &MetabolismConfig,
) -> AppResult<i64> {
    if profile.has_formula_fields() && latest_weight.is_some() {
        Ok(energy_targets_for_profile(profile, latest_weight, config)?.target_calories)
    } else {
        Ok(config.default_target_calories)
    }
}

fn validate_profile(profile: &BodyProfile) -> AppResult<()> {
    if let Some(height_cm) = profile.height_cm {
        check_height(height_cm)?;
    }
    if let Some(age_years) = profile.age_years {
        check_age(age_years)?;
    }
    Ok(())
}
