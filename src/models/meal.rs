// ABOUTME: Meal log entry model with snapshot semantics
// ABOUTME: Name, calories, and amount are frozen at recording time and never re-read from the catalog
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 kcal-engine contributors

//! Meal ledger models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A recorded meal event
///
/// `name`, `calories`, and `amount` are snapshots taken when the entry was
/// recorded; later edits or deletion of the referenced catalog item never
/// change them. `food_item_id` is informational only and may dangle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealLogEntry {
    /// Identity
    pub id: i64,
    /// Owning user
    pub user_id: Uuid,
    /// Weak reference to the catalog item this was recorded from, if any
    pub food_item_id: Option<i64>,
    /// Snapshot of the food name at recording time
    pub name: String,
    /// Snapshot calories: `round(item.calories * amount)` for catalog
    /// recordings, the entered value for manual ones
    pub calories: i64,
    /// Multiplier applied at recording time (1.0 for manual entries)
    pub amount: f64,
    /// When the meal was eaten (UTC)
    pub eaten_at: DateTime<Utc>,
}
