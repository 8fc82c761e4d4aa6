// ABOUTME: Body-weight sample model, unique per user and calendar date
// ABOUTME: Samples are upserted so the (user, date) pair always holds exactly one row
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 kcal-engine contributors

//! Weight tracking models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One body-weight measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightSample {
    /// Identity
    pub id: i64,
    /// Owning user
    pub user_id: Uuid,
    /// Calendar date of the measurement (unique per user)
    pub date: NaiveDate,
    /// Weight in kilograms
    pub weight_kg: f64,
}
