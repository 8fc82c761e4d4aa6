// ABOUTME: User account model with body profile fields and the cached daily calorie target
// ABOUTME: Includes the gender and activity-level enums used by the metabolism engine
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 kcal-engine contributors

//! User and body-profile models.
//!
//! Authentication is outside this crate; a user row carries identity plus the
//! profile inputs of the metabolism engine and the derived `target_calories`
//! cache maintained by the profile coordinator.

use crate::config::ActivityFactorsConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Gender used by the BMR formula
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    /// Male (formula constant +5)
    #[default]
    Male,
    /// Female (formula constant -161)
    Female,
}

impl Gender {
    /// Storage representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }

    /// Parse from the storage representation; values other than `male`
    /// resolve to `Female`.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "male" => Self::Male,
            _ => Self::Female,
        }
    }
}

/// Self-reported activity level scaling BMR into TDEE
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityLevel {
    /// Little or no exercise
    #[default]
    Low,
    /// Moderate exercise 3-5 days/week
    Mid,
    /// Hard exercise 6-7 days/week
    High,
}

impl ActivityLevel {
    /// Storage representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Mid => "mid",
            Self::High => "high",
        }
    }

    /// Parse from the storage representation; unrecognized values resolve to
    /// `Low`, matching the documented default factor.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "mid" => Self::Mid,
            "high" => Self::High,
            _ => Self::Low,
        }
    }

    /// The multiplier this level selects from the factor table
    #[must_use]
    pub const fn factor(self, factors: &ActivityFactorsConfig) -> f64 {
        match self {
            Self::Low => factors.low,
            Self::Mid => factors.mid,
            Self::High => factors.high,
        }
    }
}

/// Body profile inputs of the metabolism engine
///
/// Every field is optional: a fresh account has none of them, and the
/// coordinator falls back to the default daily target until the profile is
/// complete enough to compute one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BodyProfile {
    /// Height in centimeters
    pub height_cm: Option<f64>,
    /// Age in years
    pub age_years: Option<u32>,
    /// Gender; `None` computes as `Male` (historical default)
    pub gender: Option<Gender>,
    /// Activity level; `None` computes with the low factor
    pub activity_level: Option<ActivityLevel>,
}

impl BodyProfile {
    /// Whether the profile carries the fields the BMR formula needs besides
    /// weight (height and age).
    #[must_use]
    pub const fn has_formula_fields(&self) -> bool {
        self.height_cm.is_some() && self.age_years.is_some()
    }
}

/// A registered user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: Uuid,
    /// Email address, unique across users
    pub email: String,
    /// Optional display name
    pub display_name: Option<String>,
    /// Body profile inputs
    pub profile: BodyProfile,
    /// Cached daily calorie target; `None` until first computed, afterwards
    /// kept equal to the metabolism engine's output for the current profile
    /// and latest weight (or the configured default)
    pub target_calories: Option<i64>,
    /// Account creation time
    pub created_at: DateTime<Utc>,
}

/// Request to create a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    /// Email address
    pub email: String,
    /// Optional display name
    pub display_name: Option<String>,
}

impl NewUser {
    /// Create a request with the given email and no display name
    #[must_use]
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            display_name: None,
        }
    }

    /// Set the display name
    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}
