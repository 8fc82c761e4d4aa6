// ABOUTME: Metabolism configuration for BMR, TDEE, and target-calorie computation
// ABOUTME: Formula coefficients, activity factors, caloric surplus, and the fallback daily target
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 kcal-engine contributors

//! Metabolism configuration.
//!
//! The canonical constant table lives in the `Default` impls below. The
//! surplus and fallback target can be overridden from the environment; the
//! formula coefficients and activity factors cannot, since every stored
//! `target_calories` value was derived from them.

use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::env;

/// Canonical caloric surplus for the weight-gain goal, in kcal per day
pub const DEFAULT_SURPLUS_KCAL: f64 = 300.0;

/// Fallback daily target used when profile or weight data is missing, in kcal
pub const DEFAULT_TARGET_CALORIES: i64 = 2200;

/// Mifflin-St Jeor BMR formula coefficients
///
/// `bmr = weight_coefficient * weight_kg + height_coefficient * height_cm
///       - age_coefficient * age_years + gender constant`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MifflinStJeorConfig {
    /// Coefficient applied to body weight in kilograms
    pub weight_coefficient: f64,
    /// Coefficient applied to height in centimeters
    pub height_coefficient: f64,
    /// Coefficient applied to age in years (subtracted)
    pub age_coefficient: f64,
    /// Additive constant for male users
    pub male_constant: f64,
    /// Additive constant for female users
    pub female_constant: f64,
}

impl Default for MifflinStJeorConfig {
    fn default() -> Self {
        Self {
            weight_coefficient: 10.0,
            height_coefficient: 6.25,
            age_coefficient: 5.0,
            male_constant: 5.0,
            female_constant: -161.0,
        }
    }
}

/// Activity level multipliers applied to BMR to obtain TDEE
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityFactorsConfig {
    /// Low activity (little or no exercise)
    pub low: f64,
    /// Mid activity (moderate exercise 3-5 days/week)
    pub mid: f64,
    /// High activity (hard exercise 6-7 days/week)
    pub high: f64,
}

impl Default for ActivityFactorsConfig {
    fn default() -> Self {
        Self {
            low: 1.2,
            mid: 1.55,
            high: 1.725,
        }
    }
}

/// Top-level metabolism configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetabolismConfig {
    /// BMR formula coefficients
    pub formula: MifflinStJeorConfig,
    /// Activity factor table
    pub activity_factors: ActivityFactorsConfig,
    /// Caloric surplus added to TDEE for the weight-gain goal, in kcal
    pub surplus_kcal: f64,
    /// Daily target used when the profile or weight data is incomplete
    pub default_target_calories: i64,
}

impl MetabolismConfig {
    /// Load configuration from environment variables, falling back to the
    /// canonical defaults.
    ///
    /// Recognized variables:
    /// - `KCAL_SURPLUS_KCAL` - caloric surplus in kcal (default 300)
    /// - `KCAL_DEFAULT_TARGET` - fallback daily target in kcal (default 2200)
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a set variable fails to parse.
    pub fn from_env() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(raw) = env::var("KCAL_SURPLUS_KCAL") {
            config.surplus_kcal = raw
                .parse()
                .map_err(|e| AppError::config(format!("Invalid KCAL_SURPLUS_KCAL: {e}")))?;
        }

        if let Ok(raw) = env::var("KCAL_DEFAULT_TARGET") {
            config.default_target_calories = raw
                .parse()
                .map_err(|e| AppError::config(format!("Invalid KCAL_DEFAULT_TARGET: {e}")))?;
        }

        Ok(config)
    }
}

impl Default for MetabolismConfig {
    fn default() -> Self {
        Self {
            formula: MifflinStJeorConfig::default(),
            activity_factors: ActivityFactorsConfig::default(),
            surplus_kcal: DEFAULT_SURPLUS_KCAL,
            default_target_calories: DEFAULT_TARGET_CALORIES,
        }
    }
}
