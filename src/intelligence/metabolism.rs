// ABOUTME: Mifflin-St Jeor BMR, activity-scaled TDEE, and daily calorie targets
// ABOUTME: Validates physiological ranges before computing and rounds for display
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 kcal-engine contributors

//! Basal metabolic rate and daily energy targets
//!
//! Reference: Mifflin MD, St Jeor ST, et al. "A new predictive equation
//! for resting energy expenditure in healthy individuals." American Journal
//! of Clinical Nutrition, 1990.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::{MetabolismConfig, MifflinStJeorConfig};
use crate::errors::{AppError, AppResult};
use crate::models::{ActivityLevel, BodyProfile, Gender};

/// Complete set of measurements needed to run the energy formulas
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetabolismParams {
    /// Body weight in kilograms
    pub weight_kg: f64,
    /// Height in centimeters
    pub height_cm: f64,
    /// Age in years
    pub age_years: u32,
    /// Biological sex used by the formula constant
    pub gender: Gender,
    /// Habitual activity level used to scale BMR into TDEE
    pub activity_level: ActivityLevel,
}

/// Computed energy values for one person
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyTargets {
    /// Basal metabolic rate in kcal/day, rounded to one decimal
    pub bmr: f64,
    /// Total daily energy expenditure in kcal/day, rounded to one decimal
    pub tdee: f64,
    /// Daily intake target in whole kcal, TDEE plus the configured surplus
    pub target_calories: i64,
}

/// Calculate BMR using the Mifflin-St Jeor equation
///
/// Returns the raw value; [`energy_targets`] applies the one-decimal
/// rounding.
///
/// # Errors
/// Returns [`AppError`] with an `INVALID_INPUT` code when any
/// measurement falls outside the supported physiological range.
pub fn calculate_bmr(
    weight_kg: f64,
    height_cm: f64,
    age_years: u32,
    gender: Gender,
    formula: &MifflinStJeorConfig,
) -> AppResult<f64> {
    check_weight(weight_kg)?;
    check_height(height_cm)?;
    check_age(age_years)?;

    let gender_constant = match gender {
        Gender::Male => formula.male_constant,
        Gender::Female => formula.female_constant,
    };

    Ok(formula.weight_coefficient * weight_kg + formula.height_coefficient * height_cm
        - formula.age_coefficient * f64::from(age_years)
        + gender_constant)
}

/// Compute BMR, TDEE, and the daily calorie target for a full parameter set
///
/// Each stage rounds before feeding the next: BMR to one decimal, TDEE
/// (BMR scaled by the activity factor) to one decimal, and the target
/// (TDEE plus the configured surplus) to whole kcal.
///
/// # Errors
/// Returns [`AppError`] when any measurement is outside its supported range.
pub fn energy_targets(
    params: &MetabolismParams,
    config: &MetabolismConfig,
) -> AppResult<EnergyTargets> {
    let bmr = round_one_decimal(calculate_bmr(
        params.weight_kg,
        params.height_cm,
        params.age_years,
        params.gender,
        &config.formula,
    )?);
    let tdee = round_one_decimal(bmr * params.activity_level.factor(&config.activity_factors));
    let target_calories = (tdee + config.surplus_kcal).round() as i64;

    Ok(EnergyTargets { bmr, tdee, target_calories })
}

/// Compute energy targets from a stored profile plus the latest weight sample
///
/// Missing gender or activity level fall back to their defaults
/// ([`Gender::Male`] and [`ActivityLevel::Low`]); missing height, age,
/// or weight make the computation impossible.
///
/// # Errors
/// Returns [`AppError`] with an `INVALID_STATE` code naming the missing
/// fields when the profile is incomplete, or an `INVALID_INPUT` code when
/// a measurement is out of range.
pub fn energy_targets_for_profile(
    profile: &BodyProfile,
    weight_kg: Option<f64>,
    config: &MetabolismConfig,
) -> AppResult<EnergyTargets> {
    match (profile.height_cm, profile.age_years, weight_kg) {
        (Some(height_cm), Some(age_years), Some(weight_kg)) => energy_targets(
            &MetabolismParams {
                weight_kg,
                height_cm,
                age_years,
                gender: profile.gender.unwrap_or_default(),
                activity_level: profile.activity_level.unwrap_or_default(),
            },
            config,
        ),
        (height, age, weight) => {
            let mut missing = Vec::new();
            if height.is_none() {
                missing.push("height_cm");
            }
            if age.is_none() {
                missing.push("age_years");
            }
            if weight.is_none() {
                missing.push("weight_kg");
            }
            Err(
                AppError::invalid_state("Profile is incomplete for metabolism computation")
                    .with_details(json!({ "missing": missing })),
            )
        }
    }
}

pub(crate) fn check_weight(weight_kg: f64) -> AppResult<()> {
    if !weight_kg.is_finite() || weight_kg <= 0.0 || weight_kg > 500.0 {
        return Err(AppError::invalid_input(format!(
            "Weight {weight_kg} kg is outside the supported range (0-500)"
        )));
    }
    Ok(())
}

pub(crate) fn check_height(height_cm: f64) -> AppResult<()> {
    if !height_cm.is_finite() || height_cm <= 0.0 || height_cm > 300.0 {
        return Err(AppError::invalid_input(format!(
            "Height {height_cm} cm is outside the supported range (0-300)"
        )));
    }
    Ok(())
}

pub(crate) fn check_age(age_years: u32) -> AppResult<()> {
    if age_years == 0 || age_years > 150 {
        return Err(AppError::invalid_input(format!(
            "Age {age_years} is outside the supported range (1-150)"
        )));
    }
    Ok(())
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
