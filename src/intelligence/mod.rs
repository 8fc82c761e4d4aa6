// ABOUTME: Energy metabolism intelligence for computing calorie targets
// ABOUTME: Houses the BMR/TDEE formulas and the profile-driven target resolver
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 kcal-engine contributors

//! Energy metabolism intelligence
//!
//! Pure computation over body measurements. The formulas read their
//! coefficients from [`crate::config::MetabolismConfig`] so the canonical
//! constants live in one place.

pub mod metabolism;

pub use metabolism::{calculate_bmr, energy_targets, energy_targets_for_profile};
pub use metabolism::{EnergyTargets, MetabolismParams};
