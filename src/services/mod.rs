// ABOUTME: Business-logic services composed over the database managers
// ABOUTME: Recipe composition, profile/target coordination, and dashboard reads
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 kcal-engine contributors

//! Service layer
//!
//! Multi-step operations that span more than one store live here, above
//! the single-table managers in [`crate::database`]. Writes that must
//! stay consistent (composite creation, the target recompute) run inside
//! transactions owned by these services.

pub mod dashboard;
pub mod profile;
pub mod recipes;

pub use dashboard::{DailySummary, DashboardService, WeightChart};
pub use profile::{InitialProfile, ProfileCoordinator};
pub use recipes::{CompositeDetail, CompositeLine, IngredientForm, RecipeComposer, RecipeDraft};
