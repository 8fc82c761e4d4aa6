// ABOUTME: Common data structures shared across the engine modules
// ABOUTME: Users and body profiles, catalog foods, recipe lines, meal log entries, weight samples
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 kcal-engine contributors

//! Domain models.

pub mod food;
pub mod meal;
pub mod user;
pub mod weight;

pub use food::{FoodItem, FoodKind, IngredientSpec, NewFoodItem, RecipeLine, COMPOSITE_UNIT};
pub use meal::MealLogEntry;
pub use user::{ActivityLevel, BodyProfile, Gender, NewUser, User};
pub use weight::WeightSample;
