// ABOUTME: Catalog food models including composite kinds and recipe line ingredients
// ABOUTME: RecipeLine ingredients are a sum type so master-vs-manual lines cannot be malformed
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 kcal-engine contributors

//! Food catalog models.
//!
//! The catalog is an arena of `FoodItem` rows; composite items (dish or meal
//! set) point at their ingredient lines via ids, never by embedding. A line's
//! master-vs-manual nature is an enum: the "both set" / "both empty" states a
//! nullable dual-field layout permits are unrepresentable here and are
//! rejected at the draft boundary instead.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unit label given to composite items produced by the recipe composer
pub const COMPOSITE_UNIT: &str = "serving";

/// Kind of catalog food
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FoodKind {
    /// Single ingredient with directly entered calories
    #[default]
    Ingredient,
    /// Composite dish aggregated from recipe lines
    Dish,
    /// Composite set meal aggregated from recipe lines
    MealSet,
}

impl FoodKind {
    /// Storage representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ingredient => "ingredient",
            Self::Dish => "dish",
            Self::MealSet => "meal_set",
        }
    }

    /// Parse from the storage representation; unrecognized values resolve to
    /// `Ingredient`.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "dish" => Self::Dish,
            "meal_set" => Self::MealSet,
            _ => Self::Ingredient,
        }
    }

    /// Whether this kind is produced by the recipe composer
    #[must_use]
    pub const fn is_composite(self) -> bool {
        matches!(self, Self::Dish | Self::MealSet)
    }
}

/// A master food record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodItem {
    /// Identity, assigned on first save
    pub id: i64,
    /// Owning user; `None` marks a global/system item readable by everyone
    pub owner_id: Option<Uuid>,
    /// Display name
    pub name: String,
    /// Calories per one `unit`. For composite items this is a cached
    /// aggregate computed once at creation.
    pub calories: i64,
    /// Unit label (e.g. "100g", "piece", "serving")
    pub unit: String,
    /// Kind of food
    pub kind: FoodKind,
}

/// Request to create an ingredient directly in the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFoodItem {
    /// Owning user; `None` creates a global/system item
    pub owner_id: Option<Uuid>,
    /// Display name
    pub name: String,
    /// Calories per one `unit`
    pub calories: i64,
    /// Unit label
    pub unit: String,
}

impl NewFoodItem {
    /// Ingredient owned by `owner` (or global when `None`)
    #[must_use]
    pub fn ingredient(
        owner_id: Option<Uuid>,
        name: impl Into<String>,
        calories: i64,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            owner_id,
            name: name.into(),
            calories,
            unit: unit.into(),
        }
    }
}

/// One ingredient contribution inside a composite food
///
/// Exactly one of the two shapes, by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngredientSpec {
    /// Reference to an existing catalog item, scaled by `amount`
    MasterRef {
        /// Referenced catalog item id
        food_id: i64,
        /// Multiplier applied to the item's per-unit calories
        amount: f64,
    },
    /// Free-text ingredient with directly specified calories
    Manual {
        /// Display name
        name: String,
        /// Calories contributed, taken as-is
        calories: i64,
    },
}

impl IngredientSpec {
    /// Master reference with the default amount of 1.0
    #[must_use]
    pub const fn master(food_id: i64) -> Self {
        Self::MasterRef {
            food_id,
            amount: 1.0,
        }
    }

    /// Master reference with an explicit amount
    #[must_use]
    pub const fn master_with_amount(food_id: i64, amount: f64) -> Self {
        Self::MasterRef { food_id, amount }
    }

    /// Manual entry
    #[must_use]
    pub fn manual(name: impl Into<String>, calories: i64) -> Self {
        Self::Manual {
            name: name.into(),
            calories,
        }
    }
}

/// A persisted ingredient line of a composite food
///
/// Immutable once created; the composite's cached calorie total was computed
/// from these lines at creation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeLine {
    /// Identity
    pub id: i64,
    /// Parent composite item
    pub parent_food_id: i64,
    /// The ingredient this line contributes
    pub ingredient: IngredientSpec,
}

impl RecipeLine {
    /// Effective amount: the master reference's multiplier, or 1.0 for a
    /// manual entry (fixed, recorded for display only).
    #[must_use]
    pub const fn amount(&self) -> f64 {
        match self.ingredient {
            IngredientSpec::MasterRef { amount, .. } => amount,
            IngredientSpec::Manual { .. } => 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_food_kind_roundtrip_and_default() {
        assert_eq!(FoodKind::parse("dish"), FoodKind::Dish);
        assert_eq!(FoodKind::parse("meal_set"), FoodKind::MealSet);
        assert_eq!(FoodKind::parse("ingredient"), FoodKind::Ingredient);
        assert_eq!(FoodKind::parse("unknown"), FoodKind::Ingredient);
        assert!(FoodKind::Dish.is_composite());
        assert!(!FoodKind::Ingredient.is_composite());
    }

    #[test]
    fn test_master_defaults_amount_to_one() {
        let spec = IngredientSpec::master(7);
        match spec {
            IngredientSpec::MasterRef { food_id, amount } => {
                assert_eq!(food_id, 7);
                assert!((amount - 1.0).abs() < f64::EPSILON);
            }
            IngredientSpec::Manual { .. } => panic!("expected master reference"),
        }
    }

    #[test]
    fn test_manual_line_amount_is_fixed() {
        let line = RecipeLine {
            id: 1,
            parent_food_id: 2,
            ingredient: IngredientSpec::manual("Rice", 250),
        };
        assert!((line.amount() - 1.0).abs() < f64::EPSILON);
    }
}
