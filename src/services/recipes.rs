// ABOUTME: Composite food creation from user-submitted recipe drafts
// ABOUTME: Validates line shape, resolves master ingredients, and aggregates calories atomically
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 kcal-engine contributors

//! Recipe composition service
//!
//! A composite food (a dish or a meal set) is a catalog item whose calorie
//! total is the sum of its ingredient lines. Each line is either a master
//! reference (a catalog item id plus an amount multiplier) or a manual
//! entry (a free-text name plus a calorie value). [`RecipeComposer`] turns
//! a submitted [`RecipeDraft`] into the parent item and its lines in one
//! transaction, so a draft that names a missing ingredient leaves nothing
//! behind.

use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::database::catalog::{
    insert_food_item, insert_recipe_line, resolve_many_with, update_food_calories,
};
use crate::database::{retry_transaction, FoodCatalog, TransactionGuard};
use crate::errors::{AppError, AppResult};
use crate::models::{FoodItem, FoodKind, IngredientSpec, COMPOSITE_UNIT};

/// A recipe submission as it arrives from the outside
///
/// `kind` defaults to [`FoodKind::Dish`] when omitted. An empty line list
/// is allowed and produces a zero-calorie composite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeDraft {
    /// Name of the composite item being created
    pub name: String,
    /// Composite kind; `None` means dish
    #[serde(default)]
    pub kind: Option<FoodKind>,
    /// Ingredient lines in submission order
    #[serde(default)]
    pub lines: Vec<IngredientForm>,
}

/// One submitted ingredient line before validation
///
/// Exactly one of the two shapes must be populated: a master reference
/// (`food_item_id`, optional `amount`) or a manual entry (`manual_name`,
/// optional `manual_calories`). A line that fills in both, or neither, is
/// rejected. A blank `manual_name` counts as absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngredientForm {
    /// Catalog id of a master ingredient
    #[serde(default)]
    pub food_item_id: Option<i64>,
    /// Multiplier applied to the master item's calories; `None` means 1.0
    #[serde(default)]
    pub amount: Option<f64>,
    /// Free-text name for a manual line
    #[serde(default)]
    pub manual_name: Option<String>,
    /// Calories for a manual line; `None` means 0
    #[serde(default)]
    pub manual_calories: Option<i64>,
}

impl IngredientForm {
    /// Collapse the form into a validated [`IngredientSpec`]
    ///
    /// A master reference with a stray `manual_calories` but no manual
    /// name still resolves as a master reference.
    ///
    /// # Errors
    /// Returns [`AppError`] with an `INVALID_INPUT` code when the line
    /// populates both shapes or neither.
    pub fn into_spec(self) -> AppResult<IngredientSpec> {
        let manual_name = self
            .manual_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty());

        match (self.food_item_id, manual_name) {
            (Some(_), Some(_)) => Err(AppError::invalid_input(
                "Ingredient line cannot combine a master reference and a manual entry",
            )),
            (Some(food_id), None) => Ok(IngredientSpec::MasterRef {
                food_id,
                amount: self.amount.unwrap_or(1.0),
            }),
            (None, Some(name)) => Ok(IngredientSpec::Manual {
                name: name.to_owned(),
                calories: self.manual_calories.unwrap_or(0),
            }),
            (None, None) => Err(AppError::invalid_input(
                "Ingredient line must reference a catalog item or carry a manual entry",
            )),
        }
    }
}

/// Read-back of one composite line with the display-name rule applied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeLine {
    /// Master item name for references, manual name otherwise
    pub display_name: String,
    /// This line's calorie contribution
    pub calories: i64,
    /// Amount multiplier (1.0 for manual lines)
    pub amount: f64,
}

/// A composite item together with its resolved lines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositeDetail {
    /// The parent catalog item
    pub item: FoodItem,
    /// Resolved lines; empty for items without a recipe
    pub lines: Vec<CompositeLine>,
}

/// Creates and reads composite foods
#[derive(Clone)]
pub struct RecipeComposer {
    pool: SqlitePool,
    catalog: FoodCatalog,
}

impl RecipeComposer {
    /// Create a composer over the given pool
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            catalog: FoodCatalog::new(pool.clone()),
            pool,
        }
    }

    /// Validate a draft and create the composite it describes
    ///
    /// # Errors
    /// Returns [`AppError`] when a line is malformed, a referenced
    /// ingredient does not exist, or the write fails.
    pub async fn create_from_draft(
        &self,
        owner_id: Uuid,
        draft: RecipeDraft,
    ) -> AppResult<FoodItem> {
        let RecipeDraft { name, kind, lines } = draft;
        let specs = lines
            .into_iter()
            .map(IngredientForm::into_spec)
            .collect::<AppResult<Vec<_>>>()?;

        self.create_composite(owner_id, &name, kind.unwrap_or(FoodKind::Dish), &specs)
            .await
    }

    /// Create a composite food from already-shaped ingredient lines
    ///
    /// The parent item is inserted first with zero calories, master
    /// references are batch-resolved, each line's contribution is the
    /// referenced item's calories times the amount (rounded half-up, away
    /// from zero) or the manual calorie value, and the summed total is
    /// written back onto the parent. All of it happens in one transaction;
    /// any missing master id fails the whole operation.
    ///
    /// # Errors
    /// Returns [`AppError`] with an `INVALID_INPUT` code for a blank name,
    /// a non-composite kind, a non-positive amount, or negative manual
    /// calories; a `RESOURCE_NOT_FOUND` code naming any missing master
    /// ids; or a database error code when the write fails.
    pub async fn create_composite(
        &self,
        owner_id: Uuid,
        name: &str,
        kind: FoodKind,
        lines: &[IngredientSpec],
    ) -> AppResult<FoodItem> {
        if name.trim().is_empty() {
            return Err(AppError::invalid_input("Recipe name must not be empty"));
        }
        if !kind.is_composite() {
            return Err(AppError::invalid_input(
                "Composite foods must be a dish or a meal set",
            ));
        }
        for spec in lines {
            match spec {
                IngredientSpec::MasterRef { amount, .. } => {
                    if !amount.is_finite() || *amount <= 0.0 {
                        return Err(AppError::invalid_input(format!(
                            "Amount {amount} must be a positive number"
                        )));
                    }
                }
                IngredientSpec::Manual { name, calories } => {
                    if name.trim().is_empty() {
                        return Err(AppError::invalid_input(
                            "Manual ingredient name must not be empty",
                        ));
                    }
                    if *calories < 0 {
                        return Err(AppError::invalid_input(format!(
                            "Calories must not be negative, got {calories}"
                        )));
                    }
                }
            }
        }

        retry_transaction(|| self.create_composite_tx(owner_id, name, kind, lines), 3).await
    }

    async fn create_composite_tx(
        &self,
        owner_id: Uuid,
        name: &str,
        kind: FoodKind,
        lines: &[IngredientSpec],
    ) -> AppResult<FoodItem> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;
        let mut guard = TransactionGuard::new(tx);

        // Parent first so the lines have something to reference. Its
        // calorie total is written back once the lines are summed.
        let parent_id = insert_food_item(
            guard.executor()?,
            Some(owner_id),
            name.trim(),
            0,
            COMPOSITE_UNIT,
            kind,
        )
        .await?;

        let master_ids: Vec<i64> = lines
            .iter()
            .filter_map(|spec| match spec {
                IngredientSpec::MasterRef { food_id, .. } => Some(*food_id),
                IngredientSpec::Manual { .. } => None,
            })
            .collect();
        let resolved = resolve_many_with(guard.executor()?, &master_ids).await?;

        let mut missing: Vec<i64> = master_ids
            .iter()
            .copied()
            .filter(|id| !resolved.contains_key(id))
            .collect();
        if !missing.is_empty() {
            missing.sort_unstable();
            missing.dedup();
            let listed = missing
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            let message = if missing.len() == 1 {
                format!("Food item {listed}")
            } else {
                format!("Food items {listed}")
            };
            return Err(AppError::not_found(message)
                .with_details(json!({ "missing_ids": missing })));
        }

        let mut total = 0_i64;
        for spec in lines {
            let contribution = match spec {
                IngredientSpec::MasterRef { food_id, amount } => resolved
                    .get(food_id)
                    .map(|item| (item.calories as f64 * amount).round() as i64)
                    .ok_or_else(|| {
                        AppError::internal(format!("Food item {food_id} vanished during resolve"))
                    })?,
                IngredientSpec::Manual { calories, .. } => *calories,
            };
            total += contribution;
            insert_recipe_line(guard.executor()?, parent_id, spec).await?;
        }

        update_food_calories(guard.executor()?, parent_id, total).await?;
        guard.commit().await?;

        info!(
            food_id = parent_id,
            owner_id = %owner_id,
            line_count = lines.len(),
            total_calories = total,
            "Created composite food"
        );

        Ok(FoodItem {
            id: parent_id,
            owner_id: Some(owner_id),
            name: name.trim().to_owned(),
            calories: total,
            unit: COMPOSITE_UNIT.to_owned(),
            kind,
        })
    }

    /// Read a composite item back together with its resolved lines
    ///
    /// Master-reference lines display the referenced item's current name
    /// and contribute its current calories times the amount; the parent's
    /// stored total reflects the values at creation time. Plain
    /// ingredients come back with an empty line list.
    ///
    /// # Errors
    /// Returns [`AppError`] with a `RESOURCE_NOT_FOUND` code when no item
    /// has the given id, or a database error code when a query fails.
    pub async fn composite_detail(&self, food_id: i64) -> AppResult<CompositeDetail> {
        let item = self
            .catalog
            .get_food(food_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Food item {food_id}")))?;

        let lines = self.catalog.lines_of(food_id).await?;
        let child_ids: Vec<i64> = lines
            .iter()
            .filter_map(|line| match &line.ingredient {
                IngredientSpec::MasterRef { food_id, .. } => Some(*food_id),
                IngredientSpec::Manual { .. } => None,
            })
            .collect();
        let children = self.catalog.resolve_many(&child_ids).await?;

        let resolved_lines = lines
            .iter()
            .map(|line| match &line.ingredient {
                IngredientSpec::MasterRef { food_id, amount } => children.get(food_id).map_or_else(
                    || CompositeLine {
                        display_name: format!("(missing item {food_id})"),
                        calories: 0,
                        amount: *amount,
                    },
                    |child| CompositeLine {
                        display_name: child.name.clone(),
                        calories: (child.calories as f64 * amount).round() as i64,
                        amount: *amount,
                    },
                ),
                IngredientSpec::Manual { name, calories } => CompositeLine {
                    display_name: name.clone(),
                    calories: *calories,
                    amount: 1.0,
                },
            })
            .collect();

        Ok(CompositeDetail {
            item,
            lines: resolved_lines,
        })
    }
}
