// ABOUTME: Food catalog storage for master items and their recipe lines
// ABOUTME: Handles ingredient CRUD, availability queries, batch resolution, and composite line reads
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 kcal-engine contributors

use std::collections::HashMap;

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use super::Database;
use crate::errors::{AppError, AppResult};
use crate::models::{FoodItem, FoodKind, IngredientSpec, NewFoodItem, RecipeLine};

impl Database {
    /// Create the food catalog tables
    ///
    /// The `recipe_lines` CHECK constraint enforces at the storage level
    /// what [`IngredientSpec`] enforces at the type level: a line is
    /// either a master reference or a manual entry, never both or neither.
    ///
    /// # Errors
    ///
    /// Returns an error if table or index creation fails
    pub(super) async fn migrate_catalog(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS food_items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                owner_id TEXT REFERENCES users(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                calories INTEGER NOT NULL,
                unit TEXT NOT NULL,
                kind TEXT NOT NULL DEFAULT 'ingredient'
                    CHECK (kind IN ('ingredient', 'dish', 'meal_set'))
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create food_items table: {e}")))?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS recipe_lines (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                parent_food_id INTEGER NOT NULL
                    REFERENCES food_items(id) ON DELETE CASCADE,
                child_food_id INTEGER REFERENCES food_items(id) ON DELETE RESTRICT,
                amount REAL,
                manual_name TEXT,
                manual_calories INTEGER,
                CHECK (
                    (child_food_id IS NOT NULL AND amount IS NOT NULL
                        AND manual_name IS NULL AND manual_calories IS NULL)
                    OR
                    (child_food_id IS NULL AND amount IS NULL
                        AND manual_name IS NOT NULL AND manual_calories IS NOT NULL)
                )
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create recipe_lines table: {e}")))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_food_items_owner ON food_items(owner_id)")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to create food owner index: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_recipe_lines_parent ON recipe_lines(parent_food_id)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create recipe parent index: {e}")))?;

        Ok(())
    }
}

/// Database manager for master food records
#[derive(Clone)]
pub struct FoodCatalog {
    pool: SqlitePool,
}

impl FoodCatalog {
    /// Create a new food catalog
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create an ingredient directly in the catalog
    ///
    /// Composite items (dish, meal set) are created through the recipe
    /// composer, never here.
    ///
    /// # Errors
    ///
    /// Returns an error if the name or unit is blank, calories are
    /// negative, or the database operation fails
    pub async fn create_food(&self, new_item: &NewFoodItem) -> AppResult<FoodItem> {
        validate_food_fields(&new_item.name, new_item.calories, &new_item.unit)?;

        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| AppError::database(format!("Failed to acquire connection: {e}")))?;
        let id = insert_food_item(
            &mut conn,
            new_item.owner_id,
            &new_item.name,
            new_item.calories,
            &new_item.unit,
            FoodKind::Ingredient,
        )
        .await?;

        debug!(food_id = id, name = %new_item.name, "Created catalog ingredient");
        Ok(FoodItem {
            id,
            owner_id: new_item.owner_id,
            name: new_item.name.clone(),
            calories: new_item.calories,
            unit: new_item.unit.clone(),
            kind: FoodKind::Ingredient,
        })
    }

    /// Get a food item by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn get_food(&self, food_id: i64) -> AppResult<Option<FoodItem>> {
        let row = sqlx::query(
            "SELECT id, owner_id, name, calories, unit, kind FROM food_items WHERE id = ?",
        )
        .bind(food_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get food item: {e}")))?;

        row.map(|r| row_to_food_item(&r)).transpose()
    }

    /// List every item available to a user: global items plus their own,
    /// ordered by ascending id so repeated calls are stable
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn list_available(&self, user_id: Uuid) -> AppResult<Vec<FoodItem>> {
        let rows = sqlx::query(
            r"
            SELECT id, owner_id, name, calories, unit, kind
            FROM food_items
            WHERE owner_id IS NULL OR owner_id = ?
            ORDER BY id
            ",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list available foods: {e}")))?;

        rows.iter().map(row_to_food_item).collect()
    }

    /// List only the items owned by a user, ordered by ascending id
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn list_owned(&self, user_id: Uuid) -> AppResult<Vec<FoodItem>> {
        let rows = sqlx::query(
            r"
            SELECT id, owner_id, name, calories, unit, kind
            FROM food_items
            WHERE owner_id = ?
            ORDER BY id
            ",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list owned foods: {e}")))?;

        rows.iter().map(row_to_food_item).collect()
    }

    /// Batch-resolve food items by id
    ///
    /// Ids with no matching row are simply absent from the map; callers
    /// decide whether absence is an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn resolve_many(&self, food_ids: &[i64]) -> AppResult<HashMap<i64, FoodItem>> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| AppError::database(format!("Failed to acquire connection: {e}")))?;
        resolve_many_with(&mut conn, food_ids).await
    }

    /// The stored ingredient lines of a composite item, in insertion order
    ///
    /// Empty for non-composite items and for unknown ids.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn lines_of(&self, parent_food_id: i64) -> AppResult<Vec<RecipeLine>> {
        let rows = sqlx::query(
            r"
            SELECT id, parent_food_id, child_food_id, amount, manual_name, manual_calories
            FROM recipe_lines
            WHERE parent_food_id = ?
            ORDER BY id
            ",
        )
        .bind(parent_food_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list recipe lines: {e}")))?;

        rows.iter().map(row_to_recipe_line).collect()
    }

    /// Update the editable fields of a user-owned food item
    ///
    /// # Errors
    ///
    /// Returns an error if the item does not exist, is a global item or
    /// owned by another user, the new fields fail validation, or the
    /// database operation fails
    pub async fn update_food(
        &self,
        user_id: Uuid,
        food_id: i64,
        name: &str,
        calories: i64,
        unit: &str,
    ) -> AppResult<FoodItem> {
        validate_food_fields(name, calories, unit)?;
        let item = self.owned_food(user_id, food_id).await?;

        sqlx::query("UPDATE food_items SET name = ?, calories = ?, unit = ? WHERE id = ?")
            .bind(name)
            .bind(calories)
            .bind(unit)
            .bind(food_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to update food item: {e}")))?;

        Ok(FoodItem {
            name: name.to_owned(),
            calories,
            unit: unit.to_owned(),
            ..item
        })
    }

    /// Delete a user-owned food item
    ///
    /// Recipe lines of the item itself are removed with it; meal log
    /// entries recorded from it keep their snapshots and lose only the
    /// informational reference.
    ///
    /// # Errors
    ///
    /// Returns an error if the item does not exist, is a global item or
    /// owned by another user, is still an ingredient of some composite
    /// item, or the database operation fails
    pub async fn delete_food(&self, user_id: Uuid, food_id: i64) -> AppResult<()> {
        self.owned_food(user_id, food_id).await?;

        sqlx::query("DELETE FROM food_items WHERE id = ?")
            .bind(food_id)
            .execute(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                    AppError::invalid_state(format!(
                        "Food item {food_id} is used as a recipe ingredient and cannot be deleted"
                    ))
                }
                other => AppError::database(format!("Failed to delete food item: {other}")),
            })?;

        debug!(food_id = food_id, "Deleted catalog item");
        Ok(())
    }

    /// Fetch an item and verify the acting user owns it
    async fn owned_food(&self, user_id: Uuid, food_id: i64) -> AppResult<FoodItem> {
        let item = self
            .get_food(food_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Food item {food_id}")))?;

        match item.owner_id {
            Some(owner) if owner == user_id => Ok(item),
            Some(_) => Err(AppError::permission_denied(format!(
                "Food item {food_id} belongs to another user"
            ))),
            None => Err(AppError::permission_denied(format!(
                "Food item {food_id} is a system item and cannot be modified"
            ))),
        }
    }
}

/// Insert a food item row on an existing connection, returning its id
pub(crate) async fn insert_food_item(
    conn: &mut SqliteConnection,
    owner_id: Option<Uuid>,
    name: &str,
    calories: i64,
    unit: &str,
    kind: FoodKind,
) -> AppResult<i64> {
    let result = sqlx::query(
        r"
        INSERT INTO food_items (owner_id, name, calories, unit, kind)
        VALUES (?, ?, ?, ?, ?)
        ",
    )
    .bind(owner_id.map(|id| id.to_string()))
    .bind(name)
    .bind(calories)
    .bind(unit)
    .bind(kind.as_str())
    .execute(&mut *conn)
    .await
    .map_err(|e| AppError::database(format!("Failed to insert food item: {e}")))?;

    Ok(result.last_insert_rowid())
}

/// Insert a recipe line row on an existing connection, returning its id
pub(crate) async fn insert_recipe_line(
    conn: &mut SqliteConnection,
    parent_food_id: i64,
    spec: &IngredientSpec,
) -> AppResult<i64> {
    let (child_food_id, amount, manual_name, manual_calories) = match spec {
        IngredientSpec::MasterRef { food_id, amount } => {
            (Some(*food_id), Some(*amount), None, None)
        }
        IngredientSpec::Manual { name, calories } => {
            (None, None, Some(name.as_str()), Some(*calories))
        }
    };

    let result = sqlx::query(
        r"
        INSERT INTO recipe_lines (parent_food_id, child_food_id, amount, manual_name, manual_calories)
        VALUES (?, ?, ?, ?, ?)
        ",
    )
    .bind(parent_food_id)
    .bind(child_food_id)
    .bind(amount)
    .bind(manual_name)
    .bind(manual_calories)
    .execute(&mut *conn)
    .await
    .map_err(|e| AppError::database(format!("Failed to insert recipe line: {e}")))?;

    Ok(result.last_insert_rowid())
}

/// Overwrite a food item's cached calorie total on an existing connection
pub(crate) async fn update_food_calories(
    conn: &mut SqliteConnection,
    food_id: i64,
    calories: i64,
) -> AppResult<()> {
    sqlx::query("UPDATE food_items SET calories = ? WHERE id = ?")
        .bind(calories)
        .bind(food_id)
        .execute(&mut *conn)
        .await
        .map_err(|e| AppError::database(format!("Failed to update food calories: {e}")))?;

    Ok(())
}

/// Batch-resolve food items by id on an existing connection
pub(crate) async fn resolve_many_with(
    conn: &mut SqliteConnection,
    food_ids: &[i64],
) -> AppResult<HashMap<i64, FoodItem>> {
    if food_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let placeholders = vec!["?"; food_ids.len()].join(", ");
    let sql = format!(
        "SELECT id, owner_id, name, calories, unit, kind FROM food_items WHERE id IN ({placeholders})"
    );

    let mut query = sqlx::query(&sql);
    for id in food_ids {
        query = query.bind(id);
    }

    let rows = query
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| AppError::database(format!("Failed to resolve food items: {e}")))?;

    let mut items = HashMap::with_capacity(rows.len());
    for row in &rows {
        let item = row_to_food_item(row)?;
        items.insert(item.id, item);
    }
    Ok(items)
}

pub(crate) fn row_to_food_item(row: &SqliteRow) -> AppResult<FoodItem> {
    let owner_id_str: Option<String> = row.get("owner_id");
    let kind_str: String = row.get("kind");

    let owner_id = owner_id_str
        .map(|s| Uuid::parse_str(&s))
        .transpose()
        .map_err(|e| AppError::database(format!("Invalid owner id in food_items row: {e}")))?;

    Ok(FoodItem {
        id: row.get("id"),
        owner_id,
        name: row.get("name"),
        calories: row.get("calories"),
        unit: row.get("unit"),
        kind: FoodKind::parse(&kind_str),
    })
}

pub(crate) fn row_to_recipe_line(row: &SqliteRow) -> AppResult<RecipeLine> {
    let child_food_id: Option<i64> = row.get("child_food_id");
    let amount: Option<f64> = row.get("amount");
    let manual_name: Option<String> = row.get("manual_name");
    let manual_calories: Option<i64> = row.get("manual_calories");

    let ingredient = match (child_food_id, manual_name) {
        (Some(food_id), _) => IngredientSpec::MasterRef {
            food_id,
            amount: amount.unwrap_or(1.0),
        },
        (None, Some(name)) => IngredientSpec::Manual {
            name,
            calories: manual_calories.unwrap_or(0),
        },
        (None, None) => {
            return Err(AppError::database(
                "Recipe line row has neither a master reference nor manual fields",
            ))
        }
    };

    Ok(RecipeLine {
        id: row.get("id"),
        parent_food_id: row.get("parent_food_id"),
        ingredient,
    })
}

fn validate_food_fields(name: &str, calories: i64, unit: &str) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::invalid_input("Food name must not be empty"));
    }
    if calories < 0 {
        return Err(AppError::invalid_input(format!(
            "Calories must not be negative, got {calories}"
        )));
    }
    if unit.trim().is_empty() {
        return Err(AppError::invalid_input("Unit label must not be empty"));
    }
    Ok(())
}
