// ABOUTME: Integration tests for composite food creation and read-back
// ABOUTME: Covers draft validation, calorie aggregation, atomicity, and detail resolution
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 kcal-engine contributors

#![allow(missing_docs, clippy::unwrap_used)]

use kcal_engine::errors::ErrorCode;
use kcal_engine::models::{FoodKind, IngredientSpec, NewFoodItem, COMPOSITE_UNIT};
use kcal_engine::services::{IngredientForm, RecipeComposer, RecipeDraft};

mod common;
use common::{create_test_database, create_test_user, seed_global_ingredient};

// ============================================================================
// Creation from drafts
// ============================================================================

#[tokio::test]
async fn test_curry_set_aggregates_master_and_manual_lines() {
    let database = create_test_database().await;
    let user = create_test_user(&database, "user@example.com").await;
    let curry = seed_global_ingredient(&database, "Chicken Curry", 300, "plate").await;

    let composer = RecipeComposer::new(database.pool().clone());
    let draft = RecipeDraft {
        name: "Curry Set".to_owned(),
        kind: Some(FoodKind::Dish),
        lines: vec![
            IngredientForm {
                food_item_id: Some(curry),
                amount: Some(1.0),
                ..IngredientForm::default()
            },
            IngredientForm {
                manual_name: Some("Rice".to_owned()),
                manual_calories: Some(250),
                ..IngredientForm::default()
            },
        ],
    };

    let created = composer.create_from_draft(user.id, draft).await.unwrap();
    assert_eq!(created.calories, 550);
    assert_eq!(created.kind, FoodKind::Dish);
    assert_eq!(created.unit, COMPOSITE_UNIT);
    assert_eq!(created.owner_id, Some(user.id));

    // Persisted rows match what the call returned
    let stored = database.catalog().get_food(created.id).await.unwrap().unwrap();
    assert_eq!(stored, created);

    let lines = database.catalog().lines_of(created.id).await.unwrap();
    assert_eq!(lines.len(), 2);
    assert_eq!(
        lines[0].ingredient,
        IngredientSpec::MasterRef {
            food_id: curry,
            amount: 1.0
        }
    );
    assert_eq!(
        lines[1].ingredient,
        IngredientSpec::Manual {
            name: "Rice".to_owned(),
            calories: 250
        }
    );
}

#[tokio::test]
async fn test_draft_kind_defaults_to_dish() {
    let database = create_test_database().await;
    let user = create_test_user(&database, "user@example.com").await;

    let composer = RecipeComposer::new(database.pool().clone());
    let draft = RecipeDraft {
        name: "Plain Set".to_owned(),
        kind: None,
        lines: vec![],
    };

    let created = composer.create_from_draft(user.id, draft).await.unwrap();
    assert_eq!(created.kind, FoodKind::Dish);
    assert_eq!(created.calories, 0);
}

#[tokio::test]
async fn test_meal_set_kind_is_preserved() {
    let database = create_test_database().await;
    let user = create_test_user(&database, "user@example.com").await;

    let composer = RecipeComposer::new(database.pool().clone());
    let created = composer
        .create_composite(user.id, "Breakfast Set", FoodKind::MealSet, &[])
        .await
        .unwrap();
    assert_eq!(created.kind, FoodKind::MealSet);

    let lines = database.catalog().lines_of(created.id).await.unwrap();
    assert!(lines.is_empty());
}

#[tokio::test]
async fn test_amount_scaling_rounds_half_away_from_zero() {
    let database = create_test_database().await;
    let user = create_test_user(&database, "user@example.com").await;
    let cheese = seed_global_ingredient(&database, "Cheese", 333, "100g").await;
    let bread = seed_global_ingredient(&database, "Bread", 201, "slice").await;

    let composer = RecipeComposer::new(database.pool().clone());
    let created = composer
        .create_composite(
            user.id,
            "Cheese Toast",
            FoodKind::Dish,
            &[
                // 333 * 0.5 = 166.5 rounds to 167
                IngredientSpec::master_with_amount(cheese, 0.5),
                // 201 * 1.5 = 301.5 rounds to 302
                IngredientSpec::master_with_amount(bread, 1.5),
            ],
        )
        .await
        .unwrap();

    assert_eq!(created.calories, 167 + 302);
}

#[tokio::test]
async fn test_dish_can_reference_another_dish() {
    let database = create_test_database().await;
    let user = create_test_user(&database, "user@example.com").await;

    let composer = RecipeComposer::new(database.pool().clone());
    let inner = composer
        .create_composite(
            user.id,
            "Side Salad",
            FoodKind::Dish,
            &[IngredientSpec::manual("Greens", 100)],
        )
        .await
        .unwrap();

    let outer = composer
        .create_composite(
            user.id,
            "Lunch Set",
            FoodKind::MealSet,
            &[IngredientSpec::master_with_amount(inner.id, 2.0)],
        )
        .await
        .unwrap();

    assert_eq!(outer.calories, 200);
}

// ============================================================================
// Validation and atomicity
// ============================================================================

#[tokio::test]
async fn test_missing_master_id_rolls_back_everything() {
    let database = create_test_database().await;
    let user = create_test_user(&database, "user@example.com").await;
    let rice = seed_global_ingredient(&database, "Rice", 168, "100g").await;

    let composer = RecipeComposer::new(database.pool().clone());
    let err = composer
        .create_composite(
            user.id,
            "Ghost Bowl",
            FoodKind::Dish,
            &[IngredientSpec::master(rice), IngredientSpec::master(9999)],
        )
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::ResourceNotFound);
    assert!(err.message.contains("9999"));

    // The parent inserted before resolution must be gone again
    let owned = database.catalog().list_owned(user.id).await.unwrap();
    assert!(owned.is_empty());
}

#[tokio::test]
async fn test_draft_with_malformed_line_writes_nothing() {
    let database = create_test_database().await;
    let user = create_test_user(&database, "user@example.com").await;
    let rice = seed_global_ingredient(&database, "Rice", 168, "100g").await;

    let composer = RecipeComposer::new(database.pool().clone());
    let draft = RecipeDraft {
        name: "Broken".to_owned(),
        kind: None,
        lines: vec![IngredientForm {
            food_item_id: Some(rice),
            manual_name: Some("Rice".to_owned()),
            ..IngredientForm::default()
        }],
    };

    let err = composer.create_from_draft(user.id, draft).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);
    assert!(database.catalog().list_owned(user.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_rejects_bad_names_kinds_and_values() {
    let database = create_test_database().await;
    let user = create_test_user(&database, "user@example.com").await;
    let rice = seed_global_ingredient(&database, "Rice", 168, "100g").await;

    let composer = RecipeComposer::new(database.pool().clone());

    let err = composer
        .create_composite(user.id, "   ", FoodKind::Dish, &[])
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);

    let err = composer
        .create_composite(user.id, "Bowl", FoodKind::Ingredient, &[])
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);

    let err = composer
        .create_composite(
            user.id,
            "Bowl",
            FoodKind::Dish,
            &[IngredientSpec::master_with_amount(rice, 0.0)],
        )
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);

    let err = composer
        .create_composite(
            user.id,
            "Bowl",
            FoodKind::Dish,
            &[IngredientSpec::manual("Mystery", -10)],
        )
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);

    assert!(database.catalog().list_owned(user.id).await.unwrap().is_empty());
}

// ============================================================================
// Detail read-back
// ============================================================================

#[tokio::test]
async fn test_composite_detail_applies_display_name_rule() {
    let database = create_test_database().await;
    let user = create_test_user(&database, "user@example.com").await;
    let curry = seed_global_ingredient(&database, "Chicken Curry", 300, "plate").await;

    let composer = RecipeComposer::new(database.pool().clone());
    let created = composer
        .create_composite(
            user.id,
            "Curry Set",
            FoodKind::Dish,
            &[
                IngredientSpec::master(curry),
                IngredientSpec::manual("Rice", 250),
            ],
        )
        .await
        .unwrap();

    let detail = composer.composite_detail(created.id).await.unwrap();
    assert_eq!(detail.item.calories, 550);
    assert_eq!(detail.lines.len(), 2);

    assert_eq!(detail.lines[0].display_name, "Chicken Curry");
    assert_eq!(detail.lines[0].calories, 300);
    assert!((detail.lines[0].amount - 1.0).abs() < f64::EPSILON);

    assert_eq!(detail.lines[1].display_name, "Rice");
    assert_eq!(detail.lines[1].calories, 250);
    assert!((detail.lines[1].amount - 1.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_composite_detail_for_plain_ingredient_has_no_lines() {
    let database = create_test_database().await;
    let rice = seed_global_ingredient(&database, "Rice", 168, "100g").await;

    let composer = RecipeComposer::new(database.pool().clone());
    let detail = composer.composite_detail(rice).await.unwrap();
    assert_eq!(detail.item.name, "Rice");
    assert!(detail.lines.is_empty());
}

#[tokio::test]
async fn test_composite_detail_unknown_id_is_not_found() {
    let database = create_test_database().await;
    let composer = RecipeComposer::new(database.pool().clone());

    let err = composer.composite_detail(9999).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);
}

#[tokio::test]
async fn test_stored_total_is_a_snapshot_while_detail_lines_are_live() {
    let database = create_test_database().await;
    let user = create_test_user(&database, "user@example.com").await;

    let ingredient = database
        .catalog()
        .create_food(&NewFoodItem::ingredient(Some(user.id), "Chicken", 300, "100g"))
        .await
        .unwrap();

    let composer = RecipeComposer::new(database.pool().clone());
    let created = composer
        .create_composite(
            user.id,
            "Chicken Bowl",
            FoodKind::Dish,
            &[IngredientSpec::master(ingredient.id)],
        )
        .await
        .unwrap();
    assert_eq!(created.calories, 300);

    database
        .catalog()
        .update_food(user.id, ingredient.id, "Chicken", 400, "100g")
        .await
        .unwrap();

    // The parent keeps the total computed at creation time
    let stored = database.catalog().get_food(created.id).await.unwrap().unwrap();
    assert_eq!(stored.calories, 300);

    // The read-back resolves lines against the current catalog values
    let detail = composer.composite_detail(created.id).await.unwrap();
    assert_eq!(detail.lines[0].calories, 400);
}
