// ABOUTME: Integration tests for the profile coordinator
// ABOUTME: Covers target recompute on every profile and weight write
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 kcal-engine contributors

#![allow(missing_docs, clippy::unwrap_used)]

use chrono::NaiveDate;
use kcal_engine::config::MetabolismConfig;
use kcal_engine::errors::ErrorCode;
use kcal_engine::intelligence::energy_targets_for_profile;
use kcal_engine::models::{ActivityLevel, BodyProfile, Gender};
use kcal_engine::services::{InitialProfile, ProfileCoordinator};
use uuid::Uuid;

mod common;
use common::{create_test_database, create_test_user};

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn standard_initial() -> InitialProfile {
    InitialProfile {
        height_cm: 170.0,
        weight_kg: 65.0,
        age_years: 25,
        gender: Gender::Male,
        activity_level: ActivityLevel::Mid,
    }
}

// ============================================================================
// Initial profile
// ============================================================================

#[tokio::test]
async fn test_complete_initial_profile_stores_everything_at_once() {
    let database = create_test_database().await;
    let user = create_test_user(&database, "user@example.com").await;
    let coordinator = ProfileCoordinator::new(database.pool().clone(), MetabolismConfig::default());

    // 170cm / 65kg / 25y male, mid activity: bmr 1592.5, tdee 2468.4,
    // target 2468.375 + 300 rounded to 2768
    let target = coordinator
        .complete_initial_profile(user.id, standard_initial())
        .await
        .unwrap();
    assert_eq!(target, 2768);

    let stored = database.user_store().get_user(user.id).await.unwrap().unwrap();
    assert_eq!(stored.target_calories, Some(2768));
    assert_eq!(stored.profile.height_cm, Some(170.0));
    assert_eq!(stored.profile.age_years, Some(25));
    assert_eq!(stored.profile.gender, Some(Gender::Male));
    assert_eq!(stored.profile.activity_level, Some(ActivityLevel::Mid));

    let latest = database.weight_tracker().latest(user.id).await.unwrap().unwrap();
    assert!((latest.weight_kg - 65.0).abs() < f64::EPSILON);

    assert!(coordinator.is_profile_completed(user.id).await.unwrap());
}

#[tokio::test]
async fn test_out_of_range_initial_profile_writes_nothing() {
    let database = create_test_database().await;
    let user = create_test_user(&database, "user@example.com").await;
    let coordinator = ProfileCoordinator::new(database.pool().clone(), MetabolismConfig::default());

    let mut initial = standard_initial();
    initial.height_cm = 400.0;
    let err = coordinator
        .complete_initial_profile(user.id, initial)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);

    let stored = database.user_store().get_user(user.id).await.unwrap().unwrap();
    assert!(stored.target_calories.is_none());
    assert!(stored.profile.height_cm.is_none());
    assert!(database.weight_tracker().latest(user.id).await.unwrap().is_none());
}

// ============================================================================
// Recompute on write
// ============================================================================

#[tokio::test]
async fn test_weight_only_user_gets_the_default_target() {
    let database = create_test_database().await;
    let user = create_test_user(&database, "user@example.com").await;
    let coordinator = ProfileCoordinator::new(database.pool().clone(), MetabolismConfig::default());

    let target = coordinator
        .record_weight(user.id, date(2024, 1, 1), 65.0)
        .await
        .unwrap();
    assert_eq!(target, 2200);

    let stored = database.user_store().get_user(user.id).await.unwrap().unwrap();
    assert_eq!(stored.target_calories, Some(2200));
}

#[tokio::test]
async fn test_profile_save_then_weight_flips_from_default_to_formula() {
    let database = create_test_database().await;
    let user = create_test_user(&database, "user@example.com").await;
    let coordinator = ProfileCoordinator::new(database.pool().clone(), MetabolismConfig::default());

    let profile = BodyProfile {
        height_cm: Some(170.0),
        age_years: Some(25),
        gender: Some(Gender::Male),
        activity_level: Some(ActivityLevel::Mid),
    };

    // No weight sample yet, so the profile save falls back to the default
    let target = coordinator.save_profile(user.id, profile).await.unwrap();
    assert_eq!(target, 2200);

    let target = coordinator
        .record_weight(user.id, date(2024, 1, 1), 65.0)
        .await
        .unwrap();
    assert_eq!(target, 2768);

    // A heavier sample on a later date moves the target
    let target = coordinator
        .record_weight(user.id, date(2024, 1, 8), 70.0)
        .await
        .unwrap();
    assert_eq!(target, 2846);
}

#[tokio::test]
async fn test_backfilled_older_weight_keeps_the_latest_based_target() {
    let database = create_test_database().await;
    let user = create_test_user(&database, "user@example.com").await;
    let coordinator = ProfileCoordinator::new(database.pool().clone(), MetabolismConfig::default());

    coordinator
        .complete_initial_profile(user.id, standard_initial())
        .await
        .unwrap();
    let target = coordinator
        .record_weight(user.id, date(2024, 2, 1), 65.0)
        .await
        .unwrap();
    assert_eq!(target, 2768);

    // Recording an older date must not override the newer measurement
    let target = coordinator
        .record_weight(user.id, date(2024, 1, 1), 80.0)
        .await
        .unwrap();
    assert_eq!(target, 2768);

    let stored = database.user_store().get_user(user.id).await.unwrap().unwrap();
    assert_eq!(stored.target_calories, Some(2768));
}

#[tokio::test]
async fn test_cached_target_always_matches_the_engine() {
    let database = create_test_database().await;
    let user = create_test_user(&database, "user@example.com").await;
    let config = MetabolismConfig::default();
    let coordinator = ProfileCoordinator::new(database.pool().clone(), config.clone());

    coordinator
        .complete_initial_profile(user.id, standard_initial())
        .await
        .unwrap();
    coordinator
        .record_weight(user.id, date(2024, 1, 10), 66.5)
        .await
        .unwrap();
    let profile = BodyProfile {
        height_cm: Some(172.0),
        age_years: Some(26),
        gender: Some(Gender::Female),
        activity_level: Some(ActivityLevel::High),
    };
    coordinator.save_profile(user.id, profile).await.unwrap();

    let stored = database.user_store().get_user(user.id).await.unwrap().unwrap();
    let latest = database.weight_tracker().latest(user.id).await.unwrap().unwrap();
    let expected = energy_targets_for_profile(&stored.profile, Some(latest.weight_kg), &config)
        .unwrap()
        .target_calories;
    assert_eq!(stored.target_calories, Some(expected));
}

#[tokio::test]
async fn test_save_profile_overwrites_all_fields() {
    let database = create_test_database().await;
    let user = create_test_user(&database, "user@example.com").await;
    let coordinator = ProfileCoordinator::new(database.pool().clone(), MetabolismConfig::default());

    coordinator
        .complete_initial_profile(user.id, standard_initial())
        .await
        .unwrap();

    // Saving a partial profile clears the omitted fields and falls back
    // to the default target
    let partial = BodyProfile {
        height_cm: Some(170.0),
        ..BodyProfile::default()
    };
    let target = coordinator.save_profile(user.id, partial).await.unwrap();
    assert_eq!(target, 2200);

    let stored = database.user_store().get_user(user.id).await.unwrap().unwrap();
    assert!(stored.profile.age_years.is_none());
    assert!(stored.profile.gender.is_none());
    assert!(stored.profile.activity_level.is_none());
    assert_eq!(stored.target_calories, Some(2200));
}

// ============================================================================
// Completion checks and guards
// ============================================================================

#[tokio::test]
async fn test_is_profile_completed_requires_height_and_a_sample() {
    let database = create_test_database().await;
    let user = create_test_user(&database, "user@example.com").await;
    let coordinator = ProfileCoordinator::new(database.pool().clone(), MetabolismConfig::default());

    assert!(!coordinator.is_profile_completed(user.id).await.unwrap());

    coordinator
        .record_weight(user.id, date(2024, 1, 1), 65.0)
        .await
        .unwrap();
    assert!(!coordinator.is_profile_completed(user.id).await.unwrap());

    let profile = BodyProfile {
        height_cm: Some(170.0),
        ..BodyProfile::default()
    };
    coordinator.save_profile(user.id, profile).await.unwrap();
    assert!(coordinator.is_profile_completed(user.id).await.unwrap());
}

#[tokio::test]
async fn test_unknown_user_is_not_found_on_every_entry_point() {
    let database = create_test_database().await;
    let coordinator = ProfileCoordinator::new(database.pool().clone(), MetabolismConfig::default());
    let ghost = Uuid::new_v4();

    let err = coordinator
        .save_profile(ghost, BodyProfile::default())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);

    let err = coordinator
        .record_weight(ghost, date(2024, 1, 1), 65.0)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);

    let err = coordinator
        .complete_initial_profile(ghost, standard_initial())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);

    let err = coordinator.is_profile_completed(ghost).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);
}
