// ABOUTME: Integration tests for the weight tracker
// ABOUTME: Covers per-day upsert semantics, history ordering, and latest lookup
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 kcal-engine contributors

#![allow(missing_docs, clippy::unwrap_used)]

use chrono::NaiveDate;
use kcal_engine::errors::ErrorCode;

mod common;
use common::{create_test_database, create_test_user};

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

#[tokio::test]
async fn test_record_and_read_back() {
    let database = create_test_database().await;
    let user = create_test_user(&database, "user@example.com").await;
    let tracker = database.weight_tracker();

    let sample = tracker
        .record_sample(user.id, date(2024, 1, 1), 70.0)
        .await
        .unwrap();
    assert_eq!(sample.user_id, user.id);
    assert_eq!(sample.date, date(2024, 1, 1));
    assert!((sample.weight_kg - 70.0).abs() < f64::EPSILON);
    assert!(sample.id > 0);

    let found = tracker
        .sample_on(user.id, date(2024, 1, 1))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found, sample);

    assert!(tracker
        .sample_on(user.id, date(2024, 1, 2))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_same_date_overwrites_leaving_one_sample() {
    let database = create_test_database().await;
    let user = create_test_user(&database, "user@example.com").await;
    let tracker = database.weight_tracker();

    tracker
        .record_sample(user.id, date(2024, 1, 1), 70.0)
        .await
        .unwrap();
    tracker
        .record_sample(user.id, date(2024, 1, 1), 69.0)
        .await
        .unwrap();

    let history = tracker.history(user.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert!((history[0].weight_kg - 69.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_history_is_ordered_by_date_ascending() {
    let database = create_test_database().await;
    let user = create_test_user(&database, "user@example.com").await;
    let tracker = database.weight_tracker();

    tracker
        .record_sample(user.id, date(2024, 1, 20), 66.0)
        .await
        .unwrap();
    tracker
        .record_sample(user.id, date(2024, 1, 5), 65.0)
        .await
        .unwrap();
    tracker
        .record_sample(user.id, date(2024, 1, 12), 65.5)
        .await
        .unwrap();

    let history = tracker.history(user.id).await.unwrap();
    let dates: Vec<NaiveDate> = history.iter().map(|s| s.date).collect();
    assert_eq!(
        dates,
        vec![date(2024, 1, 5), date(2024, 1, 12), date(2024, 1, 20)]
    );
}

#[tokio::test]
async fn test_latest_picks_the_newest_date_not_the_newest_write() {
    let database = create_test_database().await;
    let user = create_test_user(&database, "user@example.com").await;
    let tracker = database.weight_tracker();

    tracker
        .record_sample(user.id, date(2024, 2, 1), 66.0)
        .await
        .unwrap();
    // Backfill an older measurement afterwards
    tracker
        .record_sample(user.id, date(2024, 1, 1), 64.0)
        .await
        .unwrap();

    let latest = tracker.latest(user.id).await.unwrap().unwrap();
    assert_eq!(latest.date, date(2024, 2, 1));
    assert!((latest.weight_kg - 66.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_rejects_non_positive_weight() {
    let database = create_test_database().await;
    let user = create_test_user(&database, "user@example.com").await;
    let tracker = database.weight_tracker();

    for weight in [0.0, -5.0, f64::NAN, f64::INFINITY] {
        let err = tracker
            .record_sample(user.id, date(2024, 1, 1), weight)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);
    }
    assert!(tracker.history(user.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_samples_are_isolated_per_user() {
    let database = create_test_database().await;
    let user_a = create_test_user(&database, "a@example.com").await;
    let user_b = create_test_user(&database, "b@example.com").await;
    let tracker = database.weight_tracker();

    tracker
        .record_sample(user_a.id, date(2024, 1, 1), 70.0)
        .await
        .unwrap();
    tracker
        .record_sample(user_b.id, date(2024, 1, 1), 80.0)
        .await
        .unwrap();

    let latest_a = tracker.latest(user_a.id).await.unwrap().unwrap();
    let latest_b = tracker.latest(user_b.id).await.unwrap().unwrap();
    assert!((latest_a.weight_kg - 70.0).abs() < f64::EPSILON);
    assert!((latest_b.weight_kg - 80.0).abs() < f64::EPSILON);
}
