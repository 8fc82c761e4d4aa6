// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides database, user, and catalog seeding helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 kcal-engine contributors
#![allow(dead_code, clippy::unwrap_used)]

//! Shared test setup helpers
//!
//! Every integration test works against an in-memory database with the
//! full schema applied.

use std::sync::Once;

use kcal_engine::database::Database;
use kcal_engine::models::{NewFoodItem, NewUser, User};

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// In-memory database with migrations applied
pub async fn create_test_database() -> Database {
    init_test_logging();
    let database = Database::new("sqlite::memory:").await.unwrap();
    database.migrate().await.unwrap();
    database
}

/// Register a user with the given email
pub async fn create_test_user(database: &Database, email: &str) -> User {
    database
        .user_store()
        .create_user(&NewUser::new(email))
        .await
        .unwrap()
}

/// Seed a global (system-owned) ingredient and return its id
pub async fn seed_global_ingredient(
    database: &Database,
    name: &str,
    calories: i64,
    unit: &str,
) -> i64 {
    database
        .catalog()
        .create_food(&NewFoodItem::ingredient(None, name, calories, unit))
        .await
        .unwrap()
        .id
}
