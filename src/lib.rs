// ABOUTME: Main library entry point for the calorie composition and target engine
// ABOUTME: Exposes the food catalog, recipe composer, meal ledger, weight tracker, and target services
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 kcal-engine contributors

#![deny(unsafe_code)]

//! # kcal engine
//!
//! Core engine for calorie tracking with a weight-gain goal: users log meals
//! against a daily calorie target derived from their body profile and most
//! recent weight sample, and define composite foods aggregated from other
//! foods.
//!
//! ## Features
//!
//! - **Food catalog**: system-wide and user-owned master food records
//! - **Recipe composition**: composite foods built from catalog references
//!   and manual ingredients, with an atomically computed calorie total
//! - **Meal ledger**: timestamped meal events that snapshot name and calories
//!   at recording time
//! - **Weight tracking**: one sample per (user, day), upsert semantics
//! - **Metabolism engine**: pure Mifflin-St Jeor BMR/TDEE/target computation
//! - **Profile coordination**: the cached daily target is recomputed inside
//!   the same transaction as every profile or weight write
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use chrono::Utc;
//! use kcal_engine::config::MetabolismConfig;
//! use kcal_engine::database::Database;
//! use kcal_engine::errors::AppResult;
//! use kcal_engine::models::NewUser;
//! use kcal_engine::services::ProfileCoordinator;
//!
//! #[tokio::main]
//! async fn main() -> AppResult<()> {
//!     let database = Database::new("sqlite:kcal.db").await?;
//!     database.migrate().await?;
//!
//!     let user = database.user_store().create_user(&NewUser::new("amon@example.com")).await?;
//!
//!     let coordinator =
//!         ProfileCoordinator::new(database.pool().clone(), MetabolismConfig::default());
//!     let target = coordinator.record_weight(user.id, Utc::now().date_naive(), 65.0).await?;
//!     println!("daily target: {target} kcal");
//!     Ok(())
//! }
//! ```

// ── Public API ──────────────────────────────────────────────────────────
// These modules are used by integration tests (tests/) and by the API layer
// embedding this crate. They must remain `pub`.

/// Metabolism formula and target-calorie configuration
pub mod config;

/// `SQLite`-backed entity stores, migrations, and transaction helpers
pub mod database;

/// Unified error handling system with standard error codes and HTTP responses
pub mod errors;

/// Pure calculation engines (BMR, TDEE, daily calorie target)
pub mod intelligence;

/// Logging configuration and structured logging setup
pub mod logging;

/// Common data structures for users, foods, meals, and weight samples
pub mod models;

/// Business-flow services composing the stores and the metabolism engine
pub mod services;
