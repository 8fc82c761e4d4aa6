// ABOUTME: Configuration management for the engine
// ABOUTME: Holds the metabolism formula coefficients and target-calorie policy values
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 kcal-engine contributors

//! Engine configuration.
//!
//! The metabolism constants here are the single source of truth for the
//! target-calorie computation; historical deployments disagreed on some of
//! them, so they are configuration rather than literals in the formula code.

pub mod metabolism;

pub use metabolism::{ActivityFactorsConfig, MetabolismConfig, MifflinStJeorConfig};
