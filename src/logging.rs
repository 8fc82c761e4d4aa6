// ABOUTME: Logging configuration and structured logging setup for observability and debugging
// ABOUTME: Configures the filter, output format, and location/span toggles for the engine
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 kcal-engine contributors

//! Structured logging setup
//!
//! The engine is a library, so the embedding process decides when to
//! install the global subscriber. [`LoggingConfig::from_env`] follows the
//! same `KCAL_` prefix convention as the metabolism configuration;
//! `RUST_LOG` takes precedence for the filter when set.

use anyhow::Result;
use std::env;
use std::io;
use tracing::info;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// `JSON` lines for production log pipelines
    Json,
    /// Human-readable multi-line output for development
    Pretty,
    /// Single-line output for space-constrained environments
    Compact,
}

impl LogFormat {
    fn parse(s: &str) -> Self {
        match s {
            "json" => Self::Json,
            "compact" => Self::Compact,
            _ => Self::Pretty,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Level applied to this crate (trace, debug, info, warn, error)
    pub level: String,
    /// Output format
    pub format: LogFormat,
    /// Include source file and line numbers in events
    pub include_location: bool,
    /// Emit span open and close events
    pub include_spans: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: LogFormat::Pretty,
            include_location: false,
            include_spans: false,
        }
    }
}

impl LoggingConfig {
    /// Read the logging configuration from the environment
    ///
    /// Recognized variables:
    /// - `KCAL_LOG` - level for the engine crate (default `info`)
    /// - `KCAL_LOG_FORMAT` - `json`, `pretty`, or `compact` (default `pretty`)
    /// - `KCAL_LOG_LOCATION` - include file and line numbers when set
    /// - `KCAL_LOG_SPANS` - emit span open/close events when set
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            level: env::var("KCAL_LOG").unwrap_or_else(|_| "info".into()),
            format: env::var("KCAL_LOG_FORMAT")
                .as_deref()
                .map_or(LogFormat::Pretty, LogFormat::parse),
            include_location: env::var("KCAL_LOG_LOCATION").is_ok(),
            include_spans: env::var("KCAL_LOG_SPANS").is_ok(),
        }
    }

    /// Install the global tracing subscriber
    ///
    /// With `RUST_LOG` set, its filter wins as-is. Otherwise everything
    /// defaults to `warn` and this crate runs at the configured level;
    /// `sqlx` statement noise is capped at `warn` either way.
    ///
    /// # Errors
    ///
    /// Returns an error if a filter directive fails to parse or a global
    /// subscriber is already installed.
    pub fn init(&self) -> Result<()> {
        let filter = match env::var("RUST_LOG") {
            Ok(spec) => EnvFilter::new(spec),
            Err(_) => EnvFilter::new("warn")
                .add_directive(format!("kcal_engine={}", self.level).parse()?),
        }
        .add_directive("sqlx=warn".parse()?);

        let span_events = if self.include_spans {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };
        let layer = fmt::layer()
            .with_file(self.include_location)
            .with_line_number(self.include_location)
            .with_target(true)
            .with_writer(io::stdout)
            .with_span_events(span_events);

        let registry = tracing_subscriber::registry().with(filter);
        match self.format {
            LogFormat::Json => registry.with(layer.json()).try_init()?,
            LogFormat::Pretty => registry.with(layer).try_init()?,
            LogFormat::Compact => registry.with(layer.compact()).try_init()?,
        }

        info!(
            version = env!("CARGO_PKG_VERSION"),
            level = %self.level,
            format = ?self.format,
            "Logging initialized"
        );
        Ok(())
    }
}

/// Initialize logging with default configuration
///
/// # Errors
///
/// Returns an error if logging initialization fails
pub fn init_default() -> Result<()> {
    LoggingConfig::default().init()
}

/// Initialize logging from environment
///
/// # Errors
///
/// Returns an error if logging initialization fails
pub fn init_from_env() -> Result<()> {
    LoggingConfig::from_env().init()
}
