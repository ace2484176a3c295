// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Logging for the carepond workspace.
//!
//! Every crate logs through the macros below, which forward to `emit` with
//! named template properties:
//!
//! ```ignore
//! diagnostics::log_info!("Executing query: {sql}", sql: statement.display());
//! ```
//!
//! The stream goes to stderr and is controlled by `CAREPOND_LOG`:
//! - `off` (default) - no logs
//! - `error`, `warn` - problems only
//! - `info` - queries issued, their outcome, lifecycle events
//! - `debug` - pipeline steps and cache traffic

use std::sync::Once;

// Re-export emit so macros can use it
pub use emit;

/// Environment variable consulted by [`init_diagnostics`].
pub const LOG_ENV: &str = "CAREPOND_LOG";

static INIT: Once = Once::new();

/// Minimum level selected by `CAREPOND_LOG`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
}

impl LogLevel {
    /// Parse a `CAREPOND_LOG` value. Unknown values yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "off" => Some(Self::Off),
            "error" => Some(Self::Error),
            "warn" => Some(Self::Warn),
            "info" => Some(Self::Info),
            "debug" => Some(Self::Debug),
            _ => None,
        }
    }

    fn emit_level(self) -> Option<emit::Level> {
        match self {
            Self::Off => None,
            Self::Error => Some(emit::Level::Error),
            Self::Warn => Some(emit::Level::Warn),
            Self::Info => Some(emit::Level::Info),
            Self::Debug => Some(emit::Level::Debug),
        }
    }
}

/// Initialize diagnostics based on the `CAREPOND_LOG` environment variable.
///
/// Call once at startup; later calls are ignored.
pub fn init_diagnostics() {
    INIT.call_once(|| {
        let raw = std::env::var(LOG_ENV).unwrap_or_else(|_| "off".to_string());
        let (level, unknown) = match LogLevel::parse(&raw) {
            Some(level) => (level, false),
            None => (LogLevel::Info, true),
        };

        let Some(min) = level.emit_level() else {
            return;
        };

        let rt = emit::setup()
            .emit_to(emit_term::stderr())
            .emit_when(emit::level::min_filter(min))
            .init();

        if unknown {
            emit::warn!("Unknown {var} value {value}, using info", var: LOG_ENV, value: raw.as_str());
        }

        // The runtime must outlive every later log call.
        std::mem::forget(rt);
    });
}

/// Log lifecycle events and queries issued against the warehouse.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::emit::info!($($arg)*)
    };
}

/// Log detailed diagnostics (row counts, pipeline steps, cache hits).
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        $crate::emit::debug!($($arg)*)
    };
}

/// Log recoverable conditions (fallbacks, tolerated data problems).
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        $crate::emit::warn!($($arg)*)
    };
}

/// Log failures (query errors, startup aborts).
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        $crate::emit::error!($($arg)*)
    };
}

pub use init_diagnostics as init;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_safe_to_call_multiple_times() {
        init_diagnostics();
        init_diagnostics();
    }

    #[test]
    fn test_parse_levels() {
        assert_eq!(LogLevel::parse("off"), Some(LogLevel::Off));
        assert_eq!(LogLevel::parse(""), Some(LogLevel::Off));
        assert_eq!(LogLevel::parse("INFO"), Some(LogLevel::Info));
        assert_eq!(LogLevel::parse(" debug "), Some(LogLevel::Debug));
        assert_eq!(LogLevel::parse("verbose"), None);
    }

    #[test]
    fn test_macros_compile() {
        log_info!("Test message");
        log_debug!("Debug message with {value}", value: 42);
        log_warn!("Warning message");
        log_error!("Error message for {table}", table: "cms_data");
    }
}
