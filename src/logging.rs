//! Logging setup for Prax ODBC.
//!
//! The crates only emit `tracing` events. This module installs a subscriber for
//! applications that do not bring their own, controlled by environment variables.
//!
//! # Environment Variables
//!
//! - `PRAX_ODBC_DEBUG=true|1|yes` - Enable debug logging
//! - `PRAX_ODBC_LOG_LEVEL=debug|info|warn|error|trace` - Set specific log level
//! - `PRAX_ODBC_LOG_FORMAT=json|pretty|compact` - Set output format (default: json)
//!
//! # Usage
//!
//! ```rust,no_run
//! use prax_odbc::logging;
//!
//! // Initialize logging (call once at startup)
//! logging::init();
//! ```

use std::env;
use std::sync::Once;

static INIT: Once = Once::new();

const DEBUG_VAR: &str = "PRAX_ODBC_DEBUG";
const LEVEL_VAR: &str = "PRAX_ODBC_LOG_LEVEL";
const FORMAT_VAR: &str = "PRAX_ODBC_LOG_FORMAT";

/// Check if debug logging is enabled via `PRAX_ODBC_DEBUG`.
///
/// Returns `true` if it is set to "true", "1", or "yes" (case-insensitive).
#[inline]
pub fn is_debug_enabled() -> bool {
    env::var(DEBUG_VAR)
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(false)
}

/// Get the configured log level from `PRAX_ODBC_LOG_LEVEL`.
///
/// Unknown or missing values fall back to "debug" when debug logging is enabled,
/// otherwise "warn".
pub fn get_log_level() -> &'static str {
    let fallback = if is_debug_enabled() { "debug" } else { "warn" };
    match env::var(LEVEL_VAR) {
        Ok(level) => match level.to_lowercase().as_str() {
            "trace" => "trace",
            "debug" => "debug",
            "info" => "info",
            "warn" => "warn",
            "error" => "error",
            _ => fallback,
        },
        Err(_) => fallback,
    }
}

/// Get the configured log format from `PRAX_ODBC_LOG_FORMAT`.
///
/// Defaults to "json".
pub fn get_log_format() -> &'static str {
    env::var(FORMAT_VAR)
        .map(|f| match f.to_lowercase().as_str() {
            "pretty" => "pretty",
            "compact" => "compact",
            _ => "json",
        })
        .unwrap_or("json")
}

/// Initialize logging. Subsequent calls are no-ops.
///
/// Nothing is installed unless `PRAX_ODBC_DEBUG` or `PRAX_ODBC_LOG_LEVEL` is set, or
/// when the `tracing-subscriber` feature is disabled.
pub fn init() {
    INIT.call_once(|| {
        if !is_debug_enabled() && env::var(LEVEL_VAR).is_err() {
            return;
        }

        #[cfg(feature = "tracing-subscriber")]
        {
            use tracing_subscriber::{EnvFilter, fmt, prelude::*};

            let level = get_log_level();
            let filter = EnvFilter::try_new(format!(
                "prax_odbc={},prax_odbc_registry={},prax_odbc_driver={}",
                level, level, level
            ))
            .unwrap_or_else(|_| EnvFilter::new("warn"));

            let registry = tracing_subscriber::registry().with(filter);
            let installed = match get_log_format() {
                "json" => registry.with(fmt::layer().json()).try_init(),
                "compact" => registry.with(fmt::layer().compact()).try_init(),
                _ => registry.with(fmt::layer().pretty()).try_init(),
            };

            if installed.is_ok() {
                tracing::info!(
                    level = level,
                    format = get_log_format(),
                    "Prax ODBC logging initialized"
                );
            }
        }
    });
}

/// Initialize logging with a specific level.
///
/// # Safety
///
/// This function modifies environment variables, which is unsafe in
/// multi-threaded programs. Call this early in your program before
/// spawning threads.
pub fn init_with_level(level: &str) {
    // SAFETY: only called at program startup before threads are spawned.
    unsafe {
        env::set_var(LEVEL_VAR, level);
    }
    init();
}

#[cfg(test)]
mod tests {
    use super::*;

    // One test touches the process environment so the assertions cannot race.
    #[test]
    fn test_env_controls() {
        // SAFETY: no other test in this crate reads these variables
        unsafe {
            env::remove_var(DEBUG_VAR);
            env::remove_var(LEVEL_VAR);
            env::remove_var(FORMAT_VAR);
        }
        assert!(!is_debug_enabled());
        assert_eq!(get_log_level(), "warn");
        assert_eq!(get_log_format(), "json");

        unsafe {
            env::set_var(DEBUG_VAR, "YES");
        }
        assert!(is_debug_enabled());
        assert_eq!(get_log_level(), "debug");

        unsafe {
            env::set_var(LEVEL_VAR, "trace");
            env::set_var(FORMAT_VAR, "Compact");
        }
        assert_eq!(get_log_level(), "trace");
        assert_eq!(get_log_format(), "compact");

        unsafe {
            env::set_var(LEVEL_VAR, "loud");
        }
        assert_eq!(get_log_level(), "debug");

        unsafe {
            env::remove_var(DEBUG_VAR);
            env::remove_var(LEVEL_VAR);
            env::remove_var(FORMAT_VAR);
        }
    }
}
