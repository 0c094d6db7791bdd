use std::str::FromStr;

use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so tests can drive it with a
/// plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let database_url = require("DATABASE_URL")?;
    let token_hash_salt = require("RATEKIT_TOKEN_HASH_SALT")?;

    let env = parse_environment(&or_default("RATEKIT_ENV", "development"))?;
    let bind_addr = parse_var(&or_default, "RATEKIT_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("RATEKIT_LOG_LEVEL", "info");

    let db_max_connections = parse_var(&or_default, "RATEKIT_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_var(&or_default, "RATEKIT_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs =
        parse_var(&or_default, "RATEKIT_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let youtube_formula = parse_var(&or_default, "RATEKIT_YOUTUBE_FORMULA", "v1")?;

    let history_default_limit: u32 =
        parse_var(&or_default, "RATEKIT_HISTORY_DEFAULT_LIMIT", "50")?;
    let history_max_limit: u32 = parse_var(&or_default, "RATEKIT_HISTORY_MAX_LIMIT", "200")?;
    if history_max_limit == 0 || history_default_limit > history_max_limit {
        return Err(ConfigError::InvalidEnvVar {
            var: "RATEKIT_HISTORY_DEFAULT_LIMIT".to_string(),
            reason: format!(
                "default limit {history_default_limit} must be within 1..={history_max_limit}"
            ),
        });
    }

    let rate_limit_max_requests =
        parse_var(&or_default, "RATEKIT_RATE_LIMIT_MAX_REQUESTS", "120")?;
    let rate_limit_window_secs = parse_var(&or_default, "RATEKIT_RATE_LIMIT_WINDOW_SECS", "60")?;
    let session_ttl_hours = parse_var(&or_default, "RATEKIT_SESSION_TTL_HOURS", "168")?;

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        token_hash_salt,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        youtube_formula,
        history_default_limit,
        history_max_limit,
        rate_limit_max_requests,
        rate_limit_window_secs,
        session_ttl_hours,
    })
}

fn parse_var<T, D>(or_default: &D, var: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    D: Fn(&str, &str) -> String,
{
    let raw = or_default(var, default);
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for unrecognized values.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "RATEKIT_ENV".to_string(),
            reason: format!("expected development, test, or production; got '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
