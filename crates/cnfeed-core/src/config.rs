use crate::app_config::{AppConfig, Environment};
use crate::{ConfigError, DEFAULT_BASE_URL};

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (compatible; cnfeed/0.1; +https://www.coches.net/concesionario/)";

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
/// Decoupled from the real environment so tests can drive it from a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let env = parse_environment(&or_default("CNFEED_ENV", "development"))?;

    let bind_addr = or_default("CNFEED_BIND_ADDR", "0.0.0.0:8787")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("CNFEED_BIND_ADDR", e.to_string()))?;
    let log_level = or_default("CNFEED_LOG_LEVEL", "info");

    let base_url = or_default("CNFEED_BASE_URL", DEFAULT_BASE_URL);
    if !(base_url.starts_with("https://") || base_url.starts_with("http://")) {
        return Err(invalid(
            "CNFEED_BASE_URL",
            format!("\"{base_url}\" is not an http(s) origin"),
        ));
    }

    let access_pass = lookup("CNFEED_ACCESS_PASS")
        .ok()
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty());
    if access_pass.is_none() && env != Environment::Development {
        return Err(ConfigError::MissingEnvVar("CNFEED_ACCESS_PASS".to_string()));
    }

    let request_timeout_secs = parse_u64("CNFEED_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("CNFEED_USER_AGENT", DEFAULT_USER_AGENT);
    let max_retries = parse_u32("CNFEED_MAX_RETRIES", "0")?;
    let retry_backoff_base_secs = parse_u64("CNFEED_RETRY_BACKOFF_BASE_SECS", "2")?;

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        base_url,
        access_pass,
        request_timeout_secs,
        user_agent,
        max_retries,
        retry_backoff_base_secs,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "CNFEED_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
