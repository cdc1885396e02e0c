use crate::app_config::{AppConfig, Environment, SubStepPolicy};
use crate::ConfigError;

/// Shopify caps REST listing pages at 250 items.
const MAX_PAGE_SIZE: u32 = 250;

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
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

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

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let shop_domain = normalize_shop_domain(&require("SHOPIFY_SHOP_URL")?);
    if shop_domain.is_empty() {
        return Err(invalid("SHOPIFY_SHOP_URL", "shop domain is empty".into()));
    }
    let access_token = require("SHOPIFY_ACCESS_TOKEN")?;
    let api_version = or_default("SHOPIFY_API_VERSION", "2024-10");

    let env = parse_environment(&or_default("VENDORSYNC_ENV", "development"))?;

    let bind_addr = or_default("VENDORSYNC_BIND_ADDR", "0.0.0.0:3000")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("VENDORSYNC_BIND_ADDR", e.to_string()))?;
    let log_level = or_default("VENDORSYNC_LOG_LEVEL", "info");
    let api_keys = parse_api_keys(&or_default("VENDORSYNC_API_KEYS", ""));

    let request_timeout_secs = parse_u64("VENDORSYNC_REQUEST_TIMEOUT_SECS", "30")?;
    let inter_request_delay_ms = parse_u64("VENDORSYNC_INTER_REQUEST_DELAY_MS", "500")?;

    let max_attempts = parse_u32("VENDORSYNC_MAX_ATTEMPTS", "3")?;
    if max_attempts == 0 {
        return Err(invalid("VENDORSYNC_MAX_ATTEMPTS", "must be at least 1".into()));
    }
    let default_retry_after_secs = parse_u64("VENDORSYNC_DEFAULT_RETRY_AFTER_SECS", "2")?;
    let max_retry_after_secs = parse_u64("VENDORSYNC_MAX_RETRY_AFTER_SECS", "60")?;

    let max_batch_size = parse_usize("VENDORSYNC_MAX_BATCH_SIZE", "100")?;
    if max_batch_size == 0 {
        return Err(invalid("VENDORSYNC_MAX_BATCH_SIZE", "must be at least 1".into()));
    }

    let page_size = parse_u32("VENDORSYNC_PAGE_SIZE", "250")?;
    if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
        return Err(invalid(
            "VENDORSYNC_PAGE_SIZE",
            format!("must be between 1 and {MAX_PAGE_SIZE}, got {page_size}"),
        ));
    }

    let sub_step_policy = parse_sub_step_policy(&or_default("VENDORSYNC_SUBSTEP_POLICY", "fail-soft"))?;

    Ok(AppConfig {
        shop_domain,
        access_token,
        api_version,
        env,
        bind_addr,
        log_level,
        api_keys,
        request_timeout_secs,
        inter_request_delay_ms,
        max_attempts,
        default_retry_after_secs,
        max_retry_after_secs,
        max_batch_size,
        page_size,
        sub_step_policy,
    })
}

/// Strips scheme and trailing slashes: `https://shop.myshopify.com/` → `shop.myshopify.com`.
fn normalize_shop_domain(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_scheme = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);
    without_scheme.trim_end_matches('/').to_string()
}

fn parse_api_keys(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect()
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
            var: "VENDORSYNC_ENV".to_string(),
            reason: format!("expected development, test or production, got '{other}'"),
        }),
    }
}

fn parse_sub_step_policy(s: &str) -> Result<SubStepPolicy, ConfigError> {
    match s {
        "fail-soft" => Ok(SubStepPolicy::FailSoft),
        "fail-hard" => Ok(SubStepPolicy::FailHard),
        other => Err(ConfigError::InvalidEnvVar {
            var: "VENDORSYNC_SUBSTEP_POLICY".to_string(),
            reason: format!("expected fail-soft or fail-hard, got '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
