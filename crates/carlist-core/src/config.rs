use chrono::Datelike;

use crate::app_config::{AppConfig, DelayRange};
use crate::locales::DEFAULT_LOCALES;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value cannot be parsed or fails validation.
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
/// Returns `ConfigError` if a value cannot be parsed or fails validation.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every variable is optional; the defaults reproduce a full-size scrape of
/// the built-in locale list.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>().map_err(|e| invalid(var, e.to_string()))
    };

    let parse_delay = |var: &str, default: &str| -> Result<DelayRange, ConfigError> {
        let raw = or_default(var, default);
        DelayRange::parse(&raw).map_err(|reason| invalid(var, reason))
    };

    let log_level = or_default("CARLIST_LOG_LEVEL", "info");
    let base_url = or_default("CARLIST_BASE_URL", "https://www.che168.com")
        .trim_end_matches('/')
        .to_string();

    let target_count = parse_usize("CARLIST_TARGET_COUNT", "20000")?;
    let max_pages_per_locale = parse_u32("CARLIST_MAX_PAGES_PER_LOCALE", "50")?;
    let locales = match lookup("CARLIST_LOCALES") {
        Ok(raw) => parse_locale_list(&raw),
        Err(_) => DEFAULT_LOCALES.iter().map(|s| (*s).to_string()).collect(),
    };
    if locales.is_empty() {
        return Err(invalid(
            "CARLIST_LOCALES",
            "at least one locale code is required".to_string(),
        ));
    }

    let locale_floor = parse_usize("CARLIST_LOCALE_FLOOR", "200")?;
    let locale_ceiling = parse_usize("CARLIST_LOCALE_CEILING", "1500")?;
    if locale_floor > locale_ceiling {
        return Err(ConfigError::Validation(format!(
            "CARLIST_LOCALE_FLOOR ({locale_floor}) must not exceed CARLIST_LOCALE_CEILING ({locale_ceiling})"
        )));
    }

    let checkpoint_path = PathBuf::from(or_default(
        "CARLIST_CHECKPOINT_PATH",
        "scraper_checkpoint.json",
    ));
    let checkpoint_interval = parse_usize("CARLIST_CHECKPOINT_INTERVAL", "1000")?;
    if checkpoint_interval == 0 {
        return Err(invalid(
            "CARLIST_CHECKPOINT_INTERVAL",
            "must be greater than zero".to_string(),
        ));
    }
    let proxies_path = PathBuf::from(or_default("CARLIST_PROXIES_PATH", "proxies.txt"));
    let output_dir = PathBuf::from(or_default("CARLIST_OUTPUT_DIR", "."));

    let request_timeout_secs = parse_u64("CARLIST_REQUEST_TIMEOUT_SECS", "15")?;
    let max_attempts = parse_u32("CARLIST_MAX_ATTEMPTS", "3")?;
    if max_attempts == 0 {
        return Err(invalid(
            "CARLIST_MAX_ATTEMPTS",
            "must be at least 1".to_string(),
        ));
    }

    let request_delay = parse_delay("CARLIST_REQUEST_DELAY_MS", "500-2000")?;
    let page_delay = parse_delay("CARLIST_PAGE_DELAY_MS", "1000-3000")?;
    let retry_backoff = parse_delay("CARLIST_RETRY_BACKOFF_MS", "2000-5000")?;
    let locale_pause = parse_delay("CARLIST_LOCALE_PAUSE_MS", "2000-5000")?;

    let reference_year = match lookup("CARLIST_REFERENCE_YEAR") {
        Ok(raw) => raw
            .parse::<i32>()
            .map_err(|e| invalid("CARLIST_REFERENCE_YEAR", e.to_string()))?,
        Err(_) => chrono::Local::now().year(),
    };

    Ok(AppConfig {
        log_level,
        base_url,
        target_count,
        max_pages_per_locale,
        locales,
        locale_floor,
        locale_ceiling,
        checkpoint_path,
        checkpoint_interval,
        proxies_path,
        output_dir,
        request_timeout_secs,
        max_attempts,
        request_delay,
        page_delay,
        retry_backoff,
        locale_pause,
        reference_year,
    })
}

/// Splits a comma-separated locale list, dropping blanks and duplicates while
/// keeping first-seen order.
fn parse_locale_list(raw: &str) -> Vec<String> {
    let mut locales: Vec<String> = Vec::new();
    for code in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let code = code.to_lowercase();
        if !locales.contains(&code) {
            locales.push(code);
        }
    }
    locales
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
