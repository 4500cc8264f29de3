use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

fn empty_env<'a>() -> HashMap<&'a str, &'a str> {
    HashMap::new()
}

#[test]
fn build_app_config_uses_defaults_when_env_is_empty() {
    let map = empty_env();
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.target_count, 20_000);
    assert_eq!(cfg.max_pages_per_locale, 50);
    assert_eq!(cfg.locale_floor, 200);
    assert_eq!(cfg.locale_ceiling, 1500);
    assert_eq!(cfg.checkpoint_interval, 1000);
    assert_eq!(cfg.request_timeout_secs, 15);
    assert_eq!(cfg.max_attempts, 3);
    assert_eq!(cfg.base_url, "https://www.che168.com");
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.locales.len(), DEFAULT_LOCALES.len());
    assert_eq!(cfg.locales[0], "bj");
}

#[test]
fn default_delays_match_throttling_profile() {
    let map = empty_env();
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.request_delay, DelayRange::new(500, 2000));
    assert_eq!(cfg.page_delay, DelayRange::new(1000, 3000));
    assert_eq!(cfg.retry_backoff, DelayRange::new(2000, 5000));
    assert_eq!(cfg.locale_pause, DelayRange::new(2000, 5000));
}

#[test]
fn target_count_override() {
    let mut map = empty_env();
    map.insert("CARLIST_TARGET_COUNT", "500");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.target_count, 500);
}

#[test]
fn target_count_invalid() {
    let mut map = empty_env();
    map.insert("CARLIST_TARGET_COUNT", "lots");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "CARLIST_TARGET_COUNT"),
        "expected InvalidEnvVar(CARLIST_TARGET_COUNT), got: {result:?}"
    );
}

#[test]
fn locales_override_is_trimmed_lowercased_and_deduplicated() {
    let mut map = empty_env();
    map.insert("CARLIST_LOCALES", " SH, bj ,,sh ");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.locales, vec!["sh".to_string(), "bj".to_string()]);
}

#[test]
fn locales_override_rejects_empty_list() {
    let mut map = empty_env();
    map.insert("CARLIST_LOCALES", " , ");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "CARLIST_LOCALES"),
        "expected InvalidEnvVar(CARLIST_LOCALES), got: {result:?}"
    );
}

#[test]
fn base_url_trailing_slash_is_stripped() {
    let mut map = empty_env();
    map.insert("CARLIST_BASE_URL", "http://127.0.0.1:8080/");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.base_url, "http://127.0.0.1:8080");
}

#[test]
fn delay_range_override() {
    let mut map = empty_env();
    map.insert("CARLIST_REQUEST_DELAY_MS", "0-0");
    map.insert("CARLIST_PAGE_DELAY_MS", "250");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.request_delay, DelayRange::zero());
    assert_eq!(cfg.page_delay, DelayRange::new(250, 250));
}

#[test]
fn delay_range_inverted_bounds_rejected() {
    let mut map = empty_env();
    map.insert("CARLIST_PAGE_DELAY_MS", "3000-1000");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "CARLIST_PAGE_DELAY_MS"),
        "expected InvalidEnvVar(CARLIST_PAGE_DELAY_MS), got: {result:?}"
    );
}

#[test]
fn floor_above_ceiling_rejected() {
    let mut map = empty_env();
    map.insert("CARLIST_LOCALE_FLOOR", "2000");
    map.insert("CARLIST_LOCALE_CEILING", "1500");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::Validation(ref msg)) if msg.contains("CARLIST_LOCALE_CEILING")),
        "expected Validation error naming the ceiling, got: {result:?}"
    );
}

#[test]
fn zero_checkpoint_interval_rejected() {
    let mut map = empty_env();
    map.insert("CARLIST_CHECKPOINT_INTERVAL", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(matches!(
        result,
        Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "CARLIST_CHECKPOINT_INTERVAL"
    ));
}

#[test]
fn zero_max_attempts_rejected() {
    let mut map = empty_env();
    map.insert("CARLIST_MAX_ATTEMPTS", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(matches!(
        result,
        Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "CARLIST_MAX_ATTEMPTS"
    ));
}

#[test]
fn reference_year_override() {
    let mut map = empty_env();
    map.insert("CARLIST_REFERENCE_YEAR", "2024");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.reference_year, 2024);
}

#[test]
fn reference_year_defaults_to_a_plausible_current_year() {
    let map = empty_env();
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(cfg.reference_year >= 2024, "got {}", cfg.reference_year);
}

#[test]
fn delay_range_parse_reports_bad_bound() {
    let err = DelayRange::parse("abc-100").unwrap_err();
    assert!(err.contains("lower bound"), "got: {err}");
}

#[test]
fn zero_delay_range_samples_zero() {
    assert_eq!(DelayRange::zero().sample(), std::time::Duration::ZERO);
    assert!(DelayRange::zero().is_zero());
}

#[test]
fn delay_range_sample_stays_within_bounds() {
    let range = DelayRange::new(5, 10);
    for _ in 0..50 {
        let ms = range.sample().as_millis();
        assert!((5..=10).contains(&ms), "sampled {ms}ms");
    }
}
