use std::path::PathBuf;

use crate::app_config::AppConfig;
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
/// Unlike [`load_app_config`], this does NOT load `.env` files. Useful for testing
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the parsing/validation logic, decoupled from the actual environment
/// so it can be tested with a pure `HashMap` lookup.
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

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let url_prefix = require("NEWSREEL_URL_PREFIX")?;
    let basename = require("NEWSREEL_BASENAME")?;

    let archive_dir = PathBuf::from(or_default("NEWSREEL_ARCHIVE_DIR", "./archive"));
    let suffix = or_default("NEWSREEL_SUFFIX", "mp3");

    let date_format = or_default("NEWSREEL_DATE_FORMAT", "%y%m%d%H%M");
    validate_date_format("NEWSREEL_DATE_FORMAT", &date_format)?;

    let hour_pattern = or_default("NEWSREEL_HOUR_PATTERN", "*");
    let minute_pattern = or_default("NEWSREEL_MINUTE_PATTERN", "0");

    let grace_minutes = parse_u32("NEWSREEL_GRACE_MINUTES", "10")?;
    let poll_secs = parse_u64("NEWSREEL_POLL_SECS", "10")?;
    if poll_secs == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "NEWSREEL_POLL_SECS".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    let http_timeout_secs = parse_u64("NEWSREEL_HTTP_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("NEWSREEL_USER_AGENT", "newsreel/0.1 (edition-ingest)");
    let log_level = or_default("NEWSREEL_LOG_LEVEL", "info");

    Ok(AppConfig {
        archive_dir,
        basename,
        url_prefix,
        date_format,
        suffix,
        hour_pattern,
        minute_pattern,
        grace_minutes,
        poll_secs,
        http_timeout_secs,
        user_agent,
        log_level,
    })
}

/// Reject strftime patterns chrono cannot format.
///
/// A bad specifier would otherwise only surface when the first remote name is
/// built, as a formatting panic.
fn validate_date_format(var: &str, pattern: &str) -> Result<(), ConfigError> {
    use chrono::format::{Item, StrftimeItems};

    if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
        return Err(ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: format!("unrecognized strftime specifier in \"{pattern}\""),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
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

    /// Returns a map with all required env vars populated with valid values.
    fn full_env<'a>() -> HashMap<&'a str, &'a str> {
        let mut m = HashMap::new();
        m.insert("NEWSREEL_URL_PREFIX", "https://feeds.example.org/news/");
        m.insert("NEWSREEL_BASENAME", "bulletin");
        m
    }

    #[test]
    fn fails_without_url_prefix() {
        let map: HashMap<&str, &str> = HashMap::new();
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "NEWSREEL_URL_PREFIX"),
            "expected MissingEnvVar(NEWSREEL_URL_PREFIX), got: {result:?}"
        );
    }

    #[test]
    fn fails_without_basename() {
        let mut map: HashMap<&str, &str> = HashMap::new();
        map.insert("NEWSREEL_URL_PREFIX", "https://feeds.example.org/news/");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "NEWSREEL_BASENAME"),
            "expected MissingEnvVar(NEWSREEL_BASENAME), got: {result:?}"
        );
    }

    #[test]
    fn succeeds_with_all_required_vars() {
        let map = full_env();
        let result = build_app_config(lookup_from_map(&map));
        assert!(result.is_ok(), "expected Ok, got: {result:?}");
        let cfg = result.unwrap();
        assert_eq!(cfg.url_prefix, "https://feeds.example.org/news/");
        assert_eq!(cfg.basename, "bulletin");
        assert_eq!(cfg.archive_dir.to_string_lossy(), "./archive");
        assert_eq!(cfg.date_format, "%y%m%d%H%M");
        assert_eq!(cfg.suffix, "mp3");
        assert_eq!(cfg.hour_pattern, "*");
        assert_eq!(cfg.minute_pattern, "0");
        assert_eq!(cfg.grace_minutes, 10);
        assert_eq!(cfg.poll_secs, 10);
        assert_eq!(cfg.http_timeout_secs, 30);
        assert_eq!(cfg.user_agent, "newsreel/0.1 (edition-ingest)");
        assert_eq!(cfg.log_level, "info");
    }

    #[test]
    fn grace_minutes_override() {
        let mut map = full_env();
        map.insert("NEWSREEL_GRACE_MINUTES", "3");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.grace_minutes, 3);
    }

    #[test]
    fn grace_minutes_invalid() {
        let mut map = full_env();
        map.insert("NEWSREEL_GRACE_MINUTES", "ten");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "NEWSREEL_GRACE_MINUTES"),
            "expected InvalidEnvVar(NEWSREEL_GRACE_MINUTES), got: {result:?}"
        );
    }

    #[test]
    fn poll_secs_zero_rejected() {
        let mut map = full_env();
        map.insert("NEWSREEL_POLL_SECS", "0");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "NEWSREEL_POLL_SECS"),
            "expected InvalidEnvVar(NEWSREEL_POLL_SECS), got: {result:?}"
        );
    }

    #[test]
    fn date_format_override() {
        let mut map = full_env();
        map.insert("NEWSREEL_DATE_FORMAT", "%Y-%m-%dT%H%M");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.date_format, "%Y-%m-%dT%H%M");
    }

    #[test]
    fn date_format_invalid_specifier() {
        let mut map = full_env();
        map.insert("NEWSREEL_DATE_FORMAT", "%Q%y");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "NEWSREEL_DATE_FORMAT"),
            "expected InvalidEnvVar(NEWSREEL_DATE_FORMAT), got: {result:?}"
        );
    }

    #[test]
    fn pattern_overrides() {
        let mut map = full_env();
        map.insert("NEWSREEL_HOUR_PATTERN", "6,12,18");
        map.insert("NEWSREEL_MINUTE_PATTERN", "0,30");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.hour_pattern, "6,12,18");
        assert_eq!(cfg.minute_pattern, "0,30");
    }

    #[test]
    fn narrow_views_carry_matching_fields() {
        let mut map = full_env();
        map.insert("NEWSREEL_ARCHIVE_DIR", "/var/lib/newsreel");
        map.insert("NEWSREEL_SUFFIX", "ogg");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();

        let endpoint = cfg.endpoint();
        assert_eq!(endpoint.url_prefix, "https://feeds.example.org/news/");
        assert_eq!(endpoint.basename, "bulletin");
        assert_eq!(endpoint.suffix, "ogg");

        let archive = cfg.archive();
        assert_eq!(archive.dir.to_string_lossy(), "/var/lib/newsreel");
        assert_eq!(archive.basename, "bulletin");
        assert_eq!(archive.suffix, "ogg");

        let poll = cfg.poll();
        assert_eq!(poll.grace(), chrono::Duration::minutes(10));
        assert_eq!(poll.interval(), std::time::Duration::from_secs(10));
    }
}
