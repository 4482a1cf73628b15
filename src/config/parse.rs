//! Environment variable parsing utilities.

use std::str::FromStr;

use super::ConfigError;

/// Get environment variable with default value.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get optional environment variable (None if empty or missing).
pub fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.is_empty())
}

/// Parse an on/off switch.
/// Accepts 1/0, true/false, yes/no, on/off (case-insensitive).
pub fn env_switch(key: &str, default: bool) -> Result<bool, ConfigError> {
    match env_opt(key) {
        None => Ok(default),
        Some(v) => parse_switch(&v).ok_or_else(|| ConfigError::Invalid {
            key: key.into(),
            message: format!("expected on/off, got '{}'", v),
        }),
    }
}

fn parse_switch(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse environment variable with type conversion.
pub fn env_parse<T: FromStr>(key: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(v) if !v.is_empty() => v.parse().map_err(|e: T::Err| ConfigError::Parse {
            key: key.into(),
            value: v,
            error: e.to_string(),
        }),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_switch() {
        assert_eq!(parse_switch("1"), Some(true));
        assert_eq!(parse_switch("TRUE"), Some(true));
        assert_eq!(parse_switch(" on "), Some(true));
        assert_eq!(parse_switch("off"), Some(false));
        assert_eq!(parse_switch("No"), Some(false));
        assert_eq!(parse_switch("maybe"), None);
    }

    #[test]
    fn test_env_switch_invalid() {
        std::env::set_var("PHPTORO_TEST_SWITCH", "sometimes");
        let err = env_switch("PHPTORO_TEST_SWITCH", true).unwrap_err();
        assert!(err.to_string().contains("PHPTORO_TEST_SWITCH"));
        std::env::remove_var("PHPTORO_TEST_SWITCH");

        assert!(env_switch("PHPTORO_TEST_SWITCH", true).unwrap());
    }

    #[test]
    fn test_env_parse() {
        std::env::set_var("PHPTORO_TEST_NUM", "42");
        assert_eq!(env_parse("PHPTORO_TEST_NUM", 0u32).unwrap(), 42);

        std::env::set_var("PHPTORO_TEST_NUM", "forty-two");
        assert!(matches!(
            env_parse("PHPTORO_TEST_NUM", 0u32),
            Err(ConfigError::Parse { .. })
        ));

        std::env::remove_var("PHPTORO_TEST_NUM");
        assert_eq!(env_parse("PHPTORO_TEST_NUM", 7u32).unwrap(), 7);
    }
}
