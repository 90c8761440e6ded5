use std::env;
use std::time::Duration;

use thiserror::Error;

use crate::payment_widget::ReadinessPolicy;

/// Default location of the payment widget script.
pub const DEFAULT_WIDGET_URL: &str = "https://js.paystack.co/v1/inline.js";

/// Default location of the human-verification widget script.
pub const DEFAULT_VERIFICATION_URL: &str =
    "https://challenges.cloudflare.com/turnstile/v0/api.js";

/// Errors raised while reading the server configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} environment variable not set")]
    Missing(&'static str),
    #[error("{name} has an invalid value `{value}`")]
    Invalid { name: &'static str, value: String },
}

/// Runtime settings shared with every request handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub database_url: String,
    pub address: String,
    pub port: u16,
    /// Cookie domain for the session and flash messages.
    pub domain: String,
    /// Public key handed to the payment widget.
    pub payment_public_key: String,
    pub payment_widget_url: String,
    pub widget_readiness: ReadinessPolicy,
    /// Site key rendered into the human-verification widget.
    pub verification_site_key: String,
    pub verification_widget_url: String,
}

impl ServerConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, which returns `None` for unset keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let payment_public_key = lookup("PAYMENT_PUBLIC_KEY")
            .filter(|value| !value.trim().is_empty())
            .ok_or(ConfigError::Missing("PAYMENT_PUBLIC_KEY"))?;

        let verification_site_key = lookup("VERIFICATION_SITE_KEY")
            .filter(|value| !value.trim().is_empty())
            .ok_or(ConfigError::Missing("VERIFICATION_SITE_KEY"))?;

        let port = parse_or("PORT", lookup("PORT"), 8080u16)?;
        let attempts = parse_or(
            "PAYMENT_WIDGET_ATTEMPTS",
            lookup("PAYMENT_WIDGET_ATTEMPTS"),
            10u32,
        )?;
        let interval_ms = parse_or(
            "PAYMENT_WIDGET_INTERVAL_MS",
            lookup("PAYMENT_WIDGET_INTERVAL_MS"),
            200u64,
        )?;

        Ok(Self {
            database_url: lookup("DATABASE_URL").unwrap_or("app.db".to_string()),
            address: lookup("ADDRESS").unwrap_or("127.0.0.1".to_string()),
            port,
            domain: lookup("DOMAIN").unwrap_or("localhost".to_string()),
            payment_public_key,
            payment_widget_url: lookup("PAYMENT_WIDGET_URL")
                .unwrap_or(DEFAULT_WIDGET_URL.to_string()),
            widget_readiness: ReadinessPolicy {
                attempts: attempts.max(1),
                interval: Duration::from_millis(interval_ms),
            },
            verification_site_key,
            verification_widget_url: lookup("VERIFICATION_WIDGET_URL")
                .unwrap_or(DEFAULT_VERIFICATION_URL.to_string()),
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    name: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let mut map: HashMap<String, String> = HashMap::from([
            ("PAYMENT_PUBLIC_KEY".to_string(), "pk_test".to_string()),
            ("VERIFICATION_SITE_KEY".to_string(), "site_test".to_string()),
        ]);
        map.extend(
            pairs
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string())),
        );
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_apply_when_only_keys_are_set() {
        let config = ServerConfig::from_lookup(lookup_from(&[])).expect("config");

        assert_eq!(config.port, 8080);
        assert_eq!(config.database_url, "app.db");
        assert_eq!(config.payment_widget_url, DEFAULT_WIDGET_URL);
        assert_eq!(config.widget_readiness, ReadinessPolicy::default());
        assert_eq!(config.verification_site_key, "site_test");
        assert_eq!(config.verification_widget_url, DEFAULT_VERIFICATION_URL);
    }

    #[test]
    fn missing_verification_site_key_is_an_error() {
        let result = ServerConfig::from_lookup(lookup_from(&[("VERIFICATION_SITE_KEY", "")]));

        assert_eq!(result, Err(ConfigError::Missing("VERIFICATION_SITE_KEY")));
    }

    #[test]
    fn missing_public_key_is_an_error() {
        let result = ServerConfig::from_lookup(lookup_from(&[("PAYMENT_PUBLIC_KEY", " ")]));

        assert_eq!(result, Err(ConfigError::Missing("PAYMENT_PUBLIC_KEY")));
    }

    #[test]
    fn invalid_numbers_are_reported() {
        let result = ServerConfig::from_lookup(lookup_from(&[("PORT", "eighty")]));

        assert!(matches!(
            result,
            Err(ConfigError::Invalid { name: "PORT", .. })
        ));
    }

    #[test]
    fn readiness_policy_is_configurable() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("PAYMENT_WIDGET_ATTEMPTS", "0"),
            ("PAYMENT_WIDGET_INTERVAL_MS", "50"),
        ]))
        .expect("config");

        assert_eq!(config.widget_readiness.attempts, 1);
        assert_eq!(
            config.widget_readiness.interval,
            Duration::from_millis(50)
        );
    }
}
