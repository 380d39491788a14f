//! Gateway configuration.
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! `RELAYGATE_`-prefixed environment variables (nested keys separated by
//! `__`, e.g. `RELAYGATE_QUOTA__DAILY_LIMIT`), and finally the plain
//! deployment variables `GEMINI_COOKIE`, `REGION`, `HOST` and `PORT`.

use std::env;
use std::path::Path;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::backend::DEFAULT_SESSION_TTL;
use crate::quota::QuotaConfig;
use crate::request::LocaleConfig;
use crate::timeout::{secs, TimeoutConfig};

/// File looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "relaygate.toml";

/// Prefix for structured environment overrides.
pub const ENV_PREFIX: &str = "RELAYGATE";

/// Plain environment variables and the keys they set.
const PLAIN_ENV_VARS: [(&str, &str); 4] = [
    ("GEMINI_COOKIE", "gemini_cookie"),
    ("REGION", "region"),
    ("HOST", "host"),
    ("PORT", "port"),
];

const REDACTED: &str = "<redacted>";

/// Complete gateway configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Address to bind
    pub host: String,
    /// Port to bind
    pub port: u16,
    /// Deployment region label reported by the status route
    pub region: String,
    /// Static cookie sent to Gemini (bootstrap and query)
    pub gemini_cookie: Option<String>,
    /// Lifetime of bootstrapped session credentials, in seconds
    #[serde(with = "secs")]
    pub session_ttl: Duration,
    pub quota: QuotaConfig,
    pub timeouts: TimeoutConfig,
    pub locale: LocaleConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 10000,
            region: "Unknown".to_string(),
            gemini_cookie: None,
            session_ttl: DEFAULT_SESSION_TTL,
            quota: QuotaConfig::default(),
            timeouts: TimeoutConfig::default(),
            locale: LocaleConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// Load configuration from `path` (required) or the default file (optional),
    /// then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let mut builder = Config::builder().add_source(file).add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        for (var, key) in PLAIN_ENV_VARS {
            if let Ok(value) = env::var(var) {
                if !value.trim().is_empty() {
                    builder = builder.set_override(key, value)?;
                }
            }
        }

        builder.build()?.try_deserialize()
    }

    /// `host:port` to bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Copy safe to print or log.
    pub fn redacted(&self) -> Self {
        Self {
            gemini_cookie: self.gemini_cookie.as_ref().map(|_| REDACTED.to_string()),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Backend;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::default();
        assert_eq!(config.port, 10000);
        assert_eq!(config.region, "Unknown");
        assert_eq!(config.session_ttl, Duration::from_secs(900));
        assert_eq!(config.quota.daily_limit, 100);
        assert_eq!(config.bind_addr(), "0.0.0.0:10000");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
session_ttl = 600

[quota]
daily_limit = 25

[quota.overrides]
perplexity = 5

[timeouts]
query_timeout = 45

[locale]
language = "en"
timezone = "UTC"
locale_tag = "en-US"
"#
        )
        .unwrap();

        let config = GatewayConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.session_ttl, Duration::from_secs(600));
        assert_eq!(config.quota.limit_for(Backend::Gemini), 25);
        assert_eq!(config.quota.limit_for(Backend::Perplexity), 5);
        assert_eq!(config.timeouts.query_timeout, Duration::from_secs(45));
        assert_eq!(config.timeouts.bootstrap_timeout, Duration::from_secs(15));
        assert_eq!(config.locale.locale_tag, "en-US");
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let result = GatewayConfig::load(Some(Path::new("/nonexistent/relaygate.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_redacted_hides_cookie() {
        let config = GatewayConfig {
            gemini_cookie: Some("__Secure-1PSID=secret".to_string()),
            ..GatewayConfig::default()
        };
        let redacted = config.redacted();
        assert_eq!(redacted.gemini_cookie.as_deref(), Some("<redacted>"));
        assert_eq!(GatewayConfig::default().redacted().gemini_cookie, None);
    }
}
