//! Service configuration loaded from YAML.
//!
//! ```yaml
//! env: prod
//! request_timeout: 5s
//! authority:
//!   token_ttl: 1h
//!   token_leeway: 30s
//!   hasher:
//!     memory_cost_kib: 19456
//!     time_cost: 2
//!     parallelism: 1
//! ```
//!
//! Every key except `env` is optional.

use std::{
    fmt,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use sso_authn::{AuthorityConfig, ConfigError};
use thiserror::Error;

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_ENV: &str = "SSO_CONFIG_PATH";

/// Default upper bound on a single call.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Deployment environment. Selects the logging format and level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Env {
    /// Developer machine: human-readable logs at DEBUG.
    Local,
    /// Shared development: JSON logs at DEBUG.
    Dev,
    /// Production: JSON logs at INFO.
    Prod,
}

impl fmt::Display for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Dev => write!(f, "dev"),
            Self::Prod => write!(f, "prod"),
        }
    }
}

/// Errors raised while loading the service configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ServiceConfigError {
    /// No configuration path was provided.
    #[error("SSO_CONFIG_PATH is not set")]
    MissingPath,

    /// The file could not be read.
    #[error("failed to read config file {}", path.display())]
    Read {
        /// File that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid YAML for [`ServiceConfig`].
    #[error("failed to parse config file {}", path.display())]
    Parse {
        /// File that was parsed.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_yaml::Error,
    },

    /// A value is out of range.
    #[error("invalid configuration")]
    Invalid(#[from] ConfigError),
}

/// Top-level service configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Deployment environment.
    pub env: Env,

    /// Upper bound on a single call; the call is cancelled when it elapses.
    #[serde(with = "humantime_serde", default = "default_request_timeout")]
    pub request_timeout: Duration,

    /// Credential authority settings.
    #[serde(default)]
    pub authority: AuthorityConfig,
}

fn default_request_timeout() -> Duration {
    DEFAULT_REQUEST_TIMEOUT
}

impl ServiceConfig {
    /// Parses and validates a configuration from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceConfigError::Parse`] on malformed YAML or an
    /// out-of-range authority section, and [`ServiceConfigError::Invalid`]
    /// on a zero request timeout.
    pub fn from_yaml(yaml: &str) -> Result<Self, ServiceConfigError> {
        Self::parse(yaml, Path::new("<inline>"))
    }

    /// Loads and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceConfigError`] if the file cannot be read, parsed or
    /// validated.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ServiceConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|source| ServiceConfigError::Read { path: path.to_owned(), source })?;
        Self::parse(&text, path)
    }

    /// Loads the file named by `SSO_CONFIG_PATH`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceConfigError::MissingPath`] if the variable is unset
    /// or empty, and any error from [`from_path`](Self::from_path).
    pub fn from_env() -> Result<Self, ServiceConfigError> {
        match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) if !path.is_empty() => Self::from_path(PathBuf::from(path)),
            _ => Err(ServiceConfigError::MissingPath),
        }
    }

    /// Validates values that deserialization alone cannot check.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the request timeout is zero or the
    /// authority settings are out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                field: "request_timeout",
                reason: "must be greater than zero".into(),
            });
        }
        self.authority.validate()
    }

    fn parse(text: &str, path: &Path) -> Result<Self, ServiceConfigError> {
        let config: Self = serde_yaml::from_str(text)
            .map_err(|source| ServiceConfigError::Parse { path: path.to_owned(), source })?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = ServiceConfig::from_yaml("env: local").expect("valid");

        assert_eq!(config.env, Env::Local);
        assert_eq!(config.request_timeout, DEFAULT_REQUEST_TIMEOUT);
        assert_eq!(config.authority, AuthorityConfig::default());
    }

    #[test]
    fn test_full_config() {
        let yaml = r"
env: prod
request_timeout: 250ms
authority:
  token_ttl: 15m
  token_leeway: 10s
  hasher:
    memory_cost_kib: 65536
    time_cost: 3
    parallelism: 2
";
        let config = ServiceConfig::from_yaml(yaml).expect("valid");

        assert_eq!(config.env, Env::Prod);
        assert_eq!(config.request_timeout, Duration::from_millis(250));
        assert_eq!(config.authority.token_ttl(), Duration::from_secs(900));
        assert_eq!(config.authority.token_leeway(), Duration::from_secs(10));
        assert_eq!(config.authority.hasher().memory_cost_kib, 65536);
    }

    #[test]
    fn test_unknown_env_rejected() {
        let err = ServiceConfig::from_yaml("env: staging").expect_err("unknown env");
        assert!(matches!(err, ServiceConfigError::Parse { .. }));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = ServiceConfig::from_yaml("env: dev\nport: 44044").expect_err("unknown field");
        assert!(matches!(err, ServiceConfigError::Parse { .. }));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let err = ServiceConfig::from_yaml("env: dev\nrequest_timeout: 0s").expect_err("zero");
        assert!(matches!(
            err,
            ServiceConfigError::Invalid(ConfigError::Invalid { field: "request_timeout", .. })
        ));
    }

    #[test]
    fn test_invalid_authority_rejected() {
        let yaml = "env: dev\nauthority:\n  token_ttl: 1m\n  token_leeway: 2m";
        let err = ServiceConfig::from_yaml(yaml).expect_err("leeway longer than ttl");
        assert!(matches!(err, ServiceConfigError::Parse { .. }));
    }

    #[test]
    fn test_from_path_missing_file() {
        let err = ServiceConfig::from_path("/nonexistent/sso.yaml").expect_err("missing");
        assert!(matches!(err, ServiceConfigError::Read { .. }));
        assert!(err.to_string().contains("/nonexistent/sso.yaml"));
    }

    #[test]
    fn test_from_path_reads_file() {
        let path = std::env::temp_dir().join(format!("sso-config-{}.yaml", std::process::id()));
        std::fs::write(&path, "env: dev\nrequest_timeout: 2s\n").expect("write");

        let config = ServiceConfig::from_path(&path).expect("valid");
        std::fs::remove_file(&path).ok();

        assert_eq!(config.env, Env::Dev);
        assert_eq!(config.request_timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_env_display() {
        assert_eq!(Env::Local.to_string(), "local");
        assert_eq!(Env::Dev.to_string(), "dev");
        assert_eq!(Env::Prod.to_string(), "prod");
    }
}
