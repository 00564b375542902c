//! Configuration for the credential authority.
//!
//! [`AuthorityConfig`] is immutable once built. It can be constructed with
//! the validating builder or deserialized (durations in human-readable
//! form such as `"1h"` or `"30s"`). Both paths run
//! [`AuthorityConfig::validate`], so an out-of-range config cannot exist.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//!
//! use sso_authn::AuthorityConfig;
//!
//! let config = AuthorityConfig::builder().token_ttl(Duration::from_secs(900)).build()?;
//! assert_eq!(config.token_ttl(), Duration::from_secs(900));
//! assert_eq!(config.token_leeway(), Duration::ZERO);
//! # Ok::<(), sso_authn::ConfigError>(())
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default session token lifetime (1 hour).
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(60 * 60);

/// Shortest accepted session token lifetime.
pub const MIN_TOKEN_TTL: Duration = Duration::from_secs(1);

/// Default Argon2 memory cost in KiB (OWASP: 19 MiB).
pub const DEFAULT_MEMORY_COST_KIB: u32 = 19 * 1024;

/// Default Argon2 iteration count (OWASP).
pub const DEFAULT_TIME_COST: u32 = 2;

/// Default Argon2 lane count (OWASP).
pub const DEFAULT_PARALLELISM: u32 = 1;

/// Argon2id work factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
#[serde(deny_unknown_fields)]
pub struct HasherConfig {
    /// Memory cost in KiB.
    #[serde(default = "default_memory_cost_kib")]
    #[builder(default = DEFAULT_MEMORY_COST_KIB)]
    pub memory_cost_kib: u32,

    /// Number of iterations.
    #[serde(default = "default_time_cost")]
    #[builder(default = DEFAULT_TIME_COST)]
    pub time_cost: u32,

    /// Degree of parallelism.
    #[serde(default = "default_parallelism")]
    #[builder(default = DEFAULT_PARALLELISM)]
    pub parallelism: u32,
}

fn default_memory_cost_kib() -> u32 {
    DEFAULT_MEMORY_COST_KIB
}

fn default_time_cost() -> u32 {
    DEFAULT_TIME_COST
}

fn default_parallelism() -> u32 {
    DEFAULT_PARALLELISM
}

impl Default for HasherConfig {
    fn default() -> Self {
        Self {
            memory_cost_kib: DEFAULT_MEMORY_COST_KIB,
            time_cost: DEFAULT_TIME_COST,
            parallelism: DEFAULT_PARALLELISM,
        }
    }
}

impl HasherConfig {
    /// Checks the Argon2 minimums.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::BelowMinimum`] if `time_cost` or `parallelism`
    /// is zero, or `memory_cost_kib` is less than `8 * parallelism`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.time_cost == 0 {
            return Err(ConfigError::BelowMinimum {
                field: "time_cost",
                min: "1".into(),
                value: "0".into(),
            });
        }
        if self.parallelism == 0 {
            return Err(ConfigError::BelowMinimum {
                field: "parallelism",
                min: "1".into(),
                value: "0".into(),
            });
        }
        let min_memory = self.parallelism.saturating_mul(8);
        if self.memory_cost_kib < min_memory {
            return Err(ConfigError::BelowMinimum {
                field: "memory_cost_kib",
                min: min_memory.to_string(),
                value: self.memory_cost_kib.to_string(),
            });
        }
        Ok(())
    }
}

/// Credential authority configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawAuthorityConfig")]
pub struct AuthorityConfig {
    /// Lifetime of issued session tokens.
    #[serde(with = "humantime_serde")]
    pub(crate) token_ttl: Duration,

    /// Clock skew tolerated when verifying expiry.
    #[serde(with = "humantime_serde")]
    pub(crate) token_leeway: Duration,

    /// Password hashing work factor.
    pub(crate) hasher: HasherConfig,
}

/// Unchecked wire form of [`AuthorityConfig`].
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawAuthorityConfig {
    #[serde(with = "humantime_serde", default = "default_token_ttl")]
    token_ttl: Duration,
    #[serde(with = "humantime_serde", default)]
    token_leeway: Duration,
    #[serde(default)]
    hasher: HasherConfig,
}

impl TryFrom<RawAuthorityConfig> for AuthorityConfig {
    type Error = ConfigError;

    fn try_from(raw: RawAuthorityConfig) -> Result<Self, Self::Error> {
        let config =
            Self { token_ttl: raw.token_ttl, token_leeway: raw.token_leeway, hasher: raw.hasher };
        config.validate()?;
        Ok(config)
    }
}

fn default_token_ttl() -> Duration {
    DEFAULT_TOKEN_TTL
}

impl Default for AuthorityConfig {
    fn default() -> Self {
        Self {
            token_ttl: DEFAULT_TOKEN_TTL,
            token_leeway: Duration::ZERO,
            hasher: HasherConfig::default(),
        }
    }
}

#[bon::bon]
impl AuthorityConfig {
    /// Creates a new configuration, validating all fields.
    ///
    /// # Optional Fields
    ///
    /// * `token_ttl` - Session token lifetime (default: 1 hour, minimum: 1 second).
    /// * `token_leeway` - Expiry tolerance when verifying (default: zero).
    /// * `hasher` - Argon2 work factor (default: OWASP parameters).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if any value is out of range.
    #[builder]
    pub fn new(
        #[builder(default = DEFAULT_TOKEN_TTL)] token_ttl: Duration,
        #[builder(default)] token_leeway: Duration,
        #[builder(default)] hasher: HasherConfig,
    ) -> Result<Self, ConfigError> {
        let config = Self { token_ttl, token_leeway, hasher };
        config.validate()?;
        Ok(config)
    }

    /// Validates a configuration obtained by deserialization.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if any value is out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token_ttl < MIN_TOKEN_TTL {
            return Err(ConfigError::BelowMinimum {
                field: "token_ttl",
                min: format!("{MIN_TOKEN_TTL:?}"),
                value: format!("{:?}", self.token_ttl),
            });
        }
        if self.token_leeway >= self.token_ttl {
            return Err(ConfigError::Invalid {
                field: "token_leeway",
                reason: "must be shorter than token_ttl".into(),
            });
        }
        self.hasher.validate()
    }

    /// Returns the session token lifetime.
    #[must_use]
    pub fn token_ttl(&self) -> Duration {
        self.token_ttl
    }

    /// Returns the expiry tolerance applied when verifying tokens.
    #[must_use]
    pub fn token_leeway(&self) -> Duration {
        self.token_leeway
    }

    /// Returns the password hashing work factor.
    #[must_use]
    pub fn hasher(&self) -> &HasherConfig {
        &self.hasher
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = AuthorityConfig::builder().build().expect("defaults are valid");

        assert_eq!(config.token_ttl(), DEFAULT_TOKEN_TTL);
        assert_eq!(config.token_leeway(), Duration::ZERO);
        assert_eq!(*config.hasher(), HasherConfig::default());
        assert_eq!(config, AuthorityConfig::default());
    }

    #[test]
    fn test_builder_rejects_zero_ttl() {
        let result = AuthorityConfig::builder().token_ttl(Duration::ZERO).build();

        assert!(matches!(result, Err(ConfigError::BelowMinimum { field: "token_ttl", .. })));
    }

    #[test]
    fn test_builder_rejects_leeway_not_shorter_than_ttl() {
        let result = AuthorityConfig::builder()
            .token_ttl(Duration::from_secs(10))
            .token_leeway(Duration::from_secs(10))
            .build();

        assert!(matches!(result, Err(ConfigError::Invalid { field: "token_leeway", .. })));
    }

    #[test]
    fn test_hasher_minimums() {
        let zero_time = HasherConfig::builder().time_cost(0).build();
        assert!(matches!(zero_time.validate(), Err(ConfigError::BelowMinimum { field: "time_cost", .. })));

        let zero_lanes = HasherConfig::builder().parallelism(0).build();
        assert!(matches!(
            zero_lanes.validate(),
            Err(ConfigError::BelowMinimum { field: "parallelism", .. })
        ));

        let tiny_memory = HasherConfig::builder().memory_cost_kib(15).parallelism(2).build();
        assert!(matches!(
            tiny_memory.validate(),
            Err(ConfigError::BelowMinimum { field: "memory_cost_kib", .. })
        ));
    }

    #[test]
    fn test_deserialize_humantime() {
        let yaml = "token_ttl: 15m\ntoken_leeway: 5s\nhasher:\n  memory_cost_kib: 4096\n";
        let config: AuthorityConfig = serde_yaml::from_str(yaml).expect("parse");

        assert_eq!(config.token_ttl(), Duration::from_secs(15 * 60));
        assert_eq!(config.token_leeway(), Duration::from_secs(5));
        assert_eq!(config.hasher().memory_cost_kib, 4096);
        assert_eq!(config.hasher().time_cost, DEFAULT_TIME_COST);
        config.validate().expect("valid");
    }

    #[test]
    fn test_deserialize_rejects_unknown_fields() {
        let result: Result<AuthorityConfig, _> = serde_yaml::from_str("token_tll: 1h\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialize_rejects_zero_ttl() {
        let result: Result<AuthorityConfig, _> = serde_yaml::from_str("token_ttl: 0s\n");

        let err = result.expect_err("zero ttl must not deserialize");
        assert!(err.to_string().contains("token_ttl"), "{err}");
    }

    #[test]
    fn test_deserialize_rejects_leeway_not_shorter_than_ttl() {
        let result: Result<AuthorityConfig, _> =
            serde_yaml::from_str("token_ttl: 30s\ntoken_leeway: 30s\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialize_rejects_invalid_hasher() {
        let result: Result<AuthorityConfig, _> = serde_yaml::from_str("hasher:\n  time_cost: 0\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_serialize_round_trips_through_validation() {
        let config = AuthorityConfig::builder()
            .token_ttl(Duration::from_secs(120))
            .token_leeway(Duration::from_secs(5))
            .build()
            .expect("valid");

        let yaml = serde_yaml::to_string(&config).expect("serialize");
        let back: AuthorityConfig = serde_yaml::from_str(&yaml).expect("deserialize");

        assert_eq!(back, config);
    }
}
