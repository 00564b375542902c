//! Shared test utilities for authority and token testing.
//!
//! This module provides a cheap hasher, an audit logger that records
//! events, a pre-wired authority, raw JWT crafting for attack tests, and
//! assertion macros. It is feature-gated behind `testutil` to prevent
//! leaking into production builds.
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! sso-authn = { path = "../authn", features = ["testutil"] }
//! ```
//!
//! ```no_run
//! // Requires the `testutil` feature to be enabled.
//! use sso_authn::testutil::{RecordingAuditLogger, fast_hasher};
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use parking_lot::Mutex;
use sso_storage::CredentialStore;

use crate::{
    audit::{AuditEvent, AuditLogger},
    authority::CredentialAuthority,
    config::HasherConfig,
    password::Argon2Hasher,
};

/// Argon2id hasher with the smallest accepted work factor.
///
/// Produces real PHC hashes in well under a millisecond.
pub fn fast_hasher() -> Argon2Hasher {
    Argon2Hasher::new(&HasherConfig::builder().memory_cost_kib(8).time_cost(1).parallelism(1).build())
        .expect("minimal argon2 parameters are valid")
}

/// Builds an authority over `store` with [`fast_hasher`] and default config.
pub fn test_authority(store: Arc<dyn CredentialStore>) -> CredentialAuthority {
    CredentialAuthority::builder()
        .store(store)
        .hasher(Arc::new(fast_hasher()))
        .build()
        .expect("test authority")
}

/// Audit logger that keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingAuditLogger {
    events: Mutex<Vec<AuditEvent>>,
}

impl RecordingAuditLogger {
    /// Creates an empty logger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the recorded events, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().clone()
    }
}

#[async_trait]
impl AuditLogger for RecordingAuditLogger {
    async fn log(&self, event: &AuditEvent) {
        self.events.lock().push(event.clone());
    }
}

/// Creates a raw JWT string from arbitrary header and payload JSON.
///
/// The resulting JWT has the structure `{header_b64}.{payload_b64}.`
/// with an empty signature. This is useful for testing rejection of
/// malformed or attack JWTs (e.g., `alg: "none"`, algorithm confusion).
///
/// # Panics
///
/// Panics if JSON serialization fails.
pub fn craft_raw_jwt(header_json: &serde_json::Value, payload_json: &serde_json::Value) -> String {
    let header_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(header_json).expect("header json"));
    let payload_b64 =
        URL_SAFE_NO_PAD.encode(serde_json::to_vec(payload_json).expect("payload json"));
    format!("{header_b64}.{payload_b64}.")
}

/// Asserts that a [`Result<T, AuthError>`](crate::AuthError) is an `Err` of
/// the given [`ErrorKind`](crate::ErrorKind).
///
/// # Examples
///
/// ```no_run
/// // Requires the `testutil` feature to be enabled.
/// use sso_authn::{AuthError, assert_auth_error};
///
/// let result: Result<(), AuthError> = Err(AuthError::InvalidCredentials);
/// assert_auth_error!(result, InvalidCredentials);
/// ```
#[macro_export]
macro_rules! assert_auth_error {
    ($result:expr, $kind:ident) => {
        match &$result {
            Err(e) if e.kind() == $crate::error::ErrorKind::$kind => {},
            other => panic!("expected ErrorKind::{}, got: {:?}", stringify!($kind), other),
        }
    };
    ($result:expr, $kind:ident, $msg:expr) => {
        match &$result {
            Err(e) if e.kind() == $crate::error::ErrorKind::$kind => {},
            other => {
                panic!("{}: expected ErrorKind::{}, got: {:?}", $msg, stringify!($kind), other)
            },
        }
    };
}

/// Asserts that a [`Result<T, TokenError>`](crate::TokenError) is an `Err`
/// matching the given variant.
#[macro_export]
macro_rules! assert_token_error {
    ($result:expr, $variant:ident) => {
        assert!(
            matches!($result, Err($crate::error::TokenError::$variant { .. })),
            "expected TokenError::{}, got: {:?}",
            stringify!($variant),
            $result,
        );
    };
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        audit::{AuditAction, AuditResult},
        error::{AuthError, TokenError},
        password::PasswordHasher,
    };

    #[test]
    fn test_fast_hasher_round_trip() {
        let hasher = fast_hasher();
        let hash = hasher.hash("pw").expect("hash");
        assert!(hasher.verify(&hash, "pw").expect("verify"));
    }

    #[tokio::test]
    async fn test_recording_logger_keeps_order() {
        let logger = RecordingAuditLogger::new();
        for action in [AuditAction::Register, AuditAction::Login] {
            let event = AuditEvent::builder()
                .actor("a")
                .action(action)
                .resource("r")
                .result(AuditResult::Success)
                .build();
            logger.log(&event).await;
        }

        let actions: Vec<_> = logger.events().iter().map(|e| e.action).collect();
        assert_eq!(actions, vec![AuditAction::Register, AuditAction::Login]);
    }

    #[test]
    fn test_craft_raw_jwt_format() {
        let jwt = craft_raw_jwt(&json!({"alg": "none", "typ": "JWT"}), &json!({"sub": 1}));
        let parts: Vec<&str> = jwt.split('.').collect();
        assert_eq!(parts.len(), 3);
        assert!(parts[2].is_empty(), "signature should be empty for raw JWTs");
    }

    #[test]
    fn test_assert_auth_error_macros() {
        let result: Result<(), AuthError> = Err(AuthError::InvalidCredentials);
        assert_auth_error!(result, InvalidCredentials);
        assert_auth_error!(result, InvalidCredentials, "wrong password");

        let result: Result<(), TokenError> = Err(TokenError::TokenExpired);
        assert_token_error!(result, TokenExpired);
    }
}
