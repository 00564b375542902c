//! # SSO Credential Authority
//!
//! Registration, password authentication and session token issuance for
//! the SSO service.
//!
//! This crate provides:
//! - **Credential authority**: [`CredentialAuthority`] with `register`, `login` and `is_admin`
//! - **Password hashing**: [`PasswordHasher`] trait and Argon2id implementation
//! - **Session tokens**: HS256 issuance and verification scoped to an application
//! - **Audit logging**: one structured event per operation
//!
//! ## Security
//!
//! - Only `HS256` is accepted; `none` is always rejected
//! - Unknown email and wrong password are indistinguishable
//! - Infrastructure errors never reach callers verbatim; see [`ErrorKind::is_client_safe`]
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use sso_authn::{Argon2Hasher, CredentialAuthority, HasherConfig};
//! use sso_storage::{AppId, Application, MemoryCredentialStore};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = MemoryCredentialStore::new();
//! store.insert_application(Application::new(AppId::from(1), "web", b"secret".to_vec()));
//!
//! let authority = CredentialAuthority::builder()
//!     .store(Arc::new(store.clone()))
//!     .hasher(Arc::new(Argon2Hasher::new(&HasherConfig::default())?))
//!     .build()?;
//!
//! let cancel = CancellationToken::new();
//! authority.register("alice@example.com", "hunter2", &cancel).await?;
//! let token = authority.login("alice@example.com", "hunter2", AppId::from(1), &cancel).await?;
//!
//! let claims = authority.issuer().verify_with_store(&token, &store).await?;
//! assert_eq!(claims.app_id, AppId::from(1));
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Audit events and loggers.
pub mod audit;
/// The credential authority.
pub mod authority;
/// Authority configuration.
pub mod config;
/// Error types.
pub mod error;
/// Password hashing.
pub mod password;
/// Shared test helpers.
#[cfg(any(test, feature = "testutil"))]
#[allow(clippy::expect_used, clippy::panic)]
pub mod testutil;
/// Session token issuance and verification.
pub mod token;
/// Algorithm and key validation.
pub mod validation;

// Re-export key types for convenience
pub use audit::{AuditLogger, NoopAuditLogger, TracingAuditLogger};
pub use authority::CredentialAuthority;
pub use config::{AuthorityConfig, HasherConfig};
pub use error::{AuthError, ConfigError, ErrorKind, Result, TokenError};
pub use password::{Argon2Hasher, PasswordHasher};
pub use token::{SessionClaims, TokenIssuer, decode_claims_unverified};
pub use validation::{ACCEPTED_ALGORITHMS, FORBIDDEN_ALGORITHMS, validate_algorithm};
