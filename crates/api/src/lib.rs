//! # SSO API
//!
//! Transport-facing layer of the SSO service.
//!
//! - [`AuthApi`]: request shape validation, per-call deadline and
//!   cancellation, and domain error to [`tonic::Status`] mapping
//! - [`ServiceConfig`]: YAML configuration with `SSO_CONFIG_PATH` lookup
//! - [`telemetry::init_tracing`]: logging setup per deployment environment
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use sso_api::{AuthApi, ServiceConfig, messages::RegisterRequest, telemetry};
//! use sso_authn::{Argon2Hasher, CredentialAuthority, TracingAuditLogger};
//! use sso_storage::MemoryCredentialStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let config = ServiceConfig::from_env()?;
//! telemetry::init_tracing(config.env)?;
//!
//! let authority = CredentialAuthority::builder()
//!     .store(Arc::new(MemoryCredentialStore::new()))
//!     .hasher(Arc::new(Argon2Hasher::new(config.authority.hasher())?))
//!     .audit_logger(Arc::new(TracingAuditLogger))
//!     .config(config.authority.clone())
//!     .build()?;
//!
//! let api = AuthApi::builder()
//!     .authority(Arc::new(authority))
//!     .request_timeout(config.request_timeout)
//!     .build();
//!
//! let _response = api
//!     .register(RegisterRequest { email: "a@example.com".into(), password: "pw".into() })
//!     .await?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Transport adapter.
pub mod api;
/// Service configuration.
pub mod config;
/// Request and response messages.
pub mod messages;
/// Logging setup.
pub mod telemetry;

pub use api::{AuthApi, INTERNAL_ERROR_MESSAGE, status_from_error};
pub use config::{Env, ServiceConfig, ServiceConfigError};
