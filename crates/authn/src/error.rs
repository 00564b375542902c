//! Authentication error types.
//!
//! Three taxonomies live here:
//!
//! - [`AuthError`]: failures of the credential authority's operations. The transport layer
//!   inspects only [`AuthError::kind`], never the message of an infrastructure failure.
//! - [`TokenError`]: failures verifying a session token.
//! - [`ConfigError`]: invalid configuration values.

use std::fmt;

use sso_storage::{AppId, StorageError};
use thiserror::Error;

/// Coarse classification of an [`AuthError`].
///
/// This is the only part of an error the transport adapter looks at when
/// choosing a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Unknown email or wrong password. The two are indistinguishable.
    InvalidCredentials,
    /// The requested application does not exist.
    InvalidApplication,
    /// The email is already registered.
    UserAlreadyExists,
    /// The referenced user does not exist.
    EntityNotFound,
    /// The credential store failed.
    StorageUnavailable,
    /// The session token could not be signed.
    SigningFailure,
    /// The password hasher failed.
    HashingFailure,
    /// The caller cancelled the operation.
    Cancelled,
    /// The request was malformed. Produced by the transport adapter only.
    InvalidInput,
}

impl ErrorKind {
    /// Returns `true` if the error message may be shown to the caller verbatim.
    ///
    /// Infrastructure kinds carry internal detail and must be replaced by a
    /// generic message.
    #[must_use]
    pub fn is_client_safe(self) -> bool {
        !matches!(self, Self::StorageUnavailable | Self::SigningFailure | Self::HashingFailure)
    }

    /// Stable snake-case name, used in logs and audit events.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidCredentials => "invalid_credentials",
            Self::InvalidApplication => "invalid_application",
            Self::UserAlreadyExists => "user_already_exists",
            Self::EntityNotFound => "entity_not_found",
            Self::StorageUnavailable => "storage_unavailable",
            Self::SigningFailure => "signing_failure",
            Self::HashingFailure => "hashing_failure",
            Self::Cancelled => "cancelled",
            Self::InvalidInput => "invalid_input",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by the credential authority.
///
/// # Non-exhaustive
///
/// This enum is marked `#[non_exhaustive]`. Downstream match expressions
/// must include a wildcard arm (`_ =>`); prefer matching on [`kind`](Self::kind).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthError {
    /// Unknown email or wrong password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Unknown application id.
    #[error("invalid application")]
    InvalidApplication,

    /// Email already registered.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Unknown user id.
    #[error("user not found")]
    EntityNotFound,

    /// The credential store failed during `operation`.
    ///
    /// Wraps the original [`StorageError`] to preserve the source chain for
    /// logging. The text is never shown to callers.
    #[error("storage unavailable during {operation}")]
    StorageUnavailable {
        /// Authority operation that was running.
        operation: &'static str,
        /// The underlying storage failure.
        #[source]
        source: StorageError,
    },

    /// The session token could not be signed.
    #[error("failed to sign session token: {message}")]
    SigningFailure {
        /// Description of the failure.
        message: String,
        /// The underlying encoder error, if any.
        #[source]
        source: Option<jsonwebtoken::errors::Error>,
    },

    /// The password hasher failed, or a stored hash is malformed.
    #[error("password hashing failed: {message}")]
    HashingFailure {
        /// Description of the failure.
        message: String,
    },

    /// The operation was cancelled before it completed.
    #[error("operation cancelled")]
    Cancelled,

    /// The request was malformed.
    #[error("{0}")]
    InvalidInput(String),
}

impl AuthError {
    /// Returns the classification of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidCredentials => ErrorKind::InvalidCredentials,
            Self::InvalidApplication => ErrorKind::InvalidApplication,
            Self::UserAlreadyExists => ErrorKind::UserAlreadyExists,
            Self::EntityNotFound => ErrorKind::EntityNotFound,
            Self::StorageUnavailable { .. } => ErrorKind::StorageUnavailable,
            Self::SigningFailure { .. } => ErrorKind::SigningFailure,
            Self::HashingFailure { .. } => ErrorKind::HashingFailure,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
        }
    }

    /// Creates a `StorageUnavailable` error for the given operation.
    #[must_use]
    pub fn storage_unavailable(operation: &'static str, source: StorageError) -> Self {
        Self::StorageUnavailable { operation, source }
    }

    /// Creates a `SigningFailure` error without an underlying cause.
    #[must_use]
    pub fn signing_failure(message: impl Into<String>) -> Self {
        Self::SigningFailure { message: message.into(), source: None }
    }

    /// Creates a `HashingFailure` error.
    #[must_use]
    pub fn hashing_failure(message: impl Into<String>) -> Self {
        Self::HashingFailure { message: message.into() }
    }

    /// Creates an `InvalidInput` error.
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::SigningFailure { message: "encoder error".into(), source: Some(err) }
    }
}

/// Errors returned when verifying a session token.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TokenError {
    /// Malformed token - cannot be decoded.
    #[error("Invalid token format: {0}")]
    InvalidTokenFormat(String),

    /// Token has expired.
    #[error("Token expired")]
    TokenExpired,

    /// Signature verification failed.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Algorithm not in allowed list.
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The token was issued for a different application.
    #[error("Token issued for application {actual}, expected {expected}")]
    ApplicationMismatch {
        /// Application the verifier was asked to check against.
        expected: AppId,
        /// Application named in the token.
        actual: AppId,
    },

    /// The application named in the token does not exist.
    #[error("Unknown application: {0}")]
    UnknownApplication(AppId),

    /// Storage backend error during application lookup.
    #[error("Key storage error: {0}")]
    KeyStorage(
        /// The underlying storage error.
        #[source]
        StorageError,
    ),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::InvalidToken => Self::InvalidTokenFormat("Invalid JWT structure".into()),
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::ExpiredSignature => Self::TokenExpired,
            ErrorKind::InvalidAlgorithm => {
                Self::UnsupportedAlgorithm("Algorithm not supported".into())
            },
            _ => Self::InvalidTokenFormat(format!("JWT error: {err}")),
        }
    }
}

/// Errors raised while validating configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    /// A value is below its allowed minimum.
    #[error("{field} must be at least {min}, got {value}")]
    BelowMinimum {
        /// Offending field.
        field: &'static str,
        /// Smallest accepted value.
        min: String,
        /// Supplied value.
        value: String,
    },

    /// A value is rejected for another reason.
    #[error("invalid {field}: {reason}")]
    Invalid {
        /// Offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Result type alias for authority operations.
pub type Result<T> = std::result::Result<T, AuthError>;
