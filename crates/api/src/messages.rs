//! Request and response messages of the auth service.
//!
//! Field names and types follow the wire schema: ids are raw `i64` and
//! zero means "not set".

use std::fmt;

/// Login request.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct LoginRequest {
    /// Account email.
    pub email: String,
    /// Plaintext password.
    pub password: String,
    /// Application the session token is issued for.
    pub app_id: i64,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("app_id", &self.app_id)
            .finish()
    }
}

/// Login response.
#[derive(Clone, PartialEq, Eq)]
pub struct LoginResponse {
    /// Signed session token.
    pub token: String,
}

impl fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginResponse").field("token", &"[REDACTED]").finish()
    }
}

/// Registration request.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct RegisterRequest {
    /// Account email.
    pub email: String,
    /// Plaintext password.
    pub password: String,
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Registration response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterResponse {
    /// Id of the new user.
    pub user_id: i64,
}

/// Admin check request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IsAdminRequest {
    /// User to check.
    pub user_id: i64,
}

/// Admin check response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IsAdminResponse {
    /// Whether the user holds admin privilege.
    pub is_admin: bool,
}
