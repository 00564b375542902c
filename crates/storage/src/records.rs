//! User and application records.

use std::fmt;

use zeroize::Zeroizing;

use crate::types::{AppId, UserId};

/// A registered user.
///
/// The password hash is the opaque output of the password hasher (a PHC
/// string in practice) and is never the plaintext. It is wrapped in
/// [`Zeroizing`] so the bytes are scrubbed on drop, and `Debug` redacts it.
#[derive(Clone, PartialEq, Eq)]
pub struct User {
    /// Store-assigned identifier.
    pub id: UserId,
    /// Unique, case-sensitive email address.
    pub email: String,
    /// Salted one-way password hash.
    pub pass_hash: Zeroizing<Vec<u8>>,
}

impl User {
    /// Creates a user record.
    pub fn new(id: UserId, email: impl Into<String>, pass_hash: impl Into<Vec<u8>>) -> Self {
        Self { id, email: email.into(), pass_hash: Zeroizing::new(pass_hash.into()) }
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("pass_hash", &"<redacted>")
            .finish()
    }
}

/// A client application that sessions are issued for.
///
/// Applications are seeded out of band and are read-only to the authority.
/// The signing secret is only ever read by the token issuer.
///
/// # Examples
///
/// ```
/// use sso_storage::{AppId, Application};
///
/// let app = Application::new(AppId::from(1), "dashboard", b"s3cr3t".to_vec());
/// assert_eq!(app.name, "dashboard");
/// assert!(!format!("{app:?}").contains("s3cr3t"));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Application {
    /// Application identifier.
    pub id: AppId,
    /// Human-readable name.
    pub name: String,
    /// Symmetric secret used to sign and verify this application's tokens.
    pub secret: Zeroizing<Vec<u8>>,
}

impl Application {
    /// Creates an application record.
    pub fn new(id: AppId, name: impl Into<String>, secret: impl Into<Vec<u8>>) -> Self {
        Self { id, name: name.into(), secret: Zeroizing::new(secret.into()) }
    }
}

impl fmt::Debug for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Application")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("secret", &"<redacted>")
            .finish()
    }
}
