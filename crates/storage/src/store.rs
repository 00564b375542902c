//! Capability traits consumed by the credential authority.
//!
//! The contract is split into three capability groups so a consumer can
//! depend on exactly what it uses (the token verifier, for instance, only
//! needs [`AppProvider`]):
//!
//! | Trait | Operations |
//! |-------|------------|
//! | [`UserSaver`] | [`save_user`](UserSaver::save_user) |
//! | [`UserProvider`] | [`get_user`](UserProvider::get_user), [`is_admin`](UserProvider::is_admin) |
//! | [`AppProvider`] | [`get_application`](AppProvider::get_application) |
//!
//! [`CredentialStore`] is implemented for every type providing all three.
//!
//! # Usage
//!
//! ```no_run
//! use sso_storage::{CredentialStore, StorageResult, UserId};
//!
//! async fn register<S: CredentialStore>(
//!     store: &S,
//!     email: &str,
//!     hash: &[u8],
//! ) -> StorageResult<UserId> {
//!     store.save_user(email, hash).await
//! }
//! ```

use async_trait::async_trait;

use crate::{
    error::StorageResult,
    records::{Application, User},
    types::{AppId, UserId},
};

/// Persists new users.
#[async_trait]
pub trait UserSaver: Send + Sync {
    /// Stores a new user and returns its identifier.
    ///
    /// The check for an existing email and the insert must be a single
    /// atomic step: of two concurrent calls with the same email exactly one
    /// succeeds.
    ///
    /// # Errors
    ///
    /// - [`StorageError::AlreadyExists`](crate::StorageError::AlreadyExists) if the email is
    ///   already registered
    /// - any infrastructure variant if the backend is unavailable
    async fn save_user(&self, email: &str, pass_hash: &[u8]) -> StorageResult<UserId>;
}

/// Looks up users and their privileges.
#[async_trait]
pub trait UserProvider: Send + Sync {
    /// Retrieves a user by email.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`](crate::StorageError::NotFound) if no user has this
    /// email.
    async fn get_user(&self, email: &str) -> StorageResult<User>;

    /// Reports whether the user holds admin privilege.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`](crate::StorageError::NotFound) for an unknown user id.
    async fn is_admin(&self, user_id: UserId) -> StorageResult<bool>;
}

/// Looks up client applications.
#[async_trait]
pub trait AppProvider: Send + Sync {
    /// Retrieves an application by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`](crate::StorageError::NotFound) for an unknown
    /// application id.
    async fn get_application(&self, app_id: AppId) -> StorageResult<Application>;
}

/// Umbrella trait for stores that provide every capability group.
pub trait CredentialStore: UserSaver + UserProvider + AppProvider {}

impl<T> CredentialStore for T where T: UserSaver + UserProvider + AppProvider {}

/// Record key used in errors and logs for a user looked up by email.
pub fn user_key(email: &str) -> String {
    format!("user:{email}")
}

/// Record key used in errors and logs for a user looked up by id.
pub fn user_id_key(user_id: UserId) -> String {
    format!("user_id:{user_id}")
}

/// Record key used in errors and logs for an application.
pub fn app_key(app_id: AppId) -> String {
    format!("app:{app_id}")
}
