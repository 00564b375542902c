//! Credential store contract and adapters for the SSO credential authority.
//!
//! This crate defines what the authority needs from persistence and nothing
//! more: save a user, look a user up by email, check the admin flag, and
//! look an application up by id. The contract is expressed as three
//! capability traits so consumers depend only on what they use.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Transport adapter                         │
//! │            (request validation, status codes)               │
//! ├─────────────────────────────────────────────────────────────┤
//! │                  Credential authority                       │
//! │        (register, login, is_admin, token issuance)          │
//! ├─────────────────────────────────────────────────────────────┤
//! │                     sso-storage                             │
//! │       UserSaver │ UserProvider │ AppProvider                │
//! ├──────────────────────────┬──────────────────────────────────┤
//! │  MemoryCredentialStore   │     SqliteCredentialStore        │
//! │     (tests, dev)         │   (`sqlite` feature)             │
//! └──────────────────────────┴──────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```
//! use sso_storage::{MemoryCredentialStore, UserProvider, UserSaver};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = MemoryCredentialStore::new();
//!
//!     let id = store.save_user("alice@example.com", b"$argon2id$...").await?;
//!     assert!(!store.is_admin(id).await?);
//!
//!     let user = store.get_user("alice@example.com").await?;
//!     assert_eq!(user.id, id);
//!     Ok(())
//! }
//! ```
//!
//! # Error Handling
//!
//! All operations return [`StorageResult<T>`]. Adapters map their internal
//! failures onto [`StorageError`], keeping [`StorageError::NotFound`] and
//! [`StorageError::AlreadyExists`] distinct from infrastructure faults.
//!
//! # Feature Flags
//!
//! - **`sqlite`**: Enables [`SqliteCredentialStore`] backed by `sqlx`.
//! - **`testutil`**: Enables the `testutil` module with seeded stores, a failure-injecting store,
//!   and assertion macros. Enable this in `[dev-dependencies]` for integration tests.
//! - **`failpoints`**: Activates `fail` injection points for fault testing.

#![deny(unsafe_code)]

pub mod error;
pub mod memory;
pub mod records;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod store;
#[cfg(any(test, feature = "testutil"))]
#[allow(clippy::expect_used, clippy::panic)]
pub mod testutil;
pub mod types;

// Re-export primary types at crate root for convenience
pub use error::{BoxError, StorageError, StorageResult};
pub use memory::MemoryCredentialStore;
pub use records::{Application, User};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteCredentialStore;
pub use store::{AppProvider, CredentialStore, UserProvider, UserSaver};
pub use types::{AppId, UserId};
pub use zeroize::Zeroizing;
