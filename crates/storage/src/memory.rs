//! In-memory credential store.
//!
//! [`MemoryCredentialStore`] keeps users and applications in hash maps
//! behind a single [`parking_lot::RwLock`]. Uniqueness of email is checked
//! and the user inserted under one write-lock acquisition, which gives the
//! same exactly-one-winner guarantee a relational `UNIQUE` constraint does.
//!
//! Cloning the store is cheap and clones share state.
//!
//! # Example
//!
//! ```
//! use sso_storage::{AppId, Application, MemoryCredentialStore, UserProvider, UserSaver};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = MemoryCredentialStore::new();
//!     store.insert_application(Application::new(AppId::from(1), "web", b"secret".to_vec()));
//!
//!     let id = store.save_user("alice@example.com", b"hash").await?;
//!     let user = store.get_user("alice@example.com").await?;
//!     assert_eq!(user.id, id);
//!     Ok(())
//! }
//! ```

use std::{
    collections::{HashMap, HashSet, hash_map::Entry},
    sync::Arc,
};

use async_trait::async_trait;
use fail::fail_point;
use parking_lot::RwLock;

use crate::{
    error::{StorageError, StorageResult},
    records::{Application, User},
    store::{AppProvider, UserProvider, UserSaver, app_key, user_id_key, user_key},
    types::{AppId, UserId},
};

#[derive(Debug, Default)]
struct State {
    /// Users indexed by email.
    users: HashMap<String, User>,
    /// Reverse index from id to email.
    emails: HashMap<UserId, String>,
    admins: HashSet<UserId>,
    apps: HashMap<AppId, Application>,
    last_user_id: i64,
}

/// In-memory implementation of the credential store capability traits.
///
/// Suitable for tests and development. Nothing is persisted.
#[derive(Debug, Default, Clone)]
pub struct MemoryCredentialStore {
    state: Arc<RwLock<State>>,
}

impl MemoryCredentialStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an application, replacing any existing one with the same id.
    pub fn insert_application(&self, app: Application) {
        self.state.write().apps.insert(app.id, app);
    }

    /// Grants or withdraws admin privilege.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] if the user does not exist.
    pub fn set_admin(&self, user_id: UserId, is_admin: bool) -> StorageResult<()> {
        let mut state = self.state.write();
        if !state.emails.contains_key(&user_id) {
            return Err(StorageError::not_found(user_id_key(user_id)));
        }
        if is_admin {
            state.admins.insert(user_id);
        } else {
            state.admins.remove(&user_id);
        }
        Ok(())
    }

    /// Number of registered users.
    #[must_use]
    pub fn user_count(&self) -> usize {
        self.state.read().users.len()
    }
}

#[async_trait]
impl UserSaver for MemoryCredentialStore {
    #[tracing::instrument(skip(self, pass_hash))]
    async fn save_user(&self, email: &str, pass_hash: &[u8]) -> StorageResult<UserId> {
        fail_point!("memory-store-before-save", |_| {
            Err(StorageError::internal("injected failure before save"))
        });

        let mut guard = self.state.write();
        let state = &mut *guard;

        match state.users.entry(email.to_owned()) {
            Entry::Occupied(_) => Err(StorageError::already_exists(user_key(email))),
            Entry::Vacant(entry) => {
                state.last_user_id += 1;
                let id = UserId::from(state.last_user_id);
                entry.insert(User::new(id, email, pass_hash));
                state.emails.insert(id, email.to_owned());
                Ok(id)
            },
        }
    }
}

#[async_trait]
impl UserProvider for MemoryCredentialStore {
    #[tracing::instrument(skip(self))]
    async fn get_user(&self, email: &str) -> StorageResult<User> {
        self.state
            .read()
            .users
            .get(email)
            .cloned()
            .ok_or_else(|| StorageError::not_found(user_key(email)))
    }

    #[tracing::instrument(skip(self))]
    async fn is_admin(&self, user_id: UserId) -> StorageResult<bool> {
        let state = self.state.read();
        if !state.emails.contains_key(&user_id) {
            return Err(StorageError::not_found(user_id_key(user_id)));
        }
        Ok(state.admins.contains(&user_id))
    }
}

#[async_trait]
impl AppProvider for MemoryCredentialStore {
    #[tracing::instrument(skip(self))]
    async fn get_application(&self, app_id: AppId) -> StorageResult<Application> {
        self.state
            .read()
            .apps
            .get(&app_id)
            .cloned()
            .ok_or_else(|| StorageError::not_found(app_key(app_id)))
    }
}
