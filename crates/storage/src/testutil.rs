//! Shared test utilities for credential store testing.
//!
//! Feature-gated behind `testutil` so none of it leaks into production
//! builds.
//!
//! ```toml
//! [dev-dependencies]
//! sso-storage = { path = "../storage", features = ["testutil"] }
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::{
    error::{StorageError, StorageResult},
    memory::MemoryCredentialStore,
    records::{Application, User},
    store::{AppProvider, UserProvider, UserSaver},
    types::{AppId, UserId},
};

/// Secret used by [`test_application`].
pub const TEST_APP_SECRET: &[u8] = b"test-application-signing-secret";

/// Creates an application with a deterministic name and [`TEST_APP_SECRET`].
#[must_use]
pub fn test_application(id: i64) -> Application {
    Application::new(AppId::from(id), format!("test-app-{id}"), TEST_APP_SECRET.to_vec())
}

/// Creates a [`MemoryCredentialStore`] seeded with the given application ids.
#[must_use]
pub fn seeded_store(app_ids: &[i64]) -> MemoryCredentialStore {
    let store = MemoryCredentialStore::new();
    for &id in app_ids {
        store.insert_application(test_application(id));
    }
    store
}

/// Assert that a result is an `Err` of the given [`StorageError`] variant.
///
/// # Examples
///
/// ```no_run
/// // Requires the `testutil` feature to be enabled.
/// use sso_storage::{StorageError, StorageResult, assert_storage_error};
///
/// let result: StorageResult<()> = Err(StorageError::not_found("user:x"));
/// assert_storage_error!(result, NotFound);
/// ```
#[macro_export]
macro_rules! assert_storage_error {
    ($result:expr, $variant:ident) => {
        match $result {
            Err($crate::error::StorageError::$variant { .. }) => {},
            other => panic!(
                "expected StorageError::{}, got: {:?}",
                stringify!($variant),
                other.map(|_| ()),
            ),
        }
    };
}

/// Assert that a [`StorageResult`] is `Ok` and return the inner value.
#[macro_export]
macro_rules! assert_storage_ok {
    ($result:expr) => {
        match $result {
            Ok(val) => val,
            Err(e) => panic!("expected Ok, got StorageError: {e:?}"),
        }
    };
    ($result:expr, $msg:expr) => {
        match $result {
            Ok(val) => val,
            Err(e) => panic!("{}: expected Ok, got StorageError: {e:?}", $msg),
        }
    };
}

/// Which operation a [`FailingCredentialStore`] should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailOn {
    /// `save_user` fails.
    SaveUser,
    /// `get_user` fails.
    GetUser,
    /// `is_admin` fails.
    IsAdmin,
    /// `get_application` fails.
    GetApplication,
}

/// Store that delegates to a [`MemoryCredentialStore`] but fails one
/// operation with a connection error.
///
/// Used to exercise the infrastructure-failure paths of consumers.
#[derive(Debug, Clone)]
pub struct FailingCredentialStore {
    inner: MemoryCredentialStore,
    fail_on: Arc<Mutex<Option<FailOn>>>,
}

impl FailingCredentialStore {
    /// Wraps `inner`, failing `fail_on` until [`heal`](Self::heal) is called.
    #[must_use]
    pub fn new(inner: MemoryCredentialStore, fail_on: FailOn) -> Self {
        Self { inner, fail_on: Arc::new(Mutex::new(Some(fail_on))) }
    }

    /// Stops injecting failures.
    pub fn heal(&self) {
        *self.fail_on.lock() = None;
    }

    /// The wrapped store.
    #[must_use]
    pub fn inner(&self) -> &MemoryCredentialStore {
        &self.inner
    }

    fn check(&self, op: FailOn) -> StorageResult<()> {
        if *self.fail_on.lock() == Some(op) {
            return Err(StorageError::connection_with_source(
                format!("injected {op:?} failure"),
                std::io::Error::new(std::io::ErrorKind::ConnectionReset, "connection reset"),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl UserSaver for FailingCredentialStore {
    async fn save_user(&self, email: &str, pass_hash: &[u8]) -> StorageResult<UserId> {
        self.check(FailOn::SaveUser)?;
        self.inner.save_user(email, pass_hash).await
    }
}

#[async_trait]
impl UserProvider for FailingCredentialStore {
    async fn get_user(&self, email: &str) -> StorageResult<User> {
        self.check(FailOn::GetUser)?;
        self.inner.get_user(email).await
    }

    async fn is_admin(&self, user_id: UserId) -> StorageResult<bool> {
        self.check(FailOn::IsAdmin)?;
        self.inner.is_admin(user_id).await
    }
}

#[async_trait]
impl AppProvider for FailingCredentialStore {
    async fn get_application(&self, app_id: AppId) -> StorageResult<Application> {
        self.check(FailOn::GetApplication)?;
        self.inner.get_application(app_id).await
    }
}

/// Store whose operations never complete.
///
/// Every call is counted on entry and then waits forever, so callers can
/// observe that a request has reached the store and must be abandoned.
#[derive(Debug, Clone, Default)]
pub struct StalledCredentialStore {
    calls: Arc<AtomicUsize>,
}

impl StalledCredentialStore {
    /// Creates a stalled store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of calls that have entered the store.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn stall<T>(&self) -> StorageResult<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        std::future::pending().await
    }
}

#[async_trait]
impl UserSaver for StalledCredentialStore {
    async fn save_user(&self, _email: &str, _pass_hash: &[u8]) -> StorageResult<UserId> {
        self.stall().await
    }
}

#[async_trait]
impl UserProvider for StalledCredentialStore {
    async fn get_user(&self, _email: &str) -> StorageResult<User> {
        self.stall().await
    }

    async fn is_admin(&self, _user_id: UserId) -> StorageResult<bool> {
        self.stall().await
    }
}

#[async_trait]
impl AppProvider for StalledCredentialStore {
    async fn get_application(&self, _app_id: AppId) -> StorageResult<Application> {
        self.stall().await
    }
}
