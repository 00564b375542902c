//! End-to-end tests of the transport adapter over the in-memory store.
#![allow(clippy::expect_used, clippy::panic)]

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use sso_api::{
    AuthApi, INTERNAL_ERROR_MESSAGE,
    messages::{IsAdminRequest, LoginRequest, RegisterRequest},
};
use sso_authn::{
    AuthError, CredentialAuthority, PasswordHasher,
    testutil::{fast_hasher, test_authority},
};
use sso_storage::{
    MemoryCredentialStore, UserId,
    testutil::{FailOn, FailingCredentialStore, seeded_store},
};
use tokio_util::sync::CancellationToken;
use tonic::Code;

fn api_over(store: MemoryCredentialStore) -> AuthApi {
    AuthApi::builder().authority(Arc::new(test_authority(Arc::new(store)))).build()
}

fn register_request(email: &str, password: &str) -> RegisterRequest {
    RegisterRequest { email: email.into(), password: password.into() }
}

fn login_request(email: &str, password: &str, app_id: i64) -> LoginRequest {
    LoginRequest { email: email.into(), password: password.into(), app_id }
}

/// Hasher that never finishes in time.
#[derive(Debug)]
struct SlowHasher {
    delay: Duration,
}

impl PasswordHasher for SlowHasher {
    fn hash(&self, password: &str) -> Result<Vec<u8>, AuthError> {
        std::thread::sleep(self.delay);
        fast_hasher().hash(password)
    }

    fn verify(&self, hash: &[u8], password: &str) -> Result<bool, AuthError> {
        std::thread::sleep(self.delay);
        fast_hasher().verify(hash, password)
    }
}

// ---------------------------------------------------------------------------
// Happy path
// ---------------------------------------------------------------------------

#[tokio::test]
async fn register_login_is_admin_flow() {
    let store = seeded_store(&[1]);
    let api = api_over(store.clone());

    let registered =
        api.register(register_request("a@example.com", "pw")).await.expect("register");
    assert!(registered.user_id > 0);

    let login = api.login(login_request("a@example.com", "pw", 1)).await.expect("login");
    assert_eq!(login.token.split('.').count(), 3);

    let check = api.is_admin(IsAdminRequest { user_id: registered.user_id }).await.expect("check");
    assert!(!check.is_admin);

    store.set_admin(UserId::from(registered.user_id), true).expect("grant");
    let check = api.is_admin(IsAdminRequest { user_id: registered.user_id }).await.expect("check");
    assert!(check.is_admin);
}

// ---------------------------------------------------------------------------
// Shape validation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_fields_are_invalid_argument() {
    let api = api_over(seeded_store(&[1]));

    let cases = [
        (api.register(register_request("", "pw")).await.map(|_| ()), "email is required"),
        (api.register(register_request("a@example.com", "")).await.map(|_| ()), "password is required"),
        (api.login(login_request("", "pw", 1)).await.map(|_| ()), "email is required"),
        (api.login(login_request("a@example.com", "", 1)).await.map(|_| ()), "password is required"),
        (api.login(login_request("a@example.com", "pw", 0)).await.map(|_| ()), "app_id is required"),
        (api.is_admin(IsAdminRequest { user_id: 0 }).await.map(|_| ()), "user_id is required"),
    ];

    for (result, message) in cases {
        let status = result.expect_err(message);
        assert_eq!(status.code(), Code::InvalidArgument);
        assert_eq!(status.message(), message);
    }
}

#[tokio::test]
async fn shape_validation_happens_before_the_store() {
    let store = seeded_store(&[1]);
    let api = api_over(store.clone());

    let _ = api.register(register_request("a@example.com", "")).await;

    assert_eq!(store.user_count(), 0);
}

// ---------------------------------------------------------------------------
// Domain error mapping
// ---------------------------------------------------------------------------

#[tokio::test]
async fn domain_errors_map_to_documented_codes() {
    let api = api_over(seeded_store(&[1]));
    api.register(register_request("a@example.com", "pw")).await.expect("register");

    let duplicate = api.register(register_request("a@example.com", "pw")).await.expect_err("dup");
    assert_eq!(duplicate.code(), Code::AlreadyExists);

    let wrong = api.login(login_request("a@example.com", "nope", 1)).await.expect_err("wrong");
    let unknown = api.login(login_request("b@example.com", "pw", 1)).await.expect_err("unknown");
    assert_eq!(wrong.code(), Code::InvalidArgument);
    assert_eq!(wrong.message(), unknown.message());
    assert_eq!(wrong.code(), unknown.code());

    let bad_app = api.login(login_request("a@example.com", "pw", 9)).await.expect_err("bad app");
    assert_eq!(bad_app.code(), Code::InvalidArgument);

    let missing = api.is_admin(IsAdminRequest { user_id: 404 }).await.expect_err("missing");
    assert_eq!(missing.code(), Code::NotFound);
}

#[tokio::test]
async fn store_failure_is_opaque_internal() {
    let store = FailingCredentialStore::new(seeded_store(&[1]), FailOn::SaveUser);
    let api = AuthApi::builder().authority(Arc::new(test_authority(Arc::new(store)))).build();

    let status = api.register(register_request("a@example.com", "pw")).await.expect_err("fails");

    assert_eq!(status.code(), Code::Internal);
    assert_eq!(status.message(), INTERNAL_ERROR_MESSAGE);
    assert!(!status.message().contains("connection"));
}

// ---------------------------------------------------------------------------
// Deadlines and cancellation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn elapsed_deadline_is_deadline_exceeded() {
    let authority = CredentialAuthority::builder()
        .store(Arc::new(seeded_store(&[1])))
        .hasher(Arc::new(SlowHasher { delay: Duration::from_millis(200) }))
        .build()
        .expect("authority");
    let api = AuthApi::builder()
        .authority(Arc::new(authority))
        .request_timeout(Duration::from_millis(20))
        .build();

    let status = api.register(register_request("a@example.com", "pw")).await.expect_err("slow");

    assert_eq!(status.code(), Code::DeadlineExceeded);
}

#[tokio::test]
async fn shutdown_cancels_calls() {
    let shutdown = CancellationToken::new();
    let api = AuthApi::builder()
        .authority(Arc::new(test_authority(Arc::new(seeded_store(&[1])))))
        .shutdown(shutdown.clone())
        .build();
    shutdown.cancel();

    let status = api.register(register_request("a@example.com", "pw")).await.expect_err("shut down");

    assert_eq!(status.code(), Code::Cancelled);
}

// ---------------------------------------------------------------------------
// Audit wiring through the adapter
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct CountingAuditLogger {
    count: std::sync::atomic::AtomicUsize,
}

#[async_trait]
impl sso_authn::AuditLogger for CountingAuditLogger {
    async fn log(&self, _event: &sso_authn::audit::AuditEvent) {
        self.count.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    }
}

#[tokio::test]
async fn rejected_shape_is_not_audited() {
    let logger = Arc::new(CountingAuditLogger::default());
    let authority = CredentialAuthority::builder()
        .store(Arc::new(seeded_store(&[1])))
        .hasher(Arc::new(fast_hasher()))
        .audit_logger(logger.clone())
        .build()
        .expect("authority");
    let api = AuthApi::builder().authority(Arc::new(authority)).build();

    let _ = api.register(register_request("", "pw")).await;
    api.register(register_request("a@example.com", "pw")).await.expect("register");

    assert_eq!(logger.count.load(std::sync::atomic::Ordering::SeqCst), 1);
}
