//! Transport adapter over the credential authority.
//!
//! [`AuthApi`] checks request shape, bounds each call with a deadline,
//! and maps domain errors to [`tonic::Status`]. Only client-safe error
//! kinds keep their message; every other failure becomes `Internal` with
//! a fixed message.

use std::{future::Future, sync::Arc, time::Duration};

use sso_authn::{AuthError, CredentialAuthority, ErrorKind};
use sso_storage::{AppId, UserId};
use tokio_util::sync::CancellationToken;
use tonic::Status;

use crate::{
    config::DEFAULT_REQUEST_TIMEOUT,
    messages::{
        IsAdminRequest, IsAdminResponse, LoginRequest, LoginResponse, RegisterRequest,
        RegisterResponse,
    },
};

/// Message sent for every failure that is not safe to show a client.
pub const INTERNAL_ERROR_MESSAGE: &str = "internal error";

/// Id value meaning "not set" on the wire.
const EMPTY_ID: i64 = 0;

/// Maps a domain error to a transport status.
#[must_use]
pub fn status_from_error(err: &AuthError) -> Status {
    match err.kind() {
        ErrorKind::InvalidInput | ErrorKind::InvalidCredentials | ErrorKind::InvalidApplication => {
            Status::invalid_argument(err.to_string())
        },
        ErrorKind::UserAlreadyExists => Status::already_exists(err.to_string()),
        ErrorKind::EntityNotFound => Status::not_found(err.to_string()),
        ErrorKind::Cancelled => Status::cancelled(err.to_string()),
        _ => Status::internal(INTERNAL_ERROR_MESSAGE),
    }
}

fn require_non_empty(value: &str, field: &str) -> Result<(), Status> {
    if value.is_empty() {
        return Err(status_from_error(&AuthError::invalid_input(format!("{field} is required"))));
    }
    Ok(())
}

fn require_id(value: i64, field: &str) -> Result<(), Status> {
    if value == EMPTY_ID {
        return Err(status_from_error(&AuthError::invalid_input(format!("{field} is required"))));
    }
    Ok(())
}

/// Auth service endpoints.
#[derive(Debug, Clone)]
pub struct AuthApi {
    authority: Arc<CredentialAuthority>,
    request_timeout: Duration,
    shutdown: CancellationToken,
}

#[bon::bon]
impl AuthApi {
    /// Creates the adapter.
    ///
    /// # Arguments
    ///
    /// * `authority` - Credential authority serving the calls.
    /// * `request_timeout` - Upper bound on each call (default: 5 seconds).
    /// * `shutdown` - Parent token; cancelling it cancels every in-flight call.
    #[builder]
    pub fn new(
        authority: Arc<CredentialAuthority>,
        #[builder(default = DEFAULT_REQUEST_TIMEOUT)] request_timeout: Duration,
        #[builder(default)] shutdown: CancellationToken,
    ) -> Self {
        Self { authority, request_timeout, shutdown }
    }
}

impl AuthApi {
    /// Returns the per-call deadline.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Returns the parent cancellation token.
    #[must_use]
    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }

    /// Authenticates a user and returns a session token.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` on a missing field, bad credentials or unknown
    /// application; `DeadlineExceeded`, `Cancelled` or `Internal` otherwise.
    #[tracing::instrument(skip_all, fields(email = %request.email, app_id = request.app_id))]
    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, Status> {
        require_non_empty(&request.email, "email")?;
        require_non_empty(&request.password, "password")?;
        require_id(request.app_id, "app_id")?;

        let token = self
            .call("login", |cancel| async move {
                self.authority
                    .login(&request.email, &request.password, AppId::from(request.app_id), &cancel)
                    .await
            })
            .await?;

        Ok(LoginResponse { token })
    }

    /// Registers a new user.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` on a missing field, `AlreadyExists` if the email
    /// is taken; `DeadlineExceeded`, `Cancelled` or `Internal` otherwise.
    #[tracing::instrument(skip_all, fields(email = %request.email))]
    pub async fn register(&self, request: RegisterRequest) -> Result<RegisterResponse, Status> {
        require_non_empty(&request.email, "email")?;
        require_non_empty(&request.password, "password")?;

        let user_id = self
            .call("register", |cancel| async move {
                self.authority.register(&request.email, &request.password, &cancel).await
            })
            .await?;

        Ok(RegisterResponse { user_id: user_id.into() })
    }

    /// Reports whether a user holds admin privilege.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` on a missing id, `NotFound` for an unknown user;
    /// `DeadlineExceeded`, `Cancelled` or `Internal` otherwise.
    #[tracing::instrument(skip_all, fields(user_id = request.user_id))]
    pub async fn is_admin(&self, request: IsAdminRequest) -> Result<IsAdminResponse, Status> {
        require_id(request.user_id, "user_id")?;

        let is_admin = self
            .call("is_admin", |cancel| async move {
                self.authority.is_admin(UserId::from(request.user_id), &cancel).await
            })
            .await?;

        Ok(IsAdminResponse { is_admin })
    }

    /// Runs one authority call under a child token and the request deadline.
    async fn call<T, F, Fut>(&self, operation: &'static str, f: F) -> Result<T, Status>
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = Result<T, AuthError>>,
    {
        let cancel = self.shutdown.child_token();
        let _guard = cancel.clone().drop_guard();

        match tokio::time::timeout(self.request_timeout, f(cancel.clone())).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => {
                if !err.kind().is_client_safe() {
                    tracing::error!(operation, error = %err, "request failed");
                }
                Err(status_from_error(&err))
            },
            Err(_) => {
                cancel.cancel();
                tracing::warn!(operation, timeout = ?self.request_timeout, "request deadline exceeded");
                Err(Status::deadline_exceeded(format!("{operation} deadline exceeded")))
            },
        }
    }
}
