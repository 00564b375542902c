//! The credential authority: register, login and admin checks.
//!
//! [`CredentialAuthority`] owns the business rules and nothing else. It is
//! stateless between calls; the credential store is the only shared mutable
//! resource. Storage conditions are translated into [`AuthError`] here and
//! nowhere else.
//!
//! # Cancellation
//!
//! Every operation takes a [`CancellationToken`]. Each store call and each
//! hashing step is raced against it, biased toward cancellation, so a
//! cancelled call returns [`AuthError::Cancelled`] promptly. The authority
//! imposes no deadlines of its own.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use sso_authn::{Argon2Hasher, AuthorityConfig, CredentialAuthority};
//! use sso_storage::{AppId, MemoryCredentialStore};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AuthorityConfig::default();
//! let authority = CredentialAuthority::builder()
//!     .store(Arc::new(MemoryCredentialStore::new()))
//!     .hasher(Arc::new(Argon2Hasher::new(config.hasher())?))
//!     .config(config)
//!     .build()?;
//!
//! let cancel = CancellationToken::new();
//! let user_id = authority.register("alice@example.com", "hunter2", &cancel).await?;
//! let token = authority.login("alice@example.com", "hunter2", AppId::from(1), &cancel).await?;
//! # Ok(())
//! # }
//! ```

use std::{fmt, future::Future, sync::Arc};

use fail::fail_point;
use sso_storage::{AppId, CredentialStore, StorageError, UserId};
use tokio_util::sync::CancellationToken;
use zeroize::Zeroizing;

use crate::{
    audit::{
        AuditAction, AuditEvent, AuditLogger, AuditResult, NoopAuditLogger, app_resource,
        user_resource,
    },
    config::AuthorityConfig,
    error::AuthError,
    password::PasswordHasher,
    token::TokenIssuer,
};

/// Password hashed at construction so that a login for an unknown email
/// costs the same as one for a known email.
const DUMMY_PASSWORD: &str = "sso-authority-timing-equalizer";

/// Runs `fut` unless `cancel` fires first.
async fn guard<F: Future>(cancel: &CancellationToken, fut: F) -> Result<F::Output, AuthError> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(AuthError::Cancelled),
        out = fut => Ok(out),
    }
}

/// Registers users, authenticates them, and answers privilege queries.
pub struct CredentialAuthority {
    store: Arc<dyn CredentialStore>,
    hasher: Arc<dyn PasswordHasher>,
    audit_logger: Arc<dyn AuditLogger>,
    issuer: TokenIssuer,
    config: AuthorityConfig,
    dummy_hash: Zeroizing<Vec<u8>>,
}

impl fmt::Debug for CredentialAuthority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialAuthority")
            .field("issuer", &self.issuer)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[bon::bon]
impl CredentialAuthority {
    /// Creates an authority from its collaborators.
    ///
    /// # Arguments
    ///
    /// * `store` - Credential store.
    /// * `hasher` - Password hasher.
    /// * `audit_logger` - Audit backend (default: [`NoopAuditLogger`]).
    /// * `config` - Token lifetime and leeway (default: [`AuthorityConfig::default`]).
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::HashingFailure`] if the hasher cannot produce the
    /// timing-equalization hash.
    #[builder]
    pub fn new(
        store: Arc<dyn CredentialStore>,
        hasher: Arc<dyn PasswordHasher>,
        audit_logger: Option<Arc<dyn AuditLogger>>,
        #[builder(default)] config: AuthorityConfig,
    ) -> Result<Self, AuthError> {
        let audit_logger: Arc<dyn AuditLogger> = match audit_logger {
            Some(logger) => logger,
            None => Arc::new(NoopAuditLogger),
        };
        let dummy_hash = Zeroizing::new(hasher.hash(DUMMY_PASSWORD)?);

        Ok(Self {
            store,
            hasher,
            audit_logger,
            issuer: TokenIssuer::new(config.token_leeway()),
            config,
            dummy_hash,
        })
    }
}

impl CredentialAuthority {
    /// Returns the token issuer, configured with this authority's leeway.
    ///
    /// Downstream services use it to verify session tokens.
    #[must_use]
    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    /// Returns the authority's configuration.
    #[must_use]
    pub fn config(&self) -> &AuthorityConfig {
        &self.config
    }

    /// Registers a new user and returns its id.
    ///
    /// Email and password are assumed non-empty; the transport adapter
    /// checks that.
    ///
    /// # Errors
    ///
    /// - [`AuthError::UserAlreadyExists`] if the email is taken
    /// - [`AuthError::StorageUnavailable`] if the store fails
    /// - [`AuthError::HashingFailure`] if hashing fails
    /// - [`AuthError::Cancelled`] if `cancel` fires first
    #[tracing::instrument(skip(self, password, cancel))]
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        cancel: &CancellationToken,
    ) -> Result<UserId, AuthError> {
        let result = self.register_inner(email, password, cancel).await;

        let resource = match &result {
            Ok(id) => user_resource(*id),
            Err(_) => format!("user:{email}"),
        };
        self.audit(AuditAction::Register, email, resource, &result, None).await;

        match &result {
            Ok(id) => tracing::info!(user_id = %id, "user registered"),
            Err(AuthError::UserAlreadyExists) => tracing::warn!("user already exists"),
            Err(_) => {},
        }
        result
    }

    async fn register_inner(
        &self,
        email: &str,
        password: &str,
        cancel: &CancellationToken,
    ) -> Result<UserId, AuthError> {
        const OP: &str = "register";

        let hash = guard(cancel, self.hash_password(password)).await??;

        match guard(cancel, self.store.save_user(email, &hash)).await? {
            Ok(id) => Ok(id),
            Err(e) if e.is_already_exists() => Err(AuthError::UserAlreadyExists),
            Err(e) => Err(storage_failure(OP, e)),
        }
    }

    /// Authenticates a user and issues a session token for `app_id`.
    ///
    /// Unknown email and wrong password are indistinguishable, in result
    /// and in timing.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidCredentials`] on unknown email or wrong password
    /// - [`AuthError::InvalidApplication`] if the application does not exist
    /// - [`AuthError::StorageUnavailable`] if the store fails
    /// - [`AuthError::SigningFailure`] if the token cannot be signed
    /// - [`AuthError::HashingFailure`] if the stored hash is unusable
    /// - [`AuthError::Cancelled`] if `cancel` fires first
    #[tracing::instrument(skip(self, password, cancel))]
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        app_id: AppId,
        cancel: &CancellationToken,
    ) -> Result<String, AuthError> {
        let result = self.login_inner(email, password, app_id, cancel).await;
        self.audit(AuditAction::Login, email, app_resource(app_id), &result, None).await;

        match &result {
            Ok(_) => tracing::info!("user logged in"),
            Err(AuthError::InvalidCredentials) => tracing::info!("invalid credentials"),
            Err(AuthError::InvalidApplication) => tracing::warn!("application not found"),
            Err(_) => {},
        }
        result
    }

    async fn login_inner(
        &self,
        email: &str,
        password: &str,
        app_id: AppId,
        cancel: &CancellationToken,
    ) -> Result<String, AuthError> {
        const OP: &str = "login";

        let user = match guard(cancel, self.store.get_user(email)).await? {
            Ok(user) => Some(user),
            Err(e) if e.is_not_found() => None,
            Err(e) => return Err(storage_failure(OP, e)),
        };

        let stored_hash = match &user {
            Some(user) => user.pass_hash.clone(),
            None => self.dummy_hash.clone(),
        };
        let matches = guard(cancel, self.verify_password(stored_hash, password)).await??;

        let Some(user) = user.filter(|_| matches) else {
            return Err(AuthError::InvalidCredentials);
        };

        let app = match guard(cancel, self.store.get_application(app_id)).await? {
            Ok(app) => app,
            Err(e) if e.is_not_found() => return Err(AuthError::InvalidApplication),
            Err(e) => return Err(storage_failure(OP, e)),
        };

        let admin = guard(cancel, self.store.is_admin(user.id))
            .await?
            .map_err(|e| storage_failure(OP, e))?;

        fail_point!("authority-before-sign", |_| {
            Err(AuthError::signing_failure("injected failure before sign"))
        });

        self.issuer.issue(&user, &app, admin, self.config.token_ttl()).inspect_err(|e| {
            tracing::error!(operation = OP, error = %e, "failed to sign session token");
        })
    }

    /// Reports whether the user holds admin privilege.
    ///
    /// # Errors
    ///
    /// - [`AuthError::EntityNotFound`] if the user does not exist
    /// - [`AuthError::StorageUnavailable`] if the store fails
    /// - [`AuthError::Cancelled`] if `cancel` fires first
    #[tracing::instrument(skip(self, cancel))]
    pub async fn is_admin(
        &self,
        user_id: UserId,
        cancel: &CancellationToken,
    ) -> Result<bool, AuthError> {
        const OP: &str = "is_admin";

        let result = guard(cancel, self.store.is_admin(user_id)).await.and_then(|r| match r {
            Ok(admin) => Ok(admin),
            Err(e) if e.is_not_found() => Err(AuthError::EntityNotFound),
            Err(e) => Err(storage_failure(OP, e)),
        });

        let metadata = result.as_ref().ok().map(|admin| ("admin", admin.to_string()));
        self.audit(
            AuditAction::IsAdmin,
            &user_id.to_string(),
            user_resource(user_id),
            &result,
            metadata,
        )
        .await;

        result
    }

    async fn hash_password(&self, password: &str) -> Result<Zeroizing<Vec<u8>>, AuthError> {
        let hasher = Arc::clone(&self.hasher);
        let password = Zeroizing::new(password.to_owned());

        tokio::task::spawn_blocking(move || hasher.hash(&password).map(Zeroizing::new))
            .await
            .map_err(|e| AuthError::hashing_failure(format!("hashing task failed: {e}")))?
            .inspect_err(|e| tracing::error!(error = %e, "password hashing failed"))
    }

    async fn verify_password(
        &self,
        stored_hash: Zeroizing<Vec<u8>>,
        password: &str,
    ) -> Result<bool, AuthError> {
        let hasher = Arc::clone(&self.hasher);
        let password = Zeroizing::new(password.to_owned());

        tokio::task::spawn_blocking(move || hasher.verify(&stored_hash, &password))
            .await
            .map_err(|e| AuthError::hashing_failure(format!("verification task failed: {e}")))?
            .inspect_err(|e| tracing::error!(error = %e, "password verification failed"))
    }

    async fn audit<T>(
        &self,
        action: AuditAction,
        actor: &str,
        resource: String,
        result: &Result<T, AuthError>,
        metadata: Option<(&str, String)>,
    ) {
        let outcome = match result {
            Ok(_) => AuditResult::Success,
            Err(e) => AuditResult::Failure(e.kind().to_string()),
        };
        let metadata = metadata.into_iter().map(|(k, v)| (k.to_owned(), v)).collect();

        let event = AuditEvent::builder()
            .actor(actor)
            .action(action)
            .resource(resource)
            .result(outcome)
            .metadata(metadata)
            .build();
        self.audit_logger.log(&event).await;
    }
}

/// Logs an infrastructure failure and wraps it for the caller.
fn storage_failure(operation: &'static str, err: StorageError) -> AuthError {
    tracing::error!(operation, error = %err, "credential store failure");
    AuthError::storage_unavailable(operation, err)
}
