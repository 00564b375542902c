//! Session token issuance and verification.
//!
//! A session token is a compact JWS signed with HS256 using the owning
//! application's secret:
//!
//! ```json
//! {
//!   "sub": 42,
//!   "app_id": 1,
//!   "admin": false,
//!   "exp": 1700003600,
//!   "iat": 1700000000,
//!   "jti": "6f1c1a52-3b0e-4c1b-9b43-3c0c5a9d1e77"
//! }
//! ```
//!
//! Tokens are never stored; they become invalid only by expiry or by a
//! signature that no longer matches the application's secret.
//!
//! A token is expired once `exp <= now - leeway`. `iat` and `exp` are whole
//! seconds with the issue instant truncated, so a token may expire up to one
//! second before the exact issue time plus TTL.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//!
//! use sso_authn::TokenIssuer;
//! use sso_storage::{AppId, Application, User, UserId};
//!
//! let app = Application::new(AppId::from(1), "web", b"app-secret".to_vec());
//! let user = User::new(UserId::from(42), "alice@example.com", b"hash".to_vec());
//!
//! let issuer = TokenIssuer::default();
//! let token = issuer.issue(&user, &app, false, Duration::from_secs(3600))?;
//! let claims = issuer.verify(&token, &app)?;
//! assert_eq!(claims.sub, UserId::from(42));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::time::Duration;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use sso_storage::{AppId, AppProvider, Application, User, UserId};

use crate::{
    error::{AuthError, TokenError},
    validation::{validate_algorithm, validate_signing_secret},
};

/// Claims carried by a session token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject - the authenticated user.
    pub sub: UserId,
    /// Application the session is scoped to.
    pub app_id: AppId,
    /// Admin flag resolved at issue time.
    pub admin: bool,
    /// Expiration time (seconds since epoch).
    pub exp: u64,
    /// Issued at (seconds since epoch).
    pub iat: u64,
    /// Random token identifier (UUIDv4).
    pub jti: String,
}

/// Current time in whole seconds since the Unix epoch, truncated.
pub(crate) fn unix_now() -> u64 {
    u64::try_from(Utc::now().timestamp()).unwrap_or(0)
}

/// Signs and verifies session tokens.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenIssuer {
    leeway: Duration,
}

impl TokenIssuer {
    /// Creates an issuer that tolerates `leeway` of clock skew when
    /// verifying expiry.
    #[must_use]
    pub fn new(leeway: Duration) -> Self {
        Self { leeway }
    }

    /// Issues a token valid for `ttl` from now.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::SigningFailure`] if the application secret is
    /// empty or encoding fails.
    pub fn issue(
        &self,
        user: &User,
        app: &Application,
        admin: bool,
        ttl: Duration,
    ) -> Result<String, AuthError> {
        self.issue_at(user, app, admin, ttl, unix_now())
    }

    /// Issues a token valid for `ttl` from `now` (seconds since epoch).
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::SigningFailure`] if the application secret is
    /// empty or encoding fails.
    pub fn issue_at(
        &self,
        user: &User,
        app: &Application,
        admin: bool,
        ttl: Duration,
        now: u64,
    ) -> Result<String, AuthError> {
        validate_signing_secret(&app.secret)?;

        let claims = SessionClaims {
            sub: user.id,
            app_id: app.id,
            admin,
            exp: now.saturating_add(ttl.as_secs()),
            iat: now,
            jti: uuid::Uuid::new_v4().to_string(),
        };

        let token =
            encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(&app.secret))?;
        Ok(token)
    }

    /// Verifies a token against `app` at the current time.
    ///
    /// # Errors
    ///
    /// See [`verify_at`](Self::verify_at).
    pub fn verify(&self, token: &str, app: &Application) -> Result<SessionClaims, TokenError> {
        self.verify_at(token, app, unix_now())
    }

    /// Verifies a token against `app` as of `now` (seconds since epoch).
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - the token is malformed
    /// - the algorithm is not `HS256`
    /// - the signature does not match the application's secret
    /// - `exp <= now - leeway`
    /// - the token names a different application
    pub fn verify_at(
        &self,
        token: &str,
        app: &Application,
        now: u64,
    ) -> Result<SessionClaims, TokenError> {
        validate_algorithm(&peek_algorithm(token)?)?;

        if app.secret.is_empty() {
            return Err(TokenError::InvalidSignature);
        }

        // Expiry is checked below with an inclusive bound.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let claims =
            decode::<SessionClaims>(token, &DecodingKey::from_secret(&app.secret), &validation)?
                .claims;

        if claims.exp <= now.saturating_sub(self.leeway.as_secs()) {
            return Err(TokenError::TokenExpired);
        }

        if claims.app_id != app.id {
            return Err(TokenError::ApplicationMismatch { expected: app.id, actual: claims.app_id });
        }

        Ok(claims)
    }

    /// Looks the token's application up in `apps`, then verifies against it.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::UnknownApplication`] if the application does
    /// not exist, [`TokenError::KeyStorage`] if the lookup fails, and any
    /// error from [`verify`](Self::verify).
    #[tracing::instrument(skip(self, token, apps))]
    pub async fn verify_with_store<P>(
        &self,
        token: &str,
        apps: &P,
    ) -> Result<SessionClaims, TokenError>
    where
        P: AppProvider + ?Sized,
    {
        let unverified = decode_claims_unverified(token)?;

        let app = apps.get_application(unverified.app_id).await.map_err(|e| {
            if e.is_not_found() {
                TokenError::UnknownApplication(unverified.app_id)
            } else {
                tracing::warn!(app_id = %unverified.app_id, error = %e, "Failed to load application");
                TokenError::KeyStorage(e)
            }
        })?;

        self.verify(token, &app)
    }
}

fn split_token(token: &str) -> Result<[&str; 3], TokenError> {
    let mut parts = token.split('.');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(header), Some(payload), Some(signature), None) => Ok([header, payload, signature]),
        _ => Err(TokenError::InvalidTokenFormat("JWT must have 3 parts separated by dots".into())),
    }
}

/// Reads the raw `alg` header without interpreting it, so `none` and
/// algorithms unknown to the decoder are reported as unsupported rather
/// than malformed.
fn peek_algorithm(token: &str) -> Result<String, TokenError> {
    #[derive(Deserialize)]
    struct RawHeader {
        alg: String,
    }

    let [header, _, _] = split_token(token)?;
    let bytes = URL_SAFE_NO_PAD.decode(header).map_err(|e| {
        TokenError::InvalidTokenFormat(format!("Failed to decode JWT header: {e}"))
    })?;
    let raw: RawHeader = serde_json::from_slice(&bytes)
        .map_err(|e| TokenError::InvalidTokenFormat(format!("Failed to parse JWT header: {e}")))?;

    Ok(raw.alg)
}

/// Decodes claims without verifying the signature.
///
/// Used to learn which application's secret to verify with. The result
/// must not be trusted until [`TokenIssuer::verify`] succeeds.
///
/// # Errors
///
/// Returns [`TokenError::InvalidTokenFormat`] if the token does not have
/// three parts or the payload is not valid base64url JSON claims.
pub fn decode_claims_unverified(token: &str) -> Result<SessionClaims, TokenError> {
    let [_, payload, _] = split_token(token)?;

    let payload_bytes = URL_SAFE_NO_PAD.decode(payload).map_err(|e| {
        TokenError::InvalidTokenFormat(format!("Failed to decode JWT payload: {e}"))
    })?;

    serde_json::from_slice(&payload_bytes)
        .map_err(|e| TokenError::InvalidTokenFormat(format!("Failed to parse JWT claims: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use sso_storage::{MemoryCredentialStore, StorageError};

    use super::*;

    const T0: u64 = 1_700_000_000;
    const TTL: Duration = Duration::from_secs(3600);

    fn app(id: i64, secret: &[u8]) -> Application {
        Application::new(AppId::from(id), format!("app-{id}"), secret.to_vec())
    }

    fn user() -> User {
        User::new(UserId::from(7), "u@example.com", b"hash".to_vec())
    }

    #[test]
    fn test_issue_and_verify() {
        let issuer = TokenIssuer::default();
        let app = app(1, b"secret-1");

        let token = issuer.issue_at(&user(), &app, true, TTL, T0).expect("issue");
        let claims = issuer.verify_at(&token, &app, T0 + 1).expect("verify");

        assert_eq!(claims.sub, UserId::from(7));
        assert_eq!(claims.app_id, AppId::from(1));
        assert!(claims.admin);
        assert_eq!(claims.iat, T0);
        assert_eq!(claims.exp, T0 + 3600);
        assert!(uuid::Uuid::parse_str(&claims.jti).is_ok());
    }

    #[test]
    fn test_expiry_boundary_is_inclusive() {
        let issuer = TokenIssuer::default();
        let app = app(1, b"secret-1");
        let token = issuer.issue_at(&user(), &app, false, TTL, T0).expect("issue");

        assert!(issuer.verify_at(&token, &app, T0 + 3599).is_ok());
        assert!(matches!(issuer.verify_at(&token, &app, T0 + 3600), Err(TokenError::TokenExpired)));
        assert!(matches!(issuer.verify_at(&token, &app, T0 + 3601), Err(TokenError::TokenExpired)));
    }

    #[test]
    fn test_leeway_extends_validity() {
        let issuer = TokenIssuer::new(Duration::from_secs(30));
        let app = app(1, b"secret-1");
        let token = issuer.issue_at(&user(), &app, false, TTL, T0).expect("issue");

        assert!(issuer.verify_at(&token, &app, T0 + 3600 + 29).is_ok());
        assert!(matches!(
            issuer.verify_at(&token, &app, T0 + 3600 + 30),
            Err(TokenError::TokenExpired)
        ));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issuer = TokenIssuer::default();
        let token = issuer.issue_at(&user(), &app(1, b"secret-1"), false, TTL, T0).expect("issue");

        let result = issuer.verify_at(&token, &app(1, b"other-secret"), T0);

        assert!(matches!(result, Err(TokenError::InvalidSignature)));
    }

    #[test]
    fn test_application_mismatch_rejected() {
        let issuer = TokenIssuer::default();
        let token = issuer.issue_at(&user(), &app(1, b"shared"), false, TTL, T0).expect("issue");

        let result = issuer.verify_at(&token, &app(2, b"shared"), T0);

        assert!(matches!(
            result,
            Err(TokenError::ApplicationMismatch { expected, actual })
                if expected == AppId::from(2) && actual == AppId::from(1)
        ));
    }

    #[test]
    fn test_empty_secret_cannot_sign() {
        let result = TokenIssuer::default().issue_at(&user(), &app(1, b""), false, TTL, T0);

        assert!(matches!(result, Err(AuthError::SigningFailure { .. })));
    }

    #[test]
    fn test_jti_unique_per_token() {
        let issuer = TokenIssuer::default();
        let app = app(1, b"secret-1");

        let a = issuer.issue_at(&user(), &app, false, TTL, T0).expect("a");
        let b = issuer.issue_at(&user(), &app, false, TTL, T0).expect("b");

        assert_ne!(a, b);
        assert_ne!(
            decode_claims_unverified(&a).expect("a").jti,
            decode_claims_unverified(&b).expect("b").jti
        );
    }

    #[test]
    fn test_decode_claims_unverified_rejects_malformed() {
        for token in ["", "a.b", "a.b.c.d", "a.!!!.c"] {
            assert!(
                matches!(decode_claims_unverified(token), Err(TokenError::InvalidTokenFormat(_))),
                "expected format error for {token:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_verify_with_store() {
        let issuer = TokenIssuer::default();
        let store = MemoryCredentialStore::new();
        let app = app(3, b"store-secret");
        store.insert_application(app.clone());

        let token = issuer.issue(&user(), &app, false, TTL).expect("issue");
        let claims = issuer.verify_with_store(&token, &store).await.expect("verify");
        assert_eq!(claims.app_id, AppId::from(3));

        let orphan = issuer.issue(&user(), &self::app(9, b"gone"), false, TTL).expect("issue");
        let result = issuer.verify_with_store(&orphan, &store).await;
        assert!(matches!(result, Err(TokenError::UnknownApplication(id)) if id == AppId::from(9)));
    }

    #[test]
    fn test_key_storage_error_wraps_source() {
        let err = TokenError::KeyStorage(StorageError::timeout());
        assert_eq!(err.to_string(), "Key storage error: Operation timeout");
    }
}
