//! Session token algorithm and key validation.
//!
//! Session tokens are signed with a per-application shared secret, so the
//! only accepted algorithm is `HS256`. Every other algorithm, and `none` in
//! particular, is rejected before any signature check runs.

use crate::error::{AuthError, TokenError};

/// Algorithms that are never accepted.
///
/// - `none`: no signature at all
pub const FORBIDDEN_ALGORITHMS: &[&str] = &["none"];

/// Accepted algorithms.
///
/// Only `HS256` is issued, and per RFC 8725 Section 3.1 a verifier must not
/// accept algorithms it does not issue.
pub const ACCEPTED_ALGORITHMS: &[&str] = &["HS256"];

/// Validate a token's `alg` header value.
///
/// # Errors
///
/// Returns [`TokenError::UnsupportedAlgorithm`] if the algorithm is
/// forbidden or not in [`ACCEPTED_ALGORITHMS`].
///
/// # Examples
///
/// ```
/// use sso_authn::validation::validate_algorithm;
///
/// assert!(validate_algorithm("HS256").is_ok());
/// assert!(validate_algorithm("none").is_err());
/// assert!(validate_algorithm("RS256").is_err());
/// ```
pub fn validate_algorithm(alg: &str) -> Result<(), TokenError> {
    if FORBIDDEN_ALGORITHMS.iter().any(|f| f.eq_ignore_ascii_case(alg)) {
        return Err(TokenError::UnsupportedAlgorithm(format!(
            "Algorithm '{alg}' is not allowed for security reasons"
        )));
    }

    if !ACCEPTED_ALGORITHMS.contains(&alg) {
        return Err(TokenError::UnsupportedAlgorithm(format!(
            "Algorithm '{alg}' is not in accepted list (only HS256 is supported)"
        )));
    }

    Ok(())
}

/// Validate an application signing secret before it is used to sign.
///
/// # Errors
///
/// Returns [`AuthError::SigningFailure`] if the secret is empty.
pub fn validate_signing_secret(secret: &[u8]) -> Result<(), AuthError> {
    if secret.is_empty() {
        return Err(AuthError::signing_failure("application signing secret is empty"));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_algorithm_hs256_accepted() {
        assert!(validate_algorithm("HS256").is_ok());
    }

    #[test]
    fn test_validate_algorithm_none_rejected() {
        for alg in ["none", "None", "NONE"] {
            let result = validate_algorithm(alg);
            assert!(
                matches!(result, Err(TokenError::UnsupportedAlgorithm(ref msg)) if msg.contains("not allowed for security reasons")),
                "Expected security rejection for '{alg}'"
            );
        }
    }

    #[test]
    fn test_validate_algorithm_not_in_list() {
        for alg in ["HS384", "HS512", "RS256", "EdDSA"] {
            let result = validate_algorithm(alg);
            assert!(
                matches!(result, Err(TokenError::UnsupportedAlgorithm(ref msg)) if msg.contains("not in accepted list")),
                "Expected rejection for '{alg}'"
            );
        }
    }

    #[test]
    fn test_empty_signing_secret_rejected() {
        let result = validate_signing_secret(b"");
        assert!(matches!(result, Err(AuthError::SigningFailure { .. })));
        assert!(validate_signing_secret(b"k").is_ok());
    }
}
