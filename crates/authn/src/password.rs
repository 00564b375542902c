//! Password hashing.
//!
//! [`Argon2Hasher`] produces Argon2id hashes in PHC string format. Each
//! hash embeds its own random salt and parameters, so hashes produced
//! under an older work factor still verify after the configuration changes.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        self, PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
        rand_core::OsRng,
    },
};

use crate::{
    config::HasherConfig,
    error::{AuthError, ConfigError},
};

/// One-way salted password hashing.
///
/// Both methods are CPU-bound and blocking; async callers should run them
/// on a blocking thread pool.
pub trait PasswordHasher: Send + Sync {
    /// Hashes a plaintext password. Hashing the same password twice yields
    /// different outputs.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::HashingFailure`] if the hasher fails.
    fn hash(&self, password: &str) -> Result<Vec<u8>, AuthError>;

    /// Checks a plaintext password against a stored hash in constant time.
    ///
    /// Returns `Ok(false)` on mismatch.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::HashingFailure`] if the stored hash is malformed.
    fn verify(&self, hash: &[u8], password: &str) -> Result<bool, AuthError>;
}

/// Argon2id password hasher.
///
/// # Examples
///
/// ```
/// use sso_authn::{Argon2Hasher, HasherConfig, PasswordHasher};
///
/// let config = HasherConfig::builder().memory_cost_kib(64).time_cost(1).build();
/// let hasher = Argon2Hasher::new(&config)?;
///
/// let hash = hasher.hash("correct horse")?;
/// assert!(hasher.verify(&hash, "correct horse")?);
/// assert!(!hasher.verify(&hash, "battery staple")?);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone)]
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
}

impl std::fmt::Debug for Argon2Hasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let params = self.argon2.params();
        f.debug_struct("Argon2Hasher")
            .field("memory_cost_kib", &params.m_cost())
            .field("time_cost", &params.t_cost())
            .field("parallelism", &params.p_cost())
            .finish()
    }
}

impl Argon2Hasher {
    /// Creates a hasher with the given work factor.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the parameters are outside Argon2's limits.
    pub fn new(config: &HasherConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let params = Params::new(config.memory_cost_kib, config.time_cost, config.parallelism, None)
            .map_err(|e| ConfigError::Invalid { field: "hasher", reason: e.to_string() })?;

        Ok(Self { argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params) })
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<Vec<u8>, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::hashing_failure(e.to_string()))?;

        Ok(hash.to_string().into_bytes())
    }

    fn verify(&self, hash: &[u8], password: &str) -> Result<bool, AuthError> {
        let encoded = std::str::from_utf8(hash)
            .map_err(|_| AuthError::hashing_failure("stored hash is not valid UTF-8"))?;
        let parsed = PasswordHash::new(encoded)
            .map_err(|e| AuthError::hashing_failure(format!("malformed stored hash: {e}")))?;

        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AuthError::hashing_failure(e.to_string())),
        }
    }
}
