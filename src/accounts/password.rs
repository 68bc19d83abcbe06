use argon2::{
    password_hash::{
        Error as PhcError, PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
    },
    Algorithm, Argon2, Params, ParamsBuilder, Version,
};
use rand::rngs::OsRng;
use tracing::error;

/// Longest accepted plaintext. Longer inputs are rejected, never truncated.
pub const MAX_PASSWORD_BYTES: usize = 72;

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("invalid hashing parameters: {0}")]
    InvalidParams(String),

    #[error("password exceeds {} bytes", MAX_PASSWORD_BYTES)]
    TooLong,

    #[error("failed to hash password: {0}")]
    Hash(String),

    #[error("invalid password hash format: {0}")]
    InvalidHash(String),

    #[error("password does not match")]
    Mismatch,
}

/// Argon2id work factors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashingConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashingConfig {
    // OWASP baseline for Argon2id
    fn default() -> Self {
        Self {
            memory_kib: 19 * 1024,
            iterations: 2,
            parallelism: 1,
        }
    }
}

/// Hashes and verifies account passwords.
#[derive(Debug, Clone)]
pub struct CredentialHasher {
    params: Params,
    // hashed once with `params`; verified against when no account matches
    dummy_hash: String,
}

impl CredentialHasher {
    pub fn new(cfg: HashingConfig) -> Result<Self, PasswordError> {
        let params = ParamsBuilder::new()
            .m_cost(cfg.memory_kib)
            .t_cost(cfg.iterations)
            .p_cost(cfg.parallelism)
            .build()
            .map_err(|e| {
                error!(error = %e, ?cfg, "argon2 params rejected");
                PasswordError::InvalidParams(e.to_string())
            })?;
        let mut hasher = Self {
            params,
            dummy_hash: String::new(),
        };
        hasher.dummy_hash = hasher.hash("dummy-password-for-timing")?;
        Ok(hasher)
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Returns a PHC string (`$argon2id$v=19$...`) with a fresh random salt.
    pub fn hash(&self, plain: &str) -> Result<String, PasswordError> {
        if plain.len() > MAX_PASSWORD_BYTES {
            return Err(PasswordError::TooLong);
        }
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| {
                error!(error = %e, "argon2 hash_password error");
                PasswordError::Hash(e.to_string())
            })?
            .to_string();
        Ok(hash)
    }

    /// Checks `plain` against a stored hash. The work factors encoded in the
    /// hash are used, so hashes made under older settings still verify.
    pub fn verify(&self, hash: &str, plain: &str) -> Result<(), PasswordError> {
        let parsed = PasswordHash::new(hash).map_err(|e| {
            error!(error = %e, "argon2 parse hash error");
            PasswordError::InvalidHash(e.to_string())
        })?;
        match self.argon2().verify_password(plain.as_bytes(), &parsed) {
            Ok(()) => Ok(()),
            Err(PhcError::Password) => Err(PasswordError::Mismatch),
            Err(e) => {
                error!(error = %e, "argon2 verify_password error");
                Err(PasswordError::Hash(e.to_string()))
            }
        }
    }

    /// Spends the same work as a real `verify` when there is no stored hash to
    /// check, so a missing account costs as much as a wrong password.
    pub fn verify_dummy(&self, plain: &str) {
        let _ = self.verify(&self.dummy_hash, plain);
    }
}

#[cfg(test)]
pub(crate) fn test_hasher() -> CredentialHasher {
    CredentialHasher::new(HashingConfig {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    })
    .expect("test params are valid")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let hasher = test_hasher();
        let password = "Secur3P@ssw0rd!";
        let hash = hasher.hash(password).expect("hashing should succeed");
        assert!(hash.starts_with("$argon2id$"));
        hasher.verify(&hash, password).expect("verify should succeed");
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let hasher = test_hasher();
        let hash = hasher.hash("correct-horse-battery-staple").unwrap();
        let err = hasher.verify(&hash, "wrong-password").unwrap_err();
        assert!(matches!(err, PasswordError::Mismatch));
    }

    #[test]
    fn hash_is_salted_and_never_plaintext() {
        let hasher = test_hasher();
        let a = hasher.hash("secret1").unwrap();
        let b = hasher.hash("secret1").unwrap();
        assert_ne!(a, "secret1");
        assert_ne!(a, b);
        hasher.verify(&b, "secret1").unwrap();
    }

    #[test]
    fn verify_errors_on_malformed_hash() {
        let err = test_hasher()
            .verify("not-a-valid-hash", "anything")
            .unwrap_err();
        assert!(matches!(err, PasswordError::InvalidHash(_)));
    }

    #[test]
    fn rejects_password_over_limit() {
        let hasher = test_hasher();
        assert!(hasher.hash(&"a".repeat(MAX_PASSWORD_BYTES)).is_ok());
        let err = hasher.hash(&"a".repeat(MAX_PASSWORD_BYTES + 1)).unwrap_err();
        assert!(matches!(err, PasswordError::TooLong));
    }

    #[test]
    fn rejects_out_of_range_work_factor() {
        let err = CredentialHasher::new(HashingConfig {
            memory_kib: 1024,
            iterations: 0,
            parallelism: 1,
        })
        .unwrap_err();
        assert!(matches!(err, PasswordError::InvalidParams(_)));
    }

    #[test]
    fn dummy_hash_uses_configured_params() {
        let hasher = test_hasher();
        assert!(hasher.dummy_hash.starts_with("$argon2id$v=19$m=1024,t=1,p=1$"));
        let err = hasher.verify(&hasher.dummy_hash, "secret1").unwrap_err();
        assert!(matches!(err, PasswordError::Mismatch));
        hasher.verify_dummy("secret1");
    }

    #[test]
    fn verifies_hash_made_with_other_params() {
        let strong = CredentialHasher::new(HashingConfig {
            memory_kib: 2048,
            iterations: 2,
            parallelism: 1,
        })
        .unwrap();
        let hash = strong.hash("newpass1").unwrap();
        test_hasher().verify(&hash, "newpass1").unwrap();
    }
}
