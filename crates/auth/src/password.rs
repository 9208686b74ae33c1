//! Password hashing and verification using Argon2id.

use argon2::{Algorithm, Argon2, Params, Version};
use password_hash::{PasswordHasher as _, PasswordVerifier, SaltString};

use crate::config::{ConfigError, HashCost, PASSWORD_HASH_MEMORY_KIB};
use crate::error::AuthError;

const SALT_LEN: usize = 16;

/// Stored password hash in PHC string format (algorithm, params and salt
/// embedded).
///
/// Deliberately not `Serialize`: the hash must never leave the store boundary.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Wrap a PHC string read back from storage.
    pub fn from_phc(phc: impl Into<String>) -> Self {
        Self(phc.into())
    }

    pub fn as_phc(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("PasswordHash(<redacted>)")
    }
}

/// Salted, deliberately slow one-way password hasher.
///
/// CPU-bound: async callers should run it on the blocking pool.
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl PasswordHasher {
    pub fn new(cost: HashCost) -> Result<Self, ConfigError> {
        let params = Params::new(cost.memory_kib, cost.iterations, cost.parallelism, None)
            .map_err(|e| ConfigError::Invalid {
                key: PASSWORD_HASH_MEMORY_KIB,
                message: format!("argon2 parameters rejected: {e}"),
            })?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Hash a plaintext password with a fresh random salt.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Hashing` only if the OS entropy source or the hasher
    /// itself fails.
    pub fn hash(&self, plaintext: &str) -> Result<PasswordHash, AuthError> {
        let mut salt_bytes = [0u8; SALT_LEN];
        getrandom::getrandom(&mut salt_bytes).map_err(|e| AuthError::Hashing(e.to_string()))?;
        let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| AuthError::Hashing(e.to_string()))?;

        let phc = self
            .argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| AuthError::Hashing(e.to_string()))?
            .to_string();
        Ok(PasswordHash(phc))
    }

    /// Check a plaintext password against a stored hash.
    ///
    /// The digest comparison is constant-time. A malformed stored hash never
    /// verifies; it is not an error.
    pub fn verify(&self, plaintext: &str, hash: &PasswordHash) -> bool {
        let parsed = match password_hash::PasswordHash::new(hash.as_phc()) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(error = %e, "stored password hash is not a valid PHC string");
                return false;
            }
        };
        self.argon2
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }
}

#[cfg(test)]
pub(crate) fn test_hasher() -> PasswordHasher {
    PasswordHasher::new(HashCost {
        memory_kib: 8,
        iterations: 1,
        parallelism: 1,
    })
    .unwrap()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn hash_and_verify() {
        let hasher = test_hasher();
        let hash = hasher.hash("test_password_123").unwrap();

        assert!(hasher.verify("test_password_123", &hash));
        assert!(!hasher.verify("wrong_password", &hash));
        assert!(!hasher.verify("test_password_124", &hash));
    }

    #[test]
    fn salts_differ_per_call() {
        let hasher = test_hasher();
        let a = hasher.hash("password").unwrap();
        let b = hasher.hash("password").unwrap();

        assert_ne!(a, b);
        assert!(hasher.verify("password", &a));
        assert!(hasher.verify("password", &b));
    }

    #[test]
    fn output_is_argon2id_phc_without_plaintext() {
        let hash = test_hasher().hash("hunter2hunter2").unwrap();
        assert!(hash.as_phc().starts_with("$argon2id$"));
        assert!(!hash.as_phc().contains("hunter2"));
        assert_eq!(format!("{hash:?}"), "PasswordHash(<redacted>)");
    }

    #[test]
    fn malformed_hash_fails_to_verify() {
        let hasher = test_hasher();
        assert!(!hasher.verify("password", &PasswordHash::from_phc("invalid_hash")));
        assert!(!hasher.verify("password", &PasswordHash::from_phc("")));
    }

    #[test]
    fn hashes_survive_a_cost_change() {
        let old = test_hasher();
        let hash = old.hash("password").unwrap();

        let new = PasswordHasher::new(HashCost {
            memory_kib: 16,
            iterations: 2,
            parallelism: 1,
        })
        .unwrap();
        assert!(new.verify("password", &hash));
    }

    #[test]
    fn empty_and_long_passwords() {
        let hasher = test_hasher();
        let empty = hasher.hash("").unwrap();
        assert!(hasher.verify("", &empty));
        assert!(!hasher.verify("nonempty", &empty));

        let long = "a".repeat(1000);
        let hash = hasher.hash(&long).unwrap();
        assert!(hasher.verify(&long, &hash));
    }

    #[test]
    fn rejects_invalid_cost() {
        let err = PasswordHasher::new(HashCost {
            memory_kib: 1,
            iterations: 0,
            parallelism: 1,
        });
        assert!(matches!(err, Err(ConfigError::Invalid { .. })));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 16,
            ..ProptestConfig::default()
        })]

        /// Property: a hash verifies its own plaintext and no other.
        #[test]
        fn only_the_hashed_plaintext_verifies(
            password in ".{0,24}",
            other in ".{0,24}",
        ) {
            prop_assume!(password != other);
            let hasher = test_hasher();
            let hash = hasher.hash(&password).unwrap();

            prop_assert!(hasher.verify(&password, &hash));
            prop_assert!(!hasher.verify(&other, &hash));
        }
    }
}
