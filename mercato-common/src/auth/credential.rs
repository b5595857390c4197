use argon2::{Algorithm, Argon2, Params, Version};
use subtle::ConstantTimeEq;
use thiserror::Error;
use zeroize::Zeroizing;

use crate::utils::security::generate_salt;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Invalid credential parameters: {0}")]
    InvalidParameters(String),

    #[error("Credential derivation failed: {0}")]
    DerivationFailed(String),
}

/// A way of turning a password into a stored credential and checking
/// candidates against it.
///
/// Stored credentials are self-describing (they start with the scheme name),
/// so [`verify`] can pick the right scheme without the caller knowing which
/// one produced the credential.
pub trait CredentialScheme {
    fn name(&self) -> &'static str;

    fn derive(&self, password: &str) -> Result<String, CredentialError>;

    fn verify(&self, stored: &str, candidate: &str) -> bool;
}

const ARGON2_PREFIX: &str = "argon2id";
const HASH_LEN: usize = 32;
// Stored parameters come from disk; refuse anything that would make
// verification allocate or spin without bound.
const MAX_MEMORY_KIB: u32 = 1 << 20;
const MAX_ITERATIONS: u32 = 16;

/// Salted Argon2id.
///
/// Encoded as `argon2id$<memory>$<iterations>$<parallelism>$<salt hex>$<hash hex>`.
/// Parameters travel with the credential, so changing the defaults never
/// invalidates existing accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Argon2Scheme {
    pub memory: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for Argon2Scheme {
    fn default() -> Self {
        Self {
            memory: 19_456, // KiB
            iterations: 2,
            parallelism: 1,
        }
    }
}

impl Argon2Scheme {
    pub fn new(memory: u32, iterations: u32, parallelism: u32) -> Self {
        Self {
            memory,
            iterations,
            parallelism,
        }
    }

    /// Minimal-cost parameters for tests and throwaway data.
    pub fn fast() -> Self {
        Self::new(256, 1, 1)
    }

    fn hash(&self, password: &[u8], salt: &[u8]) -> Result<[u8; HASH_LEN], CredentialError> {
        let params = Params::new(self.memory, self.iterations, self.parallelism, Some(HASH_LEN))
            .map_err(|e| CredentialError::InvalidParameters(e.to_string()))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let mut out = [0u8; HASH_LEN];
        argon2
            .hash_password_into(password, salt, &mut out)
            .map_err(|e| CredentialError::DerivationFailed(e.to_string()))?;
        Ok(out)
    }

    fn parse(stored: &str) -> Option<(Self, Vec<u8>, Vec<u8>)> {
        let mut parts = stored.split('$');
        if parts.next()? != ARGON2_PREFIX {
            return None;
        }
        let memory = parts.next()?.parse().ok()?;
        let iterations = parts.next()?.parse().ok()?;
        let parallelism = parts.next()?.parse().ok()?;
        if memory > MAX_MEMORY_KIB || iterations > MAX_ITERATIONS {
            return None;
        }
        let salt = hex::decode(parts.next()?).ok()?;
        let hash = hex::decode(parts.next()?).ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some((Self::new(memory, iterations, parallelism), salt, hash))
    }
}

impl CredentialScheme for Argon2Scheme {
    fn name(&self) -> &'static str {
        ARGON2_PREFIX
    }

    fn derive(&self, password: &str) -> Result<String, CredentialError> {
        let password = Zeroizing::new(password.as_bytes().to_vec());
        let salt = generate_salt();
        let hash = self.hash(&password, &salt)?;

        Ok(format!(
            "{}${}${}${}${}${}",
            ARGON2_PREFIX,
            self.memory,
            self.iterations,
            self.parallelism,
            hex::encode(salt),
            hex::encode(hash)
        ))
    }

    fn verify(&self, stored: &str, candidate: &str) -> bool {
        let Some((params, salt, expected)) = Self::parse(stored) else {
            return false;
        };
        let candidate = Zeroizing::new(candidate.as_bytes().to_vec());
        match params.hash(&candidate, &salt) {
            Ok(actual) => actual[..].ct_eq(&expected[..]).into(),
            Err(_) => false,
        }
    }
}

/// Checks `candidate` against a stored credential of any known scheme.
/// Unknown or malformed credentials never authenticate.
pub fn verify(stored: &str, candidate: &str) -> bool {
    let argon2 = Argon2Scheme::default();
    stored.split('$').next() == Some(argon2.name()) && argon2.verify(stored, candidate)
}
