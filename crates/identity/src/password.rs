use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tracing::warn;

use crate::Result;

/// OWASP recommended Argon2id cost: 64 MiB, 3 passes, 4 lanes.
pub const OWASP_MEMORY_KIB: u32 = 65536;
pub const OWASP_ITERATIONS: u32 = 3;
pub const OWASP_PARALLELISM: u32 = 4;

/// Highest cost a stored credential may ask for before it is refused
/// unverified: 256 MiB, 16 passes, 16 lanes.
pub const MAX_MEMORY_KIB: u32 = 4 * OWASP_MEMORY_KIB;
pub const MAX_ITERATIONS: u32 = 16;
pub const MAX_PARALLELISM: u32 = 16;

/// Produces self-describing Argon2id credentials.
///
/// The cost parameters only matter when hashing: verification reads them back
/// from the stored credential, so raising the cost later does not lock out
/// existing accounts.
#[derive(Debug, Clone)]
pub struct CredentialHasher {
    params: Params,
}

impl CredentialHasher {
    pub fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> Result<Self> {
        if memory_kib > MAX_MEMORY_KIB || iterations > MAX_ITERATIONS || parallelism > MAX_PARALLELISM
        {
            crate::bail!("argon2 cost m={memory_kib},t={iterations},p={parallelism} exceeds the verification ceiling");
        }

        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|e| crate::AuthError::Server(format!("invalid argon2 parameters: {e}")))?;

        Ok(Self { params })
    }

    /// Hash `password` with a fresh random salt.
    ///
    /// Two calls with the same input never return the same string.
    pub fn hash(&self, password: &str) -> Result<String> {
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone());
        let salt = SaltString::generate(&mut OsRng);

        Ok(argon2
            .hash_password(password.as_bytes(), &salt)?
            .to_string())
    }
}

impl Default for CredentialHasher {
    fn default() -> Self {
        let params = Params::new(OWASP_MEMORY_KIB, OWASP_ITERATIONS, OWASP_PARALLELISM, None)
            .unwrap_or_default();

        Self { params }
    }
}

/// Hash a password with the default (OWASP) cost.
pub fn hash_password(password: &str) -> Result<String> {
    CredentialHasher::default().hash(password)
}

/// Check `password` against a stored credential.
///
/// Never fails: a credential that does not parse, names an algorithm other
/// than Argon2, asks for more than the `MAX_*` cost, or trips the primitive
/// in any way is a plain mismatch.
pub fn verify_password(password: &str, credential: &str) -> bool {
    let parsed = match PasswordHash::new(credential) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(error = %e, "stored credential is not a valid PHC string");
            return false;
        }
    };

    match Params::try_from(&parsed) {
        Ok(params)
            if params.m_cost() > MAX_MEMORY_KIB
                || params.t_cost() > MAX_ITERATIONS
                || params.p_cost() > MAX_PARALLELISM =>
        {
            warn!(
                m_cost = params.m_cost(),
                t_cost = params.t_cost(),
                p_cost = params.p_cost(),
                "stored credential cost exceeds the allowed ceiling"
            );
            return false;
        }
        Ok(_) => {}
        Err(e) => {
            warn!(error = %e, algorithm = %parsed.algorithm, "stored credential has unusable parameters");
            return false;
        }
    }

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => true,
        Err(argon2::password_hash::Error::Password) => false,
        Err(e) => {
            warn!(error = %e, algorithm = %parsed.algorithm, "credential verification failed");
            false
        }
    }
}
