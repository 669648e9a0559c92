use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

use crate::core::{AppError, AppErrorType};

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("stored hash could not be parsed: {0}")]
    MalformedHash(String),
    #[error("bcrypt verification failed: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),
}

/// A stored password as found in the `users.password` column.
///
/// Accounts created by the earlier system may still hold the password in
/// clear text; those are upgraded on the next successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    Plaintext(String),
    Hashed(String),
}

impl Credential {
    pub fn from_stored(stored: &str) -> Self {
        if stored.starts_with("$argon2") || stored.starts_with("$2") {
            Credential::Hashed(stored.to_string())
        } else {
            Credential::Plaintext(stored.to_string())
        }
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, Credential::Plaintext(_))
    }

    pub fn verify(&self, candidate: &str) -> Result<bool, CredentialError> {
        match self {
            Credential::Plaintext(stored) => Ok(stored == candidate),
            // bcrypt hashes were written by the earlier system
            Credential::Hashed(hash) if hash.starts_with("$2") => {
                Ok(bcrypt::verify(candidate, hash)?)
            }
            Credential::Hashed(hash) => {
                let parsed = PasswordHash::new(hash)
                    .map_err(|e| CredentialError::MalformedHash(e.to_string()))?;
                match Argon2::default().verify_password(candidate.as_bytes(), &parsed) {
                    Ok(()) => Ok(true),
                    Err(argon2::password_hash::Error::Password) => Ok(false),
                    Err(e) => Err(CredentialError::MalformedHash(e.to_string())),
                }
            }
        }
    }
}

pub fn hash_password(plain: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            tracing::error!("Failed to hash password: {:?}", e);
            AppError {
                error_type: AppErrorType::HashingFailed,
                message: Some("Failed to hash password".to_string()),
                cause: Some(e.to_string()),
            }
        })
}
