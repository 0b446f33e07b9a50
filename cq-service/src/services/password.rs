//! Password hashing as an opaque `hash(password, salt) -> bytes` capability.

use anyhow::anyhow;
use argon2::Argon2;
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use subtle::ConstantTimeEq;

use super::error::ServiceError;

const SALT_LENGTH: usize = 32;
const KEY_LENGTH: usize = 32;
const GENERATED_PASSWORD_LENGTH: usize = 16;

/// A freshly derived credential pair, stored verbatim on the user row.
pub struct PasswordHash {
    pub hash: Vec<u8>,
    pub salt: Vec<u8>,
}

/// Derives and verifies password hashes with Argon2id.
///
/// Policy: at least 8 characters, containing a lower case character, an upper
/// case character and a digit.
#[derive(Clone, Default)]
pub struct EncryptionService;

impl EncryptionService {
    fn derive(&self, password: &[u8], salt: &[u8]) -> Result<Vec<u8>, ServiceError> {
        let mut key = vec![0u8; KEY_LENGTH];
        Argon2::default()
            .hash_password_into(password, salt, &mut key)
            .map_err(|e| ServiceError::Internal(anyhow!("Password hashing failed: {e}")))?;
        Ok(key)
    }

    /// Hash a password with a fresh random salt, enforcing the policy.
    pub fn hash_password(&self, password: &str) -> Result<PasswordHash, ServiceError> {
        if password.chars().count() < 8 {
            return Err(ServiceError::InvalidPasswordLength);
        }
        let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
        let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
        let has_digit = password.chars().any(|c| c.is_ascii_digit());
        if !(has_lower && has_upper && has_digit) {
            return Err(ServiceError::InvalidPasswordFormat);
        }

        let mut salt = vec![0u8; SALT_LENGTH];
        rand::thread_rng().fill_bytes(&mut salt);
        let hash = self.derive(password.as_bytes(), &salt)?;
        Ok(PasswordHash { hash, salt })
    }

    /// Constant-time comparison of a candidate password against stored bytes.
    pub fn verify_password(
        &self,
        password: &str,
        hash: &[u8],
        salt: &[u8],
    ) -> Result<bool, ServiceError> {
        let derived = self.derive(password.as_bytes(), salt)?;
        Ok(derived.as_slice().ct_eq(hash).into())
    }

    /// Random policy-conforming password for invited users.
    pub fn generate_password(&self) -> String {
        const LOWER: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
        const UPPER: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
        const DIGIT: &[u8] = b"0123456789";
        const ALL: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

        let mut rng = rand::thread_rng();
        let mut chars: Vec<u8> = vec![
            LOWER[rng.gen_range(0..LOWER.len())],
            UPPER[rng.gen_range(0..UPPER.len())],
            DIGIT[rng.gen_range(0..DIGIT.len())],
        ];
        while chars.len() < GENERATED_PASSWORD_LENGTH {
            chars.push(ALL[rng.gen_range(0..ALL.len())]);
        }
        chars.shuffle(&mut rng);
        chars.into_iter().map(char::from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_round_trip() {
        let service = EncryptionService;
        let hashed = service.hash_password("Sup3rSecret").unwrap();
        assert!(service
            .verify_password("Sup3rSecret", &hashed.hash, &hashed.salt)
            .unwrap());
        assert!(!service
            .verify_password("Sup3rSecres", &hashed.hash, &hashed.salt)
            .unwrap());
    }

    #[test]
    fn rejects_short_passwords() {
        let service = EncryptionService;
        assert!(matches!(
            service.hash_password("Ab1"),
            Err(ServiceError::InvalidPasswordLength)
        ));
    }

    #[test]
    fn rejects_weak_passwords() {
        let service = EncryptionService;
        assert!(matches!(
            service.hash_password("alllowercase1"),
            Err(ServiceError::InvalidPasswordFormat)
        ));
        assert!(matches!(
            service.hash_password("NoDigitsHere"),
            Err(ServiceError::InvalidPasswordFormat)
        ));
    }

    #[test]
    fn generated_passwords_satisfy_the_policy() {
        let service = EncryptionService;
        for _ in 0..16 {
            let password = service.generate_password();
            assert!(service.hash_password(&password).is_ok());
        }
    }
}
