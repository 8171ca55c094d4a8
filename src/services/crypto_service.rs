//! Symmetric encryption for data kept on the local disk.
//!
//! The only consumer is the session store. Its key mixes a per-database salt
//! with a secret held outside the database; without that secret the key can
//! be rebuilt from the file itself and the seal is obfuscation only.

use ring::aead::{self, Aad, BoundKey, Nonce, NonceSequence, UnboundKey, AES_256_GCM};
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};
use std::num::NonZeroU32;
use zeroize::Zeroize;

use crate::types::credential::EncryptedData;
use crate::types::errors::CryptoError;

/// PBKDF2 iteration count for key derivation.
const PBKDF2_ITERATIONS: u32 = 100_000;

/// AES-256-GCM key length in bytes.
const KEY_LENGTH: usize = 32;

/// AES-256-GCM nonce/IV length in bytes.
const NONCE_LENGTH: usize = 12;

/// AES-256-GCM authentication tag length in bytes.
const TAG_LENGTH: usize = 16;

/// Trait defining the cryptographic operations used to protect the persisted session.
pub trait CryptoServiceTrait {
    /// Derives an encryption key from a password and salt using PBKDF2.
    fn derive_key(&self, password: &str, salt: &[u8]) -> Result<Vec<u8>, CryptoError>;

    /// Encrypts plaintext using AES-256-GCM, returning ciphertext, IV, and auth tag.
    fn encrypt_aes256gcm(
        &self,
        plaintext: &[u8],
        key: &[u8],
    ) -> Result<EncryptedData, CryptoError>;

    /// Decrypts data encrypted with AES-256-GCM.
    fn decrypt_aes256gcm(
        &self,
        encrypted: &EncryptedData,
        key: &[u8],
    ) -> Result<Vec<u8>, CryptoError>;

    /// Generates cryptographically secure random bytes of the specified length.
    fn generate_random_bytes(&self, length: usize) -> Result<Vec<u8>, CryptoError>;

    /// Securely clears sensitive data from memory by overwriting with zeros.
    fn zeroize_memory(&self, data: &mut [u8]);
}

/// A nonce sequence that uses a single nonce value.
/// Used for one-shot encryption/decryption operations.
struct SingleNonce {
    nonce: Option<[u8; NONCE_LENGTH]>,
}

impl SingleNonce {
    fn new(nonce_bytes: [u8; NONCE_LENGTH]) -> Self {
        Self {
            nonce: Some(nonce_bytes),
        }
    }
}

impl NonceSequence for SingleNonce {
    fn advance(&mut self) -> Result<Nonce, ring::error::Unspecified> {
        self.nonce
            .take()
            .map(|n| Nonce::assume_unique_for_key(n))
            .ok_or(ring::error::Unspecified)
    }
}

/// AES-256-GCM sealing with PBKDF2-HMAC-SHA256 key derivation, backed by `ring`.
pub struct CryptoService {
    rng: SystemRandom,
}

impl CryptoService {
    /// Creates a new CryptoService instance.
    pub fn new() -> Self {
        Self {
            rng: SystemRandom::new(),
        }
    }
}

impl Default for CryptoService {
    fn default() -> Self {
        Self::new()
    }
}

impl CryptoServiceTrait for CryptoService {
    fn derive_key(&self, password: &str, salt: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let iterations = NonZeroU32::new(PBKDF2_ITERATIONS)
            .ok_or_else(|| CryptoError::KeyDerivation("Invalid iteration count".to_string()))?;

        let mut key = vec![0u8; KEY_LENGTH];
        pbkdf2::derive(
            pbkdf2::PBKDF2_HMAC_SHA256,
            iterations,
            salt,
            password.as_bytes(),
            &mut key,
        );

        Ok(key)
    }

    fn encrypt_aes256gcm(
        &self,
        plaintext: &[u8],
        key: &[u8],
    ) -> Result<EncryptedData, CryptoError> {
        if key.len() != KEY_LENGTH {
            return Err(CryptoError::InvalidKey(format!(
                "Key must be {} bytes, got {}",
                KEY_LENGTH,
                key.len()
            )));
        }

        let mut nonce_bytes = [0u8; NONCE_LENGTH];
        self.rng
            .fill(&mut nonce_bytes)
            .map_err(|_| CryptoError::RandomGeneration("Failed to generate nonce".to_string()))?;

        let unbound_key = UnboundKey::new(&AES_256_GCM, key)
            .map_err(|_| CryptoError::Encryption("Failed to create encryption key".to_string()))?;

        let nonce_sequence = SingleNonce::new(nonce_bytes);
        let mut sealing_key = aead::SealingKey::new(unbound_key, nonce_sequence);

        let mut in_out = plaintext.to_vec();
        sealing_key
            .seal_in_place_append_tag(Aad::empty(), &mut in_out)
            .map_err(|_| CryptoError::Encryption("Encryption operation failed".to_string()))?;

        // ring appends the tag; store it separately.
        let tag_start = in_out.len() - TAG_LENGTH;
        let auth_tag = in_out[tag_start..].to_vec();
        let ciphertext = in_out[..tag_start].to_vec();

        Ok(EncryptedData {
            ciphertext,
            iv: nonce_bytes.to_vec(),
            auth_tag,
        })
    }

    fn decrypt_aes256gcm(
        &self,
        encrypted: &EncryptedData,
        key: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        if key.len() != KEY_LENGTH {
            return Err(CryptoError::InvalidKey(format!(
                "Key must be {} bytes, got {}",
                KEY_LENGTH,
                key.len()
            )));
        }

        if encrypted.iv.len() != NONCE_LENGTH {
            return Err(CryptoError::Decryption(format!(
                "IV must be {} bytes, got {}",
                NONCE_LENGTH,
                encrypted.iv.len()
            )));
        }

        if encrypted.auth_tag.len() != TAG_LENGTH {
            return Err(CryptoError::Decryption(format!(
                "Auth tag must be {} bytes, got {}",
                TAG_LENGTH,
                encrypted.auth_tag.len()
            )));
        }

        let mut nonce_bytes = [0u8; NONCE_LENGTH];
        nonce_bytes.copy_from_slice(&encrypted.iv);

        let unbound_key = UnboundKey::new(&AES_256_GCM, key)
            .map_err(|_| CryptoError::Decryption("Failed to create decryption key".to_string()))?;

        let nonce_sequence = SingleNonce::new(nonce_bytes);
        let mut opening_key = aead::OpeningKey::new(unbound_key, nonce_sequence);

        let mut in_out = Vec::with_capacity(encrypted.ciphertext.len() + encrypted.auth_tag.len());
        in_out.extend_from_slice(&encrypted.ciphertext);
        in_out.extend_from_slice(&encrypted.auth_tag);

        let plaintext = opening_key
            .open_in_place(Aad::empty(), &mut in_out)
            .map_err(|_| {
                CryptoError::Decryption(
                    "Decryption failed: invalid key or corrupted data".to_string(),
                )
            })?;

        Ok(plaintext.to_vec())
    }

    fn generate_random_bytes(&self, length: usize) -> Result<Vec<u8>, CryptoError> {
        let mut bytes = vec![0u8; length];
        self.rng
            .fill(&mut bytes)
            .map_err(|_| CryptoError::RandomGeneration("System RNG unavailable".to_string()))?;
        Ok(bytes)
    }

    fn zeroize_memory(&self, data: &mut [u8]) {
        data.zeroize();
    }
}
