use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use rand::RngCore;
use rand::rngs::OsRng;
use thiserror::Error;

pub const KEY_LEN: usize = 32;
pub const NONCE_LEN: usize = 12;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VaultError {
    /// Key missing or not 32 bytes of hex
    #[error("vault configuration error: {0}")]
    Configuration(String),

    /// Token is malformed, truncated or failed authentication
    #[error("sealed value failed integrity check: {0}")]
    Integrity(&'static str),

    #[error("encryption failed")]
    Encryption,
}

/// Symmetric AEAD vault holding the single process-wide key
#[derive(Clone)]
pub struct Vault {
    cipher: Aes256Gcm,
}

impl Vault {
    pub fn new(key: &[u8; KEY_LEN]) -> Self {
        Self {
            cipher: Aes256Gcm::new(key.into()),
        }
    }

    /// Create from hex-encoded key string (64 hex characters)
    pub fn from_hex(hex_key: &str) -> Result<Self, VaultError> {
        let hex_key = hex_key.trim();
        if hex_key.is_empty() {
            return Err(VaultError::Configuration("encryption key is not set".into()));
        }
        if hex_key.len() != KEY_LEN * 2 {
            return Err(VaultError::Configuration(format!(
                "encryption key must be {} hex characters, got {}",
                KEY_LEN * 2,
                hex_key.len()
            )));
        }

        let bytes = hex::decode(hex_key)
            .map_err(|e| VaultError::Configuration(format!("invalid hex in encryption key: {e}")))?;
        let key: [u8; KEY_LEN] = bytes
            .try_into()
            .map_err(|_| VaultError::Configuration("key must be exactly 32 bytes".into()))?;

        Ok(Self::new(&key))
    }

    /// Seal plaintext into a hex token: nonce (12 bytes) || ciphertext || tag (16 bytes)
    pub fn seal(&self, plaintext: &str) -> Result<String, VaultError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| VaultError::Encryption)?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);

        Ok(hex::encode(sealed))
    }

    /// Open a token produced by [`Vault::seal`]
    pub fn open(&self, token: &str) -> Result<String, VaultError> {
        let sealed = hex::decode(token).map_err(|_| VaultError::Integrity("token is not hex"))?;
        if sealed.len() < NONCE_LEN {
            return Err(VaultError::Integrity("token shorter than nonce"));
        }

        let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| VaultError::Integrity("authentication failed"))?;

        String::from_utf8(plaintext).map_err(|_| VaultError::Integrity("plaintext is not UTF-8"))
    }
}

impl std::fmt::Debug for Vault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Vault([REDACTED])")
    }
}
