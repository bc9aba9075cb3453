//! # Replied Crypto
//!
//! At-rest sealing of message bodies, replies and contact addresses.
//!
//! Tokens are `hex(nonce || ciphertext || tag)` produced by AES-256-GCM with a
//! fresh 12-byte nonce per call, so sealing the same plaintext twice never
//! yields the same token. Tokens are not usable as lookup keys.

mod vault;

pub use vault::{KEY_LEN, NONCE_LEN, Vault, VaultError};

/// Seal/open seam used by the submission pipeline and read paths
pub trait Sealer: Send + Sync {
    fn seal(&self, plaintext: &str) -> Result<String, VaultError>;
    fn open(&self, token: &str) -> Result<String, VaultError>;
}

impl Sealer for Vault {
    fn seal(&self, plaintext: &str) -> Result<String, VaultError> {
        Vault::seal(self, plaintext)
    }

    fn open(&self, token: &str) -> Result<String, VaultError> {
        Vault::open(self, token)
    }
}
