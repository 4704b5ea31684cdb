use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};

use crate::errors::CoreError;

use super::encryption::{self, KdfParams, SALT_LEN};
use super::format::{SnapshotHeader, CURRENT_VERSION};

/// Saves and restores store contents as passphrase-encrypted snapshots.
///
/// Flow: value → bincode → AES-256-GCM(Argon2id(passphrase, salt)) → STKD frame.
/// Every save draws a new salt and nonce.
pub struct SnapshotManager;

impl SnapshotManager {
    /// Encrypt `value` with the default KDF cost.
    pub fn save_to_bytes<T: Serialize>(value: &T, passphrase: &str) -> Result<Vec<u8>, CoreError> {
        Self::save_with_params(value, passphrase, KdfParams::default())
    }

    /// Encrypt `value` with explicit KDF cost parameters.
    pub fn save_with_params<T: Serialize>(
        value: &T,
        passphrase: &str,
        kdf: KdfParams,
    ) -> Result<Vec<u8>, CoreError> {
        kdf.validate()?;
        let plaintext = bincode::serialize(value)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize snapshot: {e}")))?;

        let salt = encryption::random_bytes::<SALT_LEN>()?;
        let key = encryption::derive_key(passphrase, &salt, &kdf)?;
        let (nonce, ciphertext) = encryption::seal(&plaintext, &key)?;

        let header = SnapshotHeader {
            version: CURRENT_VERSION,
            kdf,
            salt,
            nonce,
        };
        Ok(header.encode(&ciphertext))
    }

    /// Decrypt and deserialize a snapshot produced by `save_to_bytes`.
    pub fn load_from_bytes<T: DeserializeOwned>(data: &[u8], passphrase: &str) -> Result<T, CoreError> {
        let (header, ciphertext) = SnapshotHeader::decode(data)?;
        let key = encryption::derive_key(passphrase, &header.salt, &header.kdf)?;
        let plaintext = encryption::open(ciphertext, &key, &header.nonce)?;
        bincode::deserialize(&plaintext)
            .map_err(|e| CoreError::Deserialization(format!("Failed to deserialize snapshot: {e}")))
    }

    pub fn save_to_file<T: Serialize>(
        value: &T,
        path: impl AsRef<Path>,
        passphrase: &str,
    ) -> Result<(), CoreError> {
        let bytes = Self::save_to_bytes(value, passphrase)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    pub fn load_from_file<T: DeserializeOwned>(
        path: impl AsRef<Path>,
        passphrase: &str,
    ) -> Result<T, CoreError> {
        let bytes = std::fs::read(path)?;
        Self::load_from_bytes(&bytes, passphrase)
    }
}
