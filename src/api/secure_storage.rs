use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use argon2::password_hash::rand_core::RngCore;
use argon2::Argon2;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};

use super::error::ApiError;
use crate::db::LocalStorage;

const ENCRYPTION_VERSION: u8 = 1;
const SALT_KEY: &str = "journal.vault.salt";

#[derive(Serialize, Deserialize)]
struct EncryptedValue {
    version: u8,
    nonce: String,      // Base64 encoded nonce
    ciphertext: String, // Base64 encoded encrypted data
}

/// Encrypts secrets before they are written to local storage.
///
/// The AES-256 key is derived with Argon2id from a machine identity and a
/// per-install salt kept next to the data, so a copied database file does
/// not decrypt on another machine or account.
pub struct SecureStorage {
    storage: LocalStorage,
    master_key: Vec<u8>,
}

impl SecureStorage {
    pub fn new(storage: LocalStorage) -> Result<Self, ApiError> {
        Self::with_identity(storage, &Self::get_machine_id())
    }

    pub fn with_identity(storage: LocalStorage, machine_id: &str) -> Result<Self, ApiError> {
        let salt = match storage.get_item(SALT_KEY)? {
            Some(salt) => salt,
            None => {
                let mut salt_bytes = [0u8; 16];
                OsRng.fill_bytes(&mut salt_bytes);
                let salt = BASE64.encode(salt_bytes);
                storage.set_item(SALT_KEY, &salt)?;
                salt
            }
        };

        let master_key = Self::derive_key(machine_id, &salt)?;
        Ok(Self { storage, master_key })
    }

    fn get_machine_id() -> String {
        let hostname = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "unknown-host".to_string());

        let username = std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "unknown-user".to_string());

        format!("g-trade-journal-{}-{}", hostname, username)
    }

    fn derive_key(machine_id: &str, salt_b64: &str) -> Result<Vec<u8>, ApiError> {
        use argon2::{Algorithm, Params, Version};

        let salt_bytes = BASE64
            .decode(salt_b64)
            .map_err(|e| ApiError::EncryptionError(format!("Invalid salt: {}", e)))?;

        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, Params::default());

        let mut output_key = [0u8; 32];
        argon2
            .hash_password_into(machine_id.as_bytes(), &salt_bytes, &mut output_key)
            .map_err(|e| ApiError::EncryptionError(format!("Key derivation failed: {}", e)))?;

        Ok(output_key.to_vec())
    }

    fn cipher(&self) -> Result<Aes256Gcm, ApiError> {
        Aes256Gcm::new_from_slice(&self.master_key)
            .map_err(|e| ApiError::EncryptionError(format!("Failed to create cipher: {}", e)))
    }

    /// Encrypt and store a value
    pub fn store(&self, key: &str, value: &str) -> Result<(), ApiError> {
        let mut nonce_bytes = [0u8; 12];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self.cipher()?.encrypt(nonce, value.as_bytes())?;

        let record = EncryptedValue {
            version: ENCRYPTION_VERSION,
            nonce: BASE64.encode(nonce_bytes),
            ciphertext: BASE64.encode(&ciphertext),
        };
        self.storage.set_item(key, &serde_json::to_string(&record)?)
    }

    /// Decrypt a stored value, `None` when nothing is stored under `key`
    pub fn retrieve(&self, key: &str) -> Result<Option<String>, ApiError> {
        let Some(raw) = self.storage.get_item(key)? else {
            return Ok(None);
        };

        let record: EncryptedValue = serde_json::from_str(&raw)
            .map_err(|e| ApiError::EncryptionError(format!("Corrupt record '{}': {}", key, e)))?;
        if record.version != ENCRYPTION_VERSION {
            return Err(ApiError::EncryptionError(format!(
                "Unsupported record version {}",
                record.version
            )));
        }

        let nonce_bytes = BASE64
            .decode(&record.nonce)
            .map_err(|e| ApiError::EncryptionError(format!("Invalid nonce: {}", e)))?;
        if nonce_bytes.len() != 12 {
            return Err(ApiError::EncryptionError("Invalid nonce length".to_string()));
        }
        let ciphertext = BASE64
            .decode(&record.ciphertext)
            .map_err(|e| ApiError::EncryptionError(format!("Invalid ciphertext: {}", e)))?;

        let plaintext = self
            .cipher()?
            .decrypt(Nonce::from_slice(&nonce_bytes), ciphertext.as_ref())?;

        String::from_utf8(plaintext)
            .map(Some)
            .map_err(|e| ApiError::EncryptionError(format!("Invalid UTF-8: {}", e)))
    }

    pub fn delete(&self, key: &str) -> Result<(), ApiError> {
        self.storage.remove_item(key)
    }
}
