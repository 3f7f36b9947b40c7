//! Decryption of encrypted callback bodies.
//!
//! When an encrypt key is configured the platform posts `{"encrypt": "..."}`,
//! where the value is `base64(iv ++ AES-256-CBC(sha256(key), iv, body))` with
//! PKCS#7 padding.

use crate::error::{AppError, Result};
use aes::Aes256;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, KeyIvInit};
use sha2::{Digest, Sha256};

type Aes256CbcDec = cbc::Decryptor<Aes256>;

const IV_LEN: usize = 16;

/// Cipher for the `encrypt` field of callback envelopes
#[derive(Clone)]
pub struct EventCipher {
    key: [u8; 32],
}

impl std::fmt::Debug for EventCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventCipher").finish_non_exhaustive()
    }
}

impl EventCipher {
    pub fn new(encrypt_key: &str) -> Self {
        Self {
            key: Sha256::digest(encrypt_key.as_bytes()).into(),
        }
    }

    /// Cipher for a configured key, `None` when the key is empty
    pub fn from_key(encrypt_key: &str) -> Option<Self> {
        (!encrypt_key.is_empty()).then(|| Self::new(encrypt_key))
    }

    /// Decrypt an `encrypt` field into the plain JSON body
    pub fn decrypt(&self, encrypted: &str) -> Result<Vec<u8>> {
        let raw = STANDARD
            .decode(encrypted.trim())
            .map_err(|e| AppError::Decode(format!("encrypted body is not base64: {}", e)))?;

        if raw.len() <= IV_LEN || (raw.len() - IV_LEN) % IV_LEN != 0 {
            return Err(AppError::Decode("encrypted body has an invalid length".to_string()));
        }
        let (iv, ciphertext) = raw.split_at(IV_LEN);

        Aes256CbcDec::new_from_slices(&self.key, iv)
            .map_err(|e| AppError::Decode(format!("invalid cipher parameters: {}", e)))?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|_| AppError::Decode("failed to decrypt body".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cbc::cipher::BlockEncryptMut;

    fn encrypt(key: &str, iv: [u8; 16], plaintext: &[u8]) -> String {
        let key: [u8; 32] = Sha256::digest(key.as_bytes()).into();
        let ciphertext = cbc::Encryptor::<Aes256>::new(&key.into(), &iv.into())
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext);
        STANDARD.encode([iv.as_slice(), ciphertext.as_slice()].concat())
    }

    #[test]
    fn test_decrypts_platform_body() {
        let body = br#"{"type":"url_verification","challenge":"abc"}"#;
        let encrypted = encrypt("encrypt-key", [7u8; 16], body);

        let cipher = EventCipher::new("encrypt-key");
        assert_eq!(cipher.decrypt(&encrypted).unwrap(), body.to_vec());
    }

    #[test]
    fn test_wrong_key_fails() {
        let encrypted = encrypt("encrypt-key", [7u8; 16], br#"{"schema":"2.0"}"#);
        let result = EventCipher::new("other-key").decrypt(&encrypted);
        // a wrong key almost always breaks the padding; if not, the bytes differ
        match result {
            Err(e) => assert!(matches!(e, AppError::Decode(_))),
            Ok(plain) => assert_ne!(plain, br#"{"schema":"2.0"}"#.to_vec()),
        }
    }

    #[test]
    fn test_rejects_malformed_input() {
        let cipher = EventCipher::new("encrypt-key");
        assert!(cipher.decrypt("not base64!").is_err());
        assert!(cipher.decrypt(&STANDARD.encode([0u8; 10])).is_err());
        assert!(cipher.decrypt(&STANDARD.encode([0u8; 20])).is_err());
    }

    #[test]
    fn test_empty_key_disables_cipher() {
        assert!(EventCipher::from_key("").is_none());
        assert!(EventCipher::from_key("k").is_some());
    }
}
