use std::fmt;

use aes_gcm::{
    Aes128Gcm, Aes256Gcm, AesGcm, Nonce,
    aead::{Aead, KeyInit, OsRng, consts::U12, rand_core::RngCore},
    aes::Aes192,
};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use thiserror::Error;

type Aes192Gcm = AesGcm<Aes192, U12>;

/// Length of the random nonce stored in front of every ciphertext.
pub const NONCE_LEN: usize = 12;

/// AES accepts exactly these key lengths (AES-128, AES-192, AES-256).
pub const ACCEPTED_KEY_SIZES: [usize; 3] = [16, 24, 32];

#[derive(Debug, Error)]
pub enum CipherError {
    #[error("crypto/aes: invalid key size {0}")]
    KeySize(usize),
    #[error("error DecodeString: {0}")]
    Encoding(#[from] base64::DecodeError),
    #[error("ciphertext too short: {0} bytes")]
    Truncated(usize),
    #[error("encryption failed")]
    Encrypt,
    #[error("decryption failed: wrong key or corrupted ciphertext")]
    Decrypt,
    #[error("decrypted text is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

enum Engine {
    Aes128(Aes128Gcm),
    Aes192(Aes192Gcm),
    Aes256(Aes256Gcm),
}

impl Engine {
    fn for_key(key: &[u8]) -> Result<Self, CipherError> {
        let engine = match key.len() {
            16 => Aes128Gcm::new_from_slice(key).map(Engine::Aes128),
            24 => Aes192Gcm::new_from_slice(key).map(Engine::Aes192),
            32 => Aes256Gcm::new_from_slice(key).map(Engine::Aes256),
            n => return Err(CipherError::KeySize(n)),
        };
        engine.map_err(|_| CipherError::KeySize(key.len()))
    }

    fn seal(&self, nonce: &[u8; NONCE_LEN], plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
        let nonce = Nonce::from_slice(nonce);
        match self {
            Engine::Aes128(c) => c.encrypt(nonce, plaintext),
            Engine::Aes192(c) => c.encrypt(nonce, plaintext),
            Engine::Aes256(c) => c.encrypt(nonce, plaintext),
        }
        .map_err(|_| CipherError::Encrypt)
    }

    fn open(&self, nonce: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, CipherError> {
        let nonce = Nonce::from_slice(nonce);
        match self {
            Engine::Aes128(c) => c.decrypt(nonce, ciphertext),
            Engine::Aes192(c) => c.decrypt(nonce, ciphertext),
            Engine::Aes256(c) => c.decrypt(nonce, ciphertext),
        }
        .map_err(|_| CipherError::Decrypt)
    }
}

/// Symmetric cipher for password material.
///
/// Stored form is `base64(nonce || ciphertext || tag)` with a fresh random
/// nonce per call, so encrypting the same password twice yields different
/// strings. Values written by the old fixed-IV scheme cannot be read back.
///
/// The key size is checked on every call rather than at construction, so a
/// misconfigured key surfaces as [`CipherError::KeySize`] from the operation
/// that needed it.
#[derive(Clone)]
pub struct SecretCipher {
    key: Vec<u8>,
}

impl SecretCipher {
    pub fn new(key: impl Into<Vec<u8>>) -> Self {
        Self { key: key.into() }
    }

    /// Fails early if the key cannot be used, without encrypting anything.
    pub fn check_key(&self) -> Result<(), CipherError> {
        Engine::for_key(&self.key).map(|_| ())
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        let engine = Engine::for_key(&self.key)?;

        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);

        let sealed = engine.seal(&nonce, plaintext.as_bytes())?;

        let mut stored = Vec::with_capacity(NONCE_LEN + sealed.len());
        stored.extend_from_slice(&nonce);
        stored.extend_from_slice(&sealed);
        Ok(BASE64.encode(stored))
    }

    pub fn decrypt(&self, encoded: &str) -> Result<String, CipherError> {
        let engine = Engine::for_key(&self.key)?;

        let stored = BASE64.decode(encoded)?;
        if stored.len() < NONCE_LEN {
            return Err(CipherError::Truncated(stored.len()));
        }
        let (nonce, ciphertext) = stored.split_at(NONCE_LEN);

        let plaintext = engine.open(nonce, ciphertext)?;
        Ok(String::from_utf8(plaintext)?)
    }
}

impl fmt::Debug for SecretCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretCipher")
            .field("key_len", &self.key.len())
            .finish_non_exhaustive()
    }
}
