//! Chat Crypto Library
//!
//! Reversible encryption of credential material stored in the `users` table.
//! The key is process-wide and never rotated: everything encrypted under one
//! key can only be read back with that same key.

pub mod cipher;

pub use cipher::{CipherError, SecretCipher};
