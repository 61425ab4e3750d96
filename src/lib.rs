//! Config-secret-at-rest encryption.
//!
//! Derives a symmetric key from an application identifier and a stored
//! salt/iteration count (PBKDF2-HMAC-SHA256), then encrypts or decrypts one
//! configuration secret as a Fernet token (AES-128-CBC + HMAC-SHA256).

pub mod base64url;
pub mod config;
pub mod engine;
pub mod error;
pub mod kdf;
pub mod token;

pub use base64url::{base64url_decode, base64url_encode};
pub use config::{EngineConfig, CONFIG_VERSION, DEFAULT_ITERATIONS, SALT_LENGTH};
pub use engine::EncryptionEngine;
pub use error::CryptoError;
pub use kdf::{derive_key, DerivedKey, KEY_LENGTH};
pub use token::{
    issued_at, open, open_with_ttl, seal, FernetKey, IV_LENGTH, TAG_LENGTH, TOKEN_VERSION,
};
