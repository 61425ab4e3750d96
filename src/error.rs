use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Invalid key length: expected {expected} bytes, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },

    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("Invalid token encoding: {0}")]
    InvalidEncoding(String),

    #[error("Token too short: expected at least {expected} bytes, got {got}")]
    TokenTooShort { expected: usize, got: usize },

    #[error("Unsupported token version: {0:#04x}")]
    UnsupportedTokenVersion(u8),

    #[error("Invalid ciphertext length: {0} is not a positive multiple of the block size")]
    InvalidCiphertextLength(usize),

    #[error("Token authentication failed")]
    AuthenticationFailed,

    #[error("Token expired: issued at {issued_at}, ttl {ttl} seconds, now {now}")]
    ExpiredToken { issued_at: u64, ttl: u64, now: u64 },

    #[error("Decrypted data is not valid UTF-8")]
    InvalidUtf8,

    #[error("Unsupported config version: expected {expected}, got {got}")]
    UnsupportedConfigVersion { expected: u32, got: u32 },

    #[error("Configuration holds no secret to decrypt")]
    MissingSecret,

    #[error("Random number generation failed: {0}")]
    RngFailed(String),
}
