//! Padded base64url encoding, as used for Fernet tokens and keys.

use base64ct::{Base64Url, Encoding};

use crate::error::CryptoError;

/// Base64url encode bytes with padding.
pub fn base64url_encode(data: &[u8]) -> String {
    Base64Url::encode_string(data)
}

/// Base64url decode a padded string to bytes.
pub fn base64url_decode(s: &str) -> Result<Vec<u8>, CryptoError> {
    Base64Url::decode_vec(s).map_err(|e| CryptoError::InvalidEncoding(e.to_string()))
}
