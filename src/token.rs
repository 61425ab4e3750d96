//! Fernet authenticated-encryption tokens.
//!
//! Token layout (before base64url encoding):
//! [1 byte: version=0x80][8 bytes: timestamp, seconds BE][16 bytes: IV]
//! [N bytes: AES-128-CBC/PKCS7 ciphertext][32 bytes: HMAC-SHA256 tag]
//!
//! The tag covers everything before it. Keys arrive as the padded base64url
//! encoding of 32 bytes: the first 16 decoded bytes sign, the last 16 encrypt.

use aes::Aes128;
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::base64url::{base64url_decode, base64url_encode};
use crate::error::CryptoError;
use crate::kdf::{DerivedKey, KEY_LENGTH};

type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;
type HmacSha256 = Hmac<Sha256>;

/// Fernet token version marker.
pub const TOKEN_VERSION: u8 = 0x80;

/// IV length in bytes (one AES block).
pub const IV_LENGTH: usize = 16;

/// HMAC-SHA256 tag length in bytes.
pub const TAG_LENGTH: usize = 32;

/// AES block size in bytes.
const BLOCK_SIZE: usize = 16;

/// Timestamp field length in bytes.
const TIMESTAMP_LENGTH: usize = 8;

/// Shortest structurally valid token: header + one ciphertext block + tag.
const MIN_TOKEN_LENGTH: usize = 1 + TIMESTAMP_LENGTH + IV_LENGTH + BLOCK_SIZE + TAG_LENGTH;

/// The two 128-bit halves of a decoded Fernet key.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct FernetKey {
    signing: [u8; 16],
    encryption: [u8; 16],
}

impl FernetKey {
    /// Split base64url-encoded 32-byte key material into signing and
    /// encryption halves.
    pub fn from_encoded(key: &DerivedKey) -> Result<Self, CryptoError> {
        let mut raw = base64url_decode(key.as_str())?;
        if raw.len() != KEY_LENGTH {
            let got = raw.len();
            raw.zeroize();
            return Err(CryptoError::InvalidKeyLength {
                expected: KEY_LENGTH,
                got,
            });
        }
        let mut signing = [0u8; 16];
        let mut encryption = [0u8; 16];
        signing.copy_from_slice(&raw[..16]);
        encryption.copy_from_slice(&raw[16..]);
        raw.zeroize();
        Ok(Self { signing, encryption })
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before Unix epoch")
        .as_secs()
}

fn generate_iv() -> Result<[u8; IV_LENGTH], CryptoError> {
    let mut iv = [0u8; IV_LENGTH];
    getrandom::getrandom(&mut iv).map_err(|e| CryptoError::RngFailed(e.to_string()))?;
    Ok(iv)
}

/// Seal `plaintext` into a Fernet token using the current time and a random IV.
pub fn seal(key: &FernetKey, plaintext: &[u8]) -> Result<String, CryptoError> {
    seal_at(key, plaintext, unix_now(), generate_iv()?)
}

/// Seal with an explicit timestamp and IV.
///
/// Deterministic for fixed inputs; `seal` is the randomized entry point.
pub fn seal_at(
    key: &FernetKey,
    plaintext: &[u8],
    timestamp: u64,
    iv: [u8; IV_LENGTH],
) -> Result<String, CryptoError> {
    let ciphertext = Aes128CbcEnc::new((&key.encryption).into(), (&iv).into())
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    let mut token =
        Vec::with_capacity(1 + TIMESTAMP_LENGTH + IV_LENGTH + ciphertext.len() + TAG_LENGTH);
    token.push(TOKEN_VERSION);
    token.extend_from_slice(&timestamp.to_be_bytes());
    token.extend_from_slice(&iv);
    token.extend_from_slice(&ciphertext);

    let mut mac = HmacSha256::new_from_slice(&key.signing)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
    mac.update(&token);
    token.extend_from_slice(&mac.finalize().into_bytes());

    Ok(base64url_encode(&token))
}

/// Open a token, verifying the tag and returning the plaintext bytes.
pub fn open(key: &FernetKey, token: &str) -> Result<Vec<u8>, CryptoError> {
    open_at(key, token, None, unix_now())
}

/// Open a token, additionally rejecting tokens older than `ttl` seconds.
pub fn open_with_ttl(key: &FernetKey, token: &str, ttl: u64) -> Result<Vec<u8>, CryptoError> {
    open_at(key, token, Some(ttl), unix_now())
}

/// Open with an explicit clock, for TTL testing.
pub fn open_at(
    key: &FernetKey,
    token: &str,
    ttl: Option<u64>,
    now: u64,
) -> Result<Vec<u8>, CryptoError> {
    let data = base64url_decode(token)?;
    if data.len() < MIN_TOKEN_LENGTH {
        return Err(CryptoError::TokenTooShort {
            expected: MIN_TOKEN_LENGTH,
            got: data.len(),
        });
    }
    if data[0] != TOKEN_VERSION {
        return Err(CryptoError::UnsupportedTokenVersion(data[0]));
    }

    let (body, tag) = data.split_at(data.len() - TAG_LENGTH);
    let mut mac = HmacSha256::new_from_slice(&key.signing)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
    mac.update(body);
    mac.verify_slice(tag)
        .map_err(|_| CryptoError::AuthenticationFailed)?;

    let timestamp = u64::from_be_bytes(
        body[1..1 + TIMESTAMP_LENGTH]
            .try_into()
            .expect("slice is exactly 8 bytes after length check"),
    );
    if let Some(ttl) = ttl {
        if timestamp.saturating_add(ttl) < now {
            return Err(CryptoError::ExpiredToken {
                issued_at: timestamp,
                ttl,
                now,
            });
        }
    }

    let ciphertext = &body[1 + TIMESTAMP_LENGTH + IV_LENGTH..];
    if ciphertext.is_empty() || ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(CryptoError::InvalidCiphertextLength(ciphertext.len()));
    }
    let iv: [u8; IV_LENGTH] = body[1 + TIMESTAMP_LENGTH..1 + TIMESTAMP_LENGTH + IV_LENGTH]
        .try_into()
        .expect("slice is exactly 16 bytes after length check");

    Aes128CbcDec::new((&key.encryption).into(), (&iv).into())
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| CryptoError::InvalidEncoding("invalid PKCS7 padding".into()))
}

/// Verify a token's tag and return the timestamp it was sealed at.
pub fn issued_at(key: &FernetKey, token: &str) -> Result<u64, CryptoError> {
    let data = base64url_decode(token)?;
    if data.len() < MIN_TOKEN_LENGTH {
        return Err(CryptoError::TokenTooShort {
            expected: MIN_TOKEN_LENGTH,
            got: data.len(),
        });
    }
    if data[0] != TOKEN_VERSION {
        return Err(CryptoError::UnsupportedTokenVersion(data[0]));
    }
    let (body, tag) = data.split_at(data.len() - TAG_LENGTH);
    let mut mac = HmacSha256::new_from_slice(&key.signing)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
    mac.update(body);
    mac.verify_slice(tag)
        .map_err(|_| CryptoError::AuthenticationFailed)?;
    Ok(u64::from_be_bytes(
        body[1..1 + TIMESTAMP_LENGTH]
            .try_into()
            .expect("slice is exactly 8 bytes after length check"),
    ))
}
