//! The versioned encryption engine.
//!
//! Holds a configuration record and an application identifier. The key is
//! re-derived from them on every call rather than cached, so key material
//! never outlives a single operation. One PBKDF2 pass per operation is the
//! accepted cost of that.

use crate::config::{EngineConfig, CONFIG_VERSION};
use crate::error::CryptoError;
use crate::kdf::{derive_key, DerivedKey};
use crate::token::{self, FernetKey};

/// Encrypts and decrypts one configuration secret.
///
/// `encrypt` takes the plaintext as an argument; `decrypt` takes none and
/// operates on the config's stored `secret`. The asymmetry is intentional:
/// a config holds exactly one secret.
pub struct EncryptionEngine {
    config: EngineConfig,
    app_id: String,
}

impl EncryptionEngine {
    /// Build an engine over a configuration record and application identifier.
    ///
    /// The identifier must not change across encrypt/decrypt calls for the
    /// same data. Rejects records whose version is not 4.
    pub fn new(config: EngineConfig, app_id: impl Into<String>) -> Result<Self, CryptoError> {
        if config.version != CONFIG_VERSION {
            return Err(CryptoError::UnsupportedConfigVersion {
                expected: CONFIG_VERSION,
                got: config.version,
            });
        }
        Ok(Self {
            config,
            app_id: app_id.into(),
        })
    }

    /// Encrypt a plaintext string, returning the Fernet token.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        let key = FernetKey::from_encoded(&self.derive_key()?)?;
        token::seal(&key, plaintext.as_bytes())
    }

    /// Verify and decrypt the token stored in the config's `secret` field.
    pub fn decrypt(&self) -> Result<String, CryptoError> {
        let secret = self
            .config
            .secret
            .as_deref()
            .ok_or(CryptoError::MissingSecret)?;
        let key = FernetKey::from_encoded(&self.derive_key()?)?;
        let plaintext = token::open(&key, secret)?;
        String::from_utf8(plaintext).map_err(|_| CryptoError::InvalidUtf8)
    }

    /// The configuration this engine operates on.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn derive_key(&self) -> Result<DerivedKey, CryptoError> {
        derive_key(&self.app_id, &self.config.salt, self.config.iterations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Low iteration count keeps PBKDF2 cheap in tests; the derivation path is
    // identical at any count.
    fn test_config() -> EngineConfig {
        EngineConfig {
            version: 4,
            salt: "Ab3!xZ9qT2&mP0wL".into(),
            iterations: 100,
            secret: None,
        }
    }

    #[test]
    fn encrypt_decrypt_round_trip() {
        let config = test_config();
        let engine = EncryptionEngine::new(config.clone(), "app-123").unwrap();
        let tok = engine.encrypt("hunter2").unwrap();

        let reader =
            EncryptionEngine::new(config.with_secret(tok), "app-123").unwrap();
        assert_eq!(reader.decrypt().unwrap(), "hunter2");
    }

    #[test]
    fn unicode_round_trip() {
        let config = test_config();
        let engine = EncryptionEngine::new(config.clone(), "app-123").unwrap();
        let plaintext = "pässwörd \u{1F512} ключ";
        let tok = engine.encrypt(plaintext).unwrap();
        let reader = EncryptionEngine::new(config.with_secret(tok), "app-123").unwrap();
        assert_eq!(reader.decrypt().unwrap(), plaintext);
    }

    #[test]
    fn encryption_is_randomized() {
        let engine = EncryptionEngine::new(test_config(), "app-123").unwrap();
        let t1 = engine.encrypt("same plaintext").unwrap();
        let t2 = engine.encrypt("same plaintext").unwrap();
        assert_ne!(t1, t2);
    }

    #[test]
    fn wrong_identifier_fails() {
        let config = test_config();
        let writer = EncryptionEngine::new(config.clone(), "app-123").unwrap();
        let tok = writer.encrypt("hunter2").unwrap();

        let reader = EncryptionEngine::new(config.with_secret(tok), "app-456").unwrap();
        assert!(matches!(
            reader.decrypt(),
            Err(CryptoError::AuthenticationFailed)
        ));
    }

    #[test]
    fn changed_salt_invalidates_decryption() {
        let config = test_config();
        let writer = EncryptionEngine::new(config.clone(), "app-123").unwrap();
        let tok = writer.encrypt("hunter2").unwrap();

        let mut altered = config.with_secret(tok);
        altered.salt = "L0wPm&2Tq9Zx!3bA".into();
        let reader = EncryptionEngine::new(altered, "app-123").unwrap();
        assert!(reader.decrypt().is_err());
    }

    #[test]
    fn changed_iterations_invalidates_decryption() {
        let config = test_config();
        let writer = EncryptionEngine::new(config.clone(), "app-123").unwrap();
        let tok = writer.encrypt("hunter2").unwrap();

        let mut altered = config.with_secret(tok);
        altered.iterations = 101;
        let reader = EncryptionEngine::new(altered, "app-123").unwrap();
        assert!(reader.decrypt().is_err());
    }

    #[test]
    fn decrypt_without_secret_fails() {
        let engine = EncryptionEngine::new(test_config(), "app-123").unwrap();
        assert!(matches!(engine.decrypt(), Err(CryptoError::MissingSecret)));
    }

    #[test]
    fn rejects_non_v4_config() {
        let mut config = test_config();
        config.version = 3;
        assert!(matches!(
            EncryptionEngine::new(config, "app-123"),
            Err(CryptoError::UnsupportedConfigVersion { expected: 4, got: 3 })
        ));
    }

    #[test]
    fn tampered_secret_fails() {
        let config = test_config();
        let writer = EncryptionEngine::new(config.clone(), "app-123").unwrap();
        let tok = writer.encrypt("hunter2").unwrap();

        let raw = crate::base64url::base64url_decode(&tok).unwrap();
        let mut corrupted = raw.clone();
        let mid = corrupted.len() / 2;
        corrupted[mid] ^= 0xff;
        let bad_tok = crate::base64url::base64url_encode(&corrupted);

        let reader = EncryptionEngine::new(config.with_secret(bad_tok), "app-123").unwrap();
        assert!(matches!(
            reader.decrypt(),
            Err(CryptoError::AuthenticationFailed)
        ));
    }

    #[test]
    fn non_utf8_plaintext_fails_decryption() {
        let config = test_config();
        // Seal raw bytes directly at the token layer; the engine only ever
        // seals strings, so this is the one way to store such a secret.
        let key = FernetKey::from_encoded(
            &derive_key("app-123", &config.salt, config.iterations).unwrap(),
        )
        .unwrap();
        let tok = token::seal(&key, &[0xff, 0xfe, 0x80]).unwrap();

        let reader = EncryptionEngine::new(config.with_secret(tok), "app-123").unwrap();
        assert!(matches!(reader.decrypt(), Err(CryptoError::InvalidUtf8)));
    }

    #[test]
    fn generated_config_works_end_to_end() {
        let config = EngineConfig::generate().unwrap();
        // Full default cost: one 100k-iteration derivation each way.
        let writer = EncryptionEngine::new(config.clone(), "app-instance-9000").unwrap();
        let tok = writer.encrypt("s3cret-api-token").unwrap();
        let reader =
            EncryptionEngine::new(config.with_secret(tok), "app-instance-9000").unwrap();
        assert_eq!(reader.decrypt().unwrap(), "s3cret-api-token");
    }
}
