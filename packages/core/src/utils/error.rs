// Типы ошибок

use crate::error::CryptoError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OverlayError {
    /// Bundle без identity key: ошибка вызывающей стороны, не ретраится
    #[error("Recipient bundle has no identity key")]
    MissingRecipient,

    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),

    #[error("Encryption failed: {0}")]
    Encryption(CryptoError),

    #[error("Decryption failed: {0}")]
    Decryption(CryptoError),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("Keystore provider unavailable: {0}")]
    KeystoreProviderUnavailable(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl OverlayError {
    /// Провайдер отказался, но можно попробовать следующий
    pub fn is_unavailable(&self) -> bool {
        matches!(self, OverlayError::KeystoreProviderUnavailable(_))
    }
}

pub type Result<T> = std::result::Result<T, OverlayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_is_distinguishable() {
        assert!(OverlayError::KeystoreProviderUnavailable("no wallet".into()).is_unavailable());
        assert!(!OverlayError::MissingRecipient.is_unavailable());
        assert!(!OverlayError::Transport("offline".into()).is_unavailable());
    }

    #[test]
    fn test_crypto_errors_keep_their_message() {
        let err = OverlayError::Decryption(CryptoError::AeadDecryptionError("aead::Error".into()));
        assert_eq!(err.to_string(), "Decryption failed: AEAD decryption failed: aead::Error");
    }
}
