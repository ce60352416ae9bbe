// Кошелёк: авторизация identity key подписью

use crate::crypto::keys::address_from_public_key;
use crate::crypto::provider::CryptoProvider;
use crate::crypto::suites::classic::ClassicSuiteProvider;
use crate::utils::error::{OverlayError, Result};
use async_trait::async_trait;
use std::fmt;
use zeroize::Zeroizing;

/// Сообщение, которое кошелёк подписывает, чтобы авторизовать identity key
pub fn identity_authorization_message(identity_public_key: &[u8]) -> Vec<u8> {
    format!(
        "Construct Overlay: authorize identity key\n\nKey: {}\n\nOnly sign this request if you initiated it.",
        hex::encode(identity_public_key)
    )
    .into_bytes()
}

/// Подписант (кошелёк). Подпись может требовать участия пользователя, поэтому async.
#[async_trait]
pub trait Signer: Send + Sync {
    /// Адрес кошелька
    fn address(&self) -> String;

    async fn sign_message(&self, message: &[u8]) -> Result<Vec<u8>>;
}

/// Локальный Ed25519 кошелёк
pub struct LocalWallet {
    signing_key: Zeroizing<Vec<u8>>,
    verifying_key: Vec<u8>,
}

impl LocalWallet {
    pub fn generate() -> Result<Self> {
        let (signing_key, verifying_key) = ClassicSuiteProvider::generate_signature_keys()
            .map_err(|e| OverlayError::Wallet(e.to_string()))?;
        Ok(Self {
            signing_key: Zeroizing::new(signing_key),
            verifying_key,
        })
    }

    pub fn from_bytes(signing_key: &[u8]) -> Result<Self> {
        let signing_key = Zeroizing::new(signing_key.to_vec());
        let verifying_key = ClassicSuiteProvider::from_signature_private_to_public(&signing_key)
            .map_err(|e| OverlayError::Wallet(e.to_string()))?;
        Ok(Self {
            signing_key,
            verifying_key,
        })
    }

    pub fn verifying_key(&self) -> &[u8] {
        &self.verifying_key
    }
}

impl fmt::Debug for LocalWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalWallet")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Signer for LocalWallet {
    fn address(&self) -> String {
        address_from_public_key(&self.verifying_key)
    }

    async fn sign_message(&self, message: &[u8]) -> Result<Vec<u8>> {
        ClassicSuiteProvider::sign(&self.signing_key, message).map_err(|e| OverlayError::Wallet(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::PrivateKeyBundle;

    #[tokio::test]
    async fn test_wallet_authorizes_identity_key() {
        let wallet = LocalWallet::generate().unwrap();
        let mut keys = PrivateKeyBundle::generate().unwrap();

        let identity = keys.public_key_bundle().identity_key.unwrap();
        let signature = wallet
            .sign_message(&identity_authorization_message(&identity.key_bytes))
            .await
            .unwrap();
        keys.set_identity_signature(signature).unwrap();

        assert!(keys.public_key_bundle().verify_identity(wallet.verifying_key()).is_ok());

        let other = LocalWallet::generate().unwrap();
        assert!(keys.public_key_bundle().verify_identity(other.verifying_key()).is_err());
    }

    #[test]
    fn test_wallet_from_bytes_keeps_address() {
        let wallet = LocalWallet::from_bytes(&[3u8; 32]).unwrap();
        let again = LocalWallet::from_bytes(&[3u8; 32]).unwrap();
        assert_eq!(wallet.address(), again.address());
        assert!(LocalWallet::from_bytes(&[3u8; 5]).is_err());
    }
}
