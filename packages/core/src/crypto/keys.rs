// Key bundles
// Публичные и приватные bundle, адресация и шифрование конвертов

use crate::crypto::provider::CryptoProvider;
use crate::crypto::suites::classic::ClassicSuiteProvider;
use crate::error::CryptoError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use zeroize::Zeroizing;

type Suite = ClassicSuiteProvider;

const HKDF_SALT_LEN: usize = 32;
const MESSAGE_KEY_LEN: usize = 32;
const MESSAGE_KEY_INFO: &[u8] = b"construct-overlay/v0/message-key";
const PRE_KEY_INFO: &[u8] = b"construct-overlay/v0/pre-key";

/// Длина адреса в байтах (до hex-кодирования)
const ADDRESS_LEN: usize = 20;

/// Адрес вида `0x…`: первые 20 байт SHA-256 от публичного ключа
pub fn address_from_public_key(key_bytes: &[u8]) -> String {
    let digest = Sha256::digest(key_bytes);
    format!("0x{}", hex::encode(&digest[..ADDRESS_LEN]))
}

/// Публичный ключ X25519, опционально подписанный кошельком
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKey {
    #[serde(with = "serde_bytes")]
    pub key_bytes: Vec<u8>,
    /// Подпись кошелька над identity_authorization_message (только для identity key)
    #[serde(with = "serde_bytes")]
    pub signature: Option<Vec<u8>>,
}

impl PublicKey {
    pub fn new(key_bytes: Vec<u8>) -> Self {
        Self {
            key_bytes,
            signature: None,
        }
    }
}

/// Публичный bundle стороны: цель адресации и шифрования
///
/// Без identity key bundle нельзя ни адресовать, ни зашифровать для него.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeyBundle {
    pub identity_key: Option<PublicKey>,
    pub pre_key: Option<PublicKey>,
}

impl PublicKeyBundle {
    pub fn new(identity_key: PublicKey, pre_key: Option<PublicKey>) -> Self {
        Self {
            identity_key: Some(identity_key),
            pre_key,
        }
    }

    /// Стабильный адрес, из которого выводится topic. `None` без identity key.
    pub fn address_identifier(&self) -> Option<String> {
        self.identity_key
            .as_ref()
            .map(|key| address_from_public_key(&key.key_bytes))
    }

    /// Проверить, что identity key авторизован кошельком с данным публичным ключом
    pub fn verify_identity(&self, wallet_public_key: &[u8]) -> Result<(), CryptoError> {
        let identity = self
            .identity_key
            .as_ref()
            .ok_or_else(|| CryptoError::MissingKey("identity key".to_string()))?;
        let signature = identity
            .signature
            .as_ref()
            .ok_or_else(|| CryptoError::SignatureVerificationError("identity key is not signed".to_string()))?;

        let message = crate::crypto::wallet::identity_authorization_message(&identity.key_bytes);
        Suite::verify(wallet_public_key, &message, signature)
    }
}

/// Приватный ключ X25519. Секрет затирается при drop.
#[derive(Clone)]
pub struct PrivateKey {
    secret: Zeroizing<Vec<u8>>,
    public: PublicKey,
}

impl PrivateKey {
    pub fn generate() -> Result<Self, CryptoError> {
        let (secret, public) = Suite::generate_kem_keys()?;
        Ok(Self {
            secret: Zeroizing::new(secret),
            public: PublicKey::new(public),
        })
    }

    pub fn from_secret(secret: Vec<u8>) -> Result<Self, CryptoError> {
        let secret = Zeroizing::new(Suite::kem_private_key_from_bytes(secret));
        let public = Suite::from_private_key_to_public_key(&secret)?;
        Ok(Self {
            secret,
            public: PublicKey::new(public),
        })
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    fn diffie_hellman(&self, remote: &PublicKey) -> Result<Vec<u8>, CryptoError> {
        Suite::diffie_hellman(&self.secret, &remote.key_bytes)
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}

/// Зашифрованное содержимое конверта
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ciphertext {
    #[serde(with = "serde_bytes")]
    pub hkdf_salt: Vec<u8>,
    #[serde(with = "serde_bytes")]
    pub nonce: Vec<u8>,
    #[serde(with = "serde_bytes")]
    pub payload: Vec<u8>,
    /// Pre-key получателя, на который запечатан конверт. `None`: DH только по identity.
    #[serde(default, with = "serde_bytes")]
    pub recipient_pre_key: Option<Vec<u8>>,
}

/// Собственные ключи стороны. Никогда не попадают в конверты.
#[derive(Debug, Clone, Default)]
pub struct PrivateKeyBundle {
    identity_key: Option<PrivateKey>,
    /// Первый элемент: текущий pre-key
    pre_keys: Vec<PrivateKey>,
}

impl PrivateKeyBundle {
    pub fn new(identity_key: Option<PrivateKey>, pre_keys: Vec<PrivateKey>) -> Self {
        Self {
            identity_key,
            pre_keys,
        }
    }

    /// Новый identity key и один pre-key
    pub fn generate() -> Result<Self, CryptoError> {
        Ok(Self::new(
            Some(PrivateKey::generate()?),
            vec![PrivateKey::generate()?],
        ))
    }

    /// Восстановить bundle из 32-байтного identity секрета.
    ///
    /// Pre-key выводится из секрета через HKDF, поэтому один и тот же секрет
    /// всегда даёт тот же публичный bundle.
    pub fn from_identity_secret(secret: &[u8]) -> Result<Self, CryptoError> {
        if secret.len() != 32 {
            return Err(CryptoError::InvalidInputError(format!(
                "identity secret must be 32 bytes, got {}",
                secret.len()
            )));
        }
        let identity = PrivateKey::from_secret(secret.to_vec())?;
        let pre_key_secret = Suite::hkdf_derive_key(b"", secret, PRE_KEY_INFO, 32)?;
        let pre_key = PrivateKey::from_secret(pre_key_secret)?;
        Ok(Self::new(Some(identity), vec![pre_key]))
    }

    pub fn identity_key(&self) -> Option<&PrivateKey> {
        self.identity_key.as_ref()
    }

    pub fn pre_key(&self) -> Option<&PrivateKey> {
        self.pre_keys.first()
    }

    pub fn public_key_bundle(&self) -> PublicKeyBundle {
        PublicKeyBundle {
            identity_key: self.identity_key.as_ref().map(|k| k.public.clone()),
            pre_key: self.pre_key().map(|k| k.public.clone()),
        }
    }

    pub fn address_identifier(&self) -> Option<String> {
        self.identity_key
            .as_ref()
            .map(|k| address_from_public_key(&k.public.key_bytes))
    }

    /// Прикрепить подпись кошелька к identity key
    pub fn set_identity_signature(&mut self, signature: Vec<u8>) -> Result<(), CryptoError> {
        let identity = self
            .identity_key
            .as_mut()
            .ok_or_else(|| CryptoError::MissingKey("identity key".to_string()))?;
        identity.public.signature = Some(signature);
        Ok(())
    }

    /// Новый текущий pre-key. Старые остаются, чтобы читать уже отправленные конверты.
    pub fn rotate_pre_key(&mut self) -> Result<(), CryptoError> {
        self.pre_keys.insert(0, PrivateKey::generate()?);
        Ok(())
    }

    /// Зашифровать для получателя.
    ///
    /// Triple DH, только если pre-key есть у обеих сторон; выбранный pre-key
    /// получателя записывается в конверт.
    pub fn encrypt(&self, plaintext: &[u8], recipient: &PublicKeyBundle) -> Result<Ciphertext, CryptoError> {
        let pre_keys = match (self.pre_key(), recipient.pre_key.as_ref()) {
            (Some(own), Some(peer)) => Some((own, peer)),
            _ => None,
        };
        let secret = self.shared_secret(recipient, pre_keys, true)?;

        let hkdf_salt = Suite::generate_nonce(HKDF_SALT_LEN)?;
        let nonce = Suite::generate_nonce(Suite::aead_nonce_len())?;
        let key = Zeroizing::new(Suite::hkdf_derive_key(
            &hkdf_salt,
            &secret,
            MESSAGE_KEY_INFO,
            MESSAGE_KEY_LEN,
        )?);

        let payload = Suite::aead_encrypt(&Suite::aead_key_from_bytes(key.to_vec()), &nonce, plaintext, None)?;

        Ok(Ciphertext {
            hkdf_salt,
            nonce,
            payload,
            recipient_pre_key: pre_keys.map(|(_, peer)| peer.key_bytes.clone()),
        })
    }

    /// Расшифровать конверт, адресованный себе.
    ///
    /// Режим берётся из конверта, а не из текущих bundle: отправитель мог
    /// шифровать на закэшированный bundle без pre-key или на старый pre-key.
    pub fn decrypt(&self, ciphertext: &Ciphertext, sender: &PublicKeyBundle) -> Result<Vec<u8>, CryptoError> {
        let pre_keys = match ciphertext.recipient_pre_key.as_deref() {
            Some(sealed_to) => {
                let own = self
                    .pre_keys
                    .iter()
                    .find(|k| k.public.key_bytes == sealed_to)
                    .ok_or_else(|| CryptoError::MissingKey("pre-key the envelope was sealed to".to_string()))?;
                let peer = sender
                    .pre_key
                    .as_ref()
                    .ok_or_else(|| CryptoError::MissingKey("sender pre-key".to_string()))?;
                Some((own, peer))
            }
            None => None,
        };
        let secret = self.shared_secret(sender, pre_keys, false)?;

        let key = Zeroizing::new(Suite::hkdf_derive_key(
            &ciphertext.hkdf_salt,
            &secret,
            MESSAGE_KEY_INFO,
            MESSAGE_KEY_LEN,
        )?);

        Suite::aead_decrypt(
            &Suite::aead_key_from_bytes(key.to_vec()),
            &ciphertext.nonce,
            &ciphertext.payload,
            None,
        )
    }

    /// Triple DH при заданной паре pre-key, иначе DH identity-identity.
    ///
    /// Порядок слагаемых зависит от роли, чтобы обе стороны получили одинаковый секрет:
    /// ```text
    /// sender:    DH(IK_s, PK_r) || DH(PK_s, IK_r) || DH(PK_s, PK_r)
    /// recipient: DH(PK_r, IK_s) || DH(IK_r, PK_s) || DH(PK_r, PK_s)
    /// ```
    fn shared_secret(
        &self,
        peer: &PublicKeyBundle,
        pre_keys: Option<(&PrivateKey, &PublicKey)>,
        is_sender: bool,
    ) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
        let identity = self
            .identity_key
            .as_ref()
            .ok_or_else(|| CryptoError::MissingKey("own identity key".to_string()))?;
        let peer_identity = peer
            .identity_key
            .as_ref()
            .ok_or_else(|| CryptoError::MissingKey("peer identity key".to_string()))?;

        let mut secret = Zeroizing::new(Vec::with_capacity(96));
        match pre_keys {
            Some((pre_key, peer_pre_key)) => {
                let (first, second) = if is_sender {
                    (identity.diffie_hellman(peer_pre_key)?, pre_key.diffie_hellman(peer_identity)?)
                } else {
                    (pre_key.diffie_hellman(peer_identity)?, identity.diffie_hellman(peer_pre_key)?)
                };
                secret.extend_from_slice(&first);
                secret.extend_from_slice(&second);
                secret.extend_from_slice(&pre_key.diffie_hellman(peer_pre_key)?);
            }
            None => secret.extend_from_slice(&identity.diffie_hellman(peer_identity)?),
        }
        Ok(secret)
    }
}
