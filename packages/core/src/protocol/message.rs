// Конверт сообщения: заголовок + ciphertext
// Расшифрованный текст: локальная аннотация, на провод не попадает

use crate::crypto::keys::{Ciphertext, PrivateKeyBundle, PublicKeyBundle};
use crate::protocol::wire;
use crate::utils::error::{OverlayError, Result};
use crate::utils::time;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

/// Заголовок конверта
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHeader {
    pub sender: PublicKeyBundle,
    pub recipient: PublicKeyBundle,
    /// Unix timestamp отправки в миллисекундах
    pub timestamp: u64,
}

/// Конверт, которым стороны обмениваются через транспорт
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub header: MessageHeader,
    pub ciphertext: Option<Ciphertext>,
    /// Заполняется только после успешной локальной расшифровки
    pub decrypted: Option<String>,
}

impl Message {
    pub fn new(header: MessageHeader, ciphertext: Ciphertext) -> Self {
        Self {
            header,
            ciphertext: Some(ciphertext),
            decrypted: None,
        }
    }

    /// Идентификатор: hex SHA-256 от wire-представления
    pub fn id(&self) -> Result<String> {
        let bytes = wire::encode(self)?;
        Ok(hex::encode(Sha256::digest(&bytes)))
    }

    pub fn sent(&self) -> Option<DateTime<Utc>> {
        time::from_millis(self.header.timestamp)
    }

    pub fn sender_address(&self) -> Option<String> {
        self.header.sender.address_identifier()
    }

    pub fn recipient_address(&self) -> Option<String> {
        self.header.recipient.address_identifier()
    }

    /// Есть что расшифровывать и известен отправитель
    pub fn is_decryptable(&self) -> bool {
        self.ciphertext.is_some() && self.header.sender.identity_key.is_some()
    }

    /// Копия без локального plaintext (ровно то, что видно на проводе)
    pub fn without_decrypted(&self) -> Self {
        Self {
            decrypted: None,
            ..self.clone()
        }
    }

    /// Расшифровать ключами получателя и прикрепить plaintext.
    /// Конверты без ciphertext или отправителя не трогаем.
    pub fn decrypt_with(&mut self, recipient: &PrivateKeyBundle) -> Result<()> {
        if !self.is_decryptable() {
            return Ok(());
        }
        let Some(ciphertext) = self.ciphertext.as_ref() else {
            return Ok(());
        };

        let bytes = recipient
            .decrypt(ciphertext, &self.header.sender)
            .map_err(OverlayError::Decryption)?;
        let text = String::from_utf8(bytes)
            .map_err(|e| OverlayError::Serialization(format!("Invalid UTF-8: {}", e)))?;

        self.decrypted = Some(text);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(sender: &PrivateKeyBundle, recipient: &PrivateKeyBundle) -> MessageHeader {
        MessageHeader {
            sender: sender.public_key_bundle(),
            recipient: recipient.public_key_bundle(),
            timestamp: 1_700_000_000_000,
        }
    }

    #[test]
    fn test_decrypt_with_attaches_plaintext() {
        let alice = PrivateKeyBundle::generate().unwrap();
        let bob = PrivateKeyBundle::generate().unwrap();
        let ciphertext = alice.encrypt("привет".as_bytes(), &bob.public_key_bundle()).unwrap();

        let mut message = Message::new(header(&alice, &bob), ciphertext);
        message.decrypt_with(&bob).unwrap();
        assert_eq!(message.decrypted.as_deref(), Some("привет"));
        assert_eq!(message.sender_address(), alice.address_identifier());
        assert_eq!(message.recipient_address(), bob.address_identifier());
    }

    #[test]
    fn test_missing_ciphertext_is_left_alone() {
        let alice = PrivateKeyBundle::generate().unwrap();
        let bob = PrivateKeyBundle::generate().unwrap();
        let mut message = Message {
            header: header(&alice, &bob),
            ciphertext: None,
            decrypted: None,
        };

        assert!(!message.is_decryptable());
        message.decrypt_with(&bob).unwrap();
        assert!(message.decrypted.is_none());
    }

    #[test]
    fn test_id_ignores_local_plaintext() {
        let alice = PrivateKeyBundle::generate().unwrap();
        let bob = PrivateKeyBundle::generate().unwrap();
        let ciphertext = alice.encrypt(b"x", &bob.public_key_bundle()).unwrap();

        let mut message = Message::new(header(&alice, &bob), ciphertext);
        let before = message.id().unwrap();
        message.decrypt_with(&bob).unwrap();
        assert_eq!(message.id().unwrap(), before);
        assert_eq!(before.len(), 64);
    }
}
