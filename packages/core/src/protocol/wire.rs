// Wire format (MessagePack сериализация)
// Единственный бинарный артефакт, видимый снаружи: менять только вместе с TOPIC_VERSION

use crate::crypto::keys::{Ciphertext, PublicKeyBundle};
use crate::protocol::message::{Message, MessageHeader};
use crate::utils::error::{OverlayError, Result};
use rmp_serde::{Deserializer, Serializer};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireHeader {
    sender: Option<PublicKeyBundle>,
    recipient: Option<PublicKeyBundle>,
    timestamp: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireMessage {
    header: Option<WireHeader>,
    ciphertext: Option<Ciphertext>,
}

/// Упаковать конверт в MessagePack
pub fn encode(message: &Message) -> Result<Vec<u8>> {
    let wire = WireMessage {
        header: Some(WireHeader {
            sender: Some(message.header.sender.clone()),
            recipient: Some(message.header.recipient.clone()),
            timestamp: message.header.timestamp,
        }),
        ciphertext: message.ciphertext.clone(),
    };
    pack_raw(&wire)
}

/// Распаковать конверт. Без заголовка, отправителя или получателя конверт некорректен.
pub fn decode(data: &[u8]) -> Result<Message> {
    let wire: WireMessage = unpack_raw(data)
        .map_err(|e| OverlayError::MalformedEnvelope(e.to_string()))?;

    let header = wire
        .header
        .ok_or_else(|| OverlayError::MalformedEnvelope("missing header".to_string()))?;
    let sender = header
        .sender
        .ok_or_else(|| OverlayError::MalformedEnvelope("missing sender bundle".to_string()))?;
    let recipient = header
        .recipient
        .ok_or_else(|| OverlayError::MalformedEnvelope("missing recipient bundle".to_string()))?;

    Ok(Message {
        header: MessageHeader {
            sender,
            recipient,
            timestamp: header.timestamp,
        },
        ciphertext: wire.ciphertext,
        decrypted: None,
    })
}

/// Упаковать произвольные данные в MessagePack
pub fn pack_raw<T: Serialize>(data: &T) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    data.serialize(&mut Serializer::new(&mut buffer))
        .map_err(|e| {
            OverlayError::Serialization(format!("MessagePack pack error: {}", e))
        })?;
    Ok(buffer)
}

/// Распаковать MessagePack в произвольный тип
pub fn unpack_raw<'a, T: Deserialize<'a>>(data: &'a [u8]) -> Result<T> {
    let mut deserializer = Deserializer::new(data);
    T::deserialize(&mut deserializer)
        .map_err(|e| OverlayError::Serialization(format!("MessagePack unpack error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::PrivateKeyBundle;
    use proptest::prelude::*;

    fn sample_message() -> Message {
        let alice = PrivateKeyBundle::generate().unwrap();
        let bob = PrivateKeyBundle::generate().unwrap();
        let ciphertext = alice.encrypt(b"hello", &bob.public_key_bundle()).unwrap();
        Message::new(
            MessageHeader {
                sender: alice.public_key_bundle(),
                recipient: bob.public_key_bundle(),
                timestamp: 42,
            },
            ciphertext,
        )
    }

    #[test]
    fn test_decrypted_text_never_reaches_the_wire() {
        let mut message = sample_message();
        let plain = encode(&message).unwrap();
        message.decrypted = Some("hello".to_string());
        assert_eq!(encode(&message).unwrap(), plain);
        assert!(decode(&plain).unwrap().decrypted.is_none());
    }

    #[test]
    fn test_garbage_is_malformed() {
        assert!(matches!(decode(b"not an envelope"), Err(OverlayError::MalformedEnvelope(_))));
        assert!(matches!(decode(&[]), Err(OverlayError::MalformedEnvelope(_))));
    }

    #[test]
    fn test_missing_header_parts_are_malformed() {
        let bundle = PrivateKeyBundle::generate().unwrap().public_key_bundle();

        let no_header = pack_raw(&WireMessage { header: None, ciphertext: None }).unwrap();
        assert!(matches!(decode(&no_header), Err(OverlayError::MalformedEnvelope(_))));

        let no_sender = pack_raw(&WireMessage {
            header: Some(WireHeader { sender: None, recipient: Some(bundle.clone()), timestamp: 1 }),
            ciphertext: None,
        })
        .unwrap();
        assert!(matches!(decode(&no_sender), Err(OverlayError::MalformedEnvelope(_))));

        let no_recipient = pack_raw(&WireMessage {
            header: Some(WireHeader { sender: Some(bundle), recipient: None, timestamp: 1 }),
            ciphertext: None,
        })
        .unwrap();
        assert!(matches!(decode(&no_recipient), Err(OverlayError::MalformedEnvelope(_))));
    }

    #[test]
    fn test_missing_ciphertext_still_decodes() {
        let mut message = sample_message();
        message.ciphertext = None;
        let decoded = decode(&encode(&message).unwrap()).unwrap();
        assert_eq!(decoded, message);
    }

    proptest! {
        #[test]
        fn decode_inverts_encode(
            timestamp in any::<u64>(),
            payload in proptest::collection::vec(any::<u8>(), 0..256),
            text in ".*",
        ) {
            let mut message = sample_message();
            message.header.timestamp = timestamp;
            if let Some(ciphertext) = message.ciphertext.as_mut() {
                ciphertext.payload = payload;
            }
            message.decrypted = Some(text);

            let decoded = decode(&encode(&message).unwrap()).unwrap();
            prop_assert_eq!(decoded, message.without_decrypted());
        }
    }
}
