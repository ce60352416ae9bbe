// Content topics
// Детерминированные pub/sub каналы, вычисляемые из адреса получателя

use crate::utils::error::{OverlayError, Result};

pub const TOPIC_NAMESPACE: &str = "construct";

/// Версия протокола: смена версии разводит topics несовместимых клиентов
pub const TOPIC_VERSION: &str = "0";

/// Кодировка payload (MessagePack, см. [`crate::protocol::wire`])
pub const TOPIC_ENCODING: &str = "msgpack";

const CONTACT_PREFIX: &str = "contact-";

fn build_topic(name: &str) -> String {
    format!("/{}/{}/{}/{}", TOPIC_NAMESPACE, TOPIC_VERSION, name, TOPIC_ENCODING)
}

/// Topic входящих сообщений для адреса: `/construct/0/<address>/msgpack`
pub fn derive_topic(address_identifier: &str) -> Result<String> {
    if address_identifier.is_empty() {
        return Err(OverlayError::InvalidInput(
            "address identifier must not be empty".to_string(),
        ));
    }
    Ok(build_topic(address_identifier))
}

/// Topic, где сторона публикует свой публичный bundle
pub fn contact_topic(address_identifier: &str) -> Result<String> {
    if address_identifier.is_empty() {
        return Err(OverlayError::InvalidInput(
            "address identifier must not be empty".to_string(),
        ));
    }
    Ok(build_topic(&format!("{}{}", CONTACT_PREFIX, address_identifier)))
}
