// API для отправки и получения сообщений

use crate::api::stream::{MessageStream, StreamHandle};
use crate::config::Config;
use crate::crypto::keys::{PrivateKeyBundle, PublicKeyBundle};
use crate::protocol::message::{Message, MessageHeader};
use crate::protocol::topic::derive_topic;
use crate::protocol::transport::{HistoryQuery, SortDirection, Transport};
use crate::protocol::wire;
use crate::utils::error::{OverlayError, Result};
use crate::utils::time;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

/// Параметры `list`. Незаданные поля берутся из [`Config`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    pub page_size: Option<u32>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl ListOptions {
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn with_window(mut self, start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Self {
        self.start_time = Some(start_time);
        self.end_time = Some(end_time);
        self
    }

    /// Окно по умолчанию: `[now - list_window_seconds, now]`, всегда вперёд по времени.
    ///
    /// Окно вне диапазона `chrono` или пустое/перевёрнутое окно: `InvalidInput`.
    pub fn into_query(self, config: &Config, now: DateTime<Utc>, topic: String) -> Result<HistoryQuery> {
        let end_time = self.end_time.unwrap_or(now);
        let start_time = match self.start_time {
            Some(start_time) => start_time,
            None => {
                let window = Duration::try_seconds(config.list_window_seconds)
                    .filter(|window| *window > Duration::zero())
                    .ok_or_else(|| {
                        OverlayError::InvalidInput(format!(
                            "list window of {} seconds is out of range",
                            config.list_window_seconds
                        ))
                    })?;
                now.checked_sub_signed(window).ok_or_else(|| {
                    OverlayError::InvalidInput("list window reaches before the earliest timestamp".to_string())
                })?
            }
        };
        if start_time > end_time {
            return Err(OverlayError::InvalidInput(
                "list window starts after it ends".to_string(),
            ));
        }

        Ok(HistoryQuery {
            content_topics: vec![topic],
            start_time,
            end_time,
            page_size: self.page_size.unwrap_or(config.list_page_size),
            direction: SortDirection::Forward,
        })
    }
}

/// Клиент обмена сообщениями.
///
/// Не хранит состояния кроме ссылки на транспорт и конфигурации, поэтому один
/// клиент можно разделять между параллельными `send`/`list`/`stream`.
#[derive(Clone)]
pub struct Client {
    transport: Arc<dyn Transport>,
    config: Config,
}

impl Client {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_config(transport, Config::global().clone())
    }

    pub fn with_config(transport: Arc<dyn Transport>, config: Config) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Зашифровать и опубликовать сообщение в topic получателя
    pub async fn send(
        &self,
        sender: &PrivateKeyBundle,
        recipient: &PublicKeyBundle,
        plaintext: &str,
    ) -> Result<()> {
        let address = recipient
            .address_identifier()
            .ok_or(OverlayError::MissingRecipient)?;
        let topic = derive_topic(&address)?;

        let ciphertext = sender
            .encrypt(plaintext.as_bytes(), recipient)
            .map_err(OverlayError::Encryption)?;

        let now = Utc::now();
        let message = Message::new(
            MessageHeader {
                sender: sender.public_key_bundle(),
                recipient: recipient.clone(),
                timestamp: time::to_millis(now),
            },
            ciphertext,
        );
        let payload = wire::encode(&message)?;
        if payload.len() > self.config.max_payload_size {
            return Err(OverlayError::InvalidInput(format!(
                "encoded envelope is {} bytes, limit is {}",
                payload.len(),
                self.config.max_payload_size
            )));
        }

        self.transport.publish(&topic, payload, now).await?;
        debug!(topic = %topic, "Message sent");
        Ok(())
    }

    /// Подписаться на входящие сообщения получателя.
    ///
    /// Ошибка `MissingRecipient` возвращается до регистрации observer.
    pub fn stream(&self, recipient: &PrivateKeyBundle) -> Result<(MessageStream, StreamHandle)> {
        let address = recipient
            .address_identifier()
            .ok_or(OverlayError::MissingRecipient)?;
        let topic = derive_topic(&address)?;

        let (sender, receiver) = mpsc::unbounded_channel();
        let observer = self.transport.subscribe(
            &[topic.clone()],
            Arc::new(move |payload: Vec<u8>| {
                // получатель мог уже уйти: тогда payload просто теряется
                let _ = sender.send(payload);
            }),
        )?;
        debug!(topic = %topic, "Stream subscribed");

        let handle = StreamHandle::new(self.transport.clone(), observer, topic);
        let stream = MessageStream::new(receiver, recipient.clone(), handle.clone());
        Ok((stream, handle))
    }

    /// Прочитать историю получателя за окно времени, страница за страницей.
    ///
    /// Результат отдаётся только целиком: ошибка декодирования или расшифровки
    /// любого элемента отклоняет весь вызов. Конверты без ciphertext
    /// возвращаются как есть, без `decrypted`.
    pub async fn list(&self, recipient: &PrivateKeyBundle, options: ListOptions) -> Result<Vec<Message>> {
        let address = recipient
            .address_identifier()
            .ok_or(OverlayError::MissingRecipient)?;
        let topic = derive_topic(&address)?;
        let query = options.into_query(&self.config, Utc::now(), topic)?;

        let mut messages = Vec::new();
        let mut cursor = None;
        let mut pages = 0usize;
        loop {
            let page = self.transport.query_history(&query, cursor.take()).await?;
            pages += 1;

            for stored in page.envelopes {
                let Some(payload) = stored.payload else {
                    continue;
                };
                let mut message = wire::decode(&payload)?;
                message.decrypt_with(recipient)?;
                messages.push(message);
            }

            match page.cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        debug!(
            topic = %query.content_topics[0],
            pages,
            messages = messages.len(),
            "History listed"
        );
        Ok(messages)
    }
}
