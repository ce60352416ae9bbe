// Pub/sub транспорт
// Узкий набор возможностей, который нужен слою сообщений:
// publish, subscribe с observer, запрос истории по topic и окну времени

use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;

/// Callback, который транспорт вызывает на каждый доставленный payload
pub type Observer = Arc<dyn Fn(Vec<u8>) + Send + Sync>;

/// Идентификатор зарегистрированного observer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverHandle(pub u64);

/// Направление обхода истории
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Forward,
    Backward,
}

/// Непрозрачный курсор следующей страницы
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor(pub Vec<u8>);

/// Запрос истории
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryQuery {
    pub content_topics: Vec<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub page_size: u32,
    pub direction: SortDirection,
}

/// Запись из store-and-forward хранилища. Payload может отсутствовать.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEnvelope {
    pub content_topic: String,
    pub payload: Option<Vec<u8>>,
    pub timestamp: DateTime<Utc>,
}

/// Одна страница истории; `cursor == None`: страниц больше нет
#[derive(Debug, Clone, Default)]
pub struct HistoryPage {
    pub envelopes: Vec<StoredEnvelope>,
    pub cursor: Option<Cursor>,
}

/// Транспорт. Реализации сами отвечают за ретраи и соединение.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn publish(&self, topic: &str, payload: Vec<u8>, timestamp: DateTime<Utc>) -> Result<()>;

    fn subscribe(&self, topics: &[String], on_message: Observer) -> Result<ObserverHandle>;

    /// Повторный вызов для того же handle: no-op
    fn unsubscribe(&self, handle: ObserverHandle);

    async fn query_history(&self, query: &HistoryQuery, cursor: Option<Cursor>) -> Result<HistoryPage>;
}

/// Конверт для публикации через [`ApiClient`]
#[derive(Clone, PartialEq, Eq)]
pub struct PublishEnvelope {
    pub content_topic: String,
    pub message: Vec<u8>,
    pub timestamp: DateTime<Utc>,
}

impl fmt::Debug for PublishEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublishEnvelope")
            .field("content_topic", &self.content_topic)
            .field("message_len", &self.message.len())
            .field("timestamp", &self.timestamp)
            .finish()
    }
}

/// API-клиент, которым пользуются keystore провайдеры
#[async_trait]
pub trait ApiClient: Send + Sync {
    async fn publish_envelopes(&self, envelopes: Vec<PublishEnvelope>) -> Result<()>;
}

#[async_trait]
impl<T: Transport + ?Sized> ApiClient for T {
    async fn publish_envelopes(&self, envelopes: Vec<PublishEnvelope>) -> Result<()> {
        for envelope in envelopes {
            self.publish(&envelope.content_topic, envelope.message, envelope.timestamp)
                .await?;
        }
        Ok(())
    }
}
