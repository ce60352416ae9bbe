// Протокол обмена сообщениями: topics, конверты, wire format, транспорт

pub mod message;
pub mod topic;
pub mod transport;
pub mod wire;

pub use message::{Message, MessageHeader};
pub use topic::{contact_topic, derive_topic};
pub use transport::{
    ApiClient, Cursor, HistoryPage, HistoryQuery, Observer, ObserverHandle, PublishEnvelope,
    SortDirection, StoredEnvelope, Transport,
};
