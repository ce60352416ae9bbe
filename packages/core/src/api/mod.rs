// Публичный API для обмена сообщениями
// send / stream / list поверх произвольного транспорта

pub mod messaging;
pub mod stream;

pub use messaging::{Client, ListOptions};
pub use stream::{MessageStream, StreamHandle};
