// Модуль хранилища: store-and-forward бэкенды

pub mod memory;

pub use memory::MemoryTransport;
