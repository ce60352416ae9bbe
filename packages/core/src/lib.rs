// Construct Overlay
// Topic-addressed E2EE messaging поверх произвольного pub/sub транспорта

#![warn(clippy::all)]

// Модули
pub mod api;
pub mod config;
pub mod crypto;
pub mod error;
pub mod keystore;
pub mod protocol;
pub mod storage;
pub mod utils;

// Re-exports для удобства
pub use api::{Client, ListOptions, MessageStream, StreamHandle};
pub use config::{Config, Environment};
pub use crypto::{LocalWallet, PrivateKeyBundle, PublicKeyBundle, Signer};
pub use keystore::{
    bootstrap_keystore, KeyGeneratorKeystoreProvider, Keystore, KeystoreProvider,
    KeystoreProviderOptions, StaticKeystoreProvider,
};
pub use protocol::{derive_topic, Message, Transport};
pub use storage::MemoryTransport;
pub use utils::error::{OverlayError, Result};
