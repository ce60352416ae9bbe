//! Криптографический модуль
//!
//! # Архитектура
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Messaging Client (api)                     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │              PrivateKeyBundle / PublicKeyBundle             │
//! │  - адрес (topic) из identity key                            │
//! │  - encrypt / decrypt конвертов (triple DH + AEAD)           │
//! │  - подпись identity key кошельком (Signer)                  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │              CryptoProvider (Crypto-Agility)                │
//! │  - Key agreement (X25519)                                   │
//! │  - Signatures (Ed25519)                                     │
//! │  - AEAD (ChaCha20-Poly1305)                                 │
//! │  - KDF (HKDF-SHA256)                                        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Модули
//! - [`provider`]: CryptoProvider trait
//! - [`suites`]: реализации CryptoProvider
//! - [`keys`]: key bundles и шифрование конвертов
//! - [`wallet`]: Signer trait и локальный кошелёк

pub mod provider;

pub mod suites;

pub mod keys;

pub mod wallet;

pub use keys::{Ciphertext, PrivateKey, PrivateKeyBundle, PublicKey, PublicKeyBundle};
pub use provider::CryptoProvider;
pub use wallet::{LocalWallet, Signer};
