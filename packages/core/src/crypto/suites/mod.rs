//! Криптографические наборы (Crypto Suites)
//!
//! Этот модуль содержит реализации CryptoProvider trait.
//!
//! ## Доступные наборы
//!
//! ### Classic Suite (текущий)
//! - **Key agreement**: X25519 (ECDH на Curve25519)
//! - **Signatures**: Ed25519 (локальный кошелёк)
//! - **AEAD**: ChaCha20-Poly1305
//! - **KDF**: HKDF-SHA256
//!
//! ## Выбор suite
//!
//! ```rust
//! use construct_overlay::crypto::suites::classic::ClassicSuiteProvider;
//! use construct_overlay::crypto::provider::CryptoProvider;
//!
//! type MySuite = ClassicSuiteProvider;
//!
//! let (private_key, public_key) = MySuite::generate_kem_keys().unwrap();
//! assert_eq!(public_key, MySuite::from_private_key_to_public_key(&private_key).unwrap());
//! ```

pub mod classic;
