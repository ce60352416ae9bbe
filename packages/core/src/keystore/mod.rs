//! Keystore bootstrap
//!
//! Провайдер либо возвращает готовый [`Keystore`], либо сообщает
//! `KeystoreProviderUnavailable`, и вызывающая сторона пробует следующий.
//!
//! ```text
//! bootstrap_keystore([Static, KeyGenerator])
//!   ├── StaticKeystoreProvider       - ключ из private_key_override
//!   └── KeyGeneratorKeystoreProvider - новые ключи, авторизованные кошельком
//! ```

pub mod generator;
pub mod static_key;

use crate::config::Environment;
use crate::crypto::keys::{PrivateKeyBundle, PublicKeyBundle};
use crate::crypto::wallet::Signer;
use crate::protocol::transport::ApiClient;
use crate::utils::error::{OverlayError, Result};
use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::debug;

pub use generator::KeyGeneratorKeystoreProvider;
pub use static_key::StaticKeystoreProvider;

/// Async hook, вызываемый перед созданием identity (например, чтобы предупредить пользователя о подписи)
pub type PreCreateIdentityNotifier =
    Arc<dyn Fn() -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Параметры одной попытки bootstrap
#[derive(Clone, Default)]
pub struct KeystoreProviderOptions {
    pub env: Environment,
    pub persist_conversations: bool,
    pub private_key_override: Option<Vec<u8>>,
    pub pre_create_identity_notifier: Option<PreCreateIdentityNotifier>,
}

impl KeystoreProviderOptions {
    pub fn new(env: Environment) -> Self {
        Self {
            env,
            ..Self::default()
        }
    }

    pub fn persist_conversations(mut self, persist: bool) -> Self {
        self.persist_conversations = persist;
        self
    }

    pub fn with_private_key_override(mut self, key: Vec<u8>) -> Self {
        self.private_key_override = Some(key);
        self
    }

    pub fn with_pre_create_identity_notifier<F, Fut>(mut self, notifier: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.pre_create_identity_notifier = Some(Arc::new(move || Box::pin(notifier())));
        self
    }
}

impl fmt::Debug for KeystoreProviderOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeystoreProviderOptions")
            .field("env", &self.env)
            .field("persist_conversations", &self.persist_conversations)
            .field("private_key_override", &self.private_key_override.as_ref().map(|_| "<redacted>"))
            .field("pre_create_identity_notifier", &self.pre_create_identity_notifier.is_some())
            .finish()
    }
}

/// Готовый к работе keystore
#[derive(Debug, Clone)]
pub struct Keystore {
    keys: PrivateKeyBundle,
    wallet_address: Option<String>,
    env: Environment,
    persist_conversations: bool,
}

impl Keystore {
    pub fn new(keys: PrivateKeyBundle, wallet_address: Option<String>, options: &KeystoreProviderOptions) -> Self {
        Self {
            keys,
            wallet_address,
            env: options.env,
            persist_conversations: options.persist_conversations,
        }
    }

    pub fn private_key_bundle(&self) -> &PrivateKeyBundle {
        &self.keys
    }

    pub fn public_key_bundle(&self) -> PublicKeyBundle {
        self.keys.public_key_bundle()
    }

    pub fn address_identifier(&self) -> Option<String> {
        self.keys.address_identifier()
    }

    pub fn wallet_address(&self) -> Option<&str> {
        self.wallet_address.as_deref()
    }

    pub fn env(&self) -> Environment {
        self.env
    }

    pub fn persist_conversations(&self) -> bool {
        self.persist_conversations
    }
}

/// Стратегия bootstrap. Каждая реализация независима и не делит состояние с другими.
#[async_trait]
pub trait KeystoreProvider: Send + Sync {
    /// Имя для логов
    fn name(&self) -> &'static str;

    async fn new_keystore(
        &self,
        options: &KeystoreProviderOptions,
        api_client: &dyn ApiClient,
        wallet: Option<&dyn Signer>,
    ) -> Result<Keystore>;
}

/// Пробовать провайдеры по порядку, пропуская недоступные.
/// Любая другая ошибка прерывает цепочку.
pub async fn bootstrap_keystore(
    providers: &[Box<dyn KeystoreProvider>],
    options: &KeystoreProviderOptions,
    api_client: &dyn ApiClient,
    wallet: Option<&dyn Signer>,
) -> Result<Keystore> {
    for provider in providers {
        match provider.new_keystore(options, api_client, wallet).await {
            Ok(keystore) => {
                debug!(provider = provider.name(), "Keystore ready");
                return Ok(keystore);
            }
            Err(e) if e.is_unavailable() => {
                debug!(provider = provider.name(), reason = %e, "Keystore provider unavailable");
            }
            Err(e) => return Err(e),
        }
    }

    Err(OverlayError::KeystoreProviderUnavailable(
        "no keystore provider could supply keys".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryTransport;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Failing;

    #[async_trait]
    impl KeystoreProvider for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn new_keystore(
            &self,
            _options: &KeystoreProviderOptions,
            _api_client: &dyn ApiClient,
            _wallet: Option<&dyn Signer>,
        ) -> Result<Keystore> {
            Err(OverlayError::Transport("network down".into()))
        }
    }

    struct Counting(Arc<AtomicUsize>);

    #[async_trait]
    impl KeystoreProvider for Counting {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn new_keystore(
            &self,
            options: &KeystoreProviderOptions,
            _api_client: &dyn ApiClient,
            _wallet: Option<&dyn Signer>,
        ) -> Result<Keystore> {
            self.0.fetch_add(1, Ordering::SeqCst);
            let keys = PrivateKeyBundle::generate().map_err(OverlayError::Encryption)?;
            Ok(Keystore::new(keys, None, options))
        }
    }

    #[tokio::test]
    async fn test_bootstrap_skips_unavailable_providers() {
        let transport = MemoryTransport::new();
        let options = KeystoreProviderOptions::new(Environment::Local).persist_conversations(true);
        let providers: Vec<Box<dyn KeystoreProvider>> =
            vec![Box::new(StaticKeystoreProvider), Box::new(KeyGeneratorKeystoreProvider)];

        let result = bootstrap_keystore(&providers, &options, &transport, None).await;
        assert!(matches!(result, Err(OverlayError::KeystoreProviderUnavailable(_))));
        assert_eq!(transport.publish_count(), 0);
    }

    #[tokio::test]
    async fn test_bootstrap_stops_at_first_success() {
        let transport = MemoryTransport::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let options = KeystoreProviderOptions::new(Environment::Local).persist_conversations(true);
        let providers: Vec<Box<dyn KeystoreProvider>> = vec![
            Box::new(StaticKeystoreProvider),
            Box::new(Counting(calls.clone())),
            Box::new(Counting(calls.clone())),
        ];

        let keystore = bootstrap_keystore(&providers, &options, &transport, None).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(keystore.env(), Environment::Local);
        assert!(keystore.persist_conversations());
        assert!(keystore.address_identifier().is_some());
    }

    #[tokio::test]
    async fn test_bootstrap_propagates_other_errors() {
        let transport = MemoryTransport::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let options = KeystoreProviderOptions::default();
        let providers: Vec<Box<dyn KeystoreProvider>> =
            vec![Box::new(Failing), Box::new(Counting(calls.clone()))];

        let result = bootstrap_keystore(&providers, &options, &transport, None).await;
        assert!(matches!(result, Err(OverlayError::Transport(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_options_debug_hides_key_override() {
        let options = KeystoreProviderOptions::default().with_private_key_override(vec![0x42; 32]);
        let debug = format!("{:?}", options);
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("66"));
    }
}
