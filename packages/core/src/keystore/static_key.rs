// Провайдер из явно переданного identity секрета

use crate::crypto::keys::PrivateKeyBundle;
use crate::crypto::wallet::Signer;
use crate::keystore::{Keystore, KeystoreProvider, KeystoreProviderOptions};
use crate::protocol::transport::ApiClient;
use crate::utils::error::{OverlayError, Result};
use async_trait::async_trait;
use tracing::debug;

/// Строит keystore из `private_key_override`. Сеть и кошелёк не нужны.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticKeystoreProvider;

#[async_trait]
impl KeystoreProvider for StaticKeystoreProvider {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn new_keystore(
        &self,
        options: &KeystoreProviderOptions,
        _api_client: &dyn ApiClient,
        wallet: Option<&dyn Signer>,
    ) -> Result<Keystore> {
        let Some(secret) = options.private_key_override.as_deref() else {
            return Err(OverlayError::KeystoreProviderUnavailable(
                "no private key override supplied".to_string(),
            ));
        };

        let keys = PrivateKeyBundle::from_identity_secret(secret)
            .map_err(|e| OverlayError::InvalidInput(format!("private key override: {}", e)))?;

        debug!(address = ?keys.address_identifier(), "Loaded identity from override");
        Ok(Keystore::new(keys, wallet.map(|w| w.address()), options))
    }
}
