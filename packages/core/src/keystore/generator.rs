// Провайдер, генерирующий новые ключи и авторизующий их кошельком

use crate::crypto::keys::PrivateKeyBundle;
use crate::crypto::wallet::{identity_authorization_message, Signer};
use crate::keystore::{Keystore, KeystoreProvider, KeystoreProviderOptions};
use crate::protocol::topic::contact_topic;
use crate::protocol::transport::{ApiClient, PublishEnvelope};
use crate::protocol::wire;
use crate::utils::error::{OverlayError, Result};
use async_trait::async_trait;
use chrono::Utc;
use tracing::info;

/// Создаёт identity с нуля. Без кошелька недоступен.
///
/// После авторизации публичный bundle публикуется в contact topic, чтобы
/// другие стороны могли найти ключи по адресу.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyGeneratorKeystoreProvider;

#[async_trait]
impl KeystoreProvider for KeyGeneratorKeystoreProvider {
    fn name(&self) -> &'static str {
        "key-generator"
    }

    async fn new_keystore(
        &self,
        options: &KeystoreProviderOptions,
        api_client: &dyn ApiClient,
        wallet: Option<&dyn Signer>,
    ) -> Result<Keystore> {
        let Some(wallet) = wallet else {
            return Err(OverlayError::KeystoreProviderUnavailable(
                "a wallet is required to create a new identity".to_string(),
            ));
        };

        if let Some(notify) = &options.pre_create_identity_notifier {
            notify().await;
        }

        let mut keys = PrivateKeyBundle::generate().map_err(OverlayError::Encryption)?;
        let identity = keys
            .public_key_bundle()
            .identity_key
            .ok_or_else(|| OverlayError::Wallet("generated bundle has no identity key".to_string()))?;

        let signature = wallet
            .sign_message(&identity_authorization_message(&identity.key_bytes))
            .await?;
        keys.set_identity_signature(signature)
            .map_err(|e| OverlayError::Wallet(e.to_string()))?;

        let address = keys
            .address_identifier()
            .ok_or(OverlayError::MissingRecipient)?;
        let contact = PublishEnvelope {
            content_topic: contact_topic(&address)?,
            message: wire::pack_raw(&keys.public_key_bundle())?,
            timestamp: Utc::now(),
        };
        api_client.publish_envelopes(vec![contact]).await?;

        info!(address = %address, wallet = %wallet.address(), env = %options.env, "Created new identity");
        Ok(Keystore::new(keys, Some(wallet.address()), options))
    }
}
