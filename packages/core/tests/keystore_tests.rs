//! Keystore bootstrap tests
//!
//! - key generator: wallet requirement, notifier, contact publication
//! - static override: restore, malformed input
//! - provider chain ordering

use construct_overlay::config::Environment;
use construct_overlay::crypto::{LocalWallet, PublicKeyBundle, Signer};
use construct_overlay::keystore::{
    bootstrap_keystore, KeyGeneratorKeystoreProvider, KeystoreProvider, KeystoreProviderOptions,
    StaticKeystoreProvider,
};
use construct_overlay::protocol::{contact_topic, wire};
use construct_overlay::storage::MemoryTransport;
use construct_overlay::{OverlayError, PrivateKeyBundle};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn counting_options(counter: Arc<AtomicUsize>) -> KeystoreProviderOptions {
    KeystoreProviderOptions::new(Environment::Local).with_pre_create_identity_notifier(move || {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    })
}

#[tokio::test]
async fn test_generator_requires_wallet() {
    let transport = MemoryTransport::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let options = counting_options(calls.clone());

    let result = KeyGeneratorKeystoreProvider
        .new_keystore(&options, &transport, None)
        .await;

    assert!(matches!(result, Err(OverlayError::KeystoreProviderUnavailable(_))));
    assert_eq!(calls.load(Ordering::SeqCst), 0, "notifier must not run without a wallet");
    assert_eq!(transport.publish_count(), 0);
}

#[tokio::test]
async fn test_generator_creates_authorized_identity() {
    let transport = MemoryTransport::new();
    let wallet = LocalWallet::generate().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let options = counting_options(calls.clone()).persist_conversations(true);

    let keystore = KeyGeneratorKeystoreProvider
        .new_keystore(&options, &transport, Some(&wallet))
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(keystore.wallet_address(), Some(wallet.address().as_str()));
    assert_eq!(keystore.env(), Environment::Local);
    assert!(keystore.persist_conversations());

    let bundle = keystore.public_key_bundle();
    assert!(bundle.verify_identity(wallet.verifying_key()).is_ok());
    assert!(bundle.pre_key.is_some());

    // Публичный bundle опубликован в contact topic
    let address = keystore.address_identifier().unwrap();
    let published = transport.envelopes_for(&contact_topic(&address).unwrap());
    assert_eq!(published.len(), 1);
    let payload = published[0].payload.clone().unwrap();
    let contact: PublicKeyBundle = wire::unpack_raw(&payload).unwrap();
    assert_eq!(contact, bundle);
}

#[tokio::test]
async fn test_generator_surfaces_publish_failure() {
    let transport = MemoryTransport::new();
    transport.set_offline(true);
    let wallet = LocalWallet::generate().unwrap();

    let result = KeyGeneratorKeystoreProvider
        .new_keystore(&KeystoreProviderOptions::default(), &transport, Some(&wallet))
        .await;
    assert!(matches!(result, Err(OverlayError::Transport(_))));
}

#[tokio::test]
async fn test_static_provider_restores_identity() {
    let transport = MemoryTransport::new();
    let secret = vec![5u8; 32];
    let options = KeystoreProviderOptions::new(Environment::Production).with_private_key_override(secret.clone());

    let keystore = StaticKeystoreProvider
        .new_keystore(&options, &transport, None)
        .await
        .unwrap();

    let expected = PrivateKeyBundle::from_identity_secret(&secret).unwrap();
    assert_eq!(keystore.public_key_bundle(), expected.public_key_bundle());
    assert_eq!(keystore.wallet_address(), None);
    assert_eq!(keystore.env(), Environment::Production);
    assert_eq!(transport.publish_count(), 0);
}

#[tokio::test]
async fn test_static_provider_without_override_is_unavailable() {
    let transport = MemoryTransport::new();
    let result = StaticKeystoreProvider
        .new_keystore(&KeystoreProviderOptions::default(), &transport, None)
        .await;
    assert!(result.unwrap_err().is_unavailable());
}

#[tokio::test]
async fn test_static_provider_rejects_malformed_override() {
    let transport = MemoryTransport::new();
    let options = KeystoreProviderOptions::default().with_private_key_override(vec![1, 2, 3]);

    let result = StaticKeystoreProvider.new_keystore(&options, &transport, None).await;
    assert!(matches!(result, Err(OverlayError::InvalidInput(_))));
}

#[tokio::test]
async fn test_chain_prefers_override_over_generation() {
    let transport = MemoryTransport::new();
    let wallet = LocalWallet::generate().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let options = counting_options(calls.clone()).with_private_key_override(vec![3u8; 32]);
    let providers: Vec<Box<dyn KeystoreProvider>> =
        vec![Box::new(StaticKeystoreProvider), Box::new(KeyGeneratorKeystoreProvider)];

    let keystore = bootstrap_keystore(&providers, &options, &transport, Some(&wallet))
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(transport.publish_count(), 0);
    assert_eq!(keystore.wallet_address(), Some(wallet.address().as_str()));
}

#[tokio::test]
async fn test_chain_falls_through_to_generation() {
    let transport = MemoryTransport::new();
    let wallet = LocalWallet::generate().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let options = counting_options(calls.clone());
    let providers: Vec<Box<dyn KeystoreProvider>> =
        vec![Box::new(StaticKeystoreProvider), Box::new(KeyGeneratorKeystoreProvider)];

    let keystore = bootstrap_keystore(&providers, &options, &transport, Some(&wallet))
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(transport.publish_count(), 1);
    assert!(keystore.public_key_bundle().verify_identity(wallet.verifying_key()).is_ok());
}

#[tokio::test]
async fn test_bootstrapped_keystore_can_message() {
    let transport = Arc::new(MemoryTransport::new());
    let client = construct_overlay::Client::with_config(transport.clone(), Default::default());
    let wallet = LocalWallet::generate().unwrap();
    let providers: Vec<Box<dyn KeystoreProvider>> = vec![Box::new(KeyGeneratorKeystoreProvider)];

    let alice = bootstrap_keystore(&providers, &KeystoreProviderOptions::default(), &*transport, Some(&wallet))
        .await
        .unwrap();
    let bob = PrivateKeyBundle::generate().unwrap();

    client
        .send(alice.private_key_bundle(), &bob.public_key_bundle(), "from keystore")
        .await
        .unwrap();
    let messages = client.list(&bob, Default::default()).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].decrypted.as_deref(), Some("from keystore"));
}
