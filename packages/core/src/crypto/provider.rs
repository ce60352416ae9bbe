//! Defines the CryptoProvider trait for crypto-agility.

use crate::error::CryptoError;
use core::fmt::Debug;

/// Trait that formalizes the cryptographic primitives behind key bundles.
/// Envelope sealing only ever talks to this trait, never to a concrete curve or cipher.
pub trait CryptoProvider: Send + Sync + 'static {
    type KemPublicKey: AsRef<[u8]> + Debug + Clone + 'static;
    type KemPrivateKey: AsRef<[u8]> + Debug + Clone + 'static;
    type SignaturePublicKey: AsRef<[u8]> + Debug + Clone + 'static;
    type SignaturePrivateKey: AsRef<[u8]> + Debug + Clone + 'static;
    type AeadKey: AsRef<[u8]> + Debug + Clone + Default + 'static;

    /// Generates a new key-agreement key pair.
    fn generate_kem_keys() -> Result<(Self::KemPrivateKey, Self::KemPublicKey), CryptoError>;

    /// Derives a key-agreement public key from its private key.
    fn from_private_key_to_public_key(private_key: &Self::KemPrivateKey) -> Result<Self::KemPublicKey, CryptoError>;

    /// Raw Diffie-Hellman between a local private key and a remote public key.
    fn diffie_hellman(private_key: &Self::KemPrivateKey, public_key: &[u8]) -> Result<Vec<u8>, CryptoError>;

    /// Generates a new Signature key pair.
    fn generate_signature_keys() -> Result<(Self::SignaturePrivateKey, Self::SignaturePublicKey), CryptoError>;

    /// Derives a Signature public key from a Signature private key.
    fn from_signature_private_to_public(private_key: &Self::SignaturePrivateKey) -> Result<Self::SignaturePublicKey, CryptoError>;

    /// Signs a message with the given private key.
    fn sign(private_key: &Self::SignaturePrivateKey, message: &[u8]) -> Result<Vec<u8>, CryptoError>;

    /// Verifies a signature with the given raw public key bytes.
    fn verify(public_key: &[u8], message: &[u8], signature: &[u8]) -> Result<(), CryptoError>;

    /// Performs AEAD encryption.
    /// `key`: The symmetric encryption key.
    /// `nonce`: The unique nonce for this encryption.
    /// `plaintext`: The data to encrypt.
    /// `associated_data`: Optional associated data (authenticated but not encrypted).
    fn aead_encrypt(
        key: &Self::AeadKey,
        nonce: &[u8],
        plaintext: &[u8],
        associated_data: Option<&[u8]>,
    ) -> Result<Vec<u8>, CryptoError>;

    /// Performs AEAD decryption.
    fn aead_decrypt(
        key: &Self::AeadKey,
        nonce: &[u8],
        ciphertext: &[u8],
        associated_data: Option<&[u8]>,
    ) -> Result<Vec<u8>, CryptoError>;

    /// Creates an AEAD key from raw bytes
    fn aead_key_from_bytes(bytes: Vec<u8>) -> Self::AeadKey;

    /// Creates a key-agreement private key from raw bytes
    fn kem_private_key_from_bytes(bytes: Vec<u8>) -> Self::KemPrivateKey;

    /// Derives a key from input key material using HKDF.
    fn hkdf_derive_key(
        salt: &[u8],
        ikm: &[u8],
        info: &[u8],
        len: usize,
    ) -> Result<Vec<u8>, CryptoError>;

    /// Generates a cryptographically secure random nonce of a specified length.
    fn generate_nonce(len: usize) -> Result<Vec<u8>, CryptoError>;

    /// Length of the AEAD nonce this suite expects.
    fn aead_nonce_len() -> usize;
}
