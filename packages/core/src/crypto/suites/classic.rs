use crate::crypto::provider::CryptoProvider;
use crate::error::CryptoError;
use chacha20poly1305::{
    aead::{Aead, Payload},
    ChaCha20Poly1305, Key as AeadKeyChacha, KeyInit, Nonce,
};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use hkdf::Hkdf;
use rand::rngs::OsRng;
use rand_core::RngCore;
use sha2::Sha256;
use x25519_dalek::{PublicKey as KemPublicKeyDalek, StaticSecret};

const AEAD_KEY_LEN: usize = 32;
const AEAD_NONCE_LEN: usize = 12;

/// Concrete implementation of `CryptoProvider` for the classic suite.
pub struct ClassicSuiteProvider;

fn to_array32(bytes: &[u8], what: &str) -> Result<[u8; 32], CryptoError> {
    bytes
        .try_into()
        .map_err(|_| CryptoError::InvalidInputError(format!("Invalid {} length", what)))
}

impl CryptoProvider for ClassicSuiteProvider {
    type KemPublicKey = Vec<u8>;
    type KemPrivateKey = Vec<u8>;
    type SignaturePublicKey = Vec<u8>;
    type SignaturePrivateKey = Vec<u8>;
    type AeadKey = Vec<u8>;

    fn generate_kem_keys() -> Result<(Self::KemPrivateKey, Self::KemPublicKey), CryptoError> {
        let private_key = StaticSecret::random_from_rng(OsRng);
        let public_key = KemPublicKeyDalek::from(&private_key);
        Ok((private_key.to_bytes().to_vec(), public_key.to_bytes().to_vec()))
    }

    fn from_private_key_to_public_key(
        private_key: &Self::KemPrivateKey,
    ) -> Result<Self::KemPublicKey, CryptoError> {
        let static_secret = StaticSecret::from(to_array32(private_key, "KEM private key")?);
        let public_key = KemPublicKeyDalek::from(&static_secret);
        Ok(public_key.to_bytes().to_vec())
    }

    fn diffie_hellman(
        private_key: &Self::KemPrivateKey,
        public_key: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        let static_secret = StaticSecret::from(to_array32(private_key, "KEM private key")?);
        let remote = KemPublicKeyDalek::from(to_array32(public_key, "KEM public key")?);
        let shared_secret = static_secret.diffie_hellman(&remote);
        Ok(shared_secret.to_bytes().to_vec())
    }

    fn generate_signature_keys(
    ) -> Result<(Self::SignaturePrivateKey, Self::SignaturePublicKey), CryptoError> {
        let signing_key = SigningKey::generate(&mut OsRng);
        let verifying_key = signing_key.verifying_key();
        Ok((
            signing_key.to_bytes().to_vec(),
            verifying_key.to_bytes().to_vec(),
        ))
    }

    fn from_signature_private_to_public(
        private_key: &Self::SignaturePrivateKey,
    ) -> Result<Self::SignaturePublicKey, CryptoError> {
        let signing_key = SigningKey::from_bytes(&to_array32(private_key, "signing key")?);
        Ok(signing_key.verifying_key().to_bytes().to_vec())
    }

    fn sign(private_key: &Self::SignaturePrivateKey, message: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let signing_key = SigningKey::from_bytes(&to_array32(private_key, "signing key")?);
        let signature = signing_key.sign(message);
        Ok(signature.to_bytes().to_vec())
    }

    fn verify(public_key: &[u8], message: &[u8], signature: &[u8]) -> Result<(), CryptoError> {
        let verifying_key = VerifyingKey::from_bytes(&to_array32(public_key, "verifying key")?)
            .map_err(|e| CryptoError::InvalidInputError(format!("Invalid verifying key: {}", e)))?;

        let sig_bytes: &[u8; 64] = signature
            .try_into()
            .map_err(|_| CryptoError::InvalidInputError("Invalid signature length".to_string()))?;
        let signature_obj = Signature::from_bytes(sig_bytes);

        verifying_key
            .verify(message, &signature_obj)
            .map_err(|e| CryptoError::SignatureVerificationError(e.to_string()))
    }

    fn aead_encrypt(
        key: &Self::AeadKey,
        nonce: &[u8],
        plaintext: &[u8],
        associated_data: Option<&[u8]>,
    ) -> Result<Vec<u8>, CryptoError> {
        if key.len() != AEAD_KEY_LEN || nonce.len() != AEAD_NONCE_LEN {
            return Err(CryptoError::InvalidInputError(
                "Invalid AEAD key or nonce length".to_string(),
            ));
        }
        let cipher = ChaCha20Poly1305::new(AeadKeyChacha::from_slice(key));
        let payload = Payload {
            msg: plaintext,
            aad: associated_data.unwrap_or(b""),
        };

        cipher
            .encrypt(Nonce::from_slice(nonce), payload)
            .map_err(|e| CryptoError::AeadEncryptionError(e.to_string()))
    }

    fn aead_decrypt(
        key: &Self::AeadKey,
        nonce: &[u8],
        ciphertext: &[u8],
        associated_data: Option<&[u8]>,
    ) -> Result<Vec<u8>, CryptoError> {
        // from_slice паникует на неверной длине, а nonce приходит из сети
        if key.len() != AEAD_KEY_LEN || nonce.len() != AEAD_NONCE_LEN {
            return Err(CryptoError::InvalidInputError(
                "Invalid AEAD key or nonce length".to_string(),
            ));
        }
        let cipher = ChaCha20Poly1305::new(AeadKeyChacha::from_slice(key));
        let payload = Payload {
            msg: ciphertext,
            aad: associated_data.unwrap_or(b""),
        };

        cipher
            .decrypt(Nonce::from_slice(nonce), payload)
            .map_err(|e| CryptoError::AeadDecryptionError(e.to_string()))
    }

    fn aead_key_from_bytes(bytes: Vec<u8>) -> Self::AeadKey {
        bytes
    }

    fn kem_private_key_from_bytes(bytes: Vec<u8>) -> Self::KemPrivateKey {
        bytes
    }

    fn hkdf_derive_key(
        salt: &[u8],
        ikm: &[u8],
        info: &[u8],
        len: usize,
    ) -> Result<Vec<u8>, CryptoError> {
        let hkdf = Hkdf::<Sha256>::new(Some(salt), ikm);
        let mut okm = vec![0u8; len];
        hkdf.expand(info, &mut okm)
            .map_err(|e| CryptoError::KeyDerivationError(e.to_string()))?;
        Ok(okm)
    }

    fn generate_nonce(len: usize) -> Result<Vec<u8>, CryptoError> {
        let mut nonce_bytes = vec![0u8; len];
        OsRng.try_fill_bytes(&mut nonce_bytes)?;
        Ok(nonce_bytes)
    }

    fn aead_nonce_len() -> usize {
        AEAD_NONCE_LEN
    }
}
