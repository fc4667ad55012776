//! Deterministic Ed25519 keypairs derived from passkey material.

use std::fmt;

use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

use crate::error::PasskeyKitError;

pub mod strkey;

/// Length of an Ed25519 seed.
pub const SEED_LEN: usize = 32;

/// A byte generator seeded by arbitrary input.
///
/// The stream is the concatenation of SHA-256 blocks, each block being the
/// hash of the previous one and the first the hash of the seed. Bytes are
/// handed out in order across calls, so `take(16)` twice yields the same
/// bytes as `take(32)`.
pub struct SeededBytes {
    state: Vec<u8>,
    block: [u8; 32],
    cursor: usize,
}

impl SeededBytes {
    /// Creates a generator keyed by `seed`.
    #[must_use]
    pub fn new(seed: &[u8]) -> Self {
        Self {
            state: seed.to_vec(),
            block: [0; 32],
            cursor: 32,
        }
    }

    /// Returns the next `len` bytes of the stream.
    pub fn take(&mut self, len: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(len);
        while out.len() < len {
            if self.cursor == self.block.len() {
                self.next_block();
            }
            let needed = (len - out.len()).min(self.block.len() - self.cursor);
            out.extend_from_slice(&self.block[self.cursor..self.cursor + needed]);
            self.cursor += needed;
        }
        out
    }

    fn next_block(&mut self) {
        let block: [u8; 32] = Sha256::digest(&self.state).into();
        self.state.zeroize();
        self.state = block.to_vec();
        self.block = block;
        self.cursor = 0;
    }
}

impl Drop for SeededBytes {
    fn drop(&mut self) {
        self.state.zeroize();
        self.block.zeroize();
    }
}

/// An Ed25519 keypair together with the seed it was built from.
#[derive(Clone)]
pub struct DerivedKeypair {
    seed: [u8; SEED_LEN],
    signing_key: SigningKey,
    public_key: String,
}

impl DerivedKeypair {
    /// Derives a keypair from `source`, typically a stringified passkey public key.
    ///
    /// # Errors
    /// Returns [`PasskeyKitError::InvalidInput`] for an empty source and
    /// [`PasskeyKitError::InvalidSeedLength`] if the expansion is short.
    pub fn derive(source: &str) -> Result<Self, PasskeyKitError> {
        if source.is_empty() {
            return Err(PasskeyKitError::invalid_input(
                "source",
                "cannot derive a keypair from an empty source",
            ));
        }

        let mut expanded = SeededBytes::new(source.as_bytes()).take(SEED_LEN);
        let seed: [u8; SEED_LEN] = expanded.as_slice().try_into().map_err(|_| {
            PasskeyKitError::InvalidSeedLength {
                expected: SEED_LEN,
                actual: expanded.len(),
            }
        })?;
        expanded.zeroize();

        Ok(Self::from_seed(seed))
    }

    /// Loads a keypair from a Stellar secret seed (`S...`).
    ///
    /// # Errors
    /// Returns [`PasskeyKitError::InvalidStrkey`] if `secret` is not a valid seed.
    pub fn from_secret_seed(secret: &str) -> Result<Self, PasskeyKitError> {
        let seed = strkey::decode(strkey::VERSION_SECRET_SEED, secret)?;
        Ok(Self::from_seed(seed))
    }

    /// Builds a keypair from a raw 32-byte Ed25519 seed.
    #[must_use]
    pub fn from_seed(seed: [u8; SEED_LEN]) -> Self {
        let signing_key = SigningKey::from_bytes(&seed);
        let public_key = strkey::encode(
            strkey::VERSION_ACCOUNT_ID,
            signing_key.verifying_key().as_bytes(),
        );
        Self {
            seed,
            signing_key,
            public_key,
        }
    }

    /// The raw seed.
    #[must_use]
    pub const fn seed(&self) -> &[u8; SEED_LEN] {
        &self.seed
    }

    /// The account id (`G...`) of this keypair.
    #[must_use]
    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    /// The secret seed (`S...`) of this keypair.
    #[must_use]
    pub fn secret_seed(&self) -> String {
        strkey::encode(strkey::VERSION_SECRET_SEED, &self.seed)
    }

    /// The Ed25519 public key.
    #[must_use]
    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Signs `message`.
    #[must_use]
    pub fn sign(&self, message: &[u8]) -> Signature {
        self.signing_key.sign(message)
    }
}

impl fmt::Debug for DerivedKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedKeypair")
            .field("seed", &"[REDACTED]")
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}

impl PartialEq for DerivedKeypair {
    fn eq(&self, other: &Self) -> bool {
        self.public_key == other.public_key
    }
}

impl Eq for DerivedKeypair {}

impl Drop for DerivedKeypair {
    fn drop(&mut self) {
        self.seed.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use ed25519_dalek::Verifier;

    use super::*;

    #[test]
    fn test_derive_is_deterministic() {
        let a = DerivedKeypair::derive("passkey-public-key").unwrap();
        let b = DerivedKeypair::derive("passkey-public-key").unwrap();
        assert_eq!(a.seed(), b.seed());
        assert_eq!(a.public_key(), b.public_key());
        assert_eq!(a.secret_seed(), b.secret_seed());
    }

    #[test]
    fn test_first_block_is_sha256_of_source() {
        let keypair = DerivedKeypair::derive("abc").unwrap();
        let expected: [u8; 32] = Sha256::digest(b"abc").into();
        assert_eq!(keypair.seed(), &expected);
    }

    #[test]
    fn test_distinct_sources_give_distinct_keys() {
        let a = DerivedKeypair::derive("one").unwrap();
        let b = DerivedKeypair::derive("two").unwrap();
        assert_ne!(a.public_key(), b.public_key());
    }

    #[test]
    fn test_empty_source_is_rejected() {
        assert!(matches!(
            DerivedKeypair::derive(""),
            Err(PasskeyKitError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_stream_continues_across_calls() {
        let mut split = SeededBytes::new(b"seed");
        let mut joined = split.take(16);
        joined.extend(split.take(16));
        joined.extend(split.take(40));

        assert_eq!(joined, SeededBytes::new(b"seed").take(72));
    }

    #[test]
    fn test_second_block_hashes_first() {
        let first: [u8; 32] = Sha256::digest(b"seed").into();
        let second: [u8; 32] = Sha256::digest(first).into();
        let stream = SeededBytes::new(b"seed").take(64);
        assert_eq!(stream[..32], first);
        assert_eq!(stream[32..], second);
    }

    #[test]
    fn test_secret_seed_reloads_same_key() {
        let keypair = DerivedKeypair::derive("reload").unwrap();
        let reloaded = DerivedKeypair::from_secret_seed(&keypair.secret_seed()).unwrap();
        assert_eq!(keypair, reloaded);
        assert!(reloaded.public_key().starts_with('G'));
    }

    #[test]
    fn test_signature_verifies() {
        let keypair = DerivedKeypair::derive("signer").unwrap();
        let signature = keypair.sign(b"payload");
        assert!(keypair.verifying_key().verify(b"payload", &signature).is_ok());
    }

    #[test]
    fn test_debug_redacts_seed() {
        let keypair = DerivedKeypair::derive("debug").unwrap();
        let rendered = format!("{keypair:?}");
        assert!(rendered.contains("REDACTED"));
        assert!(!rendered.contains(&hex::encode(keypair.seed())));
    }
}
