use async_trait::async_trait;

use crate::error::PasskeyKitError;

/// Key type tag of a stringified Ed25519 public key.
const ED25519_PREFIX: &str = "ed25519:";

/// Most candidates a passkey lookup can yield: a primary and a backup credential.
pub const MAX_CANDIDATES: usize = 2;

/// A passkey credential as reported by the platform.
///
/// `public_key` is the 32-byte Ed25519 public key the biometric layer binds to
/// the passkey. Only the public key is ever read; the private part stays
/// inside the authenticator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    public_key: Vec<u8>,
}

impl Credential {
    /// Wraps the raw public key bytes of a credential.
    #[must_use]
    pub const fn new(public_key: Vec<u8>) -> Self {
        Self { public_key }
    }

    /// The raw public key bytes.
    #[must_use]
    pub fn public_key_bytes(&self) -> &[u8] {
        &self.public_key
    }

    /// The stringified public key a Stellar keypair is derived from:
    /// `ed25519:` followed by the base58 encoded key bytes.
    #[must_use]
    pub fn source_string(&self) -> String {
        format!(
            "{ED25519_PREFIX}{}",
            bs58::encode(&self.public_key).into_string()
        )
    }
}

/// The platform's passkey (biometric) authenticator.
///
/// Both operations may suspend on user interaction. Nothing here is retried;
/// errors are returned to the caller as-is.
#[async_trait]
pub trait PasskeyProvider: Send + Sync {
    /// Looks up credentials previously enrolled under `identifier`.
    ///
    /// May return an empty list. Only the first [`MAX_CANDIDATES`] entries are used.
    ///
    /// # Errors
    /// Returns [`PasskeyKitError::CredentialRetrievalFailed`] if the platform lookup fails.
    async fn retrieve_credentials(
        &self,
        identifier: &str,
    ) -> Result<Vec<Credential>, PasskeyKitError>;

    /// Enrolls a new credential under `identifier`.
    ///
    /// # Errors
    /// Returns [`PasskeyKitError::CredentialCreationFailed`] if the platform
    /// rejects enrollment (e.g. the user cancels the biometric prompt).
    async fn create_credential(&self, identifier: &str)
        -> Result<Credential, PasskeyKitError>;
}
