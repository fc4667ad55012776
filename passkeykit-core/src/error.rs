use thiserror::Error;

/// Result type used across `PasskeyKit`.
pub type PasskeyKitResult<T, E = PasskeyKitError> = std::result::Result<T, E>;

/// Error outputs from `PasskeyKit`
#[derive(Debug, Error)]
#[cfg_attr(feature = "ffi", derive(uniffi::Error))]
#[cfg_attr(feature = "ffi", uniffi(flat_error))]
pub enum PasskeyKitError {
    /// The presented input is not valid for the requested operation
    #[error("invalid_input_{attribute}: {reason}")]
    InvalidInput {
        /// Name of the offending attribute.
        attribute: String,
        /// Why the value was rejected.
        reason: String,
    },
    /// The seed expansion did not produce a usable Ed25519 seed
    #[error("invalid_seed_length: expected {expected} bytes, got {actual}")]
    InvalidSeedLength {
        /// Required seed length.
        expected: usize,
        /// Length actually produced.
        actual: usize,
    },
    /// A Stellar strkey could not be decoded
    #[error("invalid_strkey: {0}")]
    InvalidStrkey(String),
    /// The passkey platform failed to look up enrolled credentials
    #[error("credential_retrieval_failed: {0}")]
    CredentialRetrievalFailed(String),
    /// The passkey platform rejected the enrollment of a new credential
    #[error("credential_creation_failed: {0}")]
    CredentialCreationFailed(String),
    /// No endpoint is mapped for the configured network
    #[error("unsupported_environment: {network} has no {endpoint} endpoint configured")]
    UnsupportedEnvironment {
        /// The configured network.
        network: String,
        /// Which endpoint is missing (`horizon`, `friendbot`).
        endpoint: String,
    },
    /// The ledger rejected (or could not be asked to accept) the account creation
    #[error("provisioning_failed: {reason}")]
    ProvisioningFailed {
        /// The ledger's rejection reason.
        reason: String,
    },
    /// The faucet did not fund the account
    #[error("faucet_failed: {0}")]
    FaucetFailed(String),
    /// Network connection error with details
    #[error("network_error at {url}: {error}")]
    NetworkError {
        /// Requested URL.
        url: String,
        /// HTTP status, when a response was received.
        status: Option<u16>,
        /// Error description.
        error: String,
    },
    /// Unexpected error serializing information
    #[error("serialization_error: {0}")]
    SerializationError(String),
    /// A caller supplied hook returned an error
    #[error("hook_failed: {0}")]
    HookFailed(String),
    /// HTTP request failure
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),
}

impl PasskeyKitError {
    pub(crate) fn invalid_input(attribute: &str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            attribute: attribute.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for PasskeyKitError {
    fn from(error: serde_json::Error) -> Self {
        Self::SerializationError(error.to_string())
    }
}
