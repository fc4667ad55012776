//! Per-network endpoints and the defaults applied when a wallet is configured.

use crate::{amount::Amount, error::PasskeyKitError, Network};

/// Passphrase of the public production network.
pub const MAINNET_PASSPHRASE: &str = "Public Global Stellar Network ; September 2015";

/// Passphrase of the SDF test network.
pub const TESTNET_PASSPHRASE: &str = "Test SDF Network ; September 2015";

/// Horizon instance serving the test network.
pub const TESTNET_HORIZON_URL: &str = "https://horizon-testnet.stellar.org";

/// Friendbot faucet of the test network.
pub const TESTNET_FRIENDBOT_URL: &str = "https://friendbot.stellar.org";

/// Identifier used to look up passkeys when the caller supplies none.
pub const DEFAULT_PHRASE: &str = "stellar_phrase";

/// Starting balance of newly created accounts when the caller supplies none.
#[must_use]
pub fn default_starting_balance() -> Amount {
    Amount::default()
}

/// The service endpoints a wallet talks to.
///
/// A `None` endpoint is unmapped: any operation needing it fails with
/// [`PasskeyKitError::UnsupportedEnvironment`] before a request is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkEndpoints {
    network: Network,
    horizon_url: Option<String>,
    friendbot_url: Option<String>,
    passphrase: String,
}

impl NetworkEndpoints {
    /// Endpoints shipped for `network`.
    #[must_use]
    pub fn from_network(network: Network) -> Self {
        match network {
            // TODO: map a mainnet Horizon once a provider is chosen.
            Network::Mainnet => Self {
                network,
                horizon_url: None,
                friendbot_url: None,
                passphrase: MAINNET_PASSPHRASE.to_string(),
            },
            Network::Testnet => Self {
                network,
                horizon_url: Some(TESTNET_HORIZON_URL.to_string()),
                friendbot_url: Some(TESTNET_FRIENDBOT_URL.to_string()),
                passphrase: TESTNET_PASSPHRASE.to_string(),
            },
        }
    }

    /// Replaces the Horizon endpoint.
    ///
    /// # Errors
    /// Returns an error if `url` is empty.
    pub fn with_horizon_url(mut self, url: &str) -> Result<Self, PasskeyKitError> {
        self.horizon_url = Some(normalize_url("horizon_url", url)?);
        Ok(self)
    }

    /// Replaces the friendbot endpoint.
    ///
    /// # Errors
    /// Returns an error if `url` is empty.
    pub fn with_friendbot_url(mut self, url: &str) -> Result<Self, PasskeyKitError> {
        self.friendbot_url = Some(normalize_url("friendbot_url", url)?);
        Ok(self)
    }

    /// The network these endpoints belong to.
    #[must_use]
    pub const fn network(&self) -> Network {
        self.network
    }

    /// The network passphrase transactions are signed for.
    #[must_use]
    pub fn passphrase(&self) -> &str {
        &self.passphrase
    }

    /// The Horizon base URL.
    ///
    /// # Errors
    /// Returns [`PasskeyKitError::UnsupportedEnvironment`] when unmapped.
    pub fn horizon_url(&self) -> Result<&str, PasskeyKitError> {
        self.horizon_url
            .as_deref()
            .ok_or_else(|| self.unsupported("horizon"))
    }

    /// The friendbot base URL.
    ///
    /// # Errors
    /// Returns [`PasskeyKitError::UnsupportedEnvironment`] when unmapped.
    pub fn friendbot_url(&self) -> Result<&str, PasskeyKitError> {
        self.friendbot_url
            .as_deref()
            .ok_or_else(|| self.unsupported("friendbot"))
    }

    fn unsupported(&self, endpoint: &str) -> PasskeyKitError {
        PasskeyKitError::UnsupportedEnvironment {
            network: self.network.to_string(),
            endpoint: endpoint.to_string(),
        }
    }
}

fn normalize_url(attribute: &str, url: &str) -> Result<String, PasskeyKitError> {
    let url = url.trim().trim_end_matches('/');
    if url.is_empty() {
        return Err(PasskeyKitError::invalid_input(attribute, "url is empty"));
    }
    Ok(url.to_string())
}
