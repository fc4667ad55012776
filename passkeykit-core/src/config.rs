use std::{fmt, future::Future, sync::Arc};

use futures::future::BoxFuture;
use secrecy::SecretString;
use serde::Deserialize;

use crate::{
    amount::Amount,
    defaults::{default_starting_balance, NetworkEndpoints, DEFAULT_PHRASE},
    error::PasskeyKitError,
    keys::DerivedKeypair,
    provisioner::FundingStrategy,
    Network,
};

/// Error type returned by caller supplied hooks.
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

/// Future returned by a [`Hook`].
pub type HookFuture = BoxFuture<'static, Result<(), HookError>>;

/// A caller supplied hook receiving the canonical keypair and its account id.
pub type Hook = Arc<dyn Fn(DerivedKeypair, String) -> HookFuture + Send + Sync>;

/// Immutable configuration of a [`crate::PasskeyWallet`].
pub struct WalletConfig {
    network: Network,
    parent_secret: SecretString,
    phrase: String,
    starting_balance: Amount,
    funding: FundingStrategy,
    endpoints: NetworkEndpoints,
    on_after_retrieved: Option<Hook>,
    on_after_created: Option<Hook>,
}

impl WalletConfig {
    /// Creates a configuration for `network`, funding new accounts from the
    /// account whose secret seed (`S...`) is `parent_secret`.
    ///
    /// Every other setting starts from its default: phrase `"stellar_phrase"`,
    /// a starting balance of 5 lumens, parent funding, the shipped endpoints
    /// for `network` and no hooks.
    #[must_use]
    pub fn new(network: Network, parent_secret: impl Into<String>) -> Self {
        Self {
            network,
            parent_secret: SecretString::from(parent_secret.into()),
            phrase: DEFAULT_PHRASE.to_string(),
            starting_balance: default_starting_balance(),
            funding: FundingStrategy::default(),
            endpoints: NetworkEndpoints::from_network(network),
            on_after_retrieved: None,
            on_after_created: None,
        }
    }

    /// Parses a JSON settings document.
    ///
    /// ```json
    /// { "network": "testnet", "parent_secret": "S...", "phrase": "stellar_phrase",
    ///   "starting_balance": "5", "use_friendbot": false,
    ///   "horizon_url": null, "friendbot_url": null }
    /// ```
    ///
    /// # Errors
    /// Returns [`PasskeyKitError::InvalidInput`] when the document or one of its values is invalid.
    pub fn from_json(json: &str) -> Result<Self, PasskeyKitError> {
        let settings: WalletSettings = serde_json::from_str(json)
            .map_err(|e| PasskeyKitError::invalid_input("config", e.to_string()))?;

        let network = settings
            .network
            .parse::<Network>()
            .map_err(|_| PasskeyKitError::invalid_input("network", "unknown network"))?;

        let mut config = Self::new(network, settings.parent_secret);
        if let Some(phrase) = settings.phrase {
            config = config.with_phrase(phrase)?;
        }
        if let Some(balance) = settings.starting_balance {
            let balance = match balance {
                serde_json::Value::String(s) => s.parse()?,
                serde_json::Value::Number(n) => n.to_string().parse()?,
                _ => {
                    return Err(PasskeyKitError::invalid_input(
                        "starting_balance",
                        "expected a string or a number",
                    ))
                }
            };
            config = config.with_starting_balance(balance);
        }
        if settings.use_friendbot {
            config = config.with_funding(FundingStrategy::Faucet);
        }

        let mut endpoints = NetworkEndpoints::from_network(network);
        if let Some(url) = settings.horizon_url.as_deref() {
            endpoints = endpoints.with_horizon_url(url)?;
        }
        if let Some(url) = settings.friendbot_url.as_deref() {
            endpoints = endpoints.with_friendbot_url(url)?;
        }
        Ok(config.with_endpoints(endpoints))
    }

    /// Sets the identifier passkeys are looked up and enrolled under.
    ///
    /// # Errors
    /// Returns an error if `phrase` is empty.
    pub fn with_phrase(mut self, phrase: impl Into<String>) -> Result<Self, PasskeyKitError> {
        let phrase = phrase.into();
        if phrase.is_empty() {
            return Err(PasskeyKitError::invalid_input("phrase", "phrase is empty"));
        }
        self.phrase = phrase;
        Ok(self)
    }

    /// Sets the balance new accounts are created with.
    #[must_use]
    pub fn with_starting_balance(mut self, starting_balance: Amount) -> Self {
        self.starting_balance = starting_balance;
        self
    }

    /// Selects how new accounts are funded.
    #[must_use]
    pub fn with_funding(mut self, funding: FundingStrategy) -> Self {
        self.funding = funding;
        self
    }

    /// Overrides the service endpoints. The network passphrase travels with them.
    #[must_use]
    pub fn with_endpoints(mut self, endpoints: NetworkEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Registers the hook run after an existing account was resolved.
    #[must_use]
    pub fn on_after_retrieved<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(DerivedKeypair, String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HookError>> + Send + 'static,
    {
        self.on_after_retrieved = Some(boxed_hook(hook));
        self
    }

    /// Registers the hook run after a new account was created.
    #[must_use]
    pub fn on_after_created<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(DerivedKeypair, String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HookError>> + Send + 'static,
    {
        self.on_after_created = Some(boxed_hook(hook));
        self
    }

    /// The configured network.
    #[must_use]
    pub const fn network(&self) -> Network {
        self.network
    }

    /// The default passkey identifier.
    #[must_use]
    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    /// The balance new accounts start with.
    #[must_use]
    pub const fn starting_balance(&self) -> Amount {
        self.starting_balance
    }

    /// How new accounts are funded.
    #[must_use]
    pub const fn funding(&self) -> FundingStrategy {
        self.funding
    }

    /// The service endpoints.
    #[must_use]
    pub const fn endpoints(&self) -> &NetworkEndpoints {
        &self.endpoints
    }

    pub(crate) const fn parent_secret(&self) -> &SecretString {
        &self.parent_secret
    }

    pub(crate) const fn after_retrieved(&self) -> Option<&Hook> {
        self.on_after_retrieved.as_ref()
    }

    pub(crate) const fn after_created(&self) -> Option<&Hook> {
        self.on_after_created.as_ref()
    }
}

impl fmt::Debug for WalletConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletConfig")
            .field("network", &self.network)
            .field("parent_secret", &"[REDACTED]")
            .field("phrase", &self.phrase)
            .field("starting_balance", &self.starting_balance)
            .field("funding", &self.funding)
            .field("endpoints", &self.endpoints)
            .field("on_after_retrieved", &self.on_after_retrieved.is_some())
            .field("on_after_created", &self.on_after_created.is_some())
            .finish()
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct WalletSettings {
    network: String,
    parent_secret: String,
    phrase: Option<String>,
    starting_balance: Option<serde_json::Value>,
    #[serde(default)]
    use_friendbot: bool,
    horizon_url: Option<String>,
    friendbot_url: Option<String>,
}

fn boxed_hook<F, Fut>(hook: F) -> Hook
where
    F: Fn(DerivedKeypair, String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HookError>> + Send + 'static,
{
    Arc::new(move |keypair: DerivedKeypair, public_key: String| -> HookFuture {
        Box::pin(hook(keypair, public_key))
    })
}
