//! The create-or-resume flow tying passkeys to ledger accounts.
//!
//! ```text
//! Start -> CandidatesRetrieved -> CandidatesChecked -> Resolved(Existing) ----------------> Done
//!                                                   \-> Resolved(New) -> Provisioned -> Done
//! ```

use futures::future::join_all;

use crate::{
    config::{Hook, WalletConfig},
    credential::{PasskeyProvider, MAX_CANDIDATES},
    error::PasskeyKitError,
    keys::DerivedKeypair,
    ledger::{HorizonLedger, Ledger, LedgerAccountStatus},
    provisioner::{AccountProvisioner, ProvisioningOutcome},
};

/// How the canonical keypair of a run was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionOrigin {
    /// A candidate passkey already had a ledger account.
    Existing,
    /// A new passkey was enrolled and its account provisioned.
    Created,
}

/// The outcome of a wallet run.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// The canonical keypair. Always able to sign.
    pub keypair: DerivedKeypair,
    /// The account id of `keypair`.
    pub public_key: String,
    /// Whether the account was found or created.
    pub origin: ResolutionOrigin,
    /// The provisioning result, for created accounts.
    pub provisioning: Option<ProvisioningOutcome>,
}

/// Resolves a passkey to a Stellar account, creating the account when needed.
///
/// Each run sets the canonical keypair once it is resolved. Runs are not
/// cancellable, and nothing already submitted to the ledger is rolled back if a
/// hook fails afterwards.
pub struct PasskeyWallet<P, L> {
    config: WalletConfig,
    provider: P,
    ledger: L,
    keypair: Option<DerivedKeypair>,
}

impl<P: PasskeyProvider> PasskeyWallet<P, HorizonLedger> {
    /// Creates a wallet talking to the Horizon endpoints of `config`.
    #[must_use]
    pub fn with_horizon(config: WalletConfig, provider: P) -> Self {
        let ledger = HorizonLedger::new(config.endpoints().clone());
        Self::new(config, provider, ledger)
    }
}

impl<P: PasskeyProvider, L: Ledger> PasskeyWallet<P, L> {
    /// Creates a wallet from its collaborators.
    #[must_use]
    pub const fn new(config: WalletConfig, provider: P, ledger: L) -> Self {
        Self {
            config,
            provider,
            ledger,
            keypair: None,
        }
    }

    /// The wallet configuration.
    #[must_use]
    pub const fn config(&self) -> &WalletConfig {
        &self.config
    }

    /// The passkey platform.
    #[must_use]
    pub const fn provider(&self) -> &P {
        &self.provider
    }

    /// The ledger client.
    #[must_use]
    pub const fn ledger(&self) -> &L {
        &self.ledger
    }

    /// The canonical keypair of the last completed run.
    #[must_use]
    pub const fn keypair(&self) -> Option<&DerivedKeypair> {
        self.keypair.as_ref()
    }

    /// The canonical account id of the last completed run.
    #[must_use]
    pub fn public_key(&self) -> Option<&str> {
        self.keypair.as_ref().map(DerivedKeypair::public_key)
    }

    /// Resumes the account of an enrolled passkey, or enrolls a new passkey and
    /// creates its account when none of the enrolled ones has an account yet.
    ///
    /// Candidate accounts are checked concurrently; when several exist, the
    /// first in retrieval order wins. `phrase` defaults to the configured one.
    ///
    /// # Errors
    /// Propagates credential, environment, provisioning and hook failures.
    pub async fn create_from_existing_passkey(
        &mut self,
        phrase: Option<&str>,
    ) -> Result<Resolution, PasskeyKitError> {
        let identifier = phrase.unwrap_or_else(|| self.config.phrase()).to_string();

        let mut candidates = self.provider.retrieve_credentials(&identifier).await?;
        if candidates.len() > MAX_CANDIDATES {
            log::warn!(
                "passkey provider returned {} credentials, using the first {MAX_CANDIDATES}",
                candidates.len()
            );
            candidates.truncate(MAX_CANDIDATES);
        }
        log::debug!("retrieved {} passkey candidates", candidates.len());

        let derived = candidates
            .iter()
            .map(|credential| DerivedKeypair::derive(&credential.source_string()))
            .collect::<Result<Vec<_>, _>>()?;

        let statuses = self.check_candidates(&derived).await?;

        match statuses.iter().position(LedgerAccountStatus::is_found) {
            Some(index) => {
                let keypair = derived.into_iter().nth(index).ok_or_else(|| {
                    PasskeyKitError::invalid_input("candidates", "index out of range")
                })?;
                // The derived key stays canonical; a differing record id is only reported.
                if let Some(account_id) = statuses[index]
                    .account_id()
                    .filter(|id| *id != keypair.public_key())
                {
                    log::warn!(
                        "ledger reported account {account_id} for derived key {}",
                        keypair.public_key()
                    );
                }
                log::info!("resuming existing account {}", keypair.public_key());

                let resolution = self.resolve(keypair, ResolutionOrigin::Existing, None);
                run_hook(self.config.after_retrieved(), &resolution).await?;
                Ok(resolution)
            }
            None => {
                log::info!("no candidate passkey has an account, enrolling a new one");
                self.create_and_provision(&identifier).await
            }
        }
    }

    /// Enrolls a new passkey and creates its account, without looking for
    /// existing ones.
    ///
    /// `phrase` defaults to the configured one.
    ///
    /// # Errors
    /// Propagates credential, environment, provisioning and hook failures.
    pub async fn create_from_creating_passkey(
        &mut self,
        phrase: Option<&str>,
    ) -> Result<Resolution, PasskeyKitError> {
        let identifier = phrase.unwrap_or_else(|| self.config.phrase()).to_string();
        self.create_and_provision(&identifier).await
    }

    /// Checks every candidate concurrently and returns the statuses in
    /// candidate order, regardless of completion order.
    async fn check_candidates(
        &self,
        derived: &[DerivedKeypair],
    ) -> Result<Vec<LedgerAccountStatus>, PasskeyKitError> {
        let ledger = &self.ledger;
        let mut checked = join_all(derived.iter().enumerate().map(|(index, keypair)| async move {
            (index, ledger.check_exists(keypair.public_key()).await)
        }))
        .await;
        checked.sort_by_key(|(index, _)| *index);

        checked
            .into_iter()
            .map(|(_, status)| status)
            .collect()
    }

    async fn create_and_provision(
        &mut self,
        identifier: &str,
    ) -> Result<Resolution, PasskeyKitError> {
        let provisioner = AccountProvisioner::new(
            &self.ledger,
            self.config.funding(),
            self.config.starting_balance(),
            self.config.parent_secret(),
        )?;

        let credential = self.provider.create_credential(identifier).await?;
        let keypair = DerivedKeypair::derive(&credential.source_string())?;

        let outcome = provisioner.provision(keypair.public_key()).await?;
        log::info!("provisioned new account {}", keypair.public_key());

        let resolution = self.resolve(keypair, ResolutionOrigin::Created, Some(outcome));
        run_hook(self.config.after_created(), &resolution).await?;
        Ok(resolution)
    }

    fn resolve(
        &mut self,
        keypair: DerivedKeypair,
        origin: ResolutionOrigin,
        provisioning: Option<ProvisioningOutcome>,
    ) -> Resolution {
        self.keypair = Some(keypair.clone());
        Resolution {
            public_key: keypair.public_key().to_string(),
            keypair,
            origin,
            provisioning,
        }
    }
}

async fn run_hook(hook: Option<&Hook>, resolution: &Resolution) -> Result<(), PasskeyKitError> {
    let Some(hook) = hook else {
        return Ok(());
    };
    hook(resolution.keypair.clone(), resolution.public_key.clone())
        .await
        .map_err(|e| PasskeyKitError::HookFailed(e.to_string()))
}
