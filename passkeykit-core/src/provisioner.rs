use secrecy::{ExposeSecret, SecretString};

use crate::{
    amount::Amount,
    error::PasskeyKitError,
    keys::DerivedKeypair,
    ledger::{Ledger, SubmitReceipt},
};

/// How a new account gets its starting balance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FundingStrategy {
    /// A funded parent account signs a `CreateAccount` transaction.
    #[default]
    Parent,
    /// The test network faucet funds the account. Best effort.
    Faucet,
}

/// Result of provisioning an account.
#[derive(Debug, Clone, PartialEq)]
pub enum ProvisioningOutcome {
    /// The parent-funded transaction was accepted.
    Submitted(SubmitReceipt),
    /// The faucet was called; `None` when it failed.
    Faucet(Option<serde_json::Value>),
}

/// The resolved funding source.
enum Funding {
    Parent(DerivedKeypair),
    Faucet,
}

/// Creates ledger accounts for freshly derived keys.
///
/// Everything the funding strategy needs is resolved on construction, so a
/// misconfiguration surfaces before a passkey is enrolled.
pub struct AccountProvisioner<'a, L: Ledger + ?Sized> {
    ledger: &'a L,
    funding: Funding,
    starting_balance: Amount,
}

impl<'a, L: Ledger + ?Sized> AccountProvisioner<'a, L> {
    /// Creates a provisioner using `strategy` against `ledger`.
    ///
    /// `parent_secret` is only decoded for [`FundingStrategy::Parent`]. No
    /// request is made.
    ///
    /// # Errors
    /// - [`PasskeyKitError::UnsupportedEnvironment`] when the endpoint `strategy` needs is unmapped.
    /// - [`PasskeyKitError::InvalidInput`] if the parent secret is not a secret seed.
    pub fn new(
        ledger: &'a L,
        strategy: FundingStrategy,
        starting_balance: Amount,
        parent_secret: &SecretString,
    ) -> Result<Self, PasskeyKitError> {
        ledger.ensure_endpoints(strategy)?;
        let funding = match strategy {
            FundingStrategy::Parent => {
                let parent = DerivedKeypair::from_secret_seed(parent_secret.expose_secret())
                    .map_err(|_| {
                        PasskeyKitError::invalid_input(
                            "parent_secret",
                            "not a valid Stellar secret seed",
                        )
                    })?;
                Funding::Parent(parent)
            }
            FundingStrategy::Faucet => Funding::Faucet,
        };
        Ok(Self {
            ledger,
            funding,
            starting_balance,
        })
    }

    /// Provisions an account for `public_key`, running exactly one strategy.
    ///
    /// Faucet failures are logged and reported as `Faucet(None)`.
    ///
    /// # Errors
    /// - [`PasskeyKitError::ProvisioningFailed`] when the ledger rejects the transaction.
    /// - [`PasskeyKitError::UnsupportedEnvironment`] when the needed endpoint is unmapped.
    pub async fn provision(&self, public_key: &str) -> Result<ProvisioningOutcome, PasskeyKitError> {
        match &self.funding {
            Funding::Parent(parent) => {
                log::debug!(
                    "creating {public_key} from parent {} with {}",
                    parent.public_key(),
                    self.starting_balance
                );
                let receipt = self
                    .ledger
                    .create_account(parent, public_key, self.starting_balance)
                    .await?;
                Ok(ProvisioningOutcome::Submitted(receipt))
            }
            Funding::Faucet => match self.ledger.fund_with_faucet(public_key).await {
                Ok(response) => {
                    log::info!("SUCCESS! friendbot funded {public_key}: {response}");
                    Ok(ProvisioningOutcome::Faucet(Some(response)))
                }
                Err(err @ PasskeyKitError::UnsupportedEnvironment { .. }) => Err(err),
                Err(err) => {
                    log::error!("friendbot funding of {public_key} failed: {err}");
                    Ok(ProvisioningOutcome::Faucet(None))
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::ledger::LedgerAccountStatus;

    #[derive(Default)]
    struct RecordingLedger {
        created: Mutex<Vec<(String, String, i64)>>,
        faucet_calls: Mutex<Vec<String>>,
        faucet_error: Mutex<Option<PasskeyKitError>>,
        unmapped: Option<FundingStrategy>,
    }

    #[async_trait]
    impl Ledger for RecordingLedger {
        fn ensure_endpoints(&self, strategy: FundingStrategy) -> Result<(), PasskeyKitError> {
            if self.unmapped == Some(strategy) {
                return Err(PasskeyKitError::UnsupportedEnvironment {
                    network: "mainnet".to_string(),
                    endpoint: format!("{strategy:?}"),
                });
            }
            Ok(())
        }

        async fn check_exists(
            &self,
            _public_key: &str,
        ) -> Result<LedgerAccountStatus, PasskeyKitError> {
            Ok(LedgerAccountStatus::NotFound)
        }

        async fn create_account(
            &self,
            parent: &DerivedKeypair,
            destination: &str,
            starting_balance: Amount,
        ) -> Result<SubmitReceipt, PasskeyKitError> {
            self.created.lock().unwrap().push((
                parent.public_key().to_string(),
                destination.to_string(),
                starting_balance.stroops(),
            ));
            Ok(SubmitReceipt {
                hash: "feed".to_string(),
                ledger: Some(1),
                envelope_xdr: None,
                result_xdr: None,
            })
        }

        async fn fund_with_faucet(
            &self,
            destination: &str,
        ) -> Result<serde_json::Value, PasskeyKitError> {
            self.faucet_calls.lock().unwrap().push(destination.to_string());
            let error = self.faucet_error.lock().unwrap().take();
            match error {
                Some(error) => Err(error),
                None => Ok(serde_json::json!({ "successful": true })),
            }
        }
    }

    fn parent_secret() -> (DerivedKeypair, SecretString) {
        let parent = DerivedKeypair::derive("parent").unwrap();
        let secret = SecretString::from(parent.secret_seed());
        (parent, secret)
    }

    fn faucet_provisioner(ledger: &RecordingLedger) -> AccountProvisioner<'_, RecordingLedger> {
        let (_, secret) = parent_secret();
        AccountProvisioner::new(ledger, FundingStrategy::Faucet, Amount::default(), &secret)
            .unwrap()
    }

    #[tokio::test]
    async fn test_parent_path_creates_account() {
        let ledger = RecordingLedger::default();
        let (parent, secret) = parent_secret();
        let provisioner =
            AccountProvisioner::new(&ledger, FundingStrategy::Parent, Amount::default(), &secret)
                .unwrap();

        let outcome = provisioner.provision("GCHILD").await.unwrap();

        assert!(matches!(outcome, ProvisioningOutcome::Submitted(ref r) if r.hash == "feed"));
        assert_eq!(
            *ledger.created.lock().unwrap(),
            vec![(parent.public_key().to_string(), "GCHILD".to_string(), 50_000_000)]
        );
        assert!(ledger.faucet_calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_parent_path_rejects_bad_secret_up_front() {
        let ledger = RecordingLedger::default();

        let result = AccountProvisioner::new(
            &ledger,
            FundingStrategy::Parent,
            Amount::default(),
            &SecretString::from("not-a-seed".to_string()),
        );

        assert!(matches!(
            result,
            Err(PasskeyKitError::InvalidInput { ref attribute, .. }) if attribute == "parent_secret"
        ));
    }

    #[test]
    fn test_faucet_path_ignores_bad_secret() {
        let ledger = RecordingLedger::default();

        let result = AccountProvisioner::new(
            &ledger,
            FundingStrategy::Faucet,
            Amount::default(),
            &SecretString::from("not-a-seed".to_string()),
        );

        assert!(result.is_ok());
    }

    #[test]
    fn test_unmapped_endpoint_fails_construction() {
        let (_, secret) = parent_secret();
        for strategy in [FundingStrategy::Parent, FundingStrategy::Faucet] {
            let ledger = RecordingLedger {
                unmapped: Some(strategy),
                ..RecordingLedger::default()
            };

            let result = AccountProvisioner::new(&ledger, strategy, Amount::default(), &secret);

            assert!(matches!(
                result,
                Err(PasskeyKitError::UnsupportedEnvironment { .. })
            ));
        }
    }

    #[tokio::test]
    async fn test_faucet_failure_is_swallowed() {
        let ledger = RecordingLedger {
            faucet_error: Mutex::new(Some(PasskeyKitError::FaucetFailed("boom".to_string()))),
            ..RecordingLedger::default()
        };

        let outcome = faucet_provisioner(&ledger).provision("GCHILD").await.unwrap();

        assert_eq!(outcome, ProvisioningOutcome::Faucet(None));
        assert_eq!(*ledger.faucet_calls.lock().unwrap(), vec!["GCHILD".to_string()]);
        assert!(ledger.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_faucet_unmapped_environment_is_fatal() {
        let ledger = RecordingLedger {
            faucet_error: Mutex::new(Some(PasskeyKitError::UnsupportedEnvironment {
                network: "mainnet".to_string(),
                endpoint: "friendbot".to_string(),
            })),
            ..RecordingLedger::default()
        };

        let result = faucet_provisioner(&ledger).provision("GCHILD").await;

        assert!(matches!(
            result,
            Err(PasskeyKitError::UnsupportedEnvironment { .. })
        ));
    }
}
