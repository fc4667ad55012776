#![allow(dead_code)]

//! Common test utilities shared across integration tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use passkeykit_core::{
    Amount, Credential, DerivedKeypair, Ledger, LedgerAccountStatus, PasskeyKitError,
    PasskeyProvider, SubmitReceipt,
};

/// Builds a credential whose public key bytes are `label`.
pub fn credential(label: &str) -> Credential {
    Credential::new(label.as_bytes().to_vec())
}

/// The account id a credential derives to.
pub fn account_of(credential: &Credential) -> String {
    DerivedKeypair::derive(&credential.source_string())
        .unwrap()
        .public_key()
        .to_string()
}

/// A parent secret seed usable with [`passkeykit_core::WalletConfig::new`].
pub fn parent_secret() -> String {
    DerivedKeypair::derive("test-parent").unwrap().secret_seed()
}

/// Passkey platform holding enrolled credentials in memory.
#[derive(Default)]
pub struct InMemoryPasskeys {
    enrolled: Vec<Credential>,
    enrollable: Mutex<VecDeque<Credential>>,
    /// Identifiers passed to `retrieve_credentials`.
    pub retrieve_calls: Mutex<Vec<String>>,
    /// Identifiers passed to `create_credential`.
    pub create_calls: Mutex<Vec<String>>,
}

impl InMemoryPasskeys {
    /// A platform where `enrolled` are returned on lookup and `enrollable`
    /// are handed out, in order, on enrollment.
    pub fn new(enrolled: Vec<Credential>, enrollable: Vec<Credential>) -> Self {
        Self {
            enrolled,
            enrollable: Mutex::new(enrollable.into()),
            ..Self::default()
        }
    }

    /// Number of enrollments attempted.
    pub fn create_count(&self) -> usize {
        self.create_calls.lock().unwrap().len()
    }
}

#[async_trait]
impl PasskeyProvider for InMemoryPasskeys {
    async fn retrieve_credentials(
        &self,
        identifier: &str,
    ) -> Result<Vec<Credential>, PasskeyKitError> {
        self.retrieve_calls
            .lock()
            .unwrap()
            .push(identifier.to_string());
        Ok(self.enrolled.clone())
    }

    async fn create_credential(
        &self,
        identifier: &str,
    ) -> Result<Credential, PasskeyKitError> {
        self.create_calls.lock().unwrap().push(identifier.to_string());
        let next = self.enrollable.lock().unwrap().pop_front();
        next.ok_or_else(|| {
            PasskeyKitError::CredentialCreationFailed("user cancelled the prompt".to_string())
        })
    }
}

/// A scripted account on [`ScriptedLedger`].
#[derive(Clone)]
struct Scripted {
    found: bool,
    latency: Duration,
}

/// Ledger answering lookups from a script and recording every write.
#[derive(Default)]
pub struct ScriptedLedger {
    accounts: HashMap<String, Scripted>,
    reject_creation: Option<String>,
    faucet_down: bool,
    /// Account ids looked up, in call order.
    pub checks: Mutex<Vec<String>>,
    /// `(parent, destination, stroops)` for every created account.
    pub created: Mutex<Vec<(String, String, i64)>>,
    /// Account ids sent to the faucet.
    pub fauceted: Mutex<Vec<String>>,
}

impl ScriptedLedger {
    /// A ledger where every account is missing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts `account_id` as existing, answering after `latency`.
    pub fn with_account(mut self, account_id: &str, latency: Duration) -> Self {
        self.accounts.insert(
            account_id.to_string(),
            Scripted {
                found: true,
                latency,
            },
        );
        self
    }

    /// Scripts `account_id` as missing, answering after `latency`.
    pub fn without_account(mut self, account_id: &str, latency: Duration) -> Self {
        self.accounts.insert(
            account_id.to_string(),
            Scripted {
                found: false,
                latency,
            },
        );
        self
    }

    /// Makes every account creation fail with `reason`.
    pub fn rejecting_creation(mut self, reason: &str) -> Self {
        self.reject_creation = Some(reason.to_string());
        self
    }

    /// Makes every faucet call fail.
    pub fn with_faucet_down(mut self) -> Self {
        self.faucet_down = true;
        self
    }

    /// Number of existence checks made.
    pub fn check_count(&self) -> usize {
        self.checks.lock().unwrap().len()
    }

    /// Destinations of created accounts, in order.
    pub fn created_accounts(&self) -> Vec<String> {
        self.created
            .lock()
            .unwrap()
            .iter()
            .map(|(_, destination, _)| destination.clone())
            .collect()
    }

    /// Number of faucet calls made.
    pub fn faucet_count(&self) -> usize {
        self.fauceted.lock().unwrap().len()
    }
}

#[async_trait]
impl Ledger for ScriptedLedger {
    async fn check_exists(
        &self,
        public_key: &str,
    ) -> Result<LedgerAccountStatus, PasskeyKitError> {
        self.checks.lock().unwrap().push(public_key.to_string());
        let scripted = self.accounts.get(public_key).cloned();
        let Some(scripted) = scripted else {
            return Ok(LedgerAccountStatus::NotFound);
        };

        tokio::time::sleep(scripted.latency).await;
        if scripted.found {
            Ok(LedgerAccountStatus::Found {
                account_id: public_key.to_string(),
                record: serde_json::json!({ "account_id": public_key, "sequence": "1" }),
            })
        } else {
            Ok(LedgerAccountStatus::NotFound)
        }
    }

    async fn create_account(
        &self,
        parent: &DerivedKeypair,
        destination: &str,
        starting_balance: Amount,
    ) -> Result<SubmitReceipt, PasskeyKitError> {
        if let Some(reason) = &self.reject_creation {
            return Err(PasskeyKitError::ProvisioningFailed {
                reason: reason.clone(),
            });
        }
        self.created.lock().unwrap().push((
            parent.public_key().to_string(),
            destination.to_string(),
            starting_balance.stroops(),
        ));
        Ok(SubmitReceipt {
            hash: format!("tx-{destination}"),
            ledger: Some(1),
            envelope_xdr: None,
            result_xdr: None,
        })
    }

    async fn fund_with_faucet(
        &self,
        destination: &str,
    ) -> Result<serde_json::Value, PasskeyKitError> {
        self.fauceted.lock().unwrap().push(destination.to_string());
        if self.faucet_down {
            return Err(PasskeyKitError::FaucetFailed("friendbot is down".to_string()));
        }
        Ok(serde_json::json!({ "successful": true }))
    }
}

/// Records every hook invocation as `(public_key, keypair public key)`.
#[derive(Clone, Default)]
pub struct HookLog(Arc<Mutex<Vec<(String, String)>>>);

impl HookLog {
    /// Appends one invocation.
    pub fn record(&self, keypair: &DerivedKeypair, public_key: &str) {
        self.0
            .lock()
            .unwrap()
            .push((public_key.to_string(), keypair.public_key().to_string()));
    }

    /// Every invocation so far.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.0.lock().unwrap().clone()
    }
}
