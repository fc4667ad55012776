//! Access to the Stellar ledger: account lookup, account creation and faucet funding.

use async_trait::async_trait;
use serde::Deserialize;

use crate::{
    amount::Amount, error::PasskeyKitError, keys::DerivedKeypair,
    provisioner::FundingStrategy,
};

mod horizon;
pub use horizon::HorizonLedger;

pub mod transaction;

/// Whether an account exists on the ledger.
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerAccountStatus {
    /// The account exists.
    Found {
        /// The account id reported by the ledger.
        account_id: String,
        /// The raw account record.
        record: serde_json::Value,
    },
    /// No account was found, or the ledger could not be asked.
    NotFound,
}

impl LedgerAccountStatus {
    /// Returns `true` for [`LedgerAccountStatus::Found`].
    #[must_use]
    pub const fn is_found(&self) -> bool {
        matches!(self, Self::Found { .. })
    }

    /// The account id, when found.
    #[must_use]
    pub fn account_id(&self) -> Option<&str> {
        match self {
            Self::Found { account_id, .. } => Some(account_id),
            Self::NotFound => None,
        }
    }
}

/// Receipt of an accepted transaction submission.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SubmitReceipt {
    /// Transaction hash (hex).
    pub hash: String,
    /// Ledger the transaction was included in.
    #[serde(default)]
    pub ledger: Option<u64>,
    /// The submitted envelope, base64 XDR.
    #[serde(default)]
    pub envelope_xdr: Option<String>,
    /// The transaction result, base64 XDR.
    #[serde(default)]
    pub result_xdr: Option<String>,
}

/// The operations this crate needs from a Stellar ledger.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Looks up `public_key`.
    ///
    /// Any failure to obtain an account record reads as
    /// [`LedgerAccountStatus::NotFound`]; absence of an account and absence of
    /// an answer are not distinguished.
    ///
    /// # Errors
    /// Only [`PasskeyKitError::UnsupportedEnvironment`], before any request is made.
    async fn check_exists(
        &self,
        public_key: &str,
    ) -> Result<LedgerAccountStatus, PasskeyKitError>;

    /// Creates `destination` with `starting_balance`, funded and signed by `parent`.
    ///
    /// # Errors
    /// Returns [`PasskeyKitError::ProvisioningFailed`] with the ledger's reason.
    async fn create_account(
        &self,
        parent: &DerivedKeypair,
        destination: &str,
        starting_balance: Amount,
    ) -> Result<SubmitReceipt, PasskeyKitError>;

    /// Checks, without any request, that the endpoints `strategy` needs are
    /// configured.
    ///
    /// # Errors
    /// Returns [`PasskeyKitError::UnsupportedEnvironment`] for an unmapped endpoint.
    fn ensure_endpoints(&self, _strategy: FundingStrategy) -> Result<(), PasskeyKitError> {
        Ok(())
    }

    /// Asks the test network faucet to fund `destination`.
    ///
    /// # Errors
    /// Returns [`PasskeyKitError::FaucetFailed`] if the faucet did not fund the account.
    async fn fund_with_faucet(
        &self,
        destination: &str,
    ) -> Result<serde_json::Value, PasskeyKitError>;
}
