use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, StatusCode, Url};
use serde::Deserialize;

use super::{transaction::CreateAccountTx, Ledger, LedgerAccountStatus, SubmitReceipt};
use crate::{
    amount::Amount, defaults::NetworkEndpoints, error::PasskeyKitError,
    http_request::Request, keys::DerivedKeypair, provisioner::FundingStrategy,
};

/// Account record fields read from Horizon.
#[derive(Deserialize)]
struct AccountRecord {
    sequence: String,
}

/// Horizon problem document returned for rejected submissions.
#[derive(Deserialize, Default)]
struct Problem {
    title: Option<String>,
    detail: Option<String>,
    extras: Option<ProblemExtras>,
}

#[derive(Deserialize, Default)]
struct ProblemExtras {
    result_codes: Option<ResultCodes>,
}

#[derive(Deserialize, Default)]
struct ResultCodes {
    transaction: Option<String>,
    #[serde(default)]
    operations: Vec<String>,
}

impl Problem {
    fn reason(self, status: StatusCode) -> String {
        if let Some(codes) = self.extras.and_then(|extras| extras.result_codes) {
            let tx = codes.transaction.unwrap_or_else(|| "unknown".to_string());
            if codes.operations.is_empty() {
                return tx;
            }
            return format!("{tx} ({})", codes.operations.join(", "));
        }
        match (self.title, self.detail) {
            (Some(title), Some(detail)) => format!("{title}: {detail}"),
            (Some(message), None) | (None, Some(message)) => message,
            (None, None) => format!("horizon responded with status {status}"),
        }
    }
}

/// [`Ledger`] backed by a Horizon server and the friendbot faucet.
#[derive(Debug, Clone)]
pub struct HorizonLedger {
    endpoints: NetworkEndpoints,
    request: Request,
}

impl HorizonLedger {
    /// Creates a client for `endpoints`.
    #[must_use]
    pub fn new(endpoints: NetworkEndpoints) -> Self {
        Self {
            endpoints,
            request: Request::new(),
        }
    }

    /// The endpoints this client talks to.
    #[must_use]
    pub const fn endpoints(&self) -> &NetworkEndpoints {
        &self.endpoints
    }

    async fn load_sequence(&self, account_id: &str) -> Result<i64, PasskeyKitError> {
        let url = format!("{}/accounts/{account_id}", self.endpoints.horizon_url()?);
        let response = self.request.handle(self.request.get(&url)).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PasskeyKitError::NetworkError {
                url,
                status: Some(status.as_u16()),
                error: "could not load account".to_string(),
            });
        }

        let record: AccountRecord = response.json().await?;
        record.sequence.parse().map_err(|_| {
            PasskeyKitError::SerializationError(format!(
                "invalid sequence {:?} for {account_id}",
                record.sequence
            ))
        })
    }
}

#[async_trait]
impl Ledger for HorizonLedger {
    async fn check_exists(
        &self,
        public_key: &str,
    ) -> Result<LedgerAccountStatus, PasskeyKitError> {
        let url = format!("{}/accounts/{public_key}", self.endpoints.horizon_url()?);

        let response = match self.request.handle(self.request.get(&url)).await {
            Ok(response) => response,
            Err(err) => {
                log::debug!("account lookup for {public_key} failed: {err}");
                return Ok(LedgerAccountStatus::NotFound);
            }
        };

        let status = response.status();
        if status != StatusCode::OK {
            log::debug!("account lookup for {public_key} returned {status}");
            return Ok(LedgerAccountStatus::NotFound);
        }

        let record = match response.json::<serde_json::Value>().await {
            Ok(record) => record,
            Err(err) => {
                log::debug!("account record for {public_key} is not JSON: {err}");
                return Ok(LedgerAccountStatus::NotFound);
            }
        };

        match record.get("account_id").and_then(serde_json::Value::as_str) {
            Some(account_id) => Ok(LedgerAccountStatus::Found {
                account_id: account_id.to_string(),
                record,
            }),
            None => {
                log::debug!("account record for {public_key} has no account_id");
                Ok(LedgerAccountStatus::NotFound)
            }
        }
    }

    async fn create_account(
        &self,
        parent: &DerivedKeypair,
        destination: &str,
        starting_balance: Amount,
    ) -> Result<SubmitReceipt, PasskeyKitError> {
        let horizon = self.endpoints.horizon_url()?;

        let sequence = self.load_sequence(parent.public_key()).await.map_err(|err| {
            PasskeyKitError::ProvisioningFailed {
                reason: format!("failed to load parent account: {err}"),
            }
        })?;

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| PasskeyKitError::ProvisioningFailed {
                reason: format!("Critical. Unable to determine SystemTime: {e}"),
            })?
            .as_secs();

        let envelope =
            CreateAccountTx::new(parent, sequence, destination, starting_balance, now)?
                .sign(parent, self.endpoints.passphrase());
        log::info!(
            "submitting create-account transaction {} for {destination} ({starting_balance} XLM)",
            envelope.hash_hex()
        );

        let body = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("tx", &envelope.to_base64())
            .finish();
        let request = self
            .request
            .post(&format!("{horizon}/transactions"))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body);

        let response = self.request.handle(request).await.map_err(|err| {
            PasskeyKitError::ProvisioningFailed {
                reason: err.to_string(),
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let problem = response.json::<Problem>().await.unwrap_or_default();
            let reason = problem.reason(status);
            log::error!("create-account for {destination} rejected: {reason}");
            return Err(PasskeyKitError::ProvisioningFailed { reason });
        }

        // The account exists from here on, whatever the body holds.
        let receipt = match response.json::<SubmitReceipt>().await {
            Ok(receipt) => receipt,
            Err(err) => {
                log::warn!(
                    "transaction {} was accepted but its receipt is unreadable: {err}",
                    envelope.hash_hex()
                );
                SubmitReceipt {
                    hash: envelope.hash_hex(),
                    ledger: None,
                    envelope_xdr: Some(envelope.to_base64()),
                    result_xdr: None,
                }
            }
        };
        log::info!("account {destination} created in transaction {}", receipt.hash);
        Ok(receipt)
    }

    fn ensure_endpoints(&self, strategy: FundingStrategy) -> Result<(), PasskeyKitError> {
        match strategy {
            FundingStrategy::Parent => self.endpoints.horizon_url().map(|_| ()),
            FundingStrategy::Faucet => self.endpoints.friendbot_url().map(|_| ()),
        }
    }

    async fn fund_with_faucet(
        &self,
        destination: &str,
    ) -> Result<serde_json::Value, PasskeyKitError> {
        let friendbot = self.endpoints.friendbot_url()?;
        let url = Url::parse_with_params(friendbot, &[("addr", destination)])
            .map_err(|e| PasskeyKitError::invalid_input("friendbot_url", e.to_string()))?;

        let response = self
            .request
            .handle(self.request.get(url.as_str()))
            .await
            .map_err(|err| PasskeyKitError::FaucetFailed(err.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| PasskeyKitError::FaucetFailed(err.to_string()))?;
        if !status.is_success() {
            return Err(PasskeyKitError::FaucetFailed(format!(
                "friendbot responded with status {status}: {text}"
            )));
        }

        Ok(serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text)))
    }
}
