//! XDR encoding of a single-operation `CreateAccount` transaction.
//!
//! # Envelope Format
//!
//! ```text
//! TransactionEnvelope  = ENVELOPE_TYPE_TX (i32 = 2) || TransactionV1Envelope
//! TransactionV1Envelope = Transaction || DecoratedSignature<20>
//! Transaction          = MuxedAccount source (KEY_TYPE_ED25519, 32 bytes)
//!                        fee: u32
//!                        seq_num: i64
//!                        cond: PRECOND_TIME (min_time: u64, max_time: u64)
//!                        memo: MEMO_NONE
//!                        operations<100>: [ no source, CREATE_ACCOUNT(destination, starting_balance: i64) ]
//!                        ext: v0
//! ```
//!
//! The signature covers `SHA-256(SHA-256(passphrase) || ENVELOPE_TYPE_TX || Transaction)`.

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine};
use sha2::{Digest, Sha256};

use crate::{
    amount::Amount,
    error::PasskeyKitError,
    keys::{strkey, DerivedKeypair},
};

/// Fee per operation, in stroops.
pub const BASE_FEE: u32 = 100;

/// Validity window of a submitted creation transaction.
pub const TX_TIMEOUT: Duration = Duration::from_secs(180);

const ENVELOPE_TYPE_TX: i32 = 2;
const KEY_TYPE_ED25519: i32 = 0;
const PUBLIC_KEY_TYPE_ED25519: i32 = 0;
const PRECOND_TIME: i32 = 1;
const MEMO_NONE: i32 = 0;
const OP_CREATE_ACCOUNT: i32 = 0;

/// An unsigned `CreateAccount` transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateAccountTx {
    source: [u8; 32],
    sequence: i64,
    destination: [u8; 32],
    starting_balance: Amount,
    max_time: u64,
}

impl CreateAccountTx {
    /// Builds the transaction for `source`, whose current ledger sequence is
    /// `source_sequence`. `now` is the unix time the validity window starts at.
    ///
    /// # Errors
    /// Fails if `destination` is not an account id or the sequence would overflow.
    pub fn new(
        source: &DerivedKeypair,
        source_sequence: i64,
        destination: &str,
        starting_balance: Amount,
        now: u64,
    ) -> Result<Self, PasskeyKitError> {
        let destination = strkey::decode(strkey::VERSION_ACCOUNT_ID, destination)?;
        let sequence =
            source_sequence
                .checked_add(1)
                .ok_or_else(|| PasskeyKitError::ProvisioningFailed {
                    reason: "parent account sequence exhausted".to_string(),
                })?;

        Ok(Self {
            source: source.verifying_key().to_bytes(),
            sequence,
            destination,
            starting_balance,
            max_time: now.saturating_add(TX_TIMEOUT.as_secs()),
        })
    }

    /// The sequence number this transaction consumes.
    #[must_use]
    pub const fn sequence(&self) -> i64 {
        self.sequence
    }

    /// Upper bound of the validity window, as unix time.
    #[must_use]
    pub const fn max_time(&self) -> u64 {
        self.max_time
    }

    /// XDR of the `Transaction` body.
    #[must_use]
    pub fn to_xdr(&self) -> Vec<u8> {
        let mut w = XdrWriter::default();
        // source account
        w.i32(KEY_TYPE_ED25519);
        w.opaque_fixed(&self.source);
        w.u32(BASE_FEE);
        w.i64(self.sequence);
        // preconditions
        w.i32(PRECOND_TIME);
        w.u64(0);
        w.u64(self.max_time);
        w.i32(MEMO_NONE);
        // operations
        w.u32(1);
        w.bool(false);
        w.i32(OP_CREATE_ACCOUNT);
        w.i32(PUBLIC_KEY_TYPE_ED25519);
        w.opaque_fixed(&self.destination);
        w.i64(self.starting_balance.stroops());
        // ext
        w.i32(0);
        w.into_inner()
    }

    /// The hash that is signed, bound to the network `passphrase`.
    #[must_use]
    pub fn hash(&self, passphrase: &str) -> [u8; 32] {
        let network_id = Sha256::digest(passphrase.as_bytes());
        let mut hasher = Sha256::new();
        hasher.update(network_id);
        hasher.update(ENVELOPE_TYPE_TX.to_be_bytes());
        hasher.update(self.to_xdr());
        hasher.finalize().into()
    }

    /// Signs the transaction for `passphrase`.
    #[must_use]
    pub fn sign(self, signer: &DerivedKeypair, passphrase: &str) -> SignedEnvelope {
        let hash = self.hash(passphrase);
        let signature = signer.sign(&hash).to_bytes();
        let public = signer.verifying_key().to_bytes();

        let mut hint = [0u8; 4];
        hint.copy_from_slice(&public[28..]);

        let mut w = XdrWriter::default();
        w.i32(ENVELOPE_TYPE_TX);
        w.raw(&self.to_xdr());
        w.u32(1);
        w.opaque_fixed(&hint);
        w.opaque_var(&signature);

        SignedEnvelope {
            hash,
            xdr: w.into_inner(),
        }
    }
}

/// A signed transaction envelope ready for submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedEnvelope {
    hash: [u8; 32],
    xdr: Vec<u8>,
}

impl SignedEnvelope {
    /// Hex encoded transaction hash, as Horizon reports it.
    #[must_use]
    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash)
    }

    /// Base64 XDR, the form Horizon's submission endpoint accepts.
    #[must_use]
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.xdr)
    }

    /// Raw XDR bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.xdr
    }
}

#[derive(Default)]
struct XdrWriter {
    buf: Vec<u8>,
}

impl XdrWriter {
    fn i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    fn u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    fn i64(&mut self, v: i64) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    fn u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    fn bool(&mut self, v: bool) {
        self.i32(i32::from(v));
    }

    // Fixed-length opaque; all callers pass multiples of 4.
    fn opaque_fixed(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
        self.pad(bytes.len());
    }

    fn opaque_var(&mut self, bytes: &[u8]) {
        #[allow(clippy::cast_possible_truncation)]
        self.u32(bytes.len() as u32);
        self.opaque_fixed(bytes);
    }

    fn raw(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    fn pad(&mut self, len: usize) {
        let padding = (4 - len % 4) % 4;
        self.buf.extend(std::iter::repeat(0u8).take(padding));
    }

    fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}
