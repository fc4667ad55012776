//! Core of `PasskeyKit`: maps a passkey credential to a Stellar account.
//!
//! A passkey public key is expanded into an Ed25519 seed, the derived account is
//! looked up on the ledger and, when no candidate account exists yet, a new one is
//! created either by a funded parent account or by the test network faucet.
//!
//! The entry point is [`PasskeyWallet`]; the passkey platform and the ledger are
//! supplied through the [`PasskeyProvider`] and [`Ledger`] traits.
#![deny(clippy::all, clippy::pedantic, clippy::nursery)]
use strum::{Display, EnumString};

/// The Stellar network a wallet operates against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Network {
    /// The public production network.
    Mainnet,
    /// The SDF test network, which also offers the friendbot faucet.
    Testnet,
}

mod amount;
pub use amount::*;

mod config;
pub use config::*;

mod credential;
pub use credential::*;

pub mod defaults;

mod error;
pub use error::*;

pub mod keys;
pub use keys::DerivedKeypair;

pub mod ledger;
pub use ledger::{HorizonLedger, Ledger, LedgerAccountStatus, SubmitReceipt};

pub mod logger;

mod provisioner;
pub use provisioner::*;

mod wallet;
pub use wallet::*;

// private modules
mod http_request;

#[cfg(feature = "ffi")]
uniffi::setup_scaffolding!("passkeykit_core");
