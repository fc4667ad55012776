//! `PasskeyKit` turns passkey credentials into Stellar accounts.
//!
//! This crate is the distribution surface; everything lives in
//! [`passkeykit_core`] and is re-exported here.

pub use passkeykit_core::*;
