use std::{fmt, str::FromStr};

use crate::error::PasskeyKitError;

/// Number of stroops in one lumen.
pub const STROOPS_PER_LUMEN: i64 = 10_000_000;

const MAX_DECIMALS: usize = 7;

/// A positive amount of lumens, stored as stroops.
///
/// Parses and renders the decimal form Horizon uses (`"5"`, `"1.5"`, `"0.0000001"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(i64);

impl Amount {
    /// Builds an amount from raw stroops.
    ///
    /// # Errors
    /// Returns an error when `stroops` is not strictly positive.
    pub fn from_stroops(stroops: i64) -> Result<Self, PasskeyKitError> {
        if stroops <= 0 {
            return Err(PasskeyKitError::invalid_input(
                "amount",
                "amount must be greater than zero",
            ));
        }
        Ok(Self(stroops))
    }

    /// The amount in stroops.
    #[must_use]
    pub const fn stroops(self) -> i64 {
        self.0
    }
}

impl Default for Amount {
    /// Five lumens, the starting balance used when none is configured.
    fn default() -> Self {
        Self(5 * STROOPS_PER_LUMEN)
    }
}

impl FromStr for Amount {
    type Err = PasskeyKitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| PasskeyKitError::invalid_input("amount", reason);

        let s = s.trim();
        let (whole, fraction) = s.split_once('.').unwrap_or((s, ""));
        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid("amount is empty"));
        }
        if !whole.bytes().all(|b| b.is_ascii_digit())
            || !fraction.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid("amount must be a non-negative decimal number"));
        }
        if fraction.len() > MAX_DECIMALS {
            return Err(invalid("amount has more than 7 decimal places"));
        }

        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid("amount is too large"))?
        };
        let fraction: i64 = if fraction.is_empty() {
            0
        } else {
            let padded = format!("{fraction:0<MAX_DECIMALS$}");
            padded.parse().map_err(|_| invalid("amount is malformed"))?
        };

        let stroops = whole
            .checked_mul(STROOPS_PER_LUMEN)
            .and_then(|v| v.checked_add(fraction))
            .ok_or_else(|| invalid("amount is too large"))?;
        Self::from_stroops(stroops)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / STROOPS_PER_LUMEN;
        let fraction = self.0 % STROOPS_PER_LUMEN;
        if fraction == 0 {
            return write!(f, "{whole}");
        }
        let fraction = format!("{fraction:07}");
        write!(f, "{whole}.{}", fraction.trim_end_matches('0'))
    }
}
