//! Arweave transaction identifiers.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};

/// Pattern every Arweave transaction id (and wallet address) matches.
pub const ARWEAVE_TX_PATTERN: &str = "^[a-zA-Z0-9_-]{43}$";

fn tx_regex() -> &'static Regex {
    static TX_REGEX: OnceLock<Regex> = OnceLock::new();
    TX_REGEX.get_or_init(|| Regex::new(ARWEAVE_TX_PATTERN).expect("tx id pattern compiles"))
}

/// Arweave transaction id (43 chars of base64url alphabet).
///
/// The inner field is private so a `TransactionId` can only exist once the
/// raw string has matched [`ARWEAVE_TX_PATTERN`]. The raw value is kept
/// verbatim: `to_string()` returns exactly what was passed in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TransactionId(String);

impl TransactionId {
    /// Validate and wrap a raw transaction id.
    pub fn new(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        if !tx_regex().is_match(&raw) {
            return Err(ValidationError::InvalidTransactionId { value: raw });
        }
        Ok(TransactionId(raw))
    }

    /// Construct from a value that may be absent.
    ///
    /// A missing id is rejected the same way a malformed one is.
    pub fn from_optional(raw: Option<&str>) -> Result<Self> {
        match raw {
            Some(raw) => Self::new(raw),
            None => Err(ValidationError::InvalidTransactionId {
                value: String::new(),
            }),
        }
    }

    /// Return the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form (first 8 chars), for log lines.
    pub fn short(&self) -> &str {
        &self.0[..8]
    }
}

impl FromStr for TransactionId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for TransactionId {
    type Error = ValidationError;

    fn try_from(s: String) -> Result<Self> {
        Self::new(s)
    }
}

impl From<TransactionId> for String {
    fn from(id: TransactionId) -> Self {
        id.0
    }
}

impl AsRef<str> for TransactionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Transaction ids are opaque keys. Every numeric conversion is spelled out
// and refused so arithmetic on an id is an explicit error, never a silent 0.
macro_rules! refuse_numeric {
    ($($ty:ty),*) => {
        $(
            impl TryFrom<&TransactionId> for $ty {
                type Error = ValidationError;

                fn try_from(id: &TransactionId) -> Result<$ty> {
                    Err(ValidationError::NumericInterpretation {
                        value: id.0.clone(),
                    })
                }
            }
        )*
    };
}

refuse_numeric!(u64, i64, f64);
