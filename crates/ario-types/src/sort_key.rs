//! SmartWeave sort keys.
//!
//! A sort key names one interaction's position in a contract's append-only
//! log: `<block height>,<ordinal within the block>,<hash>`, with the first
//! two segments zero-padded to a fixed width. Because of the padding, plain
//! byte-wise comparison of the whole string orders interactions the same way
//! comparing `(height, ordinal, hash)` would. `SortKey` relies on that and
//! never re-derives ordering from parsed components.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};

/// Width of the zero-padded block height segment.
pub const BLOCK_HEIGHT_WIDTH: usize = 12;
/// Width of the zero-padded in-block ordinal segment.
pub const ORDINAL_WIDTH: usize = 13;

/// Order-preserving interaction position.
///
/// Ordering is the derived lexicographic ordering of the raw string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SortKey(String);

impl SortKey {
    /// Validate the segment layout and wrap the raw key unchanged.
    pub fn new(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        if let Err(reason) = check_layout(&raw) {
            return Err(ValidationError::InvalidSortKey { value: raw, reason });
        }
        Ok(SortKey(raw))
    }

    /// Return the raw key.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Block height encoded in the first segment.
    pub fn block_height(&self) -> u64 {
        // Layout was checked on construction: 12 ASCII digits always fit.
        self.0[..BLOCK_HEIGHT_WIDTH]
            .bytes()
            .fold(0u64, |acc, b| acc * 10 + u64::from(b - b'0'))
    }
}

fn check_layout(raw: &str) -> std::result::Result<(), String> {
    let segments: Vec<&str> = raw.split(',').collect();
    if segments.len() != 3 {
        return Err(format!(
            "expected 3 comma-separated segments, found {}",
            segments.len()
        ));
    }
    check_digits("block height", segments[0], BLOCK_HEIGHT_WIDTH)?;
    check_digits("ordinal", segments[1], ORDINAL_WIDTH)?;
    let hash = segments[2];
    if hash.is_empty() {
        return Err("hash segment is empty".to_string());
    }
    if !hash.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err("hash segment must be alphanumeric".to_string());
    }
    Ok(())
}

fn check_digits(name: &str, segment: &str, width: usize) -> std::result::Result<(), String> {
    if segment.len() != width || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("{name} segment must be {width} ASCII digits"));
    }
    Ok(())
}

impl FromStr for SortKey {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for SortKey {
    type Error = ValidationError;

    fn try_from(s: String) -> Result<Self> {
        Self::new(s)
    }
}

impl From<SortKey> for String {
    fn from(key: SortKey) -> Self {
        key.0
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
