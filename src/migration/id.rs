//! Migration identifiers

use crate::migration::MigrationError;
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Numeric migration id
///
/// Compares, sorts and hashes by numeric value; displays the digits it was
/// parsed from, so `Migration000001` shows as `000001` but equals `1`.
#[derive(Debug, Clone)]
pub struct MigrationId {
    value: u64,
    digits: String,
}

impl MigrationId {
    #[must_use]
    pub fn new(value: u64) -> Self {
        Self {
            value,
            digits: value.to_string(),
        }
    }

    #[must_use]
    pub fn value(&self) -> u64 {
        self.value
    }

    /// The digits as written in the migration's name
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.digits
    }
}

impl FromStr for MigrationId {
    type Err = MigrationError;

    fn from_str(digits: &str) -> Result<Self, Self::Err> {
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(MigrationError::InvalidId(digits.to_string()));
        }
        let value = digits
            .parse::<u64>()
            .map_err(|_| MigrationError::InvalidId(digits.to_string()))?;
        Ok(Self {
            value,
            digits: digits.to_string(),
        })
    }
}

impl From<u64> for MigrationId {
    fn from(value: u64) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for MigrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.digits)
    }
}

impl PartialEq for MigrationId {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for MigrationId {}

impl PartialOrd for MigrationId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MigrationId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value.cmp(&other.value)
    }
}

impl Hash for MigrationId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl Borrow<u64> for MigrationId {
    fn borrow(&self) -> &u64 {
        &self.value
    }
}
