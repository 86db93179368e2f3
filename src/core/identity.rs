//! Identity keys and their mapping to record file names.

use crate::constants;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Opaque principal identifier. Only ever used as a lookup key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(Uuid);

impl Identity {
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Record file name derived from the canonical (lowercase, hyphenated) form.
    pub fn record_file_name(&self) -> String {
        format!("{}{}", self.0.hyphenated(), constants::RECORD_EXTENSION)
    }
}

impl FromStr for Identity {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}
