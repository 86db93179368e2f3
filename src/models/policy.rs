//! Password policy applied by the command layer.

use crate::constants;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicySection {
    #[serde(default = "default_min_password_length")]
    pub min_password_length: usize,

    #[serde(default = "default_max_password_length")]
    pub max_password_length: usize,

    /// Record mutating operations in the audit trail.
    #[serde(default = "default_audit")]
    pub audit: bool,
}

impl Default for PolicySection {
    fn default() -> Self {
        Self {
            min_password_length: default_min_password_length(),
            max_password_length: default_max_password_length(),
            audit: default_audit(),
        }
    }
}

impl PolicySection {
    /// Check a candidate password's length, counted in characters.
    pub fn check_password(&self, password: &str) -> Result<(), String> {
        let len = password.chars().count();
        if len < self.min_password_length.max(1) {
            return Err(format!(
                "password too short ({} characters, min {})",
                len,
                self.min_password_length.max(1)
            ));
        }
        if len > self.max_password_length {
            return Err(format!(
                "password too long ({} characters, max {})",
                len, self.max_password_length
            ));
        }
        Ok(())
    }
}

fn default_min_password_length() -> usize {
    constants::DEFAULT_MIN_PASSWORD_LENGTH
}

fn default_max_password_length() -> usize {
    constants::DEFAULT_MAX_PASSWORD_LENGTH
}

fn default_audit() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_bounds() {
        let policy = PolicySection::default();
        assert!(policy.check_password("abcd").is_ok());
        assert!(policy.check_password("abc").is_err());
        assert!(policy.check_password(&"x".repeat(65)).is_err());
    }

    #[test]
    fn test_zero_minimum_still_rejects_empty() {
        let policy = PolicySection {
            min_password_length: 0,
            ..PolicySection::default()
        };
        assert!(policy.check_password("").is_err());
        assert!(policy.check_password("a").is_ok());
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        let policy = PolicySection::default();
        assert!(policy.check_password("ççç").is_err());
        assert!(policy.check_password("çççç").is_ok());
    }
}
