use serde::{Deserialize, Serialize};

/// On-disk credential record. `salt` and `hash` are base64 text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CredentialRecord {
    pub name: String,
    pub salt: String,
    pub hash: String,
}
