//! Salt generation and the salted SHA-256 password digest.
//!
//! The digest is a single SHA-256 pass over `salt || utf8(password)` with no
//! key stretching. It is kept that way so existing records keep verifying.

use crate::constants::SALT_LEN;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

pub type Salt = [u8; SALT_LEN];
pub type PasswordHash = [u8; 32];

/// Fresh salt from the operating system CSPRNG.
pub fn generate_salt() -> Salt {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Fresh salt guaranteed to differ from `previous`.
pub fn generate_salt_excluding(previous: &[u8]) -> Salt {
    loop {
        let salt = generate_salt();
        if salt.as_slice() != previous {
            return salt;
        }
    }
}

pub fn hash_password(salt: &[u8], password: &str) -> PasswordHash {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize().into()
}

pub fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub fn decode(text: &str) -> Result<Vec<u8>, base64::DecodeError> {
    STANDARD.decode(text)
}

/// Compare without short-circuiting on the first differing byte.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
