//! Digests used by the ceremony checks.

use sha2::{Digest, Sha256};

/// SHA-256 of `data`. Both the rpIdHash and the clientDataHash are computed with it.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}
