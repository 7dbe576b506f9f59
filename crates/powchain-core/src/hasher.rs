use sha2::{Digest, Sha256};

use crate::constants::HASH_SIZE;

pub type Hash = [u8; HASH_SIZE];

/// SHA-256 of `data`.
#[inline]
pub fn hash(data: &[u8]) -> Hash {
    let digest = Sha256::digest(data);
    let mut out = [0u8; HASH_SIZE];
    out.copy_from_slice(&digest[..]);
    out
}

/// Lowercase hex SHA-256 of `data`.
#[inline]
pub fn hex_hash(data: &[u8]) -> String {
    hex::encode(hash(data))
}
