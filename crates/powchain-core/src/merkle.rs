//! Bottom-up pairwise Merkle reduction over transaction hashes.

use crate::{constants::EMPTY_MERKLE_ROOT, hasher, Transaction};

pub fn merkle_root(txs: &[Transaction]) -> String {
    merkle_root_from_hashes(txs.iter().map(|tx| tx.hash.as_str()))
}

/// Root of an ordered list of hex hashes.
///
/// An empty list yields [`EMPTY_MERKLE_ROOT`]. A leaf that is not valid hex is
/// replaced by the SHA-256 of its raw text instead of failing; well-formed
/// chains never hit that path.
pub fn merkle_root_from_hashes<'a, I>(hashes: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut level: Vec<Vec<u8>> = hashes.into_iter().map(decode_leaf).collect();
    if level.is_empty() {
        return EMPTY_MERKLE_ROOT.to_string();
    }

    while level.len() > 1 {
        let mut next = Vec::with_capacity(level.len().div_ceil(2));
        for pair in level.chunks(2) {
            let left = &pair[0];
            let right = pair.get(1).unwrap_or(left);
            let mut combined = Vec::with_capacity(left.len() + right.len());
            combined.extend_from_slice(left);
            combined.extend_from_slice(right);
            next.push(hasher::hash(&combined).to_vec());
        }
        level = next;
    }
    hex::encode(&level[0])
}

fn decode_leaf(hash: &str) -> Vec<u8> {
    hex::decode(hash).unwrap_or_else(|_| hasher::hash(hash.as_bytes()).to_vec())
}
