use serde::{Deserialize, Serialize};

use crate::{
    error::ValidationError,
    hasher::{self, Hash},
    merkle::merkle_root,
    unix_now, Transaction,
};

/// The fields of a block that are fixed before mining starts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockTemplate {
    pub index: u64,
    pub timestamp: u64,
    pub transactions: Vec<Transaction>,
    pub prev_hash: String,
}

impl BlockTemplate {
    pub fn new(index: u64, prev_hash: impl Into<String>, transactions: Vec<Transaction>) -> Self {
        Self {
            index,
            timestamp: unix_now(),
            transactions,
            prev_hash: prev_hash.into(),
        }
    }

    /// Everything in the canonical record that precedes the nonce.
    pub fn record_prefix(&self) -> String {
        format!(
            "{}{}{}{}",
            self.index,
            self.timestamp,
            merkle_root(&self.transactions),
            self.prev_hash
        )
    }

    /// Freeze the template with `nonce`, computing the resulting hash.
    pub fn seal(self, nonce: u64) -> Block {
        let hash = hex::encode(record_digest(&self.record_prefix(), nonce));
        self.seal_with_hash(nonce, hash)
    }

    pub(crate) fn seal_with_hash(self, nonce: u64, hash: String) -> Block {
        Block {
            index: self.index,
            timestamp: self.timestamp,
            transactions: self.transactions,
            prev_hash: self.prev_hash,
            hash,
            nonce,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub index: u64,
    pub timestamp: u64,
    pub transactions: Vec<Transaction>,
    pub prev_hash: String,
    pub hash: String,
    pub nonce: u64,
}

impl Block {
    /// `index ‖ timestamp ‖ merkle root ‖ prev hash ‖ nonce`, no delimiters.
    pub fn canonical_record(&self) -> String {
        format!(
            "{}{}{}{}{}",
            self.index,
            self.timestamp,
            merkle_root(&self.transactions),
            self.prev_hash,
            self.nonce
        )
    }

    /// Recompute the hash from the block's fields, ignoring the stored `hash`.
    pub fn calculate_hash(&self) -> String {
        hasher::hex_hash(self.canonical_record().as_bytes())
    }

    /// Linkage and tamper checks against `prev`. Proof of work is checked
    /// separately by [`crate::ProofOfWork::validate`].
    pub fn validate_successor(&self, prev: &Block) -> Result<(), ValidationError> {
        let expected = prev.index + 1;
        if self.index != expected {
            return Err(ValidationError::IndexMismatch {
                index: self.index,
                expected,
            });
        }
        if self.prev_hash != prev.hash {
            return Err(ValidationError::PreviousHashMismatch { index: self.index });
        }
        if let Some(position) = self.transactions.iter().position(|tx| !tx.is_intact()) {
            return Err(ValidationError::TamperedTransaction {
                index: self.index,
                position,
            });
        }
        if self.calculate_hash() != self.hash {
            return Err(ValidationError::HashMismatch { index: self.index });
        }
        Ok(())
    }

    pub fn is_valid_successor(&self, prev: &Block) -> bool {
        self.validate_successor(prev).is_ok()
    }
}

pub(crate) fn record_digest(prefix: &str, nonce: u64) -> Hash {
    let mut record = String::with_capacity(prefix.len() + 20);
    record.push_str(prefix);
    record.push_str(&nonce.to_string());
    hasher::hash(record.as_bytes())
}
