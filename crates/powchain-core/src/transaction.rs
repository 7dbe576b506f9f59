use serde::{Deserialize, Serialize};

use crate::{hasher, unix_now};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: String,
    pub recipient: String,
    pub amount: u64,
    pub timestamp: u64,
    pub hash: String,
}

impl Transaction {
    /// Stamp the current time and seal the record with its content hash.
    pub fn new(sender: impl Into<String>, recipient: impl Into<String>, amount: u64) -> Self {
        Self::with_timestamp(sender, recipient, amount, unix_now())
    }

    pub fn with_timestamp(
        sender: impl Into<String>,
        recipient: impl Into<String>,
        amount: u64,
        timestamp: u64,
    ) -> Self {
        let mut tx = Self {
            sender: sender.into(),
            recipient: recipient.into(),
            amount,
            timestamp,
            hash: String::new(),
        };
        tx.hash = tx.calculate_hash();
        tx
    }

    /// Fields concatenated without separators.
    ///
    /// The encoding is not injective: `("ab", "c")` and `("a", "bc")` produce
    /// the same record for equal amount and timestamp. Stored chains depend on
    /// this exact byte layout, so it must not change.
    pub fn canonical_record(&self) -> String {
        format!(
            "{}{}{}{}",
            self.sender, self.recipient, self.amount, self.timestamp
        )
    }

    /// Recompute the content hash from the fields, ignoring the stored `hash`.
    pub fn calculate_hash(&self) -> String {
        hasher::hex_hash(self.canonical_record().as_bytes())
    }

    /// `false` when the stored hash no longer matches the fields.
    pub fn is_intact(&self) -> bool {
        self.calculate_hash() == self.hash
    }
}
