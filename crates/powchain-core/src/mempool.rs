use parking_lot::Mutex;

use crate::Transaction;

/// Pending transactions waiting for the next mined block, in arrival order.
#[derive(Debug, Default)]
pub struct Mempool {
    txs: Mutex<Vec<Transaction>>,
}

impl Mempool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, tx: Transaction) {
        self.txs.lock().push(tx);
    }

    /// Copy of the pending transactions. The pool is left untouched.
    pub fn snapshot(&self) -> Vec<Transaction> {
        self.txs.lock().clone()
    }

    pub fn clear(&self) {
        self.txs.lock().clear();
    }

    /// Take every pending transaction in one step. Unlike `snapshot` followed by
    /// `clear`, nothing added in between can be lost.
    pub fn drain(&self) -> Vec<Transaction> {
        std::mem::take(&mut *self.txs.lock())
    }

    pub fn len(&self) -> usize {
        self.txs.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.txs.lock().is_empty()
    }
}
