//! Chain-integrity engine: canonical hashing, Merkle roots, proof-of-work
//! mining and chain validation.

pub mod block;
pub mod blockchain;
pub mod constants;
pub mod error;
pub mod hasher;
pub mod mempool;
pub mod merkle;
pub mod pow;
pub mod store;
pub mod transaction;

use std::time::{SystemTime, UNIX_EPOCH};

pub use block::{Block, BlockTemplate};
pub use blockchain::{genesis_block, Blockchain};
pub use error::{ChainError, DifficultyError, ValidationError};
pub use hasher::Hash;
pub use mempool::Mempool;
pub use merkle::merkle_root;
pub use pow::{Cancellation, NeverCancel, ProofOfWork};
pub use store::{load_or_init, ChainStore};
pub use transaction::Transaction;

/// Seconds since the Unix epoch, 0 if the clock reads earlier.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
