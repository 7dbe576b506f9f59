use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use tracing::info;

use crate::{
    block::record_digest,
    constants::{HASH_BITS, HASH_SIZE, MAX_DIFFICULTY, NIBBLE_BITS},
    error::DifficultyError,
    hasher::Hash,
    Block, BlockTemplate,
};

/// Polled between nonce attempts by the cancellable searches on [`ProofOfWork`].
pub trait Cancellation: Sync {
    fn is_cancelled(&self) -> bool;
}

/// Run the search to completion.
#[derive(Clone, Copy, Debug, Default)]
pub struct NeverCancel;

impl Cancellation for NeverCancel {
    fn is_cancelled(&self) -> bool {
        false
    }
}

impl Cancellation for AtomicBool {
    fn is_cancelled(&self) -> bool {
        self.load(Ordering::Relaxed)
    }
}

/// Difficulty plus the derived target `2^(256 - 4 * difficulty)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProofOfWork {
    difficulty: u32,
    /// Big-endian target. `None` at difficulty 0, where the target is `2^256`
    /// and every hash qualifies.
    target: Option<Hash>,
}

impl ProofOfWork {
    pub fn new(difficulty: u32) -> Result<Self, DifficultyError> {
        if difficulty > MAX_DIFFICULTY {
            return Err(DifficultyError::OutOfRange {
                difficulty,
                max: MAX_DIFFICULTY,
            });
        }
        let target = (difficulty > 0).then(|| {
            let shift = (HASH_BITS - difficulty * NIBBLE_BITS) as usize;
            let mut target = [0u8; HASH_SIZE];
            target[HASH_SIZE - 1 - shift / 8] = 1 << (shift % 8);
            target
        });
        Ok(Self { difficulty, target })
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    pub fn target(&self) -> Option<&Hash> {
        self.target.as_ref()
    }

    /// Hex target, or `None` when it does not fit in 256 bits.
    pub fn target_hex(&self) -> Option<String> {
        self.target.map(hex::encode)
    }

    /// `hash < target`, both read as big-endian 256-bit integers.
    #[inline]
    pub fn meets_target(&self, hash: &Hash) -> bool {
        match &self.target {
            Some(target) => hash < target,
            None => true,
        }
    }

    /// Interpret `hash_hex` as an unsigned integer and compare it with the
    /// target. Text that is not a hex number is never valid.
    pub fn validate(&self, hash_hex: &str) -> bool {
        parse_hash(hash_hex).is_some_and(|hash| self.meets_target(&hash))
    }

    /// Increment the nonce from the template's starting point of zero until the
    /// hash falls below the target. Unbounded: at difficulty 64 this only ends
    /// on an all-zero hash.
    pub fn mine(&self, template: BlockTemplate) -> Block {
        let prefix = template.record_prefix();
        let mut nonce = 0u64;
        loop {
            nonce = nonce.wrapping_add(1);
            if let Some(hash) = self.attempt(&prefix, nonce) {
                info!("Mined block {} with nonce {}", template.index, nonce);
                return template.seal_with_hash(nonce, hex::encode(hash));
            }
        }
    }

    /// Like [`Self::mine`], but returns `None` once `cancel` reports true.
    pub fn mine_cancellable<C>(&self, template: BlockTemplate, cancel: &C) -> Option<Block>
    where
        C: Cancellation + ?Sized,
    {
        let prefix = template.record_prefix();
        let mut nonce = 0u64;
        loop {
            if cancel.is_cancelled() {
                info!(
                    "Mining of block {} cancelled at nonce {}",
                    template.index, nonce
                );
                return None;
            }
            nonce = nonce.wrapping_add(1);
            if let Some(hash) = self.attempt(&prefix, nonce) {
                info!("Mined block {} with nonce {}", template.index, nonce);
                return Some(template.seal_with_hash(nonce, hex::encode(hash)));
            }
        }
    }

    /// Multi-threaded search over the nonce space. Finds the same (smallest)
    /// nonce as [`Self::mine`]; `None` only if every `u64` nonce fails.
    pub fn mine_parallel(&self, template: BlockTemplate) -> Option<Block> {
        self.mine_parallel_cancellable(template, &NeverCancel)
    }

    /// Parallel search that gives up once `cancel` reports true. Every worker
    /// polls `cancel` between attempts.
    pub fn mine_parallel_cancellable<C>(
        &self,
        template: BlockTemplate,
        cancel: &C,
    ) -> Option<Block>
    where
        C: Cancellation + ?Sized,
    {
        let prefix = template.record_prefix();
        // a cancelled worker reports its current nonce as found; the target
        // check below tells the two apart
        let (nonce, hash) = (1u64..u64::MAX)
            .into_par_iter()
            .map(|nonce| (nonce, record_digest(&prefix, nonce)))
            .find_first(|(_, hash)| cancel.is_cancelled() || self.meets_target(hash))?;

        if !self.meets_target(&hash) {
            info!(
                "Parallel mining of block {} cancelled near nonce {}",
                template.index, nonce
            );
            return None;
        }
        info!(
            "Mined block {} with nonce {} (parallel)",
            template.index, nonce
        );
        Some(template.seal_with_hash(nonce, hex::encode(hash)))
    }

    #[inline]
    fn attempt(&self, prefix: &str, nonce: u64) -> Option<Hash> {
        let hash = record_digest(prefix, nonce);
        self.meets_target(&hash).then_some(hash)
    }
}

/// Left-pad a hex number to 256 bits. Odd lengths get a leading zero nibble.
fn parse_hash(hash_hex: &str) -> Option<Hash> {
    if hash_hex.is_empty() {
        return None;
    }
    let bytes = if hash_hex.len() % 2 == 1 {
        hex::decode(format!("0{hash_hex}")).ok()?
    } else {
        hex::decode(hash_hex).ok()?
    };
    let significant = bytes
        .iter()
        .position(|b| *b != 0)
        .map_or(&bytes[bytes.len()..], |i| &bytes[i..]);
    if significant.len() > HASH_SIZE {
        return None;
    }
    let mut out = [0u8; HASH_SIZE];
    out[HASH_SIZE - significant.len()..].copy_from_slice(significant);
    Some(out)
}
