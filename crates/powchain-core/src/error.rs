use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DifficultyError {
    #[error("difficulty {difficulty} is outside 0..={max}")]
    OutOfRange { difficulty: u32, max: u32 },
}

/// The first rule a block broke during validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("block {index}: expected index {expected}")]
    IndexMismatch { index: u64, expected: u64 },

    #[error("block {index}: previous hash does not link to its predecessor")]
    PreviousHashMismatch { index: u64 },

    #[error("block {index}: transaction {position} hash does not match its contents")]
    TamperedTransaction { index: u64, position: usize },

    #[error("block {index}: stored hash does not match recomputed hash")]
    HashMismatch { index: u64 },

    #[error("block {index}: hash does not meet difficulty {difficulty}")]
    TargetNotMet { index: u64, difficulty: u32 },
}

#[derive(Debug, Error)]
pub enum ChainError {
    #[error(transparent)]
    Difficulty(#[from] DifficultyError),

    #[error("chain has no blocks")]
    Empty,

    #[error("block rejected: {0}")]
    Rejected(#[from] ValidationError),
}
