pub const NIBBLE_BITS: u32 = 4;
pub const HASH_SIZE: usize = 32;
pub const HASH_HEX_SIZE: usize = HASH_SIZE * 2;
pub const HASH_BITS: u32 = (HASH_SIZE as u32) * 8;
pub const MAX_DIFFICULTY: u32 = HASH_BITS / NIBBLE_BITS;
pub const DEFAULT_DIFFICULTY: u32 = 4;
/// Merkle root of a block without transactions. Never a valid hex digest.
pub const EMPTY_MERKLE_ROOT: &str = "";
