use tracing::info;

use crate::{
    error::{ChainError, DifficultyError, ValidationError},
    unix_now, Block, BlockTemplate, ProofOfWork, Transaction,
};

/// Append-only sequence of blocks mined at one fixed difficulty.
///
/// Not internally synchronised: callers that share a chain across threads
/// must serialise appends themselves.
#[derive(Clone, Debug)]
pub struct Blockchain {
    // never empty; index 0 is the genesis block
    blocks: Vec<Block>,
    pow: ProofOfWork,
}

/// Index 0, no transactions, no previous hash, nonce 0. Genesis is hashed but
/// not mined.
pub fn genesis_block() -> Block {
    BlockTemplate {
        index: 0,
        timestamp: unix_now(),
        transactions: vec![],
        prev_hash: String::new(),
    }
    .seal(0)
}

impl Blockchain {
    pub fn new(difficulty: u32) -> Result<Self, DifficultyError> {
        Ok(Self {
            blocks: vec![genesis_block()],
            pow: ProofOfWork::new(difficulty)?,
        })
    }

    /// Rebuild a chain from previously stored blocks without re-mining them.
    pub fn from_blocks(difficulty: u32, blocks: Vec<Block>) -> Result<Self, ChainError> {
        if blocks.is_empty() {
            return Err(ChainError::Empty);
        }
        Ok(Self {
            blocks,
            pow: ProofOfWork::new(difficulty)?,
        })
    }

    pub fn difficulty(&self) -> u32 {
        self.pow.difficulty()
    }

    pub fn proof_of_work(&self) -> &ProofOfWork {
        &self.pow
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn latest_block(&self) -> &Block {
        &self.blocks[self.blocks.len() - 1]
    }

    /// Candidate for the next block, linked to the current tip. Transactions
    /// are taken as given: no dedup, reordering or semantic checks.
    pub fn next_template(&self, transactions: Vec<Transaction>) -> BlockTemplate {
        let latest = self.latest_block();
        BlockTemplate::new(latest.index + 1, latest.hash.clone(), transactions)
    }

    /// Mine a block over `transactions` on the calling thread and append it.
    pub fn add_block(&mut self, transactions: Vec<Transaction>) -> &Block {
        let template = self.next_template(transactions);
        let block = self.pow.mine(template);
        self.blocks.push(block);
        self.latest_block()
    }

    /// Append a block mined elsewhere, after the same checks
    /// [`Self::validate_chain`] applies to it.
    pub fn append(&mut self, block: Block) -> Result<&Block, ChainError> {
        self.check_link(&block, self.latest_block())?;
        info!("Appended block {} with hash {}", block.index, block.hash);
        self.blocks.push(block);
        Ok(self.latest_block())
    }

    /// Walk the chain pairwise from block 1 and report the first failure.
    /// Hashes are always recomputed, never trusted.
    pub fn validate_chain(&self) -> Result<(), ValidationError> {
        self.blocks
            .windows(2)
            .try_for_each(|pair| self.check_link(&pair[1], &pair[0]))
    }

    pub fn is_chain_valid(&self) -> bool {
        self.validate_chain().is_ok()
    }

    fn check_link(&self, block: &Block, prev: &Block) -> Result<(), ValidationError> {
        block.validate_successor(prev)?;
        if !self.pow.validate(&block.hash) {
            return Err(ValidationError::TargetNotMet {
                index: block.index,
                difficulty: self.pow.difficulty(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{hasher, BlockTemplate};

    fn two_block_chain() -> Blockchain {
        let mut chain = Blockchain::new(2).unwrap();
        chain.add_block(vec![
            Transaction::new("John", "Jane", 100),
            Transaction::new("Jane", "John", 50),
        ]);
        chain
    }

    #[test]
    fn genesis_block_example() {
        let chain = Blockchain::new(4).unwrap();
        let genesis = &chain.blocks()[0];
        assert_eq!(chain.len(), 1);
        assert_eq!(genesis.index, 0);
        assert_eq!(genesis.prev_hash, "");
        assert_eq!(genesis.nonce, 0);
        assert!(genesis.transactions.is_empty());
        assert!(!genesis.hash.is_empty());
        assert_eq!(genesis.hash, genesis.calculate_hash());
        assert!(chain.is_chain_valid());
    }

    #[test]
    fn invalid_difficulty_rejected() {
        assert!(Blockchain::new(65).is_err());
    }

    #[test]
    fn block_creation_and_validation() {
        let mut chain = Blockchain::new(4).unwrap();
        let tip = chain.latest_block().hash.clone();
        let block = chain
            .add_block(vec![
                Transaction::new("John", "Jane", 100),
                Transaction::new("Jane", "John", 50),
            ])
            .clone();
        assert_eq!(block.index, 1);
        assert_eq!(block.prev_hash, tip);
        assert!(!block.hash.is_empty());
        assert!(chain.proof_of_work().validate(&block.hash));
        assert!(chain.is_chain_valid());
    }

    #[test]
    fn add_block_keeps_transaction_order() {
        let mut chain = Blockchain::new(1).unwrap();
        let txs = vec![
            Transaction::new("a", "b", 1),
            Transaction::new("a", "b", 1),
            Transaction::new("c", "d", 2),
        ];
        let block = chain.add_block(txs.clone());
        assert_eq!(block.transactions, txs);
    }

    #[test]
    fn consecutive_blocks_link() {
        let mut chain = two_block_chain();
        chain.add_block(vec![Transaction::new("x", "y", 1)]);
        chain.add_block(vec![]);
        assert_eq!(chain.len(), 4);
        for pair in chain.blocks().windows(2) {
            assert_eq!(pair[1].index, pair[0].index + 1);
            assert_eq!(pair[1].prev_hash, pair[0].hash);
        }
        assert!(chain.is_chain_valid());
    }

    #[test]
    fn tampered_amount_invalidates_chain() {
        let mut chain = two_block_chain();
        chain.blocks[1].transactions[0].amount = 9999;
        assert!(!chain.is_chain_valid());
        assert_eq!(
            chain.validate_chain(),
            Err(ValidationError::TamperedTransaction {
                index: 1,
                position: 0
            })
        );
    }

    #[test]
    fn tampered_amount_with_rehashed_block_still_invalid() {
        let mut chain = two_block_chain();
        chain.blocks[1].transactions[0].amount = 9999;
        chain.blocks[1].hash = chain.blocks[1].calculate_hash();
        assert!(!chain.is_chain_valid());
    }

    #[test]
    fn unrelated_prev_hash_invalidates_chain() {
        let mut chain = two_block_chain();
        chain.blocks[1].prev_hash = hasher::hex_hash(b"somewhere else");
        assert_eq!(
            chain.validate_chain(),
            Err(ValidationError::PreviousHashMismatch { index: 1 })
        );
    }

    #[test]
    fn unmined_block_fails_target() {
        let mut chain = Blockchain::new(8).unwrap();
        // nonce 0 at difficulty 8 meets the target with probability 2^-32
        let block = chain.next_template(vec![]).seal(0);
        chain.blocks.push(block);
        assert!(matches!(
            chain.validate_chain(),
            Err(ValidationError::TargetNotMet { index: 1, difficulty: 8 })
        ));
    }

    #[test]
    fn append_accepts_externally_mined_block() {
        let mut chain = Blockchain::new(2).unwrap();
        let template = chain.next_template(vec![Transaction::new("a", "b", 3)]);
        let block = chain.proof_of_work().mine(template);
        let appended = chain.append(block.clone()).unwrap();
        assert_eq!(appended, &block);
        assert!(chain.is_chain_valid());
    }

    #[test]
    fn append_rejects_stale_block() {
        let mut chain = Blockchain::new(1).unwrap();
        let stale = chain.proof_of_work().mine(chain.next_template(vec![]));
        chain.add_block(vec![]);
        assert!(matches!(
            chain.append(stale),
            Err(ChainError::Rejected(ValidationError::IndexMismatch { .. }))
        ));
        assert_eq!(chain.len(), 2);
    }

    #[test]
    fn from_blocks_round_trip() {
        let chain = two_block_chain();
        let rebuilt = Blockchain::from_blocks(2, chain.blocks().to_vec()).unwrap();
        assert_eq!(rebuilt.blocks(), chain.blocks());
        assert!(rebuilt.is_chain_valid());
        assert!(matches!(
            Blockchain::from_blocks(2, vec![]),
            Err(ChainError::Empty)
        ));
    }

    #[test]
    fn genesis_template_is_unmined() {
        let genesis = genesis_block();
        let resealed = BlockTemplate {
            index: 0,
            timestamp: genesis.timestamp,
            transactions: vec![],
            prev_hash: String::new(),
        }
        .seal(0);
        assert_eq!(genesis, resealed);
    }
}
