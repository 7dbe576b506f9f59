use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::{Block, Blockchain};

/// Trait the storage backends implement so a chain can be persisted and
/// replayed. Lives here to keep the storage crate depending on core only.
pub trait ChainStore: Send + Sync {
    fn put_block(&self, block: &Block) -> Result<()>;
    /// `Ok(None)` means no block is stored at `index`.
    fn get_block(&self, index: u64) -> Result<Option<Block>>;
    /// Index of the last stored block, 0 when empty.
    fn tip_height(&self) -> Result<u64>;
    fn tip_hash(&self) -> Result<Option<String>>;
    fn flush(&self) -> Result<()>;
}

/// Replay blocks 0, 1, 2, ... until the store reports none. A read error is
/// fatal. An empty store is seeded with a fresh genesis block.
///
/// A replayed chain that fails validation is logged and loaded anyway.
pub fn load_or_init<S>(store: &S, difficulty: u32) -> Result<Blockchain>
where
    S: ChainStore + ?Sized,
{
    let mut blocks: Vec<Block> = Vec::new();
    loop {
        let index = blocks.len() as u64;
        match store
            .get_block(index)
            .with_context(|| format!("loading block {index}"))?
        {
            Some(block) => {
                info!("Loaded block {} with hash {}", index, block.hash);
                blocks.push(block);
            }
            None => break,
        }
    }

    if blocks.is_empty() {
        info!("No existing chain found, creating genesis block");
        let chain = Blockchain::new(difficulty)?;
        store
            .put_block(chain.latest_block())
            .context("saving genesis block")?;
        return Ok(chain);
    }

    let chain = Blockchain::from_blocks(difficulty, blocks)?;
    if let Err(err) = chain.validate_chain() {
        warn!("Loaded chain is not valid: {err}");
    }
    info!("Loaded {} blocks", chain.len());
    Ok(chain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Transaction;
    use anyhow::bail;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct MemStore {
        blocks: Mutex<Vec<Block>>,
        fail_reads_at: Option<u64>,
    }

    impl ChainStore for MemStore {
        fn put_block(&self, block: &Block) -> Result<()> {
            self.blocks.lock().push(block.clone());
            Ok(())
        }

        fn get_block(&self, index: u64) -> Result<Option<Block>> {
            if self.fail_reads_at == Some(index) {
                bail!("disk on fire");
            }
            Ok(self.blocks.lock().get(index as usize).cloned())
        }

        fn tip_height(&self) -> Result<u64> {
            Ok(self.blocks.lock().len().saturating_sub(1) as u64)
        }

        fn tip_hash(&self) -> Result<Option<String>> {
            Ok(self.blocks.lock().last().map(|b| b.hash.clone()))
        }

        fn flush(&self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn empty_store_is_seeded_with_genesis() {
        let store = MemStore::default();
        let chain = load_or_init(&store, 2).unwrap();
        assert_eq!(chain.len(), 1);
        assert_eq!(store.blocks.lock().len(), 1);
        assert_eq!(store.tip_hash().unwrap(), Some(chain.latest_block().hash.clone()));
    }

    #[test]
    fn stored_chain_is_replayed() {
        let store = MemStore::default();
        let mut chain = Blockchain::new(1).unwrap();
        chain.add_block(vec![Transaction::new("a", "b", 1)]);
        chain.add_block(vec![Transaction::new("b", "c", 2)]);
        for block in chain.blocks() {
            store.put_block(block).unwrap();
        }

        let loaded = load_or_init(&store, 1).unwrap();
        assert_eq!(loaded.blocks(), chain.blocks());
        assert!(loaded.is_chain_valid());
    }

    #[test]
    fn read_error_is_fatal() {
        let store = MemStore {
            fail_reads_at: Some(0),
            ..Default::default()
        };
        let err = load_or_init(&store, 1).unwrap_err();
        assert!(format!("{err:#}").contains("disk on fire"));
    }

    #[test]
    fn invalid_stored_chain_still_loads() {
        let store = MemStore::default();
        let mut chain = Blockchain::new(1).unwrap();
        chain.add_block(vec![Transaction::new("a", "b", 1)]);
        let mut blocks = chain.blocks().to_vec();
        blocks[1].transactions[0].amount = 500;
        for block in &blocks {
            store.put_block(block).unwrap();
        }
        let loaded = load_or_init(&store, 1).unwrap();
        assert_eq!(loaded.len(), 2);
        assert!(!loaded.is_chain_valid());
    }
}
