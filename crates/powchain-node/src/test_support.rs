use crate::api::AppState;
use anyhow::{bail, Result};
use powchain_core::{load_or_init, Block, Blockchain, ChainStore};
use powchain_storage::SledStore;
use tempfile::{tempdir, TempDir};

/// Node state over a fresh sled store in a temp dir. Keep the dir alive for
/// the duration of the test.
pub(crate) fn temp_state(difficulty: u32) -> (TempDir, AppState) {
    let dir = tempdir().unwrap();
    let store = SledStore::open(dir.path()).unwrap();
    let chain = load_or_init(&store, difficulty).unwrap();
    (dir, AppState::new(chain, store))
}

/// Store whose writes always fail and which holds nothing.
pub(crate) struct ReadOnlyStore;

impl ChainStore for ReadOnlyStore {
    fn put_block(&self, block: &Block) -> Result<()> {
        bail!("store is read-only, block {} not written", block.index)
    }

    fn get_block(&self, _index: u64) -> Result<Option<Block>> {
        Ok(None)
    }

    fn tip_height(&self) -> Result<u64> {
        Ok(0)
    }

    fn tip_hash(&self) -> Result<Option<String>> {
        Ok(None)
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }
}

/// Node state whose store rejects every write.
pub(crate) fn read_only_state(difficulty: u32) -> AppState {
    AppState::new(Blockchain::new(difficulty).unwrap(), ReadOnlyStore)
}
