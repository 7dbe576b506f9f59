use anyhow::{bail, Context, Result};
use powchain_core::{Block, ChainStore};
use sled::{Db, Tree};
use std::path::Path;
use tracing::info;

const TREE_BLOCKS: &str = "blocks";
const KEY_TIP_HEIGHT: &[u8] = b"tip_height";
const KEY_TIP_HASH: &[u8] = b"tip_hash";

/// Blocks keyed by big-endian index in the `blocks` tree, bincode-encoded.
/// Tip metadata lives in the default tree.
#[derive(Clone)]
pub struct SledStore {
    db: Db,
    blocks: Tree,
}

impl SledStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let db = sled::open(path).with_context(|| format!("opening sled at {}", path.display()))?;
        let blocks = db.open_tree(TREE_BLOCKS)?;
        info!("sled store opened at {}", path.display());
        Ok(Self { db, blocks })
    }

    /// Number of stored blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Drop every block and the tip metadata.
    pub fn clear(&self) -> Result<()> {
        self.blocks.clear()?;
        self.db.remove(KEY_TIP_HEIGHT)?;
        self.db.remove(KEY_TIP_HASH)?;
        self.db.flush()?;
        Ok(())
    }
}

impl ChainStore for SledStore {
    fn put_block(&self, block: &Block) -> Result<()> {
        let key = block.index.to_be_bytes();
        let bytes = bincode::serialize(block)?;
        self.blocks.insert(key, bytes)?;

        // only advance the tip; rewriting an older block leaves it alone
        if self.db.get(KEY_TIP_HEIGHT)?.is_none() || block.index >= self.tip_height()? {
            self.db.insert(KEY_TIP_HEIGHT, &block.index.to_be_bytes()[..])?;
            self.db.insert(KEY_TIP_HASH, block.hash.as_bytes())?;
        }

        self.db.flush()?;
        Ok(())
    }

    fn get_block(&self, index: u64) -> Result<Option<Block>> {
        let Some(bytes) = self.blocks.get(index.to_be_bytes())? else {
            return Ok(None);
        };
        let block = bincode::deserialize(&bytes)
            .with_context(|| format!("decoding block {index}"))?;
        Ok(Some(block))
    }

    fn tip_height(&self) -> Result<u64> {
        let Some(v) = self.db.get(KEY_TIP_HEIGHT)? else {
            return Ok(0);
        };
        let Ok(arr) = <[u8; 8]>::try_from(v.as_ref()) else {
            bail!("tip height has {} bytes, expected 8", v.len());
        };
        Ok(u64::from_be_bytes(arr))
    }

    fn tip_hash(&self) -> Result<Option<String>> {
        self.db
            .get(KEY_TIP_HASH)?
            .map(|v| String::from_utf8(v.to_vec()).context("tip hash is not utf-8"))
            .transpose()
    }

    fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }
}
