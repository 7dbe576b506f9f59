#![allow(dead_code)]

use std::fs;

use powchain_core::{Block, Blockchain, Transaction};
use powchain_storage::SledStore;
use tempfile::{tempdir, TempDir};

pub fn create_temp_store() -> (TempDir, SledStore) {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let store = SledStore::open(temp_dir.path()).expect("Failed to open SledStore");
    (temp_dir, store)
}

pub fn teardown_store(temp_dir: TempDir, store: SledStore) {
    let db_path = temp_dir.path().to_path_buf();
    store.clear().expect("Failed to clear the store");
    drop(store);
    temp_dir.close().expect("Failed to delete temp dir");
    let _ = fs::remove_dir_all(&db_path);
    assert!(!db_path.exists(), "Database directory should be removed");
}

/// A chain of `len` blocks mined at difficulty 1, each holding one transaction.
pub fn mined_blocks(len: usize) -> Vec<Block> {
    let mut chain = Blockchain::new(1).expect("difficulty in range");
    for i in 1..len {
        chain.add_block(vec![Transaction::new(format!("user{i}"), "sink", i as u64)]);
    }
    chain.blocks().to_vec()
}
