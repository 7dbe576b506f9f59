use anyhow::Result;
use powchain_core::{Block, Cancellation};
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::{
    sync::Notify,
    time::{interval, MissedTickBehavior},
};
use tracing::{debug, error, info, warn};

use crate::api::AppState;

#[derive(Clone, Copy, Debug)]
pub(crate) struct MinerConfig {
    pub interval: Duration,
    pub parallel: bool,
}

/// Stop flag shared by the miner loop and the nonce search. Setting it also
/// wakes a miner waiting for its next tick.
#[derive(Debug, Default)]
pub(crate) struct Shutdown {
    stopped: AtomicBool,
    notify: Notify,
}

impl Shutdown {
    pub fn trigger(&self) {
        self.stopped.store(true, Ordering::Relaxed);
        self.notify.notify_waiters();
    }

    /// Resolves once [`Self::trigger`] has been called.
    pub async fn wait(&self) {
        // registered on creation, so a trigger between here and the await
        // still wakes it
        let notified = self.notify.notified();
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }
}

impl Cancellation for Shutdown {
    fn is_cancelled(&self) -> bool {
        self.stopped.load(Ordering::Relaxed)
    }
}

/// Mine one block from everything pending. Returns `None` when the pool is
/// empty or the search was cancelled.
///
/// The pool is drained atomically, so a transaction submitted mid-cycle waits
/// for the next block instead of being cleared unseen. A block that fails to
/// save stays on the in-memory chain.
pub(crate) async fn mine_pending(
    state: &AppState,
    parallel: bool,
    shutdown: Arc<Shutdown>,
) -> Result<Option<Block>> {
    if shutdown.is_cancelled() {
        return Ok(None);
    }
    let txs = state.mempool.drain();
    if txs.is_empty() {
        debug!("No pending transactions, skipping tick");
        return Ok(None);
    }
    let tx_count = txs.len();

    let (template, pow) = {
        let chain = state.chain.read().await;
        (chain.next_template(txs), *chain.proof_of_work())
    };
    info!(
        "Mining block {} with {} transactions at difficulty {}",
        template.index,
        tx_count,
        pow.difficulty()
    );

    let mined = tokio::task::spawn_blocking(move || {
        if parallel {
            pow.mine_parallel_cancellable(template, shutdown.as_ref())
        } else {
            pow.mine_cancellable(template, shutdown.as_ref())
        }
    })
    .await?;
    let Some(block) = mined else {
        warn!("Mining stopped, {tx_count} pending transactions dropped");
        return Ok(None);
    };

    let block = state.chain.write().await.append(block)?.clone();
    let saved = {
        let store = Arc::clone(&state.store);
        let block = block.clone();
        tokio::task::spawn_blocking(move || store.put_block(&block)).await?
    };
    match saved {
        Ok(()) => info!(
            "Block {} mined and saved with hash {}",
            block.index, block.hash
        ),
        Err(err) => warn!("Failed to save block {}: {err:#}", block.index),
    }
    Ok(Some(block))
}

/// Tick every `config.interval` until `shutdown` is triggered. The first tick
/// fires one full interval after start. A trigger ends the wait for the next
/// tick right away and cancels a search in progress.
pub(crate) async fn run(state: AppState, config: MinerConfig, shutdown: Arc<Shutdown>) {
    let mut ticker = interval(config.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = shutdown.wait() => break,
            _ = ticker.tick() => {}
        }
        if shutdown.is_cancelled() {
            break;
        }
        if let Err(err) = mine_pending(&state, config.parallel, Arc::clone(&shutdown)).await {
            error!("Mining cycle failed: {err:#}");
        }
    }
    info!("Miner stopped");
}
