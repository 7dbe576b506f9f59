mod api;
mod constants;
mod miner;
#[cfg(test)]
mod test_support;

use anyhow::Context;
use clap::Parser;
use powchain_core::{constants::DEFAULT_DIFFICULTY, load_or_init};
use powchain_storage::SledStore;
use std::{future::Future, net::SocketAddr, sync::Arc, time::Duration};
use tracing::{error, info, Level};

use crate::{
    api::AppState,
    constants::{DEFAULT_DATA_DIR, DEFAULT_LISTEN, DEFAULT_MINE_INTERVAL_SECS},
    miner::{MinerConfig, Shutdown},
};

#[derive(Parser, Debug)]
#[command(name = "powchain-node")]
#[command(about = "Single-node proof-of-work ledger")]
struct Args {
    /// Address to listen on, e.g. 127.0.0.1:8080
    #[arg(long, default_value = DEFAULT_LISTEN)]
    listen: String,

    /// Data directory for sled
    #[arg(long, default_value = DEFAULT_DATA_DIR)]
    data_dir: String,

    /// Required leading zero hex digits in a block hash
    #[arg(long, default_value_t = DEFAULT_DIFFICULTY,
          value_parser = clap::value_parser!(u32).range(0..=64))]
    difficulty: u32,

    /// Seconds between mining attempts
    #[arg(long, default_value_t = DEFAULT_MINE_INTERVAL_SECS)]
    mine_interval_secs: u64,

    /// Search nonces on all cores
    #[arg(long)]
    parallel: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let store = SledStore::open(&args.data_dir)?;
    let chain = load_or_init(&store, args.difficulty).context("loading chain")?;
    info!(
        "Chain at height {} with difficulty {}",
        chain.latest_block().index,
        chain.difficulty()
    );

    let state = AppState::new(chain, store);
    let shutdown = Arc::new(Shutdown::default());
    let config = MinerConfig {
        interval: Duration::from_secs(args.mine_interval_secs),
        parallel: args.parallel,
    };
    let miner = tokio::spawn(miner::run(state.clone(), config, Arc::clone(&shutdown)));

    let app = api::router(state.clone());
    let addr: SocketAddr = args.listen.parse()?;
    let signal = shutdown_signal();
    info!("powchain-node listening on http://{addr}");
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(async move {
            signal.await;
            info!("Shutting down...");
            shutdown.trigger();
        })
        .await?;

    miner.await?;
    state.store.flush()?;
    Ok(())
}

/// Resolves on ctrl-c, or SIGTERM on unix. The SIGTERM handler is installed
/// before this returns. A listener that cannot be installed is logged and
/// never fires.
fn shutdown_signal() -> impl Future<Output = ()> {
    #[cfg(unix)]
    let terminate = {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(stream) => Some(stream),
            Err(err) => {
                error!("Failed to install SIGTERM handler: {err}");
                None
            }
        }
    };

    async move {
        let ctrl_c = async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for ctrl-c: {err}");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async move {
            match terminate {
                Some(mut stream) => {
                    stream.recv().await;
                }
                None => std::future::pending::<()>().await,
            }
        };
        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {}
            _ = terminate => {}
        }
    }
}
