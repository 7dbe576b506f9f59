use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use powchain_core::{Block, Blockchain, ChainStore, Mempool, Transaction};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

/// Shared handles for the HTTP handlers and the miner. The chain lock only
/// guards reads and the final append; mining itself happens outside it.
#[derive(Clone)]
pub(crate) struct AppState {
    pub chain: Arc<RwLock<Blockchain>>,
    pub mempool: Arc<Mempool>,
    pub store: Arc<dyn ChainStore>,
}

impl AppState {
    pub fn new<S>(chain: Blockchain, store: S) -> Self
    where
        S: ChainStore + 'static,
    {
        Self {
            chain: Arc::new(RwLock::new(chain)),
            mempool: Arc::new(Mempool::new()),
            store: Arc::new(store),
        }
    }
}

#[derive(Serialize)]
pub(crate) struct Health {
    status: &'static str,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Head {
    pub height: u64,
    pub hash: String,
    pub difficulty: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Validity {
    pub valid: bool,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TxIn {
    pub sender: String,
    pub recipient: String,
    pub amount: u64,
}

pub(crate) fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/transactions", post(submit_transaction))
        .route("/blocks", get(list_blocks))
        .route("/mempool", get(list_mempool))
        .route("/chain/head", get(head))
        .route("/chain/validate", get(validate))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Amount and identities are stored as given; nothing is checked here.
pub(crate) async fn submit_transaction(
    State(state): State<AppState>,
    Json(tx): Json<TxIn>,
) -> Json<Transaction> {
    let tx = Transaction::new(tx.sender, tx.recipient, tx.amount);
    info!("Accepted transaction {}", tx.hash);
    state.mempool.add(tx.clone());
    Json(tx)
}

pub(crate) async fn list_blocks(State(state): State<AppState>) -> Json<Vec<Block>> {
    Json(state.chain.read().await.blocks().to_vec())
}

pub(crate) async fn list_mempool(State(state): State<AppState>) -> Json<Vec<Transaction>> {
    Json(state.mempool.snapshot())
}

pub(crate) async fn head(State(state): State<AppState>) -> Json<Head> {
    let chain = state.chain.read().await;
    let latest = chain.latest_block();
    Json(Head {
        height: latest.index,
        hash: latest.hash.clone(),
        difficulty: chain.difficulty(),
    })
}

pub(crate) async fn validate(State(state): State<AppState>) -> Json<Validity> {
    let result = state.chain.read().await.validate_chain();
    Json(Validity {
        valid: result.is_ok(),
        error: result.err().map(|e| e.to_string()),
    })
}
