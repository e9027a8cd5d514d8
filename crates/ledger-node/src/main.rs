//! Thin HTTP front for the ledger core: JSON in, JSON out, no logic of its
//! own beyond mapping core errors to status codes.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use clap::Parser;
use ledger_core::{
    LedgerError, LedgerService, MineBudget, TransactionDraft, DEFAULT_DIFFICULTY,
};
use serde::Deserialize;
use serde_json::json;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

#[derive(Parser, Debug)]
struct Args {
    /// Address to listen on, e.g. 127.0.0.1:8080
    #[arg(long, default_value = "127.0.0.1:8080")]
    listen: String,

    /// Leading zero hex characters required of every block hash
    #[arg(long, default_value_t = DEFAULT_DIFFICULTY)]
    difficulty: u32,

    /// Abort a mining request after this many nonce attempts
    #[arg(long)]
    max_mine_iterations: Option<u64>,

    /// Abort a mining request after this many seconds
    #[arg(long)]
    mine_timeout_secs: Option<u64>,
}

#[derive(Clone)]
struct AppState {
    service: Arc<LedgerService>,
}

struct ApiError(LedgerError);

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            LedgerError::InvalidInput(_)
            | LedgerError::NoSelection
            | LedgerError::EmptyQuery => StatusCode::BAD_REQUEST,
            LedgerError::MiningTimeout | LedgerError::MiningCancelled => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            LedgerError::ChainTipMoved => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

async fn get_blockchain(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.service.chain_snapshot())
}

async fn get_pending(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.service.pending())
}

async fn add_transactions(
    State(state): State<AppState>,
    Json(drafts): Json<Vec<TransactionDraft>>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state.service.admit_transactions(drafts)?;
    Ok(Json(json!({
        "message": "Transactions added to pending pool",
        "pending_count": outcome.pending_count,
        "pending_transactions": outcome.pending_transactions,
    })))
}

async fn mine_block(
    State(state): State<AppState>,
    Json(ids): Json<Vec<String>>,
) -> Result<impl IntoResponse, ApiError> {
    // The nonce search is CPU-bound; keep it off the async workers.
    let service = state.service.clone();
    let block = tokio::task::spawn_blocking(move || service.mine_selected(&ids))
        .await
        .map_err(|_| LedgerError::MiningCancelled)??;
    Ok(Json(json!({
        "message": "Block mined successfully",
        "block": block,
    })))
}

#[derive(Deserialize)]
struct SearchParams {
    q: Option<String>,
}

async fn search_blockchain(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, ApiError> {
    let query = params.q.ok_or(LedgerError::EmptyQuery)?;
    let outcome = state.service.search_chain(&query)?;
    Ok(Json(outcome))
}

async fn get_status(State(state): State<AppState>) -> impl IntoResponse {
    let status = state.service.status();
    Json(json!({
        "blocks": status.block_count,
        "difficulty": status.difficulty,
        "is_valid": status.is_valid,
        "pending_tx_count": status.pending_count,
    }))
}

async fn shutdown_signal(service: Arc<LedgerService>) {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown requested, cancelling in-flight mining");
    service.cancel_token().cancel();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let budget = MineBudget {
        max_iterations: args.max_mine_iterations,
        max_duration: args.mine_timeout_secs.map(Duration::from_secs),
    };
    let service = Arc::new(LedgerService::new(args.difficulty, budget)?);
    info!(
        genesis_hash = %service.chain_snapshot().tip().hash,
        "genesis block mined"
    );

    let state = AppState {
        service: service.clone(),
    };

    let app = Router::new()
        .route("/api/blockchain", get(get_blockchain))
        .route("/api/pending", get(get_pending))
        .route("/api/transactions", post(add_transactions))
        .route("/api/mine", post(mine_block))
        .route("/api/search", get(search_blockchain))
        .route("/api/status", get(get_status))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = args.listen.parse()?;
    info!("ledger-node listening on http://{addr}");
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(shutdown_signal(service))
        .await?;
    Ok(())
}
