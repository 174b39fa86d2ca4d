//! HTTP surface: HTML pages over the explorer plus Prometheus metrics.

use std::sync::Arc;

use alloy::primitives::Address;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tx_explorer_chain::{BlockNumberOrTag, ChainError};
use tx_explorer_classifier::{BlockExplorer, TransferKind};
use tx_explorer_telemetry::Metrics;

use crate::render;

/// State shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub explorer: Arc<BlockExplorer>,
    pub metrics: Metrics,
    /// Latest block number seen when the node was probed at startup.
    pub latest_block: Option<u64>,
}

impl AppState {
    pub fn new(explorer: BlockExplorer, metrics: Metrics, latest_block: Option<u64>) -> Self {
        Self {
            explorer: Arc::new(explorer),
            metrics,
            latest_block,
        }
    }

    fn address(&self, kind: TransferKind) -> Address {
        self.explorer.contract(kind).address()
    }
}

/// Query string of the transaction pages.
#[derive(Debug, Deserialize)]
pub struct BlockQuery {
    pub block_num: u64,
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/erc20s", get(erc20_index))
        .route("/transactions/nft", get(nft_transactions))
        .route("/transactions/erc20", get(erc20_transactions))
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(addr: &str, state: AppState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Explorer listening on http://{}", addr);
    axum::serve(listener, create_app(state)).await?;
    Ok(())
}

async fn index(State(state): State<AppState>) -> Html<String> {
    Html(render::index_page(
        state.latest_block,
        state.address(TransferKind::Nft),
        state.address(TransferKind::Erc20),
    ))
}

async fn erc20_index(State(state): State<AppState>) -> Html<String> {
    Html(render::erc20_index_page(
        state.latest_block,
        state.address(TransferKind::Erc20),
    ))
}

async fn nft_transactions(State(state): State<AppState>, Query(query): Query<BlockQuery>) -> Response {
    transactions(&state, query.block_num, TransferKind::Nft).await
}

async fn erc20_transactions(
    State(state): State<AppState>,
    Query(query): Query<BlockQuery>,
) -> Response {
    transactions(&state, query.block_num, TransferKind::Erc20).await
}

async fn transactions(state: &AppState, block_num: u64, kind: TransferKind) -> Response {
    match state
        .explorer
        .transfers(BlockNumberOrTag::Number(block_num), kind)
        .await
    {
        Ok(classification) => Html(render::transactions_page(
            kind,
            block_num,
            state.address(kind),
            &classification,
        ))
        .into_response(),
        Err(e) => chain_error_response(block_num, e),
    }
}

fn chain_error_response(block_num: u64, e: ChainError) -> Response {
    let status = if e.is_not_found() {
        warn!("Block {} lookup: {}", block_num, e);
        StatusCode::NOT_FOUND
    } else {
        error!("Block {} lookup failed: {}", block_num, e);
        StatusCode::BAD_GATEWAY
    };
    (
        status,
        Html(render::error_page(status.as_u16(), &e.to_string())),
    )
        .into_response()
}

async fn metrics_handler(State(state): State<AppState>) -> Result<impl IntoResponse, StatusCode> {
    match state.metrics.gather() {
        Ok(body) => Ok((StatusCode::OK, body)),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
