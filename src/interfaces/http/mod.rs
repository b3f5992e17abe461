//! HTTP surface: payment ingestion, summary queries and a route probe.

pub mod handlers;

use crate::application::ingest::PaymentService;
use crate::application::summary::SummaryAggregator;
use crate::domain::route::RouteState;
use axum::Router;
use axum::routing::{get, post};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

#[derive(Clone)]
pub struct AppState {
    pub payments: PaymentService,
    pub summary: SummaryAggregator,
    pub route: Arc<RouteState>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/payments", post(handlers::create_payment))
        .route("/payments-summary", get(handlers::payments_summary))
        .route("/health", get(handlers::health))
        .with_state(state)
}

pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
