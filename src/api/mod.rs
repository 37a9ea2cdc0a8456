use std::sync::Arc;

use axum::{
    extract::State,
    http::header::CONTENT_TYPE,
    middleware::from_fn,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::app_state::AppState;

pub mod middleware;
pub mod rfq_registry_api;
pub mod swap_api;

use middleware::{access_log, trace_id_middleware};

#[derive(Debug, Serialize)]
pub struct Healthz {
    pub status: &'static str,
    pub chain_id: u64,
}

pub async fn healthz(State(st): State<Arc<AppState>>) -> Json<Healthz> {
    Json(Healthz {
        status: "ok",
        chain_id: st.registry.chain_id(),
    })
}

async fn metrics(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    (
        [(CONTENT_TYPE, "text/plain; version=0.0.4")],
        st.metrics.render_prometheus(),
    )
}

pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/swap/v1/price", get(swap_api::get_price))
        .route("/swap/v1/quote", get(swap_api::get_quote))
        .route("/swap/v1/tokens", get(swap_api::get_tokens))
        .route("/swap/v1/depth", get(swap_api::get_market_depth))
        .route("/swap/v1/prices", get(swap_api::get_token_prices))
        .route("/swap/v1/rfq/registry", get(rfq_registry_api::get_rfq_registry))
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .layer(
            ServiceBuilder::new()
                .layer(from_fn(trace_id_middleware))
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(from_fn(access_log)),
        )
        .with_state(state)
}
