//! 兑换报价接口
//!
//! price / quote / tokens / depth / prices

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Json,
};
use serde::Serialize;

use crate::{
    app_state::AppState,
    domain::{
        MarketDepth, QuoteEndpoint, SwapPriceResponse, SwapQuoteResponse, TokenInfo, TokenPrice,
    },
    error::ApiError,
    metrics::Metrics,
    service::{ErrorClassifier, RawQuery, WrapUnwrapDetector},
};

pub const API_KEY_HEADER: &str = "0x-api-key";

#[derive(Debug, Serialize)]
pub struct RecordsResponse<T> {
    pub records: Vec<T>,
}

fn api_key(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
}

fn record<T>(metrics: &Metrics, endpoint: &'static str, result: &Result<T, ApiError>) {
    match result {
        Ok(_) => metrics.count_ok(endpoint),
        Err(_) => metrics.count_err(endpoint),
    }
}

/// 解析 -> 包装/解包分类 -> 编排；任何失败都经过错误分类
async fn swap(
    st: &AppState,
    endpoint: QuoteEndpoint,
    headers: &HeaderMap,
    query: &RawQuery,
) -> Result<SwapQuoteResponse, ApiError> {
    let request = st.parser().parse(endpoint, query, api_key(headers))?;
    let pair = WrapUnwrapDetector::from_registry(&st.registry)
        .classify(request.sell_token, request.buy_token);

    st.orchestrator
        .get_quote(&request, &pair)
        .await
        .map_err(|e| ErrorClassifier::classify(e, request.buy_amount.is_some()))
}

/// GET /swap/v1/price
pub async fn get_price(
    State(st): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<RawQuery>,
) -> Result<Json<SwapPriceResponse>, ApiError> {
    let result = swap(&st, QuoteEndpoint::Price, &headers, &query)
        .await
        .map(SwapPriceResponse::from);
    record(&st.metrics, "GET /swap/v1/price", &result);
    result.map(Json)
}

/// GET /swap/v1/quote
pub async fn get_quote(
    State(st): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<RawQuery>,
) -> Result<Json<SwapQuoteResponse>, ApiError> {
    let result = swap(&st, QuoteEndpoint::Quote, &headers, &query).await;
    record(&st.metrics, "GET /swap/v1/quote", &result);
    result.map(Json)
}

/// GET /swap/v1/tokens
pub async fn get_tokens(State(st): State<Arc<AppState>>) -> Json<RecordsResponse<TokenInfo>> {
    st.metrics.count_ok("GET /swap/v1/tokens");
    Json(RecordsResponse {
        records: st.registry.tokens(),
    })
}

async fn market_depth(st: &AppState, query: &RawQuery) -> Result<MarketDepth, ApiError> {
    let request = st.parser().parse_market_depth(query)?;
    st.orchestrator
        .get_market_depth(&request)
        .await
        .map_err(|e| ErrorClassifier::classify(e, false))
}

async fn token_prices(st: &AppState, query: &RawQuery) -> Result<Vec<TokenPrice>, ApiError> {
    let request = st.parser().parse_token_prices(query)?;
    st.orchestrator
        .get_token_prices(&request)
        .await
        .map_err(|e| ErrorClassifier::classify(e, false))
}

/// GET /swap/v1/depth
pub async fn get_market_depth(
    State(st): State<Arc<AppState>>,
    Query(query): Query<RawQuery>,
) -> Result<Json<MarketDepth>, ApiError> {
    let result = market_depth(&st, &query).await;
    record(&st.metrics, "GET /swap/v1/depth", &result);
    result.map(Json)
}

/// GET /swap/v1/prices
pub async fn get_token_prices(
    State(st): State<Arc<AppState>>,
    Query(query): Query<RawQuery>,
) -> Result<Json<RecordsResponse<TokenPrice>>, ApiError> {
    let result = token_prices(&st, &query).await;
    record(&st.metrics, "GET /swap/v1/prices", &result);
    result.map(|records| Json(RecordsResponse { records }))
}
