//! 报价引擎集成
//!
//! 路由与价格计算由外部报价引擎完成，这里只定义调用契约和 HTTP 客户端

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use ethers::types::{Address, U256};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

use crate::{
    config::EngineConfig,
    domain::{
        AffiliateFee, CanonicalSwapRequest, LiquiditySource, MarketDepth, MarketDepthRequest,
        RfqtRequestOptions, SwapQuote, TokenPrice, TokenPricesRequest,
    },
    metrics::Metrics,
    service::wrap_unwrap::ClassifiedPair,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// 链上模拟回滚
    #[error("{message}")]
    Revert {
        message: String,
        data: Option<String>,
    },

    /// 引擎返回的业务错误，消息原样保留
    #[error("{0}")]
    Upstream(String),

    #[error("quote engine request failed: {0}")]
    Transport(String),

    #[error("invalid quote engine response: {0}")]
    Decode(String),
}

/// 普通报价路径的引擎请求
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculateSwapQuoteParams {
    pub taker_address: Option<Address>,
    pub sell_token: Address,
    pub buy_token: Address,
    #[serde(with = "crate::utils::serde_u256::option")]
    pub sell_amount: Option<U256>,
    #[serde(with = "crate::utils::serde_u256::option")]
    pub buy_amount: Option<U256>,
    pub slippage_percentage: Decimal,
    #[serde(with = "crate::utils::serde_u256::option")]
    pub gas_price: Option<U256>,
    pub excluded_sources: Vec<LiquiditySource>,
    pub included_sources: Vec<LiquiditySource>,
    pub affiliate_fee: AffiliateFee,
    pub affiliate_address: Option<Address>,
    pub rfqt: Option<RfqtRequestOptions>,
    pub api_key: Option<String>,
    pub skip_validation: bool,
    pub should_sell_entire_balance: bool,
    pub is_native_sell: bool,
    pub is_meta_transaction: bool,
}

impl CalculateSwapQuoteParams {
    /// 复制规范化请求的全部字段；代币使用替换后的包装地址
    pub fn from_request(request: &CanonicalSwapRequest, pair: &ClassifiedPair) -> Self {
        Self {
            taker_address: request.taker_address,
            sell_token: pair.sell_token,
            buy_token: pair.buy_token,
            sell_amount: request.sell_amount,
            buy_amount: request.buy_amount,
            slippage_percentage: request.slippage_percentage,
            gas_price: request.gas_price,
            excluded_sources: request.source_filters.excluded.iter().copied().collect(),
            included_sources: request.source_filters.included.iter().copied().collect(),
            affiliate_fee: request.affiliate_fee.clone(),
            affiliate_address: request.affiliate_address,
            rfqt: request.rfqt,
            api_key: request.api_key.clone(),
            skip_validation: request.skip_validation,
            should_sell_entire_balance: request.should_sell_entire_balance,
            is_native_sell: pair.is_native_sell,
            is_meta_transaction: false,
        }
    }
}

#[async_trait]
pub trait QuotingEngine: Send + Sync {
    async fn get_swap_quote(&self, params: &CalculateSwapQuoteParams) -> Result<SwapQuote, EngineError>;

    async fn get_gas_price(&self) -> Result<U256, EngineError>;

    async fn get_market_depth(&self, request: &MarketDepthRequest) -> Result<MarketDepth, EngineError>;

    async fn get_token_prices(
        &self,
        request: &TokenPricesRequest,
    ) -> Result<Vec<TokenPrice>, EngineError>;
}

/// 引擎错误响应体
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EngineErrorBody {
    message: String,
    #[serde(default)]
    revert_data: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GasPriceBody {
    #[serde(with = "crate::utils::serde_u256")]
    gas_price: U256,
}

/// 把引擎错误响应映射为 `EngineError`
fn map_error_body(status: reqwest::StatusCode, body: &str) -> EngineError {
    match serde_json::from_str::<EngineErrorBody>(body) {
        Ok(EngineErrorBody {
            message,
            revert_data: Some(data),
        }) => EngineError::Revert {
            message,
            data: Some(data),
        },
        Ok(EngineErrorBody { message, .. }) => EngineError::Upstream(message),
        Err(_) => EngineError::Upstream(format!("quote engine returned {}: {}", status, body)),
    }
}

/// HTTP 报价引擎客户端
pub struct HttpQuoteEngine {
    client: Client,
    base_url: String,
    metrics: Arc<Metrics>,
}

impl HttpQuoteEngine {
    pub fn new(config: &EngineConfig, metrics: Arc<Metrics>) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            metrics,
        })
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, EngineError> {
        let started = std::time::Instant::now();
        let result = self.send_inner(request).await;
        self.metrics
            .observe_upstream_latency_ms(started.elapsed().as_millis(), result.is_ok());
        result
    }

    async fn send_inner<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, EngineError> {
        let response = request
            .send()
            .await
            .map_err(|e| EngineError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("无法读取错误响应: {}", e));
            return Err(map_error_body(status, &body));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| EngineError::Decode(e.to_string()))
    }
}

#[async_trait]
impl QuotingEngine for HttpQuoteEngine {
    async fn get_swap_quote(&self, params: &CalculateSwapQuoteParams) -> Result<SwapQuote, EngineError> {
        let url = format!("{}/swap/quote", self.base_url);
        self.send(self.client.post(&url).json(params)).await
    }

    async fn get_gas_price(&self) -> Result<U256, EngineError> {
        let url = format!("{}/gas/price", self.base_url);
        let body: GasPriceBody = self.send(self.client.get(&url)).await?;
        Ok(body.gas_price)
    }

    async fn get_market_depth(&self, request: &MarketDepthRequest) -> Result<MarketDepth, EngineError> {
        let url = format!("{}/swap/depth", self.base_url);
        let excluded = request
            .excluded_sources
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(",");
        let query = [
            ("sellToken", format!("{:?}", request.sell_token)),
            ("buyToken", format!("{:?}", request.buy_token)),
            ("sellAmount", request.sell_amount.to_string()),
            ("numSamples", request.num_samples.to_string()),
            ("sampleDistributionBase", request.sample_distribution_base.to_string()),
            ("excludedSources", excluded),
        ];
        self.send(self.client.get(&url).query(&query)).await
    }

    async fn get_token_prices(
        &self,
        request: &TokenPricesRequest,
    ) -> Result<Vec<TokenPrice>, EngineError> {
        let url = format!("{}/swap/prices", self.base_url);
        let tokens = request
            .tokens
            .iter()
            .map(|t| format!("{:?}", t))
            .collect::<Vec<_>>()
            .join(",");
        let query = [
            ("sellToken", format!("{:?}", request.sell_token)),
            ("sellAmount", request.sell_amount.to_string()),
            ("tokens", tokens),
        ];
        self.send(self.client.get(&url).query(&query)).await
    }
}
