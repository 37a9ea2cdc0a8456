//! 测试辅助模块
//! 桩报价引擎、记录型报告输出与测试用应用状态

#![allow(dead_code)]

use std::{
    str::FromStr,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{HeaderMap, Request, StatusCode},
    Router,
};
use ethers::types::{Address, Bytes, U256};
use rust_decimal::Decimal;
use swapgate::{
    api,
    app_state::AppState,
    config::{
        AccessConfig, ChainConfig, Config, EngineConfig, LoggingConfig, ServerConfig, SwapConfig,
        DEFAULT_WRAPPED_NATIVE_ADDRESS,
    },
    domain::{
        LiquiditySource, MarketDepth, MarketDepthRequest, QuoteReport, QuoteReportSource,
        SourceBreakdown, SwapQuote, TokenPrice, TokenPricesRequest,
    },
    metrics::Metrics,
    service::{
        CalculateSwapQuoteParams, EngineError, QuoteReportEntry, QuoteReportSink, QuotingEngine,
    },
};
use tower::ServiceExt;

pub const RFQT_KEY: &str = "rfqt-key";
pub const PLP_KEY: &str = "plp-key";
pub const REGISTRY_PASSWORD: &str = "0123456789abcdef0123456789abcdef0123";
pub const DAI: &str = "0x6B175474E89094C44Da98b954EedeAC495271d0F";
pub const TAKER: &str = "0x1111111111111111111111111111111111111111";

pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            bind_addr: "127.0.0.1:0".into(),
        },
        logging: LoggingConfig {
            level: "debug".into(),
            format: "text".into(),
        },
        chain: ChainConfig {
            chain_id: 1,
            native_symbol: "ETH".into(),
            wrapped_native_address: DEFAULT_WRAPPED_NATIVE_ADDRESS.into(),
            tokens: Vec::new(),
        },
        access: AccessConfig {
            rfqt_api_key_whitelist: vec![RFQT_KEY.into(), PLP_KEY.into()],
            plp_api_key_whitelist: vec![PLP_KEY.into()],
            rfqt_registry_passwords: vec![REGISTRY_PASSWORD.into()],
        },
        engine: EngineConfig {
            url: "http://127.0.0.1:9".into(),
            timeout_secs: 1,
        },
        swap: SwapConfig {
            default_slippage: Decimal::new(1, 2),
            price_comparison_sources: vec![LiquiditySource::UniswapV2],
        },
    }
}

/// 桩报价引擎：记录调用参数，按卖出数量 1:2 报价
#[derive(Default)]
pub struct StubEngine {
    pub calls: Mutex<Vec<CalculateSwapQuoteParams>>,
    pub fail_with: Option<EngineError>,
}

impl StubEngine {
    pub fn failing(err: EngineError) -> Self {
        Self {
            calls: Mutex::default(),
            fail_with: Some(err),
        }
    }
}

#[async_trait]
impl QuotingEngine for StubEngine {
    async fn get_swap_quote(
        &self,
        params: &CalculateSwapQuoteParams,
    ) -> Result<SwapQuote, EngineError> {
        self.calls.lock().unwrap().push(params.clone());
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }
        let sell_amount = params.sell_amount.unwrap_or_else(|| U256::from(50u64));
        let buy_amount = params.buy_amount.unwrap_or(sell_amount * 2);
        let entry = QuoteReportSource {
            liquidity_source: "Uniswap_V2".into(),
            maker_amount: buy_amount,
            taker_amount: sell_amount,
            maker_uri: None,
            is_rfqt: false,
        };
        Ok(SwapQuote {
            price: Decimal::from_str("2").unwrap(),
            guaranteed_price: Decimal::from_str("1.98").unwrap(),
            to: Address::repeat_byte(0xde),
            data: Bytes::from(vec![0xab, 0xcd]),
            value: U256::zero(),
            gas: U256::from(150_000u64),
            estimated_gas: U256::from(140_000u64),
            gas_price: params.gas_price.unwrap_or_else(|| U256::from(30u64)),
            protocol_fee: U256::zero(),
            minimum_protocol_fee: U256::zero(),
            buy_token_address: params.buy_token,
            sell_token_address: params.sell_token,
            buy_amount,
            sell_amount,
            sources: vec![SourceBreakdown {
                name: "Uniswap_V2".into(),
                proportion: Decimal::ONE,
            }],
            orders: Vec::new(),
            allowance_target: Address::repeat_byte(0xaa),
            quote_report: Some(QuoteReport {
                sources_considered: vec![entry.clone()],
                sources_delivered: vec![entry],
            }),
            decoded_unique_id: Some("unique-1".into()),
        })
    }

    async fn get_gas_price(&self) -> Result<U256, EngineError> {
        Ok(U256::from(30u64))
    }

    async fn get_market_depth(&self, _: &MarketDepthRequest) -> Result<MarketDepth, EngineError> {
        match &self.fail_with {
            Some(err) => Err(err.clone()),
            None => Ok(MarketDepth::default()),
        }
    }

    async fn get_token_prices(
        &self,
        request: &TokenPricesRequest,
    ) -> Result<Vec<TokenPrice>, EngineError> {
        Ok(request
            .tokens
            .iter()
            .map(|address| TokenPrice {
                symbol: String::new(),
                address: *address,
                price: Decimal::ONE,
            })
            .collect())
    }
}

/// 只记录 (提交方, unique id)
#[derive(Default)]
pub struct RecordingSink {
    pub entries: Mutex<Vec<(String, Option<String>)>>,
}

impl QuoteReportSink for RecordingSink {
    fn publish(&self, entry: &QuoteReportEntry<'_>) {
        self.entries.lock().unwrap().push((
            entry.submitted_by.to_string(),
            entry.decoded_unique_id.map(String::from),
        ));
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub engine: Arc<StubEngine>,
    pub sink: Arc<RecordingSink>,
}

pub fn test_app_with(engine: StubEngine) -> TestApp {
    let engine = Arc::new(engine);
    let sink = Arc::new(RecordingSink::default());
    let state = Arc::new(
        AppState::new(
            Arc::new(test_config()),
            engine.clone(),
            sink.clone(),
            Arc::new(Metrics::new()),
        )
        .expect("test state"),
    );
    TestApp {
        router: api::routes(state.clone()),
        state,
        engine,
        sink,
    }
}

pub fn test_app() -> TestApp {
    test_app_with(StubEngine::default())
}

/// 发送 GET 请求，返回状态码、响应头与响应体
pub async fn get(router: &Router, uri: &str, headers: &[(&str, &str)]) -> (StatusCode, HeaderMap, Vec<u8>) {
    let mut builder = Request::builder().method("GET").uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let response = router
        .clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec();
    (status, headers, body)
}

pub async fn get_json(router: &Router, uri: &str, headers: &[(&str, &str)]) -> (StatusCode, serde_json::Value) {
    let (status, _, body) = get(router, uri, headers).await;
    let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}
