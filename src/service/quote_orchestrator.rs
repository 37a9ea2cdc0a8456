//! 报价编排
//!
//! 根据包装/解包分类选择计算路径，并对结果做后处理：去除内部字段、
//! 注入价格比较、记录 RFQT 成交日志与溯源报告。

use std::sync::Arc;

use ethers::types::{Address, U256};

use crate::{
    domain::{
        CanonicalSwapRequest, LiquiditySource, MarketDepth, MarketDepthRequest, MarketSide,
        QuoteEndpoint, SwapQuote, SwapQuoteResponse, TokenPrice, TokenPricesRequest,
        TokenRegistry,
    },
    service::{
        price_comparison::{compute_price_comparisons, TokenDecimals},
        quote_engine::{CalculateSwapQuoteParams, QuotingEngine},
        quote_report::{QuoteReportEntry, QuoteReportSink, SUBMISSION_ROLE_TAKER},
        request_parser::tokens_must_differ,
        weth::WethQuoter,
        wrap_unwrap::{ClassifiedPair, SwapKind},
    },
};

/// 代币表缺失小数位时的默认值
const DEFAULT_TOKEN_DECIMALS: u8 = 18;

pub struct QuoteOrchestrator {
    engine: Arc<dyn QuotingEngine>,
    weth: WethQuoter,
    registry: Arc<TokenRegistry>,
    report_sink: Arc<dyn QuoteReportSink>,
    price_comparison_sources: Vec<LiquiditySource>,
}

impl QuoteOrchestrator {
    pub fn new(
        engine: Arc<dyn QuotingEngine>,
        registry: Arc<TokenRegistry>,
        report_sink: Arc<dyn QuoteReportSink>,
        price_comparison_sources: Vec<LiquiditySource>,
    ) -> Self {
        Self {
            engine,
            weth: WethQuoter::new(registry.wrapped_native()),
            registry,
            report_sink,
            price_comparison_sources,
        }
    }

    pub async fn get_quote(
        &self,
        request: &CanonicalSwapRequest,
        pair: &ClassifiedPair,
    ) -> anyhow::Result<SwapQuoteResponse> {
        // 包装/解包时替换后地址必然相同，跳过该检查
        if !pair.is_wrap_or_unwrap() && pair.sell_token == pair.buy_token {
            return Err(tokens_must_differ().into());
        }
        let side = request.market_side()?;

        let quote = self.compute(request, pair, side).await?;
        let decoded_unique_id = quote.decoded_unique_id.clone();
        let (mut response, report) = quote.into_response_parts();

        if request.include_price_comparisons {
            if let Some(report) = report.as_ref() {
                let decimals = TokenDecimals {
                    sell: self.decimals_of(pair.sell_token),
                    buy: self.decimals_of(pair.buy_token),
                };
                response.price_comparisons = Some(compute_price_comparisons(
                    report,
                    side,
                    decimals,
                    &self.price_comparison_sources,
                ));
            }
        }

        if request.endpoint == QuoteEndpoint::Quote {
            if let Some(rfqt) = request.rfqt {
                self.log_firm_quote(request, &response);

                if rfqt.intent_on_filling {
                    if let Some(report) = report.as_ref() {
                        self.report_sink.publish(&QuoteReportEntry {
                            submitted_by: SUBMISSION_ROLE_TAKER,
                            taker: request.taker_address,
                            decoded_unique_id: decoded_unique_id.as_deref(),
                            sell_token: response.sell_token_address,
                            buy_token: response.buy_token_address,
                            sell_amount: response.sell_amount,
                            buy_amount: response.buy_amount,
                            report,
                            reported_at: chrono::Utc::now(),
                        });
                    }
                }
            }
        }

        Ok(response)
    }

    pub async fn get_market_depth(&self, request: &MarketDepthRequest) -> anyhow::Result<MarketDepth> {
        Ok(self.engine.get_market_depth(request).await?)
    }

    pub async fn get_token_prices(
        &self,
        request: &TokenPricesRequest,
    ) -> anyhow::Result<Vec<TokenPrice>> {
        let mut prices = self.engine.get_token_prices(request).await?;
        let tokens = self.registry.tokens();
        for price in prices.iter_mut().filter(|p| p.symbol.is_empty()) {
            if let Some(info) = tokens.iter().find(|t| t.address == price.address) {
                price.symbol = info.symbol.clone();
            }
        }
        Ok(prices)
    }

    async fn compute(
        &self,
        request: &CanonicalSwapRequest,
        pair: &ClassifiedPair,
        side: MarketSide,
    ) -> anyhow::Result<SwapQuote> {
        match pair.kind {
            SwapKind::Wrap | SwapKind::Unwrap => {
                let amount = match side {
                    MarketSide::Sell => request.sell_amount,
                    MarketSide::Buy => request.buy_amount,
                }
                .unwrap_or_default();
                let gas_price = match request.gas_price {
                    Some(gas_price) => gas_price,
                    None => self.engine.get_gas_price().await?,
                };
                Ok(if pair.kind == SwapKind::Wrap {
                    self.weth.wrap_quote(amount, gas_price)
                } else {
                    self.weth.unwrap_quote(amount, gas_price)
                })
            }
            SwapKind::Ordinary => {
                let params = CalculateSwapQuoteParams::from_request(request, pair);
                Ok(self.engine.get_swap_quote(&params).await?)
            }
        }
    }

    fn decimals_of(&self, token: Address) -> u8 {
        self.registry
            .decimals(token)
            .unwrap_or(DEFAULT_TOKEN_DECIMALS)
    }

    fn log_firm_quote(&self, request: &CanonicalSwapRequest, response: &SwapQuoteResponse) {
        let makers: Vec<String> = response
            .orders
            .iter()
            .filter(|o| o.source == LiquiditySource::Native.as_str())
            .map(|o| match &o.maker_uri {
                Some(uri) => uri.clone(),
                None => format!("{:?}", o.maker_address),
            })
            .collect();
        let native_amount: U256 = response
            .orders
            .iter()
            .filter(|o| o.source == LiquiditySource::Native.as_str())
            .fold(U256::zero(), |acc, o| acc.saturating_add(o.taker_amount));

        tracing::info!(
            taker = ?request.taker_address,
            api_key = request.api_key.as_deref().unwrap_or_default(),
            sell_token = ?response.sell_token_address,
            buy_token = ?response.buy_token_address,
            sell_amount = %response.sell_amount,
            buy_amount = %response.buy_amount,
            native_fill_amount = %native_amount,
            makers = ?makers,
            "firm quote served"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::{
        domain::{
            quote::fixtures::quote, swap_request::fixtures::*, MarketDepth, OrderSummary,
            QuoteReport, QuoteReportSource, RfqtRequestOptions, NATIVE_ASSET_ADDRESS,
        },
        error::ApiError,
        service::{
            error_classifier::ErrorClassifier, quote_engine::EngineError,
            wrap_unwrap::WrapUnwrapDetector,
        },
    };

    #[derive(Default)]
    struct StubEngine {
        calls: Mutex<Vec<CalculateSwapQuoteParams>>,
        fail_with: Option<EngineError>,
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
            let mut q = quote(params.sell_token, params.buy_token, 100, 200);
            q.quote_report = Some(QuoteReport {
                sources_considered: vec![QuoteReportSource {
                    liquidity_source: "Native".into(),
                    maker_amount: U256::from(200u64),
                    taker_amount: U256::from(100u64),
                    maker_uri: Some("https://maker.example".into()),
                    is_rfqt: true,
                }],
                sources_delivered: Vec::new(),
            });
            q.orders = vec![OrderSummary {
                source: "Native".into(),
                maker_address: Address::repeat_byte(0x33),
                maker_uri: Some("https://maker.example".into()),
                maker_amount: U256::from(200u64),
                taker_amount: U256::from(100u64),
            }];
            Ok(q)
        }

        async fn get_gas_price(&self) -> Result<U256, EngineError> {
            Ok(U256::from(7u64))
        }

        async fn get_market_depth(&self, _: &MarketDepthRequest) -> Result<MarketDepth, EngineError> {
            Ok(MarketDepth::default())
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
                    price: rust_decimal::Decimal::ONE,
                })
                .collect())
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        entries: Mutex<Vec<String>>,
    }

    impl QuoteReportSink for RecordingSink {
        fn publish(&self, entry: &QuoteReportEntry<'_>) {
            self.entries
                .lock()
                .unwrap()
                .push(entry.submitted_by.to_string());
        }
    }

    fn registry() -> Arc<TokenRegistry> {
        Arc::new(TokenRegistry::new(1, "ETH", "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2", &[]).unwrap())
    }

    fn orchestrator(engine: Arc<StubEngine>, sink: Arc<RecordingSink>) -> QuoteOrchestrator {
        QuoteOrchestrator::new(engine, registry(), sink, vec![LiquiditySource::UniswapV2])
    }

    fn classify(request: &CanonicalSwapRequest) -> ClassifiedPair {
        WrapUnwrapDetector::new(weth()).classify(request.sell_token, request.buy_token)
    }

    #[tokio::test]
    async fn test_equal_tokens_rejected_for_ordinary_pair() {
        let engine = Arc::new(StubEngine::default());
        let orch = orchestrator(engine.clone(), Arc::default());
        let request = sell_request(weth(), weth(), 1);

        let err = orch.get_quote(&request, &classify(&request)).await.unwrap_err();
        let api_err = ErrorClassifier::classify(err, false);
        let fields: Vec<&str> = api_err
            .validation_items()
            .unwrap()
            .iter()
            .map(|i| i.field.as_str())
            .collect();
        assert_eq!(fields, vec!["buyToken", "sellToken"]);
        assert!(engine.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_wrap_bypasses_equal_token_check_and_engine() {
        let engine = Arc::new(StubEngine::default());
        let orch = orchestrator(engine.clone(), Arc::default());
        let request = sell_request(NATIVE_ASSET_ADDRESS, weth(), 1_000);
        let pair = classify(&request);
        assert_eq!(pair.sell_token, pair.buy_token);

        let response = orch.get_quote(&request, &pair).await.unwrap();
        assert_eq!(response.buy_amount, U256::from(1_000u64));
        assert_eq!(response.value, U256::from(1_000u64));
        assert_eq!(response.gas_price, U256::from(7u64));
        assert!(engine.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unwrap_buy_side_uses_buy_amount() {
        let orch = orchestrator(Arc::default(), Arc::default());
        let mut request = sell_request(weth(), NATIVE_ASSET_ADDRESS, 1);
        request.sell_amount = None;
        request.buy_amount = Some(U256::from(42u64));
        request.gas_price = Some(U256::from(3u64));

        let response = orch.get_quote(&request, &classify(&request)).await.unwrap();
        assert_eq!(response.sell_amount, U256::from(42u64));
        assert_eq!(response.gas_price, U256::from(3u64));
    }

    #[tokio::test]
    async fn test_missing_amounts_fail_before_engine() {
        let engine = Arc::new(StubEngine::default());
        let orch = orchestrator(engine.clone(), Arc::default());
        let mut request = sell_request(dai(), weth(), 1);
        request.sell_amount = None;

        let err = orch.get_quote(&request, &classify(&request)).await.unwrap_err();
        assert!(err.downcast_ref::<ApiError>().is_some());
        assert!(engine.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ordinary_quote_strips_report_and_adds_comparisons() {
        let engine = Arc::new(StubEngine::default());
        let orch = orchestrator(engine.clone(), Arc::default());
        let mut request = sell_request(NATIVE_ASSET_ADDRESS, dai(), 100);
        request.include_price_comparisons = true;

        let response = orch.get_quote(&request, &classify(&request)).await.unwrap();
        let calls = engine.calls.lock().unwrap();
        assert_eq!(calls[0].sell_token, weth());
        assert!(!calls[0].is_meta_transaction);

        let comparisons = response.price_comparisons.clone().unwrap();
        assert_eq!(comparisons[0].name, "0x");
        assert!(comparisons[0].price.is_some());
        assert_eq!(comparisons[1].name, "Uniswap_V2");
        assert!(comparisons[1].price.is_none());

        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("quoteReport").is_none());
    }

    #[tokio::test]
    async fn test_report_published_only_with_fill_intent() {
        let sink = Arc::new(RecordingSink::default());
        let orch = orchestrator(Arc::default(), sink.clone());
        let mut request = sell_request(dai(), weth(), 100);
        request.taker_address = Some(Address::repeat_byte(0xaa));
        request.api_key = Some("key".into());

        request.rfqt = Some(RfqtRequestOptions::firm(false, false));
        orch.get_quote(&request, &classify(&request)).await.unwrap();
        assert!(sink.entries.lock().unwrap().is_empty());

        request.rfqt = Some(RfqtRequestOptions::firm(true, false));
        orch.get_quote(&request, &classify(&request)).await.unwrap();
        assert_eq!(*sink.entries.lock().unwrap(), vec!["taker".to_string()]);

        // price 端点从不上报
        request.endpoint = QuoteEndpoint::Price;
        orch.get_quote(&request, &classify(&request)).await.unwrap();
        assert_eq!(sink.entries.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_engine_errors_are_classified() {
        let engine = Arc::new(StubEngine {
            fail_with: Some(EngineError::Upstream("INSUFFICIENT_ASSET_LIQUIDITY".into())),
            ..Default::default()
        });
        let orch = orchestrator(engine, Arc::default());
        let request = sell_request(dai(), weth(), 100);

        let err = orch.get_quote(&request, &classify(&request)).await.unwrap_err();
        let api_err = ErrorClassifier::classify(err, request.buy_amount.is_some());
        assert_eq!(api_err.validation_items().unwrap()[0].field, "sellAmount");
    }

    #[tokio::test]
    async fn test_token_prices_fill_symbols() {
        let orch = orchestrator(Arc::default(), Arc::default());
        let prices = orch
            .get_token_prices(&TokenPricesRequest {
                sell_token: weth(),
                sell_amount: U256::exp10(18),
                tokens: vec![dai()],
            })
            .await
            .unwrap();
        assert_eq!(prices[0].symbol, "DAI");
    }
}
