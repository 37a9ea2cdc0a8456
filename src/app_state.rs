use std::sync::Arc;

use anyhow::Context;

use crate::{
    config::{AccessLists, Config},
    domain::TokenRegistry,
    metrics::Metrics,
    service::{
        HttpQuoteEngine, LogQuoteReportSink, ParseDefaults, QuoteOrchestrator, QuoteReportSink,
        QuotingEngine, RequestParamParser,
    },
};

/// 应用状态
/// 启动时构建一次，之后所有字段只读
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub registry: Arc<TokenRegistry>,
    pub access: Arc<AccessLists>,
    pub metrics: Arc<Metrics>,
    pub orchestrator: Arc<QuoteOrchestrator>,
    pub parse_defaults: ParseDefaults,
}

impl AppState {
    /// 使用给定的报价引擎与报告输出构建状态（测试中注入桩实现）
    pub fn new(
        config: Arc<Config>,
        engine: Arc<dyn QuotingEngine>,
        report_sink: Arc<dyn QuoteReportSink>,
        metrics: Arc<Metrics>,
    ) -> anyhow::Result<Self> {
        let registry = Arc::new(
            TokenRegistry::new(
                config.chain.chain_id,
                &config.chain.native_symbol,
                &config.chain.wrapped_native_address,
                &config.chain.tokens,
            )
            .context("failed to build token registry")?,
        );
        let access = Arc::new(AccessLists::from(&config.access));
        let orchestrator = Arc::new(QuoteOrchestrator::new(
            engine,
            registry.clone(),
            report_sink,
            config.swap.price_comparison_sources.clone(),
        ));
        let parse_defaults = ParseDefaults {
            default_slippage: config.swap.default_slippage,
            ..ParseDefaults::default()
        };

        Ok(Self {
            config,
            registry,
            access,
            metrics,
            orchestrator,
            parse_defaults,
        })
    }

    /// 生产环境：HTTP 报价引擎 + 日志报告输出
    pub fn from_config(config: Arc<Config>) -> anyhow::Result<Self> {
        let metrics = Arc::new(Metrics::new());
        let engine = Arc::new(HttpQuoteEngine::new(&config.engine, metrics.clone())?);
        Self::new(config, engine, Arc::new(LogQuoteReportSink), metrics)
    }

    pub fn parser(&self) -> RequestParamParser<'_> {
        RequestParamParser::new(&self.registry, &self.access, &self.parse_defaults)
    }
}
