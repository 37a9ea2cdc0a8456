//! 业务服务层
//!
//! 请求解析、来源过滤、RFQT 准入、报价编排与错误分类

pub mod error_classifier;
pub mod price_comparison;
pub mod quote_engine;
pub mod quote_orchestrator;
pub mod quote_report;
pub mod request_parser;
pub mod rfqt_gate;
pub mod source_filter;
pub mod weth;
pub mod wrap_unwrap;

pub use error_classifier::ErrorClassifier;
pub use quote_engine::{CalculateSwapQuoteParams, EngineError, HttpQuoteEngine, QuotingEngine};
pub use quote_orchestrator::QuoteOrchestrator;
pub use quote_report::{LogQuoteReportSink, QuoteReportEntry, QuoteReportSink};
pub use request_parser::{ParseDefaults, RawQuery, RequestParamParser};
pub use rfqt_gate::{RegistryAccess, RfqtEligibilityGate};
pub use source_filter::{SourceFilterRequest, SourceFilterResolver};
pub use wrap_unwrap::{ClassifiedPair, SwapKind, WrapUnwrapDetector};
