//! Domain 模块
//!
//! 请求/报价领域模型与链上代币表

pub mod liquidity_source;
pub mod market;
pub mod quote;
pub mod swap_request;
pub mod token_registry;

// 重新导出常用类型
pub use liquidity_source::{LiquiditySource, UnknownLiquiditySource};
pub use market::{DepthSample, MarketDepth, MarketDepthRequest, TokenPrice, TokenPricesRequest};
pub use quote::{
    OrderSummary, PriceComparison, QuoteReport, QuoteReportSource, SourceBreakdown,
    SwapPriceResponse, SwapQuote, SwapQuoteResponse,
};
pub use swap_request::{
    AffiliateFee, CanonicalSwapRequest, MarketSide, QuoteEndpoint, RfqtRequestOptions,
    SourceFilters, NULL_ADDRESS,
};
pub use token_registry::{
    TokenEntry, TokenInfo, TokenRegistry, MAX_TOKEN_DECIMALS, NATIVE_ASSET_ADDRESS,
};
