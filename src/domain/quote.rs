//! 报价结果模型
//!
//! `SwapQuote` 为引擎返回的内部结果（含溯源报告）；对外只返回 `SwapQuoteResponse` / `SwapPriceResponse`

use ethers::types::{Address, Bytes, U256};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 单个流动性来源在成交路径中的占比
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceBreakdown {
    pub name: String,
    pub proportion: Decimal,
}

/// 成交路径中的订单摘要
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub source: String,
    pub maker_address: Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maker_uri: Option<String>,
    #[serde(with = "crate::utils::serde_u256")]
    pub maker_amount: U256,
    #[serde(with = "crate::utils::serde_u256")]
    pub taker_amount: U256,
}

/// 溯源报告中的单条来源记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteReportSource {
    pub liquidity_source: String,
    /// 买入方向得到的数量
    #[serde(with = "crate::utils::serde_u256")]
    pub maker_amount: U256,
    /// 卖出方向付出的数量
    #[serde(with = "crate::utils::serde_u256")]
    pub taker_amount: U256,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maker_uri: Option<String>,
    #[serde(default)]
    pub is_rfqt: bool,
}

/// 报价溯源报告（仅内部使用）
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteReport {
    #[serde(default)]
    pub sources_considered: Vec<QuoteReportSource>,
    #[serde(default)]
    pub sources_delivered: Vec<QuoteReportSource>,
}

/// 引擎返回的完整报价
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapQuote {
    pub price: Decimal,
    pub guaranteed_price: Decimal,
    pub to: Address,
    pub data: Bytes,
    #[serde(with = "crate::utils::serde_u256")]
    pub value: U256,
    #[serde(with = "crate::utils::serde_u256")]
    pub gas: U256,
    #[serde(with = "crate::utils::serde_u256")]
    pub estimated_gas: U256,
    #[serde(with = "crate::utils::serde_u256")]
    pub gas_price: U256,
    #[serde(with = "crate::utils::serde_u256")]
    pub protocol_fee: U256,
    #[serde(with = "crate::utils::serde_u256")]
    pub minimum_protocol_fee: U256,
    pub buy_token_address: Address,
    pub sell_token_address: Address,
    #[serde(with = "crate::utils::serde_u256")]
    pub buy_amount: U256,
    #[serde(with = "crate::utils::serde_u256")]
    pub sell_amount: U256,
    #[serde(default)]
    pub sources: Vec<SourceBreakdown>,
    #[serde(default)]
    pub orders: Vec<OrderSummary>,
    pub allowance_target: Address,
    #[serde(default)]
    pub quote_report: Option<QuoteReport>,
    #[serde(default)]
    pub decoded_unique_id: Option<String>,
}

/// 价格比较记录
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceComparison {
    pub name: String,
    pub price: Option<Decimal>,
    #[serde(with = "crate::utils::serde_u256::option")]
    pub sell_amount: Option<U256>,
    #[serde(with = "crate::utils::serde_u256::option")]
    pub buy_amount: Option<U256>,
}

/// quote 端点响应：去掉溯源报告和内部 ID
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapQuoteResponse {
    pub price: Decimal,
    pub guaranteed_price: Decimal,
    pub to: Address,
    pub data: Bytes,
    #[serde(with = "crate::utils::serde_u256")]
    pub value: U256,
    #[serde(with = "crate::utils::serde_u256")]
    pub gas: U256,
    #[serde(with = "crate::utils::serde_u256")]
    pub estimated_gas: U256,
    #[serde(with = "crate::utils::serde_u256")]
    pub gas_price: U256,
    #[serde(with = "crate::utils::serde_u256")]
    pub protocol_fee: U256,
    #[serde(with = "crate::utils::serde_u256")]
    pub minimum_protocol_fee: U256,
    pub buy_token_address: Address,
    pub sell_token_address: Address,
    #[serde(with = "crate::utils::serde_u256")]
    pub buy_amount: U256,
    #[serde(with = "crate::utils::serde_u256")]
    pub sell_amount: U256,
    pub sources: Vec<SourceBreakdown>,
    pub orders: Vec<OrderSummary>,
    pub allowance_target: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_comparisons: Option<Vec<PriceComparison>>,
}

impl SwapQuote {
    /// 拆分为对外响应和内部溯源报告
    pub fn into_response_parts(self) -> (SwapQuoteResponse, Option<QuoteReport>) {
        let response = SwapQuoteResponse {
            price: self.price,
            guaranteed_price: self.guaranteed_price,
            to: self.to,
            data: self.data,
            value: self.value,
            gas: self.gas,
            estimated_gas: self.estimated_gas,
            gas_price: self.gas_price,
            protocol_fee: self.protocol_fee,
            minimum_protocol_fee: self.minimum_protocol_fee,
            buy_token_address: self.buy_token_address,
            sell_token_address: self.sell_token_address,
            buy_amount: self.buy_amount,
            sell_amount: self.sell_amount,
            sources: self.sources,
            orders: self.orders,
            allowance_target: self.allowance_target,
            price_comparisons: None,
        };
        (response, self.quote_report)
    }
}

/// price 端点响应：不含可执行的交易字段
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapPriceResponse {
    pub price: Decimal,
    #[serde(with = "crate::utils::serde_u256")]
    pub value: U256,
    #[serde(with = "crate::utils::serde_u256")]
    pub gas_price: U256,
    #[serde(with = "crate::utils::serde_u256")]
    pub gas: U256,
    #[serde(with = "crate::utils::serde_u256")]
    pub estimated_gas: U256,
    #[serde(with = "crate::utils::serde_u256")]
    pub protocol_fee: U256,
    #[serde(with = "crate::utils::serde_u256")]
    pub minimum_protocol_fee: U256,
    pub buy_token_address: Address,
    #[serde(with = "crate::utils::serde_u256")]
    pub buy_amount: U256,
    pub sell_token_address: Address,
    #[serde(with = "crate::utils::serde_u256")]
    pub sell_amount: U256,
    pub sources: Vec<SourceBreakdown>,
    pub allowance_target: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_comparisons: Option<Vec<PriceComparison>>,
}

impl From<SwapQuoteResponse> for SwapPriceResponse {
    fn from(quote: SwapQuoteResponse) -> Self {
        Self {
            price: quote.price,
            value: quote.value,
            gas_price: quote.gas_price,
            gas: quote.gas,
            estimated_gas: quote.estimated_gas,
            protocol_fee: quote.protocol_fee,
            minimum_protocol_fee: quote.minimum_protocol_fee,
            buy_token_address: quote.buy_token_address,
            buy_amount: quote.buy_amount,
            sell_token_address: quote.sell_token_address,
            sell_amount: quote.sell_amount,
            sources: quote.sources,
            allowance_target: quote.allowance_target,
            price_comparisons: quote.price_comparisons,
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn quote(sell_token: Address, buy_token: Address, sell: u64, buy: u64) -> SwapQuote {
        SwapQuote {
            price: Decimal::ONE,
            guaranteed_price: Decimal::ONE,
            to: Address::repeat_byte(0x11),
            data: Bytes::from(vec![0xd9, 0x62, 0x7a, 0xa4]),
            value: U256::zero(),
            gas: U256::from(150_000u64),
            estimated_gas: U256::from(150_000u64),
            gas_price: U256::from(50_000_000_000u64),
            protocol_fee: U256::zero(),
            minimum_protocol_fee: U256::zero(),
            buy_token_address: buy_token,
            sell_token_address: sell_token,
            buy_amount: U256::from(buy),
            sell_amount: U256::from(sell),
            sources: vec![SourceBreakdown {
                name: "Uniswap_V2".into(),
                proportion: Decimal::ONE,
            }],
            orders: Vec::new(),
            allowance_target: Address::repeat_byte(0x22),
            quote_report: Some(QuoteReport::default()),
            decoded_unique_id: Some("a1b2c3-1600000000".into()),
        }
    }
}
