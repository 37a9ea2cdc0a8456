//! 规范化的报价请求
//!
//! 由 `RequestParamParser` 每个请求创建一次，之后只读

use std::collections::BTreeSet;

use ethers::types::{Address, U256};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::{
    domain::LiquiditySource,
    error::{ApiError, ValidationErrorCode},
};

/// 空地址（未指定手续费接收方时使用）
pub const NULL_ADDRESS: Address = Address::zero();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteEndpoint {
    Price,
    Quote,
}

impl QuoteEndpoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuoteEndpoint::Price => "price",
            QuoteEndpoint::Quote => "quote",
        }
    }
}

/// 市场方向：由请求中填写了 sellAmount 还是 buyAmount 决定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketSide {
    Sell,
    Buy,
}

/// 集成方手续费
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AffiliateFee {
    pub recipient: Address,
    pub sell_token_percentage_fee: Decimal,
    pub buy_token_percentage_fee: Decimal,
}

impl AffiliateFee {
    pub fn none() -> Self {
        Self {
            recipient: NULL_ADDRESS,
            sell_token_percentage_fee: Decimal::ZERO,
            buy_token_percentage_fee: Decimal::ZERO,
        }
    }
}

impl Default for AffiliateFee {
    fn default() -> Self {
        Self::none()
    }
}

/// RFQT 参与方式；`None` 表示不参与
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RfqtRequestOptions {
    pub intent_on_filling: bool,
    pub is_indicative: bool,
    pub native_exclusively_rfqt: bool,
}

impl RfqtRequestOptions {
    /// 仅询价，永不可成交
    pub fn indicative(native_exclusively_rfqt: bool) -> Self {
        Self {
            intent_on_filling: false,
            is_indicative: true,
            native_exclusively_rfqt,
        }
    }

    /// 可成交报价
    pub fn firm(intent_on_filling: bool, native_exclusively_rfqt: bool) -> Self {
        Self {
            intent_on_filling,
            is_indicative: false,
            native_exclusively_rfqt,
        }
    }
}

/// 流动性来源过滤结果，excluded 与 included 不相交
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceFilters {
    pub excluded: BTreeSet<LiquiditySource>,
    pub included: BTreeSet<LiquiditySource>,
    pub native_exclusively_rfqt: bool,
}

impl SourceFilters {
    pub fn excluded_names(&self) -> Vec<&'static str> {
        self.excluded.iter().map(|s| s.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalSwapRequest {
    pub endpoint: QuoteEndpoint,
    pub taker_address: Option<Address>,
    /// 原生资产使用哨兵地址表示，包装替换由 WrapUnwrapDetector 完成
    pub sell_token: Address,
    pub buy_token: Address,
    pub sell_amount: Option<U256>,
    pub buy_amount: Option<U256>,
    pub slippage_percentage: Decimal,
    pub gas_price: Option<U256>,
    pub source_filters: SourceFilters,
    pub affiliate_fee: AffiliateFee,
    pub affiliate_address: Option<Address>,
    pub rfqt: Option<RfqtRequestOptions>,
    pub api_key: Option<String>,
    pub skip_validation: bool,
    pub include_price_comparisons: bool,
    pub should_sell_entire_balance: bool,
}

impl CanonicalSwapRequest {
    /// 报价计算前必须恰好填写 sellAmount / buyAmount 之一
    pub fn market_side(&self) -> Result<MarketSide, ApiError> {
        match (self.sell_amount, self.buy_amount) {
            (Some(_), None) => Ok(MarketSide::Sell),
            (None, Some(_)) => Ok(MarketSide::Buy),
            (Some(_), Some(_)) => Err(ApiError::validation(
                "buyAmount",
                ValidationErrorCode::FieldInvalid,
                "sellAmount and buyAmount are mutually exclusive",
            )),
            (None, None) => Err(ApiError::Validation(
                ["sellAmount", "buyAmount"]
                    .into_iter()
                    .map(|field| {
                        crate::error::ValidationErrorItem::new(
                            field,
                            ValidationErrorCode::RequiredField,
                            "one of sellAmount or buyAmount is required",
                        )
                    })
                    .collect(),
            )),
        }
    }
}
