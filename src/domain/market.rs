//! 市场深度与代币价格

use ethers::types::{Address, U256};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::LiquiditySource;

/// 市场深度请求
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketDepthRequest {
    pub sell_token: Address,
    pub buy_token: Address,
    #[serde(with = "crate::utils::serde_u256")]
    pub sell_amount: U256,
    pub num_samples: u32,
    pub sample_distribution_base: Decimal,
    pub excluded_sources: Vec<LiquiditySource>,
}

/// 深度曲线上的一个采样点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepthSample {
    pub price: Decimal,
    pub bucket: u32,
    pub bucket_total: Decimal,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketDepth {
    #[serde(default)]
    pub depth_sell: Vec<DepthSample>,
    #[serde(default)]
    pub depth_buy: Vec<DepthSample>,
}

/// 代币价格请求：以 `sell_token` 计价
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPricesRequest {
    pub sell_token: Address,
    #[serde(with = "crate::utils::serde_u256")]
    pub sell_amount: U256,
    pub tokens: Vec<Address>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenPrice {
    #[serde(default)]
    pub symbol: String,
    pub address: Address,
    pub price: Decimal,
}
