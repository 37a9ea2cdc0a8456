//! 价格比较
//!
//! 从溯源报告中取参考来源在同一市场方向上的最优报价，与本次报价对照

use ethers::types::U256;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::domain::{LiquiditySource, MarketSide, PriceComparison, QuoteReport, QuoteReportSource};

#[derive(Debug, Clone, Copy)]
pub struct TokenDecimals {
    pub sell: u8,
    pub buy: u8,
}

/// 整数 base units 转为带小数的数量；超出 Decimal 精度时返回 None
fn to_units(amount: U256, decimals: u8) -> Option<Decimal> {
    let mut value = Decimal::from_str(&amount.to_string()).ok()?;
    value.set_scale(decimals as u32).ok()?;
    Some(value)
}

/// 卖出方向：价格 = 买入数量 / 卖出数量；买入方向取倒数
fn price_of(entry: &QuoteReportSource, side: MarketSide, decimals: TokenDecimals) -> Option<Decimal> {
    let sold = to_units(entry.taker_amount, decimals.sell)?;
    let bought = to_units(entry.maker_amount, decimals.buy)?;
    let price = match side {
        MarketSide::Sell => bought.checked_div(sold)?,
        MarketSide::Buy => sold.checked_div(bought)?,
    };
    Some(price.normalize())
}

fn best_entry<'r>(
    report: &'r QuoteReport,
    name: &str,
    side: MarketSide,
) -> Option<&'r QuoteReportSource> {
    let candidates = report
        .sources_considered
        .iter()
        .filter(|e| e.liquidity_source == name && !e.taker_amount.is_zero() && !e.maker_amount.is_zero());
    match side {
        // 付出同样多，得到最多
        MarketSide::Sell => candidates.max_by_key(|e| e.maker_amount),
        // 得到同样多，付出最少
        MarketSide::Buy => candidates.min_by_key(|e| e.taker_amount),
    }
}

/// 为每个参考来源（以及 Native）生成比较记录；来源名称对外使用 `external_name`
pub fn compute_price_comparisons(
    report: &QuoteReport,
    side: MarketSide,
    decimals: TokenDecimals,
    reference_sources: &[LiquiditySource],
) -> Vec<PriceComparison> {
    let mut sources = vec![LiquiditySource::Native];
    sources.extend(
        reference_sources
            .iter()
            .copied()
            .filter(|s| *s != LiquiditySource::Native),
    );

    sources
        .into_iter()
        .map(|source| match best_entry(report, source.as_str(), side) {
            Some(entry) => PriceComparison {
                name: source.external_name().to_string(),
                price: price_of(entry, side, decimals),
                sell_amount: Some(entry.taker_amount),
                buy_amount: Some(entry.maker_amount),
            },
            None => PriceComparison {
                name: source.external_name().to_string(),
                price: None,
                sell_amount: None,
                buy_amount: None,
            },
        })
        .collect()
}
