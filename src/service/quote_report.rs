//! 报价溯源报告上报

use ethers::types::{Address, U256};
use serde::Serialize;

use crate::domain::QuoteReport;

/// 由 taker 发起的可成交报价
pub const SUBMISSION_ROLE_TAKER: &str = "taker";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteReportEntry<'a> {
    pub submitted_by: &'static str,
    pub taker: Option<Address>,
    pub decoded_unique_id: Option<&'a str>,
    pub sell_token: Address,
    pub buy_token: Address,
    #[serde(with = "crate::utils::serde_u256")]
    pub sell_amount: U256,
    #[serde(with = "crate::utils::serde_u256")]
    pub buy_amount: U256,
    pub report: &'a QuoteReport,
    pub reported_at: chrono::DateTime<chrono::Utc>,
}

pub trait QuoteReportSink: Send + Sync {
    fn publish(&self, entry: &QuoteReportEntry<'_>);
}

/// 以结构化日志输出报告（target = "quote_report"）
#[derive(Debug, Default)]
pub struct LogQuoteReportSink;

impl QuoteReportSink for LogQuoteReportSink {
    fn publish(&self, entry: &QuoteReportEntry<'_>) {
        match serde_json::to_string(entry) {
            Ok(json) => tracing::info!(
                target: "quote_report",
                submitted_by = entry.submitted_by,
                decoded_unique_id = entry.decoded_unique_id.unwrap_or_default(),
                report = %json,
                "quote report"
            ),
            Err(e) => tracing::warn!(target: "quote_report", error = %e, "failed to serialize quote report"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_serializes_role() {
        let report = QuoteReport::default();
        let entry = QuoteReportEntry {
            submitted_by: SUBMISSION_ROLE_TAKER,
            taker: None,
            decoded_unique_id: Some("abc"),
            sell_token: Address::zero(),
            buy_token: Address::zero(),
            sell_amount: U256::from(1u64),
            buy_amount: U256::from(2u64),
            report: &report,
            reported_at: chrono::Utc::now(),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["submittedBy"], "taker");
        assert_eq!(json["buyAmount"], "2");

        // 日志输出不 panic
        LogQuoteReportSink.publish(&entry);
    }
}
