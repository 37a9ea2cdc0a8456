//! 流动性来源过滤
//!
//! 合并调用方的 include/exclude 列表与按 API key 推导出的隐式排除。
//! 排除集合只会被放宽（追加），不会被缩小。

use std::collections::BTreeSet;

use crate::{
    config::AccessLists,
    domain::{LiquiditySource, QuoteEndpoint, SourceFilters},
    error::{reasons, ApiError, ValidationErrorCode},
};

/// 调用方提交的过滤参数（已完成名称解析）
#[derive(Debug, Clone, Default)]
pub struct SourceFilterRequest<'a> {
    pub excluded: Vec<LiquiditySource>,
    pub included: Vec<LiquiditySource>,
    /// `includedSources=RFQT`：仅通过 RFQT 询价
    pub rfqt_exclusive: bool,
    pub api_key: Option<&'a str>,
    pub has_taker: bool,
}

pub struct SourceFilterResolver<'a> {
    access: &'a AccessLists,
}

impl<'a> SourceFilterResolver<'a> {
    pub fn new(access: &'a AccessLists) -> Self {
        Self { access }
    }

    pub fn resolve(
        &self,
        endpoint: QuoteEndpoint,
        request: &SourceFilterRequest<'_>,
    ) -> Result<SourceFilters, ApiError> {
        // includedSources（含 RFQT 关键字）与 excludedSources 互斥
        let has_inclusion = request.rfqt_exclusive || !request.included.is_empty();
        if has_inclusion && !request.excluded.is_empty() {
            return Err(ApiError::validation(
                "excludedSources",
                ValidationErrorCode::FieldInvalid,
                reasons::CONFLICTING_FILTERING_ARGUMENTS,
            ));
        }

        let mut filters = if request.rfqt_exclusive {
            self.rfqt_exclusive_filters(endpoint, request)?
        } else if !request.included.is_empty() {
            let included: BTreeSet<LiquiditySource> = request.included.iter().copied().collect();
            let excluded = LiquiditySource::ALL
                .iter()
                .copied()
                .filter(|s| !included.contains(s))
                .collect();
            SourceFilters {
                excluded,
                included,
                native_exclusively_rfqt: false,
            }
        } else {
            SourceFilters {
                excluded: request.excluded.iter().copied().collect(),
                included: BTreeSet::new(),
                native_exclusively_rfqt: false,
            }
        };

        // 特权来源：key 不在 PLP 白名单时强制排除，调用方无法重新包含
        if !self.access.is_plp_whitelisted(request.api_key) {
            for source in LiquiditySource::ALL.iter().filter(|s| s.is_privileged()) {
                filters.included.remove(source);
                filters.excluded.insert(*source);
            }
        }

        if filters.excluded.len() == LiquiditySource::ALL.len() {
            return Err(ApiError::validation(
                "excludedSources",
                ValidationErrorCode::FieldInvalid,
                reasons::ALL_SOURCES_EXCLUDED,
            ));
        }

        Ok(filters)
    }

    fn rfqt_exclusive_filters(
        &self,
        endpoint: QuoteEndpoint,
        request: &SourceFilterRequest<'_>,
    ) -> Result<SourceFilters, ApiError> {
        if !self.access.is_rfqt_whitelisted(request.api_key) {
            return Err(ApiError::validation(
                "0x-api-key",
                ValidationErrorCode::FieldInvalid,
                reasons::INVALID_API_KEY,
            ));
        }
        if endpoint == QuoteEndpoint::Quote && !request.has_taker {
            return Err(ApiError::validation(
                "takerAddress",
                ValidationErrorCode::RequiredField,
                reasons::TAKER_ADDRESS_REQUIRED,
            ));
        }

        let excluded: BTreeSet<LiquiditySource> = LiquiditySource::ALL
            .iter()
            .copied()
            .filter(|s| *s != LiquiditySource::Native)
            .collect();

        Ok(SourceFilters {
            excluded,
            included: BTreeSet::from([LiquiditySource::Native]),
            native_exclusively_rfqt: true,
        })
    }
}
