//! 报价失败分类
//!
//! 把编排过程中的任意失败转换为对外的三类错误之一

use crate::{
    error::{reasons, ApiError, RevertPayload, ValidationErrorCode},
    service::quote_engine::EngineError,
};

/// 引擎错误消息前缀
pub const INSUFFICIENT_ASSET_LIQUIDITY_MARKER: &str = "INSUFFICIENT_ASSET_LIQUIDITY";
pub const NO_OPTIMAL_PATH_MARKER: &str = "NO_OPTIMAL_PATH";
pub const ASSET_UNAVAILABLE_MARKER: &str = "ASSET_UNAVAILABLE";

pub struct ErrorClassifier;

impl ErrorClassifier {
    /// `buy_amount_supplied` 决定流动性不足时指向的字段
    pub fn classify(err: anyhow::Error, buy_amount_supplied: bool) -> ApiError {
        // 1. 已分类错误原样返回
        if let Some(api_err) = err.downcast_ref::<ApiError>() {
            return api_err.clone();
        }

        // 2. 链上回滚
        if let Some(EngineError::Revert { message, data }) = err.downcast_ref::<EngineError>() {
            return ApiError::Revert(RevertPayload {
                message: message.clone(),
                data: data.clone(),
            });
        }

        let message = err.to_string();

        // 3. 流动性不足 / 无可用路径
        if message.starts_with(INSUFFICIENT_ASSET_LIQUIDITY_MARKER)
            || message.starts_with(NO_OPTIMAL_PATH_MARKER)
        {
            let field = if buy_amount_supplied {
                "buyAmount"
            } else {
                "sellAmount"
            };
            return ApiError::validation(
                field,
                ValidationErrorCode::ValueOutOfRange,
                reasons::INSUFFICIENT_ASSET_LIQUIDITY,
            );
        }

        // 4. 资产不可用
        if message.starts_with(ASSET_UNAVAILABLE_MARKER) {
            return ApiError::validation("token", ValidationErrorCode::ValueOutOfRange, message);
        }

        // 5. 未分类
        tracing::info!(error = %message, trace = ?err, "uncaught quote error");
        ApiError::internal(message)
    }
}
