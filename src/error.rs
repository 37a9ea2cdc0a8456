//! 统一 API 错误类型
//!
//! 对外只暴露三类错误：ValidationError（可由客户端修正）、RevertError（链上模拟回滚）、
//! InternalError（未分类失败）。HTTP 映射在 `IntoResponse` 中完成。

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Serialize, Serializer};
use thiserror::Error;

/// 通用错误码（响应体顶层 `code`）
pub const GENERAL_VALIDATION_ERROR: u32 = 100;
pub const GENERAL_TRANSACTION_INVALID: u32 = 105;
pub const GENERAL_INTERNAL_ERROR: u32 = 500;

/// 字段级错误码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ValidationErrorCode {
    RequiredField = 1000,
    IncorrectFormat = 1001,
    InvalidAddress = 1002,
    AddressNotSupported = 1003,
    ValueOutOfRange = 1004,
    UnsupportedOption = 1006,
    FieldInvalid = 1010,
}

impl Serialize for ValidationErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(*self as u32)
    }
}

/// 字段级错误原因
pub mod reasons {
    pub const PERCENTAGE_OUT_OF_RANGE: &str = "MUST_BE_LESS_THAN_OR_EQUAL_TO_ONE";
    pub const ARGUMENT_NOT_YET_SUPPORTED: &str = "ARGUMENT_NOT_YET_SUPPORTED";
    pub const INSUFFICIENT_ASSET_LIQUIDITY: &str = "INSUFFICIENT_ASSET_LIQUIDITY";
    pub const CONFLICTING_FILTERING_ARGUMENTS: &str = "CONFLICTING_FILTERING_ARGUMENTS";
    pub const INVALID_API_KEY: &str = "INVALID_API_KEY";
    pub const TOKENS_MUST_DIFFER: &str = "buyToken and sellToken must be different";
    pub const ALL_SOURCES_EXCLUDED: &str = "Request excluded all sources";
    pub const INVALID_ADDRESS: &str = "must be a valid Ethereum address";
    pub const WHOLE_NUMBER_REQUIRED: &str = "must be a whole number in base units";
    pub const NUMBER_REQUIRED: &str = "must be a number";
    pub const DECIMALS_OUT_OF_RANGE: &str = "token decimals out of range";
    pub const TAKER_ADDRESS_REQUIRED: &str = "TAKER_ADDRESS_REQUIRED";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationErrorItem {
    pub field: String,
    pub code: ValidationErrorCode,
    pub reason: String,
}

impl ValidationErrorItem {
    pub fn new(field: impl Into<String>, code: ValidationErrorCode, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            code,
            reason: reason.into(),
        }
    }
}

/// 上游回滚信息（原样转发）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevertPayload {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("validation failed: {}", describe_items(.0))]
    Validation(Vec<ValidationErrorItem>),

    #[error("transaction reverted: {}", .0.message)]
    Revert(RevertPayload),

    #[error("{0}")]
    Internal(String),

    /// 仅用于 RFQ 注册表入口，响应无 body
    #[error("unauthorized")]
    Unauthorized,
}

fn describe_items(items: &[ValidationErrorItem]) -> String {
    items
        .iter()
        .map(|item| format!("{} ({})", item.field, item.reason))
        .collect::<Vec<_>>()
        .join(", ")
}

impl ApiError {
    /// 单字段校验错误
    pub fn validation(
        field: impl Into<String>,
        code: ValidationErrorCode,
        reason: impl Into<String>,
    ) -> Self {
        Self::Validation(vec![ValidationErrorItem::new(field, code, reason)])
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn validation_items(&self) -> Option<&[ValidationErrorItem]> {
        match self {
            ApiError::Validation(items) => Some(items),
            _ => None,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Revert(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ValidationErrorBody<'a> {
    code: u32,
    reason: &'a str,
    validation_errors: &'a [ValidationErrorItem],
}

#[derive(Serialize)]
struct RevertErrorBody<'a> {
    code: u32,
    reason: &'a str,
    values: &'a RevertPayload,
}

#[derive(Serialize)]
struct InternalErrorBody<'a> {
    code: u32,
    reason: &'a str,
    message: &'a str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::Validation(items) => (
                status,
                Json(ValidationErrorBody {
                    code: GENERAL_VALIDATION_ERROR,
                    reason: "Validation Failed",
                    validation_errors: items,
                }),
            )
                .into_response(),
            ApiError::Revert(payload) => (
                status,
                Json(RevertErrorBody {
                    code: GENERAL_TRANSACTION_INVALID,
                    reason: "Transaction Invalid",
                    values: payload,
                }),
            )
                .into_response(),
            ApiError::Internal(message) => (
                status,
                Json(InternalErrorBody {
                    code: GENERAL_INTERNAL_ERROR,
                    reason: "Internal Server Error",
                    message,
                }),
            )
                .into_response(),
            ApiError::Unauthorized => status.into_response(),
        }
    }
}
