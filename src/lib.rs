//! swapgate - 兑换报价网关
//!
//! 把原始查询参数转换为规范化的报价请求，转发给报价引擎，并把失败归类为对外错误

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod metrics;
pub mod service;
pub mod utils;

// 重新导出常用类型
pub use app_state::AppState;
pub use error::ApiError;

pub mod prelude {
    pub use crate::{
        app_state::AppState,
        config::{AccessLists, Config},
        domain::{CanonicalSwapRequest, QuoteEndpoint, TokenRegistry},
        error::ApiError,
    };
}
