//! 基础设施
pub mod logging;
