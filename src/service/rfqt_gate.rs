//! RFQT 准入
//!
//! 两个互相独立的判定：
//! - 注册表接口访问（Bearer token + 密码集合）
//! - 单次报价的 RFQT 参与方式（indicative / firm）

use ethers::types::Address;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    config::AccessLists,
    domain::{QuoteEndpoint, RfqtRequestOptions},
    metrics::{Metrics, REGISTRY_AUTH_ABSENT_LABEL},
};

static BEARER_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Bearer\s(.{36})$").expect("static regex"));

/// 注册表访问结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryAccess {
    /// 返回 RFQT API key 白名单
    Granted(Vec<String>),
    Denied,
}

pub struct RfqtEligibilityGate<'a> {
    access: &'a AccessLists,
    metrics: &'a Metrics,
}

impl<'a> RfqtEligibilityGate<'a> {
    pub fn new(access: &'a AccessLists, metrics: &'a Metrics) -> Self {
        Self { access, metrics }
    }

    /// 校验注册表访问；每次尝试（无论成功与否）计数一次
    pub fn authorize_registry(&self, authorization: Option<&str>) -> RegistryAccess {
        self.metrics
            .inc_registry_access(authorization.unwrap_or(REGISTRY_AUTH_ABSENT_LABEL));

        let Some(header) = authorization else {
            tracing::debug!("rfq registry access without authorization header");
            return RegistryAccess::Denied;
        };
        let Some(token) = BEARER_TOKEN
            .captures(header)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
        else {
            tracing::debug!("rfq registry authorization header is malformed");
            return RegistryAccess::Denied;
        };
        if !self.access.is_registry_password(token) {
            tracing::debug!("rfq registry token is not whitelisted");
            return RegistryAccess::Denied;
        }

        RegistryAccess::Granted(self.access.rfqt_whitelist())
    }

    /// RFQT 参与方式：无 API key 时一律不参与
    pub fn participation(
        endpoint: QuoteEndpoint,
        api_key: Option<&str>,
        taker_address: Option<Address>,
        intent_on_filling: bool,
        native_exclusively_rfqt: bool,
    ) -> Option<RfqtRequestOptions> {
        api_key?;
        match endpoint {
            QuoteEndpoint::Quote if taker_address.is_some() => Some(RfqtRequestOptions::firm(
                intent_on_filling,
                native_exclusively_rfqt,
            )),
            QuoteEndpoint::Quote => None,
            QuoteEndpoint::Price => Some(RfqtRequestOptions::indicative(native_exclusively_rfqt)),
        }
    }
}
