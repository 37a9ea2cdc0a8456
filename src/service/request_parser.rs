//! 请求参数解析
//!
//! 把未类型化的 query 参数转换为 `CanonicalSwapRequest`。各步骤按顺序执行，
//! 任一步失败立即返回；同一步内的多个字段错误一并返回。

use std::{collections::HashMap, str::FromStr};

use ethers::types::{Address, U256};
use rust_decimal::Decimal;

use crate::{
    config::AccessLists,
    domain::{
        AffiliateFee, CanonicalSwapRequest, LiquiditySource, MarketDepthRequest, QuoteEndpoint,
        TokenPricesRequest, TokenRegistry,
    },
    error::{reasons, ApiError, ValidationErrorCode, ValidationErrorItem},
    service::{
        rfqt_gate::RfqtEligibilityGate,
        source_filter::{SourceFilterRequest, SourceFilterResolver},
        wrap_unwrap::WrapUnwrapDetector,
    },
    utils::{address_validator::AddressValidator, serde_u256::parse_u256},
};

/// 原始 query 参数
pub type RawQuery = HashMap<String, String>;

/// `includedSources` 中表示“仅 RFQT”的关键字
pub const RFQT_SOURCE_KEYWORD: &str = "RFQT";

const ADDRESS_PARAMS: [&str; 3] = ["takerAddress", "feeRecipient", "affiliateAddress"];
const DEFAULT_DEPTH_SAMPLES: u32 = 40;
const MAX_DEPTH_SAMPLES: u32 = 100;

/// 解析默认值（显式的回退策略，而不是隐式控制流）
#[derive(Debug, Clone)]
pub struct ParseDefaults {
    /// 滑点缺失、无法解析或非正数时使用
    pub default_slippage: Decimal,
    pub depth_sample_distribution_base: Decimal,
}

impl Default for ParseDefaults {
    fn default() -> Self {
        Self {
            default_slippage: Decimal::new(1, 2),
            depth_sample_distribution_base: Decimal::new(105, 2),
        }
    }
}

/// 已拆分的来源列表
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct SourceLists {
    excluded: Vec<LiquiditySource>,
    included: Vec<LiquiditySource>,
    rfqt_exclusive: bool,
}

pub struct RequestParamParser<'a> {
    registry: &'a TokenRegistry,
    access: &'a AccessLists,
    defaults: &'a ParseDefaults,
}

impl<'a> RequestParamParser<'a> {
    pub fn new(
        registry: &'a TokenRegistry,
        access: &'a AccessLists,
        defaults: &'a ParseDefaults,
    ) -> Self {
        Self {
            registry,
            access,
            defaults,
        }
    }

    /// price / quote 请求解析
    pub fn parse(
        &self,
        endpoint: QuoteEndpoint,
        query: &RawQuery,
        api_key: Option<&str>,
    ) -> Result<CanonicalSwapRequest, ApiError> {
        // 1. 结构校验
        let sources = check_schema(query)?;
        let (sell_token, buy_token) = self.resolve_pair(query)?;

        // 2. 数量
        let sell_amount = parse_amount(query, "sellAmount")?;
        let buy_amount = parse_amount(query, "buyAmount")?;
        let gas_price = parse_amount(query, "gasPrice")?;

        // 3. 滑点
        let slippage_percentage =
            parse_slippage(non_empty(query, "slippagePercentage"), self.defaults.default_slippage)?;

        // 4. 集成方手续费
        let affiliate_fee = parse_affiliate_fee(query)?;

        // 5. 来源过滤与 RFQT 参与方式
        let taker_address = optional_address(query, "takerAddress");
        let source_filters = SourceFilterResolver::new(self.access).resolve(
            endpoint,
            &SourceFilterRequest {
                excluded: sources.excluded,
                included: sources.included,
                rfqt_exclusive: sources.rfqt_exclusive,
                api_key,
                has_taker: taker_address.is_some(),
            },
        )?;
        let rfqt = RfqtEligibilityGate::participation(
            endpoint,
            api_key,
            taker_address,
            flag(query, "intentOnFilling"),
            source_filters.native_exclusively_rfqt,
        );

        // 6. 组装
        tracing::info!(
            endpoint = endpoint.as_str(),
            excluded_sources = ?source_filters.excluded_names(),
            native_exclusively_rfqt = source_filters.native_exclusively_rfqt,
            rfqt_eligible = rfqt.is_some(),
            api_key_present = api_key.is_some(),
            "parsed swap request"
        );

        Ok(CanonicalSwapRequest {
            endpoint,
            taker_address,
            sell_token,
            buy_token,
            sell_amount,
            buy_amount,
            slippage_percentage,
            gas_price,
            source_filters,
            affiliate_fee,
            affiliate_address: optional_address(query, "affiliateAddress"),
            rfqt,
            api_key: api_key.map(String::from),
            skip_validation: flag(query, "skipValidation"),
            include_price_comparisons: flag(query, "includePriceComparisons"),
            should_sell_entire_balance: flag(query, "shouldSellEntireBalance"),
        })
    }

    /// 市场深度请求解析
    pub fn parse_market_depth(&self, query: &RawQuery) -> Result<MarketDepthRequest, ApiError> {
        let mut items = Vec::new();
        for field in ["sellToken", "buyToken", "sellAmount"] {
            if non_empty(query, field).is_none() {
                items.push(required(field));
            }
        }
        let excluded = match non_empty(query, "excludedSources").map(|raw| parse_source_list(raw, false)) {
            Some(Ok(lists)) => lists.excluded,
            Some(Err(item)) => {
                items.push(item);
                Vec::new()
            }
            None => Vec::new(),
        };
        if !items.is_empty() {
            return Err(ApiError::Validation(items));
        }

        let (sell_token, buy_token) = self.resolve_pair(query)?;
        let pair = WrapUnwrapDetector::from_registry(self.registry).classify(sell_token, buy_token);
        if pair.sell_token == pair.buy_token {
            return Err(tokens_must_differ());
        }

        let sell_amount = parse_amount(query, "sellAmount")?.unwrap_or_default();
        let num_samples = match non_empty(query, "numSamples") {
            None => DEFAULT_DEPTH_SAMPLES,
            Some(raw) => match raw.parse::<u32>() {
                Ok(n) if (1..=MAX_DEPTH_SAMPLES).contains(&n) => n,
                _ => {
                    return Err(ApiError::validation(
                        "numSamples",
                        ValidationErrorCode::ValueOutOfRange,
                        format!("must be between 1 and {}", MAX_DEPTH_SAMPLES),
                    ))
                }
            },
        };
        let sample_distribution_base = match non_empty(query, "sampleDistributionBase") {
            None => self.defaults.depth_sample_distribution_base,
            Some(raw) => match parse_decimal(raw) {
                Some(base) if base >= Decimal::ONE => base,
                _ => {
                    return Err(ApiError::validation(
                        "sampleDistributionBase",
                        ValidationErrorCode::ValueOutOfRange,
                        "must be a number greater than or equal to 1",
                    ))
                }
            },
        };

        Ok(MarketDepthRequest {
            sell_token: pair.sell_token,
            buy_token: pair.buy_token,
            sell_amount,
            num_samples,
            sample_distribution_base,
            excluded_sources: excluded,
        })
    }

    /// 代币价格请求：以 sellToken（默认包装原生代币）的一个整单位计价
    pub fn parse_token_prices(&self, query: &RawQuery) -> Result<TokenPricesRequest, ApiError> {
        let sell_token = match non_empty(query, "sellToken") {
            None => self.registry.wrapped_native(),
            Some(raw) => {
                let resolved = self.resolve_token("sellToken", raw)?;
                WrapUnwrapDetector::from_registry(self.registry)
                    .classify(resolved, resolved)
                    .sell_token
            }
        };
        let decimals = self.registry.decimals(sell_token).unwrap_or(18);
        let sell_amount = U256::from(10u64)
            .checked_pow(U256::from(decimals))
            .ok_or_else(|| {
                ApiError::validation(
                    "sellToken",
                    ValidationErrorCode::ValueOutOfRange,
                    reasons::DECIMALS_OUT_OF_RANGE,
                )
            })?;
        let tokens = self
            .registry
            .tokens()
            .into_iter()
            .map(|t| t.address)
            .filter(|address| *address != sell_token)
            .collect();

        Ok(TokenPricesRequest {
            sell_token,
            sell_amount,
            tokens,
        })
    }

    fn resolve_pair(&self, query: &RawQuery) -> Result<(Address, Address), ApiError> {
        let mut items = Vec::new();
        let mut resolved = [Address::zero(); 2];
        for (slot, field) in ["sellToken", "buyToken"].into_iter().enumerate() {
            let raw = non_empty(query, field).unwrap_or_default();
            match self.resolve_token(field, raw) {
                Ok(address) => resolved[slot] = address,
                Err(ApiError::Validation(mut errs)) => items.append(&mut errs),
                Err(other) => return Err(other),
            }
        }
        if !items.is_empty() {
            return Err(ApiError::Validation(items));
        }
        Ok((resolved[0], resolved[1]))
    }

    fn resolve_token(&self, field: &str, raw: &str) -> Result<Address, ApiError> {
        self.registry.resolve(raw).ok_or_else(|| {
            ApiError::validation(
                field,
                ValidationErrorCode::AddressNotSupported,
                format!("Could not find token `{}`", raw),
            )
        })
    }
}

/// 结构校验：必填字段、互斥数量、地址格式、来源名称
fn check_schema(query: &RawQuery) -> Result<SourceLists, ApiError> {
    let mut items = Vec::new();

    for field in ["sellToken", "buyToken"] {
        match non_empty(query, field) {
            None => items.push(required(field)),
            Some(raw) if raw.starts_with("0x") && !AddressValidator::is_valid_evm_address(raw) => {
                items.push(invalid_address(field))
            }
            Some(_) => {}
        }
    }

    if query.contains_key("sellAmount") && query.contains_key("buyAmount") {
        items.push(ValidationErrorItem::new(
            "buyAmount",
            ValidationErrorCode::FieldInvalid,
            "sellAmount and buyAmount are mutually exclusive",
        ));
    }

    for field in ADDRESS_PARAMS {
        if let Some(raw) = non_empty(query, field) {
            if !AddressValidator::is_valid_evm_address(raw) {
                items.push(invalid_address(field));
            }
        }
    }

    let mut lists = SourceLists::default();
    if let Some(raw) = non_empty(query, "excludedSources") {
        match parse_source_list(raw, false) {
            Ok(parsed) => lists.excluded = parsed.excluded,
            Err(item) => items.push(item),
        }
    }
    if let Some(raw) = non_empty(query, "includedSources") {
        match parse_source_list(raw, true) {
            Ok(parsed) => {
                lists.included = parsed.excluded;
                lists.rfqt_exclusive = parsed.rfqt_exclusive;
            }
            Err(item) => items.push(item),
        }
    }

    if items.is_empty() {
        Ok(lists)
    } else {
        Err(ApiError::Validation(items))
    }
}

/// 逗号分隔的来源列表；结果放在 `excluded` 字段，由调用方决定用途
fn parse_source_list(raw: &str, allow_rfqt: bool) -> Result<SourceLists, ValidationErrorItem> {
    let field = if allow_rfqt {
        "includedSources"
    } else {
        "excludedSources"
    };
    let names: Vec<&str> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    if allow_rfqt && names.contains(&RFQT_SOURCE_KEYWORD) {
        if names.len() != 1 {
            return Err(ValidationErrorItem::new(
                field,
                ValidationErrorCode::FieldInvalid,
                reasons::CONFLICTING_FILTERING_ARGUMENTS,
            ));
        }
        return Ok(SourceLists {
            rfqt_exclusive: true,
            ..Default::default()
        });
    }

    let mut sources = Vec::with_capacity(names.len());
    for name in names {
        let source = LiquiditySource::from_str(name).map_err(|e| {
            ValidationErrorItem::new(field, ValidationErrorCode::FieldInvalid, e.to_string())
        })?;
        sources.push(source);
    }
    Ok(SourceLists {
        excluded: sources,
        ..Default::default()
    })
}

fn non_empty<'q>(query: &'q RawQuery, key: &str) -> Option<&'q str> {
    query
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}

/// 布尔参数只接受字面量 "true"
fn flag(query: &RawQuery, key: &str) -> bool {
    query.get(key).map(String::as_str) == Some("true")
}

fn optional_address(query: &RawQuery, key: &str) -> Option<Address> {
    non_empty(query, key).and_then(AddressValidator::parse_evm_address)
}

fn required(field: &str) -> ValidationErrorItem {
    ValidationErrorItem::new(field, ValidationErrorCode::RequiredField, "requires a value")
}

fn invalid_address(field: &str) -> ValidationErrorItem {
    ValidationErrorItem::new(field, ValidationErrorCode::InvalidAddress, reasons::INVALID_ADDRESS)
}

pub(crate) fn tokens_must_differ() -> ApiError {
    ApiError::Validation(
        ["buyToken", "sellToken"]
            .into_iter()
            .map(|field| {
                ValidationErrorItem::new(
                    field,
                    ValidationErrorCode::RequiredField,
                    reasons::TOKENS_MUST_DIFFER,
                )
            })
            .collect(),
    )
}

/// 缺失为 None；出现但为空或格式错误均为错误
fn parse_amount(query: &RawQuery, field: &str) -> Result<Option<U256>, ApiError> {
    match query.get(field) {
        None => Ok(None),
        Some(raw) => parse_u256(raw).map(Some).map_err(|_| {
            ApiError::validation(
                field,
                ValidationErrorCode::IncorrectFormat,
                reasons::WHOLE_NUMBER_REQUIRED,
            )
        }),
    }
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

/// 滑点：无法解析或非正数时回退默认值，大于 1 报错
pub fn parse_slippage(raw: Option<&str>, default: Decimal) -> Result<Decimal, ApiError> {
    let slippage = match raw.and_then(parse_decimal) {
        Some(value) if value > Decimal::ZERO => value,
        _ => default,
    };
    if slippage > Decimal::ONE {
        return Err(ApiError::validation(
            "slippagePercentage",
            ValidationErrorCode::ValueOutOfRange,
            reasons::PERCENTAGE_OUT_OF_RANGE,
        ));
    }
    Ok(slippage)
}

/// 缺失或为空视为 0，出现但无法解析为数字时报错
fn parse_fee(query: &RawQuery, field: &str) -> Result<Decimal, ApiError> {
    match non_empty(query, field) {
        None => Ok(Decimal::ZERO),
        Some(raw) => parse_decimal(raw).ok_or_else(|| {
            ApiError::validation(field, ValidationErrorCode::IncorrectFormat, reasons::NUMBER_REQUIRED)
        }),
    }
}

/// 手续费：仅当 feeRecipient 存在时解析，卖出侧必须为 0
fn parse_affiliate_fee(query: &RawQuery) -> Result<AffiliateFee, ApiError> {
    let Some(recipient) = optional_address(query, "feeRecipient") else {
        return Ok(AffiliateFee::none());
    };

    let sell_fee = parse_fee(query, "sellTokenPercentageFee")?;
    if !sell_fee.is_zero() {
        return Err(ApiError::validation(
            "sellTokenPercentageFee",
            ValidationErrorCode::UnsupportedOption,
            reasons::ARGUMENT_NOT_YET_SUPPORTED,
        ));
    }

    let buy_fee = parse_fee(query, "buyTokenPercentageFee")?;
    if buy_fee > Decimal::ONE || buy_fee < Decimal::ZERO {
        return Err(ApiError::validation(
            "buyTokenPercentageFee",
            ValidationErrorCode::ValueOutOfRange,
            reasons::PERCENTAGE_OUT_OF_RANGE,
        ));
    }

    Ok(AffiliateFee {
        recipient,
        sell_token_percentage_fee: sell_fee,
        buy_token_percentage_fee: buy_fee,
    })
}
