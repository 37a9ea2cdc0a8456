//! 流动性来源标识
//!
//! 与报价引擎约定的来源名称（大小写敏感），Native 代表 0x 原生订单/RFQ

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LiquiditySource {
    Native,
    Uniswap,
    UniswapV2,
    Eth2Dai,
    Kyber,
    Curve,
    LiquidityProvider,
    MultiBridge,
    Balancer,
    Cream,
    Bancor,
    MStable,
    Mooniswap,
    MultiHop,
    Shell,
    Swerve,
    SnowSwap,
    SushiSwap,
    Dodo,
    CryptoCom,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown liquidity source `{0}`")]
pub struct UnknownLiquiditySource(pub String);

impl LiquiditySource {
    pub const ALL: [LiquiditySource; 20] = [
        LiquiditySource::Native,
        LiquiditySource::Uniswap,
        LiquiditySource::UniswapV2,
        LiquiditySource::Eth2Dai,
        LiquiditySource::Kyber,
        LiquiditySource::Curve,
        LiquiditySource::LiquidityProvider,
        LiquiditySource::MultiBridge,
        LiquiditySource::Balancer,
        LiquiditySource::Cream,
        LiquiditySource::Bancor,
        LiquiditySource::MStable,
        LiquiditySource::Mooniswap,
        LiquiditySource::MultiHop,
        LiquiditySource::Shell,
        LiquiditySource::Swerve,
        LiquiditySource::SnowSwap,
        LiquiditySource::SushiSwap,
        LiquiditySource::Dodo,
        LiquiditySource::CryptoCom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LiquiditySource::Native => "Native",
            LiquiditySource::Uniswap => "Uniswap",
            LiquiditySource::UniswapV2 => "Uniswap_V2",
            LiquiditySource::Eth2Dai => "Eth2Dai",
            LiquiditySource::Kyber => "Kyber",
            LiquiditySource::Curve => "Curve",
            LiquiditySource::LiquidityProvider => "LiquidityProvider",
            LiquiditySource::MultiBridge => "MultiBridge",
            LiquiditySource::Balancer => "Balancer",
            LiquiditySource::Cream => "CREAM",
            LiquiditySource::Bancor => "Bancor",
            LiquiditySource::MStable => "mStable",
            LiquiditySource::Mooniswap => "Mooniswap",
            LiquiditySource::MultiHop => "MultiHop",
            LiquiditySource::Shell => "Shell",
            LiquiditySource::Swerve => "Swerve",
            LiquiditySource::SnowSwap => "SnowSwap",
            LiquiditySource::SushiSwap => "SushiSwap",
            LiquiditySource::Dodo => "DODO",
            LiquiditySource::CryptoCom => "CryptoCom",
        }
    }

    /// 对外展示名称（Native 对外显示为 "0x"）
    pub fn external_name(&self) -> &'static str {
        match self {
            LiquiditySource::Native => "0x",
            other => other.as_str(),
        }
    }

    /// 需要 PLP 白名单 API Key 才能使用的来源
    pub fn is_privileged(&self) -> bool {
        matches!(self, LiquiditySource::LiquidityProvider)
    }
}

impl fmt::Display for LiquiditySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LiquiditySource {
    type Err = UnknownLiquiditySource;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LiquiditySource::ALL
            .iter()
            .copied()
            .find(|source| source.as_str() == s)
            .ok_or_else(|| UnknownLiquiditySource(s.to_string()))
    }
}

impl Serialize for LiquiditySource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for LiquiditySource {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
