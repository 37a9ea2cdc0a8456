//! 配置管理模块
//! 支持从环境变量和配置文件加载配置

use std::{collections::HashSet, path::Path, str::FromStr};

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    domain::{LiquiditySource, TokenEntry, MAX_TOKEN_DECIMALS},
    utils::address_validator::AddressValidator,
};

/// 主网 WETH
pub const DEFAULT_WRAPPED_NATIVE_ADDRESS: &str = "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2";

/// 应用配置结构体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub chain: ChainConfig,
    #[serde(default)]
    pub access: AccessConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub swap: SwapConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "text"
}

/// 链配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    pub chain_id: u64,
    pub native_symbol: String,
    pub wrapped_native_address: String,
    /// 追加/覆盖默认代币表
    #[serde(default)]
    pub tokens: Vec<TokenEntry>,
}

/// 访问控制名单（启动时加载一次，之后只读）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessConfig {
    #[serde(default)]
    pub rfqt_api_key_whitelist: Vec<String>,
    #[serde(default)]
    pub plp_api_key_whitelist: Vec<String>,
    #[serde(default)]
    pub rfqt_registry_passwords: Vec<String>,
}

/// 报价引擎配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub url: String,
    pub timeout_secs: u64,
}

/// 报价参数默认值
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapConfig {
    pub default_slippage: Decimal,
    /// 价格比较参考来源
    #[serde(default)]
    pub price_comparison_sources: Vec<LiquiditySource>,
}

/// 逗号分隔的环境变量列表，空项忽略
fn env_list(key: &str) -> Vec<String> {
    std::env::var(key)
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into()),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            format: std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".into()),
        }
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            chain_id: std::env::var("CHAIN_ID")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1),
            native_symbol: std::env::var("NATIVE_SYMBOL").unwrap_or_else(|_| "ETH".into()),
            wrapped_native_address: std::env::var("WRAPPED_NATIVE_ADDRESS")
                .unwrap_or_else(|_| DEFAULT_WRAPPED_NATIVE_ADDRESS.into()),
            tokens: Vec::new(),
        }
    }
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            rfqt_api_key_whitelist: env_list("RFQT_API_KEY_WHITELIST"),
            plp_api_key_whitelist: env_list("PLP_API_KEY_WHITELIST"),
            rfqt_registry_passwords: env_list("RFQT_REGISTRY_PASSWORDS"),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            url: std::env::var("QUOTE_ENGINE_URL")
                .unwrap_or_else(|_| "http://localhost:3100".into()),
            timeout_secs: std::env::var("QUOTE_ENGINE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
        }
    }
}

impl Default for SwapConfig {
    fn default() -> Self {
        let price_comparison_sources = env_list("PRICE_COMPARISON_SOURCES")
            .iter()
            .filter_map(|name| LiquiditySource::from_str(name).ok())
            .collect::<Vec<_>>();
        Self {
            default_slippage: std::env::var("DEFAULT_SLIPPAGE")
                .ok()
                .and_then(|s| Decimal::from_str(&s).ok())
                .unwrap_or_else(|| Decimal::new(1, 2)),
            price_comparison_sources: if price_comparison_sources.is_empty() {
                vec![
                    LiquiditySource::Uniswap,
                    LiquiditySource::UniswapV2,
                    LiquiditySource::Kyber,
                    LiquiditySource::SushiSwap,
                ]
            } else {
                price_comparison_sources
            },
        }
    }
}

impl Config {
    /// 从环境变量加载配置
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            chain: ChainConfig::default(),
            access: AccessConfig::default(),
            engine: EngineConfig::default(),
            swap: SwapConfig::default(),
        })
    }

    /// 从配置文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: Config =
            toml::from_str(&content).with_context(|| "Failed to parse config file as TOML")?;

        Ok(config)
    }

    /// 从环境变量和配置文件合并加载（配置文件优先级更高）
    pub fn from_env_and_file<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        let mut config = Self::from_env()?;

        if let Some(path) = path {
            if path.as_ref().exists() {
                config = Self::from_file(path)?;
            }
        }

        Ok(config)
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            anyhow::bail!("LOG_LEVEL must be one of: {:?}", valid_levels);
        }

        if self.logging.format != "json" && self.logging.format != "text" {
            anyhow::bail!("LOG_FORMAT must be 'json' or 'text'");
        }

        if self.chain.native_symbol.trim().is_empty() {
            anyhow::bail!("NATIVE_SYMBOL must not be empty");
        }

        if !AddressValidator::is_valid_evm_address(&self.chain.wrapped_native_address) {
            anyhow::bail!(
                "WRAPPED_NATIVE_ADDRESS is not a valid address: {}",
                self.chain.wrapped_native_address
            );
        }

        if let Some(token) = self
            .chain
            .tokens
            .iter()
            .find(|t| t.decimals > MAX_TOKEN_DECIMALS)
        {
            anyhow::bail!(
                "decimals for token {} must be at most {}",
                token.symbol,
                MAX_TOKEN_DECIMALS
            );
        }

        if !self.engine.url.starts_with("http://") && !self.engine.url.starts_with("https://") {
            anyhow::bail!("QUOTE_ENGINE_URL must start with http:// or https://");
        }

        if self.swap.default_slippage <= Decimal::ZERO || self.swap.default_slippage > Decimal::ONE
        {
            anyhow::bail!("DEFAULT_SLIPPAGE must be in (0, 1]");
        }

        // 注册表密码只能匹配 36 位 Bearer token
        if let Some(bad) = self
            .access
            .rfqt_registry_passwords
            .iter()
            .find(|p| p.chars().count() != 36)
        {
            tracing::warn!(len = bad.chars().count(), "RFQT registry password is not 36 characters and can never match");
        }

        Ok(())
    }
}

/// 访问名单的只读视图，按值精确比较
#[derive(Debug, Clone, Default)]
pub struct AccessLists {
    rfqt_api_keys: HashSet<String>,
    plp_api_keys: HashSet<String>,
    registry_passwords: HashSet<String>,
}

impl AccessLists {
    pub fn new(
        rfqt_api_keys: impl IntoIterator<Item = String>,
        plp_api_keys: impl IntoIterator<Item = String>,
        registry_passwords: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            rfqt_api_keys: rfqt_api_keys.into_iter().collect(),
            plp_api_keys: plp_api_keys.into_iter().collect(),
            registry_passwords: registry_passwords.into_iter().collect(),
        }
    }

    pub fn is_rfqt_whitelisted(&self, api_key: Option<&str>) -> bool {
        api_key.map_or(false, |key| self.rfqt_api_keys.contains(key))
    }

    pub fn is_plp_whitelisted(&self, api_key: Option<&str>) -> bool {
        api_key.map_or(false, |key| self.plp_api_keys.contains(key))
    }

    pub fn is_registry_password(&self, token: &str) -> bool {
        self.registry_passwords.contains(token)
    }

    /// 注册表响应体：排序后的 RFQT 白名单
    pub fn rfqt_whitelist(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.rfqt_api_keys.iter().cloned().collect();
        keys.sort();
        keys
    }
}

impl From<&AccessConfig> for AccessLists {
    fn from(config: &AccessConfig) -> Self {
        Self::new(
            config.rfqt_api_key_whitelist.iter().cloned(),
            config.plp_api_key_whitelist.iter().cloned(),
            config.rfqt_registry_passwords.iter().cloned(),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn test_config_from_env() {
        let config = Config::from_env().unwrap();
        assert!(!config.chain.native_symbol.is_empty());
        assert!(config.swap.default_slippage > Decimal::ZERO);
    }

    #[test]
    fn test_config_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[server]
bind_addr = "0.0.0.0:9090"

[logging]
level = "info"
format = "json"

[chain]
chain_id = 1
native_symbol = "ETH"
wrapped_native_address = "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2"

[[chain.tokens]]
symbol = "TEST"
address = "0x0000000000000000000000000000000000000abc"
decimals = 9

[access]
rfqt_api_key_whitelist = ["key-a", "key-b"]
plp_api_key_whitelist = ["key-a"]
rfqt_registry_passwords = ["0123456789abcdef0123456789abcdef0123"]

[engine]
url = "http://engine:3100"
timeout_secs = 5

[swap]
default_slippage = "0.02"
price_comparison_sources = ["Uniswap_V2", "Kyber"]
"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.server.bind_addr, "0.0.0.0:9090");
        assert_eq!(config.chain.tokens[0].decimals, 9);
        assert_eq!(config.access.rfqt_api_key_whitelist.len(), 2);
        assert_eq!(config.swap.default_slippage, Decimal::new(2, 2));
        assert_eq!(
            config.swap.price_comparison_sources,
            vec![LiquiditySource::UniswapV2, LiquiditySource::Kyber]
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::from_env().unwrap();
        config.logging.level = "info".into();
        config.logging.format = "text".into();
        config.engine.url = "http://localhost:3100".into();
        config.chain.wrapped_native_address = DEFAULT_WRAPPED_NATIVE_ADDRESS.into();
        config.swap.default_slippage = Decimal::new(1, 2);
        assert!(config.validate().is_ok());

        config.swap.default_slippage = Decimal::new(2, 0);
        assert!(config.validate().is_err());

        config.swap.default_slippage = Decimal::new(1, 2);
        config.engine.url = "engine:3100".into();
        assert!(config.validate().is_err());

        config.engine.url = "http://localhost:3100".into();
        config.chain.tokens = vec![TokenEntry {
            symbol: "BIG".into(),
            address: "0x0000000000000000000000000000000000000b16".into(),
            decimals: 78,
            name: String::new(),
        }];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_access_lists_exact_match() {
        let lists = AccessLists::new(
            vec!["b".to_string(), "a".to_string()],
            vec!["plp".to_string()],
            vec!["secret".to_string()],
        );
        assert!(lists.is_rfqt_whitelisted(Some("a")));
        assert!(!lists.is_rfqt_whitelisted(Some("A")));
        assert!(!lists.is_rfqt_whitelisted(None));
        assert!(lists.is_plp_whitelisted(Some("plp")));
        assert!(lists.is_registry_password("secret"));
        assert_eq!(lists.rfqt_whitelist(), vec!["a".to_string(), "b".to_string()]);
    }
}
