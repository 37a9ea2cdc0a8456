//! 代币表
//!
//! 按链加载一次的只读代币表：符号/地址解析、小数位查询、原生资产规则

use std::{collections::HashMap, str::FromStr};

use anyhow::{anyhow, bail, Context, Result};
use ethers::types::{Address, H160};
use serde::{Deserialize, Serialize};

use crate::utils::address_validator::AddressValidator;

/// 原生资产哨兵地址（0xeeee...eeee）
pub const NATIVE_ASSET_ADDRESS: Address = H160([0xee; 20]);

/// 原生资产小数位
pub const NATIVE_DECIMALS: u8 = 18;

/// 小数位上限：10^77 是 U256 能表示的最大 10 的幂
pub const MAX_TOKEN_DECIMALS: u8 = 77;

/// 主网默认代币表：(symbol, address, decimals, name)
const MAINNET_TOKENS: &[(&str, &str, u8, &str)] = &[
    ("WETH", "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2", 18, "Wrapped Ether"),
    ("DAI", "0x6b175474e89094c44da98b954eedeac495271d0f", 18, "Dai Stablecoin"),
    ("USDC", "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48", 6, "USD Coin"),
    ("USDT", "0xdac17f958d2ee523a2206206994597c13d831ec7", 6, "Tether USD"),
    ("WBTC", "0x2260fac5e5542a773aa44fbcfedf7c193bc2c599", 8, "Wrapped BTC"),
    ("ZRX", "0xe41d2489571d322189246dafa5ebde1f4699f498", 18, "0x Protocol Token"),
    ("MKR", "0x9f8f72aa9304c8b593d555f12ef6589cc3a579a2", 18, "Maker"),
    ("LINK", "0x514910771af9ca656af840dff83e8264ecf986ca", 18, "ChainLink Token"),
    ("UNI", "0x1f9840a85d5af5bf1d1762f925bdaddc4201f984", 18, "Uniswap"),
    ("BNT", "0x1f573d6fb3f13d689ff844b4ce37794d79a7ff1c", 18, "Bancor Network Token"),
];

/// 配置中的代币条目
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenEntry {
    pub symbol: String,
    pub address: String,
    pub decimals: u8,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TokenInfo {
    pub symbol: String,
    pub address: Address,
    pub decimals: u8,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct TokenRegistry {
    chain_id: u64,
    native_symbol: String,
    wrapped_native: Address,
    by_symbol: HashMap<String, TokenInfo>,
    by_address: HashMap<Address, TokenInfo>,
}

impl TokenRegistry {
    /// 构建代币表；`overrides` 中的同名符号覆盖默认条目
    pub fn new(
        chain_id: u64,
        native_symbol: &str,
        wrapped_native_address: &str,
        overrides: &[TokenEntry],
    ) -> Result<Self> {
        let wrapped_native = AddressValidator::parse_evm_address(wrapped_native_address)
            .ok_or_else(|| anyhow!("invalid wrapped native address: {}", wrapped_native_address))?;

        let defaults = if chain_id == 1 {
            MAINNET_TOKENS
                .iter()
                .map(|(symbol, address, decimals, name)| TokenEntry {
                    symbol: symbol.to_string(),
                    address: address.to_string(),
                    decimals: *decimals,
                    name: name.to_string(),
                })
                .collect()
        } else {
            Vec::new()
        };

        let mut registry = Self {
            chain_id,
            native_symbol: native_symbol.to_string(),
            wrapped_native,
            by_symbol: HashMap::new(),
            by_address: HashMap::new(),
        };

        for entry in defaults.iter().chain(overrides.iter()) {
            registry.insert(entry)?;
        }

        Ok(registry)
    }

    fn insert(&mut self, entry: &TokenEntry) -> Result<()> {
        if entry.decimals > MAX_TOKEN_DECIMALS {
            bail!(
                "decimals for token {} out of range: {} > {}",
                entry.symbol,
                entry.decimals,
                MAX_TOKEN_DECIMALS
            );
        }
        let address = Address::from_str(&entry.address)
            .with_context(|| format!("invalid address for token {}", entry.symbol))?;
        let info = TokenInfo {
            symbol: entry.symbol.clone(),
            address,
            decimals: entry.decimals,
            name: entry.name.clone(),
        };
        if let Some(previous) = self.by_symbol.insert(entry.symbol.to_lowercase(), info.clone()) {
            self.by_address.remove(&previous.address);
        }
        self.by_address.insert(address, info);
        Ok(())
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn native_symbol(&self) -> &str {
        &self.native_symbol
    }

    pub fn wrapped_native(&self) -> Address {
        self.wrapped_native
    }

    /// 解析符号或地址；原生资产符号解析为哨兵地址
    pub fn resolve(&self, identifier: &str) -> Option<Address> {
        let identifier = identifier.trim();
        if identifier.eq_ignore_ascii_case(&self.native_symbol) {
            return Some(NATIVE_ASSET_ADDRESS);
        }
        if identifier.starts_with("0x") {
            return AddressValidator::parse_evm_address(identifier);
        }
        self.by_symbol
            .get(&identifier.to_lowercase())
            .map(|info| info.address)
    }

    /// 代币小数位；表中不存在时返回 None
    pub fn decimals(&self, address: Address) -> Option<u8> {
        if address == NATIVE_ASSET_ADDRESS {
            return Some(NATIVE_DECIMALS);
        }
        self.by_address.get(&address).map(|info| info.decimals)
    }

    /// 全部代币，按符号排序
    pub fn tokens(&self) -> Vec<TokenInfo> {
        let mut tokens: Vec<TokenInfo> = self.by_symbol.values().cloned().collect();
        tokens.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        tokens
    }
}
