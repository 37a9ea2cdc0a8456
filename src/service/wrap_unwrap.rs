//! 原生资产包装/解包识别

use ethers::types::Address;

use crate::domain::{TokenRegistry, NATIVE_ASSET_ADDRESS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapKind {
    /// 卖出原生资产，买入其包装代币
    Wrap,
    /// 卖出包装代币，买入原生资产
    Unwrap,
    Ordinary,
}

/// 分类结果；`sell_token` / `buy_token` 已把原生资产替换为包装代币地址
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifiedPair {
    pub kind: SwapKind,
    pub sell_token: Address,
    pub buy_token: Address,
    pub is_native_sell: bool,
    pub is_native_buy: bool,
}

impl ClassifiedPair {
    pub fn is_wrap_or_unwrap(&self) -> bool {
        matches!(self.kind, SwapKind::Wrap | SwapKind::Unwrap)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct WrapUnwrapDetector {
    wrapped_native: Address,
}

impl WrapUnwrapDetector {
    pub fn new(wrapped_native: Address) -> Self {
        Self { wrapped_native }
    }

    pub fn from_registry(registry: &TokenRegistry) -> Self {
        Self::new(registry.wrapped_native())
    }

    pub fn classify(&self, sell_token: Address, buy_token: Address) -> ClassifiedPair {
        let is_native_sell = sell_token == NATIVE_ASSET_ADDRESS;
        let is_native_buy = buy_token == NATIVE_ASSET_ADDRESS;

        let kind = if is_native_sell && buy_token == self.wrapped_native {
            SwapKind::Wrap
        } else if sell_token == self.wrapped_native && is_native_buy {
            SwapKind::Unwrap
        } else {
            SwapKind::Ordinary
        };

        ClassifiedPair {
            kind,
            sell_token: self.substitute(sell_token),
            buy_token: self.substitute(buy_token),
            is_native_sell,
            is_native_buy,
        }
    }

    fn substitute(&self, token: Address) -> Address {
        if token == NATIVE_ASSET_ADDRESS {
            self.wrapped_native
        } else {
            token
        }
    }
}
