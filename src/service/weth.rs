//! 包装/解包原生资产的本地报价
//!
//! 1:1 兑换，无需询价：直接生成包装合约的 deposit() / withdraw(uint256) 调用

use ethers::{
    abi::{encode, Token},
    types::{Address, Bytes, U256},
};
use rust_decimal::Decimal;

use crate::domain::{SourceBreakdown, SwapQuote, NATIVE_ASSET_ADDRESS, NULL_ADDRESS};

/// deposit()
const DEPOSIT_SELECTOR: [u8; 4] = [0xd0, 0xe3, 0x0d, 0xb0];
/// withdraw(uint256)
const WITHDRAW_SELECTOR: [u8; 4] = [0x2e, 0x1a, 0x7d, 0x4d];

pub const WRAP_QUOTE_GAS: u64 = 43_300;
pub const UNWRAP_QUOTE_GAS: u64 = 36_000;

#[derive(Debug, Clone, Copy)]
pub struct WethQuoter {
    wrapped_native: Address,
}

impl WethQuoter {
    pub fn new(wrapped_native: Address) -> Self {
        Self { wrapped_native }
    }

    /// 原生资产 -> 包装代币
    pub fn wrap_quote(&self, amount: U256, gas_price: U256) -> SwapQuote {
        self.build(
            NATIVE_ASSET_ADDRESS,
            self.wrapped_native,
            amount,
            amount,
            Bytes::from(DEPOSIT_SELECTOR.to_vec()),
            WRAP_QUOTE_GAS,
            gas_price,
        )
    }

    /// 包装代币 -> 原生资产
    pub fn unwrap_quote(&self, amount: U256, gas_price: U256) -> SwapQuote {
        let mut data = WITHDRAW_SELECTOR.to_vec();
        data.extend(encode(&[Token::Uint(amount)]));
        self.build(
            self.wrapped_native,
            NATIVE_ASSET_ADDRESS,
            amount,
            U256::zero(),
            Bytes::from(data),
            UNWRAP_QUOTE_GAS,
            gas_price,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn build(
        &self,
        sell_token: Address,
        buy_token: Address,
        amount: U256,
        value: U256,
        data: Bytes,
        gas: u64,
        gas_price: U256,
    ) -> SwapQuote {
        SwapQuote {
            price: Decimal::ONE,
            guaranteed_price: Decimal::ONE,
            to: self.wrapped_native,
            data,
            value,
            gas: U256::from(gas),
            estimated_gas: U256::from(gas),
            gas_price,
            protocol_fee: U256::zero(),
            minimum_protocol_fee: U256::zero(),
            buy_token_address: buy_token,
            sell_token_address: sell_token,
            buy_amount: amount,
            sell_amount: amount,
            sources: vec![SourceBreakdown {
                name: "WETH".into(),
                proportion: Decimal::ONE,
            }],
            orders: Vec::new(),
            allowance_target: NULL_ADDRESS,
            quote_report: None,
            decoded_unique_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::swap_request::fixtures::weth;

    #[test]
    fn test_wrap_sends_value_to_deposit() {
        let amount = U256::exp10(18);
        let quote = WethQuoter::new(weth()).wrap_quote(amount, U256::from(1u64));
        assert_eq!(quote.to, weth());
        assert_eq!(quote.value, amount);
        assert_eq!(quote.data.as_ref(), &DEPOSIT_SELECTOR);
        assert_eq!(quote.sell_token_address, NATIVE_ASSET_ADDRESS);
        assert_eq!(quote.buy_amount, quote.sell_amount);
        assert_eq!(quote.gas, U256::from(WRAP_QUOTE_GAS));
    }

    #[test]
    fn test_unwrap_encodes_withdraw_amount() {
        let amount = U256::from(5u64);
        let quote = WethQuoter::new(weth()).unwrap_quote(amount, U256::from(1u64));
        assert_eq!(quote.value, U256::zero());
        assert_eq!(quote.data.len(), 4 + 32);
        assert_eq!(&quote.data[..4], &WITHDRAW_SELECTOR);
        assert_eq!(quote.data[35], 5);
        assert_eq!(quote.buy_token_address, NATIVE_ASSET_ADDRESS);
        assert!(quote.quote_report.is_none());
    }
}
