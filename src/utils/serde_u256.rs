//! U256 十进制字符串序列化
//!
//! ethers 默认把 U256 序列化为十六进制，对外接口统一使用十进制字符串（base units）

use ethers::types::U256;
use serde::{de, Deserialize, Deserializer, Serializer};

/// 解析十进制（或 0x 前缀十六进制）整数
pub fn parse_u256(raw: &str) -> Result<U256, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("empty number".to_string());
    }
    if let Some(hex) = raw.strip_prefix("0x") {
        if hex.is_empty() {
            return Err("empty hex number".to_string());
        }
        return U256::from_str_radix(hex, 16).map_err(|e| format!("invalid hex number: {:?}", e));
    }
    if !raw.chars().all(|c| c.is_ascii_digit()) {
        return Err(format!("invalid whole number: {}", raw));
    }
    U256::from_dec_str(raw).map_err(|e| format!("invalid whole number {}: {:?}", raw, e))
}

pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_string())
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(u64),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Text(s) => parse_u256(&s).map_err(de::Error::custom),
        Raw::Number(n) => Ok(U256::from(n)),
    }
}

pub mod option {
    use ethers::types::U256;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<U256>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => super::serialize(v, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<U256>, D::Error> {
        #[derive(Deserialize)]
        struct Wrapper(#[serde(with = "crate::utils::serde_u256")] U256);

        Ok(Option::<Wrapper>::deserialize(deserializer)?.map(|Wrapper(v)| v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_u256() {
        assert_eq!(parse_u256("1000").unwrap(), U256::from(1000u64));
        assert_eq!(parse_u256("0x10").unwrap(), U256::from(16u64));
        assert!(parse_u256("").is_err());
        assert!(parse_u256("0x").is_err());
        assert!(parse_u256(" 0x ").is_err());
        assert!(parse_u256("1.5").is_err());
        assert!(parse_u256("-1").is_err());
        assert!(parse_u256("1e18").is_err());
    }

    #[test]
    fn test_serializes_as_decimal_string() {
        #[derive(serde::Serialize, serde::Deserialize)]
        struct Amount {
            #[serde(with = "crate::utils::serde_u256")]
            value: U256,
        }

        let json = serde_json::to_string(&Amount {
            value: U256::exp10(18),
        })
        .unwrap();
        assert_eq!(json, r#"{"value":"1000000000000000000"}"#);

        let back: Amount = serde_json::from_str(r#"{"value":42}"#).unwrap();
        assert_eq!(back.value, U256::from(42u64));
    }
}
