pub mod address_validator;
pub mod serde_u256;
