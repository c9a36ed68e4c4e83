// USDC on Base: amount scaling and `transfer(address,uint256)` calldata

use ethers::abi::{encode, Token};
use ethers::types::{Address, H256, U256};
use ethers::utils::{hex, keccak256, parse_units};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::str::FromStr;

use crate::types::{AppError, AppResult};

pub const BASE_USDC_ADDRESS: &str = "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913";
pub const BASE_CHAIN_ID: u64 = 8453;
pub const USDC_DECIMALS: u32 = 6;

const TRANSFER_SIGNATURE: &str = "transfer(address,uint256)";
const TRANSFER_EVENT_SIGNATURE: &str = "Transfer(address,address,uint256)";

/// First four bytes of keccak256("transfer(address,uint256)")
pub fn transfer_selector() -> [u8; 4] {
    let hash = keccak256(TRANSFER_SIGNATURE.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// topic0 of the ERC-20 `Transfer` event
pub fn transfer_event_topic() -> H256 {
    H256::from(keccak256(TRANSFER_EVENT_SIGNATURE.as_bytes()))
}

/// Scale a decimal amount to token base units, rounding half away from zero
/// past the token's precision
pub fn to_token_units(amount: Decimal) -> AppResult<U256> {
    if amount.is_sign_negative() || amount.is_zero() {
        return Err(AppError::InvalidRequest(format!("amount must be positive, got {}", amount)));
    }

    let rounded = amount.round_dp_with_strategy(USDC_DECIMALS, RoundingStrategy::MidpointAwayFromZero);
    let units = parse_units(rounded.normalize().to_string(), USDC_DECIMALS)
        .map_err(|e| AppError::InvalidRequest(format!("amount {} is out of range: {}", amount, e)))?;

    Ok(units.into())
}

pub fn transfer_calldata(to: Address, units: U256) -> Vec<u8> {
    let mut data = transfer_selector().to_vec();
    data.extend(encode(&[Token::Address(to), Token::Uint(units)]));
    data
}

pub fn parse_address(value: &str) -> AppResult<Address> {
    Address::from_str(value.trim())
        .map_err(|e| AppError::InvalidRequest(format!("invalid address {}: {}", value, e)))
}

pub fn parse_tx_hash(value: &str) -> AppResult<H256> {
    H256::from_str(value.trim())
        .map_err(|e| AppError::InvalidRequest(format!("invalid transaction hash {}: {}", value, e)))
}

/// Lower-case `0x` hex, the form stored in `slids`
pub fn format_address(address: &Address) -> String {
    format!("{:#x}", address)
}

pub fn format_tx_hash(hash: &H256) -> String {
    format!("{:#x}", hash)
}

/// Everything the wallet needs to sign the payment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferRequest {
    pub chain_id: u64,
    pub token: String,
    pub to: String,
    pub amount: String,
    pub amount_units: String,
    pub data: String,
}

impl TransferRequest {
    pub fn new(chain_id: u64, token: Address, to: &str, amount: Decimal) -> AppResult<Self> {
        let recipient = parse_address(to)?;
        let units = to_token_units(amount)?;
        Ok(Self {
            chain_id,
            token: format_address(&token),
            to: format_address(&recipient),
            amount: amount.to_string(),
            amount_units: units.to_string(),
            data: format!("0x{}", hex::encode(transfer_calldata(recipient, units))),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_selectors() {
        assert_eq!(hex::encode(transfer_selector()), "a9059cbb");
        assert_eq!(
            format_tx_hash(&transfer_event_topic()),
            "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
        );
    }

    #[test]
    fn test_to_token_units() {
        assert_eq!(to_token_units(Decimal::from_str("500.00").unwrap()).unwrap(), U256::from(500_000_000u64));
        assert_eq!(to_token_units(Decimal::from_str("0.000001").unwrap()).unwrap(), U256::from(1u64));
        assert_eq!(to_token_units(Decimal::from_str("1.0000005").unwrap()).unwrap(), U256::from(1_000_001u64));
        assert_eq!(to_token_units(Decimal::from_str("1.0000004").unwrap()).unwrap(), U256::from(1_000_000u64));
        assert!(to_token_units(Decimal::ZERO).is_err());
        assert!(to_token_units(Decimal::from_str("-3").unwrap()).is_err());
        assert_eq!(
            to_token_units(Decimal::from_str("99999999999999.999999").unwrap()).unwrap(),
            U256::from(99_999_999_999_999_999_999u128)
        );
    }

    #[test]
    fn test_transfer_calldata_layout() {
        let to = parse_address("0x00000000000000000000000000000000000000aa").unwrap();
        let data = transfer_calldata(to, U256::from(500_000_000u64));
        assert_eq!(data.len(), 4 + 32 + 32);
        assert_eq!(&data[..4], &[0xa9, 0x05, 0x9c, 0xbb]);
        assert_eq!(data[35], 0xaa);
        assert_eq!(U256::from_big_endian(&data[36..]), U256::from(500_000_000u64));
    }

    #[test]
    fn test_transfer_request() {
        let token = parse_address(BASE_USDC_ADDRESS).unwrap();
        let req = TransferRequest::new(
            BASE_CHAIN_ID,
            token,
            "0xAbCdEf0123456789aBCdef0123456789abcDEF01",
            Decimal::from_str("12.5").unwrap(),
        )
        .unwrap();

        assert_eq!(req.token, "0x833589fcd6edb6e08f4c7c32d4f71b54bda02913");
        assert_eq!(req.to, "0xabcdef0123456789abcdef0123456789abcdef01");
        assert_eq!(req.amount_units, "12500000");
        assert!(req.data.starts_with("0xa9059cbb"));
    }

    #[test]
    fn test_parse_rejects_bad_hex() {
        assert!(parse_address("0x1234").is_err());
        assert!(parse_address("not-a-wallet").is_err());
        assert!(parse_tx_hash("0xzz").is_err());
        assert!(parse_tx_hash(&format!("0x{}", "ab".repeat(32))).is_ok());
    }
}
