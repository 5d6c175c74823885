//! Loose JSON field readers for decoded events
//!
//! Events reach this crate as JSON produced by different chain SDKs, so the
//! same logical field shows up in several shapes:
//!
//! - integers as JSON numbers, decimal strings or `0x` hex strings
//! - byte strings as `0x` hex, base64 or arrays of `u8`
//!
//! These helpers are used with `#[serde(deserialize_with = "...")]`.

use alloy::primitives::{Bytes, B256, U256};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

use crate::address_codec::UniversalAddress;
use crate::error::Result;
use crate::types::ChainFamily;

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberLike {
    Int(u64),
    Text(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BytesLike {
    Text(String),
    Array(Vec<u8>),
}

pub(crate) fn parse_u256(text: &str) -> std::result::Result<U256, String> {
    let text = text.trim();
    if text.is_empty() {
        return Err("empty integer".to_string());
    }
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(digits) => U256::from_str_radix(digits, 16),
        None => U256::from_str_radix(text, 10),
    };
    parsed.map_err(|e| format!("invalid integer '{}': {}", text, e))
}

pub(crate) fn parse_bytes(text: &str) -> std::result::Result<Vec<u8>, String> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(Vec::new());
    }
    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(digits) => hex::decode(digits).map_err(|e| format!("invalid hex '{}': {}", text, e)),
        None => STANDARD
            .decode(text)
            .map_err(|e| format!("invalid base64 '{}': {}", text, e)),
    }
}

fn number_to_u256(value: NumberLike) -> std::result::Result<U256, String> {
    match value {
        NumberLike::Int(n) => Ok(U256::from(n)),
        NumberLike::Text(s) => parse_u256(&s),
    }
}

fn bytes_like(value: BytesLike) -> std::result::Result<Vec<u8>, String> {
    match value {
        BytesLike::Text(s) => parse_bytes(&s),
        BytesLike::Array(v) => Ok(v),
    }
}

// ============================================================================
// Integers
// ============================================================================

pub(crate) fn de_u256<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<U256, D::Error> {
    number_to_u256(NumberLike::deserialize(d)?).map_err(D::Error::custom)
}

pub(crate) fn de_u64<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<u64, D::Error> {
    let value = de_u256(d)?;
    u64::try_from(value).map_err(|_| D::Error::custom(format!("{} does not fit in u64", value)))
}

pub(crate) fn de_opt_u256<'de, D: Deserializer<'de>>(
    d: D,
) -> std::result::Result<Option<U256>, D::Error> {
    match Option::<NumberLike>::deserialize(d)? {
        Some(v) => number_to_u256(v).map(Some).map_err(D::Error::custom),
        None => Ok(None),
    }
}

pub(crate) fn de_opt_u64<'de, D: Deserializer<'de>>(
    d: D,
) -> std::result::Result<Option<u64>, D::Error> {
    match de_opt_u256(d)? {
        Some(v) => u64::try_from(v)
            .map(Some)
            .map_err(|_| D::Error::custom(format!("{} does not fit in u64", v))),
        None => Ok(None),
    }
}

// ============================================================================
// Bytes
// ============================================================================

pub(crate) fn de_bytes<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Bytes, D::Error> {
    bytes_like(BytesLike::deserialize(d)?)
        .map(Bytes::from)
        .map_err(D::Error::custom)
}

pub(crate) fn de_opt_bytes<'de, D: Deserializer<'de>>(
    d: D,
) -> std::result::Result<Option<Bytes>, D::Error> {
    match Option::<BytesLike>::deserialize(d)? {
        Some(v) => bytes_like(v).map(|b| Some(Bytes::from(b))).map_err(D::Error::custom),
        None => Ok(None),
    }
}

pub(crate) fn de_bytes_vec<'de, D: Deserializer<'de>>(
    d: D,
) -> std::result::Result<Vec<Bytes>, D::Error> {
    Vec::<BytesLike>::deserialize(d)?
        .into_iter()
        .map(|v| bytes_like(v).map(Bytes::from))
        .collect::<std::result::Result<_, _>>()
        .map_err(D::Error::custom)
}

pub(crate) fn de_opt_bytes_vec<'de, D: Deserializer<'de>>(
    d: D,
) -> std::result::Result<Option<Vec<Bytes>>, D::Error> {
    match Option::<Vec<BytesLike>>::deserialize(d)? {
        Some(items) => items
            .into_iter()
            .map(|v| bytes_like(v).map(Bytes::from))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map(Some)
            .map_err(D::Error::custom),
        None => Ok(None),
    }
}

pub(crate) fn de_b256<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<B256, D::Error> {
    let bytes = bytes_like(BytesLike::deserialize(d)?).map_err(D::Error::custom)?;
    if bytes.len() != 32 {
        return Err(D::Error::custom(format!(
            "expected 32 bytes, got {}",
            bytes.len()
        )));
    }
    Ok(B256::from_slice(&bytes))
}

// ============================================================================
// Addresses
// ============================================================================

/// Address field whose family is only known once the lane is resolved
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RawAddress {
    Text(String),
    Bytes(Vec<u8>),
}

impl RawAddress {
    /// Resolve in `family`: the text is tried as an address first, then as
    /// an encoded byte string
    pub fn resolve(&self, family: ChainFamily) -> Result<UniversalAddress> {
        match self {
            RawAddress::Text(text) => match UniversalAddress::parse(text, family) {
                Ok(address) => Ok(address),
                Err(err) => match parse_bytes(text) {
                    Ok(bytes) if !bytes.is_empty() => UniversalAddress::from_bytes(&bytes, family),
                    _ => Err(err),
                },
            },
            RawAddress::Bytes(bytes) => UniversalAddress::from_bytes(bytes, family),
        }
    }
}
