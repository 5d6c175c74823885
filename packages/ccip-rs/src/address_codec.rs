//! Chain-family-aware address encoding
//!
//! Converts between the human encodings each chain family uses for accounts
//! and the canonical bytes the hashers and codecs work with.
//!
//! ## Canonical Forms
//!
//! | Family | Bytes | Display |
//! |--------|-------|---------|
//! | EVM    | 20    | EIP-55 checksummed hex |
//! | SVM    | 32    | base58 |
//! | Aptos  | 32    | `0x` + 64 hex, optional `::module` |
//! | Sui    | 32    | `0x` + 64 hex, optional `::module` |
//! | TON    | 36    | raw `workchain:hex` |
//!
//! EVM addresses embedded in 32-byte slots are accepted and left-zero-stripped.
//! The `::module` suffix of Move addresses is kept as metadata and never
//! becomes part of the canonical bytes.

use alloy::primitives::{Address, B256};
use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine;
use std::fmt;

use crate::error::{CcipError, Result};
use crate::types::ChainFamily;

// ============================================================================
// Lengths
// ============================================================================

pub const EVM_ADDRESS_LENGTH: usize = 20;
pub const BYTES32_LENGTH: usize = 32;
/// `int32` workchain + 32-byte account hash
pub const TON_ADDRESS_LENGTH: usize = 36;

/// base64 user-friendly TON address: flags + workchain + hash + crc16
const TON_FRIENDLY_LENGTH: usize = 36;
const TON_FRIENDLY_TAG: u8 = 0x11;

/// Canonical byte length for a family
pub fn address_length(family: ChainFamily) -> usize {
    match family {
        ChainFamily::Evm => EVM_ADDRESS_LENGTH,
        ChainFamily::Svm | ChainFamily::Aptos | ChainFamily::Sui => BYTES32_LENGTH,
        ChainFamily::Ton => TON_ADDRESS_LENGTH,
    }
}

// ============================================================================
// Universal Address
// ============================================================================

/// Address input: text as shown to users, or raw bytes from an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressInput<'a> {
    Text(&'a str),
    Bytes(&'a [u8]),
}

impl<'a> From<&'a str> for AddressInput<'a> {
    fn from(s: &'a str) -> Self {
        AddressInput::Text(s)
    }
}

impl<'a> From<&'a String> for AddressInput<'a> {
    fn from(s: &'a String) -> Self {
        AddressInput::Text(s.as_str())
    }
}

impl<'a> From<&'a [u8]> for AddressInput<'a> {
    fn from(b: &'a [u8]) -> Self {
        AddressInput::Bytes(b)
    }
}

impl<'a> From<&'a Vec<u8>> for AddressInput<'a> {
    fn from(b: &'a Vec<u8>) -> Self {
        AddressInput::Bytes(b.as_slice())
    }
}

/// Canonical address of a given chain family
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UniversalAddress {
    family: ChainFamily,
    bytes: Vec<u8>,
    module: Option<String>,
}

impl UniversalAddress {
    /// Parse a textual address in the given family
    pub fn parse(text: &str, family: ChainFamily) -> Result<Self> {
        let text = text.trim();
        match family {
            ChainFamily::Evm => {
                let raw = decode_hex(text, family)?;
                Self::from_bytes(&raw, family).map_err(|e| relabel(e, text))
            }
            ChainFamily::Svm => {
                let raw = if has_hex_prefix(text) {
                    decode_hex(text, family)?
                } else {
                    bs58::decode(text)
                        .into_vec()
                        .map_err(|e| invalid(family, text, e.to_string()))?
                };
                Self::from_bytes(&raw, family).map_err(|e| relabel(e, text))
            }
            ChainFamily::Aptos | ChainFamily::Sui => parse_move_address(text, family),
            ChainFamily::Ton => parse_ton_address(text),
        }
    }

    /// Build from raw bytes in the given family
    ///
    /// EVM accepts 20 bytes, or a 32-byte slot whose first 12 bytes are zero.
    pub fn from_bytes(bytes: &[u8], family: ChainFamily) -> Result<Self> {
        let expected = address_length(family);
        let canonical = match family {
            ChainFamily::Evm if bytes.len() == BYTES32_LENGTH => {
                if bytes[..12].iter().any(|b| *b != 0) {
                    return Err(invalid(
                        family,
                        &format!("0x{}", hex::encode(bytes)),
                        "32-byte slot does not hold a left-padded 20-byte address",
                    ));
                }
                &bytes[12..]
            }
            _ => bytes,
        };

        if canonical.len() != expected {
            return Err(CcipError::InvalidAddressLength {
                family,
                expected,
                actual: bytes.len(),
                raw: format!("0x{}", hex::encode(bytes)),
            });
        }

        Ok(Self {
            family,
            bytes: canonical.to_vec(),
            module: None,
        })
    }

    /// All-zero address of a family (the "system" address used as a
    /// placeholder receiver)
    pub fn zero(family: ChainFamily) -> Self {
        Self {
            family,
            bytes: vec![0u8; address_length(family)],
            module: None,
        }
    }

    pub fn from_evm(address: Address) -> Self {
        Self {
            family: ChainFamily::Evm,
            bytes: address.to_vec(),
            module: None,
        }
    }

    /// Attach a Move module qualifier
    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    pub fn family(&self) -> ChainFamily {
        self.family
    }

    /// Canonical bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn module(&self) -> Option<&str> {
        self.module.as_deref()
    }

    pub fn is_zero(&self) -> bool {
        self.bytes.iter().all(|b| *b == 0)
    }

    /// Bytes as carried inside `bytes` fields of cross-chain messages
    ///
    /// EVM addresses are left-padded to 32 bytes (`abi.encode(address)`);
    /// every other family uses its canonical bytes.
    pub fn to_cross_chain_bytes(&self) -> Vec<u8> {
        match self.family {
            ChainFamily::Evm => {
                let mut padded = vec![0u8; BYTES32_LENGTH];
                padded[12..].copy_from_slice(&self.bytes);
                padded
            }
            _ => self.bytes.clone(),
        }
    }

    /// Fixed 32-byte form; fails for TON
    pub fn to_bytes32(&self) -> Result<B256> {
        let bytes = self.to_cross_chain_bytes();
        if bytes.len() != BYTES32_LENGTH {
            return Err(CcipError::InvalidAddressLength {
                family: self.family,
                expected: BYTES32_LENGTH,
                actual: bytes.len(),
                raw: self.to_string(),
            });
        }
        Ok(B256::from_slice(&bytes))
    }

    /// The 20-byte EVM address, if this is an EVM address
    pub fn evm_address(&self) -> Option<Address> {
        match self.family {
            ChainFamily::Evm => Some(Address::from_slice(&self.bytes)),
            _ => None,
        }
    }
}

impl fmt::Display for UniversalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Canonical bytes always have the family's length here
        let text = display_canonical(&self.bytes, self.family);
        match &self.module {
            Some(module) => write!(f, "{}::{}", text, module),
            None => write!(f, "{}", text),
        }
    }
}

// ============================================================================
// Codec Contract
// ============================================================================

/// Convert a textual or raw address into its canonical form
pub fn to_canonical_bytes<'a>(
    input: impl Into<AddressInput<'a>>,
    family: ChainFamily,
) -> Result<UniversalAddress> {
    match input.into() {
        AddressInput::Text(text) => UniversalAddress::parse(text, family),
        AddressInput::Bytes(bytes) => UniversalAddress::from_bytes(bytes, family),
    }
}

/// Display form of raw address bytes in the given family
pub fn to_display_address(bytes: &[u8], family: ChainFamily) -> Result<String> {
    Ok(UniversalAddress::from_bytes(bytes, family)?.to_string())
}

fn display_canonical(bytes: &[u8], family: ChainFamily) -> String {
    match family {
        ChainFamily::Evm => Address::from_slice(bytes).to_checksum(None),
        ChainFamily::Svm => bs58::encode(bytes).into_string(),
        ChainFamily::Aptos | ChainFamily::Sui => format!("0x{}", hex::encode(bytes)),
        ChainFamily::Ton => {
            let workchain = i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
            format!("{}:{}", workchain, hex::encode(&bytes[4..]))
        }
    }
}

// ============================================================================
// Family Parsers
// ============================================================================

fn parse_move_address(text: &str, family: ChainFamily) -> Result<UniversalAddress> {
    let (account, module) = match text.split_once("::") {
        Some((account, module)) if !module.is_empty() => (account, Some(module)),
        Some(_) => return Err(invalid(family, text, "empty module name")),
        None => (text, None),
    };

    let digits = account
        .strip_prefix("0x")
        .or_else(|| account.strip_prefix("0X"))
        .unwrap_or(account);
    if digits.is_empty() {
        return Err(invalid(family, text, "empty address"));
    }
    if digits.len() > BYTES32_LENGTH * 2 {
        return Err(CcipError::InvalidAddressLength {
            family,
            expected: BYTES32_LENGTH,
            actual: digits.len().div_ceil(2),
            raw: text.to_string(),
        });
    }

    // Short forms such as `0x1` are left-padded
    let padded = format!("{:0>64}", digits);
    let raw = hex::decode(&padded).map_err(|e| invalid(family, text, e.to_string()))?;

    let mut address = UniversalAddress::from_bytes(&raw, family)?;
    if let Some(module) = module {
        address = address.with_module(module);
    }
    Ok(address)
}

fn parse_ton_address(text: &str) -> Result<UniversalAddress> {
    let family = ChainFamily::Ton;

    if let Some((workchain, hash)) = text.split_once(':') {
        let workchain: i32 = workchain
            .parse()
            .map_err(|_| invalid(family, text, "workchain must be an int32"))?;
        let hash = hex::decode(hash).map_err(|e| invalid(family, text, e.to_string()))?;
        if hash.len() != BYTES32_LENGTH {
            return Err(CcipError::InvalidAddressLength {
                family,
                expected: BYTES32_LENGTH,
                actual: hash.len(),
                raw: text.to_string(),
            });
        }
        let mut raw = workchain.to_be_bytes().to_vec();
        raw.extend_from_slice(&hash);
        return UniversalAddress::from_bytes(&raw, family);
    }

    if has_hex_prefix(text) {
        let raw = decode_hex(text, family)?;
        return UniversalAddress::from_bytes(&raw, family).map_err(|e| relabel(e, text));
    }

    // User-friendly form, base64 or base64url
    let decoded = URL_SAFE
        .decode(text)
        .or_else(|_| STANDARD.decode(text))
        .map_err(|e| invalid(family, text, e.to_string()))?;
    if decoded.len() != TON_FRIENDLY_LENGTH {
        return Err(CcipError::InvalidAddressLength {
            family,
            expected: TON_FRIENDLY_LENGTH,
            actual: decoded.len(),
            raw: text.to_string(),
        });
    }

    // 0x40 marks non-bounceable, 0x80 marks testnet-only
    if decoded[0] & 0x3f != TON_FRIENDLY_TAG {
        return Err(invalid(family, text, "unknown address tag"));
    }
    let checksum = u16::from_be_bytes([decoded[34], decoded[35]]);
    if crc16_xmodem(&decoded[..34]) != checksum {
        return Err(invalid(family, text, "checksum mismatch"));
    }

    let workchain = decoded[1] as i8 as i32;
    let mut raw = workchain.to_be_bytes().to_vec();
    raw.extend_from_slice(&decoded[2..34]);
    UniversalAddress::from_bytes(&raw, family)
}

/// CRC-16/XMODEM (poly 0x1021, init 0)
fn crc16_xmodem(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;
    for byte in data {
        crc ^= (*byte as u16) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ 0x1021
            } else {
                crc << 1
            };
        }
    }
    crc
}

// ============================================================================
// Helpers
// ============================================================================

fn has_hex_prefix(text: &str) -> bool {
    text.starts_with("0x") || text.starts_with("0X")
}

fn decode_hex(text: &str, family: ChainFamily) -> Result<Vec<u8>> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    hex::decode(digits).map_err(|e| invalid(family, text, e.to_string()))
}

fn invalid(family: ChainFamily, raw: &str, reason: impl Into<String>) -> CcipError {
    CcipError::InvalidAddress {
        family,
        raw: raw.to_string(),
        reason: reason.into(),
    }
}

/// Report the text the caller supplied rather than its decoded bytes
fn relabel(err: CcipError, text: &str) -> CcipError {
    match err {
        CcipError::InvalidAddressLength {
            family,
            expected,
            actual,
            ..
        } => CcipError::InvalidAddressLength {
            family,
            expected,
            actual,
            raw: text.to_string(),
        },
        CcipError::InvalidAddress { family, reason, .. } => CcipError::InvalidAddress {
            family,
            raw: text.to_string(),
            reason,
        },
        other => other,
    }
}
