//! Canonical types for cross-chain messages
//!
//! This module provides the chain family and protocol version tags, the lane
//! a message travels on, and the canonical [`Message`] every raw event is
//! normalized into.

use alloy::primitives::{Bytes, B256, U256};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::address_codec::UniversalAddress;
use crate::error::{CcipError, Result};
use crate::extra_args::ExtraArgs;
use crate::registry::ChainRegistry;

// ============================================================================
// Chain Family
// ============================================================================

/// Class of chains sharing address format, hashing domain and binary layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChainFamily {
    /// Account-based EVM chains
    Evm,
    /// Solana
    Svm,
    /// Move-based Aptos
    Aptos,
    /// Move-based Sui
    Sui,
    /// TON
    Ton,
}

impl ChainFamily {
    pub const ALL: [ChainFamily; 5] = [
        ChainFamily::Evm,
        ChainFamily::Svm,
        ChainFamily::Aptos,
        ChainFamily::Sui,
        ChainFamily::Ton,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChainFamily::Evm => "evm",
            ChainFamily::Svm => "svm",
            ChainFamily::Aptos => "aptos",
            ChainFamily::Sui => "sui",
            ChainFamily::Ton => "ton",
        }
    }

    /// Whether this family uses Move conventions (BCS, module-qualified addresses)
    pub fn is_move(&self) -> bool {
        matches!(self, ChainFamily::Aptos | ChainFamily::Sui)
    }
}

impl fmt::Display for ChainFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ChainFamily {
    type Err = CcipError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "evm" | "ethereum" => Ok(ChainFamily::Evm),
            "svm" | "solana" => Ok(ChainFamily::Svm),
            "aptos" => Ok(ChainFamily::Aptos),
            "sui" => Ok(ChainFamily::Sui),
            "ton" => Ok(ChainFamily::Ton),
            _ => Err(CcipError::UnsupportedFamily {
                name: s.to_string(),
            }),
        }
    }
}

impl Serialize for ChainFamily {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ChainFamily {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Protocol Version
// ============================================================================

/// Message schema generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProtocolVersion {
    V1_2,
    V1_5,
    V1_6,
}

impl ProtocolVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProtocolVersion::V1_2 => "1.2.0",
            ProtocolVersion::V1_5 => "1.5.0",
            ProtocolVersion::V1_6 => "1.6.0",
        }
    }

    /// Pre-1.6 flat `EVM2EVMMessage` schema
    pub fn is_legacy(&self) -> bool {
        *self < ProtocolVersion::V1_6
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProtocolVersion {
    type Err = CcipError;

    /// Accepts `1.5`, `1.5.0`, `1.6.0-dev` or a full `typeAndVersion`
    /// string such as `EVM2EVMOnRamp 1.5.0`.
    fn from_str(s: &str) -> Result<Self> {
        let version = s.split_whitespace().last().unwrap_or_default();
        let version = version.split('-').next().unwrap_or_default();
        let mut parts = version.split('.');
        let major = parts.next().unwrap_or_default();
        let minor = parts.next().unwrap_or_default();

        match (major, minor) {
            ("1", "2") => Ok(ProtocolVersion::V1_2),
            ("1", "5") => Ok(ProtocolVersion::V1_5),
            ("1", "6") => Ok(ProtocolVersion::V1_6),
            _ => Err(CcipError::InvalidProtocolVersion { raw: s.to_string() }),
        }
    }
}

// ============================================================================
// Lane
// ============================================================================

/// Directed (source, destination, onRamp) triple plus protocol version
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Lane {
    pub source_chain_selector: u64,
    pub dest_chain_selector: u64,
    pub on_ramp: UniversalAddress,
    pub version: ProtocolVersion,
}

impl Lane {
    pub fn new(
        source_chain_selector: u64,
        dest_chain_selector: u64,
        on_ramp: UniversalAddress,
        version: ProtocolVersion,
    ) -> Result<Self> {
        if source_chain_selector == dest_chain_selector {
            return Err(CcipError::InvalidLane {
                selector: source_chain_selector,
            });
        }
        Ok(Self {
            source_chain_selector,
            dest_chain_selector,
            on_ramp,
            version,
        })
    }

    /// Build a lane from a textual onRamp, parsed in the source chain's family
    pub fn resolve(
        registry: &ChainRegistry,
        source_chain_selector: u64,
        dest_chain_selector: u64,
        on_ramp: &str,
        version: ProtocolVersion,
    ) -> Result<Self> {
        let family = registry.family_of(source_chain_selector)?;
        registry.family_of(dest_chain_selector)?;
        let on_ramp = UniversalAddress::parse(on_ramp, family)?;
        Self::new(source_chain_selector, dest_chain_selector, on_ramp, version)
    }
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} via {} (v{})",
            self.source_chain_selector, self.dest_chain_selector, self.on_ramp, self.version
        )
    }
}

// ============================================================================
// Message
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHeader {
    pub message_id: B256,
    pub source_chain_selector: u64,
    pub dest_chain_selector: u64,
    pub sequence_number: u64,
    pub nonce: u64,
}

/// Pre-1.6 token amount; `token` lives on the source chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyTokenAmount {
    pub token: UniversalAddress,
    pub amount: U256,
}

/// 1.6 token transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenTransfer {
    /// Pool on the source chain
    pub source_pool_address: UniversalAddress,
    /// Token on the destination chain
    pub dest_token_address: UniversalAddress,
    pub dest_gas_amount: u32,
    pub extra_data: Bytes,
    pub amount: U256,
}

/// Version-specific part of a [`Message`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageBody {
    /// `EVM2EVMMessage` (1.2 / 1.5)
    Legacy {
        strict: bool,
        gas_limit: U256,
        token_amounts: Vec<LegacyTokenAmount>,
        source_token_data: Vec<Bytes>,
    },
    /// Ramp message (1.6)
    Ramp {
        fee_value_juels: U256,
        token_amounts: Vec<TokenTransfer>,
    },
}

/// Canonical message, tagged by source family and protocol version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub source_family: ChainFamily,
    pub dest_family: ChainFamily,
    pub version: ProtocolVersion,
    pub header: MessageHeader,
    /// Sender on the source chain
    pub sender: UniversalAddress,
    /// Receiver on the destination chain
    pub receiver: UniversalAddress,
    pub data: Bytes,
    pub fee_token: UniversalAddress,
    pub fee_token_amount: U256,
    /// Decoded (or, for legacy messages, synthesized) execution arguments
    pub extra_args: ExtraArgs,
    /// Extra args exactly as carried by the event; empty for legacy messages
    pub raw_extra_args: Bytes,
    pub body: MessageBody,
}

impl Message {
    pub fn message_id(&self) -> B256 {
        self.header.message_id
    }

    pub fn sequence_number(&self) -> u64 {
        self.header.sequence_number
    }

    /// Execution gas (or compute units) requested on the destination
    pub fn gas_limit(&self) -> U256 {
        match &self.body {
            MessageBody::Legacy { gas_limit, .. } => *gas_limit,
            MessageBody::Ramp { .. } => self.extra_args.gas_limit(),
        }
    }

    pub fn allow_out_of_order_execution(&self) -> bool {
        self.extra_args.allow_out_of_order_execution()
    }

    pub fn fee_value_juels(&self) -> Option<U256> {
        match &self.body {
            MessageBody::Ramp {
                fee_value_juels, ..
            } => Some(*fee_value_juels),
            MessageBody::Legacy { .. } => None,
        }
    }

    /// Legacy token amounts, `None` for 1.6 messages
    pub fn legacy_token_amounts(&self) -> Option<&[LegacyTokenAmount]> {
        match &self.body {
            MessageBody::Legacy { token_amounts, .. } => Some(token_amounts),
            MessageBody::Ramp { .. } => None,
        }
    }

    /// 1.6 token transfers, `None` for legacy messages
    pub fn token_transfers(&self) -> Option<&[TokenTransfer]> {
        match &self.body {
            MessageBody::Ramp { token_amounts, .. } => Some(token_amounts),
            MessageBody::Legacy { .. } => None,
        }
    }

    pub fn has_tokens(&self) -> bool {
        match &self.body {
            MessageBody::Legacy { token_amounts, .. } => !token_amounts.is_empty(),
            MessageBody::Ramp { token_amounts, .. } => !token_amounts.is_empty(),
        }
    }
}

// ============================================================================
// Proof Bundle
// ============================================================================

/// Messages to execute together with their multiproof
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofBundle {
    /// Proven messages, in sequence-number order
    pub messages: Vec<Message>,
    pub proofs: Vec<B256>,
    pub proof_flag_bits: U256,
    pub merkle_root: B256,
}
