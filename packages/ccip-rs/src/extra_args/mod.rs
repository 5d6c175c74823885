//! Tagged codec for extra execution arguments
//!
//! Every variant is identified on the wire by a 4-byte tag. The payload that
//! follows the tag is laid out by the *origin* chain family of the message:
//!
//! - `evm_abi` - ABI encoding of the struct (`abi.encode(args)`), EVM origins
//! - `svm_borsh` - Borsh, Solana origins
//! - `move_bcs` - BCS, Aptos and Sui origins
//!
//! Decoding never needs to be told the origin: the fixed-size
//! `EVMExtraArgs` layouts are told apart by length, and the variable-size
//! variants are accepted from whichever layout re-encodes to the same bytes.
//!
//! ## Wire Sizes for EVMExtraArgsV2
//!
//! | Origin | Layout | Size |
//! |--------|--------|------|
//! | EVM    | tag + `uint256` + `bool` ABI words | 68 |
//! | Solana | tag + `u128` LE + `u8` | 21 |
//! | Move   | tag + `u256` LE + `u8` | 37 |

mod evm_abi;
mod input;
mod move_bcs;
mod svm_borsh;

pub use input::{prepare_message_args, ExtraArgsInput, PreparedMessageArgs};

use alloy::primitives::{Bytes, B256, U256};
use std::fmt;

use crate::error::{CcipError, Result};
use crate::types::ChainFamily;

// ============================================================================
// Tags
// ============================================================================

/// `bytes4(keccak256("CCIP EVMExtraArgsV1"))`
pub const EVM_EXTRA_ARGS_V1_TAG: [u8; 4] = [0x97, 0xa6, 0x57, 0xc9];

/// `bytes4(keccak256("CCIP EVMExtraArgsV2"))`
pub const EVM_EXTRA_ARGS_V2_TAG: [u8; 4] = [0x18, 0x1d, 0xcf, 0x10];

/// `bytes4(keccak256("CCIP SVMExtraArgsV1"))`
pub const SVM_EXTRA_ARGS_V1_TAG: [u8; 4] = [0x1f, 0x3b, 0x3a, 0xba];

/// `bytes4(keccak256("CCIP SuiExtraArgsV1"))`
pub const SUI_EXTRA_ARGS_V1_TAG: [u8; 4] = [0x21, 0xea, 0x4c, 0xa9];

/// `bytes4(keccak256("CCIP GenericExtraArgsV3"))`
pub const GENERIC_EXTRA_ARGS_V3_TAG: [u8; 4] = [0xa6, 0x9d, 0xd4, 0xaa];

/// Gas limit applied when a message carries data but no explicit limit
pub const DEFAULT_GAS_LIMIT: u64 = 200_000;

// ============================================================================
// Logical Variants
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtraArgs {
    EvmV1 {
        gas_limit: U256,
    },
    EvmV2 {
        gas_limit: U256,
        allow_out_of_order_execution: bool,
    },
    SvmV1 {
        compute_units: u32,
        account_is_writable_bitmap: u64,
        allow_out_of_order_execution: bool,
        token_receiver: B256,
        accounts: Vec<B256>,
    },
    SuiV1 {
        gas_limit: u64,
        allow_out_of_order_execution: bool,
        token_receiver: B256,
        receiver_object_ids: Vec<B256>,
    },
    GenericV3 {
        gas_limit: u32,
        block_confirmations: u16,
        executor: Bytes,
        executor_args: Bytes,
        ccvs: Vec<Bytes>,
        ccv_args: Vec<Bytes>,
        token_receiver: Bytes,
        token_args: Bytes,
    },
}

impl ExtraArgs {
    pub fn tag(&self) -> [u8; 4] {
        match self {
            ExtraArgs::EvmV1 { .. } => EVM_EXTRA_ARGS_V1_TAG,
            ExtraArgs::EvmV2 { .. } => EVM_EXTRA_ARGS_V2_TAG,
            ExtraArgs::SvmV1 { .. } => SVM_EXTRA_ARGS_V1_TAG,
            ExtraArgs::SuiV1 { .. } => SUI_EXTRA_ARGS_V1_TAG,
            ExtraArgs::GenericV3 { .. } => GENERIC_EXTRA_ARGS_V3_TAG,
        }
    }

    pub fn variant_name(&self) -> &'static str {
        match self {
            ExtraArgs::EvmV1 { .. } => "EVMExtraArgsV1",
            ExtraArgs::EvmV2 { .. } => "EVMExtraArgsV2",
            ExtraArgs::SvmV1 { .. } => "SVMExtraArgsV1",
            ExtraArgs::SuiV1 { .. } => "SuiExtraArgsV1",
            ExtraArgs::GenericV3 { .. } => "GenericExtraArgsV3",
        }
    }

    /// Gas limit, or compute units for Solana destinations
    pub fn gas_limit(&self) -> U256 {
        match self {
            ExtraArgs::EvmV1 { gas_limit } | ExtraArgs::EvmV2 { gas_limit, .. } => *gas_limit,
            ExtraArgs::SvmV1 { compute_units, .. } => U256::from(*compute_units),
            ExtraArgs::SuiV1 { gas_limit, .. } => U256::from(*gas_limit),
            ExtraArgs::GenericV3 { gas_limit, .. } => U256::from(*gas_limit),
        }
    }

    /// V1 predates out-of-order execution; V3 has no ordering flag and is
    /// always executed out of order
    pub fn allow_out_of_order_execution(&self) -> bool {
        match self {
            ExtraArgs::EvmV1 { .. } => false,
            ExtraArgs::EvmV2 {
                allow_out_of_order_execution,
                ..
            }
            | ExtraArgs::SvmV1 {
                allow_out_of_order_execution,
                ..
            }
            | ExtraArgs::SuiV1 {
                allow_out_of_order_execution,
                ..
            } => *allow_out_of_order_execution,
            ExtraArgs::GenericV3 { .. } => true,
        }
    }

    /// Token receiver override, if the variant has one and it is set
    pub fn token_receiver(&self) -> Option<Vec<u8>> {
        match self {
            ExtraArgs::SvmV1 { token_receiver, .. } | ExtraArgs::SuiV1 { token_receiver, .. }
                if !token_receiver.is_zero() =>
            {
                Some(token_receiver.to_vec())
            }
            ExtraArgs::GenericV3 { token_receiver, .. } if !token_receiver.is_empty() => {
                Some(token_receiver.to_vec())
            }
            _ => None,
        }
    }
}

impl fmt::Display for ExtraArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.variant_name())
    }
}

// ============================================================================
// Wire Layouts
// ============================================================================

/// Byte layout of the payload after the tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireLayout {
    Abi,
    Borsh,
    Bcs,
}

impl WireLayout {
    /// Layout used by messages originating on `family`
    pub fn for_origin(family: ChainFamily) -> Option<Self> {
        match family {
            ChainFamily::Evm => Some(WireLayout::Abi),
            ChainFamily::Svm => Some(WireLayout::Borsh),
            ChainFamily::Aptos | ChainFamily::Sui => Some(WireLayout::Bcs),
            ChainFamily::Ton => None,
        }
    }

    fn encode_body(&self, args: &ExtraArgs, origin: ChainFamily) -> Result<Vec<u8>> {
        match self {
            WireLayout::Abi => Ok(evm_abi::encode_body(args)),
            WireLayout::Borsh => svm_borsh::encode_body(args, origin),
            WireLayout::Bcs => move_bcs::encode_body(args, origin),
        }
    }

    fn decode_body(&self, tag: [u8; 4], body: &[u8]) -> Option<ExtraArgs> {
        match self {
            WireLayout::Abi => evm_abi::decode_body(tag, body),
            WireLayout::Borsh => svm_borsh::decode_body(tag, body),
            WireLayout::Bcs => move_bcs::decode_body(tag, body),
        }
    }

    fn origin(&self) -> ChainFamily {
        match self {
            WireLayout::Abi => ChainFamily::Evm,
            WireLayout::Borsh => ChainFamily::Svm,
            WireLayout::Bcs => ChainFamily::Aptos,
        }
    }
}

// ============================================================================
// Codec
// ============================================================================

/// Encode `args` the way a message originating on `origin` carries them
pub fn encode_extra_args(args: &ExtraArgs, origin: ChainFamily) -> Result<Bytes> {
    let layout =
        WireLayout::for_origin(origin).ok_or(CcipError::UnsupportedVariantForFamily {
            variant: args.variant_name(),
            family: origin,
        })?;

    let body = layout.encode_body(args, origin)?;
    let mut out = Vec::with_capacity(4 + body.len());
    out.extend_from_slice(&args.tag());
    out.extend_from_slice(&body);
    Ok(Bytes::from(out))
}

/// Decode tagged extra args produced by any origin
///
/// Returns `None` for empty input, unknown tags or payloads that match no
/// layout.
pub fn decode_extra_args(bytes: &[u8]) -> Option<ExtraArgs> {
    decode_extra_args_with_layout(bytes).map(|(args, _)| args)
}

/// Like [`decode_extra_args`], also reporting which layout matched
pub fn decode_extra_args_with_layout(bytes: &[u8]) -> Option<(ExtraArgs, WireLayout)> {
    if bytes.len() < 4 {
        return None;
    }
    let mut tag = [0u8; 4];
    tag.copy_from_slice(&bytes[..4]);
    let body = &bytes[4..];

    let candidates: &[WireLayout] = match tag {
        EVM_EXTRA_ARGS_V1_TAG => match bytes.len() {
            36 => &[WireLayout::Abi],
            _ => &[],
        },
        EVM_EXTRA_ARGS_V2_TAG => match bytes.len() {
            68 => &[WireLayout::Abi],
            21 => &[WireLayout::Borsh],
            37 => &[WireLayout::Bcs],
            _ => &[],
        },
        SVM_EXTRA_ARGS_V1_TAG | SUI_EXTRA_ARGS_V1_TAG | GENERIC_EXTRA_ARGS_V3_TAG => {
            &[WireLayout::Abi, WireLayout::Borsh, WireLayout::Bcs]
        }
        _ => &[],
    };

    for layout in candidates {
        let Some(args) = layout.decode_body(tag, body) else {
            continue;
        };
        // Only accept a layout that reproduces the exact payload
        match layout.encode_body(&args, layout.origin()) {
            Ok(reencoded) if reencoded == body => {
                tracing::debug!(
                    variant = args.variant_name(),
                    layout = ?layout,
                    len = bytes.len(),
                    "Decoded extra args"
                );
                return Some((args, *layout));
            }
            _ => continue,
        }
    }

    tracing::debug!(
        tag = %hex::encode(tag),
        len = bytes.len(),
        "Extra args match no known layout"
    );
    None
}
