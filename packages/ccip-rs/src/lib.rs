//! CCIP-RS: Cross-Chain Message Protocol Core
//!
//! This crate reproduces, off-chain, what destination contracts compute for
//! cross-chain messages sent between EVM, Solana, Aptos, Sui and TON chains:
//!
//! - **Address Codec** - Chain-family-aware canonical bytes and display forms
//! - **ExtraArgs Codec** - Tagged execution arguments, one wire layout per origin family
//! - **Message Normalizer** - Decoded events of every schema generation into one [`Message`]
//! - **Leaf Hasher** - Per-destination leaf hashes, equal to what the offRamp computes
//! - **Merkle** - Commit tree, root verification and flag-bit multiproofs
//! - **Registry** - Injected chain-selector table
//!
//! Everything here is synchronous and pure: inputs are already-fetched
//! events, outputs are values or a [`CcipError`]. Nothing is retried.
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! ccip-rs = { path = "../ccip-rs" }
//! ```
//!
//! ```ignore
//! let registry = ChainRegistry::from_env()?;
//! let lane = Lane::resolve(&registry, source, dest, on_ramp, ProtocolVersion::V1_6)?;
//! let batch = normalize_messages(&registry, &events, &lane)?;
//! let bundle = compute_proof(&registry, &lane, &batch, message_id, Some(root))?;
//! ```

pub mod address_codec;
pub mod bcs;
pub mod error;
pub mod extra_args;
pub mod hash;
pub mod hasher;
pub mod merkle;
pub mod normalizer;
pub mod registry;
pub mod types;

mod json;

// Re-export commonly used items at the crate root
pub use address_codec::{to_canonical_bytes, to_display_address, AddressInput, UniversalAddress};
pub use error::{CcipError, ErrorKind, Result};
pub use extra_args::{
    decode_extra_args, encode_extra_args, prepare_message_args, ExtraArgs, ExtraArgsInput,
    PreparedMessageArgs, WireLayout,
};
pub use hash::{bytes32_to_hex, keccak256};
pub use json::RawAddress;
pub use hasher::{leaf_hash, metadata_hash, verify_message_id, LeafScheme};
pub use merkle::{compute_multi_proof, compute_proof, verify_multi_proof, MerkleTree, MultiProof};
pub use normalizer::{normalize_message, normalize_messages, RawMessage};
pub use registry::{ChainInfo, ChainRegistry};
pub use types::{
    ChainFamily, Lane, LegacyTokenAmount, Message, MessageBody, MessageHeader, ProofBundle,
    ProtocolVersion, TokenTransfer,
};
