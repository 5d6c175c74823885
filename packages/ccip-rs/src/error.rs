//! Error taxonomy for the message protocol core
//!
//! Every fallible core operation returns [`CcipError`]. Variants fall into
//! three classes (see [`ErrorKind`]):
//!
//! - **Input shape**: the caller handed over a value this core cannot read.
//! - **Consistency**: the supplied batch or expectation disagrees with the
//!   recomputed cryptographic result.
//! - **Configuration**: the registry or hashing coverage has a gap.
//!
//! Nothing in this crate retries; all errors are returned to the caller.

use alloy::primitives::B256;
use thiserror::Error;

use crate::types::{ChainFamily, ProtocolVersion};

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, CcipError>;

/// Broad classification of a [`CcipError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Caller-supplied value could not be interpreted
    InputShape,
    /// Supplied batch or expectation disagrees with the recomputed values
    Consistency,
    /// Registry or version coverage gap
    Configuration,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CcipError {
    // ========================================================================
    // Input Shape Errors
    // ========================================================================
    #[error("Malformed log: {reason} (raw: {raw})")]
    MalformedLog { reason: String, raw: String },

    #[error("Invalid {family} address length: expected {expected} bytes, got {actual} ({raw})")]
    InvalidAddressLength {
        family: ChainFamily,
        expected: usize,
        actual: usize,
        raw: String,
    },

    #[error("Invalid {family} address {raw}: {reason}")]
    InvalidAddress {
        family: ChainFamily,
        raw: String,
        reason: String,
    },

    #[error("Unsupported chain family: {name}")]
    UnsupportedFamily { name: String },

    #[error("{variant} cannot be encoded for messages originating on {family}")]
    UnsupportedVariantForFamily {
        variant: &'static str,
        family: ChainFamily,
    },

    #[error("Invalid extra args: {reason}")]
    InvalidExtraArgs { reason: String },

    #[error("Invalid lane: source and destination selector are both {selector}")]
    InvalidLane { selector: u64 },

    #[error("Unsupported protocol version: {raw}")]
    InvalidProtocolVersion { raw: String },

    // ========================================================================
    // Consistency Errors
    // ========================================================================
    #[error("Merkle root mismatch: expected {expected}, computed {computed}")]
    MerkleRootMismatch { expected: B256, computed: B256 },

    #[error("Message {message_id} is not in the batch")]
    MessageIdNotInBatch { message_id: B256 },

    #[error(
        "Incomplete batch for [{min_seq_nr}, {max_seq_nr}]: expected {expected} messages, found {found}"
    )]
    IncompleteBatch {
        min_seq_nr: u64,
        max_seq_nr: u64,
        expected: u64,
        found: u64,
    },

    #[error("Batch contains no messages for the lane")]
    EmptyBatch,

    #[error("Message id mismatch at sequence number {sequence_number}: declared {declared}, computed {computed}")]
    MessageIdMismatch {
        sequence_number: u64,
        declared: B256,
        computed: B256,
    },

    #[error("Invalid proof: {reason}")]
    InvalidProof { reason: String },

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    #[error("Unknown chain selector: {selector}")]
    UnknownChainSelector { selector: u64 },

    #[error("No leaf hasher for {family} destination at version {version}")]
    UnsupportedVersionForHasher {
        family: ChainFamily,
        version: ProtocolVersion,
    },

    #[error("Invalid chain registry: {reason}")]
    InvalidRegistry { reason: String },
}

impl CcipError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            CcipError::MalformedLog { .. }
            | CcipError::InvalidAddressLength { .. }
            | CcipError::InvalidAddress { .. }
            | CcipError::UnsupportedFamily { .. }
            | CcipError::UnsupportedVariantForFamily { .. }
            | CcipError::InvalidExtraArgs { .. }
            | CcipError::InvalidLane { .. }
            | CcipError::InvalidProtocolVersion { .. } => ErrorKind::InputShape,

            CcipError::MerkleRootMismatch { .. }
            | CcipError::MessageIdNotInBatch { .. }
            | CcipError::IncompleteBatch { .. }
            | CcipError::EmptyBatch
            | CcipError::MessageIdMismatch { .. }
            | CcipError::InvalidProof { .. } => ErrorKind::Consistency,

            CcipError::UnknownChainSelector { .. }
            | CcipError::UnsupportedVersionForHasher { .. }
            | CcipError::InvalidRegistry { .. } => ErrorKind::Configuration,
        }
    }

    pub(crate) fn malformed(reason: impl Into<String>, raw: impl Into<String>) -> Self {
        CcipError::MalformedLog {
            reason: reason.into(),
            raw: raw.into(),
        }
    }

    pub(crate) fn invalid_extra_args(reason: impl Into<String>) -> Self {
        CcipError::InvalidExtraArgs {
            reason: reason.into(),
        }
    }
}
