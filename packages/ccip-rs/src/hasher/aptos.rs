//! Aptos destinations
//!
//! Move offRamps serialize with BCS and hash variable-length fields
//! separately before the final leaf hash. The metadata and token transfer
//! helpers are shared with the Sui hasher.

use alloy::primitives::B256;

use super::{body_mismatch, bytes32};
use crate::bcs::BcsWriter;
use crate::error::Result;
use crate::hash::{keccak256, keccak256_concat, ANY_2_APTOS_MESSAGE_HASH, LEAF_DOMAIN_SEPARATOR};
use crate::types::{Lane, Message, MessageBody, TokenTransfer};

/// `keccak256(domain ++ bcs(source) ++ bcs(dest) ++ keccak256(onRamp))`
pub(super) fn move_metadata_hash(domain: B256, lane: &Lane) -> B256 {
    let mut w = BcsWriter::with_capacity(32 + 8 + 8 + 32);
    w.write_fixed(domain.as_slice())
        .write_u64(lane.source_chain_selector)
        .write_u64(lane.dest_chain_selector)
        .write_fixed(keccak256(lane.on_ramp.to_cross_chain_bytes()).as_slice());
    keccak256(w.into_bytes())
}

/// keccak256 of the BCS vector of token transfers, in message order
pub(super) fn token_transfers_hash(transfers: &[TokenTransfer]) -> Result<B256> {
    let mut w = BcsWriter::new();
    w.write_length(transfers.len());
    for t in transfers {
        w.write_bytes(&t.source_pool_address.to_cross_chain_bytes())
            .write_fixed(&bytes32(&t.dest_token_address)?)
            .write_u32(t.dest_gas_amount)
            .write_bytes(&t.extra_data)
            .write_u256(t.amount);
    }
    Ok(keccak256(w.into_bytes()))
}

pub(super) fn metadata_hash(lane: &Lane) -> B256 {
    move_metadata_hash(ANY_2_APTOS_MESSAGE_HASH, lane)
}

pub(super) fn leaf_hash(metadata_hash: B256, message: &Message) -> Result<B256> {
    let MessageBody::Ramp { token_amounts, .. } = &message.body else {
        return Err(body_mismatch(message));
    };

    let mut header = BcsWriter::new();
    header
        .write_fixed(message.header.message_id.as_slice())
        .write_fixed(&bytes32(&message.receiver)?)
        .write_u64(message.header.sequence_number)
        .write_u256(message.gas_limit())
        .write_u64(message.header.nonce);

    Ok(keccak256_concat(&[
        LEAF_DOMAIN_SEPARATOR.as_slice(),
        metadata_hash.as_slice(),
        keccak256(header.into_bytes()).as_slice(),
        keccak256(message.sender.to_cross_chain_bytes()).as_slice(),
        keccak256(&message.data).as_slice(),
        token_transfers_hash(token_amounts)?.as_slice(),
    ]))
}
