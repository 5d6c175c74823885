//! Sui destinations
//!
//! Same layout as Aptos, plus the token receiver in the header and the
//! receiver object ids appended to the leaf preimage. Both come from
//! `SuiExtraArgsV1`; other variants hash a zero receiver and no objects.

use alloy::primitives::B256;

use super::aptos::{move_metadata_hash, token_transfers_hash};
use super::{body_mismatch, bytes32};
use crate::bcs::BcsWriter;
use crate::error::Result;
use crate::extra_args::ExtraArgs;
use crate::hash::{keccak256, keccak256_concat, ANY_2_SUI_MESSAGE_HASH, LEAF_DOMAIN_SEPARATOR};
use crate::types::{Lane, Message, MessageBody};

pub(super) fn metadata_hash(lane: &Lane) -> B256 {
    move_metadata_hash(ANY_2_SUI_MESSAGE_HASH, lane)
}

pub(super) fn leaf_hash(metadata_hash: B256, message: &Message) -> Result<B256> {
    let MessageBody::Ramp { token_amounts, .. } = &message.body else {
        return Err(body_mismatch(message));
    };

    let (token_receiver, receiver_object_ids) = match &message.extra_args {
        ExtraArgs::SuiV1 {
            token_receiver,
            receiver_object_ids,
            ..
        } => (*token_receiver, receiver_object_ids.as_slice()),
        _ => (B256::ZERO, &[][..]),
    };

    let mut header = BcsWriter::new();
    header
        .write_fixed(message.header.message_id.as_slice())
        .write_fixed(&bytes32(&message.receiver)?)
        .write_fixed(token_receiver.as_slice())
        .write_u64(message.header.sequence_number)
        .write_u256(message.gas_limit())
        .write_u64(message.header.nonce);

    let mut objects = BcsWriter::new();
    objects.write_addresses(receiver_object_ids);

    Ok(keccak256_concat(&[
        LEAF_DOMAIN_SEPARATOR.as_slice(),
        metadata_hash.as_slice(),
        keccak256(header.into_bytes()).as_slice(),
        keccak256(message.sender.to_cross_chain_bytes()).as_slice(),
        keccak256(&message.data).as_slice(),
        token_transfers_hash(token_amounts)?.as_slice(),
        keccak256(objects.into_bytes()).as_slice(),
    ]))
}
