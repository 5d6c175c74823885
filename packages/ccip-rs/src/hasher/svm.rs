//! Solana destinations
//!
//! The offRamp hashes the domain string itself (not its digest) with
//! little-endian selectors, and the message body is Borsh-serialized.

use alloy::primitives::B256;
use borsh::BorshSerialize;

use super::{body_mismatch, bytes32};
use crate::error::{CcipError, Result};
use crate::extra_args::ExtraArgs;
use crate::hash::{keccak256_concat, ANY_2_SVM_MESSAGE_HASH_PREFIX, LEAF_DOMAIN_SEPARATOR};
use crate::types::{Lane, Message, MessageBody};

#[derive(BorshSerialize)]
struct SvmTokenTransfer {
    source_pool_address: Vec<u8>,
    dest_token_address: [u8; 32],
    dest_gas_amount: u32,
    extra_data: Vec<u8>,
    /// little-endian u256
    amount: [u8; 32],
}

#[derive(BorshSerialize)]
struct Any2SvmLeafBody {
    message_id: [u8; 32],
    receiver: [u8; 32],
    token_receiver: [u8; 32],
    sequence_number: u64,
    compute_units: u32,
    account_is_writable_bitmap: u64,
    accounts: Vec<[u8; 32]>,
    nonce: u64,
    sender: Vec<u8>,
    data: Vec<u8>,
    token_amounts: Vec<SvmTokenTransfer>,
}

fn borsh_bytes<T: BorshSerialize>(value: &T) -> Result<Vec<u8>> {
    value
        .try_to_vec()
        .map_err(|e| CcipError::malformed(format!("borsh serialization failed: {}", e), ""))
}

pub(super) fn metadata_hash(lane: &Lane) -> B256 {
    let on_ramp = lane.on_ramp.to_cross_chain_bytes();
    let on_ramp_len = (on_ramp.len() as u32).to_le_bytes();
    let source = lane.source_chain_selector.to_le_bytes();
    let dest = lane.dest_chain_selector.to_le_bytes();
    keccak256_concat(&[
        ANY_2_SVM_MESSAGE_HASH_PREFIX,
        source.as_slice(),
        dest.as_slice(),
        on_ramp_len.as_slice(),
        on_ramp.as_slice(),
    ])
}

pub(super) fn leaf_hash(metadata_hash: B256, message: &Message) -> Result<B256> {
    let MessageBody::Ramp { token_amounts, .. } = &message.body else {
        return Err(body_mismatch(message));
    };

    let ExtraArgs::SvmV1 {
        compute_units,
        account_is_writable_bitmap,
        token_receiver,
        accounts,
        ..
    } = &message.extra_args
    else {
        return Err(CcipError::invalid_extra_args(format!(
            "Solana destination requires SVMExtraArgsV1, got {}",
            message.extra_args
        )));
    };

    let token_amounts = token_amounts
        .iter()
        .map(|t| {
            Ok(SvmTokenTransfer {
                source_pool_address: t.source_pool_address.to_cross_chain_bytes(),
                dest_token_address: bytes32(&t.dest_token_address)?,
                dest_gas_amount: t.dest_gas_amount,
                extra_data: t.extra_data.to_vec(),
                amount: t.amount.to_le_bytes::<32>(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let body = borsh_bytes(&Any2SvmLeafBody {
        message_id: message.header.message_id.0,
        receiver: bytes32(&message.receiver)?,
        token_receiver: token_receiver.0,
        sequence_number: message.header.sequence_number,
        compute_units: *compute_units,
        account_is_writable_bitmap: *account_is_writable_bitmap,
        accounts: accounts.iter().map(|a| a.0).collect(),
        nonce: message.header.nonce,
        sender: message.sender.to_cross_chain_bytes(),
        data: message.data.to_vec(),
        token_amounts,
    })?;

    Ok(keccak256_concat(&[
        LEAF_DOMAIN_SEPARATOR.as_slice(),
        metadata_hash.as_slice(),
        body.as_slice(),
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address_codec::UniversalAddress;
    use crate::hash::keccak256;
    use crate::types::{ChainFamily, MessageHeader, ProtocolVersion, TokenTransfer};
    use alloy::primitives::{Bytes, U256};

    fn lane() -> Lane {
        Lane::new(
            5009297550715157269,
            124615329519749607,
            UniversalAddress::parse("0x0bf3de8c5d3e8a2b34d2beeb17abfcebaf363a59", ChainFamily::Evm)
                .unwrap(),
            ProtocolVersion::V1_6,
        )
        .unwrap()
    }

    fn message() -> Message {
        Message {
            source_family: ChainFamily::Evm,
            dest_family: ChainFamily::Svm,
            version: ProtocolVersion::V1_6,
            header: MessageHeader {
                message_id: B256::repeat_byte(0x33),
                source_chain_selector: 5009297550715157269,
                dest_chain_selector: 124615329519749607,
                sequence_number: 9,
                nonce: 0,
            },
            sender: UniversalAddress::parse(
                "0xd8da6bf26964af9d7eed9e03e53415d37aa96045",
                ChainFamily::Evm,
            )
            .unwrap(),
            receiver: UniversalAddress::zero(ChainFamily::Svm),
            data: Bytes::from(vec![1u8, 2, 3]),
            fee_token: UniversalAddress::zero(ChainFamily::Evm),
            fee_token_amount: U256::ZERO,
            extra_args: ExtraArgs::SvmV1 {
                compute_units: 200_000,
                account_is_writable_bitmap: 1,
                allow_out_of_order_execution: true,
                token_receiver: B256::repeat_byte(0x44),
                accounts: vec![B256::repeat_byte(0x55)],
            },
            raw_extra_args: Bytes::new(),
            body: MessageBody::Ramp {
                fee_value_juels: U256::ZERO,
                token_amounts: vec![TokenTransfer {
                    source_pool_address: UniversalAddress::zero(ChainFamily::Evm),
                    dest_token_address: UniversalAddress::zero(ChainFamily::Svm),
                    dest_gas_amount: 0,
                    extra_data: Bytes::new(),
                    amount: U256::from(1u64),
                }],
            },
        }
    }

    #[test]
    fn test_metadata_layout() {
        let lane = lane();
        let mut preimage = b"Any2SVMMessageHashV1".to_vec();
        preimage.extend_from_slice(&5009297550715157269u64.to_le_bytes());
        preimage.extend_from_slice(&124615329519749607u64.to_le_bytes());
        preimage.extend_from_slice(&32u32.to_le_bytes());
        preimage.extend_from_slice(&lane.on_ramp.to_cross_chain_bytes());
        assert_eq!(metadata_hash(&lane), keccak256(&preimage));
    }

    #[test]
    fn test_leaf_depends_on_execution_args() {
        let meta = metadata_hash(&lane());
        let base = leaf_hash(meta, &message()).unwrap();
        assert_eq!(base, leaf_hash(meta, &message()).unwrap());

        let mut changed = message();
        if let ExtraArgs::SvmV1 { compute_units, .. } = &mut changed.extra_args {
            *compute_units += 1;
        }
        assert_ne!(base, leaf_hash(meta, &changed).unwrap());
    }

    #[test]
    fn test_requires_svm_extra_args() {
        let mut msg = message();
        msg.extra_args = ExtraArgs::EvmV1 {
            gas_limit: U256::ZERO,
        };
        let err = leaf_hash(B256::ZERO, &msg).unwrap_err();
        assert!(matches!(err, CcipError::InvalidExtraArgs { .. }));
    }
}
