//! EVM destinations
//!
//! 1.2 / 1.5 lanes hash the flat `EVM2EVMMessage`; 1.6 lanes hash the
//! `Any2EVMRampMessage`. Both pack every field as ABI words.

use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::sol;
use alloy::sol_types::SolValue;

use super::body_mismatch;
use crate::address_codec::UniversalAddress;
use crate::error::{CcipError, Result};
use crate::hash::{keccak256, ANY_2_EVM_MESSAGE_HASH, EVM_2_EVM_MESSAGE_HASH, LEAF_DOMAIN_SEPARATOR};
use crate::types::{ChainFamily, Lane, Message, MessageBody};

sol! {
    struct EVMTokenAmount {
        address token;
        uint256 amount;
    }

    struct Any2EVMTokenTransfer {
        bytes sourcePoolAddress;
        address destTokenAddress;
        uint32 destGasAmount;
        bytes extraData;
        uint256 amount;
    }
}

fn evm_address(address: &UniversalAddress) -> Result<Address> {
    address.evm_address().ok_or_else(|| CcipError::InvalidAddress {
        family: ChainFamily::Evm,
        raw: address.to_string(),
        reason: format!("{} address where an EVM address is required", address.family()),
    })
}

// ============================================================================
// EVM2EVMMessageHashV2 (1.2 / 1.5)
// ============================================================================

pub(super) fn legacy_metadata_hash(lane: &Lane) -> Result<B256> {
    let on_ramp = evm_address(&lane.on_ramp)?;
    Ok(keccak256(
        (
            EVM_2_EVM_MESSAGE_HASH,
            lane.source_chain_selector,
            lane.dest_chain_selector,
            on_ramp,
        )
            .abi_encode(),
    ))
}

pub(super) fn legacy_leaf_hash(metadata_hash: B256, message: &Message) -> Result<B256> {
    let MessageBody::Legacy {
        strict,
        gas_limit,
        token_amounts,
        source_token_data,
    } = &message.body
    else {
        return Err(body_mismatch(message));
    };

    let fixed = keccak256(
        (
            evm_address(&message.sender)?,
            evm_address(&message.receiver)?,
            message.header.sequence_number,
            *gas_limit,
            *strict,
            message.header.nonce,
            evm_address(&message.fee_token)?,
            message.fee_token_amount,
        )
            .abi_encode(),
    );

    let token_amounts = token_amounts
        .iter()
        .map(|t| {
            Ok(EVMTokenAmount {
                token: evm_address(&t.token)?,
                amount: t.amount,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(keccak256(
        (
            LEAF_DOMAIN_SEPARATOR,
            metadata_hash,
            fixed,
            keccak256(&message.data),
            keccak256(token_amounts.abi_encode()),
            keccak256(source_token_data.abi_encode()),
        )
            .abi_encode(),
    ))
}

// ============================================================================
// Any2EVMMessageHashV1 (1.6)
// ============================================================================

pub(super) fn metadata_hash(lane: &Lane) -> B256 {
    keccak256(
        (
            ANY_2_EVM_MESSAGE_HASH,
            lane.source_chain_selector,
            lane.dest_chain_selector,
            keccak256(lane.on_ramp.to_cross_chain_bytes()),
        )
            .abi_encode(),
    )
}

pub(super) fn leaf_hash(metadata_hash: B256, message: &Message) -> Result<B256> {
    let MessageBody::Ramp { token_amounts, .. } = &message.body else {
        return Err(body_mismatch(message));
    };

    let header = keccak256(
        (
            message.header.message_id,
            evm_address(&message.receiver)?,
            message.header.sequence_number,
            message.gas_limit(),
            message.header.nonce,
        )
            .abi_encode(),
    );

    let transfers = token_amounts
        .iter()
        .map(|t| {
            Ok(Any2EVMTokenTransfer {
                sourcePoolAddress: Bytes::from(t.source_pool_address.to_cross_chain_bytes()),
                destTokenAddress: evm_address(&t.dest_token_address)?,
                destGasAmount: t.dest_gas_amount,
                extraData: t.extra_data.clone(),
                amount: t.amount,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(keccak256(
        (
            LEAF_DOMAIN_SEPARATOR,
            metadata_hash,
            header,
            keccak256(message.sender.to_cross_chain_bytes()),
            keccak256(&message.data),
            keccak256(transfers.abi_encode()),
        )
            .abi_encode(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extra_args::ExtraArgs;
    use crate::types::{LegacyTokenAmount, MessageHeader, ProtocolVersion};
    use alloy::primitives::b256;

    fn lane() -> Lane {
        Lane::new(
            5009297550715157269,
            4949039107694359620,
            UniversalAddress::parse("0x0bf3de8c5d3e8a2b34d2beeb17abfcebaf363a59", ChainFamily::Evm)
                .unwrap(),
            ProtocolVersion::V1_5,
        )
        .unwrap()
    }

    fn evm(text: &str) -> UniversalAddress {
        UniversalAddress::parse(text, ChainFamily::Evm).unwrap()
    }

    fn message(token_amounts: Vec<LegacyTokenAmount>, source_token_data: Vec<Bytes>) -> Message {
        Message {
            source_family: ChainFamily::Evm,
            dest_family: ChainFamily::Evm,
            version: ProtocolVersion::V1_5,
            header: MessageHeader {
                message_id: B256::ZERO,
                source_chain_selector: 5009297550715157269,
                dest_chain_selector: 4949039107694359620,
                sequence_number: 1,
                nonce: 1,
            },
            sender: evm("0xd8da6bf26964af9d7eed9e03e53415d37aa96045"),
            receiver: evm("0x5fbdb2315678afecb367f032d93f642f64180aa3"),
            data: Bytes::new(),
            fee_token: evm("0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2"),
            fee_token_amount: U256::from(1_000_000_000_000_000u64),
            extra_args: ExtraArgs::EvmV2 {
                gas_limit: U256::from(200_000u64),
                allow_out_of_order_execution: false,
            },
            raw_extra_args: Bytes::new(),
            body: MessageBody::Legacy {
                strict: false,
                gas_limit: U256::from(200_000u64),
                token_amounts,
                source_token_data,
            },
        }
    }

    #[test]
    fn test_legacy_metadata_hash() {
        assert_eq!(
            legacy_metadata_hash(&lane()).unwrap(),
            b256!("1f2220d4f9f13806372f3ea33f7373b5539c4c830deec65718397940da2ad8c4")
        );
    }

    #[test]
    fn test_legacy_leaf_hash() {
        let meta = legacy_metadata_hash(&lane()).unwrap();
        assert_eq!(
            legacy_leaf_hash(meta, &message(vec![], vec![])).unwrap(),
            b256!("2ebb65ee914d70c0d0df55409250254fd17949b0101c9f7f074583e3d0f121ee")
        );
    }

    #[test]
    fn test_legacy_leaf_hash_with_tokens() {
        let meta = legacy_metadata_hash(&lane()).unwrap();
        let tokens = vec![LegacyTokenAmount {
            token: evm("0x514910771af9ca656af840dff83e8264ecf986ca"),
            amount: U256::from(5_000_000_000_000_000_000u64),
        }];
        let leaf =
            legacy_leaf_hash(meta, &message(tokens, vec![Bytes::from(vec![1u8, 2, 3])])).unwrap();
        assert_eq!(
            leaf,
            b256!("e0b379b9ce333cbafbb35e05432add288ddcfb363cb4487f1a6f770eea87fd85")
        );
    }

    #[test]
    fn test_legacy_requires_evm_on_ramp() {
        let mut lane = lane();
        lane.on_ramp = UniversalAddress::zero(ChainFamily::Aptos);
        assert!(matches!(
            legacy_metadata_hash(&lane).unwrap_err(),
            CcipError::InvalidAddress { .. }
        ));
    }

    #[test]
    fn test_ramp_body_rejected_by_legacy_scheme() {
        let mut msg = message(vec![], vec![]);
        msg.body = MessageBody::Ramp {
            fee_value_juels: U256::ZERO,
            token_amounts: vec![],
        };
        assert!(matches!(
            legacy_leaf_hash(B256::ZERO, &msg).unwrap_err(),
            CcipError::UnsupportedVersionForHasher { .. }
        ));
    }
}
