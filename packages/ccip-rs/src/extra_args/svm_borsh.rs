//! Borsh layout used by Solana origins
//!
//! Fixed-width little-endian integers, `u32` vector lengths. The EVM gas
//! limit is a `u128` on this side.

use alloy::primitives::{Bytes, B256, U256};
use borsh::{BorshDeserialize, BorshSerialize};

use super::{
    ExtraArgs, EVM_EXTRA_ARGS_V2_TAG, GENERIC_EXTRA_ARGS_V3_TAG, SUI_EXTRA_ARGS_V1_TAG,
    SVM_EXTRA_ARGS_V1_TAG,
};
use crate::error::{CcipError, Result};
use crate::types::ChainFamily;

#[derive(BorshSerialize, BorshDeserialize)]
struct EvmExtraArgsV2 {
    gas_limit: u128,
    allow_out_of_order_execution: bool,
}

#[derive(BorshSerialize, BorshDeserialize)]
struct SvmExtraArgsV1 {
    compute_units: u32,
    account_is_writable_bitmap: u64,
    allow_out_of_order_execution: bool,
    token_receiver: [u8; 32],
    accounts: Vec<[u8; 32]>,
}

#[derive(BorshSerialize, BorshDeserialize)]
struct SuiExtraArgsV1 {
    gas_limit: u64,
    allow_out_of_order_execution: bool,
    token_receiver: [u8; 32],
    receiver_object_ids: Vec<[u8; 32]>,
}

#[derive(BorshSerialize, BorshDeserialize)]
struct GenericExtraArgsV3 {
    gas_limit: u32,
    block_confirmations: u16,
    executor: Vec<u8>,
    executor_args: Vec<u8>,
    ccvs: Vec<Vec<u8>>,
    ccv_args: Vec<Vec<u8>>,
    token_receiver: Vec<u8>,
    token_args: Vec<u8>,
}

fn words(items: &[B256]) -> Vec<[u8; 32]> {
    items.iter().map(|b| b.0).collect()
}

fn hashes(items: Vec<[u8; 32]>) -> Vec<B256> {
    items.into_iter().map(B256::from).collect()
}

fn to_vecs(items: &[Bytes]) -> Vec<Vec<u8>> {
    items.iter().map(|b| b.to_vec()).collect()
}

fn serialize<T: BorshSerialize>(value: &T) -> Result<Vec<u8>> {
    value
        .try_to_vec()
        .map_err(|e| CcipError::invalid_extra_args(format!("borsh serialization failed: {}", e)))
}

pub(super) fn encode_body(args: &ExtraArgs, origin: ChainFamily) -> Result<Vec<u8>> {
    match args {
        ExtraArgs::EvmV1 { .. } => Err(CcipError::UnsupportedVariantForFamily {
            variant: args.variant_name(),
            family: origin,
        }),
        ExtraArgs::EvmV2 {
            gas_limit,
            allow_out_of_order_execution,
        } => {
            let gas_limit = u128::try_from(*gas_limit).map_err(|_| {
                CcipError::invalid_extra_args(format!(
                    "gasLimit {} does not fit the u128 Solana layout",
                    gas_limit
                ))
            })?;
            serialize(&EvmExtraArgsV2 {
                gas_limit,
                allow_out_of_order_execution: *allow_out_of_order_execution,
            })
        }
        ExtraArgs::SvmV1 {
            compute_units,
            account_is_writable_bitmap,
            allow_out_of_order_execution,
            token_receiver,
            accounts,
        } => serialize(&SvmExtraArgsV1 {
            compute_units: *compute_units,
            account_is_writable_bitmap: *account_is_writable_bitmap,
            allow_out_of_order_execution: *allow_out_of_order_execution,
            token_receiver: token_receiver.0,
            accounts: words(accounts),
        }),
        ExtraArgs::SuiV1 {
            gas_limit,
            allow_out_of_order_execution,
            token_receiver,
            receiver_object_ids,
        } => serialize(&SuiExtraArgsV1 {
            gas_limit: *gas_limit,
            allow_out_of_order_execution: *allow_out_of_order_execution,
            token_receiver: token_receiver.0,
            receiver_object_ids: words(receiver_object_ids),
        }),
        ExtraArgs::GenericV3 {
            gas_limit,
            block_confirmations,
            executor,
            executor_args,
            ccvs,
            ccv_args,
            token_receiver,
            token_args,
        } => serialize(&GenericExtraArgsV3 {
            gas_limit: *gas_limit,
            block_confirmations: *block_confirmations,
            executor: executor.to_vec(),
            executor_args: executor_args.to_vec(),
            ccvs: to_vecs(ccvs),
            ccv_args: to_vecs(ccv_args),
            token_receiver: token_receiver.to_vec(),
            token_args: token_args.to_vec(),
        }),
    }
}

pub(super) fn decode_body(tag: [u8; 4], body: &[u8]) -> Option<ExtraArgs> {
    match tag {
        EVM_EXTRA_ARGS_V2_TAG => {
            let args = EvmExtraArgsV2::try_from_slice(body).ok()?;
            Some(ExtraArgs::EvmV2 {
                gas_limit: U256::from(args.gas_limit),
                allow_out_of_order_execution: args.allow_out_of_order_execution,
            })
        }
        SVM_EXTRA_ARGS_V1_TAG => {
            let args = SvmExtraArgsV1::try_from_slice(body).ok()?;
            Some(ExtraArgs::SvmV1 {
                compute_units: args.compute_units,
                account_is_writable_bitmap: args.account_is_writable_bitmap,
                allow_out_of_order_execution: args.allow_out_of_order_execution,
                token_receiver: B256::from(args.token_receiver),
                accounts: hashes(args.accounts),
            })
        }
        SUI_EXTRA_ARGS_V1_TAG => {
            let args = SuiExtraArgsV1::try_from_slice(body).ok()?;
            Some(ExtraArgs::SuiV1 {
                gas_limit: args.gas_limit,
                allow_out_of_order_execution: args.allow_out_of_order_execution,
                token_receiver: B256::from(args.token_receiver),
                receiver_object_ids: hashes(args.receiver_object_ids),
            })
        }
        GENERIC_EXTRA_ARGS_V3_TAG => {
            let args = GenericExtraArgsV3::try_from_slice(body).ok()?;
            Some(ExtraArgs::GenericV3 {
                gas_limit: args.gas_limit,
                block_confirmations: args.block_confirmations,
                executor: Bytes::from(args.executor),
                executor_args: Bytes::from(args.executor_args),
                ccvs: args.ccvs.into_iter().map(Bytes::from).collect(),
                ccv_args: args.ccv_args.into_iter().map(Bytes::from).collect(),
                token_receiver: Bytes::from(args.token_receiver),
                token_args: Bytes::from(args.token_args),
            })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evm_v2_compact_layout() {
        let body = encode_body(
            &ExtraArgs::EvmV2 {
                gas_limit: U256::from(11u64),
                allow_out_of_order_execution: true,
            },
            ChainFamily::Svm,
        )
        .unwrap();
        let mut expected = vec![0u8; 17];
        expected[0] = 11;
        expected[16] = 1;
        assert_eq!(body, expected);
    }

    #[test]
    fn test_gas_limit_overflow() {
        let err = encode_body(
            &ExtraArgs::EvmV2 {
                gas_limit: U256::MAX,
                allow_out_of_order_execution: true,
            },
            ChainFamily::Svm,
        )
        .unwrap_err();
        assert!(matches!(err, CcipError::InvalidExtraArgs { .. }));
    }

    #[test]
    fn test_svm_v1_layout() {
        let body = encode_body(
            &ExtraArgs::SvmV1 {
                compute_units: 1,
                account_is_writable_bitmap: 2,
                allow_out_of_order_execution: false,
                token_receiver: B256::ZERO,
                accounts: vec![B256::repeat_byte(5)],
            },
            ChainFamily::Svm,
        )
        .unwrap();
        // u32 + u64 + bool + [u8; 32] + u32 length + one account
        assert_eq!(body.len(), 4 + 8 + 1 + 32 + 4 + 32);
        assert_eq!(&body[45..49], &[1, 0, 0, 0]);
    }
}
