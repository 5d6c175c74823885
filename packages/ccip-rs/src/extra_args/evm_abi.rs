//! ABI layout used by EVM origins
//!
//! The payload after the tag is `abi.encode(args)`, so dynamic structs start
//! with a 0x20 offset word, matching `abi.encodeWithSelector(TAG, args)` in
//! the onRamp client library.

use alloy::primitives::U256;
use alloy::sol;
use alloy::sol_types::SolValue;

use super::{
    ExtraArgs, EVM_EXTRA_ARGS_V1_TAG, EVM_EXTRA_ARGS_V2_TAG, GENERIC_EXTRA_ARGS_V3_TAG,
    SUI_EXTRA_ARGS_V1_TAG, SVM_EXTRA_ARGS_V1_TAG,
};

sol! {
    struct EVMExtraArgsV1 {
        uint256 gasLimit;
    }

    struct EVMExtraArgsV2 {
        uint256 gasLimit;
        bool allowOutOfOrderExecution;
    }

    struct SVMExtraArgsV1 {
        uint32 computeUnits;
        uint64 accountIsWritableBitmap;
        bool allowOutOfOrderExecution;
        bytes32 tokenReceiver;
        bytes32[] accounts;
    }

    struct SuiExtraArgsV1 {
        uint256 gasLimit;
        bool allowOutOfOrderExecution;
        bytes32 tokenReceiver;
        bytes32[] receiverObjectIds;
    }

    struct GenericExtraArgsV3 {
        uint32 gasLimit;
        uint16 blockConfirmations;
        bytes executor;
        bytes executorArgs;
        bytes[] ccvs;
        bytes[] ccvArgs;
        bytes tokenReceiver;
        bytes tokenArgs;
    }
}

pub(super) fn encode_body(args: &ExtraArgs) -> Vec<u8> {
    match args.clone() {
        ExtraArgs::EvmV1 { gas_limit } => SolValue::abi_encode(&EVMExtraArgsV1 {
            gasLimit: gas_limit,
        }),
        ExtraArgs::EvmV2 {
            gas_limit,
            allow_out_of_order_execution,
        } => SolValue::abi_encode(&EVMExtraArgsV2 {
            gasLimit: gas_limit,
            allowOutOfOrderExecution: allow_out_of_order_execution,
        }),
        ExtraArgs::SvmV1 {
            compute_units,
            account_is_writable_bitmap,
            allow_out_of_order_execution,
            token_receiver,
            accounts,
        } => SolValue::abi_encode(&SVMExtraArgsV1 {
            computeUnits: compute_units,
            accountIsWritableBitmap: account_is_writable_bitmap,
            allowOutOfOrderExecution: allow_out_of_order_execution,
            tokenReceiver: token_receiver,
            accounts,
        }),
        ExtraArgs::SuiV1 {
            gas_limit,
            allow_out_of_order_execution,
            token_receiver,
            receiver_object_ids,
        } => SolValue::abi_encode(&SuiExtraArgsV1 {
            gasLimit: U256::from(gas_limit),
            allowOutOfOrderExecution: allow_out_of_order_execution,
            tokenReceiver: token_receiver,
            receiverObjectIds: receiver_object_ids,
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
        } => SolValue::abi_encode(&GenericExtraArgsV3 {
            gasLimit: gas_limit,
            blockConfirmations: block_confirmations,
            executor,
            executorArgs: executor_args,
            ccvs,
            ccvArgs: ccv_args,
            tokenReceiver: token_receiver,
            tokenArgs: token_args,
        }),
    }
}

pub(super) fn decode_body(tag: [u8; 4], body: &[u8]) -> Option<ExtraArgs> {
    match tag {
        EVM_EXTRA_ARGS_V1_TAG => {
            let args = <EVMExtraArgsV1 as SolValue>::abi_decode(body, true).ok()?;
            Some(ExtraArgs::EvmV1 {
                gas_limit: args.gasLimit,
            })
        }
        EVM_EXTRA_ARGS_V2_TAG => {
            let args = <EVMExtraArgsV2 as SolValue>::abi_decode(body, true).ok()?;
            Some(ExtraArgs::EvmV2 {
                gas_limit: args.gasLimit,
                allow_out_of_order_execution: args.allowOutOfOrderExecution,
            })
        }
        SVM_EXTRA_ARGS_V1_TAG => {
            let args = <SVMExtraArgsV1 as SolValue>::abi_decode(body, true).ok()?;
            Some(ExtraArgs::SvmV1 {
                compute_units: args.computeUnits,
                account_is_writable_bitmap: args.accountIsWritableBitmap,
                allow_out_of_order_execution: args.allowOutOfOrderExecution,
                token_receiver: args.tokenReceiver,
                accounts: args.accounts,
            })
        }
        SUI_EXTRA_ARGS_V1_TAG => {
            let args = <SuiExtraArgsV1 as SolValue>::abi_decode(body, true).ok()?;
            Some(ExtraArgs::SuiV1 {
                gas_limit: u64::try_from(args.gasLimit).ok()?,
                allow_out_of_order_execution: args.allowOutOfOrderExecution,
                token_receiver: args.tokenReceiver,
                receiver_object_ids: args.receiverObjectIds,
            })
        }
        GENERIC_EXTRA_ARGS_V3_TAG => {
            let args = <GenericExtraArgsV3 as SolValue>::abi_decode(body, true).ok()?;
            Some(ExtraArgs::GenericV3 {
                gas_limit: args.gasLimit,
                block_confirmations: args.blockConfirmations,
                executor: args.executor,
                executor_args: args.executorArgs,
                ccvs: args.ccvs,
                ccv_args: args.ccvArgs,
                token_receiver: args.tokenReceiver,
                token_args: args.tokenArgs,
            })
        }
        _ => None,
    }
}
