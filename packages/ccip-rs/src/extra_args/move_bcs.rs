//! BCS layout used by Aptos and Sui origins
//!
//! The EVM gas limit is a Move `u256`; account and object ids are Move
//! `address` values (32 raw bytes).

use alloy::primitives::Bytes;

use super::{
    ExtraArgs, EVM_EXTRA_ARGS_V2_TAG, GENERIC_EXTRA_ARGS_V3_TAG, SUI_EXTRA_ARGS_V1_TAG,
    SVM_EXTRA_ARGS_V1_TAG,
};
use crate::bcs::{BcsError, BcsReader, BcsWriter};
use crate::error::{CcipError, Result};
use crate::types::ChainFamily;

pub(super) fn encode_body(args: &ExtraArgs, origin: ChainFamily) -> Result<Vec<u8>> {
    let mut w = BcsWriter::new();
    match args {
        ExtraArgs::EvmV1 { .. } => {
            return Err(CcipError::UnsupportedVariantForFamily {
                variant: args.variant_name(),
                family: origin,
            })
        }
        ExtraArgs::EvmV2 {
            gas_limit,
            allow_out_of_order_execution,
        } => {
            w.write_u256(*gas_limit)
                .write_bool(*allow_out_of_order_execution);
        }
        ExtraArgs::SvmV1 {
            compute_units,
            account_is_writable_bitmap,
            allow_out_of_order_execution,
            token_receiver,
            accounts,
        } => {
            w.write_u32(*compute_units)
                .write_u64(*account_is_writable_bitmap)
                .write_bool(*allow_out_of_order_execution)
                .write_fixed(token_receiver.as_slice())
                .write_addresses(accounts);
        }
        ExtraArgs::SuiV1 {
            gas_limit,
            allow_out_of_order_execution,
            token_receiver,
            receiver_object_ids,
        } => {
            w.write_u64(*gas_limit)
                .write_bool(*allow_out_of_order_execution)
                .write_fixed(token_receiver.as_slice())
                .write_addresses(receiver_object_ids);
        }
        ExtraArgs::GenericV3 {
            gas_limit,
            block_confirmations,
            executor,
            executor_args,
            ccvs,
            ccv_args,
            token_receiver,
            token_args,
        } => {
            w.write_u32(*gas_limit)
                .write_u16(*block_confirmations)
                .write_bytes(executor)
                .write_bytes(executor_args)
                .write_bytes_vec(ccvs)
                .write_bytes_vec(ccv_args)
                .write_bytes(token_receiver)
                .write_bytes(token_args);
        }
    }
    Ok(w.into_bytes())
}

pub(super) fn decode_body(tag: [u8; 4], body: &[u8]) -> Option<ExtraArgs> {
    read_body(tag, body).ok().flatten()
}

fn read_body(tag: [u8; 4], body: &[u8]) -> std::result::Result<Option<ExtraArgs>, BcsError> {
    let mut r = BcsReader::new(body);
    let args = match tag {
        EVM_EXTRA_ARGS_V2_TAG => ExtraArgs::EvmV2 {
            gas_limit: r.read_u256()?,
            allow_out_of_order_execution: r.read_bool()?,
        },
        SVM_EXTRA_ARGS_V1_TAG => ExtraArgs::SvmV1 {
            compute_units: r.read_u32()?,
            account_is_writable_bitmap: r.read_u64()?,
            allow_out_of_order_execution: r.read_bool()?,
            token_receiver: r.read_address()?,
            accounts: r.read_addresses()?,
        },
        SUI_EXTRA_ARGS_V1_TAG => ExtraArgs::SuiV1 {
            gas_limit: r.read_u64()?,
            allow_out_of_order_execution: r.read_bool()?,
            token_receiver: r.read_address()?,
            receiver_object_ids: r.read_addresses()?,
        },
        GENERIC_EXTRA_ARGS_V3_TAG => ExtraArgs::GenericV3 {
            gas_limit: r.read_u32()?,
            block_confirmations: r.read_u16()?,
            executor: Bytes::from(r.read_bytes()?),
            executor_args: Bytes::from(r.read_bytes()?),
            ccvs: r.read_bytes_vec()?.into_iter().map(Bytes::from).collect(),
            ccv_args: r.read_bytes_vec()?.into_iter().map(Bytes::from).collect(),
            token_receiver: Bytes::from(r.read_bytes()?),
            token_args: Bytes::from(r.read_bytes()?),
        },
        _ => return Ok(None),
    };
    r.finish()?;
    Ok(Some(args))
}
