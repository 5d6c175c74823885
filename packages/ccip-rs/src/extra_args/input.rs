//! Loose extra-args input and defaulting
//!
//! [`ExtraArgsInput`] is what a caller (or a JSON request) supplies: every
//! field optional, camelCase or snake_case. [`prepare_message_args`] resolves
//! it against the destination family into a concrete [`ExtraArgs`] variant.
//!
//! Defaults:
//! - `gasLimit` is 200 000 when the message carries data, 0 otherwise
//! - `allowOutOfOrderExecution` is `true` unless explicitly `false`
//! - any V3-only field selects `GenericExtraArgsV3`, whatever the destination
//! - token transfers to Solana or Sui move the recipient into
//!   `tokenReceiver` and zero the message receiver

use alloy::primitives::{Bytes, B256, U256};
use serde::Deserialize;

use super::{ExtraArgs, DEFAULT_GAS_LIMIT};
use crate::address_codec::UniversalAddress;
use crate::error::{CcipError, Result};
use crate::json::{de_opt_bytes, de_opt_bytes_vec, de_opt_u256, de_opt_u64};
use crate::types::ChainFamily;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraArgsInput {
    #[serde(default, alias = "gas_limit", deserialize_with = "de_opt_u256")]
    pub gas_limit: Option<U256>,
    #[serde(default, alias = "allow_out_of_order_execution")]
    pub allow_out_of_order_execution: Option<bool>,

    // Solana
    #[serde(default, alias = "compute_units", deserialize_with = "de_opt_u64")]
    pub compute_units: Option<u64>,
    #[serde(
        default,
        alias = "account_is_writable_bitmap",
        deserialize_with = "de_opt_u64"
    )]
    pub account_is_writable_bitmap: Option<u64>,
    #[serde(default)]
    pub accounts: Option<Vec<String>>,

    // Solana, Sui and V3
    #[serde(default, alias = "token_receiver")]
    pub token_receiver: Option<String>,

    // Sui
    #[serde(default, alias = "receiver_object_ids")]
    pub receiver_object_ids: Option<Vec<String>>,

    // V3 only
    #[serde(default, alias = "block_confirmations", deserialize_with = "de_opt_u64")]
    pub block_confirmations: Option<u64>,
    #[serde(default)]
    pub executor: Option<String>,
    #[serde(default, alias = "executor_args", deserialize_with = "de_opt_bytes")]
    pub executor_args: Option<Bytes>,
    #[serde(default)]
    pub ccvs: Option<Vec<String>>,
    #[serde(default, alias = "ccv_args", deserialize_with = "de_opt_bytes_vec")]
    pub ccv_args: Option<Vec<Bytes>>,
    #[serde(default, alias = "token_args", deserialize_with = "de_opt_bytes")]
    pub token_args: Option<Bytes>,
}

impl ExtraArgsInput {
    /// Whether any field that only exists in `GenericExtraArgsV3` is set
    pub fn has_v3_fields(&self) -> bool {
        self.block_confirmations.is_some()
            || self.executor.is_some()
            || self.executor_args.is_some()
            || self.ccvs.is_some()
            || self.ccv_args.is_some()
            || self.token_args.is_some()
    }

    fn has_svm_fields(&self) -> bool {
        self.compute_units.is_some()
            || self.account_is_writable_bitmap.is_some()
            || self.accounts.is_some()
    }
}

/// Receiver and extra args ready to be put on a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedMessageArgs {
    pub receiver: UniversalAddress,
    pub extra_args: ExtraArgs,
}

/// Resolve `input` into concrete extra args for a message to `dest_family`
pub fn prepare_message_args(
    input: &ExtraArgsInput,
    dest_family: ChainFamily,
    receiver: &UniversalAddress,
    has_data: bool,
    has_tokens: bool,
) -> Result<PreparedMessageArgs> {
    if receiver.family() != dest_family {
        return Err(CcipError::InvalidAddress {
            family: dest_family,
            raw: receiver.to_string(),
            reason: format!("receiver is a {} address", receiver.family()),
        });
    }

    let gas_limit = input.gas_limit.unwrap_or_else(|| {
        if has_data {
            U256::from(DEFAULT_GAS_LIMIT)
        } else {
            U256::ZERO
        }
    });
    let allow_out_of_order_execution = input.allow_out_of_order_execution.unwrap_or(true);

    if input.has_v3_fields() {
        let extra_args = generic_v3(input, dest_family, gas_limit)?;
        return Ok(PreparedMessageArgs {
            receiver: receiver.clone(),
            extra_args,
        });
    }

    if input.has_svm_fields() && dest_family != ChainFamily::Svm {
        return Err(CcipError::invalid_extra_args(format!(
            "Solana execution fields do not apply to a {} destination",
            dest_family
        )));
    }
    if input.receiver_object_ids.is_some() && dest_family != ChainFamily::Sui {
        return Err(CcipError::invalid_extra_args(format!(
            "receiverObjectIds do not apply to a {} destination",
            dest_family
        )));
    }

    match dest_family {
        ChainFamily::Evm | ChainFamily::Aptos | ChainFamily::Ton => {
            if input.token_receiver.is_some() {
                return Err(CcipError::invalid_extra_args(format!(
                    "tokenReceiver does not apply to a {} destination",
                    dest_family
                )));
            }
            Ok(PreparedMessageArgs {
                receiver: receiver.clone(),
                extra_args: ExtraArgs::EvmV2 {
                    gas_limit,
                    allow_out_of_order_execution,
                },
            })
        }
        ChainFamily::Svm => {
            let compute_units = match input.compute_units {
                Some(units) => U256::from(units),
                None => gas_limit,
            };
            let compute_units = u32::try_from(compute_units).map_err(|_| {
                CcipError::invalid_extra_args(format!(
                    "computeUnits {} does not fit in u32",
                    compute_units
                ))
            })?;
            let accounts = input
                .accounts
                .iter()
                .flatten()
                .map(|a| parse_word(a, ChainFamily::Svm))
                .collect::<Result<Vec<_>>>()?;

            let (receiver, token_receiver) =
                split_token_receiver(input, receiver, has_tokens)?;

            Ok(PreparedMessageArgs {
                receiver,
                extra_args: ExtraArgs::SvmV1 {
                    compute_units,
                    account_is_writable_bitmap: input.account_is_writable_bitmap.unwrap_or(0),
                    allow_out_of_order_execution,
                    token_receiver,
                    accounts,
                },
            })
        }
        ChainFamily::Sui => {
            let gas_limit = u64::try_from(gas_limit).map_err(|_| {
                CcipError::invalid_extra_args(format!("gasLimit {} does not fit in u64", gas_limit))
            })?;
            let receiver_object_ids = input
                .receiver_object_ids
                .iter()
                .flatten()
                .map(|id| parse_word(id, ChainFamily::Sui))
                .collect::<Result<Vec<_>>>()?;

            let (receiver, token_receiver) =
                split_token_receiver(input, receiver, has_tokens)?;

            Ok(PreparedMessageArgs {
                receiver,
                extra_args: ExtraArgs::SuiV1 {
                    gas_limit,
                    allow_out_of_order_execution,
                    token_receiver,
                    receiver_object_ids,
                },
            })
        }
    }
}

fn generic_v3(input: &ExtraArgsInput, dest_family: ChainFamily, gas_limit: U256) -> Result<ExtraArgs> {
    let gas_limit = u32::try_from(gas_limit).map_err(|_| {
        CcipError::invalid_extra_args(format!("gasLimit {} does not fit in u32", gas_limit))
    })?;
    let block_confirmations = input.block_confirmations.unwrap_or(0);
    let block_confirmations = u16::try_from(block_confirmations).map_err(|_| {
        CcipError::invalid_extra_args(format!(
            "blockConfirmations {} does not fit in u16",
            block_confirmations
        ))
    })?;

    let executor = match &input.executor {
        Some(text) => Bytes::from(UniversalAddress::parse(text, dest_family)?.as_bytes().to_vec()),
        None => Bytes::new(),
    };
    let ccvs = input
        .ccvs
        .iter()
        .flatten()
        .map(|c| Ok(Bytes::from(UniversalAddress::parse(c, dest_family)?.as_bytes().to_vec())))
        .collect::<Result<Vec<_>>>()?;
    let token_receiver = match &input.token_receiver {
        Some(text) => Bytes::from(UniversalAddress::parse(text, dest_family)?.as_bytes().to_vec()),
        None => Bytes::new(),
    };

    Ok(ExtraArgs::GenericV3 {
        gas_limit,
        block_confirmations,
        executor,
        executor_args: input.executor_args.clone().unwrap_or_default(),
        ccvs,
        ccv_args: input.ccv_args.clone().unwrap_or_default(),
        token_receiver,
        token_args: input.token_args.clone().unwrap_or_default(),
    })
}

/// With tokens, the recipient moves to `tokenReceiver` and the message
/// receiver becomes the zero address
fn split_token_receiver(
    input: &ExtraArgsInput,
    receiver: &UniversalAddress,
    has_tokens: bool,
) -> Result<(UniversalAddress, B256)> {
    let family = receiver.family();
    let explicit = input
        .token_receiver
        .as_deref()
        .map(|text| parse_word(text, family))
        .transpose()?;

    if !has_tokens {
        return Ok((receiver.clone(), explicit.unwrap_or_default()));
    }

    let token_receiver = match explicit {
        Some(word) => word,
        None => receiver.to_bytes32()?,
    };
    if token_receiver.is_zero() {
        return Err(CcipError::invalid_extra_args(format!(
            "token transfer to {} needs a non-zero token receiver",
            family
        )));
    }
    Ok((UniversalAddress::zero(family), token_receiver))
}

fn parse_word(text: &str, family: ChainFamily) -> Result<B256> {
    UniversalAddress::parse(text, family)?.to_bytes32()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evm_receiver() -> UniversalAddress {
        UniversalAddress::parse("0x5fbdb2315678afecb367f032d93f642f64180aa3", ChainFamily::Evm)
            .unwrap()
    }

    fn svm_receiver() -> UniversalAddress {
        UniversalAddress::parse(
            "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA",
            ChainFamily::Svm,
        )
        .unwrap()
    }

    #[test]
    fn test_gas_limit_defaults_follow_data() {
        let input = ExtraArgsInput::default();
        let with_data =
            prepare_message_args(&input, ChainFamily::Evm, &evm_receiver(), true, false).unwrap();
        assert_eq!(
            with_data.extra_args,
            ExtraArgs::EvmV2 {
                gas_limit: U256::from(200_000u64),
                allow_out_of_order_execution: true,
            }
        );

        let without_data =
            prepare_message_args(&input, ChainFamily::Evm, &evm_receiver(), false, true).unwrap();
        assert_eq!(without_data.extra_args.gas_limit(), U256::ZERO);
    }

    #[test]
    fn test_explicit_false_ordering_flag() {
        let input: ExtraArgsInput =
            serde_json::from_str(r#"{"gas_limit": "500", "allowOutOfOrderExecution": false}"#)
                .unwrap();
        let prepared =
            prepare_message_args(&input, ChainFamily::Aptos, &UniversalAddress::zero(ChainFamily::Aptos), true, false)
                .unwrap();
        assert_eq!(
            prepared.extra_args,
            ExtraArgs::EvmV2 {
                gas_limit: U256::from(500u64),
                allow_out_of_order_execution: false,
            }
        );
    }

    #[test]
    fn test_v3_field_takes_priority() {
        let input: ExtraArgsInput =
            serde_json::from_str(r#"{"gasLimit": 1000, "blockConfirmations": 5}"#).unwrap();
        assert!(input.has_v3_fields());
        let prepared =
            prepare_message_args(&input, ChainFamily::Evm, &evm_receiver(), true, false).unwrap();
        assert_eq!(
            prepared.extra_args,
            ExtraArgs::GenericV3 {
                gas_limit: 1000,
                block_confirmations: 5,
                executor: Bytes::new(),
                executor_args: Bytes::new(),
                ccvs: vec![],
                ccv_args: vec![],
                token_receiver: Bytes::new(),
                token_args: Bytes::new(),
            }
        );
    }

    #[test]
    fn test_svm_tokens_move_receiver() {
        let receiver = svm_receiver();
        let prepared = prepare_message_args(
            &ExtraArgsInput::default(),
            ChainFamily::Svm,
            &receiver,
            false,
            true,
        )
        .unwrap();
        assert!(prepared.receiver.is_zero());
        match prepared.extra_args {
            ExtraArgs::SvmV1 {
                token_receiver,
                compute_units,
                allow_out_of_order_execution,
                ..
            } => {
                assert_eq!(token_receiver.as_slice(), receiver.as_bytes());
                assert_eq!(compute_units, 0);
                assert!(allow_out_of_order_execution);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_svm_without_tokens_keeps_receiver() {
        let receiver = svm_receiver();
        let input: ExtraArgsInput = serde_json::from_str(
            r#"{"computeUnits": 300000, "accounts": ["11111111111111111111111111111111"]}"#,
        )
        .unwrap();
        let prepared =
            prepare_message_args(&input, ChainFamily::Svm, &receiver, true, false).unwrap();
        assert_eq!(prepared.receiver, receiver);
        match prepared.extra_args {
            ExtraArgs::SvmV1 {
                compute_units,
                accounts,
                token_receiver,
                ..
            } => {
                assert_eq!(compute_units, 300_000);
                assert_eq!(accounts, vec![B256::ZERO]);
                assert!(token_receiver.is_zero());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_sui_tokens_need_a_receiver() {
        let err = prepare_message_args(
            &ExtraArgsInput::default(),
            ChainFamily::Sui,
            &UniversalAddress::zero(ChainFamily::Sui),
            false,
            true,
        )
        .unwrap_err();
        assert!(matches!(err, CcipError::InvalidExtraArgs { .. }));

        let input = ExtraArgsInput {
            token_receiver: Some("0x2".to_string()),
            receiver_object_ids: Some(vec!["0x6".to_string()]),
            ..Default::default()
        };
        let prepared = prepare_message_args(
            &input,
            ChainFamily::Sui,
            &UniversalAddress::parse("0x1", ChainFamily::Sui).unwrap(),
            true,
            true,
        )
        .unwrap();
        assert!(prepared.receiver.is_zero());
        match prepared.extra_args {
            ExtraArgs::SuiV1 {
                gas_limit,
                token_receiver,
                receiver_object_ids,
                ..
            } => {
                assert_eq!(gas_limit, 200_000);
                assert_eq!(token_receiver.0[31], 2);
                assert_eq!(receiver_object_ids.len(), 1);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_misplaced_fields_rejected() {
        let input = ExtraArgsInput {
            compute_units: Some(1),
            ..Default::default()
        };
        let err = prepare_message_args(&input, ChainFamily::Evm, &evm_receiver(), true, false)
            .unwrap_err();
        assert!(matches!(err, CcipError::InvalidExtraArgs { .. }));

        let err = prepare_message_args(
            &ExtraArgsInput::default(),
            ChainFamily::Svm,
            &evm_receiver(),
            true,
            false,
        )
        .unwrap_err();
        assert!(matches!(err, CcipError::InvalidAddress { .. }));
    }
}
