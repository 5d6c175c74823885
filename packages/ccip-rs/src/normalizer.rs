//! Message Normalizer
//!
//! Turns an already-decoded message event (as JSON) into the canonical
//! [`Message`]. Two schema shapes are recognised:
//!
//! - **Legacy (1.2 / 1.5)**: flat `EVM2EVMMessage` fields
//! - **Ramp (1.6)**: a nested `header` object plus ramp fields
//!
//! Keys may be camelCase or snake_case. Move chains emit the message inside a
//! wrapper object (`{ dest_chain_selector, sequence_number, message }`),
//! which is unwrapped first.
//!
//! Addresses are decoded in the family that owns them: sender, fee token and
//! source pools in the source family, receiver and destination tokens in the
//! destination family.

use alloy::primitives::{Bytes, B256, U256};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{CcipError, Result};
use crate::extra_args::{decode_extra_args, ExtraArgs, DEFAULT_GAS_LIMIT};
use crate::json::{de_b256, de_bytes, de_bytes_vec, de_opt_bytes, de_opt_u64, de_u256, de_u64, RawAddress};
use crate::registry::ChainRegistry;
use crate::types::{
    ChainFamily, Lane, LegacyTokenAmount, Message, MessageBody, MessageHeader, ProtocolVersion,
    TokenTransfer,
};

/// Longest raw JSON excerpt attached to a [`CcipError::MalformedLog`]
const RAW_EXCERPT_CHARS: usize = 256;

// ============================================================================
// Raw Schemas
// ============================================================================

/// Flat pre-1.6 `EVM2EVMMessage`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLegacyMessage {
    #[serde(alias = "source_chain_selector", deserialize_with = "de_u64")]
    pub source_chain_selector: u64,
    #[serde(alias = "sequence_number", deserialize_with = "de_u64")]
    pub sequence_number: u64,
    #[serde(deserialize_with = "de_u64")]
    pub nonce: u64,
    pub sender: RawAddress,
    pub receiver: RawAddress,
    #[serde(alias = "gas_limit", deserialize_with = "de_u256")]
    pub gas_limit: U256,
    #[serde(default)]
    pub strict: bool,
    #[serde(alias = "fee_token")]
    pub fee_token: RawAddress,
    #[serde(default, alias = "fee_token_amount", deserialize_with = "de_u256")]
    pub fee_token_amount: U256,
    #[serde(default, deserialize_with = "de_bytes")]
    pub data: Bytes,
    #[serde(default, alias = "token_amounts")]
    pub token_amounts: Vec<RawLegacyTokenAmount>,
    #[serde(default, alias = "source_token_data", deserialize_with = "de_bytes_vec")]
    pub source_token_data: Vec<Bytes>,
    #[serde(alias = "message_id", deserialize_with = "de_b256")]
    pub message_id: B256,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawLegacyTokenAmount {
    pub token: RawAddress,
    #[serde(deserialize_with = "de_u256")]
    pub amount: U256,
}

/// 1.6 ramp message
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRampMessage {
    pub header: RawRampHeader,
    pub sender: RawAddress,
    pub receiver: RawAddress,
    #[serde(default, deserialize_with = "de_bytes")]
    pub data: Bytes,
    #[serde(default, alias = "extra_args", deserialize_with = "de_bytes")]
    pub extra_args: Bytes,
    #[serde(alias = "fee_token")]
    pub fee_token: RawAddress,
    #[serde(default, alias = "fee_token_amount", deserialize_with = "de_u256")]
    pub fee_token_amount: U256,
    #[serde(default, alias = "fee_value_juels", deserialize_with = "de_u256")]
    pub fee_value_juels: U256,
    #[serde(default, alias = "token_amounts")]
    pub token_amounts: Vec<RawTokenTransfer>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRampHeader {
    #[serde(alias = "message_id", deserialize_with = "de_b256")]
    pub message_id: B256,
    #[serde(alias = "source_chain_selector", deserialize_with = "de_u64")]
    pub source_chain_selector: u64,
    #[serde(alias = "dest_chain_selector", deserialize_with = "de_u64")]
    pub dest_chain_selector: u64,
    #[serde(alias = "sequence_number", deserialize_with = "de_u64")]
    pub sequence_number: u64,
    #[serde(deserialize_with = "de_u64")]
    pub nonce: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTokenTransfer {
    #[serde(alias = "source_pool_address")]
    pub source_pool_address: RawAddress,
    #[serde(alias = "dest_token_address")]
    pub dest_token_address: RawAddress,
    #[serde(default, alias = "extra_data", deserialize_with = "de_bytes")]
    pub extra_data: Bytes,
    #[serde(deserialize_with = "de_u256")]
    pub amount: U256,
    #[serde(default, alias = "dest_gas_amount", deserialize_with = "de_opt_u64")]
    pub dest_gas_amount: Option<u64>,
    #[serde(default, alias = "dest_exec_data", deserialize_with = "de_opt_bytes")]
    pub dest_exec_data: Option<Bytes>,
}

/// Message event in one of the known schema shapes
#[derive(Debug, Clone)]
pub enum RawMessage {
    Legacy(RawLegacyMessage),
    Ramp(RawRampMessage),
}

impl RawMessage {
    /// Detect the schema shape of `value` and decode it
    pub fn from_value(value: &Value) -> Result<Self> {
        let body = unwrap_message(value);
        let Some(object) = body.as_object() else {
            return Err(CcipError::malformed("message is not a JSON object", excerpt(value)));
        };

        if object.get("header").map_or(false, Value::is_object) {
            let raw = serde_json::from_value::<RawRampMessage>(body.clone())
                .map_err(|e| CcipError::malformed(e.to_string(), excerpt(value)))?;
            return Ok(RawMessage::Ramp(raw));
        }

        let is_flat = ["messageId", "message_id"]
            .iter()
            .any(|key| object.contains_key(*key));
        if is_flat {
            let raw = serde_json::from_value::<RawLegacyMessage>(body.clone())
                .map_err(|e| CcipError::malformed(e.to_string(), excerpt(value)))?;
            return Ok(RawMessage::Legacy(raw));
        }

        Err(CcipError::malformed(
            "no message header: expected a nested header or a flat messageId",
            excerpt(value),
        ))
    }

    pub fn schema(&self) -> &'static str {
        match self {
            RawMessage::Legacy(_) => "legacy",
            RawMessage::Ramp(_) => "ramp",
        }
    }
}

fn unwrap_message(value: &Value) -> &Value {
    match value.get("message") {
        Some(inner) if inner.is_object() => inner,
        _ => value,
    }
}

fn excerpt(value: &Value) -> String {
    let text = value.to_string();
    if text.chars().count() <= RAW_EXCERPT_CHARS {
        return text;
    }
    let mut cut: String = text.chars().take(RAW_EXCERPT_CHARS).collect();
    cut.push_str("...");
    cut
}

// ============================================================================
// Normalization
// ============================================================================

/// Normalize a decoded message event observed on `lane`
pub fn normalize_message(registry: &ChainRegistry, raw: &Value, lane: &Lane) -> Result<Message> {
    let source_family = registry.family_of(lane.source_chain_selector)?;
    let dest_family = registry.family_of(lane.dest_chain_selector)?;
    let parsed = RawMessage::from_value(raw)?;

    tracing::debug!(
        schema = parsed.schema(),
        version = %lane.version,
        source = lane.source_chain_selector,
        dest = lane.dest_chain_selector,
        "Detected message schema"
    );

    match (parsed, lane.version.is_legacy()) {
        (RawMessage::Legacy(msg), true) => {
            normalize_legacy(msg, raw, lane, source_family, dest_family)
        }
        (RawMessage::Ramp(msg), false) => normalize_ramp(msg, raw, lane, source_family, dest_family),
        (parsed, _) => Err(CcipError::malformed(
            format!(
                "{} message shape does not belong to a {} lane",
                parsed.schema(),
                lane.version
            ),
            excerpt(raw),
        )),
    }
}

/// Normalize every event of a batch, stopping at the first failure
pub fn normalize_messages(
    registry: &ChainRegistry,
    raws: &[Value],
    lane: &Lane,
) -> Result<Vec<Message>> {
    raws.iter()
        .map(|raw| normalize_message(registry, raw, lane))
        .collect()
}

fn normalize_legacy(
    msg: RawLegacyMessage,
    raw: &Value,
    lane: &Lane,
    source_family: ChainFamily,
    dest_family: ChainFamily,
) -> Result<Message> {
    if msg.source_chain_selector != lane.source_chain_selector {
        return Err(CcipError::malformed(
            format!(
                "sourceChainSelector {} does not match lane source {}",
                msg.source_chain_selector, lane.source_chain_selector
            ),
            excerpt(raw),
        ));
    }

    // Pre-1.6 messages carry no extra args; rebuild what the onRamp accepted
    let extra_args = match lane.version {
        ProtocolVersion::V1_2 => ExtraArgs::EvmV1 {
            gas_limit: msg.gas_limit,
        },
        _ => ExtraArgs::EvmV2 {
            gas_limit: msg.gas_limit,
            allow_out_of_order_execution: msg.nonce == 0,
        },
    };

    let token_amounts = msg
        .token_amounts
        .iter()
        .map(|t| {
            Ok(LegacyTokenAmount {
                token: t.token.resolve(source_family)?,
                amount: t.amount,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Message {
        source_family,
        dest_family,
        version: lane.version,
        header: MessageHeader {
            message_id: msg.message_id,
            source_chain_selector: msg.source_chain_selector,
            dest_chain_selector: lane.dest_chain_selector,
            sequence_number: msg.sequence_number,
            nonce: msg.nonce,
        },
        sender: msg.sender.resolve(source_family)?,
        receiver: msg.receiver.resolve(dest_family)?,
        data: msg.data,
        fee_token: msg.fee_token.resolve(source_family)?,
        fee_token_amount: msg.fee_token_amount,
        extra_args,
        raw_extra_args: Bytes::new(),
        body: MessageBody::Legacy {
            strict: msg.strict,
            gas_limit: msg.gas_limit,
            token_amounts,
            source_token_data: msg.source_token_data,
        },
    })
}

fn normalize_ramp(
    msg: RawRampMessage,
    raw: &Value,
    lane: &Lane,
    source_family: ChainFamily,
    dest_family: ChainFamily,
) -> Result<Message> {
    let header = &msg.header;
    if header.source_chain_selector != lane.source_chain_selector
        || header.dest_chain_selector != lane.dest_chain_selector
    {
        return Err(CcipError::malformed(
            format!(
                "header selectors {} -> {} do not match lane {} -> {}",
                header.source_chain_selector,
                header.dest_chain_selector,
                lane.source_chain_selector,
                lane.dest_chain_selector
            ),
            excerpt(raw),
        ));
    }

    let extra_args = if msg.extra_args.is_empty() {
        ExtraArgs::EvmV1 {
            gas_limit: U256::from(DEFAULT_GAS_LIMIT),
        }
    } else {
        decode_extra_args(&msg.extra_args).ok_or_else(|| {
            CcipError::malformed(
                format!("undecodable extraArgs 0x{}", hex::encode(&msg.extra_args)),
                excerpt(raw),
            )
        })?
    };

    let token_amounts = msg
        .token_amounts
        .iter()
        .map(|t| {
            Ok(TokenTransfer {
                source_pool_address: t.source_pool_address.resolve(source_family)?,
                dest_token_address: t.dest_token_address.resolve(dest_family)?,
                dest_gas_amount: dest_gas_amount(t, raw)?,
                extra_data: t.extra_data.clone(),
                amount: t.amount,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Message {
        source_family,
        dest_family,
        version: lane.version,
        header: MessageHeader {
            message_id: header.message_id,
            source_chain_selector: header.source_chain_selector,
            dest_chain_selector: header.dest_chain_selector,
            sequence_number: header.sequence_number,
            nonce: header.nonce,
        },
        sender: msg.sender.resolve(source_family)?,
        receiver: msg.receiver.resolve(dest_family)?,
        data: msg.data,
        fee_token: msg.fee_token.resolve(source_family)?,
        fee_token_amount: msg.fee_token_amount,
        extra_args,
        raw_extra_args: msg.extra_args,
        body: MessageBody::Ramp {
            fee_value_juels: msg.fee_value_juels,
            token_amounts,
        },
    })
}

/// Explicit `destGasAmount`, else decoded from `destExecData`: a 32-byte ABI
/// `uint32` word (EVM sources) or 4 little-endian bytes (other sources)
fn dest_gas_amount(transfer: &RawTokenTransfer, raw: &Value) -> Result<u32> {
    if let Some(amount) = transfer.dest_gas_amount {
        return u32::try_from(amount).map_err(|_| {
            CcipError::malformed(format!("destGasAmount {} exceeds u32", amount), excerpt(raw))
        });
    }

    let data: &[u8] = match &transfer.dest_exec_data {
        Some(bytes) => bytes,
        None => &[],
    };
    match data.len() {
        0 => Ok(0),
        4 => {
            let mut word = [0u8; 4];
            word.copy_from_slice(data);
            Ok(u32::from_le_bytes(word))
        }
        32 if data[..28].iter().all(|b| *b == 0) => {
            let mut word = [0u8; 4];
            word.copy_from_slice(&data[28..]);
            Ok(u32::from_be_bytes(word))
        }
        _ => Err(CcipError::malformed(
            format!("unsupported destExecData 0x{}", hex::encode(data)),
            excerpt(raw),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address_codec::UniversalAddress;
    use serde_json::json;

    const ETHEREUM: u64 = 5009297550715157269;
    const ARBITRUM: u64 = 4949039107694359620;
    const APTOS: u64 = 4741433654826277614;

    fn legacy_lane(version: ProtocolVersion) -> Lane {
        Lane::resolve(
            &ChainRegistry::builtin(),
            ETHEREUM,
            ARBITRUM,
            "0x0bf3de8c5d3e8a2b34d2beeb17abfcebaf363a59",
            version,
        )
        .unwrap()
    }

    fn aptos_lane() -> Lane {
        Lane::resolve(
            &ChainRegistry::builtin(),
            APTOS,
            ETHEREUM,
            "0x1::onramp",
            ProtocolVersion::V1_6,
        )
        .unwrap()
    }

    fn legacy_event() -> Value {
        json!({
            "sourceChainSelector": ETHEREUM.to_string(),
            "sender": "0xd8da6bf26964af9d7eed9e03e53415d37aa96045",
            "receiver": "0x5fbdb2315678afecb367f032d93f642f64180aa3",
            "sequenceNumber": 7,
            "gasLimit": "200000",
            "strict": false,
            "nonce": "0",
            "feeToken": "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2",
            "feeTokenAmount": "1000000000000000",
            "data": "0x68656c6c6f",
            "tokenAmounts": [
                { "token": "0x514910771af9ca656af840dff83e8264ecf986ca", "amount": "5" }
            ],
            "sourceTokenData": ["0x010203"],
            "messageId": format!("0x{}", "11".repeat(32)),
        })
    }

    fn ramp_event() -> Value {
        json!({
            "dest_chain_selector": ETHEREUM.to_string(),
            "sequence_number": "3",
            "message": {
                "header": {
                    "message_id": format!("0x{}", "22".repeat(32)),
                    "source_chain_selector": APTOS.to_string(),
                    "dest_chain_selector": ETHEREUM.to_string(),
                    "sequence_number": "3",
                    "nonce": "0"
                },
                "sender": "0x8a1f",
                "data": "0x",
                "receiver": "0x000000000000000000000000d8da6bf26964af9d7eed9e03e53415d37aa96045",
                "extra_args": "0x181dcf10e09304000000000000000000000000000000000000000000000000000000000001",
                "fee_token": "0xa",
                "fee_token_amount": "100",
                "fee_value_juels": "200",
                "token_amounts": [{
                    "source_pool_address": "0x65ad",
                    "dest_token_address": "0x000000000000000000000000514910771af9ca656af840dff83e8264ecf986ca",
                    "extra_data": "0x",
                    "amount": "1000",
                    "dest_exec_data": "0x905f0100"
                }]
            }
        })
    }

    #[test]
    fn test_legacy_v1_5() {
        let lane = legacy_lane(ProtocolVersion::V1_5);
        let message =
            normalize_message(&ChainRegistry::builtin(), &legacy_event(), &lane).unwrap();

        assert_eq!(message.version, ProtocolVersion::V1_5);
        assert_eq!(message.sequence_number(), 7);
        assert_eq!(message.header.dest_chain_selector, ARBITRUM);
        assert_eq!(message.data.to_vec(), b"hello".to_vec());
        assert_eq!(message.gas_limit(), U256::from(200_000u64));
        assert!(message.allow_out_of_order_execution());
        assert!(message.raw_extra_args.is_empty());
        assert_eq!(message.fee_value_juels(), None);
        assert_eq!(message.legacy_token_amounts().unwrap().len(), 1);
        assert!(message.token_transfers().is_none());
        assert_eq!(
            message.receiver.to_string(),
            "0x5FbDB2315678afecb367f032d93F642f64180aa3"
        );
    }

    #[test]
    fn test_legacy_v1_2_synthesizes_v1_args() {
        let lane = legacy_lane(ProtocolVersion::V1_2);
        let message =
            normalize_message(&ChainRegistry::builtin(), &legacy_event(), &lane).unwrap();
        assert_eq!(
            message.extra_args,
            ExtraArgs::EvmV1 {
                gas_limit: U256::from(200_000u64)
            }
        );
        assert!(!message.allow_out_of_order_execution());
    }

    #[test]
    fn test_snake_case_legacy_keys() {
        let event = json!({
            "source_chain_selector": ETHEREUM,
            "sender": "0xd8da6bf26964af9d7eed9e03e53415d37aa96045",
            "receiver": "0x5fbdb2315678afecb367f032d93f642f64180aa3",
            "sequence_number": "0x10",
            "gas_limit": 1,
            "nonce": 4,
            "fee_token": "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2",
            "message_id": format!("0x{}", "00".repeat(32)),
        });
        let lane = legacy_lane(ProtocolVersion::V1_5);
        let message = normalize_message(&ChainRegistry::builtin(), &event, &lane).unwrap();
        assert_eq!(message.sequence_number(), 16);
        assert_eq!(message.header.nonce, 4);
        assert!(!message.allow_out_of_order_execution());
        assert!(message.data.is_empty());
    }

    #[test]
    fn test_ramp_from_move_wrapper() {
        let message =
            normalize_message(&ChainRegistry::builtin(), &ramp_event(), &aptos_lane()).unwrap();

        assert_eq!(message.source_family, ChainFamily::Aptos);
        assert_eq!(message.dest_family, ChainFamily::Evm);
        assert_eq!(message.sequence_number(), 3);
        assert_eq!(message.header.nonce, 0);
        assert_eq!(message.gas_limit(), U256::from(300_000u64));
        assert!(message.allow_out_of_order_execution());
        assert_eq!(message.raw_extra_args.len(), 37);
        assert_eq!(message.fee_value_juels(), Some(U256::from(200u64)));
        assert_eq!(
            message.fee_token,
            UniversalAddress::parse("0xa", ChainFamily::Aptos).unwrap()
        );

        let transfers = message.token_transfers().unwrap();
        assert_eq!(transfers.len(), 1);
        assert_eq!(transfers[0].dest_gas_amount, 90_000);
        assert_eq!(
            transfers[0].dest_token_address.to_string(),
            "0x514910771AF9Ca656af840dff83E8264EcF986CA"
        );
        assert_eq!(transfers[0].source_pool_address.family(), ChainFamily::Aptos);
    }

    #[test]
    fn test_ramp_empty_extra_args_default() {
        let mut event = ramp_event();
        event["message"]["extra_args"] = json!("0x");
        let message = normalize_message(&ChainRegistry::builtin(), &event, &aptos_lane()).unwrap();
        assert_eq!(
            message.extra_args,
            ExtraArgs::EvmV1 {
                gas_limit: U256::from(200_000u64)
            }
        );
    }

    #[test]
    fn test_dest_exec_data_abi_word() {
        let mut event = ramp_event();
        event["message"]["token_amounts"][0]["dest_exec_data"] =
            json!(format!("0x{:064x}", 70_000u32));
        let message = normalize_message(&ChainRegistry::builtin(), &event, &aptos_lane()).unwrap();
        assert_eq!(message.token_transfers().unwrap()[0].dest_gas_amount, 70_000);

        event["message"]["token_amounts"][0]["dest_exec_data"] = json!("0x0102");
        let err = normalize_message(&ChainRegistry::builtin(), &event, &aptos_lane()).unwrap_err();
        assert!(matches!(err, CcipError::MalformedLog { .. }));
    }

    #[test]
    fn test_shape_must_match_lane_version() {
        let err = normalize_message(
            &ChainRegistry::builtin(),
            &legacy_event(),
            &Lane::resolve(
                &ChainRegistry::builtin(),
                ETHEREUM,
                ARBITRUM,
                "0x0bf3de8c5d3e8a2b34d2beeb17abfcebaf363a59",
                ProtocolVersion::V1_6,
            )
            .unwrap(),
        )
        .unwrap_err();
        assert!(matches!(err, CcipError::MalformedLog { .. }));
    }

    #[test]
    fn test_missing_header_is_malformed() {
        let lane = legacy_lane(ProtocolVersion::V1_5);
        let mut event = legacy_event();
        event.as_object_mut().unwrap().remove("sequenceNumber");
        let err = normalize_message(&ChainRegistry::builtin(), &event, &lane).unwrap_err();
        match err {
            CcipError::MalformedLog { reason, raw } => {
                assert!(reason.contains("sequenceNumber"), "{}", reason);
                assert!(raw.len() <= RAW_EXCERPT_CHARS + 3);
            }
            other => panic!("unexpected {:?}", other),
        }

        let err = normalize_message(&ChainRegistry::builtin(), &json!({"foo": 1}), &lane)
            .unwrap_err();
        assert!(matches!(err, CcipError::MalformedLog { .. }));
    }

    #[test]
    fn test_selector_mismatch_rejected() {
        let mut event = ramp_event();
        event["message"]["header"]["source_chain_selector"] = json!("1");
        let err = normalize_message(&ChainRegistry::builtin(), &event, &aptos_lane()).unwrap_err();
        assert!(matches!(err, CcipError::MalformedLog { .. }));
    }

    #[test]
    fn test_undecodable_extra_args() {
        let mut event = ramp_event();
        event["message"]["extra_args"] = json!("0xdeadbeef00");
        let err = normalize_message(&ChainRegistry::builtin(), &event, &aptos_lane()).unwrap_err();
        match err {
            CcipError::MalformedLog { reason, .. } => assert!(reason.contains("deadbeef")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unknown_lane_selector() {
        let lane = Lane::new(
            1,
            2,
            UniversalAddress::zero(ChainFamily::Evm),
            ProtocolVersion::V1_5,
        )
        .unwrap();
        let err =
            normalize_message(&ChainRegistry::builtin(), &legacy_event(), &lane).unwrap_err();
        assert_eq!(err, CcipError::UnknownChainSelector { selector: 1 });
    }
}
