//! Leaf Hasher
//!
//! Reproduces, off-chain, the leaf hash a destination offRamp computes for a
//! message. The scheme is picked by destination family and protocol version:
//!
//! | Destination | Version | Scheme | Serialization |
//! |-------------|---------|--------|---------------|
//! | EVM   | 1.2, 1.5 | `EVM2EVMMessageHashV2` | ABI words |
//! | EVM   | 1.6 | `Any2EVMMessageHashV1` | ABI words |
//! | SVM   | 1.6 | `Any2SVMMessageHashV1` | Borsh |
//! | Aptos | 1.6 | `Any2AptosMessageHashV1` | BCS |
//! | Sui   | 1.6 | `Any2SuiMessageHashV1` | BCS |
//!
//! Every scheme is two-stage: a metadata hash binding the lane, then a leaf
//! hash over `LEAF_DOMAIN_SEPARATOR`, the metadata hash and the message.
//! Token transfers are hashed in the order they appear on the message.

mod aptos;
mod evm;
mod sui;
mod svm;

use alloy::primitives::B256;

use crate::address_codec::UniversalAddress;
use crate::error::{CcipError, Result};
use crate::registry::ChainRegistry;
use crate::types::{ChainFamily, Lane, Message, ProtocolVersion};

/// On-chain hashing scheme of a lane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeafScheme {
    Evm2Evm,
    Any2Evm,
    Any2Svm,
    Any2Aptos,
    Any2Sui,
}

impl LeafScheme {
    /// Scheme used by a destination offRamp, if one exists
    pub fn select(
        source_family: ChainFamily,
        dest_family: ChainFamily,
        version: ProtocolVersion,
    ) -> Result<Self> {
        let scheme = match (dest_family, version.is_legacy()) {
            (ChainFamily::Evm, true) if source_family == ChainFamily::Evm => LeafScheme::Evm2Evm,
            (ChainFamily::Evm, false) => LeafScheme::Any2Evm,
            (ChainFamily::Svm, false) => LeafScheme::Any2Svm,
            (ChainFamily::Aptos, false) => LeafScheme::Any2Aptos,
            (ChainFamily::Sui, false) => LeafScheme::Any2Sui,
            _ => {
                return Err(CcipError::UnsupportedVersionForHasher {
                    family: dest_family,
                    version,
                })
            }
        };
        Ok(scheme)
    }

    /// Scheme for `lane`, with families resolved through `registry`
    pub fn for_lane(registry: &ChainRegistry, lane: &Lane) -> Result<Self> {
        // Lane fields are public, so a literal can skip `Lane::new`
        if lane.source_chain_selector == lane.dest_chain_selector {
            return Err(CcipError::InvalidLane {
                selector: lane.source_chain_selector,
            });
        }
        let source_family = registry.family_of(lane.source_chain_selector)?;
        let dest_family = registry.family_of(lane.dest_chain_selector)?;
        Self::select(source_family, dest_family, lane.version)
    }

    /// Whether the source-side message id equals the destination leaf hash
    pub fn id_is_leaf(&self) -> bool {
        matches!(self, LeafScheme::Evm2Evm)
    }

    pub fn metadata_hash(&self, lane: &Lane) -> Result<B256> {
        match self {
            LeafScheme::Evm2Evm => evm::legacy_metadata_hash(lane),
            LeafScheme::Any2Evm => Ok(evm::metadata_hash(lane)),
            LeafScheme::Any2Svm => Ok(svm::metadata_hash(lane)),
            LeafScheme::Any2Aptos => Ok(aptos::metadata_hash(lane)),
            LeafScheme::Any2Sui => Ok(sui::metadata_hash(lane)),
        }
    }

    pub fn leaf_hash(&self, lane: &Lane, message: &Message) -> Result<B256> {
        let metadata_hash = self.metadata_hash(lane)?;
        match self {
            LeafScheme::Evm2Evm => evm::legacy_leaf_hash(metadata_hash, message),
            LeafScheme::Any2Evm => evm::leaf_hash(metadata_hash, message),
            LeafScheme::Any2Svm => svm::leaf_hash(metadata_hash, message),
            LeafScheme::Any2Aptos => aptos::leaf_hash(metadata_hash, message),
            LeafScheme::Any2Sui => sui::leaf_hash(metadata_hash, message),
        }
    }
}

/// Metadata hash binding `lane` to its hashing scheme
pub fn metadata_hash(registry: &ChainRegistry, lane: &Lane) -> Result<B256> {
    LeafScheme::for_lane(registry, lane)?.metadata_hash(lane)
}

/// Leaf hash of `message` as computed by the destination of `lane`
pub fn leaf_hash(registry: &ChainRegistry, lane: &Lane, message: &Message) -> Result<B256> {
    if message.version != lane.version {
        return Err(CcipError::UnsupportedVersionForHasher {
            family: message.dest_family,
            version: message.version,
        });
    }
    LeafScheme::for_lane(registry, lane)?.leaf_hash(lane, message)
}

/// Leaf hash, checked against the declared message id where the scheme
/// makes them equal
pub fn verify_message_id(registry: &ChainRegistry, lane: &Lane, message: &Message) -> Result<B256> {
    let scheme = LeafScheme::for_lane(registry, lane)?;
    let leaf = leaf_hash(registry, lane, message)?;
    if scheme.id_is_leaf() && leaf != message.message_id() {
        return Err(CcipError::MessageIdMismatch {
            sequence_number: message.sequence_number(),
            declared: message.message_id(),
            computed: leaf,
        });
    }
    Ok(leaf)
}

/// Message body of the wrong generation for the scheme
fn body_mismatch(message: &Message) -> CcipError {
    CcipError::UnsupportedVersionForHasher {
        family: message.dest_family,
        version: message.version,
    }
}

fn bytes32(address: &UniversalAddress) -> Result<[u8; 32]> {
    Ok(address.to_bytes32()?.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_selection() {
        use ChainFamily::*;
        use ProtocolVersion::*;

        assert_eq!(LeafScheme::select(Evm, Evm, V1_5).unwrap(), LeafScheme::Evm2Evm);
        assert_eq!(LeafScheme::select(Evm, Evm, V1_2).unwrap(), LeafScheme::Evm2Evm);
        assert_eq!(LeafScheme::select(Aptos, Evm, V1_6).unwrap(), LeafScheme::Any2Evm);
        assert_eq!(LeafScheme::select(Evm, Svm, V1_6).unwrap(), LeafScheme::Any2Svm);
        assert_eq!(LeafScheme::select(Evm, Aptos, V1_6).unwrap(), LeafScheme::Any2Aptos);
        assert_eq!(LeafScheme::select(Svm, Sui, V1_6).unwrap(), LeafScheme::Any2Sui);

        assert_eq!(
            LeafScheme::select(Evm, Ton, V1_6).unwrap_err(),
            CcipError::UnsupportedVersionForHasher {
                family: Ton,
                version: V1_6
            }
        );
        assert!(LeafScheme::select(Evm, Svm, V1_5).is_err());
        assert!(LeafScheme::select(Svm, Evm, V1_5).is_err());
    }

    #[test]
    fn test_same_selector_lane_is_rejected() {
        let registry = ChainRegistry::builtin();
        let lane = Lane {
            source_chain_selector: 5009297550715157269,
            dest_chain_selector: 5009297550715157269,
            on_ramp: UniversalAddress::parse(
                "0x0bf3de8c5d3e8a2b34d2beeb17abfcebaf363a59",
                ChainFamily::Evm,
            )
            .unwrap(),
            version: ProtocolVersion::V1_6,
        };

        let expected = CcipError::InvalidLane {
            selector: 5009297550715157269,
        };
        assert_eq!(LeafScheme::for_lane(&registry, &lane).unwrap_err(), expected);
        assert_eq!(metadata_hash(&registry, &lane).unwrap_err(), expected);
    }

    #[test]
    fn test_only_legacy_ids_are_leaves() {
        assert!(LeafScheme::Evm2Evm.id_is_leaf());
        assert!(!LeafScheme::Any2Evm.id_is_leaf());
        assert!(!LeafScheme::Any2Sui.id_is_leaf());
    }
}
