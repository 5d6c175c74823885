//! Hash primitives shared by the leaf hashers and the merkle calculator
//!
//! Domain strings are stored as precomputed constants; the unit tests below
//! re-derive each of them from its source string.

use alloy::primitives::{b256, B256};
use tiny_keccak::{Hasher, Keccak};

/// Compute keccak256 hash of data
pub fn keccak256(data: impl AsRef<[u8]>) -> B256 {
    let mut hasher = Keccak::v256();
    hasher.update(data.as_ref());
    let mut output = [0u8; 32];
    hasher.finalize(&mut output);
    B256::from(output)
}

/// keccak256 over the concatenation of several parts
pub fn keccak256_concat(parts: &[&[u8]]) -> B256 {
    let mut hasher = Keccak::v256();
    for part in parts {
        hasher.update(part);
    }
    let mut output = [0u8; 32];
    hasher.finalize(&mut output);
    B256::from(output)
}

// ============================================================================
// Merkle Domain Separators
// ============================================================================

/// Prefix of every leaf preimage
pub const LEAF_DOMAIN_SEPARATOR: B256 = B256::ZERO;

/// Prefix of every internal node preimage
pub const INTERNAL_DOMAIN_SEPARATOR: B256 =
    b256!("0000000000000000000000000000000000000000000000000000000000000001");

// ============================================================================
// Message Hash Domains
// ============================================================================

/// keccak256("EVM2EVMMessageHashV2"), 1.2 and 1.5 lanes
pub const EVM_2_EVM_MESSAGE_HASH: B256 =
    b256!("8acd72527118c8324937b1a42e02cd246697c3b633f1742f3cae11de233722b3");

/// keccak256("Any2EVMMessageHashV1")
pub const ANY_2_EVM_MESSAGE_HASH: B256 =
    b256!("2425b0b9f9054c76ff151b0a175b18f37a4a4e82013a72e9f15c9caa095ed21f");

/// keccak256("Any2SVMMessageHashV1")
pub const ANY_2_SVM_MESSAGE_HASH: B256 =
    b256!("3e059d12554ba423ecffab3871d74b95885c1ebcc4531aa8e8cbe7c273a2af9d");

/// keccak256("Any2AptosMessageHashV1")
pub const ANY_2_APTOS_MESSAGE_HASH: B256 =
    b256!("5dcdb5b60f6482457a0a2e965a99d0efdc16f4f317c2b13d9ead0cdcea8fd87a");

/// keccak256("Any2SuiMessageHashV1")
pub const ANY_2_SUI_MESSAGE_HASH: B256 =
    b256!("24dae8b41ecd0ee2ba6f31166456725910af161f18f94257ef6081dfd64eb208");

/// The SVM offramp hashes the domain string itself rather than its digest
pub const ANY_2_SVM_MESSAGE_HASH_PREFIX: &[u8] = b"Any2SVMMessageHashV1";

/// Parent of two nodes: `keccak256(INTERNAL ++ min(a, b) ++ max(a, b))`
pub fn hash_internal_node(a: &B256, b: &B256) -> B256 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    keccak256_concat(&[
        INTERNAL_DOMAIN_SEPARATOR.as_slice(),
        lo.as_slice(),
        hi.as_slice(),
    ])
}

/// Convert bytes to hex string with 0x prefix
pub fn bytes32_to_hex(bytes: &B256) -> String {
    format!("0x{}", hex::encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keccak256() {
        let result = keccak256(b"hello");
        assert_eq!(
            bytes32_to_hex(&result),
            "0x1c8aff950685c2ed4bc3174f3472287b56d9517b9c948127319a09a7a36deac8"
        );
        assert_eq!(
            bytes32_to_hex(&keccak256(b"")),
            "0xc5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_keccak256_concat_matches_single_buffer() {
        let joined = keccak256(b"helloworld");
        let parts = keccak256_concat(&[b"hello".as_slice(), b"world".as_slice()]);
        assert_eq!(joined, parts);
    }

    #[test]
    fn test_domain_constants() {
        assert_eq!(keccak256(b"EVM2EVMMessageHashV2"), EVM_2_EVM_MESSAGE_HASH);
        assert_eq!(keccak256(b"Any2EVMMessageHashV1"), ANY_2_EVM_MESSAGE_HASH);
        assert_eq!(keccak256(b"Any2SVMMessageHashV1"), ANY_2_SVM_MESSAGE_HASH);
        assert_eq!(keccak256(b"Any2AptosMessageHashV1"), ANY_2_APTOS_MESSAGE_HASH);
        assert_eq!(keccak256(b"Any2SuiMessageHashV1"), ANY_2_SUI_MESSAGE_HASH);
        assert_eq!(keccak256(ANY_2_SVM_MESSAGE_HASH_PREFIX), ANY_2_SVM_MESSAGE_HASH);
    }

    #[test]
    fn test_internal_node_is_order_independent() {
        let a = keccak256(b"a");
        let b = keccak256(b"b");
        assert_eq!(hash_internal_node(&a, &b), hash_internal_node(&b, &a));
        assert_ne!(hash_internal_node(&a, &b), hash_internal_node(&a, &a));
    }

    #[test]
    fn test_internal_node_preimage() {
        let a = B256::repeat_byte(0x11);
        let b = B256::repeat_byte(0x22);
        let mut preimage = Vec::new();
        preimage.extend_from_slice(INTERNAL_DOMAIN_SEPARATOR.as_slice());
        preimage.extend_from_slice(a.as_slice());
        preimage.extend_from_slice(b.as_slice());
        assert_eq!(hash_internal_node(&b, &a), keccak256(&preimage));
    }
}
