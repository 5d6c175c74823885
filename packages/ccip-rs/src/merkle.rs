//! Merkle Multiproof Calculator
//!
//! Builds the commit tree of a batch, checks it against an observed root and
//! derives the multiproof the destination offRamp verifies.
//!
//! ## Tree
//!
//! Leaves stay in sequence-number order. Each level pairs adjacent nodes as
//! `keccak256(INTERNAL_DOMAIN_SEPARATOR ++ min(a, b) ++ max(a, b))`; an odd
//! trailing node moves up unchanged. A single leaf is its own root.
//!
//! ## Proof Format
//!
//! The verifier replays `leaves.len() + proofs.len() - 1` hash steps over a
//! queue holding the proven leaves followed by every hash it computed. Bit
//! `i` of `proofFlagBits` (least significant first) selects the first operand
//! of step `i`: 1 takes it from the queue, 0 takes the next entry of
//! `proofs`. The second operand always comes from the queue.

use alloy::primitives::{B256, U256};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use crate::error::{CcipError, Result};
use crate::hash::hash_internal_node;
use crate::hasher::{verify_message_id, LeafScheme};
use crate::registry::ChainRegistry;
use crate::types::{Lane, Message, ProofBundle};

/// Most hash steps the on-chain verifier accepts
pub const MAX_NUM_HASHES: usize = 256;

// ============================================================================
// Tree
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleTree {
    /// `layers[0]` are the leaves, the last layer holds the root
    layers: Vec<Vec<B256>>,
}

/// Sibling hashes plus the flag script reconstructing the root
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultiProof {
    pub proofs: Vec<B256>,
    pub proof_flag_bits: U256,
}

impl MerkleTree {
    pub fn new(leaves: Vec<B256>) -> Result<Self> {
        if leaves.is_empty() {
            return Err(CcipError::EmptyBatch);
        }

        let mut layers = vec![leaves];
        while let Some(layer) = layers.last().filter(|layer| layer.len() > 1) {
            let next = layer
                .chunks(2)
                .map(|pair| match pair {
                    [a, b] => hash_internal_node(a, b),
                    _ => pair[0],
                })
                .collect();
            layers.push(next);
        }
        Ok(Self { layers })
    }

    pub fn root(&self) -> B256 {
        self.layers
            .last()
            .and_then(|layer| layer.first())
            .copied()
            .unwrap_or_default()
    }

    pub fn leaves(&self) -> &[B256] {
        &self.layers[0]
    }

    pub fn len(&self) -> usize {
        self.layers[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers[0].is_empty()
    }

    /// Multiproof for the leaves at `indices`
    ///
    /// The result is replayed through [`verify_multi_proof`] before it is
    /// returned; index sets whose proof the queue order cannot express fail
    /// with [`CcipError::InvalidProof`].
    pub fn prove(&self, indices: &[usize]) -> Result<MultiProof> {
        let mut known = indices.to_vec();
        known.sort_unstable();
        known.dedup();

        if known.is_empty() {
            return Err(CcipError::InvalidProof {
                reason: "no leaves to prove".to_string(),
            });
        }
        if let Some(out_of_range) = known.iter().find(|i| **i >= self.len()) {
            return Err(CcipError::InvalidProof {
                reason: format!("leaf index {} outside a tree of {}", out_of_range, self.len()),
            });
        }

        let mut proofs = Vec::new();
        let mut flags = Vec::new();
        for layer in &self.layers[..self.layers.len() - 1] {
            let mut parents = Vec::with_capacity(known.len());
            let mut i = 0;
            while i < known.len() {
                let index = known[i];
                let sibling = index ^ 1;
                if sibling >= layer.len() {
                    // promoted without a hash step
                    i += 1;
                } else if known.get(i + 1) == Some(&sibling) {
                    flags.push(true);
                    i += 2;
                } else {
                    flags.push(false);
                    proofs.push(layer[sibling]);
                    i += 1;
                }
                parents.push(index / 2);
            }
            known = parents;
        }

        if flags.len() > MAX_NUM_HASHES {
            return Err(CcipError::InvalidProof {
                reason: format!("{} hash steps exceed {}", flags.len(), MAX_NUM_HASHES),
            });
        }
        let mut proof_flag_bits = U256::ZERO;
        for (i, flag) in flags.iter().enumerate() {
            proof_flag_bits.set_bit(i, *flag);
        }

        let mut sorted = indices.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        let leaves: Vec<B256> = sorted.iter().map(|i| self.layers[0][*i]).collect();
        let reconstructed = verify_multi_proof(&leaves, &proofs, proof_flag_bits)?;
        if reconstructed != self.root() {
            return Err(CcipError::InvalidProof {
                reason: format!(
                    "proof for leaves {:?} reconstructs {} instead of {}",
                    sorted,
                    reconstructed,
                    self.root()
                ),
            });
        }

        tracing::debug!(
            leaves = sorted.len(),
            proofs = proofs.len(),
            steps = flags.len(),
            "Derived multiproof"
        );

        Ok(MultiProof {
            proofs,
            proof_flag_bits,
        })
    }
}

// ============================================================================
// Verifier
// ============================================================================

/// FIFO over the proven leaves, then the hashes computed so far
struct HashQueue<'a> {
    leaves: &'a [B256],
    leaf_pos: usize,
    hash_pos: usize,
}

impl HashQueue<'_> {
    fn pop(&mut self, hashes: &[B256]) -> Result<B256> {
        if self.leaf_pos < self.leaves.len() {
            self.leaf_pos += 1;
            return Ok(self.leaves[self.leaf_pos - 1]);
        }
        let hash = hashes.get(self.hash_pos).copied().ok_or_else(|| CcipError::InvalidProof {
            reason: "step reads a hash that has not been computed yet".to_string(),
        })?;
        self.hash_pos += 1;
        Ok(hash)
    }
}

/// Reconstruct the root from `leaves` and a multiproof, the way the
/// destination offRamp does
pub fn verify_multi_proof(leaves: &[B256], proofs: &[B256], proof_flag_bits: U256) -> Result<B256> {
    if leaves.is_empty() {
        return Err(CcipError::InvalidProof {
            reason: "no leaves".to_string(),
        });
    }
    let total_hashes = leaves.len() + proofs.len() - 1;
    if leaves.len() > MAX_NUM_HASHES + 1
        || proofs.len() > MAX_NUM_HASHES + 1
        || total_hashes > MAX_NUM_HASHES
    {
        return Err(CcipError::InvalidProof {
            reason: format!(
                "{} leaves and {} proofs exceed the verifier limits",
                leaves.len(),
                proofs.len()
            ),
        });
    }
    if total_hashes == 0 {
        return Ok(leaves[0]);
    }

    let mut hashes = Vec::with_capacity(total_hashes);
    let mut queue = HashQueue {
        leaves,
        leaf_pos: 0,
        hash_pos: 0,
    };
    let mut proof_pos = 0;

    for i in 0..total_hashes {
        let a = if proof_flag_bits.bit(i) {
            queue.pop(&hashes)?
        } else {
            let proof = proofs.get(proof_pos).copied().ok_or_else(|| CcipError::InvalidProof {
                reason: format!("step {} needs more than {} proofs", i, proofs.len()),
            })?;
            proof_pos += 1;
            proof
        };
        let b = queue.pop(&hashes)?;
        hashes.push(hash_internal_node(&a, &b));
    }

    if queue.hash_pos != total_hashes - 1
        || queue.leaf_pos != leaves.len()
        || proof_pos != proofs.len()
    {
        return Err(CcipError::InvalidProof {
            reason: "proof does not consume every leaf and proof exactly once".to_string(),
        });
    }
    Ok(hashes[total_hashes - 1])
}

// ============================================================================
// Batch Proofs
// ============================================================================

/// Proof for one message of a committed batch
pub fn compute_proof(
    registry: &ChainRegistry,
    lane: &Lane,
    batch: &[Message],
    target_message_id: B256,
    expected_root: Option<B256>,
) -> Result<ProofBundle> {
    compute_multi_proof(registry, lane, batch, &[target_message_id], None, expected_root)
}

/// Proof for several messages of a committed batch
///
/// `batch` may hold messages of other lanes or outside the commit interval;
/// they are skipped. Without an explicit `interval` the batch is assumed to
/// span its lowest to highest sequence number.
pub fn compute_multi_proof(
    registry: &ChainRegistry,
    lane: &Lane,
    batch: &[Message],
    target_message_ids: &[B256],
    interval: Option<(u64, u64)>,
    expected_root: Option<B256>,
) -> Result<ProofBundle> {
    LeafScheme::for_lane(registry, lane)?;
    let selected = select_batch(lane, batch, interval);
    let (Some(first), Some(last)) = (selected.keys().next(), selected.keys().next_back()) else {
        return Err(CcipError::EmptyBatch);
    };
    let (min_seq_nr, max_seq_nr) = interval.unwrap_or((*first, *last));

    let expected = max_seq_nr.saturating_sub(min_seq_nr).saturating_add(1);
    let found = selected.len() as u64;
    if found != expected {
        return Err(CcipError::IncompleteBatch {
            min_seq_nr,
            max_seq_nr,
            expected,
            found,
        });
    }

    let messages: Vec<&Message> = selected.into_values().collect();

    let mut indices = Vec::with_capacity(target_message_ids.len());
    for target in target_message_ids {
        let index = messages
            .iter()
            .position(|m| m.message_id() == *target)
            .ok_or(CcipError::MessageIdNotInBatch {
                message_id: *target,
            })?;
        indices.push(index);
    }

    let leaves = messages
        .iter()
        .map(|m| verify_message_id(registry, lane, m))
        .collect::<Result<Vec<_>>>()?;
    let tree = MerkleTree::new(leaves)?;
    let merkle_root = tree.root();

    tracing::debug!(
        source = lane.source_chain_selector,
        dest = lane.dest_chain_selector,
        min_seq_nr,
        max_seq_nr,
        leaves = tree.len(),
        root = %merkle_root,
        "Built commit tree"
    );

    if let Some(expected) = expected_root {
        if expected != merkle_root {
            tracing::warn!(
                expected = %expected,
                computed = %merkle_root,
                min_seq_nr,
                max_seq_nr,
                "Merkle root mismatch"
            );
            return Err(CcipError::MerkleRootMismatch {
                expected,
                computed: merkle_root,
            });
        }
    }

    let proof = tree.prove(&indices)?;

    indices.sort_unstable();
    indices.dedup();
    Ok(ProofBundle {
        messages: indices.iter().map(|i| messages[*i].clone()).collect(),
        proofs: proof.proofs,
        proof_flag_bits: proof.proof_flag_bits,
        merkle_root,
    })
}

/// Messages of `lane` (within `interval`, if given) keyed by sequence number
fn select_batch<'a>(
    lane: &Lane,
    batch: &'a [Message],
    interval: Option<(u64, u64)>,
) -> BTreeMap<u64, &'a Message> {
    let mut selected = BTreeMap::new();
    for message in batch {
        let seq_nr = message.sequence_number();
        let on_lane = message.header.source_chain_selector == lane.source_chain_selector
            && message.header.dest_chain_selector == lane.dest_chain_selector
            && message.version == lane.version;
        if !on_lane {
            tracing::warn!(
                seq_nr,
                source = message.header.source_chain_selector,
                dest = message.header.dest_chain_selector,
                version = %message.version,
                "Skipping message from another lane"
            );
            continue;
        }
        if let Some((min, max)) = interval {
            if seq_nr < min || seq_nr > max {
                tracing::warn!(seq_nr, min, max, "Skipping message outside the commit interval");
                continue;
            }
        }
        match selected.entry(seq_nr) {
            Entry::Vacant(slot) => {
                slot.insert(message);
            }
            Entry::Occupied(existing) => {
                tracing::warn!(
                    seq_nr,
                    kept = %existing.get().message_id(),
                    dropped = %message.message_id(),
                    "Skipping duplicate sequence number"
                );
            }
        }
    }
    selected
}
