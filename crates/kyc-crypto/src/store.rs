//! # Commitment Store
//!
//! Append-only accumulator over credential digests. Each append:
//!
//! 1. assigns the next leaf index (strictly increasing, no gaps),
//! 2. recomputes the ancestor path of the new leaf up to the root,
//! 3. generates the inclusion proof for the new leaf and checks it against
//!    the new root before accepting the write,
//! 4. records that proof keyed by `(leaf_index, root_at_insertion)`.
//!
//! The store itself is synchronous; callers serialize writers (the
//! lifecycle manager holds it behind a FIFO async mutex).
//!
//! ## Corruption
//!
//! If a freshly generated proof does not verify, or [`CommitmentStore::check_integrity`]
//! finds that a rebuild from the stored leaves disagrees with the stored
//! root, the store is marked corrupt. A corrupt store still serves reads
//! but rejects every append with [`CommitmentError::StoreCorrupt`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use kyc_core::ContentDigest;

use crate::error::CommitmentError;
use crate::merkle::{leaf_hash, node_hash, InclusionProof, MerkleHash, PathStep, Side};

/// One committed digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitmentEntry {
    /// Position in the tree.
    pub leaf_index: u64,
    /// The committed credential digest.
    pub digest: ContentDigest,
    /// `SHA256(0x00 || digest || leaf_index_be64)`, fixed at insertion.
    pub leaf_hash: MerkleHash,
}

/// Result of a successful append.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendReceipt {
    /// Position assigned to the new leaf.
    pub leaf_index: u64,
    /// Hash of the new leaf.
    pub leaf_hash: MerkleHash,
    /// Inclusion proof against the new root.
    pub proof: InclusionProof,
    /// Root after the append.
    pub root: MerkleHash,
}

/// Binary Merkle accumulator with recorded insertion proofs.
#[derive(Debug, Clone, Default)]
pub struct CommitmentStore {
    entries: Vec<CommitmentEntry>,
    /// `levels[0]` holds leaf hashes; the last level holds the root.
    levels: Vec<Vec<MerkleHash>>,
    by_digest: HashMap<ContentDigest, u64>,
    insertion_proofs: HashMap<(u64, MerkleHash), InclusionProof>,
    corrupt: bool,
}

impl CommitmentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed leaves.
    pub fn len(&self) -> u64 {
        self.entries.len() as u64
    }

    /// Whether no leaves have been committed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether corruption has been detected.
    pub fn is_corrupt(&self) -> bool {
        self.corrupt
    }

    /// The current root, or [`MerkleHash::EMPTY`] when there are no leaves.
    pub fn current_root(&self) -> MerkleHash {
        self.levels
            .last()
            .and_then(|top| top.first())
            .copied()
            .unwrap_or(MerkleHash::EMPTY)
    }

    /// Commit `digest` as the next leaf.
    ///
    /// # Errors
    ///
    /// - [`CommitmentError::StoreCorrupt`] if the store is already corrupt or
    ///   the new leaf's proof fails to verify against the recomputed root.
    /// - [`CommitmentError::DuplicateDigest`] if the digest is already
    ///   committed.
    pub fn append(&mut self, digest: ContentDigest) -> Result<AppendReceipt, CommitmentError> {
        if self.corrupt {
            return Err(CommitmentError::StoreCorrupt {
                reason: "store is poisoned by an earlier integrity failure".into(),
            });
        }
        if let Some(&existing) = self.by_digest.get(&digest) {
            return Err(CommitmentError::DuplicateDigest {
                digest,
                leaf_index: existing,
            });
        }

        let leaf_index = self.len();
        let leaf = leaf_hash(&digest, leaf_index);
        if self.levels.is_empty() {
            self.levels.push(Vec::new());
        }
        self.levels[0].push(leaf);
        self.recompute_path(leaf_index as usize);

        let root = self.current_root();
        let proof = self.build_proof(leaf_index)?;
        if !proof.verify() {
            self.corrupt = true;
            tracing::error!(leaf_index, %root, "fresh inclusion proof failed to verify");
            return Err(CommitmentError::StoreCorrupt {
                reason: format!("proof for leaf {leaf_index} does not verify against root {root}"),
            });
        }

        self.entries.push(CommitmentEntry {
            leaf_index,
            digest,
            leaf_hash: leaf,
        });
        self.by_digest.insert(digest, leaf_index);
        self.insertion_proofs.insert((leaf_index, root), proof.clone());

        tracing::debug!(leaf_index, %digest, %root, "digest committed");

        Ok(AppendReceipt {
            leaf_index,
            leaf_hash: leaf,
            proof,
            root,
        })
    }

    /// Inclusion proof for `leaf_index` against the current root.
    pub fn proof(&self, leaf_index: u64) -> Result<InclusionProof, CommitmentError> {
        self.build_proof(leaf_index)
    }

    /// The proof recorded when `leaf_index` was inserted, if `root` was the
    /// root produced by that insertion.
    pub fn proof_at_insertion(&self, leaf_index: u64, root: &MerkleHash) -> Option<&InclusionProof> {
        self.insertion_proofs.get(&(leaf_index, *root))
    }

    /// The entry at `leaf_index`.
    pub fn entry(&self, leaf_index: u64) -> Option<&CommitmentEntry> {
        usize::try_from(leaf_index)
            .ok()
            .and_then(|i| self.entries.get(i))
    }

    /// The entry committing `digest`, if any.
    pub fn find_by_digest(&self, digest: &ContentDigest) -> Option<&CommitmentEntry> {
        self.by_digest.get(digest).and_then(|&i| self.entry(i))
    }

    /// All entries in insertion order.
    pub fn entries(&self) -> &[CommitmentEntry] {
        &self.entries
    }

    /// Rebuild the tree from stored leaves and compare with the stored root.
    ///
    /// Marks the store corrupt on mismatch.
    pub fn check_integrity(&mut self) -> Result<MerkleHash, CommitmentError> {
        let stored = self.current_root();
        let rebuilt = self.rebuild_root();
        if rebuilt != stored {
            self.corrupt = true;
            tracing::error!(%stored, %rebuilt, "commitment store root mismatch");
            return Err(CommitmentError::StoreCorrupt {
                reason: format!("stored root {stored} does not match rebuilt root {rebuilt}"),
            });
        }
        Ok(stored)
    }

    /// Update every ancestor of the leaf at `index`.
    ///
    /// Only the rightmost node of each level can change on append, so the
    /// parent either replaces the last node of the next level or extends it.
    fn recompute_path(&mut self, mut index: usize) {
        let mut level = 0;
        while self.levels[level].len() > 1 {
            let parent = index / 2;
            let nodes = &self.levels[level];
            let left = nodes[parent * 2];
            let right = nodes.get(parent * 2 + 1).copied().unwrap_or(left);
            let hash = node_hash(&left, &right);

            if self.levels.len() == level + 1 {
                self.levels.push(Vec::new());
            }
            let next = &mut self.levels[level + 1];
            if parent < next.len() {
                next[parent] = hash;
            } else {
                next.push(hash);
            }
            index = parent;
            level += 1;
        }
    }

    fn build_proof(&self, leaf_index: u64) -> Result<InclusionProof, CommitmentError> {
        let size = self.levels.first().map_or(0, |l| l.len() as u64);
        let out_of_range = CommitmentError::LeafOutOfRange { leaf_index, size };
        let mut index = usize::try_from(leaf_index).map_err(|_| out_of_range.clone())?;
        let leaf = *self
            .levels
            .first()
            .and_then(|l| l.get(index))
            .ok_or(out_of_range)?;

        let mut path = Vec::new();
        for nodes in &self.levels {
            if nodes.len() <= 1 {
                break;
            }
            let step = if index % 2 == 1 {
                PathStep {
                    side: Side::Left,
                    hash: nodes[index - 1],
                }
            } else {
                PathStep {
                    side: Side::Right,
                    hash: nodes.get(index + 1).copied().unwrap_or(nodes[index]),
                }
            };
            path.push(step);
            index /= 2;
        }

        Ok(InclusionProof {
            leaf_index,
            tree_size: size,
            leaf_hash: leaf,
            path,
            root: self.current_root(),
        })
    }

    fn rebuild_root(&self) -> MerkleHash {
        let mut level: Vec<MerkleHash> = self
            .entries
            .iter()
            .map(|e| leaf_hash(&e.digest, e.leaf_index))
            .collect();
        if level.is_empty() {
            return MerkleHash::EMPTY;
        }
        while level.len() > 1 {
            level = level
                .chunks(2)
                .map(|pair| node_hash(&pair[0], &pair[pair.len() - 1]))
                .collect();
        }
        level[0]
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::merkle::verify;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn every_proof_verifies(seeds in proptest::collection::hash_set(any::<[u8; 32]>(), 1..40)) {
            let mut store = CommitmentStore::new();
            let mut receipts = Vec::new();
            for s in &seeds {
                let r = store.append(ContentDigest::from_bytes(*s)).unwrap();
                prop_assert!(verify(&r.leaf_hash, &r.proof, &r.root));
                receipts.push(r);
            }
            let root = store.current_root();
            for r in &receipts {
                let p = store.proof(r.leaf_index).unwrap();
                prop_assert!(verify(&r.leaf_hash, &p, &root));
            }
            prop_assert_eq!(store.check_integrity().unwrap(), root);
        }
    }
}
