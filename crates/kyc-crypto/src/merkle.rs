//! # Binary Merkle Hashing and Inclusion Proofs
//!
//! ## Hashing (Domain Separation)
//!
//! - Leaf: `SHA256(0x00 || digest || leaf_index_be64)`. Binding the index
//!   into the leaf means the same digest at two positions yields two
//!   distinct leaves.
//! - Node: `SHA256(0x01 || left || right)`.
//!
//! ## Tree Shape
//!
//! Levels are built bottom-up. A level with an odd number of nodes pads by
//! pairing its last node with itself. A single-leaf tree's root is the leaf
//! hash; the empty tree's root is 32 zero bytes.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use kyc_core::digest::{decode_hex_32, encode_hex};
use kyc_core::{sha256_raw, ContentDigest, ValidationError};

// ---------------------------------------------------------------------------
// MerkleHash
// ---------------------------------------------------------------------------

/// A 32-byte node, leaf, or root hash of the commitment tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MerkleHash([u8; 32]);

impl MerkleHash {
    /// The root of a tree with no leaves.
    pub const EMPTY: MerkleHash = MerkleHash([0u8; 32]);

    /// Wrap raw hash bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Parse from 64 hex digits, with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, ValidationError> {
        decode_hex_32(s).map(Self)
    }

    /// Access the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Render as 64 lowercase hex digits (no prefix).
    pub fn to_hex(&self) -> String {
        encode_hex(&self.0)
    }

    /// Whether this is the empty-tree root.
    pub fn is_empty_root(&self) -> bool {
        *self == Self::EMPTY
    }
}

impl std::fmt::Display for MerkleHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl Serialize for MerkleHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MerkleHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Hashing
// ---------------------------------------------------------------------------

const LEAF_PREFIX: u8 = 0x00;
const NODE_PREFIX: u8 = 0x01;

/// Compute the leaf hash for a digest committed at `leaf_index`.
///
/// `SHA256(0x00 || digest || leaf_index_be64)`.
pub fn leaf_hash(digest: &ContentDigest, leaf_index: u64) -> MerkleHash {
    let mut input = Vec::with_capacity(1 + 32 + 8);
    input.push(LEAF_PREFIX);
    input.extend_from_slice(digest.as_bytes());
    input.extend_from_slice(&leaf_index.to_be_bytes());
    MerkleHash(sha256_raw(&input))
}

/// Compute a parent hash from two children.
///
/// `SHA256(0x01 || left || right)`.
pub fn node_hash(left: &MerkleHash, right: &MerkleHash) -> MerkleHash {
    let mut input = Vec::with_capacity(1 + 32 + 32);
    input.push(NODE_PREFIX);
    input.extend_from_slice(&left.0);
    input.extend_from_slice(&right.0);
    MerkleHash(sha256_raw(&input))
}

/// Number of levels above the leaves in a tree of `size` leaves.
pub(crate) fn tree_depth(size: u64) -> usize {
    if size <= 1 {
        0
    } else {
        (u64::BITS - (size - 1).leading_zeros()) as usize
    }
}

// ---------------------------------------------------------------------------
// Inclusion proof
// ---------------------------------------------------------------------------

/// Which side of the running hash a sibling sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Sibling is to the left of the current node.
    Left,
    /// Sibling is to the right of the current node.
    Right,
}

impl Side {
    /// Lowercase name, as serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single step in an inclusion proof path, ordered leaf to root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathStep {
    /// Which side the sibling is on.
    pub side: Side,
    /// Sibling hash.
    pub hash: MerkleHash,
}

/// Proof that a leaf is included under a root.
///
/// Self-contained: a relying party can check it with [`verify`] without
/// access to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InclusionProof {
    /// Position of the leaf.
    pub leaf_index: u64,
    /// Number of leaves in the tree the proof was generated from.
    pub tree_size: u64,
    /// The leaf being proved.
    pub leaf_hash: MerkleHash,
    /// Sibling path from leaf to root.
    pub path: Vec<PathStep>,
    /// Root the proof was generated against.
    pub root: MerkleHash,
}

impl InclusionProof {
    /// Check the proof against its own recorded leaf hash and root.
    pub fn verify(&self) -> bool {
        verify(&self.leaf_hash, self, &self.root)
    }

    /// Recompute the root implied by `leaf` and this proof's path.
    pub fn compute_root(&self, leaf: &MerkleHash) -> MerkleHash {
        self.path.iter().fold(*leaf, |cur, step| match step.side {
            Side::Left => node_hash(&step.hash, &cur),
            Side::Right => node_hash(&cur, &step.hash),
        })
    }
}

/// Verify that `leaf` is included under `root` according to `proof`.
///
/// Returns `false` for any malformed proof: an index outside the tree, a
/// path whose length does not match the tree size, or sides that do not
/// match the leaf position.
pub fn verify(leaf: &MerkleHash, proof: &InclusionProof, root: &MerkleHash) -> bool {
    if proof.tree_size == 0 || proof.leaf_index >= proof.tree_size {
        return false;
    }
    if proof.path.len() != tree_depth(proof.tree_size) {
        return false;
    }
    let sides_match = proof.path.iter().enumerate().all(|(level, step)| {
        let is_right_child = (proof.leaf_index >> level) & 1 == 1;
        match step.side {
            Side::Left => is_right_child,
            Side::Right => !is_right_child,
        }
    });
    if !sides_match {
        return false;
    }
    proof.compute_root(leaf) == *root
}
