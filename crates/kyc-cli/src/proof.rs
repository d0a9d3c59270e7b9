//! # Verify-Proof Subcommand
//!
//! Checks a Merkle inclusion proof offline, the way a relying party would:
//! no store, no chain, only the leaf, the sibling path and a root.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use serde::{Deserialize, Serialize};

use kyc_crypto::{InclusionProof, MerkleHash};

/// A proof as written by `kyc issue --proof-out`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofFile {
    pub leaf: MerkleHash,
    pub proof: InclusionProof,
    /// Root to check against. Falls back to the root recorded in the proof.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<MerkleHash>,
}

impl ProofFile {
    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize proof")?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write proof to {}", path.display()))
    }
}

/// Arguments for `kyc verify-proof`.
#[derive(Args, Debug)]
pub struct VerifyProofArgs {
    /// Proof file (JSON or YAML).
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Root to verify against, overriding the one in the file.
    #[arg(long, value_name = "HEX")]
    pub root: Option<String>,
}

/// Exit code 0 when the proof holds, 1 when it does not.
pub fn run_verify_proof(args: &VerifyProofArgs) -> Result<u8> {
    let file: ProofFile = crate::read_document(&args.file)?;
    let root = match &args.root {
        Some(hex) => MerkleHash::from_hex(hex).context("invalid --root")?,
        None => file.root.unwrap_or(file.proof.root),
    };

    if kyc_crypto::verify(&file.leaf, &file.proof, &root) {
        println!(
            "OK: leaf {} is included at index {} of {} under root {root}",
            file.leaf, file.proof.leaf_index, file.proof.tree_size
        );
        Ok(0)
    } else {
        println!("INVALID: proof does not verify against root {root}");
        Ok(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kyc_core::{sha256_raw, ContentDigest};
    use kyc_crypto::CommitmentStore;

    fn sample() -> ProofFile {
        let mut store = CommitmentStore::new();
        let mut leaves = Vec::new();
        for i in 0..3u8 {
            let digest = ContentDigest::from_bytes(sha256_raw(&[i]));
            leaves.push(store.append(digest).unwrap().leaf_hash);
        }
        let proof = store.proof(1).unwrap();
        ProofFile {
            leaf: leaves[1],
            root: Some(proof.root),
            proof,
        }
    }

    fn write(dir: &tempfile::TempDir, file: &ProofFile) -> PathBuf {
        let path = dir.path().join("proof.json");
        file.write(&path).unwrap();
        path
    }

    #[test]
    fn valid_proof_exits_zero() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, &sample());
        let code = run_verify_proof(&VerifyProofArgs { file: path, root: None }).unwrap();
        assert_eq!(code, 0);
    }

    #[test]
    fn wrong_root_exits_one() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, &sample());
        let code = run_verify_proof(&VerifyProofArgs {
            file: path,
            root: Some(MerkleHash::from_bytes([7u8; 32]).to_hex()),
        })
        .unwrap();
        assert_eq!(code, 1);
    }

    #[test]
    fn tampered_leaf_exits_one() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = sample();
        file.leaf = MerkleHash::from_bytes([1u8; 32]);
        let path = write(&dir, &file);
        let code = run_verify_proof(&VerifyProofArgs { file: path, root: None }).unwrap();
        assert_eq!(code, 1);
    }

    #[test]
    fn malformed_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, &sample());
        let result = run_verify_proof(&VerifyProofArgs {
            file: path,
            root: Some("not-hex".into()),
        });
        assert!(result.is_err());
    }
}
