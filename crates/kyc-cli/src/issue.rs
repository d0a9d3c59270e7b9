//! # Issue Subcommand
//!
//! Issues one credential from a payload file:
//!
//! ```yaml
//! type: Age
//! holder: "0x742d35cc6634c0532925a3b844bc454e4438f44e"
//! fields:
//!   ageRange: over-21
//!   method: government-id
//! proofSummary: Age over 21 verified
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Deserialize;
use uuid::Uuid;

use kyc_core::{CredentialPayload, CredentialType, FieldMap, IssuerId, WalletAddress};
use kyc_state::IssuanceRequest;

use crate::proof::ProofFile;
use crate::{block_on, read_document, report, ChainArgs, Pipeline};

/// Arguments for `kyc issue`.
#[derive(Args, Debug)]
pub struct IssueArgs {
    /// Payload file (YAML, or JSON with a .json extension).
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Issuer id. Defaults to the registered issuer for the credential type.
    #[arg(long, value_name = "UUID")]
    pub issuer: Option<Uuid>,

    /// Write the inclusion proof at issuance to this file.
    #[arg(long, value_name = "FILE")]
    pub proof_out: Option<PathBuf>,

    #[command(flatten)]
    pub chain: ChainArgs,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct PayloadFile {
    #[serde(rename = "type")]
    credential_type: CredentialType,
    holder: WalletAddress,
    fields: FieldMap,
    #[serde(default)]
    metadata: FieldMap,
    #[serde(default)]
    proof_summary: Option<String>,
}

pub fn run_issue(args: &IssueArgs) -> Result<u8> {
    let payload: PayloadFile = read_document(&args.file)?;
    tracing::info!(
        credential_type = %payload.credential_type,
        holder = %payload.holder,
        "issuing credential"
    );

    let request = IssuanceRequest {
        payload: CredentialPayload::new(payload.credential_type, payload.holder, payload.fields),
        metadata: payload.metadata,
        proof_summary: payload.proof_summary,
    };
    let issuer = args.issuer.map(IssuerId::from_uuid);

    let pipeline = Pipeline::from_env(&args.chain)?;
    let manager = &pipeline.manager;
    let (credential, proof) = block_on(async {
        let credential = manager.issue_request(request, issuer).await?;
        let proof = manager.insertion_proof(credential.id).await?;
        Ok::<_, kyc_issuance::IssuanceError>((credential, proof))
    })?
    .context("issuance failed")?;

    report(&credential, &pipeline.chain);

    if let Some(path) = &args.proof_out {
        ProofFile {
            leaf: credential.merkle_leaf,
            proof,
            root: Some(credential.root_at_issuance),
        }
        .write(path)?;
        println!("OK: proof written to {}", path.display());
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proof::{run_verify_proof, VerifyProofArgs};

    const IDENTITY_YAML: &str = r#"
type: Identity
holder: "0x742d35cc6634c0532925a3b844bc454e4438f44e"
fields:
  fullName: Jane Doe
  country: Canada
  docType: Passport
metadata:
  country: Canada
proofSummary: Passport verified
"#;

    fn args(file: PathBuf) -> IssueArgs {
        IssueArgs {
            file,
            issuer: None,
            proof_out: None,
            chain: ChainArgs { latency_ms: Some(0) },
        }
    }

    #[test]
    fn issues_from_yaml_and_writes_a_verifiable_proof() {
        let dir = tempfile::tempdir().unwrap();
        let payload = dir.path().join("identity.yaml");
        std::fs::write(&payload, IDENTITY_YAML).unwrap();
        let proof_out = dir.path().join("proof.json");

        let mut issue = args(payload);
        issue.proof_out = Some(proof_out.clone());
        assert_eq!(run_issue(&issue).unwrap(), 0);

        let written: ProofFile = read_document(&proof_out).unwrap();
        assert_eq!(written.proof.leaf_index, 0);
        assert_eq!(written.proof.tree_size, 1);

        let code = run_verify_proof(&VerifyProofArgs {
            file: proof_out,
            root: None,
        })
        .unwrap();
        assert_eq!(code, 0);
    }

    #[test]
    fn issues_from_json() {
        let dir = tempfile::tempdir().unwrap();
        let payload = dir.path().join("age.json");
        std::fs::write(
            &payload,
            r#"{
                "type": "Age",
                "holder": "0x742d35cc6634c0532925a3b844bc454e4438f44e",
                "fields": {"ageRange": "over-21", "method": "government-id"}
            }"#,
        )
        .unwrap();
        assert_eq!(run_issue(&args(payload)).unwrap(), 0);
    }

    #[test]
    fn missing_required_field_fails() {
        let dir = tempfile::tempdir().unwrap();
        let payload = dir.path().join("human.yaml");
        std::fs::write(
            &payload,
            "type: Human\nholder: \"0x742d35cc6634c0532925a3b844bc454e4438f44e\"\nfields: {}\n",
        )
        .unwrap();
        let err = run_issue(&args(payload)).unwrap_err();
        assert!(format!("{err:#}").contains("issuance failed"));
    }

    #[test]
    fn invalid_holder_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let payload = dir.path().join("bad.yaml");
        std::fs::write(
            &payload,
            "type: Human\nholder: not-a-wallet\nfields:\n  livenessCheck: passed\n",
        )
        .unwrap();
        let err = run_issue(&args(payload)).unwrap_err();
        assert!(format!("{err:#}").contains("failed to parse YAML"));
    }

    #[test]
    fn unknown_issuer_fails() {
        let dir = tempfile::tempdir().unwrap();
        let payload = dir.path().join("identity.yaml");
        std::fs::write(&payload, IDENTITY_YAML).unwrap();
        let mut issue = args(payload);
        issue.issuer = Some(Uuid::nil());
        assert!(run_issue(&issue).is_err());
    }
}
