//! # Flow Subcommand
//!
//! Drives one verification session step by step, then submits it for
//! issuance. Document and selfie files are hashed on read; only their
//! names and digests enter the session.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use uuid::Uuid;

use kyc_core::{CredentialType, IssuerId, WalletAddress};
use kyc_state::{
    AgeRange, AgeSession, AgeStep, DocType, HumanSession, HumanStep, IdentitySession,
    IdentityStep, UploadedFile, VerificationMethod, VerificationSession,
};

use crate::{block_on, report, ChainArgs, Pipeline};

/// Arguments for `kyc flow`.
#[derive(Args, Debug)]
pub struct FlowArgs {
    #[command(subcommand)]
    pub flow: FlowCommand,
}

/// Options every flow takes.
#[derive(Args, Debug, Clone)]
pub struct FlowOptions {
    /// Holder wallet address (0x followed by 40 hex digits).
    #[arg(long, value_name = "ADDRESS")]
    pub holder: String,

    /// Issuer id. Defaults to the registered issuer for the flow.
    #[arg(long, value_name = "UUID")]
    pub issuer: Option<Uuid>,

    #[command(flatten)]
    pub chain: ChainArgs,
}

#[derive(Subcommand, Debug)]
pub enum FlowCommand {
    /// Identity document plus selfie.
    Identity {
        #[arg(long)]
        full_name: String,
        #[arg(long)]
        country: String,
        /// passport, drivers-license or national-id.
        #[arg(long, value_name = "TYPE")]
        doc_type: DocType,
        #[arg(long)]
        doc_number: String,
        /// Image of the identity document.
        #[arg(long, value_name = "FILE")]
        document: PathBuf,
        /// Selfie image.
        #[arg(long, value_name = "FILE")]
        selfie: PathBuf,
        #[command(flatten)]
        options: FlowOptions,
    },

    /// Liveness check and proof of humanity.
    Human {
        #[command(flatten)]
        options: FlowOptions,
    },

    /// Age threshold.
    Age {
        /// over-18, over-21 or over-25.
        #[arg(long, value_name = "RANGE")]
        range: AgeRange,
        /// government-id, credit-card or third-party.
        #[arg(long)]
        method: VerificationMethod,
        #[command(flatten)]
        options: FlowOptions,
    },
}

impl FlowCommand {
    fn options(&self) -> &FlowOptions {
        match self {
            Self::Identity { options, .. } | Self::Human { options } | Self::Age { options, .. } => {
                options
            }
        }
    }
}

pub fn run_flow(args: &FlowArgs) -> Result<u8> {
    let options = args.flow.options();
    let holder = WalletAddress::new(options.holder.as_str()).context("invalid --holder")?;

    let session = match &args.flow {
        FlowCommand::Identity {
            full_name,
            country,
            doc_type,
            doc_number,
            document,
            selfie,
            ..
        } => {
            let mut s = IdentitySession::new(holder);
            s.set_full_name(full_name.as_str())?;
            s.set_country(country.as_str())?;
            s.set_doc_type(*doc_type)?;
            s.set_doc_number(doc_number.as_str())?;
            let step = s.advance()?;
            announce(CredentialType::Identity, step.number(), IdentityStep::count(), step);
            s.upload_document(upload(document)?)?;
            let step = s.advance()?;
            announce(CredentialType::Identity, step.number(), IdentityStep::count(), step);
            s.upload_selfie(upload(selfie)?)?;
            let step = s.advance()?;
            announce(CredentialType::Identity, step.number(), IdentityStep::count(), step);
            VerificationSession::Identity(s)
        }
        FlowCommand::Human { .. } => {
            let mut s = HumanSession::new(holder);
            s.record_liveness(true)?;
            let step = s.advance()?;
            announce(CredentialType::Human, step.number(), HumanStep::count(), step);
            s.record_proof()?;
            let step = s.advance()?;
            announce(CredentialType::Human, step.number(), HumanStep::count(), step);
            VerificationSession::Human(s)
        }
        FlowCommand::Age { range, method, .. } => {
            let mut s = AgeSession::new(holder);
            s.set_age_range(*range)?;
            let step = s.advance()?;
            announce(CredentialType::Age, step.number(), AgeStep::count(), step);
            s.set_method(*method)?;
            let step = s.advance()?;
            announce(CredentialType::Age, step.number(), AgeStep::count(), step);
            VerificationSession::Age(s)
        }
    };

    let flow = session.credential_type();
    let pipeline = Pipeline::from_env(&options.chain)?;
    tracing::info!(%flow, network = %pipeline.chain.network, "submitting session");
    let issuer = options.issuer.map(IssuerId::from_uuid);
    let credential = block_on(pipeline.manager.submit_session(session, issuer))?
        .with_context(|| format!("{flow} verification failed"))?;

    report(&credential, &pipeline.chain);
    Ok(0)
}

fn announce(flow: CredentialType, number: usize, count: usize, step: impl std::fmt::Display) {
    println!("  [{number}/{count}] {flow}: {step}");
}

fn upload(path: &Path) -> Result<UploadedFile> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(UploadedFile::from_bytes(name, &bytes)?)
}
