//! # Verification Sessions
//!
//! Each verification flow is a linear sequence of steps with a predicate
//! per step:
//!
//! | Flow     | Steps                                              |
//! |----------|----------------------------------------------------|
//! | Identity | PersonalInfo → DocumentUpload → Selfie → Review    |
//! | Human    | Liveness → ZkProof → Review                        |
//! | Age      | AgeRange → Method → Review                         |
//!
//! Inputs can only be set while the session sits on the step that collects
//! them. `advance()` fails with [`SessionError::StepIncomplete`] until the
//! current step's predicate holds; `back()` is a no-op on the first step.
//! `submit()` consumes the session at the Review step and yields an
//! [`IssuanceRequest`]. Dropping a session abandons it without side effects.
//!
//! Uploaded files are kept as a name plus the SHA-256 of their bytes; the
//! bytes themselves are never retained.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use kyc_core::{sha256_raw, ContentDigest, CredentialPayload, CredentialType, FieldMap, WalletAddress};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from driving a verification session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The current step's predicate is unmet.
    #[error("{flow} verification: step {step} incomplete: {missing}")]
    StepIncomplete {
        /// The flow.
        flow: CredentialType,
        /// The current step.
        step: &'static str,
        /// What is missing.
        missing: &'static str,
    },

    /// `submit()` called before the Review step.
    #[error("{flow} verification: cannot submit from step {step}, review step not reached")]
    NotAtFinalStep {
        /// The flow.
        flow: CredentialType,
        /// The current step.
        step: &'static str,
    },

    /// An input was supplied while the session sits on a different step.
    #[error("{flow} verification: {field} belongs to step {expected}, session is at {current}")]
    WrongStep {
        /// The flow.
        flow: CredentialType,
        /// The input.
        field: &'static str,
        /// Step that collects the input.
        expected: &'static str,
        /// Current step.
        current: &'static str,
    },

    /// An input value is not acceptable.
    #[error("invalid {field}: {reason}")]
    InvalidInput {
        /// The input.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// Input vocabularies
// ---------------------------------------------------------------------------

/// Identity document kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocType {
    /// Passport.
    Passport,
    /// Driver's license.
    DriversLicense,
    /// National identity card.
    NationalId,
}

impl DocType {
    /// Canonical name, as hashed and serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Passport => "Passport",
            Self::DriversLicense => "DriversLicense",
            Self::NationalId => "NationalId",
        }
    }
}

impl std::str::FromStr for DocType {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', '_', ' '], "").as_str() {
            "passport" => Ok(Self::Passport),
            "driverslicense" => Ok(Self::DriversLicense),
            "nationalid" => Ok(Self::NationalId),
            _ => Err(SessionError::InvalidInput {
                field: "docType",
                reason: format!("unknown document type {s:?}"),
            }),
        }
    }
}

/// Age thresholds a holder can prove.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgeRange {
    /// 18 or older.
    #[serde(rename = "over-18")]
    Over18,
    /// 21 or older.
    #[serde(rename = "over-21")]
    Over21,
    /// 25 or older.
    #[serde(rename = "over-25")]
    Over25,
}

impl AgeRange {
    /// Canonical name, as hashed and serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Over18 => "over-18",
            Self::Over21 => "over-21",
            Self::Over25 => "over-25",
        }
    }

    /// Value of the `overAge` display flag.
    ///
    /// Only `over-18` and `over-21` set it; dashboards render the flag as
    /// "Over 18".
    pub fn over_age_flag(&self) -> bool {
        matches!(self, Self::Over18 | Self::Over21)
    }
}

impl std::str::FromStr for AgeRange {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "over-18" => Ok(Self::Over18),
            "over-21" => Ok(Self::Over21),
            "over-25" => Ok(Self::Over25),
            _ => Err(SessionError::InvalidInput {
                field: "ageRange",
                reason: format!("unknown age range {s:?}"),
            }),
        }
    }
}

/// How the holder's age was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VerificationMethod {
    /// Government-issued identity document.
    GovernmentId,
    /// Credit card ownership.
    CreditCard,
    /// Third-party attestation.
    ThirdParty,
}

impl VerificationMethod {
    /// Canonical name, as hashed and serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GovernmentId => "government-id",
            Self::CreditCard => "credit-card",
            Self::ThirdParty => "third-party",
        }
    }
}

impl std::str::FromStr for VerificationMethod {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "government-id" => Ok(Self::GovernmentId),
            "credit-card" => Ok(Self::CreditCard),
            "third-party" => Ok(Self::ThirdParty),
            _ => Err(SessionError::InvalidInput {
                field: "method",
                reason: format!("unknown verification method {s:?}"),
            }),
        }
    }
}

/// An uploaded file, reduced to its name and content hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    /// Original file name.
    pub name: String,
    /// SHA-256 of the file bytes.
    pub sha256: ContentDigest,
}

impl UploadedFile {
    /// Hash `bytes` and keep only the name and digest.
    pub fn from_bytes(name: impl Into<String>, bytes: &[u8]) -> Result<Self, SessionError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(SessionError::InvalidInput {
                field: "file",
                reason: "file name must not be empty".into(),
            });
        }
        if bytes.is_empty() {
            return Err(SessionError::InvalidInput {
                field: "file",
                reason: format!("{name} is empty"),
            });
        }
        Ok(Self {
            name,
            sha256: ContentDigest::from_bytes(sha256_raw(bytes)),
        })
    }
}

// ---------------------------------------------------------------------------
// Issuance request
// ---------------------------------------------------------------------------

/// What a completed session hands to the lifecycle manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuanceRequest {
    /// Hashed payload.
    pub payload: CredentialPayload,
    /// Display metadata stored on the credential.
    pub metadata: FieldMap,
    /// Human-readable proof description.
    pub proof_summary: Option<String>,
}

impl IssuanceRequest {
    /// The flow that produced the request.
    pub fn credential_type(&self) -> CredentialType {
        self.payload.credential_type
    }

    /// The wallet the credential will be bound to.
    pub fn holder(&self) -> &WalletAddress {
        &self.payload.holder
    }
}

// ---------------------------------------------------------------------------
// Step sequencing
// ---------------------------------------------------------------------------

trait Step: Copy + Eq + 'static {
    const ORDER: &'static [Self];

    fn name(&self) -> &'static str;

    fn position(&self) -> usize {
        Self::ORDER.iter().position(|s| s == self).unwrap_or(0)
    }

    fn next(&self) -> Option<Self> {
        Self::ORDER.get(self.position() + 1).copied()
    }

    fn previous(&self) -> Option<Self> {
        self.position().checked_sub(1).map(|i| Self::ORDER[i])
    }

    fn is_final(&self) -> bool {
        self.position() + 1 == Self::ORDER.len()
    }
}

macro_rules! impl_step {
    ($ty:ident { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl Step for $ty {
            const ORDER: &'static [Self] = &[$(Self::$variant),+];

            fn name(&self) -> &'static str {
                match self {
                    $(Self::$variant => $name),+
                }
            }
        }

        impl $ty {
            /// Display name of the step.
            pub fn as_str(&self) -> &'static str {
                Step::name(self)
            }

            /// 1-based position of the step.
            pub fn number(&self) -> usize {
                self.position() + 1
            }

            /// Total number of steps in the flow.
            pub fn count() -> usize {
                <Self as Step>::ORDER.len()
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

fn require_step<S: Step>(
    flow: CredentialType,
    current: S,
    expected: S,
    field: &'static str,
) -> Result<(), SessionError> {
    if current == expected {
        Ok(())
    } else {
        Err(SessionError::WrongStep {
            flow,
            field,
            expected: expected.name(),
            current: current.name(),
        })
    }
}

fn non_blank(field: &'static str, value: impl Into<String>) -> Result<String, SessionError> {
    let value = value.into();
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(SessionError::InvalidInput {
            field,
            reason: "must not be empty".into(),
        });
    }
    Ok(trimmed.to_string())
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Steps of the Identity flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdentityStep {
    /// Name, country, document type and number.
    PersonalInfo,
    /// Identity document upload.
    DocumentUpload,
    /// Selfie upload.
    Selfie,
    /// Final review.
    Review,
}

impl_step!(IdentityStep {
    PersonalInfo => "PersonalInfo",
    DocumentUpload => "DocumentUpload",
    Selfie => "Selfie",
    Review => "Review",
});

/// Identity verification: government document plus selfie.
#[derive(Debug, Clone)]
pub struct IdentitySession {
    holder: WalletAddress,
    step: IdentityStep,
    full_name: Option<String>,
    country: Option<String>,
    doc_type: Option<DocType>,
    doc_number: Option<String>,
    document: Option<UploadedFile>,
    selfie: Option<UploadedFile>,
}

impl IdentitySession {
    const FLOW: CredentialType = CredentialType::Identity;

    /// Start a session for `holder` at the first step.
    pub fn new(holder: WalletAddress) -> Self {
        Self {
            holder,
            step: IdentityStep::PersonalInfo,
            full_name: None,
            country: None,
            doc_type: None,
            doc_number: None,
            document: None,
            selfie: None,
        }
    }

    /// The current step.
    pub fn step(&self) -> IdentityStep {
        self.step
    }

    /// Set the holder's full legal name.
    pub fn set_full_name(&mut self, name: impl Into<String>) -> Result<(), SessionError> {
        require_step(Self::FLOW, self.step, IdentityStep::PersonalInfo, "fullName")?;
        self.full_name = Some(non_blank("fullName", name)?);
        Ok(())
    }

    /// Set the issuing country.
    pub fn set_country(&mut self, country: impl Into<String>) -> Result<(), SessionError> {
        require_step(Self::FLOW, self.step, IdentityStep::PersonalInfo, "country")?;
        self.country = Some(non_blank("country", country)?);
        Ok(())
    }

    /// Set the document type.
    pub fn set_doc_type(&mut self, doc_type: DocType) -> Result<(), SessionError> {
        require_step(Self::FLOW, self.step, IdentityStep::PersonalInfo, "docType")?;
        self.doc_type = Some(doc_type);
        Ok(())
    }

    /// Set the document number.
    pub fn set_doc_number(&mut self, number: impl Into<String>) -> Result<(), SessionError> {
        require_step(Self::FLOW, self.step, IdentityStep::PersonalInfo, "docNumber")?;
        self.doc_number = Some(non_blank("docNumber", number)?);
        Ok(())
    }

    /// Attach the identity document.
    pub fn upload_document(&mut self, file: UploadedFile) -> Result<(), SessionError> {
        require_step(Self::FLOW, self.step, IdentityStep::DocumentUpload, "document")?;
        self.document = Some(file);
        Ok(())
    }

    /// Attach the selfie.
    pub fn upload_selfie(&mut self, file: UploadedFile) -> Result<(), SessionError> {
        require_step(Self::FLOW, self.step, IdentityStep::Selfie, "selfie")?;
        self.selfie = Some(file);
        Ok(())
    }

    /// The uploaded document, if any.
    pub fn document(&self) -> Option<&UploadedFile> {
        self.document.as_ref()
    }

    /// The uploaded selfie, if any.
    pub fn selfie(&self) -> Option<&UploadedFile> {
        self.selfie.as_ref()
    }

    fn missing(&self) -> Option<&'static str> {
        match self.step {
            IdentityStep::PersonalInfo => {
                if self.full_name.is_none() {
                    Some("fullName")
                } else if self.country.is_none() {
                    Some("country")
                } else if self.doc_type.is_none() {
                    Some("docType")
                } else if self.doc_number.is_none() {
                    Some("docNumber")
                } else {
                    None
                }
            }
            IdentityStep::DocumentUpload => self.document.is_none().then_some("document"),
            IdentityStep::Selfie => self.selfie.is_none().then_some("selfie"),
            IdentityStep::Review => None,
        }
    }

    /// Move to the next step if the current one is complete.
    pub fn advance(&mut self) -> Result<IdentityStep, SessionError> {
        let missing = self.missing();
        advance_step(Self::FLOW, &mut self.step, missing)
    }

    /// Return to the previous step.
    pub fn back(&mut self) -> IdentityStep {
        back_step(&mut self.step)
    }

    /// Finish the flow.
    pub fn submit(self) -> Result<IssuanceRequest, SessionError> {
        ensure_final(Self::FLOW, self.step)?;
        let incomplete = |missing| SessionError::StepIncomplete {
            flow: Self::FLOW,
            step: IdentityStep::PersonalInfo.name(),
            missing,
        };
        let full_name = self.full_name.ok_or_else(|| incomplete("fullName"))?;
        let country = self.country.ok_or_else(|| incomplete("country"))?;
        let doc_type = self.doc_type.ok_or_else(|| incomplete("docType"))?;
        let doc_number = self.doc_number.ok_or_else(|| incomplete("docNumber"))?;
        let document = self.document.ok_or(SessionError::StepIncomplete {
            flow: Self::FLOW,
            step: IdentityStep::DocumentUpload.name(),
            missing: "document",
        })?;
        let selfie = self.selfie.ok_or(SessionError::StepIncomplete {
            flow: Self::FLOW,
            step: IdentityStep::Selfie.name(),
            missing: "selfie",
        })?;

        let mut metadata = FieldMap::new();
        metadata.insert("fullName".into(), Value::String(full_name));
        metadata.insert("country".into(), Value::String(country));
        metadata.insert("docType".into(), Value::String(doc_type.as_str().into()));

        // The digest binds the evidence; metadata only carries display fields.
        let mut fields = metadata.clone();
        fields.insert("docNumber".into(), Value::String(doc_number));
        fields.insert("documentSha256".into(), Value::String(document.sha256.to_hex()));
        fields.insert("selfieSha256".into(), Value::String(selfie.sha256.to_hex()));

        Ok(IssuanceRequest {
            metadata,
            payload: CredentialPayload::new(Self::FLOW, self.holder, fields),
            proof_summary: None,
        })
    }
}

// ---------------------------------------------------------------------------
// Human
// ---------------------------------------------------------------------------

/// Steps of the Human flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HumanStep {
    /// Liveness check.
    Liveness,
    /// Zero-knowledge proof generation.
    ZkProof,
    /// Final review.
    Review,
}

impl_step!(HumanStep {
    Liveness => "Liveness",
    ZkProof => "ZkProof",
    Review => "Review",
});

/// Proof-of-personhood: liveness check plus a generated proof.
#[derive(Debug, Clone)]
pub struct HumanSession {
    holder: WalletAddress,
    step: HumanStep,
    liveness_passed: bool,
    proof_generated: bool,
}

impl HumanSession {
    const FLOW: CredentialType = CredentialType::Human;

    /// Proof summary stored on issued Human credentials.
    pub const PROOF_SUMMARY: &'static str = "Liveness check passed with ZK proof";

    /// Start a session for `holder` at the first step.
    pub fn new(holder: WalletAddress) -> Self {
        Self {
            holder,
            step: HumanStep::Liveness,
            liveness_passed: false,
            proof_generated: false,
        }
    }

    /// The current step.
    pub fn step(&self) -> HumanStep {
        self.step
    }

    /// Record the outcome of the liveness check.
    pub fn record_liveness(&mut self, passed: bool) -> Result<(), SessionError> {
        require_step(Self::FLOW, self.step, HumanStep::Liveness, "livenessCheck")?;
        self.liveness_passed = passed;
        Ok(())
    }

    /// Mark the proof as generated.
    pub fn record_proof(&mut self) -> Result<(), SessionError> {
        require_step(Self::FLOW, self.step, HumanStep::ZkProof, "zkProof")?;
        self.proof_generated = true;
        Ok(())
    }

    fn missing(&self) -> Option<&'static str> {
        match self.step {
            HumanStep::Liveness => (!self.liveness_passed).then_some("livenessCheck"),
            HumanStep::ZkProof => (!self.proof_generated).then_some("zkProof"),
            HumanStep::Review => None,
        }
    }

    /// Move to the next step if the current one is complete.
    pub fn advance(&mut self) -> Result<HumanStep, SessionError> {
        let missing = self.missing();
        advance_step(Self::FLOW, &mut self.step, missing)
    }

    /// Return to the previous step.
    pub fn back(&mut self) -> HumanStep {
        back_step(&mut self.step)
    }

    /// Finish the flow.
    pub fn submit(self) -> Result<IssuanceRequest, SessionError> {
        ensure_final(Self::FLOW, self.step)?;
        let mut fields = FieldMap::new();
        fields.insert("livenessCheck".into(), Value::Bool(true));
        Ok(IssuanceRequest {
            payload: CredentialPayload::new(Self::FLOW, self.holder, fields),
            metadata: FieldMap::new(),
            proof_summary: Some(Self::PROOF_SUMMARY.to_string()),
        })
    }
}

// ---------------------------------------------------------------------------
// Age
// ---------------------------------------------------------------------------

/// Steps of the Age flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgeStep {
    /// Age threshold selection.
    AgeRange,
    /// Verification method selection.
    Method,
    /// Final review.
    Review,
}

impl_step!(AgeStep {
    AgeRange => "AgeRange",
    Method => "Method",
    Review => "Review",
});

/// Age threshold verification.
#[derive(Debug, Clone)]
pub struct AgeSession {
    holder: WalletAddress,
    step: AgeStep,
    age_range: Option<AgeRange>,
    method: Option<VerificationMethod>,
}

impl AgeSession {
    const FLOW: CredentialType = CredentialType::Age;

    /// Start a session for `holder` at the first step.
    pub fn new(holder: WalletAddress) -> Self {
        Self {
            holder,
            step: AgeStep::AgeRange,
            age_range: None,
            method: None,
        }
    }

    /// The current step.
    pub fn step(&self) -> AgeStep {
        self.step
    }

    /// Choose the age threshold.
    pub fn set_age_range(&mut self, range: AgeRange) -> Result<(), SessionError> {
        require_step(Self::FLOW, self.step, AgeStep::AgeRange, "ageRange")?;
        self.age_range = Some(range);
        Ok(())
    }

    /// Choose the verification method.
    pub fn set_method(&mut self, method: VerificationMethod) -> Result<(), SessionError> {
        require_step(Self::FLOW, self.step, AgeStep::Method, "method")?;
        self.method = Some(method);
        Ok(())
    }

    fn missing(&self) -> Option<&'static str> {
        match self.step {
            AgeStep::AgeRange => self.age_range.is_none().then_some("ageRange"),
            AgeStep::Method => self.method.is_none().then_some("method"),
            AgeStep::Review => None,
        }
    }

    /// Move to the next step if the current one is complete.
    pub fn advance(&mut self) -> Result<AgeStep, SessionError> {
        let missing = self.missing();
        advance_step(Self::FLOW, &mut self.step, missing)
    }

    /// Return to the previous step.
    pub fn back(&mut self) -> AgeStep {
        back_step(&mut self.step)
    }

    /// Finish the flow.
    pub fn submit(self) -> Result<IssuanceRequest, SessionError> {
        ensure_final(Self::FLOW, self.step)?;
        let range = self.age_range.ok_or(SessionError::StepIncomplete {
            flow: Self::FLOW,
            step: AgeStep::AgeRange.name(),
            missing: "ageRange",
        })?;
        let method = self.method.ok_or(SessionError::StepIncomplete {
            flow: Self::FLOW,
            step: AgeStep::Method.name(),
            missing: "method",
        })?;

        let mut fields = FieldMap::new();
        fields.insert("ageRange".into(), Value::String(range.as_str().into()));
        fields.insert("method".into(), Value::String(method.as_str().into()));
        let mut metadata = FieldMap::new();
        metadata.insert("overAge".into(), Value::Bool(range.over_age_flag()));

        Ok(IssuanceRequest {
            payload: CredentialPayload::new(Self::FLOW, self.holder, fields),
            metadata,
            proof_summary: Some(format!("Age verification: {}", range.as_str())),
        })
    }
}

// ---------------------------------------------------------------------------
// Shared step transitions
// ---------------------------------------------------------------------------

fn advance_step<S: Step>(
    flow: CredentialType,
    step: &mut S,
    missing: Option<&'static str>,
) -> Result<S, SessionError> {
    if let Some(missing) = missing {
        return Err(SessionError::StepIncomplete {
            flow,
            step: step.name(),
            missing,
        });
    }
    match step.next() {
        Some(next) => {
            *step = next;
            Ok(next)
        }
        None => Err(SessionError::StepIncomplete {
            flow,
            step: step.name(),
            missing: "nothing left to advance to, submit instead",
        }),
    }
}

fn back_step<S: Step>(step: &mut S) -> S {
    if let Some(prev) = step.previous() {
        *step = prev;
    }
    *step
}

fn ensure_final<S: Step>(flow: CredentialType, step: S) -> Result<(), SessionError> {
    if step.is_final() {
        Ok(())
    } else {
        Err(SessionError::NotAtFinalStep {
            flow,
            step: step.name(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tagged session
// ---------------------------------------------------------------------------

/// A verification session of any flow.
#[derive(Debug, Clone)]
pub enum VerificationSession {
    /// Identity flow.
    Identity(IdentitySession),
    /// Human flow.
    Human(HumanSession),
    /// Age flow.
    Age(AgeSession),
}

impl VerificationSession {
    /// Start a session of the given flow.
    pub fn start(flow: CredentialType, holder: WalletAddress) -> Self {
        match flow {
            CredentialType::Identity => Self::Identity(IdentitySession::new(holder)),
            CredentialType::Human => Self::Human(HumanSession::new(holder)),
            CredentialType::Age => Self::Age(AgeSession::new(holder)),
        }
    }

    /// The flow this session belongs to.
    pub fn credential_type(&self) -> CredentialType {
        match self {
            Self::Identity(_) => CredentialType::Identity,
            Self::Human(_) => CredentialType::Human,
            Self::Age(_) => CredentialType::Age,
        }
    }

    /// Name of the current step.
    pub fn step_name(&self) -> &'static str {
        match self {
            Self::Identity(s) => s.step().as_str(),
            Self::Human(s) => s.step().as_str(),
            Self::Age(s) => s.step().as_str(),
        }
    }

    /// 1-based position of the current step and the number of steps.
    pub fn progress(&self) -> (usize, usize) {
        match self {
            Self::Identity(s) => (s.step().number(), IdentityStep::count()),
            Self::Human(s) => (s.step().number(), HumanStep::count()),
            Self::Age(s) => (s.step().number(), AgeStep::count()),
        }
    }

    /// Advance the current step; returns the new step name.
    pub fn advance(&mut self) -> Result<&'static str, SessionError> {
        Ok(match self {
            Self::Identity(s) => s.advance()?.as_str(),
            Self::Human(s) => s.advance()?.as_str(),
            Self::Age(s) => s.advance()?.as_str(),
        })
    }

    /// Go back one step; returns the new step name.
    pub fn back(&mut self) -> &'static str {
        match self {
            Self::Identity(s) => s.back().as_str(),
            Self::Human(s) => s.back().as_str(),
            Self::Age(s) => s.back().as_str(),
        }
    }

    /// Finish the flow.
    pub fn submit(self) -> Result<IssuanceRequest, SessionError> {
        match self {
            Self::Identity(s) => s.submit(),
            Self::Human(s) => s.submit(),
            Self::Age(s) => s.submit(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn holder() -> WalletAddress {
        WalletAddress::new("0x742d35cc6634c0532925a3b844bc9e7595f0beb0").unwrap()
    }

    fn file(name: &str) -> UploadedFile {
        UploadedFile::from_bytes(name, b"\x89PNG fake image bytes").unwrap()
    }

    fn completed_identity() -> IdentitySession {
        let mut s = IdentitySession::new(holder());
        s.set_full_name("Jane Doe").unwrap();
        s.set_country("Canada").unwrap();
        s.set_doc_type(DocType::Passport).unwrap();
        s.set_doc_number("X1234567").unwrap();
        s.advance().unwrap();
        s.upload_document(file("passport.png")).unwrap();
        s.advance().unwrap();
        s.upload_selfie(file("selfie.jpg")).unwrap();
        s.advance().unwrap();
        s
    }

    #[test]
    fn identity_flow_produces_request() {
        let s = completed_identity();
        assert_eq!(s.step(), IdentityStep::Review);
        let req = s.submit().unwrap();
        assert_eq!(req.credential_type(), CredentialType::Identity);
        assert_eq!(req.payload.fields["fullName"], "Jane Doe");
        assert_eq!(req.payload.fields["docType"], "Passport");
        assert_eq!(req.payload.fields["docNumber"], "X1234567");
        assert!(req.payload.fields.contains_key("documentSha256"));
        assert!(req.payload.fields.contains_key("selfieSha256"));
        assert_eq!(req.metadata.len(), 3);
        assert!(!req.metadata.contains_key("docNumber"));
        assert!(!req.metadata.contains_key("documentSha256"));
        assert!(req.proof_summary.is_none());
        kyc_core::digest(&req.payload).unwrap();
    }

    fn identity_with_evidence(document: &[u8], selfie: &[u8]) -> IssuanceRequest {
        let mut s = IdentitySession::new(holder());
        s.set_full_name("Jane Doe").unwrap();
        s.set_country("Canada").unwrap();
        s.set_doc_type(DocType::Passport).unwrap();
        s.set_doc_number("X1234567").unwrap();
        s.advance().unwrap();
        s.upload_document(UploadedFile::from_bytes("passport.png", document).unwrap())
            .unwrap();
        s.advance().unwrap();
        s.upload_selfie(UploadedFile::from_bytes("selfie.jpg", selfie).unwrap())
            .unwrap();
        s.advance().unwrap();
        s.submit().unwrap()
    }

    #[test]
    fn identity_digest_binds_uploaded_evidence() {
        let base = kyc_core::digest(&identity_with_evidence(b"front", b"face").payload).unwrap();
        let same = kyc_core::digest(&identity_with_evidence(b"front", b"face").payload).unwrap();
        let new_document =
            kyc_core::digest(&identity_with_evidence(b"renewed", b"face").payload).unwrap();
        let new_selfie =
            kyc_core::digest(&identity_with_evidence(b"front", b"smile").payload).unwrap();

        assert_eq!(base, same);
        assert_ne!(base, new_document);
        assert_ne!(base, new_selfie);
        assert_ne!(new_document, new_selfie);
    }

    #[test]
    fn identity_advance_requires_step_inputs() {
        let mut s = IdentitySession::new(holder());
        s.set_full_name("Jane Doe").unwrap();
        let err = s.advance().unwrap_err();
        assert_eq!(
            err,
            SessionError::StepIncomplete {
                flow: CredentialType::Identity,
                step: "PersonalInfo",
                missing: "country",
            }
        );
        assert_eq!(s.step(), IdentityStep::PersonalInfo);
    }

    #[test]
    fn document_step_requires_upload() {
        let mut s = IdentitySession::new(holder());
        s.set_full_name("Jane Doe").unwrap();
        s.set_country("Canada").unwrap();
        s.set_doc_type(DocType::NationalId).unwrap();
        s.set_doc_number("N-99").unwrap();
        s.advance().unwrap();
        assert!(matches!(
            s.advance(),
            Err(SessionError::StepIncomplete { missing: "document", .. })
        ));
    }

    #[test]
    fn inputs_only_accepted_on_their_step() {
        let mut s = IdentitySession::new(holder());
        let err = s.upload_selfie(file("selfie.jpg")).unwrap_err();
        assert!(matches!(
            err,
            SessionError::WrongStep { expected: "Selfie", current: "PersonalInfo", .. }
        ));
    }

    #[test]
    fn blank_inputs_rejected() {
        let mut s = IdentitySession::new(holder());
        assert!(matches!(
            s.set_full_name("   "),
            Err(SessionError::InvalidInput { field: "fullName", .. })
        ));
    }

    #[test]
    fn back_is_noop_on_first_step_and_keeps_inputs() {
        let mut s = completed_identity();
        assert_eq!(s.back(), IdentityStep::Selfie);
        assert_eq!(s.back(), IdentityStep::DocumentUpload);
        assert_eq!(s.back(), IdentityStep::PersonalInfo);
        assert_eq!(s.back(), IdentityStep::PersonalInfo);
        s.advance().unwrap();
        assert!(s.document().is_some());
    }

    #[test]
    fn submit_before_review_fails() {
        let s = IdentitySession::new(holder());
        assert!(matches!(
            s.submit(),
            Err(SessionError::NotAtFinalStep { step: "PersonalInfo", .. })
        ));
    }

    #[test]
    fn advance_past_review_fails() {
        let mut s = completed_identity();
        assert!(s.advance().is_err());
        assert_eq!(s.step(), IdentityStep::Review);
    }

    #[test]
    fn human_flow() {
        let mut s = HumanSession::new(holder());
        assert!(s.advance().is_err());
        s.record_liveness(true).unwrap();
        s.advance().unwrap();
        s.record_proof().unwrap();
        s.advance().unwrap();
        let req = s.submit().unwrap();
        assert_eq!(req.payload.fields["livenessCheck"], true);
        assert!(req.metadata.is_empty());
        assert_eq!(req.proof_summary.as_deref(), Some(HumanSession::PROOF_SUMMARY));
    }

    #[test]
    fn failed_liveness_blocks_advance() {
        let mut s = HumanSession::new(holder());
        s.record_liveness(false).unwrap();
        assert!(matches!(
            s.advance(),
            Err(SessionError::StepIncomplete { missing: "livenessCheck", .. })
        ));
    }

    #[test]
    fn age_flow_sets_over_age_flag() {
        for (range, flag) in [
            (AgeRange::Over18, true),
            (AgeRange::Over21, true),
            (AgeRange::Over25, false),
        ] {
            let mut s = AgeSession::new(holder());
            s.set_age_range(range).unwrap();
            s.advance().unwrap();
            s.set_method(VerificationMethod::GovernmentId).unwrap();
            s.advance().unwrap();
            let req = s.submit().unwrap();
            assert_eq!(req.metadata["overAge"], flag);
            assert_eq!(req.payload.fields["ageRange"], range.as_str());
            assert_eq!(req.payload.fields["method"], "government-id");
            assert_eq!(
                req.proof_summary.unwrap(),
                format!("Age verification: {}", range.as_str())
            );
        }
    }

    #[test]
    fn tagged_session_dispatches() {
        let mut s = VerificationSession::start(CredentialType::Age, holder());
        assert_eq!(s.progress(), (1, 3));
        if let VerificationSession::Age(age) = &mut s {
            age.set_age_range(AgeRange::Over21).unwrap();
        }
        assert_eq!(s.advance().unwrap(), "Method");
        assert_eq!(s.back(), "AgeRange");
        assert_eq!(s.step_name(), "AgeRange");
        assert_eq!(s.credential_type(), CredentialType::Age);
    }

    #[test]
    fn vocabularies_parse() {
        assert_eq!("drivers-license".parse::<DocType>().unwrap(), DocType::DriversLicense);
        assert_eq!("NationalId".parse::<DocType>().unwrap(), DocType::NationalId);
        assert!("library card".parse::<DocType>().is_err());
        assert_eq!("over-25".parse::<AgeRange>().unwrap(), AgeRange::Over25);
        assert_eq!(
            "third-party".parse::<VerificationMethod>().unwrap(),
            VerificationMethod::ThirdParty
        );
        assert_eq!(
            serde_json::to_string(&VerificationMethod::CreditCard).unwrap(),
            "\"credit-card\""
        );
        assert_eq!(serde_json::to_string(&AgeRange::Over18).unwrap(), "\"over-18\"");
    }

    #[test]
    fn uploaded_file_keeps_only_hash() {
        let f = UploadedFile::from_bytes("doc.pdf", b"abc").unwrap();
        assert_eq!(
            f.sha256.to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert!(UploadedFile::from_bytes("empty.pdf", b"").is_err());
        assert!(UploadedFile::from_bytes(" ", b"abc").is_err());
    }
}
