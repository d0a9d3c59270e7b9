//! # API Route Modules
//!
//! | Module          | Prefix                                   |
//! |-----------------|------------------------------------------|
//! | [`credentials`] | `/v1/credentials`                        |
//! | [`commitments`] | `/v1/commitments`, `/v1/proofs`          |
//! | [`audit`]       | `/v1/actions`                            |
//! | [`registry`]    | `/v1/issuers`, `/v1/holders`             |
//! | [`maintenance`] | `/v1/maintenance`                        |

pub mod audit;
pub mod commitments;
pub mod credentials;
pub mod maintenance;
pub mod registry;
