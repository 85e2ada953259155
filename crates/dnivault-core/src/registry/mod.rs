//! Upstream registry lookup.
//!
//! This module talks to the external government-data API that is
//! authoritative for DNI records. It owns input validation, response
//! normalization (the upstream varies field naming between runs), and the
//! retry policy for transient failures. The orchestrator depends only on
//! the [`IdentitySource`] trait, so tests can substitute a stub.

pub mod client;
pub mod normalize;

pub use client::RegistryClient;
pub use normalize::normalize_payload;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Identity fields for one document, normalized to a single schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityData {
    /// The 8-digit document number the data belongs to
    pub dni: String,

    /// Given names as registered
    pub given_names: String,

    /// Father's surname
    pub paternal_surname: String,

    /// Mother's surname
    pub maternal_surname: String,

    /// The three name parts joined with single spaces, trimmed
    pub full_name: String,
}

/// Source of verified identity data, keyed by document number.
///
/// Implementations receive an already-validated document number and either
/// return the normalized identity record or a typed failure
/// (`DocumentNotFound`, `UpstreamAuth`, `Upstream`, `Validation`).
#[async_trait]
pub trait IdentitySource: Send + Sync {
    /// Fetch the identity record for a document number.
    async fn fetch(&self, dni: &str) -> Result<IdentityData>;
}

/// True iff `dni` is exactly 8 ASCII digits.
pub fn validate_dni(dni: &str) -> bool {
    dni.len() == 8 && dni.bytes().all(|b| b.is_ascii_digit())
}
