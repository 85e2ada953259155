//! # dnivault Core
//!
//! Core library for dnivault - encrypted storage and audited lookups of
//! Peruvian national ID (DNI) records against an upstream registry API.
//!
//! This crate provides the domain logic independent of any transport or
//! user interface.
//!
//! ## Architecture
//!
//! - **crypto**: authenticated field-level encryption (AES-256-GCM)
//! - **registry**: upstream lookup client with retry/backoff and response
//!   normalization
//! - **storage**: encrypted record store with idempotent upsert, plus the
//!   append-only audit trail
//! - **lookup**: the orchestrator tying the above together per request
//! - **config**: typed, fail-fast configuration consumed by the services
//!
//! ## Security
//!
//! The document number is the only identity field stored in plaintext (it
//! is the lookup key); names and audit context are encrypted at rest with
//! a single static key supplied at process start.

pub mod config;
pub mod crypto;
pub mod error;
pub mod lookup;
pub mod registry;
pub mod storage;

pub use config::{RegistryConfig, VaultConfig};
pub use error::{Result, VaultError};
pub use lookup::{LookupRequest, LookupService};

/// Core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
