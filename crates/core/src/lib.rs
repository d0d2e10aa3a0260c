//! Core domain types and shared configuration for the Silo cache node.
//!
//! This crate defines the canonical data model used across all other crates:
//! - Artifact hashes and content identifiers
//! - Node configuration
//! - Core error type

pub mod config;
pub mod error;
pub mod hash;

pub use config::{AppConfig, CoordinatorConfig, ServerConfig, StoreConfig, SubstituterConfig};
pub use error::{Error, Result};
pub use hash::{ArtifactHash, Cid};

/// Nominal transfer chunk size: 1 KiB.
///
/// Matches the chunker the content store is instructed to use on ingest,
/// so a staged transfer and its stored counterpart chunk identically.
pub const CHUNK_SIZE: usize = 1024;
