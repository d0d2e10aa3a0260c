//! Process executor and content-store adapter for the Silo cache node.
//!
//! This crate drives the external content-addressed store through its CLI:
//! - One-shot subprocess execution with captured output
//! - Repository bootstrap (init, configure) and the long-lived daemon
//! - Ingest, availability probe, and fetch of content by CID
//! - Scoped ephemeral files for staged transfers

pub mod client;
pub mod ephemeral;
pub mod error;
pub mod exec;

pub use client::{StoreClient, StoreDaemon};
pub use ephemeral::EphemeralFile;
pub use error::{StoreError, StoreResult};
pub use exec::CommandOutput;
