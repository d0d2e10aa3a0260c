//! Configuration types shared across crates.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level node configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Content store configuration.
    pub store: StoreConfig,
    /// Coordinator registry configuration.
    pub coordinator: CoordinatorConfig,
    /// Upstream substituter configuration.
    #[serde(default)]
    pub substituter: SubstituterConfig,
}

/// HTTP server configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    #[serde(default = "default_bind")]
    pub bind: String,
}

/// Content store configuration.
///
/// The store is an external `ipfs`-compatible binary driven through its CLI;
/// `data_dir` becomes its repository path (`IPFS_PATH`) on every invocation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store binary to execute.
    #[serde(default = "default_store_binary")]
    pub binary: String,
    /// Store repository directory.
    pub data_dir: PathBuf,
    /// Directory for ephemeral staging files.
    pub ephemeral_dir: PathBuf,
    /// Local API port for the store daemon.
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    /// Local gateway port for the store daemon.
    #[serde(default = "default_gateway_port")]
    pub gateway_port: u16,
    /// Swarm listen port (TCP and UDP/QUIC, IPv4 and IPv6).
    #[serde(default = "default_swarm_port")]
    pub swarm_port: u16,
}

/// Coordinator registry configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Base URL of the coordinator service.
    pub url: String,
    /// Host identifier this node registers mappings under; conventionally
    /// the substituter's network location.
    pub host: String,
}

/// Upstream substituter configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubstituterConfig {
    /// Base URL artifacts are proxied from on a miss.
    #[serde(default = "default_substituter_url")]
    pub url: String,
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_store_binary() -> String {
    "ipfs".to_string()
}

fn default_api_port() -> u16 {
    5001
}

fn default_gateway_port() -> u16 {
    8081
}

fn default_swarm_port() -> u16 {
    4001
}

fn default_substituter_url() -> String {
    "https://cache.nixos.org".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

impl Default for SubstituterConfig {
    fn default() -> Self {
        Self {
            url: default_substituter_url(),
        }
    }
}
