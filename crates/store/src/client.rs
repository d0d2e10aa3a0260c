//! Content store adapter.
//!
//! Translates domain operations into CLI invocations of the external
//! `ipfs`-compatible store binary with fixed parameters. Every invocation
//! carries the repository path as an environment overlay; the global
//! process environment is never touched.

use crate::ephemeral::EphemeralFile;
use crate::error::{StoreError, StoreResult};
use crate::exec::{self, CommandOutput};
use silo_core::config::StoreConfig;
use silo_core::hash::Cid;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Child;
use tokio::task::JoinHandle;

/// Stderr marker the store emits when `init` finds an existing repository.
const ALREADY_EXISTS_MARKER: &str = "ipfs configuration file already exists";

/// Availability probe timeout, enforced by the store CLI itself.
const PROBE_TIMEOUT: &str = "5s";

/// Full-content fetch timeout, enforced by the store CLI itself.
const FETCH_TIMEOUT: &str = "60s";

/// Handle on the long-lived store daemon.
///
/// Holds the child process and its two log pumps. The daemon has no
/// liveness signal beyond its output streams reaching end-of-file; the
/// pumps are never restarted and their termination is invisible to request
/// handling. Dropping the handle kills the daemon.
pub struct StoreDaemon {
    child: Child,
    stdout_pump: JoinHandle<()>,
    stderr_pump: JoinHandle<()>,
}

impl StoreDaemon {
    /// OS process id, if the daemon is still running.
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Wait for the daemon to exit and both log pumps to drain.
    pub async fn wait(mut self) -> std::io::Result<std::process::ExitStatus> {
        let status = self.child.wait().await?;
        let _ = self.stdout_pump.await;
        let _ = self.stderr_pump.await;
        Ok(status)
    }
}

/// Adapter over the content store CLI.
#[derive(Clone, Debug)]
pub struct StoreClient {
    binary: String,
    data_dir: PathBuf,
    ephemeral_dir: PathBuf,
}

impl StoreClient {
    /// Create an adapter from configuration.
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            binary: config.binary.clone(),
            data_dir: config.data_dir.clone(),
            ephemeral_dir: config.ephemeral_dir.clone(),
        }
    }

    /// Directory ephemeral staging files are allocated under.
    pub fn ephemeral_dir(&self) -> &std::path::Path {
        &self.ephemeral_dir
    }

    fn env(&self) -> Vec<(&str, &str)> {
        vec![("IPFS_PATH", self.data_dir.to_str().unwrap_or_default())]
    }

    fn command_line(&self, args: &[&str]) -> Vec<String> {
        std::iter::once(self.binary.clone())
            .chain(args.iter().map(|a| a.to_string()))
            .collect()
    }

    async fn run(&self, args: &[&str]) -> StoreResult<CommandOutput> {
        Ok(exec::run(&self.binary, args, &self.env(), None).await?)
    }

    fn log_failure(&self, args: &[&str], out: &CommandOutput) {
        tracing::error!(
            command = ?self.command_line(args),
            code = out.code,
            stdout = %out.stdout_text(),
            stderr = %out.stderr_text(),
            "store command failed"
        );
    }

    fn operation_fault(&self, args: &[&str], out: &CommandOutput) -> StoreError {
        self.log_failure(args, out);
        StoreError::Operation {
            command: self.command_line(args),
            code: out.code,
            stdout: out.stdout_text(),
            stderr: out.stderr_text(),
        }
    }

    /// Initialize the store repository. Idempotent: an "already exists"
    /// failure is treated as success and logged as reuse.
    pub async fn init(&self) -> StoreResult<()> {
        let args = ["init", "--algorithm", "ed25519", "--empty-repo"];
        let out = self.run(&args).await?;

        if out.code == 0 {
            tracing::info!(data_dir = %self.data_dir.display(), "store repository initialized");
        } else if out.stderr_text().contains(ALREADY_EXISTS_MARKER) {
            tracing::info!(data_dir = %self.data_dir.display(), "store repository already exists, reusing it");
        } else {
            self.log_failure(&args, &out);
            return Err(StoreError::Startup {
                command: self.command_line(&args),
                code: out.code,
                stdout: out.stdout_text(),
                stderr: out.stderr_text(),
            });
        }

        Ok(())
    }

    /// Write the store's network address configuration. Must run before the
    /// daemon is started.
    pub async fn configure(
        &self,
        api_port: u16,
        gateway_port: u16,
        swarm_port: u16,
    ) -> StoreResult<()> {
        let addresses = serde_json::json!({
            "API": format!("/ip4/127.0.0.1/tcp/{api_port}"),
            "Announce": [],
            "Gateway": format!("/ip4/127.0.0.1/tcp/{gateway_port}"),
            "NoAnnounce": [],
            "Swarm": [
                format!("/ip4/0.0.0.0/tcp/{swarm_port}"),
                format!("/ip6/::/tcp/{swarm_port}"),
                format!("/ip4/0.0.0.0/udp/{swarm_port}/quic"),
                format!("/ip6/::/udp/{swarm_port}/quic"),
            ],
        })
        .to_string();
        let args = ["config", "--json", "Addresses", addresses.as_str()];
        let out = self.run(&args).await?;

        if out.code != 0 {
            self.log_failure(&args, &out);
            return Err(StoreError::Startup {
                command: self.command_line(&args),
                code: out.code,
                stdout: out.stdout_text(),
                stderr: out.stderr_text(),
            });
        }

        tracing::info!("store repository configured");
        Ok(())
    }

    /// Launch the store daemon and its two log pumps.
    ///
    /// Returns immediately. Each pump drains one output stream line-by-line
    /// into the log until the pipe closes; daemon failure is observed only
    /// as stream termination (accepted limitation).
    pub async fn run_daemon(&self) -> StoreResult<StoreDaemon> {
        tracing::info!("store daemon starting");
        let mut child = exec::spawn_daemon(&self.binary, &["daemon"], &self.env())?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| std::io::Error::other("daemon stdout was not piped"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| std::io::Error::other("daemon stderr was not piped"))?;

        let stdout_pump = tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                tracing::info!("store daemon stdout: {line}");
            }
        });
        let stderr_pump = tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                tracing::error!("store daemon stderr: {line}");
            }
        });

        Ok(StoreDaemon {
            child,
            stdout_pump,
            stderr_pump,
        })
    }

    /// Ingest a local file and pin the result.
    ///
    /// Fixed parameters: 1024-byte chunking, SHA-256 hashing, pinned so the
    /// content is exempt from garbage collection. Returns the bare CID the
    /// store prints.
    pub async fn add(&self, path: &std::path::Path) -> StoreResult<Cid> {
        let path = path.to_string_lossy();
        let args = [
            "add",
            "--chunker",
            "size-1024",
            "--hash",
            "sha2-256",
            "--quieter",
            "--pin",
            path.as_ref(),
        ];
        let out = self.run(&args).await?;

        if out.code != 0 {
            return Err(self.operation_fault(&args, &out));
        }

        let cid = Cid::parse(out.stdout_text().trim())?;
        tracing::info!(%cid, "store added content");
        Ok(cid)
    }

    /// Probe whether a CID is reachable, bounded by a 5 second timeout.
    ///
    /// Requests the first byte of content. Any failure, including timeout
    /// or a spawn error, is a normal miss signal; this never errors.
    pub async fn is_available(&self, cid: &Cid) -> bool {
        let args = ["--timeout", PROBE_TIMEOUT, "cat", "--length", "1", cid.as_str()];
        match self.run(&args).await {
            Ok(out) => out.code == 0,
            Err(_) => false,
        }
    }

    /// Fetch full content into a freshly allocated ephemeral file.
    ///
    /// The caller owns the returned guard; the file is removed when it
    /// drops, including on faults after this call returns.
    pub async fn fetch(&self, cid: &Cid) -> StoreResult<EphemeralFile> {
        let file = EphemeralFile::allocate(&self.ephemeral_dir).await?;
        let output = file.path().to_string_lossy().into_owned();
        let args = [
            "--timeout",
            FETCH_TIMEOUT,
            "get",
            "--output",
            output.as_str(),
            cid.as_str(),
        ];
        let out = self.run(&args).await?;

        if out.code != 0 {
            return Err(self.operation_fault(&args, &out));
        }

        tracing::info!(%cid, "store fetched content");
        Ok(file)
    }
}
