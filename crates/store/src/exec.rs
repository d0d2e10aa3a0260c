//! One-shot subprocess execution with captured output.
//!
//! This path is only for small structured output (CIDs, config
//! acknowledgements); artifact payloads never pass through it.

use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, Command};

/// Exit code reported when a process terminated without a normal exit
/// status (e.g. killed by a signal).
pub const NO_EXIT_STATUS: i32 = -1;

/// Captured result of a completed subprocess.
#[derive(Debug)]
pub struct CommandOutput {
    /// Exit code, or [`NO_EXIT_STATUS`] if there was none.
    pub code: i32,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    /// Stdout decoded lossily for logging and parsing.
    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// Stderr decoded lossily for logging and marker matching.
    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Run a binary to completion and capture its output.
///
/// No shell is involved. The child environment is the current process
/// environment overlaid with `env` (the global environment is never
/// mutated). If `stdin_bytes` is given it is piped in full and stdin is
/// closed; otherwise stdin is closed immediately.
pub async fn run(
    binary: &str,
    args: &[&str],
    env: &[(&str, &str)],
    stdin_bytes: Option<&[u8]>,
) -> std::io::Result<CommandOutput> {
    let mut command = Command::new(binary);
    command
        .args(args)
        .envs(env.iter().copied())
        .stdin(if stdin_bytes.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = command.spawn()?;

    if let Some(bytes) = stdin_bytes {
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| std::io::Error::other("child stdin was not piped"))?;
        stdin.write_all(bytes).await?;
        // Dropping the handle closes the pipe.
    }

    let output = child.wait_with_output().await?;

    Ok(CommandOutput {
        code: output.status.code().unwrap_or(NO_EXIT_STATUS),
        stdout: output.stdout,
        stderr: output.stderr,
    })
}

/// Spawn a long-lived process and return its handle without waiting.
///
/// Stdout and stderr are piped so the caller can drain them. The child is
/// killed when the handle is dropped, tying its lifetime to the node.
pub fn spawn_daemon(binary: &str, args: &[&str], env: &[(&str, &str)]) -> std::io::Result<Child> {
    Command::new(binary)
        .args(args)
        .envs(env.iter().copied())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
}
