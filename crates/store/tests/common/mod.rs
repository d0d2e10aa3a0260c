//! Store test utilities.

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Scripted stand-in for the store CLI.
///
/// Uses `IPFS_PATH` as its repository root, mirrors the adapter's exact
/// argument shapes, and keeps ingested content under `blocks/` keyed by a
/// checksum-derived CID so add/probe/fetch round-trip for real.
const FAKE_STORE: &str = r#"#!/bin/sh
set -u
REPO="${IPFS_PATH:?}"

if [ "$1" = "--timeout" ]; then
    shift 2
fi

cmd="$1"
shift

case "$cmd" in
    init)
        if [ -e "$REPO/config" ]; then
            echo "Error: ipfs configuration file already exists!" >&2
            echo "Reinitializing would overwrite your keys." >&2
            exit 1
        fi
        mkdir -p "$REPO/blocks"
        : > "$REPO/config"
        ;;
    config)
        # config --json Addresses <json>
        printf '%s' "$3" > "$REPO/addresses.json"
        ;;
    daemon)
        echo "Initializing daemon..."
        echo "Daemon is ready"
        echo "dht: bootstrap peers unreachable" >&2
        ;;
    add)
        # add --chunker size-1024 --hash sha2-256 --quieter --pin <path>
        src="$7"
        cid="bafy$(cksum < "$src" | tr -cd '[:alnum:]')"
        cp "$src" "$REPO/blocks/$cid"
        printf '%s\n' "$cid"
        ;;
    cat)
        # cat --length 1 <cid>
        [ -f "$REPO/blocks/$3" ] || exit 1
        ;;
    get)
        # get --output <path> <cid>
        if [ ! -f "$REPO/blocks/$3" ]; then
            echo "Error: merkledag: not found" >&2
            exit 1
        fi
        cp "$REPO/blocks/$3" "$2"
        ;;
    *)
        echo "unknown subcommand: $cmd" >&2
        exit 64
        ;;
esac
"#;

/// Stand-in whose every invocation fails with an unrelated error, for
/// exercising fatal startup paths.
const BROKEN_STORE: &str = r#"#!/bin/sh
echo "Error: lock is held by another process" >&2
exit 2
"#;

/// Write the fake store binary into `dir` and return its path.
#[allow(dead_code)]
pub fn install_fake_store(dir: &Path) -> PathBuf {
    install_script(dir, "ipfs", FAKE_STORE)
}

/// Write the always-failing store binary into `dir` and return its path.
#[allow(dead_code)]
pub fn install_broken_store(dir: &Path) -> PathBuf {
    install_script(dir, "broken-ipfs", BROKEN_STORE)
}

fn install_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).expect("failed to write fake store script");
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

/// Build a `StoreConfig` pointing at the fake binary with scratch
/// repository and ephemeral directories under `root`.
#[allow(dead_code)]
pub fn store_config(binary: &Path, root: &Path) -> silo_core::config::StoreConfig {
    silo_core::config::StoreConfig {
        binary: binary.to_string_lossy().into_owned(),
        data_dir: root.join("repo"),
        ephemeral_dir: root.join("ephemeral"),
        api_port: 5001,
        gateway_port: 8081,
        swarm_port: 4001,
    }
}
