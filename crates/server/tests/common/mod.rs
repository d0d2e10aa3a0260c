//! Server test utilities.
//!
//! Note: dead_code allowed because each test file compiles common/
//! separately and uses a different subset of it.
#![allow(dead_code)]

use axum::Json;
use axum::body::Body;
use axum::extract::{Path as AxumPath, Request, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use silo_coordinator::CoordinatorClient;
use silo_core::config::{
    AppConfig, CoordinatorConfig, ServerConfig, StoreConfig, SubstituterConfig,
};
use silo_server::{AppState, create_router};
use silo_store::StoreClient;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub const TEST_HOST: &str = "cache.example.org";

/// Scripted stand-in for the store CLI; `IPFS_PATH` is its repository root
/// and ingested content lives under `blocks/` keyed by checksum-derived CID.
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
            exit 1
        fi
        mkdir -p "$REPO/blocks"
        : > "$REPO/config"
        ;;
    config)
        printf '%s' "$3" > "$REPO/addresses.json"
        ;;
    daemon)
        echo "Daemon is ready"
        ;;
    add)
        src="$7"
        cid="bafy$(cksum < "$src" | tr -cd '[:alnum:]')"
        cp "$src" "$REPO/blocks/$cid"
        printf '%s\n' "$cid"
        ;;
    cat)
        [ -f "$REPO/blocks/$3" ] || exit 1
        ;;
    get)
        [ -f "$REPO/blocks/$3" ] || exit 1
        cp "$REPO/blocks/$3" "$2"
        ;;
    *)
        echo "unknown subcommand: $cmd" >&2
        exit 64
        ;;
esac
"#;

pub fn install_fake_store(dir: &Path) -> PathBuf {
    let path = dir.join("ipfs");
    std::fs::write(&path, FAKE_STORE).expect("failed to write fake store script");
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

/// Spawn a router on an ephemeral local port.
pub async fn spawn_router(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

pub type Registry = Arc<Mutex<HashMap<(String, String), String>>>;

async fn registry_lookup(
    State(registry): State<Registry>,
    AxumPath((host, hash)): AxumPath<(String, String)>,
) -> axum::response::Response {
    match registry.lock().unwrap().get(&(host, hash)) {
        Some(cid) => Json(serde_json::json!({ "cid": cid })).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn registry_register(
    State(registry): State<Registry>,
    AxumPath((host, hash, cid)): AxumPath<(String, String, String)>,
) -> Json<serde_json::Value> {
    registry.lock().unwrap().insert((host, hash), cid);
    Json(serde_json::json!({ "success": true }))
}

async fn registry_invalidate(
    State(registry): State<Registry>,
    AxumPath((host, hash)): AxumPath<(String, String)>,
) -> Json<serde_json::Value> {
    let removed = registry.lock().unwrap().remove(&(host, hash)).is_some();
    Json(serde_json::json!({ "success": removed }))
}

/// In-memory coordinator registry stub.
pub async fn spawn_coordinator() -> (SocketAddr, Registry) {
    let registry: Registry = Arc::new(Mutex::new(HashMap::new()));
    let router = Router::new()
        .route(
            "/api/host/{host}/hash/{hash}",
            get(registry_lookup).delete(registry_invalidate),
        )
        .route(
            "/api/host/{host}/hash/{hash}/cid/{cid}",
            post(registry_register),
        )
        .with_state(registry.clone());
    (spawn_router(router).await, registry)
}

#[derive(Clone)]
struct SubstituterState {
    artifacts: Arc<HashMap<String, Vec<u8>>>,
    hits: Arc<AtomicUsize>,
}

async fn substituter_serve(State(state): State<SubstituterState>, req: Request) -> axum::response::Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    let path = req.uri().path().trim_start_matches('/').to_string();
    match state.artifacts.get(&path) {
        Some(bytes) => (StatusCode::OK, Body::from(bytes.clone())).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Upstream substituter stub serving a fixed artifact set and counting
/// every request it receives.
pub async fn spawn_substituter(
    artifacts: HashMap<String, Vec<u8>>,
) -> (SocketAddr, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let state = SubstituterState {
        artifacts: Arc::new(artifacts),
        hits: hits.clone(),
    };
    let router = Router::new()
        .fallback(substituter_serve)
        .with_state(state);
    (spawn_router(router).await, hits)
}

/// A full node wired to stub collaborators and a scripted store binary.
pub struct TestNode {
    pub addr: SocketAddr,
    pub registry: Registry,
    pub upstream_hits: Arc<AtomicUsize>,
    pub store: StoreClient,
    pub ephemeral_dir: PathBuf,
    _root: TempDir,
}

impl TestNode {
    pub async fn spawn(artifacts: HashMap<String, Vec<u8>>) -> Self {
        let root = tempfile::tempdir().expect("Failed to create temp directory");
        let binary = install_fake_store(root.path());

        let (coordinator_addr, registry) = spawn_coordinator().await;
        let (substituter_addr, upstream_hits) = spawn_substituter(artifacts).await;

        let config = AppConfig {
            server: ServerConfig::default(),
            store: StoreConfig {
                binary: binary.to_string_lossy().into_owned(),
                data_dir: root.path().join("repo"),
                ephemeral_dir: root.path().join("ephemeral"),
                api_port: 5001,
                gateway_port: 8081,
                swarm_port: 4001,
            },
            coordinator: CoordinatorConfig {
                url: format!("http://{coordinator_addr}"),
                host: TEST_HOST.to_string(),
            },
            substituter: SubstituterConfig {
                url: format!("http://{substituter_addr}"),
            },
        };

        let store = StoreClient::new(&config.store);
        store.init().await.expect("store init");
        let coordinator = CoordinatorClient::new(&config.coordinator).expect("coordinator client");

        let ephemeral_dir = config.store.ephemeral_dir.clone();
        let state = AppState::new(config, store.clone(), coordinator).expect("state");
        let addr = spawn_router(create_router(state)).await;

        Self {
            addr,
            registry,
            upstream_hits,
            store,
            ephemeral_dir,
            _root: root,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}/{}", self.addr, path.trim_start_matches('/'))
    }

    /// Registered CID for a hash, if any.
    pub fn mapping(&self, hash: &str) -> Option<String> {
        self.registry
            .lock()
            .unwrap()
            .get(&(TEST_HOST.to_string(), hash.to_string()))
            .cloned()
    }

    /// Poll until the background populate registers `hash`, up to 5s.
    pub async fn wait_for_mapping(&self, hash: &str) -> String {
        for _ in 0..100 {
            if let Some(cid) = self.mapping(hash) {
                return cid;
            }
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        }
        panic!("mapping for {hash} never appeared");
    }

    /// Count of files currently in the ephemeral directory.
    pub fn ephemeral_count(&self) -> usize {
        match std::fs::read_dir(&self.ephemeral_dir) {
            Ok(entries) => entries.count(),
            Err(_) => 0,
        }
    }
}
