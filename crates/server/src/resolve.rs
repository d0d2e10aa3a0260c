//! Resolution orchestrator.
//!
//! Per-request control flow:
//! resolve mapping → probe local → serve local, or serve upstream with a
//! best-effort background populate once the proxied body completes.

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::stream;
use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, Method, Response, StatusCode};
use silo_coordinator::CoordinatorClient;
use silo_core::hash::{ArtifactHash, Cid};
use silo_store::{EphemeralFile, StoreClient};
use std::path::Path;
use std::sync::Arc;

const OCTET_STREAM: &str = "application/octet-stream";

/// Resolve and stream one artifact.
///
/// A mapped and reachable CID is served from the content store with no
/// upstream contact. No mapping, or a mapping whose CID is unreachable,
/// falls back to proxying the substituter. Coordinator transport and
/// protocol faults propagate; misses never do.
pub async fn fetch(
    state: &AppState,
    hash: &ArtifactHash,
    method: Method,
    headers: HeaderMap,
) -> ApiResult<Response<Body>> {
    if let Some(cid) = state.coordinator.lookup(hash).await? {
        if state.store.is_available(&cid).await {
            return serve_local(state, hash, &cid).await;
        }
        tracing::info!(%hash, %cid, "mapped cid unreachable, falling back to upstream");
    }

    serve_upstream(state, hash, method, headers).await
}

/// Ingest a local file and register the resulting CID.
///
/// This path is a direct write, not a cache-fill heuristic: faults from
/// either step surface to the caller, including a declined registration.
pub async fn publish(state: &AppState, hash: &ArtifactHash, path: &Path) -> ApiResult<Cid> {
    let cid = state.store.add(path).await?;
    let registered = state.coordinator.register(hash, &cid).await?;
    if !registered {
        return Err(ApiError::Declined(format!(
            "registration of {hash} -> {cid} was not accepted"
        )));
    }
    tracing::info!(%hash, %cid, "published artifact");
    Ok(cid)
}

/// Remove the coordinator mapping for a hash.
///
/// Store content stays pinned; unpinning is outside the primitive set.
pub async fn invalidate(state: &AppState, hash: &ArtifactHash) -> ApiResult<bool> {
    Ok(state.coordinator.invalidate(hash).await?)
}

async fn serve_local(
    state: &AppState,
    hash: &ArtifactHash,
    cid: &Cid,
) -> ApiResult<Response<Body>> {
    let file = state.store.fetch(cid).await?;
    tracing::info!(%hash, %cid, "serving from content store");

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, OCTET_STREAM)
        .body(Body::from_stream(stream::file_chunks(file)))
        .map_err(|e| ApiError::Upstream(format!("response build failed: {e}")))?;
    Ok(response)
}

async fn serve_upstream(
    state: &AppState,
    hash: &ArtifactHash,
    method: Method,
    headers: HeaderMap,
) -> ApiResult<Response<Body>> {
    let url = format!("{}/{}", state.substituter, hash)
        .parse::<reqwest::Url>()
        .map_err(|e| ApiError::BadRequest(format!("unusable upstream url: {e}")))?;

    let upstream = stream::proxy_upstream(&state.upstream, method.clone(), url, headers)
        .await
        .map_err(|e| ApiError::Upstream(format!("substituter request failed: {e}")))?;
    tracing::info!(%hash, status = %upstream.status, "proxying from substituter");

    // Only a successful GET carries a body worth staging; everything else
    // is passed through verbatim.
    let body = if method == Method::GET && upstream.status.is_success() {
        let staging = EphemeralFile::allocate(state.store.ephemeral_dir()).await?;
        let store = state.store.clone();
        let coordinator = state.coordinator.clone();
        let hash = hash.clone();
        Body::from_stream(stream::stage_and_stream(
            upstream.body,
            staging,
            move |staged| {
                tokio::spawn(populate(store, coordinator, hash, staged));
            },
        ))
    } else {
        Body::from_stream(upstream.body)
    };

    let response = Response::builder()
        .status(upstream.status)
        .header(CONTENT_TYPE, OCTET_STREAM)
        .body(body)
        .map_err(|e| ApiError::Upstream(format!("response build failed: {e}")))?;
    Ok(response)
}

/// Best-effort background population after a completed proxied response.
///
/// Runs detached from the request that triggered it; any failure is logged
/// and swallowed, never surfaced to the already-served client. Concurrent
/// populations of the same hash are not coalesced.
async fn populate(
    store: Arc<StoreClient>,
    coordinator: Arc<CoordinatorClient>,
    hash: ArtifactHash,
    staged: EphemeralFile,
) {
    let cid = match store.add(staged.path()).await {
        Ok(cid) => cid,
        Err(err) => {
            tracing::warn!(%hash, %err, "background store add failed");
            return;
        }
    };

    match coordinator.register(&hash, &cid).await {
        Ok(true) => tracing::info!(%hash, %cid, "registered proxied artifact"),
        Ok(false) => tracing::warn!(%hash, %cid, "coordinator declined background registration"),
        Err(err) => tracing::warn!(%hash, %cid, %err, "background registration failed"),
    }
    // `staged` drops here; the staged bytes live on only inside the store.
}
