//! HTTP request handlers.

use crate::error::{ApiError, ApiResult};
use crate::resolve;
use crate::state::AppState;
use crate::stream;
use axum::Json;
use axum::extract::{Path, Request, State};
use axum::http::StatusCode;
use axum::http::header::HOST;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use silo_core::hash::ArtifactHash;
use silo_store::EphemeralFile;

/// Publish acknowledgement.
#[derive(Debug, Serialize)]
pub struct PublishResponse {
    pub cid: String,
}

/// Invalidate acknowledgement, mirroring the coordinator's answer.
#[derive(Debug, Serialize)]
pub struct InvalidateResponse {
    pub success: bool,
}

/// GET /v1/health - liveness probe, intentionally unauthenticated.
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Fallback handler: the substituter-compatible read path.
///
/// Any GET (or HEAD) whose path is a well-formed artifact hash runs the
/// resolution flow; the path sans leading slash is the hash. Forwarded
/// headers drop `Host`, which belongs to the upstream connection.
pub async fn fetch_artifact(State(state): State<AppState>, req: Request) -> Response {
    let method = req.method().clone();
    if method != axum::http::Method::GET && method != axum::http::Method::HEAD {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    let path = req.uri().path().trim_start_matches('/');
    let hash = match ArtifactHash::parse(path) {
        Ok(hash) => hash,
        Err(err) => return ApiError::BadRequest(err.to_string()).into_response(),
    };

    let mut headers = req.headers().clone();
    headers.remove(HOST);

    match resolve::fetch(&state, &hash, method, headers).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

/// POST /v1/artifacts/{*hash} - publish an artifact.
///
/// The request body is staged to an ephemeral file, ingested into the
/// store, and registered with the coordinator. Faults from either step
/// surface directly.
pub async fn publish_artifact(
    State(state): State<AppState>,
    Path(hash): Path<String>,
    body: axum::body::Body,
) -> ApiResult<Json<PublishResponse>> {
    let hash = ArtifactHash::parse(&hash).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let staged = EphemeralFile::allocate(state.store.ephemeral_dir()).await?;
    stream::stage_to_file(body.into_data_stream(), staged.path()).await?;

    let cid = resolve::publish(&state, &hash, staged.path()).await?;
    Ok(Json(PublishResponse {
        cid: cid.to_string(),
    }))
}

/// DELETE /v1/artifacts/{*hash} - drop the coordinator mapping.
pub async fn invalidate_artifact(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> ApiResult<Json<InvalidateResponse>> {
    let hash = ArtifactHash::parse(&hash).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let success = resolve::invalidate(&state, &hash).await?;
    Ok(Json(InvalidateResponse { success }))
}
