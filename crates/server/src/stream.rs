//! Streaming transfer layer.
//!
//! Chunked pumps between network bodies, files, and outbound responses.
//! Nothing here buffers a whole payload: transfers move in nominal 1 KiB
//! chunks, and every staged file is an [`EphemeralFile`] owned by exactly
//! one stream so cancellation releases it.

use bytes::Bytes;
use futures::stream::BoxStream;
use futures::{Stream, StreamExt};
use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode, Url};
use silo_store::EphemeralFile;
use std::path::Path;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Nominal transfer chunk size.
pub const CHUNK_SIZE: usize = silo_core::CHUNK_SIZE;

/// Lazily consumed upstream body.
pub type UpstreamBody = BoxStream<'static, reqwest::Result<Bytes>>;

/// Two-phase upstream result: the status is resolved eagerly, before any
/// body byte is read, so the node can answer its own client with the
/// correct status line before committing to stream a body of unknown size.
/// Dropping `body` before exhaustion closes the upstream connection.
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub body: UpstreamBody,
}

/// Open an outbound request and resolve its status without touching the
/// body.
pub async fn proxy_upstream(
    client: &reqwest::Client,
    method: Method,
    url: Url,
    headers: HeaderMap,
) -> reqwest::Result<UpstreamResponse> {
    let response = client
        .request(method, url)
        .headers(headers)
        .send()
        .await?;
    let status = response.status();

    Ok(UpstreamResponse {
        status,
        body: response.bytes_stream().boxed(),
    })
}

/// Produce the finite, in-order chunk sequence of a staged file, starting
/// from byte zero.
///
/// The stream owns the [`EphemeralFile`] guard: the file stays alive for as
/// long as anything may still read from it and is removed when the stream
/// is dropped, exhausted or not.
pub fn file_chunks(file: EphemeralFile) -> impl Stream<Item = std::io::Result<Bytes>> + Send {
    async_stream::try_stream! {
        let file = file;
        let mut handle = tokio::fs::File::open(file.path()).await?;
        let mut buf = vec![0u8; CHUNK_SIZE];
        loop {
            let n = handle.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            yield Bytes::copy_from_slice(&buf[..n]);
        }
    }
}

/// Append every chunk of `stream`, in order, to the file at `path`.
pub async fn stage_to_file<S, E>(stream: S, path: &Path) -> std::io::Result<()>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let mut stream = std::pin::pin!(stream);
    let mut file = tokio::fs::File::create(path).await?;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(std::io::Error::other)?;
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    Ok(())
}

/// Tee an upstream body into `staging` while yielding each chunk to the
/// consumer.
///
/// The consumer is never blocked on anything but its own chunk: each chunk
/// is appended to the staging file and handed on immediately. Only on clean
/// exhaustion is the staged file flushed and passed to `on_complete`; a
/// mid-stream error or an early drop releases the guard instead (removing
/// the file) and `on_complete` never runs.
pub fn stage_and_stream<F>(
    body: UpstreamBody,
    staging: EphemeralFile,
    on_complete: F,
) -> impl Stream<Item = std::io::Result<Bytes>> + Send
where
    F: FnOnce(EphemeralFile) + Send + 'static,
{
    async_stream::try_stream! {
        let mut body = body;
        let mut file = tokio::fs::File::create(staging.path()).await?;
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(std::io::Error::other)?;
            file.write_all(&chunk).await?;
            yield chunk;
        }
        file.flush().await?;
        drop(file);
        on_complete(staging);
    }
}
