//! Long-lived protocol server.
//!
//! One coordinator answers newline-delimited `CHECK_AND_DOWNLOAD` requests
//! for as long as the server runs, so the cooldown window spans every
//! request instead of resetting with each process. Each line in is one JSON
//! request; each line out is the matching JSON response.

use crate::detector::IntentSink;
use crate::protocol::{self, DownloadResponse};
use anyhow::{Context, Result};
use std::future::Future;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

/// Answers requests read from `reader` until EOF.
///
/// A malformed line gets an `ERROR` response and the connection stays open.
pub async fn serve_lines<R, W>(sink: &dyn IntentSink, reader: R, mut writer: W) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    loop {
        line.clear();
        let read = reader
            .read_line(&mut line)
            .await
            .context("Failed to read request line")?;
        if read == 0 {
            return Ok(());
        }

        let raw = line.trim();
        if raw.is_empty() {
            continue;
        }

        let response = match protocol::dispatch_json(sink, raw).await {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!("Rejected request: {:#}", e);
                serde_json::to_string(&DownloadResponse::Error)
                    .context("Failed to serialize download response")?
            }
        };

        writer
            .write_all(format!("{}\n", response).as_bytes())
            .await
            .context("Failed to write response")?;
        writer.flush().await.context("Failed to flush response")?;
    }
}

/// Serves the process's stdin and stdout.
pub async fn serve_stdio(sink: &dyn IntentSink) -> Result<()> {
    serve_lines(sink, tokio::io::stdin(), tokio::io::stdout()).await
}

/// Listens on a Unix socket until `shutdown` resolves.
///
/// Each connection is served on its own task; all of them share `sink`.
/// A leftover socket file is replaced, since the caller already holds the
/// coordinator lock.
#[cfg(unix)]
pub async fn serve_socket(
    sink: Arc<dyn IntentSink>,
    socket_path: &std::path::Path,
    shutdown: impl Future<Output = ()>,
) -> Result<()> {
    use tokio::net::UnixListener;

    if socket_path.exists() {
        std::fs::remove_file(socket_path).with_context(|| {
            format!("Failed to remove stale socket: {}", socket_path.display())
        })?;
    }
    let listener = UnixListener::bind(socket_path)
        .with_context(|| format!("Failed to bind socket: {}", socket_path.display()))?;
    tracing::info!(socket = %socket_path.display(), "Serving download requests");

    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, _) = accepted.context("Failed to accept connection")?;
                let conn_sink = sink.clone();
                tokio::spawn(async move {
                    let (reader, writer) = stream.into_split();
                    if let Err(e) = serve_lines(conn_sink.as_ref(), reader, writer).await {
                        tracing::debug!("Connection closed: {:#}", e);
                    }
                });
            }
            _ = &mut shutdown => break,
        }
    }

    if let Err(e) = std::fs::remove_file(socket_path) {
        tracing::debug!("Failed to remove socket {}: {}", socket_path.display(), e);
    }
    Ok(())
}

#[cfg(not(unix))]
pub async fn serve_socket(
    _sink: Arc<dyn IntentSink>,
    _socket_path: &std::path::Path,
    _shutdown: impl Future<Output = ()>,
) -> Result<()> {
    anyhow::bail!("Socket serving is only available on Unix")
}

/// Sends one raw JSON request to a running server and returns its response.
///
/// Returns `Ok(None)` when no server is listening at `socket_path`.
#[cfg(unix)]
pub async fn forward(socket_path: &std::path::Path, raw: &str) -> Result<Option<String>> {
    use tokio::net::UnixStream;

    let stream = match UnixStream::connect(socket_path).await {
        Ok(stream) => stream,
        Err(_) => return Ok(None),
    };
    let (reader, mut writer) = stream.into_split();
    writer
        .write_all(format!("{}\n", raw.trim()).as_bytes())
        .await
        .context("Failed to send request")?;

    let mut response = String::new();
    BufReader::new(reader)
        .read_line(&mut response)
        .await
        .context("Failed to read response")?;
    if response.is_empty() {
        anyhow::bail!("Server closed the connection without answering");
    }
    Ok(Some(response.trim_end().to_string()))
}

#[cfg(not(unix))]
pub async fn forward(_socket_path: &std::path::Path, _raw: &str) -> Result<Option<String>> {
    Ok(None)
}

#[cfg(test)]
#[path = "serve_tests.rs"]
mod tests;
