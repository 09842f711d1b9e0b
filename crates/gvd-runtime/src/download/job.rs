//! Streaming HTTP(S) file download.

use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use reqwest::Client;
use thiserror::Error;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Errors from a single file download.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("Download request failed: {0}")]
    Network(String),

    #[error("Download failed: HTTP {0}")]
    Status(u16),

    #[error("Download ended after {received} of {expected} bytes")]
    Truncated { received: u64, expected: u64 },

    #[error("Failed to write {path}: {reason}")]
    Io { path: PathBuf, reason: String },

    #[error("Download cancelled")]
    Cancelled,
}

/// One file transfer.
///
/// Bytes go to `<dest>.part` and are renamed into place only after the
/// whole body arrived. Progress is reported as whole percents, never
/// decreasing, ending at 100 on success.
pub struct DownloadJob<'a> {
    client: &'a Client,
    url: &'a str,
    dest: &'a Path,
    user_agent: Option<&'a str>,
    cancel: Option<CancellationToken>,
}

impl<'a> DownloadJob<'a> {
    pub const fn new(client: &'a Client, url: &'a str, dest: &'a Path) -> Self {
        Self {
            client,
            url,
            dest,
            user_agent: None,
            cancel: None,
        }
    }

    #[must_use]
    pub const fn user_agent(mut self, agent: &'a str) -> Self {
        self.user_agent = Some(agent);
        self
    }

    #[must_use]
    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Run the transfer, calling `on_progress` with each new whole percent.
    pub async fn run(self, mut on_progress: impl FnMut(u8) + Send) -> Result<u64, DownloadError> {
        let mut request = self.client.get(self.url);
        if let Some(agent) = self.user_agent {
            request = request.header(reqwest::header::USER_AGENT, agent);
        }

        let response = tokio::select! {
            result = request.send() => result.map_err(|e| DownloadError::Network(e.to_string()))?,
            () = cancelled(self.cancel.as_ref()) => return Err(DownloadError::Cancelled),
        };

        if !response.status().is_success() {
            return Err(DownloadError::Status(response.status().as_u16()));
        }

        let total = response.content_length().unwrap_or(0);
        let part = part_path(self.dest);
        let io_err = |path: &Path, e: std::io::Error| DownloadError::Io {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };

        if let Some(parent) = self.dest.parent() {
            fs::create_dir_all(parent).await.map_err(|e| io_err(parent, e))?;
        }
        let mut file = File::create(&part).await.map_err(|e| io_err(&part, e))?;

        let mut received: u64 = 0;
        let mut last_percent: Option<u8> = None;
        let mut stream = response.bytes_stream();

        let streamed: Result<(), DownloadError> = async {
            loop {
                let next = tokio::select! {
                    next = stream.next() => next,
                    () = cancelled(self.cancel.as_ref()) => return Err(DownloadError::Cancelled),
                };
                let Some(chunk) = next else { break };
                let chunk = chunk.map_err(|e| DownloadError::Network(e.to_string()))?;
                file.write_all(&chunk).await.map_err(|e| io_err(&part, e))?;
                received += chunk.len() as u64;

                if total > 0 {
                    let percent = percent_of(received, total);
                    if last_percent.is_none_or(|last| percent > last) {
                        last_percent = Some(percent);
                        on_progress(percent);
                    }
                }
            }
            file.flush().await.map_err(|e| io_err(&part, e))?;
            Ok(())
        }
        .await;

        if let Err(e) = streamed {
            drop(file);
            let _ = fs::remove_file(&part).await;
            return Err(e);
        }
        drop(file);

        if total > 0 && received < total {
            let _ = fs::remove_file(&part).await;
            return Err(DownloadError::Truncated {
                received,
                expected: total,
            });
        }

        fs::rename(&part, self.dest)
            .await
            .map_err(|e| io_err(self.dest, e))?;

        if last_percent != Some(100) {
            on_progress(100);
        }
        debug!(url = %self.url, bytes = received, dest = %self.dest.display(), "Download complete");
        Ok(received)
    }
}

async fn cancelled(token: Option<&CancellationToken>) {
    match token {
        Some(token) => token.cancelled().await,
        None => std::future::pending::<()>().await,
    }
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".part");
    dest.with_file_name(name)
}

#[allow(clippy::cast_possible_truncation)]
fn percent_of(received: u64, total: u64) -> u8 {
    (received.saturating_mul(100) / total).min(100) as u8
}
