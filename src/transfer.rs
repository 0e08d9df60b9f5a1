//! File acquisition with fallback sources
//!
//! Downloads one asset from an ordered candidate list: the chosen primary
//! URL first, then each fallback in turn. This is a *different-URL*
//! resilience layer — a candidate is never re-requested; same-operation
//! retry belongs to [`crate::retry`] and is deliberately not applied here.
//!
//! Bytes land in a `.part` file next to the destination and are renamed
//! into place only when the body is fully written, so neither a failure nor
//! a cancellation can leave a partial file at the final path.

use crate::error::{Error, Result, TransferError};
use crate::media::DownloadTarget;
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, REFERER};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Pause after a 403 before moving to the next candidate
const FORBIDDEN_PAUSE: Duration = Duration::from_millis(500);

/// Outcome of one candidate attempt
enum Attempt {
    /// Body persisted to the destination
    Done,
    /// This candidate is unusable; move on
    NextCandidate,
}

/// Acquire one asset.
///
/// Succeeds immediately with no network access when the destination already
/// exists. Otherwise tries every candidate URL in order and fails only once
/// all of them are exhausted. The `Referer` header is stripped from the
/// outgoing request set — some origin servers reject cross-referer asset
/// fetches. Filesystem errors abort the transfer immediately rather than
/// advancing to the next candidate.
pub async fn download(
    client: &reqwest::Client,
    headers: &HeaderMap,
    target: &DownloadTarget,
    cancel: &CancellationToken,
) -> Result<()> {
    if tokio::fs::try_exists(&target.dest).await.unwrap_or(false) {
        tracing::debug!(dest = %target.dest.display(), "destination exists, skipping");
        return Ok(());
    }

    if let Some(parent) = target.dest.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut headers = headers.clone();
    headers.remove(REFERER);

    let candidates = target.candidates();
    let last_index = candidates.len().saturating_sub(1);

    for (index, url) in candidates.iter().copied().enumerate() {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        tracing::debug!(url, attempt = index + 1, total = candidates.len(), "requesting asset");

        match try_candidate(client, &headers, url, target, index == last_index, cancel).await? {
            Attempt::Done => {
                tracing::info!(dest = %target.dest.display(), "asset saved");
                return Ok(());
            }
            Attempt::NextCandidate => {}
        }
    }

    Err(Error::Transfer(TransferError::AllSourcesFailed {
        dest: target.dest.clone(),
        candidates: candidates.len(),
    }))
}

/// Fetch one candidate and persist its body via the temp-then-rename path
async fn try_candidate(
    client: &reqwest::Client,
    headers: &HeaderMap,
    url: &str,
    target: &DownloadTarget,
    is_last: bool,
    cancel: &CancellationToken,
) -> Result<Attempt> {
    let response = match client.get(url).headers(headers.clone()).send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(url, error = %e, "request failed, trying next source");
            return Ok(Attempt::NextCandidate);
        }
    };

    let status = response.status();
    if status == StatusCode::FORBIDDEN && !is_last {
        tracing::warn!(url, "source refused the request, pausing before the next candidate");
        tokio::time::sleep(FORBIDDEN_PAUSE).await;
        return Ok(Attempt::NextCandidate);
    }
    if !status.is_success() {
        tracing::warn!(url, status = status.as_u16(), "unusable response, trying next source");
        return Ok(Attempt::NextCandidate);
    }

    let body = tokio::select! {
        biased;
        () = cancel.cancelled() => return Err(Error::Cancelled),
        body = response.bytes() => match body {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(url, error = %e, "body read failed, trying next source");
                return Ok(Attempt::NextCandidate);
            }
        },
    };

    let temp = temp_path(&target.dest);
    if let Err(e) = tokio::fs::write(&temp, &body).await {
        let _ = tokio::fs::remove_file(&temp).await;
        return Err(e.into());
    }
    if cancel.is_cancelled() {
        let _ = tokio::fs::remove_file(&temp).await;
        return Err(Error::Cancelled);
    }
    if let Err(e) = tokio::fs::rename(&temp, &target.dest).await {
        let _ = tokio::fs::remove_file(&temp).await;
        return Err(e.into());
    }

    Ok(Attempt::Done)
}

/// `<name>.part` next to the destination
fn temp_path(dest: &Path) -> PathBuf {
    let mut name = dest
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("download"));
    name.push(".part");
    dest.with_file_name(name)
}
