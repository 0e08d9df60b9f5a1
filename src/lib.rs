//! # douyin-dl
//!
//! Configurable content-acquisition library for the Douyin short-video
//! platform: single posts, image sets, user pages, collections and music
//! feeds, from links of any shape (including `v.douyin.com` short links).
//!
//! ## Design Philosophy
//!
//! douyin-dl is designed to be:
//! - **Resilient** - bounded retries, fallback source URLs, and failures
//!   contained per item rather than aborting the run
//! - **Incremental** - previously acquired items are recorded and skipped,
//!   and existing files are never re-downloaded
//! - **Well-behaved** - a shared rate limiter spaces every outgoing request
//! - **Library-first** - no CLI or UI, purely a Rust crate for embedding
//!
//! The platform's request-signing algorithm and the interactive credential
//! flow are deliberately not part of this crate: embedders supply a
//! [`QuerySigner`] and a Cookie string.
//!
//! ## Quick Start
//!
//! ```no_run
//! use douyin_dl::{Config, DouyinDownloader};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.request.cookie = Some("msToken=...; ttwid=...".to_string());
//!
//!     let downloader = DouyinDownloader::new(config).await?;
//!     let stats = downloader
//!         .run(&["https://www.douyin.com/video/7123456789012345678".to_string()])
//!         .await?;
//!     println!("{stats}");
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Remote API client and per-scope page sources
pub mod api;
/// Configuration types
pub mod config;
/// Dedup persistence layer
pub mod db;
/// Acquisition orchestrator (decomposed into focused submodules)
pub mod downloader;
/// Error types
pub mod error;
/// Input-link classification and resolution
pub mod links;
/// Media URL resolution
pub mod media;
/// Request pacing with a minimum inter-request interval
pub mod rate_limit;
/// Retry logic with an escalating delay schedule
pub mod retry;
/// Request-signing seam
pub mod signing;
/// Run statistics
pub mod stats;
/// File acquisition with fallback sources
pub mod transfer;
/// Core types
pub mod types;
/// Utility functions
pub mod utils;
/// Generic pagination walker
pub mod walker;

// Re-export commonly used types
pub use config::Config;
pub use db::{Database, DedupStore};
pub use downloader::DouyinDownloader;
pub use error::{Error, Result, TransferError};
pub use media::DownloadTarget;
pub use signing::{QuerySigner, SigningError};
pub use stats::{DownloadStats, StatsSnapshot};
pub use types::{ContentReference, ContentType, DedupKey, Page, Post, PostAssets, Scope};

/// Run a downloader over `links` with graceful signal handling.
///
/// On SIGTERM/SIGINT (Ctrl+C elsewhere) the run is cancelled at its next
/// suspension point and the partial statistics are returned; any in-flight
/// file write is aborted without leaving a partial file at its final path.
///
/// # Example
///
/// ```no_run
/// use douyin_dl::{Config, DouyinDownloader, run_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let downloader = DouyinDownloader::new(Config::default()).await?;
///     let links = vec!["https://v.douyin.com/abcDEF/".to_string()];
///     let stats = run_with_shutdown(downloader, links).await?;
///     println!("{stats}");
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(
    downloader: DouyinDownloader,
    links: Vec<String>,
) -> Result<StatsSnapshot> {
    let run = downloader.run(&links);
    tokio::pin!(run);

    tokio::select! {
        result = &mut run => result,
        () = wait_for_signal() => {
            downloader.shutdown();
            run.await
        }
    }
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Signal registration may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("received SIGTERM");
                }
                _ = sigint.recv() => {
                    tracing::info!("received SIGINT (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("received SIGINT (Ctrl+C)");
            } else {
                tracing::error!("could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("received SIGTERM");
            } else {
                tracing::error!("could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("received Ctrl+C");
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
        }
    }
}
