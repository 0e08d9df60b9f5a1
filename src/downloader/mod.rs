//! Acquisition orchestrator split into focused submodules.
//!
//! The `DouyinDownloader` struct and its methods are organized by flow:
//! - [`single`] - single video / image-post acquisition
//! - [`user`] - user-page flows (post walk, like walk, collection list)
//! - [`collections`] - collection and music-feed walks
//! - [`media_files`] - per-item media and sidecar persistence
//!
//! A run processes its input links strictly sequentially; every failure is
//! contained at the smallest unit that owns it (asset, item, page, link)
//! and converted into statistics, so one broken link never aborts the rest.

mod collections;
mod media_files;
mod single;
mod user;

use crate::api::ApiClient;
use crate::config::Config;
use crate::db::{Database, DedupStore};
use crate::error::Result;
use crate::links;
use crate::rate_limit::RateLimiter;
use crate::signing::QuerySigner;
use crate::stats::{DownloadStats, StatsSnapshot};
use crate::types::{ContentReference, ContentType, Scope};
use crate::walker::WalkContext;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Main downloader instance (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct DouyinDownloader {
    /// Configuration (wrapped in Arc for sharing across flows)
    pub(crate) config: Arc<Config>,
    /// API client owning the HTTP transport, headers and rate limiter
    pub(crate) api: Arc<ApiClient>,
    /// Run counters
    pub(crate) stats: Arc<DownloadStats>,
    /// Dedup store; `None` when the database is disabled in config
    pub(crate) db: Option<Arc<Database>>,
    /// Cancellation token observed at every suspension point
    pub(crate) cancel: CancellationToken,
}

impl DouyinDownloader {
    /// Create a new downloader instance with no query signer.
    ///
    /// Validates the configuration, creates the save directory, and opens
    /// the dedup database when enabled. Requests are issued unsigned; see
    /// [`with_signer`](Self::with_signer) to attach a signing function.
    pub async fn new(config: Config) -> Result<Self> {
        Self::with_signer(config, None).await
    }

    /// Create a new downloader instance with an external query signer
    pub async fn with_signer(
        config: Config,
        signer: Option<Arc<dyn QuerySigner>>,
    ) -> Result<Self> {
        config.validate()?;

        tokio::fs::create_dir_all(&config.download.save_path).await?;

        let db = if config.database.enabled {
            Some(Arc::new(Database::new(&config.database.path).await?))
        } else {
            None
        };

        let limiter = Arc::new(RateLimiter::new(config.rate.max_per_second));
        let api = Arc::new(ApiClient::new(&config.request, limiter, signer)?);

        Ok(Self {
            config: Arc::new(config),
            api,
            stats: Arc::new(DownloadStats::new()),
            db,
            cancel: CancellationToken::new(),
        })
    }

    /// Token observed by every flow; cancel it to stop the run at the next
    /// suspension point
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Request a graceful stop of the current run
    pub fn shutdown(&self) {
        tracing::info!("shutdown requested");
        self.cancel.cancel();
    }

    /// Point-in-time view of the run counters
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Process an ordered list of input links.
    ///
    /// Each link is resolved, classified and dispatched to its flow. A
    /// link-level failure (unresolvable ID, exhausted retries, zero items)
    /// is recorded in the statistics and never aborts later links. Returns
    /// the final counters.
    pub async fn run(&self, links: &[String]) -> Result<StatsSnapshot> {
        for (index, link) in links.iter().enumerate() {
            if self.cancel.is_cancelled() {
                tracing::info!("run cancelled");
                break;
            }
            tracing::info!(link, position = index + 1, total = links.len(), "processing link");

            let reference = match links::classify(self.api.http(), &self.config.retry, link).await
            {
                Ok(reference) => reference,
                Err(e) => {
                    tracing::error!(link, error = %e, "could not classify link");
                    self.stats.record_failure();
                    continue;
                }
            };

            self.dispatch(&reference).await;

            let snapshot = self.stats.snapshot();
            tracing::info!(
                position = index + 1,
                total = links.len(),
                success = snapshot.success,
                failed = snapshot.failed,
                skipped = snapshot.skipped,
                "link finished"
            );
        }

        let snapshot = self.stats.snapshot();
        tracing::info!(%snapshot, "run finished");
        Ok(snapshot)
    }

    /// Route one classified link to its flow
    async fn dispatch(&self, reference: &ContentReference) {
        tracing::debug!(
            url = %reference.resolved_url,
            kind = ?reference.content_type,
            id = %reference.id,
            "dispatching"
        );
        match reference.content_type {
            ContentType::Video | ContentType::Image => self.download_single(reference).await,
            ContentType::User => self.download_user_page(&reference.id).await,
            ContentType::Mix => self.download_mix(&reference.id).await,
            ContentType::Music => self.download_music(&reference.id).await,
            ContentType::Live => {
                tracing::warn!(url = %reference.resolved_url, "live streams are not downloadable, skipping");
                self.stats.record_skip();
            }
        }
    }

    /// The dedup store, when incremental mode is on for `scope`
    pub(crate) fn dedup_for(&self, scope: Scope) -> Option<&dyn DedupStore> {
        if self.config.increment.for_scope(scope) {
            self.db.as_deref().map(|db| db as &dyn DedupStore)
        } else {
            None
        }
    }

    /// Walk context for one scope; `limit` caps successfully handled items
    pub(crate) fn walk_ctx(&self, scope: Scope, limit: usize) -> WalkContext<'_> {
        WalkContext {
            retry: &self.config.retry,
            dedup: self.dedup_for(scope),
            time_filter: &self.config.time_filter,
            limit,
            stats: &self.stats,
            cancel: &self.cancel,
        }
    }
}
