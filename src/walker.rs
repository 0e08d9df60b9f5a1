//! Generic cursor-based collection walker
//!
//! One loop drives every scope (post, like, mix, music): fetch a page
//! through the retry executor, skip items the dedup store already recorded,
//! drop items outside the time window, and hand the rest to the caller's
//! item handler in server order. There is no fan-out — items are processed
//! strictly sequentially, and request pacing is enforced inside the API
//! client every page fetch goes through.
//!
//! A page fetch that fails after retries ends the walk as if the stream
//! were exhausted; it is the caller's per-item handler that feeds the run
//! statistics, so a truncated walk never poisons the rest of the run.

use crate::api::scopes::PageSource;
use crate::config::{RetryConfig, TimeFilterConfig};
use crate::db::DedupStore;
use crate::error::Error;
use crate::retry::execute_with_retry;
use crate::stats::DownloadStats;
use crate::types::{DedupKey, Post};
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Everything a walk needs besides the page source and the item handler
pub struct WalkContext<'a> {
    /// Retry schedule for page fetches
    pub retry: &'a RetryConfig,
    /// Dedup store; `None` when incremental mode is off for this scope
    pub dedup: Option<&'a dyn DedupStore>,
    /// Create-time window applied to every item
    pub time_filter: &'a TimeFilterConfig,
    /// Maximum successfully handled items (0 = unlimited)
    pub limit: usize,
    /// Run counters, advanced once per yielded item
    pub stats: &'a DownloadStats,
    /// Observed between items and at every page boundary
    pub cancel: &'a CancellationToken,
}

/// What one walk did, for end-of-walk logging
#[derive(Clone, Copy, Debug, Default)]
pub struct WalkSummary {
    /// Items handled successfully
    pub downloaded: usize,
    /// Items skipped because the dedup store already had them
    pub skipped: u64,
    /// Items whose handler reported failure
    pub failed: u64,
}

/// Walk a remote collection from its first page until exhaustion.
///
/// Per item the handler returns `Ok(())` on success (which records the item
/// in the dedup store when incremental mode is on), [`Error::Cancelled`] to
/// stop the walk, or any other error to count the item as failed and move
/// on. The walk ends when the server reports no more pages, a page comes
/// back empty, the count limit is reached, the fetch fails after retries,
/// or the run is cancelled.
pub async fn walk<H, Fut>(
    ctx: WalkContext<'_>,
    source: &dyn PageSource,
    mut handle_item: H,
) -> WalkSummary
where
    H: FnMut(Post) -> Fut,
    Fut: Future<Output = crate::error::Result<()>>,
{
    let scope = source.scope();
    let owner = source.owner_id();
    let mut summary = WalkSummary::default();
    let mut cursor = 0u64;

    'pages: loop {
        if ctx.cancel.is_cancelled() {
            tracing::info!(%scope, owner, "walk cancelled");
            break;
        }

        let page = match execute_with_retry(ctx.retry, || source.fetch_page(cursor)).await {
            Ok(page) => page,
            Err(e) => {
                // exhausted retries or a business error: end of stream, not fatal
                tracing::warn!(%scope, owner, cursor, error = %e, "page fetch failed, ending walk");
                break;
            }
        };

        if page.items.is_empty() {
            tracing::debug!(%scope, owner, cursor, "empty page, ending walk");
            break;
        }

        for post in page.items {
            if ctx.cancel.is_cancelled() {
                tracing::info!(%scope, owner, "walk cancelled");
                break 'pages;
            }
            if ctx.limit > 0 && summary.downloaded >= ctx.limit {
                tracing::info!(%scope, owner, limit = ctx.limit, "item limit reached");
                break 'pages;
            }

            if let Some(store) = ctx.dedup {
                let key = DedupKey {
                    scope,
                    owner_id: owner,
                    item_id: &post.id,
                };
                match store.is_done(&key).await {
                    Ok(true) => {
                        tracing::debug!(%scope, owner, item = %post.id, "already recorded, skipping");
                        summary.skipped += 1;
                        ctx.stats.record_skip();
                        continue;
                    }
                    Ok(false) => {}
                    Err(e) => {
                        // a broken store must not block downloads
                        tracing::warn!(%scope, owner, item = %post.id, error = %e, "dedup lookup failed");
                    }
                }
            }

            if !ctx.time_filter.passes(post.create_time) {
                tracing::debug!(%scope, owner, item = %post.id, "outside time window");
                continue;
            }

            // the handler consumes the post; keep what dedup recording needs
            let item_id = post.id.clone();
            let snapshot = ctx.dedup.map(|_| post.raw.clone());

            match handle_item(post).await {
                Ok(()) => {
                    summary.downloaded += 1;
                    ctx.stats.record_success();
                    if let (Some(store), Some(snapshot)) = (ctx.dedup, snapshot) {
                        let key = DedupKey {
                            scope,
                            owner_id: owner,
                            item_id: &item_id,
                        };
                        if let Err(e) = store.mark_done(&key, &snapshot).await {
                            tracing::warn!(%scope, owner, item = %item_id, error = %e, "failed to record item");
                        }
                    }
                }
                Err(Error::Cancelled) => {
                    tracing::info!(%scope, owner, item = %item_id, "walk cancelled mid-item");
                    break 'pages;
                }
                Err(e) => {
                    tracing::error!(%scope, owner, item = %item_id, error = %e, "item failed");
                    summary.failed += 1;
                    ctx.stats.record_failure();
                }
            }
        }

        if !page.has_more {
            break;
        }
        if ctx.limit > 0 && summary.downloaded >= ctx.limit {
            break;
        }
        cursor = page.cursor;
    }

    tracing::info!(
        %scope,
        owner,
        downloaded = summary.downloaded,
        skipped = summary.skipped,
        failed = summary.failed,
        "walk finished"
    );
    summary
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Page, PostAssets, Scope, VideoSources};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn post(id: &str) -> Post {
        Post {
            id: id.to_string(),
            sec_uid: None,
            author_name: None,
            desc: String::new(),
            create_time: None,
            assets: PostAssets::Video(VideoSources::default()),
            music_urls: Vec::new(),
            cover_urls: Vec::new(),
            raw: json!({"aweme_id": id}),
        }
    }

    /// Serves a fixed sequence of pages; errors once the script runs out
    struct ScriptedSource {
        pages: Mutex<Vec<Page>>,
        fetches: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(pages: Vec<Page>) -> Self {
            Self {
                pages: Mutex::new(pages),
                fetches: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl PageSource for ScriptedSource {
        fn scope(&self) -> Scope {
            Scope::Post
        }

        fn owner_id(&self) -> &str {
            "owner"
        }

        async fn fetch_page(&self, _cursor: u64) -> crate::error::Result<Page> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            let mut pages = self.pages.lock().unwrap();
            if pages.is_empty() {
                Err(Error::Api {
                    code: 1,
                    message: "script exhausted".to_string(),
                })
            } else {
                Ok(pages.remove(0))
            }
        }
    }

    /// In-memory dedup store over a set of (scope, owner, item) triples
    #[derive(Default)]
    struct MemoryStore {
        seen: Mutex<std::collections::HashSet<String>>,
    }

    #[async_trait]
    impl DedupStore for MemoryStore {
        async fn is_done(&self, key: &DedupKey<'_>) -> crate::error::Result<bool> {
            let composite = format!("{}/{}/{}", key.scope, key.owner_id, key.item_id);
            Ok(self.seen.lock().unwrap().contains(&composite))
        }

        async fn mark_done(
            &self,
            key: &DedupKey<'_>,
            _snapshot: &serde_json::Value,
        ) -> crate::error::Result<()> {
            let composite = format!("{}/{}/{}", key.scope, key.owner_id, key.item_id);
            self.seen.lock().unwrap().insert(composite);
            Ok(())
        }
    }

    fn quick_retry() -> RetryConfig {
        RetryConfig {
            max_retries: 1,
            delays: vec![Duration::from_millis(1)],
        }
    }

    struct Fixture {
        retry: RetryConfig,
        time_filter: TimeFilterConfig,
        stats: DownloadStats,
        cancel: CancellationToken,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                retry: quick_retry(),
                time_filter: TimeFilterConfig::default(),
                stats: DownloadStats::new(),
                cancel: CancellationToken::new(),
            }
        }

        fn ctx(&self) -> WalkContext<'_> {
            WalkContext {
                retry: &self.retry,
                dedup: None,
                time_filter: &self.time_filter,
                limit: 0,
                stats: &self.stats,
                cancel: &self.cancel,
            }
        }
    }

    #[tokio::test]
    async fn terminates_after_one_page_when_has_more_is_false() {
        let fx = Fixture::new();
        let source = ScriptedSource::new(vec![Page {
            items: vec![post("1"), post("2")],
            cursor: 99,
            has_more: false,
        }]);

        let summary = walk(fx.ctx(), &source, |_| async { Ok(()) }).await;

        assert_eq!(summary.downloaded, 2);
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1, "no fetch past the last page");
    }

    #[tokio::test]
    async fn advances_the_cursor_across_pages() {
        let fx = Fixture::new();
        let source = ScriptedSource::new(vec![
            Page {
                items: vec![post("1")],
                cursor: 10,
                has_more: true,
            },
            Page {
                items: vec![post("2")],
                cursor: 20,
                has_more: false,
            },
        ]);

        let handled = Mutex::new(Vec::new());
        let summary = walk(fx.ctx(), &source, |p| {
            handled.lock().unwrap().push(p.id);
            async { Ok(()) }
        })
        .await;

        assert_eq!(summary.downloaded, 2);
        assert_eq!(*handled.lock().unwrap(), vec!["1", "2"], "server order preserved");
        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn empty_page_ends_the_walk() {
        let fx = Fixture::new();
        let source = ScriptedSource::new(vec![Page {
            items: vec![],
            cursor: 0,
            has_more: true,
        }]);

        let summary = walk(fx.ctx(), &source, |_| async { Ok(()) }).await;
        assert_eq!(summary.downloaded, 0);
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn fetch_failure_is_end_of_stream_not_a_crash() {
        let fx = Fixture::new();
        // first page succeeds, second hits the exhausted script
        let source = ScriptedSource::new(vec![Page {
            items: vec![post("1")],
            cursor: 5,
            has_more: true,
        }]);

        let summary = walk(fx.ctx(), &source, |_| async { Ok(()) }).await;
        assert_eq!(summary.downloaded, 1);
        assert_eq!(fx.stats.snapshot().success, 1);
    }

    #[tokio::test]
    async fn limit_stops_the_walk() {
        let fx = Fixture::new();
        let source = ScriptedSource::new(vec![Page {
            items: vec![post("1"), post("2"), post("3")],
            cursor: 0,
            has_more: false,
        }]);

        let mut ctx = fx.ctx();
        ctx.limit = 2;
        let summary = walk(ctx, &source, |_| async { Ok(()) }).await;
        assert_eq!(summary.downloaded, 2);
    }

    #[tokio::test]
    async fn dedup_hits_are_skipped_and_successes_recorded() {
        let fx = Fixture::new();
        let store = MemoryStore::default();
        store
            .mark_done(
                &DedupKey {
                    scope: Scope::Post,
                    owner_id: "owner",
                    item_id: "1",
                },
                &json!({}),
            )
            .await
            .unwrap();

        let source = ScriptedSource::new(vec![Page {
            items: vec![post("1"), post("2")],
            cursor: 0,
            has_more: false,
        }]);

        let mut ctx = fx.ctx();
        ctx.dedup = Some(&store);
        let summary = walk(ctx, &source, |_| async { Ok(()) }).await;

        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.downloaded, 1);
        // the fresh item is now recorded for future runs
        assert!(
            store
                .is_done(&DedupKey {
                    scope: Scope::Post,
                    owner_id: "owner",
                    item_id: "2",
                })
                .await
                .unwrap()
        );
        let snap = fx.stats.snapshot();
        assert_eq!(snap.skipped, 1);
        assert_eq!(snap.success, 1);
    }

    #[tokio::test]
    async fn handler_failures_count_and_do_not_mark_dedup() {
        let fx = Fixture::new();
        let store = MemoryStore::default();
        let source = ScriptedSource::new(vec![Page {
            items: vec![post("1")],
            cursor: 0,
            has_more: false,
        }]);

        let mut ctx = fx.ctx();
        ctx.dedup = Some(&store);
        let summary = walk(ctx, &source, |_| async {
            Err(Error::UnexpectedResponse {
                status: Some(500),
                message: "boom".to_string(),
            })
        })
        .await;

        assert_eq!(summary.failed, 1);
        assert_eq!(fx.stats.snapshot().failed, 1);
        assert!(
            !store
                .is_done(&DedupKey {
                    scope: Scope::Post,
                    owner_id: "owner",
                    item_id: "1",
                })
                .await
                .unwrap(),
            "failed items must stay unrecorded"
        );
    }

    #[tokio::test]
    async fn time_filter_drops_items_without_counting_them() {
        let fx = Fixture::new();
        let mut old = post("1");
        old.create_time = chrono::DateTime::from_timestamp(0, 0).map(|dt| dt.naive_utc());
        let mut recent = post("2");
        recent.create_time = chrono::DateTime::from_timestamp(1_700_000_000, 0).map(|dt| dt.naive_utc());

        let source = ScriptedSource::new(vec![Page {
            items: vec![old, recent],
            cursor: 0,
            has_more: false,
        }]);

        let time_filter = TimeFilterConfig {
            start: chrono::NaiveDate::from_ymd_opt(2023, 1, 1),
            end: None,
        };
        let mut ctx = fx.ctx();
        ctx.time_filter = &time_filter;
        let summary = walk(ctx, &source, |_| async { Ok(()) }).await;

        assert_eq!(summary.downloaded, 1);
        assert_eq!(fx.stats.snapshot().total, 1, "filtered items are not counted");
    }

    #[tokio::test]
    async fn cancellation_stops_the_walk() {
        let fx = Fixture::new();
        fx.cancel.cancel();
        let source = ScriptedSource::new(vec![Page {
            items: vec![post("1")],
            cursor: 0,
            has_more: false,
        }]);

        let summary = walk(fx.ctx(), &source, |_| async { Ok(()) }).await;
        assert_eq!(summary.downloaded, 0);
        assert_eq!(source.fetches.load(Ordering::SeqCst), 0);
    }
}
