//! User-page flows: post walk, like walk, collection enumeration

use super::DouyinDownloader;
use crate::api::scopes::{UserLikeSource, UserPostSource};
use crate::retry::execute_with_retry;
use crate::types::Scope;
use crate::walker::walk;

impl DouyinDownloader {
    /// Process every configured scope of a user's page, in configured order
    pub(crate) async fn download_user_page(&self, sec_uid: &str) {
        tracing::info!(user = sec_uid, scopes = ?self.config.scopes.user, "processing user page");

        for scope in &self.config.scopes.user {
            if self.cancel.is_cancelled() {
                break;
            }
            match scope {
                Scope::Post => {
                    let source = UserPostSource::new(self.api.clone(), sec_uid);
                    walk(
                        self.walk_ctx(Scope::Post, self.config.limits.post),
                        &source,
                        |post| self.handle_walked_item(post),
                    )
                    .await;
                }
                Scope::Like => {
                    let source = UserLikeSource::new(self.api.clone(), sec_uid);
                    walk(
                        self.walk_ctx(Scope::Like, self.config.limits.like),
                        &source,
                        |post| self.handle_walked_item(post),
                    )
                    .await;
                }
                Scope::Mix => self.download_user_mixes(sec_uid).await,
                Scope::Music => {
                    tracing::warn!(user = sec_uid, "music is not a user-page scope, ignoring");
                }
            }
        }
    }

    /// Enumerate a user's collections and walk each one.
    ///
    /// The configured mix limit caps the number of *collections* processed,
    /// not the items inside them.
    async fn download_user_mixes(&self, sec_uid: &str) {
        let limit = self.config.limits.mix;
        let mut cursor = 0u64;
        let mut processed = 0usize;

        loop {
            if self.cancel.is_cancelled() {
                return;
            }

            let page = match execute_with_retry(&self.config.retry, || {
                self.api.user_mix_list(sec_uid, cursor)
            })
            .await
            {
                Ok(page) => page,
                Err(e) => {
                    tracing::warn!(user = sec_uid, cursor, error = %e, "collection list fetch failed");
                    break;
                }
            };

            if page.mixes.is_empty() {
                break;
            }

            for mix in page.mixes {
                if limit > 0 && processed >= limit {
                    tracing::info!(user = sec_uid, limit, "collection limit reached");
                    return;
                }
                if self.cancel.is_cancelled() {
                    return;
                }
                tracing::info!(mix = %mix.mix_id, name = %mix.mix_name, "walking collection");
                self.download_mix(&mix.mix_id).await;
                processed += 1;
            }

            if !page.has_more {
                break;
            }
            cursor = page.cursor;
        }

        tracing::info!(user = sec_uid, collections = processed, "user collections finished");
    }
}
