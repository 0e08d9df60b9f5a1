//! Collection and music-feed walks

use super::DouyinDownloader;
use crate::api::scopes::{MixSource, MusicSource};
use crate::error::Result;
use crate::types::{Post, Scope};
use crate::walker::walk;

impl DouyinDownloader {
    /// Walk every item of one collection
    pub(crate) async fn download_mix(&self, mix_id: &str) {
        let source = MixSource::new(self.api.clone(), mix_id);
        // the configured mix limit caps collections, not items within one
        walk(self.walk_ctx(Scope::Mix, 0), &source, |post| {
            self.handle_walked_item(post)
        })
        .await;
    }

    /// Walk the posts published under one music track
    pub(crate) async fn download_music(&self, music_id: &str) {
        let source = MusicSource::new(self.api.clone(), music_id);
        walk(
            self.walk_ctx(Scope::Music, self.config.limits.music),
            &source,
            |post| self.handle_walked_item(post),
        )
        .await;
    }

    /// Item handler shared by every walk
    pub(crate) async fn handle_walked_item(&self, post: Post) -> Result<()> {
        tracing::info!(item = %post.id, url = %post.web_url(), "acquiring item");
        self.persist_item(&post).await
    }
}
