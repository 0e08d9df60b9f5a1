//! Per-item media and sidecar persistence
//!
//! Lays one item out on disk as
//! `<save_path>/<author>/<timestamp>_<desc>/` containing the primary media
//! (`<folder>.mp4` or `image_N.jpg`), the optional audio track and cover,
//! and a JSON sidecar with the full fetched metadata. The folder name is
//! deterministic for a given item, which is what makes re-running an
//! acquisition idempotent together with the transfer engine's
//! skip-if-present behavior.

use super::DouyinDownloader;
use crate::error::{Error, Result, TransferError};
use crate::media;
use crate::transfer;
use crate::types::{Post, PostAssets};
use crate::utils::{item_folder_name, sanitize_component};
use std::time::Duration;

/// Pause between image fetches within one post; the CDN throttles bursts
const IMAGE_PAUSE: Duration = Duration::from_millis(300);

impl DouyinDownloader {
    /// Download every asset of one item and write its metadata sidecar.
    ///
    /// The primary media (video or image set) decides success. The audio
    /// track and cover are best-effort: their failures are logged but never
    /// fail the item. Sidecar write failures do fail the item — losing the
    /// metadata silently would defeat the point of keeping it.
    pub(crate) async fn persist_item(&self, post: &Post) -> Result<()> {
        let author = sanitize_component(post.author_name.as_deref().unwrap_or("unknown"));
        let folder = item_folder_name(post.create_time, &post.id, &post.desc);
        let dir = self.config.download.save_path.join(&author).join(&folder);
        tokio::fs::create_dir_all(&dir).await?;

        let client = self.api.http();
        let headers = self.api.transfer_headers();
        let mut core_failure: Option<Error> = None;

        match &post.assets {
            PostAssets::Images(images) => {
                let total = images.len();
                for (index, candidates) in images.iter().enumerate() {
                    if self.cancel.is_cancelled() {
                        return Err(Error::Cancelled);
                    }
                    let dest = dir.join(format!("image_{}.jpg", index + 1));
                    let Some(target) = media::image_target(candidates, dest) else {
                        tracing::warn!(item = %post.id, image = index + 1, "image has no source URL");
                        continue;
                    };
                    match transfer::download(client, &headers, &target, &self.cancel).await {
                        Ok(()) => {
                            tracing::info!(item = %post.id, image = index + 1, total, "image saved");
                        }
                        Err(Error::Cancelled) => return Err(Error::Cancelled),
                        Err(e) => {
                            tracing::error!(item = %post.id, image = index + 1, error = %e, "image failed");
                            core_failure.get_or_insert(e);
                        }
                    }
                    if index + 1 < total {
                        tokio::time::sleep(IMAGE_PAUSE).await;
                    }
                }
            }
            PostAssets::Video(sources) => {
                match media::video_target(sources, dir.join(format!("{folder}.mp4"))) {
                    Some(target) => {
                        match transfer::download(client, &headers, &target, &self.cancel).await {
                            Ok(()) => tracing::info!(item = %post.id, "video saved"),
                            Err(Error::Cancelled) => return Err(Error::Cancelled),
                            Err(e) => {
                                tracing::error!(item = %post.id, error = %e, "video failed");
                                core_failure = Some(e);
                            }
                        }
                    }
                    None => {
                        core_failure = Some(Error::Transfer(TransferError::NoPlayableSource {
                            id: post.id.clone(),
                        }));
                    }
                }

                if self.config.download.music {
                    let dest = dir.join(format!("{folder}_music.mp3"));
                    if let Some(target) = media::audio_target(&post.music_urls, dest) {
                        self.best_effort_asset(&target, post, "audio track").await?;
                    }
                }
            }
        }

        if self.config.download.cover {
            let dest = dir.join(format!("{folder}_cover.jpg"));
            if let Some(target) = media::image_target(&post.cover_urls, dest) {
                self.best_effort_asset(&target, post, "cover").await?;
            }
        }

        if self.config.download.data_json {
            let sidecar = dir.join(format!("{folder}_data.json"));
            let bytes = serde_json::to_vec_pretty(&post.raw)?;
            tokio::fs::write(&sidecar, bytes).await?;
            tracing::debug!(item = %post.id, sidecar = %sidecar.display(), "metadata sidecar written");
        }

        match core_failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Download a side asset whose failure should not fail the item.
    ///
    /// Only cancellation propagates.
    async fn best_effort_asset(
        &self,
        target: &media::DownloadTarget,
        post: &Post,
        kind: &str,
    ) -> Result<()> {
        match transfer::download(self.api.http(), &self.api.transfer_headers(), target, &self.cancel)
            .await
        {
            Ok(()) => Ok(()),
            Err(Error::Cancelled) => Err(Error::Cancelled),
            Err(e) => {
                tracing::warn!(item = %post.id, kind, error = %e, "side asset failed");
                Ok(())
            }
        }
    }
}
