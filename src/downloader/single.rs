//! Single video / image-post acquisition

use super::DouyinDownloader;
use crate::error::{Error, Result};
use crate::types::ContentReference;

impl DouyinDownloader {
    /// Acquire one post given its classified link.
    ///
    /// Fetch failure and persistence failure both land in the failed
    /// bucket; only cancellation leaves the item uncounted.
    pub(crate) async fn download_single(&self, reference: &ContentReference) {
        match self.fetch_and_persist(reference).await {
            Ok(()) => {
                self.stats.record_success();
                tracing::info!(url = %reference.raw_url, "item acquired");
            }
            Err(Error::Cancelled) => {
                tracing::info!(url = %reference.raw_url, "acquisition cancelled");
            }
            Err(e) => {
                self.stats.record_failure();
                tracing::error!(url = %reference.raw_url, error = %e, "item failed");
            }
        }
    }

    async fn fetch_and_persist(&self, reference: &ContentReference) -> Result<()> {
        let post = self.api.fetch_detail(&self.config.retry, &reference.id).await?;
        tracing::info!(item = %post.id, url = %post.web_url(), "fetched item metadata");
        self.persist_item(&post).await
    }
}
