//! Per-scope page sources
//!
//! The four listing feeds (user posts, user likes, collection items, music
//! items) share one pagination shape and differ only in endpoint, cursor key
//! and dedup namespace. [`PageSource`] captures that difference so the
//! [`walker`](crate::walker) can drive all of them with a single loop.

use crate::api::ApiClient;
use crate::error::Result;
use crate::types::{Page, Scope};
use async_trait::async_trait;
use std::sync::Arc;

/// A fetch-page capability for one remote collection.
///
/// `scope` and `owner_id` together name the dedup namespace items of this
/// source are recorded under.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Dedup namespace of this collection
    fn scope(&self) -> Scope;

    /// Owning entity: sec_uid for post/like, mix ID for mix, music ID for music
    fn owner_id(&self) -> &str;

    /// Fetch the page at `cursor`
    async fn fetch_page(&self, cursor: u64) -> Result<Page>;
}

/// A user's published-post feed
pub struct UserPostSource {
    client: Arc<ApiClient>,
    sec_uid: String,
}

impl UserPostSource {
    /// Source over the posts published by `sec_uid`
    pub fn new(client: Arc<ApiClient>, sec_uid: impl Into<String>) -> Self {
        Self {
            client,
            sec_uid: sec_uid.into(),
        }
    }
}

#[async_trait]
impl PageSource for UserPostSource {
    fn scope(&self) -> Scope {
        Scope::Post
    }

    fn owner_id(&self) -> &str {
        &self.sec_uid
    }

    async fn fetch_page(&self, cursor: u64) -> Result<Page> {
        self.client.user_posts(&self.sec_uid, cursor).await
    }
}

/// A user's like feed
pub struct UserLikeSource {
    client: Arc<ApiClient>,
    sec_uid: String,
}

impl UserLikeSource {
    /// Source over the posts liked by `sec_uid`
    pub fn new(client: Arc<ApiClient>, sec_uid: impl Into<String>) -> Self {
        Self {
            client,
            sec_uid: sec_uid.into(),
        }
    }
}

#[async_trait]
impl PageSource for UserLikeSource {
    fn scope(&self) -> Scope {
        Scope::Like
    }

    fn owner_id(&self) -> &str {
        &self.sec_uid
    }

    async fn fetch_page(&self, cursor: u64) -> Result<Page> {
        self.client.user_likes(&self.sec_uid, cursor).await
    }
}

/// A collection's item feed
pub struct MixSource {
    client: Arc<ApiClient>,
    mix_id: String,
}

impl MixSource {
    /// Source over the items of collection `mix_id`
    pub fn new(client: Arc<ApiClient>, mix_id: impl Into<String>) -> Self {
        Self {
            client,
            mix_id: mix_id.into(),
        }
    }
}

#[async_trait]
impl PageSource for MixSource {
    fn scope(&self) -> Scope {
        Scope::Mix
    }

    fn owner_id(&self) -> &str {
        &self.mix_id
    }

    async fn fetch_page(&self, cursor: u64) -> Result<Page> {
        self.client.mix_items(&self.mix_id, cursor).await
    }
}

/// A music track's item feed
pub struct MusicSource {
    client: Arc<ApiClient>,
    music_id: String,
}

impl MusicSource {
    /// Source over the posts using music track `music_id`
    pub fn new(client: Arc<ApiClient>, music_id: impl Into<String>) -> Self {
        Self {
            client,
            music_id: music_id.into(),
        }
    }
}

#[async_trait]
impl PageSource for MusicSource {
    fn scope(&self) -> Scope {
        Scope::Music
    }

    fn owner_id(&self) -> &str {
        &self.music_id
    }

    async fn fetch_page(&self, cursor: u64) -> Result<Page> {
        self.client.music_items(&self.music_id, cursor).await
    }
}
