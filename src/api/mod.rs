//! Remote API client
//!
//! One [`ApiClient`] per run owns the HTTP client, the explicit request
//! headers (cookie, identity) and the signing seam. Every request goes
//! through the shared rate limiter before it is issued.
//!
//! ## Submodules
//!
//! - [`params`] — query-string construction per endpoint
//! - [`scopes`] — [`PageSource`](scopes::PageSource) implementations for the
//!   post / like / mix / music feeds
//!
//! Endpoint base URLs come from [`RequestConfig`] so tests can point the
//! client at a mock server.

use crate::config::RequestConfig;
use crate::error::{Error, Result};
use crate::rate_limit::RateLimiter;
use crate::retry::execute_with_retry;
use crate::signing::QuerySigner;
use crate::types::{Page, Post};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, COOKIE, REFERER, USER_AGENT};
use serde_json::Value;
use std::sync::Arc;

pub(crate) mod params;
pub mod scopes;

/// Single-item detail endpoint (signed)
const DETAIL_ENDPOINT: &str = "/aweme/v1/web/aweme/detail/";
/// User published-post feed (signed)
const USER_POST_ENDPOINT: &str = "/aweme/v1/web/aweme/post/";
/// User like feed (signed)
const USER_FAVORITE_ENDPOINT: &str = "/aweme/v1/web/aweme/favorite/";
/// User collection list (signed)
const MIX_LIST_ENDPOINT: &str = "/aweme/v1/web/mix/listcollection/";
/// Collection item feed (signed)
const MIX_AWEME_ENDPOINT: &str = "/aweme/v1/web/mix/aweme/";
/// Music track item feed (signed)
const MUSIC_AWEME_ENDPOINT: &str = "/aweme/v1/web/music/aweme/";
/// Unsigned single-item fallback on the share domain
const ITEM_INFO_ENDPOINT: &str = "/web/api/v2/aweme/iteminfo/";

/// One collection from a user's mix list
#[derive(Clone, Debug)]
pub struct MixInfo {
    /// Platform collection ID
    pub mix_id: String,
    /// Collection display name
    pub mix_name: String,
}

/// One page of a user's mix list
#[derive(Clone, Debug, Default)]
pub struct MixListPage {
    /// Collections in server order
    pub mixes: Vec<MixInfo>,
    /// Continuation token for the next page
    pub cursor: u64,
    /// Whether the server reports more pages
    pub has_more: bool,
}

/// HTTP client for the platform's web API.
///
/// Owns the explicit header set (no ambient global header state), the
/// optional query signer, and the shared rate limiter; every request
/// acquires a permit before going out.
pub struct ApiClient {
    client: reqwest::Client,
    limiter: Arc<RateLimiter>,
    signer: Option<Arc<dyn QuerySigner>>,
    api_headers: HeaderMap,
    api_base: String,
    fallback_api_base: String,
}

impl ApiClient {
    /// Build a client from the request configuration.
    ///
    /// `signer` is the external signing function; `None` issues every
    /// request unsigned.
    pub fn new(
        config: &RequestConfig,
        limiter: Arc<RateLimiter>,
        signer: Option<Arc<dyn QuerySigner>>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            client,
            limiter,
            signer,
            api_headers: build_headers(config),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            fallback_api_base: config.fallback_api_base.trim_end_matches('/').to_string(),
        })
    }

    /// The underlying transport client, shared with the transfer engine and
    /// short-link resolution
    #[must_use]
    pub fn http(&self) -> &reqwest::Client {
        &self.client
    }

    /// Header set for media transfers: the API headers without `Referer`
    /// (some origin servers reject cross-referer asset fetches)
    #[must_use]
    pub fn transfer_headers(&self) -> HeaderMap {
        let mut headers = self.api_headers.clone();
        headers.remove(REFERER);
        headers
    }

    /// Assemble the full request URL, appending the signature token.
    ///
    /// A signing failure degrades to issuing the request unsigned; some
    /// endpoints still answer.
    fn build_url(&self, endpoint: &str, query: &str) -> String {
        let unsigned = format!("{}{}?{}", self.api_base, endpoint, query);
        match &self.signer {
            Some(signer) => match signer.sign(query) {
                Ok(token) => format!("{unsigned}&X-Bogus={token}"),
                Err(e) => {
                    tracing::warn!(error = %e, "query signing failed, sending unsigned request");
                    unsigned
                }
            },
            None => unsigned,
        }
    }

    /// Issue one rate-limited GET and parse the JSON envelope.
    ///
    /// Non-200 statuses, empty bodies and malformed payloads surface as
    /// retryable [`Error::UnexpectedResponse`]; a well-formed body carrying
    /// a non-zero `status_code` is a non-retryable [`Error::Api`].
    async fn get_json(&self, url: &str) -> Result<Value> {
        self.limiter.acquire().await;

        let response = self
            .client
            .get(url)
            .headers(self.api_headers.clone())
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::UnexpectedResponse {
                status: Some(status.as_u16()),
                message: "API request failed".to_string(),
            });
        }

        let text = response.text().await?;
        if text.is_empty() {
            return Err(Error::UnexpectedResponse {
                status: Some(status.as_u16()),
                message: "empty response body".to_string(),
            });
        }

        let value: Value = serde_json::from_str(&text).map_err(|e| Error::UnexpectedResponse {
            status: Some(status.as_u16()),
            message: format!("malformed JSON: {e}"),
        })?;

        if let Some(code) = value.get("status_code").and_then(Value::as_i64) {
            if code != 0 {
                return Err(Error::Api {
                    code,
                    message: value
                        .get("status_msg")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                });
            }
        }

        Ok(value)
    }

    /// Fetch one listing page for a signed endpoint
    async fn fetch_listing(&self, endpoint: &str, query: &str, cursor_key: &str) -> Result<Page> {
        let value = self.get_json(&self.build_url(endpoint, query)).await?;
        Ok(parse_page(&value, cursor_key))
    }

    /// One page of a user's published posts
    pub async fn user_posts(&self, sec_uid: &str, cursor: u64) -> Result<Page> {
        self.fetch_listing(USER_POST_ENDPOINT, &params::user_posts(sec_uid, cursor), "max_cursor")
            .await
    }

    /// One page of a user's liked posts
    pub async fn user_likes(&self, sec_uid: &str, cursor: u64) -> Result<Page> {
        self.fetch_listing(
            USER_FAVORITE_ENDPOINT,
            &params::user_likes(sec_uid, cursor),
            "max_cursor",
        )
        .await
    }

    /// One page of a collection's items
    pub async fn mix_items(&self, mix_id: &str, cursor: u64) -> Result<Page> {
        self.fetch_listing(MIX_AWEME_ENDPOINT, &params::mix_items(mix_id, cursor), "cursor")
            .await
    }

    /// One page of a music track's items
    pub async fn music_items(&self, music_id: &str, cursor: u64) -> Result<Page> {
        self.fetch_listing(MUSIC_AWEME_ENDPOINT, &params::music_items(music_id, cursor), "cursor")
            .await
    }

    /// One page of a user's collection list
    pub async fn user_mix_list(&self, sec_uid: &str, cursor: u64) -> Result<MixListPage> {
        let url = self.build_url(MIX_LIST_ENDPOINT, &params::user_mix_list(sec_uid, cursor));
        let value = self.get_json(&url).await?;

        let mixes = value
            .get("mix_infos")
            .and_then(Value::as_array)
            .map(|infos| {
                infos
                    .iter()
                    .filter_map(|info| {
                        let mix_id = match info.get("mix_id")? {
                            Value::String(s) if !s.is_empty() => s.clone(),
                            Value::Number(n) => n.to_string(),
                            _ => return None,
                        };
                        let mix_name = info
                            .get("mix_name")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string();
                        Some(MixInfo { mix_id, mix_name })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(MixListPage {
            mixes,
            cursor: parse_cursor(&value, "cursor"),
            has_more: parse_has_more(&value),
        })
    }

    /// Fetch a single item's metadata, retrying each endpoint on transient
    /// failures.
    ///
    /// Tries the signed web detail endpoint first; when it yields nothing
    /// (or fails outright) falls back to the unsigned item-info endpoint on
    /// the share domain.
    pub async fn fetch_detail(
        &self,
        retry: &crate::config::RetryConfig,
        item_id: &str,
    ) -> Result<Post> {
        match execute_with_retry(retry, || self.fetch_detail_web(item_id)).await {
            Ok(Some(post)) => return Ok(post),
            Ok(None) => {
                tracing::info!(item = item_id, "web detail returned no item, trying fallback endpoint");
            }
            Err(e) => {
                tracing::warn!(item = item_id, error = %e, "web detail fetch failed, trying fallback endpoint");
            }
        }
        execute_with_retry(retry, || self.fetch_item_info(item_id)).await
    }

    /// Signed web detail endpoint; `Ok(None)` when the response carries no item
    async fn fetch_detail_web(&self, item_id: &str) -> Result<Option<Post>> {
        let url = self.build_url(DETAIL_ENDPOINT, &params::detail(item_id));
        let value = self.get_json(&url).await?;
        Ok(value
            .get("aweme_detail")
            .filter(|detail| !detail.is_null())
            .cloned()
            .and_then(Post::from_json))
    }

    /// Unsigned item-info fallback on the share domain
    async fn fetch_item_info(&self, item_id: &str) -> Result<Post> {
        let url = format!(
            "{}{}?item_ids={}",
            self.fallback_api_base, ITEM_INFO_ENDPOINT, item_id
        );
        let value = self.get_json(&url).await?;
        value
            .get("item_list")
            .and_then(Value::as_array)
            .and_then(|items| items.first())
            .cloned()
            .and_then(Post::from_json)
            .ok_or_else(|| Error::UnexpectedResponse {
                status: None,
                message: format!("item-info response carried no item for {item_id}"),
            })
    }
}

/// Parse a listing payload into a [`Page`].
///
/// Entries without an item ID are dropped; `has_more` accepts the boolean
/// and numeric (0/1) forms the platform alternates between.
pub(crate) fn parse_page(value: &Value, cursor_key: &str) -> Page {
    let items: Vec<Post> = value
        .get("aweme_list")
        .and_then(Value::as_array)
        .map(|list| list.iter().cloned().filter_map(Post::from_json).collect())
        .unwrap_or_default();
    Page {
        items,
        cursor: parse_cursor(value, cursor_key),
        has_more: parse_has_more(value),
    }
}

fn parse_cursor(value: &Value, cursor_key: &str) -> u64 {
    value.get(cursor_key).and_then(Value::as_u64).unwrap_or(0)
}

fn parse_has_more(value: &Value) -> bool {
    match value.get("has_more") {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_i64().unwrap_or(0) != 0,
        _ => false,
    }
}

/// Build the API header set from the request configuration.
///
/// Header values that cannot be represented (e.g. a cookie with control
/// characters) are skipped with a warning rather than failing construction.
fn build_headers(config: &RequestConfig) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/plain, */*"));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("zh-CN,zh;q=0.9,en;q=0.8"));

    match HeaderValue::from_str(&config.user_agent) {
        Ok(v) => {
            headers.insert(USER_AGENT, v);
        }
        Err(e) => tracing::warn!(error = %e, "invalid user-agent header value, skipping"),
    }
    match HeaderValue::from_str(&config.referer) {
        Ok(v) => {
            headers.insert(REFERER, v);
        }
        Err(e) => tracing::warn!(error = %e, "invalid referer header value, skipping"),
    }
    if let Some(cookie) = &config.cookie {
        match HeaderValue::from_str(cookie) {
            Ok(v) => {
                headers.insert(COOKIE, v);
            }
            Err(e) => tracing::warn!(error = %e, "invalid cookie header value, skipping"),
        }
    }

    headers
}
