//! Core types for douyin-dl

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Textual create-time formats the platform has been observed to emit in
/// place of an epoch timestamp.
const CREATE_TIME_FORMATS: &[&str] = &["%Y-%m-%d %H.%M.%S", "%Y-%m-%d_%H-%M-%S", "%Y-%m-%d %H:%M:%S"];

/// A named remote collection type with its own pagination and dedup namespace
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// A user's published posts
    Post,
    /// A user's liked posts
    Like,
    /// A collection ("mix") of posts
    Mix,
    /// Posts using a given music track
    Music,
}

impl Scope {
    /// Stable string form used as the dedup namespace in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Post => "post",
            Scope::Like => "like",
            Scope::Mix => "mix",
            Scope::Music => "music",
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of content an input link points at
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    /// A single video post
    Video,
    /// A single image-set post
    Image,
    /// A user profile page
    User,
    /// A collection / mix
    Mix,
    /// A music track page
    Music,
    /// A live stream (not downloadable)
    Live,
}

/// A classified and resolved input link
///
/// Immutable once built: `resolved_url` is the final URL after short-link
/// expansion, `content_type` decides which flow the orchestrator runs, and
/// `id` is the canonical platform identifier extracted from the URL.
#[derive(Clone, Debug)]
pub struct ContentReference {
    /// The link exactly as supplied
    pub raw_url: String,
    /// The link after short-link resolution (equal to `raw_url` if not short)
    pub resolved_url: String,
    /// Detected content kind
    pub content_type: ContentType,
    /// Extracted canonical ID (sec_uid, aweme ID, mix ID or music ID)
    pub id: String,
}

/// Composite key identifying one item within one dedup namespace
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DedupKey<'a> {
    /// Collection namespace
    pub scope: Scope,
    /// Owning entity: sec_uid for post/like, mix ID for mix, music ID for music
    pub owner_id: &'a str,
    /// Platform item ID
    pub item_id: &'a str,
}

/// One page of a remote collection
///
/// Produced once per API call and consumed immediately by the walker.
#[derive(Clone, Debug, Default)]
pub struct Page {
    /// Items in server-provided order
    pub items: Vec<Post>,
    /// Continuation token for the next page
    pub cursor: u64,
    /// Whether the server reports more pages after this one
    pub has_more: bool,
}

/// Media source candidates for a video post
#[derive(Clone, Debug, Default)]
pub struct VideoSources {
    /// Generic play address candidates
    pub play_addr: Vec<String>,
    /// H264-tagged play address candidates (preferred)
    pub play_addr_h264: Vec<String>,
    /// Raw download address candidates (watermarked, last resort)
    pub download_addr: Vec<String>,
}

/// The media payload of a post: a video or an ordered image set.
///
/// Modeled as a tagged union so every consumer handles both kinds
/// exhaustively instead of probing optional fields.
#[derive(Clone, Debug)]
pub enum PostAssets {
    /// A single video with per-source candidate lists
    Video(VideoSources),
    /// An ordered image set; one candidate list per image
    Images(Vec<Vec<String>>),
}

/// A single remote post, immutable after fetch.
///
/// Parsed leniently from the platform's JSON: fields the download pipeline
/// needs are lifted out, and the untouched payload is kept in `raw` for the
/// metadata sidecar.
#[derive(Clone, Debug)]
pub struct Post {
    /// Platform-assigned item ID (numeric string)
    pub id: String,
    /// Author's stable sec_uid, when present
    pub sec_uid: Option<String>,
    /// Author's display name, when present
    pub author_name: Option<String>,
    /// Post description
    pub desc: String,
    /// Normalized creation time, when derivable
    pub create_time: Option<NaiveDateTime>,
    /// Video or image-set sources
    pub assets: PostAssets,
    /// Audio track URL candidates (may be empty)
    pub music_urls: Vec<String>,
    /// Cover image URL candidates (may be empty)
    pub cover_urls: Vec<String>,
    /// The full fetched metadata, as received
    pub raw: Value,
}

impl Post {
    /// Parse a post from one entry of an `aweme_list` / `aweme_detail` payload.
    ///
    /// Returns `None` when the entry has no item ID; other missing fields
    /// degrade to empty candidate lists rather than failing the item.
    pub fn from_json(raw: Value) -> Option<Self> {
        let id = extract_item_id(&raw)?;

        let author = raw.get("author");
        let sec_uid = author
            .and_then(|a| a.get("sec_uid"))
            .and_then(Value::as_str)
            .map(str::to_string);
        let author_name = author
            .and_then(|a| a.get("nickname"))
            .and_then(Value::as_str)
            .map(str::to_string);
        let desc = raw
            .get("desc")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let create_time = raw.get("create_time").and_then(parse_create_time);

        let images: Vec<Vec<String>> = raw
            .get("images")
            .and_then(Value::as_array)
            .map(|imgs| imgs.iter().map(url_list).collect())
            .unwrap_or_default();

        let video = raw.get("video");
        let assets = if images.is_empty() {
            PostAssets::Video(VideoSources {
                play_addr: video.map(|v| nested_url_list(v, "play_addr")).unwrap_or_default(),
                play_addr_h264: video
                    .map(|v| nested_url_list(v, "play_addr_h264"))
                    .unwrap_or_default(),
                download_addr: video
                    .map(|v| nested_url_list(v, "download_addr"))
                    .unwrap_or_default(),
            })
        } else {
            PostAssets::Images(images)
        };

        let music_urls = raw
            .get("music")
            .map(|m| nested_url_list(m, "play_url"))
            .unwrap_or_default();
        let cover_urls = video.map(|v| nested_url_list(v, "cover")).unwrap_or_default();

        Some(Post {
            id,
            sec_uid,
            author_name,
            desc,
            create_time,
            assets,
            music_urls,
            cover_urls,
            raw,
        })
    }

    /// Whether this post is an image set
    pub fn is_image_set(&self) -> bool {
        matches!(self.assets, PostAssets::Images(_))
    }

    /// Public web URL for this post
    pub fn web_url(&self) -> String {
        match self.assets {
            PostAssets::Images(_) => format!("https://www.douyin.com/note/{}", self.id),
            PostAssets::Video(_) => format!("https://www.douyin.com/video/{}", self.id),
        }
    }
}

/// Pull the item ID out of an aweme payload.
///
/// Accepts a top-level `aweme_id` (string or number) or the nested
/// `aweme.aweme_id` form some endpoints return.
fn extract_item_id(raw: &Value) -> Option<String> {
    let direct = raw.get("aweme_id");
    let nested = raw.get("aweme").and_then(|a| a.get("aweme_id"));
    match direct.or(nested)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Normalize a `create_time` value.
///
/// The platform usually sends epoch seconds but has been seen emitting
/// preformatted strings; both are accepted.
pub(crate) fn parse_create_time(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::Number(n) => {
            let secs = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?;
            chrono::DateTime::from_timestamp(secs, 0).map(|dt| dt.naive_utc())
        }
        Value::String(s) if !s.is_empty() => CREATE_TIME_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok()),
        _ => None,
    }
}

/// Extract the `url_list` string array from an address object
fn url_list(addr: &Value) -> Vec<String> {
    addr.get("url_list")
        .and_then(Value::as_array)
        .map(|urls| {
            urls.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Extract `parent.key.url_list`
fn nested_url_list(parent: &Value, key: &str) -> Vec<String> {
    parent.get(key).map(url_list).unwrap_or_default()
}
