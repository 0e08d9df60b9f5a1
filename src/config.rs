//! Configuration types for douyin-dl
//!
//! Loading these from disk (YAML/TOML/JSON) and merging CLI arguments is the
//! embedding application's job; the structs here are the contract. Every
//! field has a serde default so a partial document deserializes cleanly.

use crate::types::Scope;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

/// Output behavior configuration (save root, optional side assets)
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Root directory downloads are saved under (default: "./Downloaded")
    #[serde(default = "default_save_path")]
    pub save_path: PathBuf,

    /// Also download the post's audio track (default: true)
    #[serde(default = "default_true")]
    pub music: bool,

    /// Also download the post's cover image (default: true)
    #[serde(default = "default_true")]
    pub cover: bool,

    /// Write the full fetched metadata as a JSON sidecar (default: true)
    #[serde(default = "default_true")]
    pub data_json: bool,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            save_path: default_save_path(),
            music: true,
            cover: true,
            data_json: true,
        }
    }
}

/// Which collections to walk when an input link is a user profile
///
/// `music` is not a user-page collection and is ignored here if configured.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScopesConfig {
    /// Collections walked for a user link (default: `[post]`)
    #[serde(default = "default_user_scopes")]
    pub user: Vec<Scope>,
}

impl Default for ScopesConfig {
    fn default() -> Self {
        Self {
            user: default_user_scopes(),
        }
    }
}

/// Per-scope item count limits (0 = unlimited)
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum posts downloaded from a user's post feed
    #[serde(default)]
    pub post: usize,
    /// Maximum posts downloaded from a user's like feed
    #[serde(default)]
    pub like: usize,
    /// Maximum collections processed from a user's mix list
    #[serde(default, alias = "allmix")]
    pub mix: usize,
    /// Maximum posts downloaded from a music feed
    #[serde(default)]
    pub music: usize,
}

impl LimitsConfig {
    /// Limit for one scope (0 = unlimited)
    pub fn for_scope(&self, scope: Scope) -> usize {
        match scope {
            Scope::Post => self.post,
            Scope::Like => self.like,
            Scope::Mix => self.mix,
            Scope::Music => self.music,
        }
    }
}

/// Per-scope incremental-download switches.
///
/// When a scope's flag is on, items already recorded in the dedup store are
/// skipped and newly downloaded items are recorded. When off, the store is
/// never consulted for that scope.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct IncrementConfig {
    /// Incremental mode for user post feeds
    #[serde(default)]
    pub post: bool,
    /// Incremental mode for user like feeds
    #[serde(default)]
    pub like: bool,
    /// Incremental mode for collections
    #[serde(default)]
    pub mix: bool,
    /// Incremental mode for music feeds
    #[serde(default)]
    pub music: bool,
}

impl IncrementConfig {
    /// Whether incremental mode is on for one scope
    pub fn for_scope(&self, scope: Scope) -> bool {
        match scope {
            Scope::Post => self.post,
            Scope::Like => self.like,
            Scope::Mix => self.mix,
            Scope::Music => self.music,
        }
    }
}

/// Optional create-time window applied while walking collections.
///
/// Bounds are calendar dates; both are inclusive. An item with no
/// derivable create-time always passes.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct TimeFilterConfig {
    /// Earliest accepted date (e.g. "2023-01-01")
    #[serde(default)]
    pub start: Option<NaiveDate>,
    /// Latest accepted date, inclusive of the whole day
    #[serde(default)]
    pub end: Option<NaiveDate>,
}

impl TimeFilterConfig {
    /// Whether an item with the given create-time passes the window
    pub fn passes(&self, create_time: Option<NaiveDateTime>) -> bool {
        let Some(created) = create_time else {
            return true;
        };
        if let Some(start) = self.start {
            if created < start.and_hms_opt(0, 0, 0).unwrap_or_default() {
                return false;
            }
        }
        if let Some(end) = self.end {
            // inclusive of the entire end day
            let bound = end
                .succ_opt()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .unwrap_or(NaiveDateTime::MAX);
            if created >= bound {
                return false;
            }
        }
        true
    }
}

/// Request spacing configuration
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct RateConfig {
    /// Maximum API/listing requests per second (default: 2.0)
    #[serde(default = "default_max_per_second")]
    pub max_per_second: f64,
}

impl Default for RateConfig {
    fn default() -> Self {
        Self {
            max_per_second: default_max_per_second(),
        }
    }
}

/// Retry behavior for transient failures
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per operation, including the first (default: 3)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Escalating delay schedule between attempts; the last entry repeats
    /// if there are more retries than entries (default: 1s, 2s, 5s)
    #[serde(default = "default_retry_delays")]
    pub delays: Vec<Duration>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            delays: default_retry_delays(),
        }
    }
}

/// Outgoing request context: credentials, identity headers, endpoints
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RequestConfig {
    /// Opaque Cookie header value supplied by the embedder (browser login
    /// or manual entry); the library never obtains credentials itself
    #[serde(default)]
    pub cookie: Option<String>,

    /// User-Agent header sent on every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Referer header sent on API requests (stripped for media transfers)
    #[serde(default = "default_referer")]
    pub referer: String,

    /// Per-request transport timeout (default: 10s)
    #[serde(default = "default_timeout")]
    pub timeout: Duration,

    /// Base URL of the web API (override for testing)
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Base URL of the unsigned item-info fallback API
    #[serde(default = "default_fallback_api_base")]
    pub fallback_api_base: String,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            cookie: None,
            user_agent: default_user_agent(),
            referer: default_referer(),
            timeout: default_timeout(),
            api_base: default_api_base(),
            fallback_api_base: default_fallback_api_base(),
        }
    }
}

/// Dedup store configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Whether the SQLite dedup store is opened at all (default: true).
    /// With no store, increment flags have no effect.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Path of the SQLite file (default: "./douyin-dl.db")
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_db_path(),
        }
    }
}

/// Main configuration for [`DouyinDownloader`](crate::DouyinDownloader)
///
/// Fields are organized into logical sub-configs:
/// - [`download`](DownloadConfig) — save root, side-asset switches
/// - [`scopes`](ScopesConfig) — collections walked for user links
/// - [`limits`](LimitsConfig) / [`increment`](IncrementConfig) — per-scope caps and incremental mode
/// - [`time_filter`](TimeFilterConfig) — create-time window
/// - [`rate`](RateConfig) / [`retry`](RetryConfig) — request pacing and retry schedule
/// - [`request`](RequestConfig) — cookie, identity headers, endpoints
/// - [`database`](DatabaseConfig) — dedup store location
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Output behavior
    #[serde(default)]
    pub download: DownloadConfig,
    /// User-link collection selection
    #[serde(default)]
    pub scopes: ScopesConfig,
    /// Per-scope count limits
    #[serde(default)]
    pub limits: LimitsConfig,
    /// Per-scope incremental switches
    #[serde(default)]
    pub increment: IncrementConfig,
    /// Create-time window
    #[serde(default)]
    pub time_filter: TimeFilterConfig,
    /// Request spacing
    #[serde(default)]
    pub rate: RateConfig,
    /// Retry schedule
    #[serde(default)]
    pub retry: RetryConfig,
    /// Request context
    #[serde(default)]
    pub request: RequestConfig,
    /// Dedup store
    #[serde(default)]
    pub database: DatabaseConfig,
}

impl Config {
    /// Validate cross-field constraints that serde defaults cannot express
    pub fn validate(&self) -> crate::Result<()> {
        if !self.rate.max_per_second.is_finite() || self.rate.max_per_second <= 0.0 {
            return Err(crate::Error::Config {
                message: "max_per_second must be a positive number".to_string(),
                key: Some("rate.max_per_second".to_string()),
            });
        }
        if self.retry.delays.is_empty() {
            return Err(crate::Error::Config {
                message: "retry delay schedule must not be empty".to_string(),
                key: Some("retry.delays".to_string()),
            });
        }
        if let (Some(start), Some(end)) = (self.time_filter.start, self.time_filter.end) {
            if end < start {
                return Err(crate::Error::Config {
                    message: "time filter end precedes start".to_string(),
                    key: Some("time_filter".to_string()),
                });
            }
        }
        Ok(())
    }
}

fn default_save_path() -> PathBuf {
    PathBuf::from("./Downloaded")
}

fn default_true() -> bool {
    true
}

fn default_user_scopes() -> Vec<Scope> {
    vec![Scope::Post]
}

fn default_max_per_second() -> f64 {
    2.0
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delays() -> Vec<Duration> {
    vec![
        Duration::from_secs(1),
        Duration::from_secs(2),
        Duration::from_secs(5),
    ]
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/120.0.0.0 Safari/537.36"
        .to_string()
}

fn default_referer() -> String {
    "https://www.douyin.com/".to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_api_base() -> String {
    "https://www.douyin.com".to_string()
}

fn default_fallback_api_base() -> String {
    "https://www.iesdouyin.com".to_string()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./douyin-dl.db")
}
