//! Input-link classification and resolution
//!
//! Turns a user-supplied link of any shape (full post URL, user profile,
//! collection, music page, `v.douyin.com` short link) into a
//! [`ContentReference`]: the resolved URL, its content kind, and the
//! canonical platform ID extracted from it.

use crate::config::RetryConfig;
use crate::error::{Error, Result};
use crate::retry::execute_with_retry;
use crate::types::{ContentReference, ContentType};
use regex::Regex;
use std::sync::OnceLock;

/// Hosts serving shortened share links
const SHORT_LINK_HOST: &str = "v.douyin.com";
/// Host serving live streams
const LIVE_HOST: &str = "live.douyin.com";

fn user_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| compile(&[r"/user/([\w.-]+)", r"sec_uid=([\w.-]+)"]))
}

fn item_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        compile(&[
            r"/video/(\d+)",
            r"/note/(\d+)",
            r"modal_id=(\d+)",
            r"aweme_id=(\d+)",
            r"item_id=(\d+)",
        ])
    })
}

fn collection_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| compile(&[r"/collection/(\d+)", r"/mix/detail/(\d+)", r"/music/(\d+)"]))
}

fn bare_digits_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        #[allow(clippy::expect_used)]
        Regex::new(r"(\d{15,20})").expect("static pattern")
    })
}

#[allow(clippy::expect_used)]
fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("static pattern"))
        .collect()
}

/// Whether a link is a shortened share link that needs resolving
#[must_use]
pub fn is_short_link(link: &str) -> bool {
    match url::Url::parse(link) {
        Ok(parsed) => parsed.host_str() == Some(SHORT_LINK_HOST),
        Err(_) => link.contains(SHORT_LINK_HOST),
    }
}

/// Resolve a shortened share link by following its redirect chain.
///
/// Issues one redirect-following GET (wrapped in the retry executor) and
/// returns the final URL. Non-short links pass through untouched, and any
/// failure degrades to returning the input unchanged — classification then
/// proceeds on whatever we have.
pub async fn resolve_short_url(
    client: &reqwest::Client,
    retry: &RetryConfig,
    link: &str,
) -> String {
    if !is_short_link(link) {
        return link.to_string();
    }

    let resolved = execute_with_retry(retry, || async {
        let response = client.get(link).send().await.map_err(Error::from)?;
        Ok::<_, Error>(response.url().to_string())
    })
    .await;

    match resolved {
        Ok(final_url) => {
            tracing::info!(short = link, resolved = %final_url, "resolved short link");
            final_url
        }
        Err(e) => {
            tracing::warn!(short = link, error = %e, "short link resolution failed, using as-is");
            link.to_string()
        }
    }
}

/// Detect the content kind of a (resolved) link.
///
/// Pure pattern match over path segments and hosts. Precedence matters:
/// user-profile patterns are checked before item patterns because a profile
/// URL can contain item-ID look-alike digit runs. Unrecognized links
/// default to Video, matching how unresolved short links behave.
#[must_use]
pub fn detect_content_type(link: &str) -> ContentType {
    if link.contains("/user/") || link.contains("/share/user/") {
        ContentType::User
    } else if link.contains("/video/") {
        ContentType::Video
    } else if link.contains("/note/") {
        ContentType::Image
    } else if link.contains("/collection/") || link.contains("/mix/") {
        ContentType::Mix
    } else if link.contains("/music/") {
        ContentType::Music
    } else if link.contains(LIVE_HOST) {
        ContentType::Live
    } else {
        ContentType::Video
    }
}

/// Extract the canonical platform ID from a link.
///
/// When `hint` says the link is a user profile, user-ID patterns are tried
/// first. Otherwise item-ID patterns take priority, then collection/music
/// patterns, then a bare 15–20 digit run as a last resort. No match is a
/// terminal [`Error::Classification`] for this link.
pub fn extract_id(link: &str, hint: Option<ContentType>) -> Result<String> {
    if hint == Some(ContentType::User) || link.contains("/user/") {
        for pattern in user_patterns() {
            if let Some(cap) = pattern.captures(link).and_then(|c| c.get(1)) {
                tracing::debug!(id = cap.as_str(), "extracted user ID");
                return Ok(cap.as_str().to_string());
            }
        }
    }

    for pattern in item_patterns().iter().chain(collection_patterns()) {
        if let Some(cap) = pattern.captures(link).and_then(|c| c.get(1)) {
            return Ok(cap.as_str().to_string());
        }
    }

    if let Some(cap) = bare_digits_pattern().captures(link).and_then(|c| c.get(1)) {
        tracing::debug!(id = cap.as_str(), "extracted bare numeric ID");
        return Ok(cap.as_str().to_string());
    }

    Err(Error::Classification {
        url: link.to_string(),
    })
}

/// Resolve, classify and extract in one step.
///
/// The content type is detected on the *resolved* URL — a short link may
/// turn out to point at a user profile rather than a single post.
pub async fn classify(
    client: &reqwest::Client,
    retry: &RetryConfig,
    link: &str,
) -> Result<ContentReference> {
    let resolved_url = resolve_short_url(client, retry, link).await;
    let content_type = detect_content_type(&resolved_url);
    let id = match content_type {
        // live links are reported as unsupported downstream; no ID required
        ContentType::Live => extract_id(&resolved_url, Some(content_type)).unwrap_or_default(),
        _ => extract_id(&resolved_url, Some(content_type))?,
    };
    Ok(ContentReference {
        raw_url: link.to_string(),
        resolved_url,
        content_type,
        id,
    })
}
