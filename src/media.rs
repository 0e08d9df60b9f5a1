//! Media URL resolution
//!
//! Given a fetched [`Post`](crate::types::Post), derives per-asset
//! [`DownloadTarget`]s: one chosen primary URL plus every other discovered
//! candidate as ordered fallbacks. The watermark/quality URL rewriting is a
//! best-effort heuristic against an undocumented CDN convention; it lives
//! only in this module so it can be replaced without touching callers, and
//! the un-rewritten URL always remains in the fallback list.

use crate::types::VideoSources;
use std::path::PathBuf;

/// Keywords marking a higher-quality variant, in priority order
const QUALITY_KEYWORDS: &[&str] = &["1080", "origin", "high"];

/// A concrete download: where to fetch from and where to land.
///
/// `dest` is deterministic for a given item and asset kind, which is what
/// makes re-running acquisition idempotent.
#[derive(Clone, Debug)]
pub struct DownloadTarget {
    /// Preferred source URL
    pub primary: String,
    /// Alternate sources for the same asset, tried in order after `primary`
    pub fallbacks: Vec<String>,
    /// Final destination path
    pub dest: PathBuf,
}

impl DownloadTarget {
    /// Candidate URLs in try-order: primary first, then fallbacks with
    /// exact duplicates of the primary removed.
    #[must_use]
    pub fn candidates(&self) -> Vec<&str> {
        let mut out = vec![self.primary.as_str()];
        for url in &self.fallbacks {
            if url != &self.primary && !out.contains(&url.as_str()) {
                out.push(url.as_str());
            }
        }
        out
    }
}

/// Bias a play URL toward an unwatermarked, higher-resolution variant.
///
/// Two textual substitutions observed to work against the platform's CDN;
/// unverified against current server behavior, so callers always keep the
/// original URL as a fallback.
fn prefer_unwatermarked(url: &str) -> String {
    url.replace("playwm", "play").replace("720p", "1080p")
}

/// Resolve the video asset of a post into a download target.
///
/// Prefers the first H264-tagged play address over the generic one,
/// rewrites it for quality, and carries the un-rewritten URL plus every
/// other play/download candidate as fallbacks (first-seen order, deduped).
/// Returns `None` when the post has no play or download address at all.
#[must_use]
pub fn video_target(sources: &VideoSources, dest: PathBuf) -> Option<DownloadTarget> {
    let preferred = sources
        .play_addr_h264
        .first()
        .or_else(|| sources.play_addr.first());

    let (primary, mut fallbacks) = match preferred {
        Some(original) => {
            let rewritten = prefer_unwatermarked(original);
            (rewritten, vec![original.clone()])
        }
        // no play address: fall back to the raw download address
        None => (sources.download_addr.first()?.clone(), Vec::new()),
    };

    for url in sources
        .play_addr_h264
        .iter()
        .chain(&sources.play_addr)
        .chain(&sources.download_addr)
    {
        if url != &primary && !fallbacks.contains(url) {
            fallbacks.push(url.clone());
        }
    }

    Some(DownloadTarget {
        primary,
        fallbacks,
        dest,
    })
}

/// Pick the best-quality URL from an ordered candidate list.
///
/// The first URL containing a quality keyword wins, keywords checked in
/// priority order; otherwise the first candidate.
#[must_use]
pub fn best_quality_url(candidates: &[String]) -> Option<&String> {
    for keyword in QUALITY_KEYWORDS {
        if let Some(url) = candidates.iter().find(|u| u.contains(keyword)) {
            return Some(url);
        }
    }
    candidates.first()
}

/// Resolve an image (or cover) candidate list into a download target.
///
/// Primary is the best-quality candidate; every other candidate is kept as
/// a fallback in original order.
#[must_use]
pub fn image_target(candidates: &[String], dest: PathBuf) -> Option<DownloadTarget> {
    let primary = best_quality_url(candidates)?.clone();
    let fallbacks = candidates
        .iter()
        .filter(|u| **u != primary)
        .cloned()
        .collect();
    Some(DownloadTarget {
        primary,
        fallbacks,
        dest,
    })
}

/// Resolve an audio-track candidate list into a download target.
///
/// The platform serves one canonical track URL; the first candidate is the
/// primary and the rest are fallbacks.
#[must_use]
pub fn audio_target(candidates: &[String], dest: PathBuf) -> Option<DownloadTarget> {
    let primary = candidates.first()?.clone();
    Some(DownloadTarget {
        primary,
        fallbacks: candidates[1..].to_vec(),
        dest,
    })
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn urls(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn video_prefers_h264_and_rewrites_for_quality() {
        let sources = VideoSources {
            play_addr: urls(&["https://v.example.com/playwm/generic_720p"]),
            play_addr_h264: urls(&["https://v.example.com/playwm/h264_720p"]),
            download_addr: urls(&["https://v.example.com/dl/raw"]),
        };
        let target = video_target(&sources, PathBuf::from("out.mp4")).unwrap();

        assert_eq!(target.primary, "https://v.example.com/play/h264_1080p");
        // the untouched original comes first among fallbacks
        assert_eq!(target.fallbacks[0], "https://v.example.com/playwm/h264_720p");
        // raw download address is always carried
        assert!(
            target
                .fallbacks
                .contains(&"https://v.example.com/dl/raw".to_string())
        );
        assert!(
            target
                .fallbacks
                .contains(&"https://v.example.com/playwm/generic_720p".to_string())
        );
    }

    #[test]
    fn video_without_h264_uses_generic_play_addr() {
        let sources = VideoSources {
            play_addr: urls(&["https://v.example.com/playwm/only"]),
            play_addr_h264: vec![],
            download_addr: vec![],
        };
        let target = video_target(&sources, PathBuf::from("out.mp4")).unwrap();
        assert_eq!(target.primary, "https://v.example.com/play/only");
        assert_eq!(target.fallbacks, urls(&["https://v.example.com/playwm/only"]));
    }

    #[test]
    fn video_with_only_download_addr_still_resolves() {
        let sources = VideoSources {
            play_addr: vec![],
            play_addr_h264: vec![],
            download_addr: urls(&["https://v.example.com/dl/raw"]),
        };
        let target = video_target(&sources, PathBuf::from("out.mp4")).unwrap();
        assert_eq!(target.primary, "https://v.example.com/dl/raw");
        assert!(target.fallbacks.is_empty());
    }

    #[test]
    fn video_with_no_sources_resolves_to_none() {
        assert!(video_target(&VideoSources::default(), PathBuf::from("out.mp4")).is_none());
    }

    #[test]
    fn fallbacks_are_deduplicated_in_first_seen_order() {
        let sources = VideoSources {
            play_addr: urls(&["https://a/playwm/x", "https://b/1"]),
            play_addr_h264: urls(&["https://a/playwm/x"]),
            download_addr: urls(&["https://b/1", "https://c/2"]),
        };
        let target = video_target(&sources, PathBuf::from("out.mp4")).unwrap();
        assert_eq!(
            target.fallbacks,
            urls(&["https://a/playwm/x", "https://b/1", "https://c/2"])
        );
    }

    #[test]
    fn quality_keywords_take_precedence_in_order() {
        let candidates = urls(&[
            "https://p.example.com/low.jpg",
            "https://p.example.com/high.jpg",
            "https://p.example.com/1080.jpg",
        ]);
        assert_eq!(
            best_quality_url(&candidates).unwrap(),
            "https://p.example.com/1080.jpg"
        );

        let no_keywords = urls(&["https://p.example.com/a.jpg", "https://p.example.com/b.jpg"]);
        assert_eq!(
            best_quality_url(&no_keywords).unwrap(),
            "https://p.example.com/a.jpg"
        );

        assert!(best_quality_url(&[]).is_none());
    }

    #[test]
    fn image_target_keeps_unchosen_candidates_as_fallbacks() {
        let candidates = urls(&[
            "https://p.example.com/a.jpg",
            "https://p.example.com/a-origin.jpg",
        ]);
        let target = image_target(&candidates, PathBuf::from("image_1.jpg")).unwrap();
        assert_eq!(target.primary, "https://p.example.com/a-origin.jpg");
        assert_eq!(target.fallbacks, urls(&["https://p.example.com/a.jpg"]));
    }

    #[test]
    fn audio_target_takes_the_first_candidate() {
        let target = audio_target(
            &urls(&["https://m.example.com/1.mp3", "https://m.example.com/2.mp3"]),
            PathBuf::from("track.mp3"),
        )
        .unwrap();
        assert_eq!(target.primary, "https://m.example.com/1.mp3");
        assert_eq!(target.fallbacks, urls(&["https://m.example.com/2.mp3"]));
        assert!(audio_target(&[], PathBuf::from("track.mp3")).is_none());
    }

    #[test]
    fn candidates_exclude_exact_primary_duplicates() {
        let target = DownloadTarget {
            primary: "https://a/1".to_string(),
            fallbacks: urls(&["https://a/1", "https://b/2", "https://b/2"]),
            dest: PathBuf::from("x"),
        };
        assert_eq!(target.candidates(), vec!["https://a/1", "https://b/2"]);
    }
}
