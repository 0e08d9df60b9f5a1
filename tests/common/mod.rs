//! Shared fixtures for integration tests: API payload builders and a
//! config wired to a wiremock server.

#![allow(dead_code)]

use douyin_dl::Config;
use douyin_dl::config::RetryConfig;
use serde_json::{Value, json};
use std::path::Path;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Fixed author carried by every fixture post
pub const AUTHOR_NAME: &str = "fixture author";
/// Fixed sec_uid carried by every fixture post
pub const AUTHOR_SEC_UID: &str = "MS4wLjABAAAAfixture";
/// Epoch create-time used by fixtures: 2023-11-14 22:13:20 UTC
pub const CREATE_TIME: i64 = 1_700_000_000;
/// Folder timestamp matching [`CREATE_TIME`]
pub const CREATE_TIME_STAMP: &str = "2023-11-14_22-13-20";

/// A video post whose media URLs point back at the mock server.
///
/// The play address carries a `playwm` segment so the end-to-end flow
/// exercises the watermark rewrite; serve the rewritten path via
/// [`mount_item_media`].
pub fn video_post(server_uri: &str, id: &str, desc: &str) -> Value {
    json!({
        "aweme_id": id,
        "desc": desc,
        "create_time": CREATE_TIME,
        "author": {"nickname": AUTHOR_NAME, "sec_uid": AUTHOR_SEC_UID},
        "video": {
            "play_addr": {"url_list": [format!("{server_uri}/cdn/{id}/playwm/video.mp4")]},
            "download_addr": {"url_list": [format!("{server_uri}/cdn/{id}/download/video.mp4")]},
            "cover": {"url_list": [format!("{server_uri}/cdn/{id}/cover.jpg")]}
        },
        "music": {"play_url": {"url_list": [format!("{server_uri}/cdn/{id}/music.mp3")]}}
    })
}

/// An image-set post with two images, URLs pointing at the mock server
pub fn image_post(server_uri: &str, id: &str, desc: &str) -> Value {
    json!({
        "aweme_id": id,
        "desc": desc,
        "create_time": CREATE_TIME,
        "author": {"nickname": AUTHOR_NAME, "sec_uid": AUTHOR_SEC_UID},
        "images": [
            {"url_list": [format!("{server_uri}/cdn/{id}/img1-origin.jpg"), format!("{server_uri}/cdn/{id}/img1.jpg")]},
            {"url_list": [format!("{server_uri}/cdn/{id}/img2.jpg")]}
        ]
    })
}

/// Serve the image paths [`image_post`] references for one item
pub async fn mount_image_media(server: &MockServer, id: &str) {
    for (suffix, body) in [
        (format!("{id}/img1-origin.jpg"), b"first image".to_vec()),
        (format!("{id}/img2.jpg"), b"second image".to_vec()),
    ] {
        Mock::given(method("GET"))
            .and(path(format!("/cdn/{suffix}")))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
            .mount(server)
            .await;
    }
}

/// Serve the media paths [`video_post`] references for one item
pub async fn mount_item_media(server: &MockServer, id: &str) {
    for (suffix, body) in [
        (format!("{id}/play/video.mp4"), b"video bytes".to_vec()),
        (format!("{id}/music.mp3"), b"music bytes".to_vec()),
        (format!("{id}/cover.jpg"), b"cover bytes".to_vec()),
    ] {
        Mock::given(method("GET"))
            .and(path(format!("/cdn/{suffix}")))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
            .mount(server)
            .await;
    }
}

/// Respond with a JSON payload on one path
pub async fn mount_json(server: &MockServer, at: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Config pointed at the mock server: fast retries, no pacing delays.
///
/// Passing no database path disables the dedup store.
pub fn test_config(server: &MockServer, save_path: &Path, db_path: Option<&Path>) -> Config {
    let mut config = Config::default();
    config.download.save_path = save_path.to_path_buf();
    config.request.api_base = server.uri();
    config.request.fallback_api_base = server.uri();
    config.rate.max_per_second = 1000.0;
    config.retry = RetryConfig {
        max_retries: 2,
        delays: vec![Duration::from_millis(10)],
    };
    match db_path {
        Some(path) => config.database.path = path.to_path_buf(),
        None => config.database.enabled = false,
    }
    config
}

/// The on-disk folder for a fixture item: `<save>/<author>/<stamp>_<desc>`
pub fn item_dir(save_path: &Path, desc: &str) -> std::path::PathBuf {
    save_path
        .join(AUTHOR_NAME)
        .join(format!("{CREATE_TIME_STAMP}_{desc}"))
}
