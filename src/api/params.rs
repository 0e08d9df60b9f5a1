//! Query-string construction for the platform's web API
//!
//! Every listing endpoint expects the same fixed browser parameter set the
//! web client sends, plus the scope-specific key (`sec_user_id`, `mix_id`,
//! `music_id`), the cursor, and a page size. The assembled string is what
//! gets signed, so parameter order is kept stable.

use std::borrow::Cow;

/// Page size the web client requests per listing call
pub(crate) const PAGE_SIZE: u32 = 35;

/// The fixed browser parameter set appended to every listing request
const BROWSER_PARAMS: &[(&str, &str)] = &[
    ("aid", "6383"),
    ("device_platform", "webapp"),
    ("channel", "channel_pc_web"),
    ("pc_client_type", "1"),
    ("version_code", "170400"),
    ("version_name", "17.4.0"),
    ("cookie_enabled", "true"),
    ("screen_width", "1920"),
    ("screen_height", "1080"),
    ("browser_language", "zh-CN"),
    ("browser_platform", "MacIntel"),
    ("browser_name", "Chrome"),
    ("browser_version", "122.0.0.0"),
    ("browser_online", "true"),
];

/// Join `key=value` pairs, percent-encoding values that need it
fn join(pairs: &[(&str, Cow<'_, str>)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Scope key, cursor and page size followed by the browser parameter set
fn listing_params(scope_key: &str, owner_id: &str, cursor_key: &str, cursor: u64) -> String {
    let mut pairs: Vec<(&str, Cow<'_, str>)> = vec![
        (scope_key, Cow::Borrowed(owner_id)),
        (cursor_key, Cow::Owned(cursor.to_string())),
        ("count", Cow::Owned(PAGE_SIZE.to_string())),
    ];
    pairs.extend(
        BROWSER_PARAMS
            .iter()
            .map(|(k, v)| (*k, Cow::Borrowed(*v))),
    );
    join(&pairs)
}

/// Parameters for the single-item detail endpoint
pub(crate) fn detail(aweme_id: &str) -> String {
    join(&[
        ("aweme_id", Cow::Borrowed(aweme_id)),
        ("device_platform", Cow::Borrowed("webapp")),
        ("aid", Cow::Borrowed("6383")),
    ])
}

/// Parameters for a user's published-post feed (cursor key `max_cursor`)
pub(crate) fn user_posts(sec_uid: &str, cursor: u64) -> String {
    listing_params("sec_user_id", sec_uid, "max_cursor", cursor)
}

/// Parameters for a user's like feed (cursor key `max_cursor`)
pub(crate) fn user_likes(sec_uid: &str, cursor: u64) -> String {
    listing_params("sec_user_id", sec_uid, "max_cursor", cursor)
}

/// Parameters for a user's collection list (cursor key `cursor`)
pub(crate) fn user_mix_list(sec_uid: &str, cursor: u64) -> String {
    listing_params("sec_user_id", sec_uid, "cursor", cursor)
}

/// Parameters for a collection's item feed (cursor key `cursor`)
pub(crate) fn mix_items(mix_id: &str, cursor: u64) -> String {
    listing_params("mix_id", mix_id, "cursor", cursor)
}

/// Parameters for a music track's item feed (cursor key `cursor`)
pub(crate) fn music_items(music_id: &str, cursor: u64) -> String {
    listing_params("music_id", music_id, "cursor", cursor)
}
