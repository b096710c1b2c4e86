//! YouTube URL recognition.
//!
//! Purely syntactic: a URL is accepted when its host is a YouTube host and a
//! well-formed 11-character video ID can be extracted from it.

use url::Url;

const VIDEO_ID_LEN: usize = 11;

/// Hosts whose `/watch?v=<id>` and path-style links are accepted.
const QUERY_HOSTS: &[&str] = &[
    "youtube.com",
    "www.youtube.com",
    "m.youtube.com",
    "music.youtube.com",
    "gaming.youtube.com",
];

/// Hosts whose first path segment is the video ID.
const SHORT_HOSTS: &[&str] = &["youtu.be", "www.youtu.be"];

/// Path prefixes that carry the ID as the next segment.
const PATH_STYLES: &[&str] = &["shorts", "embed", "live", "v", "e"];

/// Whether `text` is a YouTube video URL with a well-formed video ID.
#[must_use]
pub fn is_video_url(text: &str) -> bool {
    video_id(text).is_some()
}

/// Extract the video ID from a YouTube URL.
#[must_use]
pub fn video_id(text: &str) -> Option<String> {
    let url = Url::parse(text.trim()).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    let host = url.host_str()?.to_ascii_lowercase();

    let candidate = if SHORT_HOSTS.contains(&host.as_str()) {
        url.path_segments()?.next().map(str::to_string)
    } else if QUERY_HOSTS.contains(&host.as_str()) {
        id_from_query_host(&url)
    } else {
        None
    }?;

    is_valid_id(&candidate).then_some(candidate)
}

fn id_from_query_host(url: &Url) -> Option<String> {
    if url.path() == "/watch" || url.path() == "/watch/" {
        return url
            .query_pairs()
            .find(|(k, _)| k == "v")
            .map(|(_, v)| v.trim().to_string());
    }

    let mut segs = url.path_segments()?;
    let style = segs.next()?;
    if PATH_STYLES.contains(&style) {
        return segs.next().map(str::to_string);
    }
    None
}

/// `[A-Za-z0-9_-]{11}`.
#[must_use]
pub fn is_valid_id(id: &str) -> bool {
    id.len() == VIDEO_ID_LEN
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}
