// src/reddit/export.rs

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

pub const OLDEST_TO_NEWEST: &str = "oldest_to_newest";

fn thread_anchor() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?is)<a\s+href=["']+(https://www\.reddit\.com/r/[^/]+/comments/[^"']+)["']>\s*THREAD\s*</a>"#)
            .expect("thread anchor pattern is valid")
    })
}

fn comments_href() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"href=["']+(https://www\.reddit\.com/r/[^/]+/comments/[^"']+)["']"#)
            .expect("comments href pattern is valid")
    })
}

fn post_id_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/comments/([a-z0-9]+)(?:/|$)").expect("post id pattern is valid"))
}

/// Post URLs from a Reddit data-export page, cleaned and de-duplicated in page order.
///
/// Anchors labelled `THREAD` are the export's saved-post links. Older exports
/// don't label them, in which case every comments link on the page is used.
pub fn extract_urls_from_html(html: &str) -> Vec<String> {
    let mut matches: Vec<&str> = thread_anchor().captures_iter(html).filter_map(|c| c.get(1)).map(|m| m.as_str()).collect();
    tracing::debug!(count = matches.len(), "THREAD anchors");
    if matches.is_empty() {
        matches = comments_href().captures_iter(html).filter_map(|c| c.get(1)).map(|m| m.as_str()).collect();
        tracing::debug!(count = matches.len(), "comments links");
    }

    let mut seen = HashSet::new();
    matches
        .into_iter()
        .map(clean_url)
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

/// Strips query, fragment and one trailing slash.
pub fn clean_url(url: &str) -> String {
    let url = url.split(['?', '#']).next().unwrap_or(url);
    url.strip_suffix('/').unwrap_or(url).to_string()
}

/// The base-36 post id in `/comments/<id>/`.
pub fn post_id(url: &str) -> Option<&str> {
    post_id_pattern().captures(url).and_then(|c| c.get(1)).map(|m| m.as_str())
}

/// Orders URLs oldest first. Reddit ids grow monotonically, so the numeric
/// value of the base-36 id is a good proxy for age. URLs without an id sort
/// to the front; ties keep their input order.
pub fn sort_oldest_first(urls: &[String]) -> Vec<String> {
    let mut keyed: Vec<(u64, &String)> = urls
        .iter()
        .map(|url| (post_id(url).and_then(|id| u64::from_str_radix(id, 36).ok()).unwrap_or(0), url))
        .collect();
    keyed.sort_by_key(|(key, _)| *key);
    keyed.into_iter().map(|(_, url)| url.clone()).collect()
}
