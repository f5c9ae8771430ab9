// src/reddit/fetch.rs

use super::post::{post_from_listing, RedditPost};
use std::time::Duration;
use thiserror::Error;

pub const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("GET {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("GET {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: Box<ureq::Transport>,
    },

    #[error("cannot decode JSON from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no post object in the listing from {0}")]
    Malformed(String),
}

impl FetchError {
    pub(crate) fn from_ureq(url: &str, err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(status, _) => FetchError::Status { url: url.to_string(), status },
            ureq::Error::Transport(t) => FetchError::Transport { url: url.to_string(), source: Box::new(t) },
        }
    }
}

/// Anything that can turn a post URL into a decoded post.
pub trait PostSource {
    fn fetch_post(&self, post_url: &str) -> Result<RedditPost, FetchError>;
}

/// Shared HTTP agent. Timeouts apply per connect and per read, so large
/// video downloads are not cut off as long as bytes keep arriving.
pub fn build_agent(timeout: Duration) -> ureq::Agent {
    ureq::AgentBuilder::new()
        .timeout_connect(timeout)
        .timeout_read(timeout)
        .user_agent(USER_AGENT)
        .build()
}

pub struct Fetcher {
    agent: ureq::Agent,
}

impl Fetcher {
    pub fn new(agent: ureq::Agent) -> Self {
        Self { agent }
    }

    fn get_json(&self, url: &str) -> Result<serde_json::Value, FetchError> {
        let response = self
            .agent
            .get(url)
            .set("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8")
            .set("Accept-Language", "en-US,en;q=0.5")
            .set("DNT", "1")
            .call()
            .map_err(|e| FetchError::from_ureq(url, e))?;
        response
            .into_json::<serde_json::Value>()
            .map_err(|source| FetchError::Decode { url: url.to_string(), source })
    }
}

impl PostSource for Fetcher {
    fn fetch_post(&self, post_url: &str) -> Result<RedditPost, FetchError> {
        let url = json_endpoint(post_url);
        let listing = match self.get_json(&url) {
            Err(FetchError::Status { status: 403, .. }) => {
                let alt = alternate_endpoint(&url);
                tracing::warn!(%url, %alt, "blocked with 403, retrying on the alternate host");
                self.get_json(&alt)?
            }
            other => other?,
        };

        let post = post_from_listing(&listing).ok_or_else(|| FetchError::Malformed(url.clone()))?;
        serde_json::from_value(post).map_err(|e| FetchError::Decode { url, source: e.into() })
    }
}

/// `https://www.reddit.com/r/x/comments/id/slug` → `.../slug/.json`
pub fn json_endpoint(post_url: &str) -> String {
    if post_url.ends_with(".json") {
        post_url.to_string()
    } else if post_url.ends_with('/') {
        format!("{post_url}.json")
    } else {
        format!("{post_url}/.json")
    }
}

/// Same endpoint on `old.reddit.com`, which blocks less eagerly.
pub fn alternate_endpoint(json_url: &str) -> String {
    format!("{}.json", json_url.replace(".json", "").replace("www.reddit.com", "old.reddit.com"))
}
