// src/reddit/store.rs

use chrono::Local;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;

pub const SAVED_POSTS_FILE: &str = "reddit_saved_posts.json";
pub const POSTED_URLS_FILE: &str = "reddit_posted_urls.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} does not exist")]
    Missing(PathBuf),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Where the JSON documents live unless a path is given: the user's
/// Downloads folder, or the current directory when there is none.
pub fn default_dir() -> PathBuf {
    dirs::download_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// Local time in the ISO form the documents use, e.g. `2025-01-02T03:04:05.123456`.
pub fn timestamp_now() -> String {
    Local::now().naive_local().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

/// Pending posts. Only `urls` is required; the rest is carried along verbatim,
/// whatever timestamp format wrote it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SavedPosts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indexed_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sorted_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(default)]
    pub urls: Vec<String>,
}

impl SavedPosts {
    /// Drops `url` and keeps `count` in step. Returns whether it was present.
    pub fn remove(&mut self, url: &str) -> bool {
        let before = self.urls.len();
        self.urls.retain(|u| u != url);
        if self.count.is_some() {
            self.count = Some(self.urls.len());
        }
        self.urls.len() != before
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Success,
    Manual,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostedEntry {
    pub url: String,
    pub status: PostStatus,
    pub posted_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostedArchive {
    #[serde(default)]
    pub urls: Vec<PostedEntry>,
}

/// Reads and rewrites the pending-posts document as a whole.
#[derive(Debug, Clone)]
pub struct PendingStore {
    path: PathBuf,
}

impl PendingStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<SavedPosts, StoreError> {
        if !self.path.exists() {
            return Err(StoreError::Missing(self.path.clone()));
        }
        read_lenient(&self.path)
    }

    pub fn save(&self, posts: &SavedPosts) -> Result<(), StoreError> {
        write_json(&self.path, posts)
    }
}

/// Append-only record of processed posts, rewritten whole on every append.
#[derive(Debug, Clone)]
pub struct ArchiveStore {
    path: PathBuf,
}

impl ArchiveStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// A missing or unreadable archive starts over empty.
    pub fn load(&self) -> PostedArchive {
        if !self.path.exists() {
            return PostedArchive::default();
        }
        read_lenient(&self.path).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "posted archive unreadable, starting a new one");
            PostedArchive::default()
        })
    }

    pub fn append(&self, url: &str, status: PostStatus) -> Result<PostedEntry, StoreError> {
        let mut archive = self.load();
        let entry = PostedEntry { url: url.to_string(), status, posted_at: timestamp_now() };
        archive.urls.push(entry.clone());
        write_json(&self.path, &archive)?;
        Ok(entry)
    }
}

/// Parses JSON, retrying without trailing commas (which hand-edited files
/// often have) only when the text is not valid as written.
pub fn read_lenient<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, StoreError> {
    let text = fs::read_to_string(path).map_err(|source| StoreError::Io { path: path.to_path_buf(), source })?;
    match serde_json::from_str(&text) {
        Ok(value) => Ok(value),
        Err(strict) => {
            tracing::debug!(path = %path.display(), error = %strict, "retrying without trailing commas");
            serde_json::from_str(&strip_trailing_commas(&text))
                .map_err(|source| StoreError::Json { path: path.to_path_buf(), source })
        }
    }
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let text = serde_json::to_string_pretty(value).map_err(|source| StoreError::Json { path: path.to_path_buf(), source })?;
    fs::write(path, text).map_err(|source| StoreError::Io { path: path.to_path_buf(), source })
}

fn strip_trailing_commas(text: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r",(\s*[}\]])").expect("trailing comma pattern is valid"))
        .replace_all(text, "$1")
        .into_owned()
}
