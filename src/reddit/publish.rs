// src/reddit/publish.rs

use super::batch::Batch;
use super::export::post_id;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Outcome of asking the publisher about something it may not be able to see
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detection {
    Detected,
    NotDetected,
    Indeterminate,
}

/// A post's title and media, split into the posts of one thread
#[derive(Debug, Clone)]
pub struct Thread {
    pub source_url: String,
    pub title: String,
    pub batches: Vec<Batch<PathBuf>>,
}

impl Thread {
    pub fn media_count(&self) -> usize {
        self.batches.iter().map(|b| b.items.len()).sum()
    }
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot encode thread manifest: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Where finished threads go. Implementations drive whatever actually posts.
pub trait Publisher {
    fn submit(&mut self, thread: &Thread) -> Result<(), PublishError>;

    /// Whether the last submission was refused as a repeat of an earlier one.
    fn duplicate(&mut self, thread: &Thread) -> Detection;

    /// Whether `thread` is live.
    fn published(&mut self, thread: &Thread) -> Detection;
}

pub const MANIFEST_FILE: &str = "thread.json";

#[derive(Debug, Serialize)]
struct Manifest<'a> {
    source_url: &'a str,
    title: &'a str,
    tweets: Vec<Vec<String>>,
}

/// Stages each thread as `{root}/{post id}/` with the media and a `thread.json`
/// manifest, ready to be posted by hand or by an external driver.
pub struct OutboxPublisher {
    root: PathBuf,
    repeat: bool,
}

impl OutboxPublisher {
    pub fn new(root: PathBuf) -> Self {
        Self { root, repeat: false }
    }

    pub fn thread_dir(&self, thread: &Thread) -> PathBuf {
        self.root.join(slug(&thread.source_url))
    }

    fn manifest(thread: &Thread) -> Manifest<'_> {
        Manifest {
            source_url: &thread.source_url,
            title: &thread.title,
            tweets: thread
                .batches
                .iter()
                .map(|b| b.items.iter().map(|p| file_name(p)).collect())
                .collect(),
        }
    }
}

impl Publisher for OutboxPublisher {
    fn submit(&mut self, thread: &Thread) -> Result<(), PublishError> {
        let dir = self.thread_dir(thread);
        let manifest_path = dir.join(MANIFEST_FILE);
        self.repeat = manifest_path.exists();
        if self.repeat {
            return Ok(());
        }

        fs::create_dir_all(&dir).map_err(io_err(&dir))?;
        for media in thread.batches.iter().flat_map(|b| b.items.iter()) {
            let target = dir.join(file_name(media));
            fs::copy(media, &target).map_err(io_err(media))?;
        }
        // manifest last: its presence marks a complete stage
        let json = serde_json::to_string_pretty(&Self::manifest(thread))?;
        fs::write(&manifest_path, json).map_err(io_err(&manifest_path))?;
        tracing::info!(dir = %dir.display(), media = thread.media_count(), "thread staged");
        Ok(())
    }

    fn duplicate(&mut self, _thread: &Thread) -> Detection {
        if self.repeat {
            Detection::Detected
        } else {
            Detection::NotDetected
        }
    }

    /// A thread counts as published once its manifest and every media file are on disk.
    fn published(&mut self, thread: &Thread) -> Detection {
        let dir = self.thread_dir(thread);
        let expected = std::iter::once(MANIFEST_FILE.to_string())
            .chain(thread.batches.iter().flat_map(|b| b.items.iter()).map(|m| file_name(m)));
        for name in expected {
            match fs::metadata(dir.join(&name)) {
                Ok(meta) if meta.is_file() => {}
                Ok(_) => return Detection::NotDetected,
                Err(e) if e.kind() == io::ErrorKind::NotFound => return Detection::NotDetected,
                Err(e) => {
                    tracing::warn!(file = %dir.join(&name).display(), error = %e, "cannot inspect staged thread");
                    return Detection::Indeterminate;
                }
            }
        }
        Detection::Detected
    }
}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> PublishError {
    let path = path.to_path_buf();
    move |source| PublishError::Io { path, source }
}

fn file_name(path: &Path) -> String {
    path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
}

/// The post id when the URL has one, otherwise the URL with unsafe characters replaced.
fn slug(url: &str) -> String {
    match post_id(url) {
        Some(id) => id.to_string(),
        None => url
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect::<String>()
            .trim_matches('_')
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reddit::batch::batches;

    fn thread(media_dir: &Path, count: usize) -> Thread {
        let paths: Vec<PathBuf> = (1..=count)
            .map(|i| {
                let p = media_dir.join(format!("media_{i}.jpg"));
                fs::write(&p, format!("image {i}")).unwrap();
                p
            })
            .collect();
        Thread {
            source_url: "https://www.reddit.com/r/pics/comments/1abc2d/sunset".into(),
            title: "Sunset".into(),
            batches: batches(&paths),
        }
    }

    #[test]
    fn stages_media_and_manifest() {
        let media = tempfile::tempdir().unwrap();
        let outbox = tempfile::tempdir().unwrap();
        let t = thread(media.path(), 5);
        let mut publisher = OutboxPublisher::new(outbox.path().to_path_buf());

        assert_eq!(publisher.published(&t), Detection::NotDetected);
        publisher.submit(&t).unwrap();

        assert_eq!(publisher.duplicate(&t), Detection::NotDetected);
        assert_eq!(publisher.published(&t), Detection::Detected);
        let dir = outbox.path().join("1abc2d");
        assert_eq!(fs::read_to_string(dir.join("media_5.jpg")).unwrap(), "image 5");

        let manifest: serde_json::Value = serde_json::from_str(&fs::read_to_string(dir.join(MANIFEST_FILE)).unwrap()).unwrap();
        assert_eq!(manifest["title"], "Sunset");
        assert_eq!(
            manifest["tweets"],
            serde_json::json!([["media_1.jpg", "media_2.jpg", "media_3.jpg", "media_4.jpg"], ["media_5.jpg"]])
        );
    }

    #[test]
    fn restaging_is_reported_as_duplicate() {
        let media = tempfile::tempdir().unwrap();
        let outbox = tempfile::tempdir().unwrap();
        let t = thread(media.path(), 1);

        OutboxPublisher::new(outbox.path().to_path_buf()).submit(&t).unwrap();
        let mut again = OutboxPublisher::new(outbox.path().to_path_buf());
        again.submit(&t).unwrap();

        assert_eq!(again.duplicate(&t), Detection::Detected);
    }

    #[test]
    fn slugs_urls_without_ids() {
        assert_eq!(slug("https://www.reddit.com/r/a/comments/x9/t"), "x9");
        assert_eq!(slug("https://i.imgur.com/abc"), "https___i_imgur_com_abc");
    }
}
