// src/reddit/download.rs

use super::fetch::FetchError;
use indicatif::ProgressBar;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error(transparent)]
    Http(#[from] FetchError),

    #[error("cannot write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Anything that can materialize a list of media URLs as local files.
pub trait MediaFetcher {
    fn download_all(&self, urls: &[String], dir: &Path) -> Result<Vec<PathBuf>, DownloadError>;
}

pub struct Downloader {
    agent: ureq::Agent,
}

impl Downloader {
    pub fn new(agent: ureq::Agent) -> Self {
        Self { agent }
    }

    fn download_one(&self, url: &str, path: &Path) -> Result<u64, DownloadError> {
        let response = self.agent.get(url).call().map_err(|e| FetchError::from_ureq(url, e))?;

        let io_err = |source| DownloadError::Io { path: path.to_path_buf(), source };
        let mut out = BufWriter::new(File::create(path).map_err(io_err)?);
        let bytes = io::copy(&mut response.into_reader(), &mut out).map_err(io_err)?;
        out.flush().map_err(io_err)?;
        Ok(bytes)
    }
}

impl MediaFetcher for Downloader {
    /// Downloads sequentially; each file is complete before the next request starts.
    fn download_all(&self, urls: &[String], dir: &Path) -> Result<Vec<PathBuf>, DownloadError> {
        let bar = ProgressBar::new(urls.len() as u64);
        bar.set_message("Downloading media");

        let mut paths = Vec::with_capacity(urls.len());
        for (i, url) in urls.iter().enumerate() {
            let path = dir.join(format!("media_{}.{}", i + 1, media_extension(url)));
            let bytes = self.download_one(url, &path)?;
            tracing::debug!(%url, path = %path.display(), bytes, "downloaded");
            paths.push(path);
            bar.inc(1);
        }
        bar.finish_with_message(format!("Downloaded {} file(s)", paths.len()));
        Ok(paths)
    }
}

/// Extension of the URL's last path segment, ignoring query and fragment.
pub fn media_extension(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let last = path.rsplit('/').next().unwrap_or(path);
    match last.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()) => {
            ext.to_ascii_lowercase()
        }
        _ => "bin".to_string(),
    }
}
