// src/reddit/worker.rs

use super::batch::batches;
use super::classify::classify;
use super::download::MediaFetcher;
use super::fetch::PostSource;
use super::operator::{Escalation, Operator, PostAction};
use super::publish::{Publisher, Thread};
use super::retry::{publish_with_retry, Backoff, Pacing, PublishOutcome};
use super::store::{ArchiveStore, PendingStore, PostStatus, SavedPosts, StoreError};
use std::collections::HashMap;
use std::fmt;
use std::io::{self, BufRead};
use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("cannot create a download directory: {0}")]
    TempDir(#[source] io::Error),
}

#[derive(Debug, Clone, Copy)]
pub struct PostConfig {
    pub retry_attempts: u32,
    pub backoff: Backoff,
    pub pacing: Pacing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Processing,
    Completed,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub total: usize,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Posts processed: {} | skipped: {} | failed: {} | total: {}",
            self.processed, self.skipped, self.failed, self.total
        )
    }
}

/// The pending document and the store it is written back to.
pub struct Pending {
    pub store: PendingStore,
    pub posts: SavedPosts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Next,
    Quit,
}

/// Everything one posting run needs, built once and owned by the worker.
pub struct AppContext {
    pub config: PostConfig,
    pub source: Box<dyn PostSource>,
    pub media: Box<dyn MediaFetcher>,
    pub publisher: Box<dyn Publisher>,
    pub operator: Box<dyn Operator>,
    /// `None` in queue mode: URLs come from stdin and nothing is pending on disk.
    pub pending: Option<Pending>,
    pub archive: ArchiveStore,
    pub auto: bool,
    statuses: HashMap<String, JobStatus>,
    summary: RunSummary,
    pause: Option<Duration>,
}

impl AppContext {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: PostConfig,
        source: Box<dyn PostSource>,
        media: Box<dyn MediaFetcher>,
        publisher: Box<dyn Publisher>,
        operator: Box<dyn Operator>,
        pending: Option<Pending>,
        archive: ArchiveStore,
        auto: bool,
    ) -> Self {
        Self {
            config,
            source,
            media,
            publisher,
            operator,
            pending,
            archive,
            auto,
            statuses: HashMap::new(),
            summary: RunSummary::default(),
            pause: None,
        }
    }

    #[cfg(test)]
    pub fn status(&self, url: &str) -> Option<JobStatus> {
        self.statuses.get(url).copied()
    }

    /// URLs whose fetch or download failed this run, sorted.
    pub fn failed_urls(&self) -> Vec<&str> {
        let mut urls: Vec<&str> = self
            .statuses
            .iter()
            .filter(|(_, status)| **status == JobStatus::Failed)
            .map(|(url, _)| url.as_str())
            .collect();
        urls.sort_unstable();
        urls
    }

    fn finish(&self) -> RunSummary {
        let failed = self.failed_urls();
        if !failed.is_empty() {
            tracing::warn!(count = failed.len(), "some posts failed and remain pending");
            for url in failed {
                tracing::warn!(%url, "failed");
            }
        }
        self.summary
    }

    /// Works through the pending document front to back.
    pub fn run_pending(&mut self) -> Result<RunSummary, WorkerError> {
        let urls = self.pending.as_ref().map(|p| p.posts.urls.clone()).unwrap_or_default();
        self.summary.total = urls.len();
        tracing::info!(count = urls.len(), "pending posts");
        for url in urls {
            if self.process_next(&url)? == Flow::Quit {
                break;
            }
        }
        Ok(self.finish())
    }

    /// Works through URLs as they arrive until the sender hangs up.
    pub fn run_queue(&mut self, urls: Receiver<String>) -> Result<RunSummary, WorkerError> {
        tracing::info!("waiting for URLs on stdin");
        for url in urls {
            self.summary.total += 1;
            if self.process_next(&url)? == Flow::Quit {
                break;
            }
        }
        Ok(self.finish())
    }

    fn process_next(&mut self, url: &str) -> Result<Flow, WorkerError> {
        if let Some(wait) = self.pause.take() {
            tracing::info!(wait = ?wait, "auto mode pause");
            thread::sleep(wait);
        }
        let attempted = self.summary.processed + self.summary.skipped + self.summary.failed;
        tracing::info!(post = attempted + 1, total = self.summary.total, %url, "processing");
        self.statuses.insert(url.to_string(), JobStatus::Processing);
        self.process_url(url)
    }

    fn process_url(&mut self, url: &str) -> Result<Flow, WorkerError> {
        let post = match self.source.fetch_post(url) {
            Ok(post) => post,
            Err(e) => {
                tracing::error!(%url, error = %e, "failed to fetch post");
                return Ok(self.fail(url));
            }
        };
        let classification = classify(&post);
        tracing::debug!(shape = ?classification.shape, urls = classification.urls.len(), "classified");

        let action = if self.auto {
            tracing::info!(title = %classification.title, "[auto] posting");
            PostAction::Post
        } else {
            self.operator.choose(&classification.title)
        };
        let title = match action {
            PostAction::Quit => {
                self.statuses.remove(url);
                return Ok(Flow::Quit);
            }
            PostAction::Skip => return self.skip(url, true),
            PostAction::Auto => {
                tracing::info!("auto mode enabled");
                self.auto = true;
                classification.title
            }
            PostAction::Retitle(title) => {
                tracing::info!(%title, "using custom title");
                title
            }
            PostAction::Post => classification.title,
        };

        if classification.urls.is_empty() {
            tracing::warn!(%url, "no media found in this post");
            // stays pending; a later run may find the media processed
            return self.skip(url, false);
        }

        let scratch = tempfile::tempdir().map_err(WorkerError::TempDir)?;
        let files = match self.media.download_all(&classification.urls, scratch.path()) {
            Ok(files) => files,
            Err(e) => {
                tracing::error!(%url, error = %e, "failed to download media");
                return Ok(self.fail(url));
            }
        };
        let thread = Thread { source_url: url.to_string(), title, batches: batches(&files) };
        tracing::info!(media = files.len(), posts = thread.batches.len(), "thread ready");
        for batch in &thread.batches {
            tracing::debug!(first = batch.first_number, last = batch.last_number(), "thread post");
        }

        let outcome = publish_with_retry(
            self.publisher.as_mut(),
            &thread,
            self.config.retry_attempts,
            &self.config.backoff,
        );
        match outcome {
            PublishOutcome::Published => self.complete(url, PostStatus::Success, &thread)?,
            PublishOutcome::Duplicate => {
                tracing::warn!(%url, "duplicate content, skipping");
                return self.skip(url, true);
            }
            PublishOutcome::Unconfirmed => match self.operator.escalate(&thread) {
                Escalation::PostedManually => self.complete(url, PostStatus::Manual, &thread)?,
                Escalation::Skip => return self.skip(url, true),
                Escalation::Quit => {
                    self.statuses.remove(url);
                    return Ok(Flow::Quit);
                }
            },
        }
        Ok(Flow::Next)
    }

    fn complete(&mut self, url: &str, status: PostStatus, thread: &Thread) -> Result<(), WorkerError> {
        self.settle(url, status)?;
        self.summary.processed += 1;
        self.statuses.insert(url.to_string(), JobStatus::Completed);
        if self.auto {
            self.pause = Some(self.config.pacing.delay(thread.media_count(), &mut rand::thread_rng()));
        }
        tracing::info!(%url, ?status, remaining = self.remaining(), "post done");
        Ok(())
    }

    fn skip(&mut self, url: &str, archive: bool) -> Result<Flow, WorkerError> {
        if archive {
            self.settle(url, PostStatus::Skipped)?;
        }
        self.summary.skipped += 1;
        self.statuses.insert(url.to_string(), JobStatus::Skipped);
        Ok(Flow::Next)
    }

    fn fail(&mut self, url: &str) -> Flow {
        self.summary.failed += 1;
        self.statuses.insert(url.to_string(), JobStatus::Failed);
        Flow::Next
    }

    /// Archives `url` and drops it from the pending document.
    fn settle(&mut self, url: &str, status: PostStatus) -> Result<(), WorkerError> {
        self.archive.append(url, status)?;
        if let Some(pending) = self.pending.as_mut() {
            if pending.posts.remove(url) {
                pending.store.save(&pending.posts)?;
            }
        }
        Ok(())
    }

    fn remaining(&self) -> usize {
        self.pending.as_ref().map_or(0, |p| p.posts.urls.len())
    }
}

/// Reads URLs line by line on a background thread. Lines that are not
/// Reddit links are dropped with a warning. The thread ends at EOF or when
/// the receiver is gone.
pub fn spawn_url_reader<R: BufRead + Send + 'static>(input: R, tx: Sender<String>) -> JoinHandle<()> {
    thread::spawn(move || {
        for line in input.lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    tracing::warn!(error = %e, "stopped reading URLs");
                    break;
                }
            };
            let url = line.trim();
            if url.is_empty() {
                continue;
            }
            if !url.contains("reddit.com") {
                tracing::warn!(%url, "not a Reddit URL, ignored");
                continue;
            }
            tracing::info!(%url, "queued");
            if tx.send(url.to_string()).is_err() {
                break;
            }
        }
    })
}
