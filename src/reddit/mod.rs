// src/reddit/mod.rs

//! Saved Reddit posts: indexing an export, ordering it, and turning each
//! post's media into a staged thread.

pub mod batch;
pub mod classify;
pub mod download;
pub mod export;
pub mod fetch;
pub mod operator;
pub mod post;
pub mod publish;
pub mod retry;
pub mod store;
pub mod worker;

use crate::cli::{IndexArgs, PostArgs, SortArgs};
use download::Downloader;
use fetch::{build_agent, Fetcher};
use operator::{ConsoleOperator, Operator, UnattendedOperator};
use publish::OutboxPublisher;
use retry::{Backoff, Pacing};
use std::io;
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;
use store::{ArchiveStore, PendingStore, SavedPosts, StoreError};
use thiserror::Error;
use worker::{AppContext, Pending, PostConfig, RunSummary, WorkerError};

pub const SORTED_POSTS_FILE: &str = "saved_ordered_posts.json";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("cannot read export {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub fn run_post(args: &PostArgs) -> Result<RunSummary, WorkerError> {
    let dir = store::default_dir();
    let agent = build_agent(Duration::from_secs(args.timeout_secs));
    let config = PostConfig {
        retry_attempts: args.retry_attempts.max(1),
        backoff: Backoff { base: Duration::from_secs_f64(args.retry_base_secs.max(0.0)), jitter: true },
        pacing: Pacing { min_per_item: args.pace_min_secs, max_per_item: args.pace_max_secs },
    };
    let archive = ArchiveStore::new(args.posted.clone().unwrap_or_else(|| dir.join(store::POSTED_URLS_FILE)));

    let (pending, operator): (Option<Pending>, Box<dyn Operator>) = if args.queue {
        (None, Box::new(UnattendedOperator) as Box<dyn Operator>)
    } else {
        let store = PendingStore::new(args.saved.clone().unwrap_or_else(|| dir.join(store::SAVED_POSTS_FILE)));
        let posts = store.load()?;
        tracing::info!(path = %store.path().display(), count = posts.urls.len(), "loaded pending posts");
        (Some(Pending { store, posts }), Box::new(ConsoleOperator::stdio()) as Box<dyn Operator>)
    };

    let mut ctx = AppContext::new(
        config,
        Box::new(Fetcher::new(agent.clone())),
        Box::new(Downloader::new(agent)),
        Box::new(OutboxPublisher::new(args.outbox.clone())),
        operator,
        pending,
        archive,
        args.auto,
    );

    if args.queue {
        let (tx, rx) = mpsc::channel();
        // detached: a blocked stdin read must not hold up shutdown
        let _reader = worker::spawn_url_reader(io::BufReader::new(io::stdin()), tx);
        ctx.run_queue(rx)
    } else {
        ctx.run_pending()
    }
}

/// Writes the saved-post URLs found in an export page. Returns how many.
pub fn run_index(args: &IndexArgs) -> Result<usize, ExportError> {
    let html = std::fs::read_to_string(&args.export)
        .map_err(|source| ExportError::Read { path: args.export.clone(), source })?;
    let urls = export::extract_urls_from_html(&html);
    let output = args.output.clone().unwrap_or_else(|| store::default_dir().join(store::SAVED_POSTS_FILE));

    let posts = SavedPosts { indexed_at: Some(store::timestamp_now()), count: Some(urls.len()), urls, ..Default::default() };
    store::write_json(&output, &posts)?;
    tracing::info!(count = posts.urls.len(), path = %output.display(), "indexed saved posts");
    for (i, url) in posts.urls.iter().take(5).enumerate() {
        tracing::info!("{}. {}", i + 1, url);
    }
    Ok(posts.urls.len())
}

/// Rewrites a saved-posts document oldest first. Returns how many URLs it holds.
pub fn run_sort(args: &SortArgs) -> Result<usize, ExportError> {
    let dir = store::default_dir();
    let input = args.input.clone().unwrap_or_else(|| dir.join(store::SAVED_POSTS_FILE));
    let output = args.output.clone().unwrap_or_else(|| dir.join(SORTED_POSTS_FILE));

    let loaded = PendingStore::new(input).load()?;
    let now = store::timestamp_now();
    let urls = export::sort_oldest_first(&loaded.urls);
    let sorted = SavedPosts {
        indexed_at: loaded.indexed_at.or_else(|| Some(now.clone())),
        sorted_at: Some(now),
        sort_order: Some(export::OLDEST_TO_NEWEST.to_string()),
        count: Some(urls.len()),
        urls,
    };
    store::write_json(&output, &sorted)?;
    tracing::info!(count = sorted.urls.len(), path = %output.display(), "sorted oldest to newest");
    Ok(sorted.urls.len())
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn index_writes_saved_posts() {
        let tmp = tempfile::tempdir().unwrap();
        let export = tmp.path().join("reddit_export.html");
        fs::write(
            &export,
            r#"<a href="https://www.reddit.com/r/a/comments/b2/x/">THREAD</a><a href="https://www.reddit.com/r/a/comments/a1/y">THREAD</a>"#,
        )
        .unwrap();
        let output = tmp.path().join(store::SAVED_POSTS_FILE);

        let count = run_index(&IndexArgs { export, output: Some(output.clone()) }).unwrap();

        let saved = PendingStore::new(output).load().unwrap();
        assert_eq!(count, 2);
        assert_eq!(saved.count, Some(2));
        assert!(saved.indexed_at.is_some());
        assert_eq!(saved.urls[0], "https://www.reddit.com/r/a/comments/b2/x");
    }

    #[test]
    fn sort_keeps_indexed_at_and_orders_by_id() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join(store::SAVED_POSTS_FILE);
        fs::write(
            &input,
            r#"{"indexed_at": "2024-06-01T10:00:00", "urls": ["https://www.reddit.com/r/a/comments/b2/x", "https://www.reddit.com/r/a/comments/a1/y",]}"#,
        )
        .unwrap();
        let output = tmp.path().join(SORTED_POSTS_FILE);

        run_sort(&SortArgs { input: Some(input), output: Some(output.clone()) }).unwrap();

        let sorted = PendingStore::new(output).load().unwrap();
        assert_eq!(sorted.urls, vec!["https://www.reddit.com/r/a/comments/a1/y", "https://www.reddit.com/r/a/comments/b2/x"]);
        assert_eq!(sorted.sort_order.as_deref(), Some(export::OLDEST_TO_NEWEST));
        assert_eq!(sorted.indexed_at.as_deref(), Some("2024-06-01T10:00:00"));
        assert!(sorted.sorted_at.is_some());
    }

    #[test]
    fn missing_export_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let err = run_index(&IndexArgs { export: tmp.path().join("none.html"), output: None }).unwrap_err();
        assert!(matches!(err, ExportError::Read { .. }));
    }
}
