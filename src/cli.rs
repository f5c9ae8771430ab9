// src/cli.rs

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay an archived directory tree as a dated git history
    Replay(ReplayArgs),
    /// Fetch saved Reddit posts, download their media and stage threads
    Post(PostArgs),
    /// Extract saved post URLs from a Reddit data-export HTML file
    Index(IndexArgs),
    /// Sort a saved-posts file from oldest to newest post
    Sort(SortArgs),
}

#[derive(clap::Args, Debug)]
pub struct ReplayArgs {
    /// Untouched archive whose modification times are authoritative
    #[arg(long)]
    pub original: PathBuf,

    /// Trimmed copy of the archive; these are the files that get committed
    #[arg(long)]
    pub trimmed: PathBuf,

    /// Target git repository (only touched with --live)
    #[arg(long)]
    pub repo: PathBuf,

    /// Preview log, truncated at the start of every run
    #[arg(long, default_value = "commit-preview.txt")]
    pub preview: PathBuf,

    /// Files modified before this day are folded into its year
    #[arg(long, default_value = "2017-03-01")]
    pub cutoff: NaiveDate,

    /// Commit day for files that only exist in the trimmed tree
    #[arg(long, default_value = "2017-03-02")]
    pub fallback: NaiveDate,

    /// What to do with Feb 29 when the cutoff year has none
    #[arg(long, value_enum, default_value_t = LeapDayPolicy::Clamp)]
    pub leap_day: LeapDayPolicy,

    /// Copy files and create commits instead of only writing the preview
    #[arg(long)]
    pub live: bool,

    /// Run `git push` after every commit (live mode only)
    #[arg(long, requires = "live")]
    pub push: bool,
}

#[derive(clap::ValueEnum, Clone, Debug, Copy, PartialEq, Eq)]
pub enum LeapDayPolicy {
    /// Move Feb 29 to Feb 28, keeping the time of day
    Clamp,
    /// Abort the run and name the offending file
    Reject,
}

#[derive(clap::Args, Debug)]
pub struct PostArgs {
    /// Pending posts document ({"urls": [...]})
    #[arg(long)]
    pub saved: Option<PathBuf>,

    /// Archive of processed posts
    #[arg(long)]
    pub posted: Option<PathBuf>,

    /// Directory where staged threads are written
    #[arg(long, default_value = "outbox")]
    pub outbox: PathBuf,

    /// Read post URLs from stdin instead of the pending document
    #[arg(long)]
    pub queue: bool,

    /// Start in auto mode (no per-post prompt)
    #[arg(long)]
    pub auto: bool,

    /// Publish attempts before asking the operator
    #[arg(long, default_value_t = 5)]
    pub retry_attempts: u32,

    /// Base of the linear retry backoff, in seconds
    #[arg(long, default_value_t = 3.0, value_parser = seconds)]
    pub retry_base_secs: f64,

    /// HTTP request timeout, in seconds
    #[arg(long, default_value_t = 10)]
    pub timeout_secs: u64,

    /// Auto-mode pause per media item, lower bound in seconds
    #[arg(long, default_value_t = 5.0, value_parser = seconds)]
    pub pace_min_secs: f64,

    /// Auto-mode pause per media item, upper bound in seconds
    #[arg(long, default_value_t = 10.0, value_parser = seconds)]
    pub pace_max_secs: f64,
}

#[derive(clap::Args, Debug)]
pub struct IndexArgs {
    /// Reddit export HTML file
    #[arg(long)]
    pub export: PathBuf,

    /// Output document (defaults to the saved-posts location)
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct SortArgs {
    /// Saved posts document to read (defaults to the saved-posts location)
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Sorted output document (defaults to saved_ordered_posts.json next to the input default)
    #[arg(long)]
    pub output: Option<PathBuf>,
}

/// A duration in seconds: finite and not negative.
fn seconds(text: &str) -> Result<f64, String> {
    let value: f64 = text.parse().map_err(|e| format!("{e}"))?;
    if !value.is_finite() || value < 0.0 {
        return Err(format!("{text} is not a finite, non-negative number of seconds"));
    }
    Ok(value)
}
