// src/replay/mod.rs

//! Replays an archived directory tree as a git history, one commit per
//! (day, module) bucket, dated by the files' original modification times.

pub mod commit;
pub mod group;
pub mod inventory;
pub mod module_path;
pub mod normalize;
pub mod preview;

use crate::cli::ReplayArgs;
use crate::model::{ModuleCommitCounter, ReplayReport};
use commit::LiveCommitter;
use group::PlannedCommit;
use indicatif::ProgressBar;
use inventory::InventoryError;
use normalize::{NormalizeError, Normalizer};
use preview::PreviewLog;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error(transparent)]
    Inventory(#[from] InventoryError),

    #[error("cannot date {path}: {source}")]
    Normalize {
        path: PathBuf,
        #[source]
        source: NormalizeError,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("git error: {0}")]
    Git(#[from] git2::Error),

    #[error("repository at {0} has no work tree")]
    BareRepository(PathBuf),

    #[error("git push failed: {0}")]
    Push(String),
}

impl ReplayError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        ReplayError::Io { path: path.to_path_buf(), source }
    }
}

pub fn run(args: &ReplayArgs) -> Result<ReplayReport, ReplayError> {
    // open the target first so a bad repository fails before any work
    let committer = if args.live { Some(LiveCommitter::open(&args.repo, args.push)?) } else { None };
    let mut preview = PreviewLog::create(&args.preview)?;

    let original = inventory::inventory(&args.original)?;
    let lookup = inventory::lookup(&original);
    let trimmed = inventory::inventory(&args.trimmed)?;
    tracing::info!(original = original.len(), trimmed = trimmed.len(), "inventory complete");

    let normalizer = Normalizer::new(args.cutoff, args.fallback, args.leap_day);
    let groups = group::group_files(&args.trimmed, &trimmed, &lookup, &normalizer)?;

    let bar = ProgressBar::new(groups.len() as u64);
    bar.set_message(if args.live { "Committing" } else { "Writing preview" });

    let mut counter = ModuleCommitCounter::default();
    for group in &groups {
        let planned = PlannedCommit::new(group, counter.next(&group.module));
        preview.write_commit(&planned)?;
        match &committer {
            Some(committer) => {
                committer.commit(&planned)?;
            }
            None => preview.write_test_mode_notice()?,
        }
        bar.inc(1);
    }
    bar.finish_with_message("Replay complete");

    preview.write_summary(&counter)?;
    preview.finish()?;

    Ok(ReplayReport { files: trimmed.len(), commits: counter.total(), live: args.live })
}
