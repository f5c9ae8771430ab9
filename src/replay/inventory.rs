// src/replay/inventory.rs

use crate::model::FileRecord;
use chrono::{DateTime, Utc};
use indicatif::{ParallelProgressIterator, ProgressBar};
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("source path does not exist: {0}")]
    NotFound(PathBuf),

    #[error("source path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("filesystem walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("cannot read modification time of {path}: {source}")]
    Metadata {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Modification times of the original tree, keyed by relative path
pub type TimestampLookup = HashMap<PathBuf, DateTime<Utc>>;

/// Walks `root` and records every regular file with its modification time.
///
/// Entries come back in walk order (sorted by file name at each level), so
/// repeated runs over the same tree group and emit identically.
pub fn inventory(root: &Path) -> Result<Vec<FileRecord>, InventoryError> {
    if !root.exists() {
        return Err(InventoryError::NotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(InventoryError::NotADirectory(root.to_path_buf()));
    }

    let mut paths = Vec::new();
    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() {
            paths.push(entry.into_path());
        }
    }

    let bar = ProgressBar::new(paths.len() as u64);
    bar.set_message(format!("Reading {}", root.display()));

    // stat calls are independent; collect keeps walk order
    let records = paths
        .par_iter()
        .progress_with(bar.clone())
        .map(|path| {
            let modified = path
                .metadata()
                .and_then(|meta| meta.modified())
                .map_err(|source| InventoryError::Metadata { path: path.clone(), source })?;
            let relative_path = path.strip_prefix(root).unwrap_or(path).to_path_buf();
            Ok(FileRecord { relative_path, modified: DateTime::<Utc>::from(modified) })
        })
        .collect::<Result<Vec<_>, InventoryError>>()?;

    bar.finish_with_message(format!("{} files in {}", records.len(), root.display()));
    tracing::debug!(root = %root.display(), files = records.len(), "inventory complete");
    Ok(records)
}

pub fn lookup(records: &[FileRecord]) -> TimestampLookup {
    records.iter().map(|r| (r.relative_path.clone(), r.modified)).collect()
}
