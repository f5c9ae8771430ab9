// src/replay/group.rs

use super::inventory::TimestampLookup;
use super::module_path::{self, split_module_name};
use super::normalize::Normalizer;
use super::ReplayError;
use crate::model::{CommitGroup, FileRecord, GroupedFile, ModulePath};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::path::Path;

/// Buckets trimmed-tree files by (commit day, module), in ascending key order.
pub fn group_files(
    trimmed_root: &Path,
    records: &[FileRecord],
    lookup: &TimestampLookup,
    normalizer: &Normalizer,
) -> Result<Vec<CommitGroup>, ReplayError> {
    let mut buckets: BTreeMap<(NaiveDate, ModulePath), Vec<GroupedFile>> = BTreeMap::new();

    for record in records {
        let original = lookup.get(&record.relative_path).copied();
        let commit_date = normalizer
            .commit_date(original)
            .map_err(|source| ReplayError::Normalize { path: record.relative_path.clone(), source })?;
        let module = module_path::resolve(&record.relative_path);

        buckets.entry((commit_date.date_naive(), module)).or_default().push(GroupedFile {
            source: trimmed_root.join(&record.relative_path),
            relative: record.relative_path.clone(),
        });
    }

    Ok(buckets
        .into_iter()
        .map(|((date, module), files)| CommitGroup { date, module, files })
        .collect())
}

/// A group with its commit number and message
#[derive(Debug)]
pub struct PlannedCommit<'a> {
    pub group: &'a CommitGroup,
    pub number: u32,
    pub message: String,
}

impl<'a> PlannedCommit<'a> {
    pub fn new(group: &'a CommitGroup, number: u32) -> Self {
        let (code, name) = split_module_name(&group.module.module);
        let message = format!(
            "{code} - {name} ({year}) Commit #{number} - {count} files on {day}\nIncludes: {summary}",
            year = group.module.year,
            count = group.files.len(),
            day = group.date,
            summary = extension_summary(&group.files),
        );
        Self { group, number, message }
    }
}

/// `"2 .c, 1 .pdf"`: counts per lower-cased extension, sorted by extension.
pub fn extension_summary(files: &[GroupedFile]) -> String {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for file in files {
        let ext = file
            .relative
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
            .unwrap_or_else(|| "(none)".to_string());
        *counts.entry(ext).or_insert(0) += 1;
    }
    counts.iter().map(|(ext, n)| format!("{n} {ext}")).collect::<Vec<_>>().join(", ")
}
