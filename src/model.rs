// src/model.rs

use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// A file found on disk, relative to the tree it was walked from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub relative_path: PathBuf,
    pub modified: DateTime<Utc>,
}

/// The `Year N` folder and the module folder beneath it
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModulePath {
    pub year: String,
    pub module: String,
}

impl fmt::Display for ModulePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.year, self.module)
    }
}

/// A trimmed-tree file assigned to a commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupedFile {
    pub source: PathBuf,
    pub relative: PathBuf,
}

/// All files sharing one (day, module) key
#[derive(Debug, Clone)]
pub struct CommitGroup {
    pub date: NaiveDate,
    pub module: ModulePath,
    pub files: Vec<GroupedFile>,
}

/// Running commit numbers per (year, module)
#[derive(Debug, Default)]
pub struct ModuleCommitCounter {
    counts: BTreeMap<ModulePath, u32>,
}

impl ModuleCommitCounter {
    /// Bumps the count for `module` and returns the new commit number.
    pub fn next(&mut self, module: &ModulePath) -> u32 {
        let count = self.counts.entry(module.clone()).or_insert(0);
        *count += 1;
        *count
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ModulePath, u32)> {
        self.counts.iter().map(|(module, &count)| (module, count))
    }

    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }
}

/// What a replay run produced
#[derive(Debug)]
pub struct ReplayReport {
    pub files: usize,
    pub commits: u32,
    pub live: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(year: &str, name: &str) -> ModulePath {
        ModulePath { year: year.into(), module: name.into() }
    }

    #[test]
    fn counter_numbers_each_module_independently() {
        let mut counter = ModuleCommitCounter::default();
        let a = module("Year 1", "CS101 - Intro");
        let b = module("Year 2", "CS201 - Algorithms");

        assert_eq!(counter.next(&a), 1);
        assert_eq!(counter.next(&b), 1);
        assert_eq!(counter.next(&a), 2);
        assert_eq!(counter.total(), 3);

        let rows: Vec<_> = counter.iter().collect();
        assert_eq!(rows, vec![(&a, 2), (&b, 1)]);
    }
}
