// src/replay/commit.rs

use super::group::PlannedCommit;
use super::ReplayError;
use chrono::{NaiveDateTime, NaiveTime};
use filetime::FileTime;
use git2::{Commit, ErrorCode, Oid, Repository, Signature, Time};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Copies grouped files into a work tree and commits them with backdated signatures.
pub struct LiveCommitter {
    repo: Repository,
    workdir: PathBuf,
    push: bool,
}

impl LiveCommitter {
    pub fn open(path: &Path, push: bool) -> Result<Self, ReplayError> {
        let repo = Repository::open(path)?;
        let workdir = repo.workdir().ok_or_else(|| ReplayError::BareRepository(path.to_path_buf()))?.to_path_buf();
        if push {
            ensure_git_available()?;
        }
        tracing::info!(repo = %workdir.display(), push, "live mode: commits will be written");
        Ok(Self { repo, workdir, push })
    }

    pub fn commit(&self, planned: &PlannedCommit<'_>) -> Result<Oid, ReplayError> {
        let mut index = self.repo.index()?;
        for file in &planned.group.files {
            let target = self.workdir.join(&file.relative);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|source| ReplayError::io(parent, source))?;
            }
            if !target.exists() {
                copy_preserving_mtime(&file.source, &target)?;
            }
            index.add_path(&file.relative)?;
        }
        index.write()?;
        let tree = self.repo.find_tree(index.write_tree()?)?;

        let when = NaiveDateTime::new(planned.group.date, NaiveTime::MIN).and_utc().timestamp();
        let identity = self.repo.signature()?;
        let signature = Signature::new(
            identity.name().unwrap_or("xport"),
            identity.email().unwrap_or("xport@localhost"),
            &Time::new(when, 0),
        )?;

        let parent = self.head_commit()?;
        let parents: Vec<&Commit> = parent.iter().collect();
        let oid = self.repo.commit(Some("HEAD"), &signature, &signature, &planned.message, &tree, &parents)?;
        tracing::info!(%oid, module = %planned.group.module, number = planned.number, day = %planned.group.date, "committed");

        if self.push {
            self.push_head()?;
        }
        Ok(oid)
    }

    fn head_commit(&self) -> Result<Option<Commit<'_>>, ReplayError> {
        match self.repo.head() {
            Ok(head) => Ok(Some(head.peel_to_commit()?)),
            Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn push_head(&self) -> Result<(), ReplayError> {
        let status = Command::new("git")
            .arg("push")
            .current_dir(&self.workdir)
            .status()
            .map_err(|source| ReplayError::io(Path::new("git"), source))?;
        if !status.success() {
            return Err(ReplayError::Push(status.to_string()));
        }
        Ok(())
    }
}

fn copy_preserving_mtime(source: &Path, target: &Path) -> Result<(), ReplayError> {
    fs::copy(source, target).map_err(|e| ReplayError::io(source, e))?;
    let meta = fs::metadata(source).map_err(|e| ReplayError::io(source, e))?;
    filetime::set_file_mtime(target, FileTime::from_last_modification_time(&meta))
        .map_err(|e| ReplayError::io(target, e))
}

fn ensure_git_available() -> Result<(), ReplayError> {
    let output = Command::new("git")
        .arg("--version")
        .output()
        .map_err(|source| ReplayError::io(Path::new("git"), source))?;
    if !output.status.success() {
        return Err(ReplayError::Push("git --version failed; is git on PATH?".to_string()));
    }
    Ok(())
}
