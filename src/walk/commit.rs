//! Shared commit/stat row types, the `CommitSource` abstraction both commit
//! backends implement, and the in-process (`git2::Revwalk`) backend.

use std::cell::RefCell;

use chrono::{DateTime, FixedOffset, TimeZone};
use git2::{Oid, Repository, Sort, Time};

use crate::error::{Error, Result};
use crate::repo::RepoHandle;

#[derive(Debug, Clone)]
pub struct Commit {
    pub id: String,
    pub message: Option<String>,
    pub summary: Option<String>,
    pub author_name: Option<String>,
    pub author_email: Option<String>,
    pub author_when: DateTime<FixedOffset>,
    pub committer_name: Option<String>,
    pub committer_email: Option<String>,
    pub committer_when: DateTime<FixedOffset>,
    pub parent_id: Option<String>,
    pub parent_count: usize,
    pub tree_id: String,
}

#[derive(Debug, Clone)]
pub struct Stat {
    pub file: String,
    pub additions: i64,
    pub deletions: i64,
}

/// Abstracts over the two commit backends (§4.3/§4.4 of the spec): an
/// in-process `git2::Revwalk` and a spawned `git log` process. The cursor
/// holding one of these is polymorphic over the choice, selected once at
/// `CREATE VIRTUAL TABLE` time (see `registry::RegisterOptions`).
pub trait CommitSource {
    /// Reset the walker. `seed`, when present, is a pushed-down equality
    /// constraint on `commits.id`: the walker should produce at most that
    /// one commit rather than the full history. An unknown SHA is an empty
    /// scan, not an error (`Error::NoSuchObject`, §7).
    fn reset(&mut self, seed: Option<&str>) -> Result<()>;

    fn next(&mut self) -> Result<Option<Commit>>;

    /// Diff stats for the commit most recently returned by `next`, computed
    /// (or, for the CLI backend, merely handed back) lazily — only called
    /// when a query actually references `additions`/`deletions` or scans
    /// `stats`. `Ok(None)` means the diff could not be computed
    /// (`Error::DiffError`), which §7 requires to surface as SQL NULL,
    /// distinct from `Ok(Some(vec![]))` (a commit with no file changes, e.g.
    /// a root commit).
    fn stats_for_current(&mut self) -> Result<Option<Vec<Stat>>>;
}

pub(crate) fn time_to_datetime(t: Time) -> DateTime<FixedOffset> {
    let offset =
        FixedOffset::east_opt(t.offset_minutes() * 60).unwrap_or_else(|| FixedOffset::east_opt(0).unwrap());
    offset
        .timestamp_opt(t.seconds(), 0)
        .single()
        .unwrap_or_else(|| offset.timestamp_opt(0, 0).unwrap())
}

/// First non-blank line of a commit message. `git2::Commit::summary()` does
/// this for the object-graph backend directly; the CLI backend has no
/// `git2::Commit` to ask and reimplements this over the parsed message text.
pub(crate) fn summary_of(message: &str) -> Option<String> {
    message
        .lines()
        .find(|line| !line.trim().is_empty())
        .map(|line| line.to_string())
}

fn commit_from_git2(c: &git2::Commit) -> Commit {
    let author = c.author();
    let committer = c.committer();
    Commit {
        id: c.id().to_string(),
        message: c.message().map(|s| s.to_string()),
        summary: c.summary().map(|s| s.to_string()),
        author_name: author.name().map(|s| s.to_string()),
        author_email: author.email().map(|s| s.to_string()),
        author_when: time_to_datetime(author.when()),
        committer_name: committer.name().map(|s| s.to_string()),
        committer_email: committer.email().map(|s| s.to_string()),
        committer_when: time_to_datetime(committer.when()),
        parent_id: c.parent_id(0).ok().map(|o| o.to_string()),
        parent_count: c.parent_count(),
        tree_id: c.tree_id().to_string(),
    }
}

/// Sums of a commit's diff against its first parent only (§3 invariant: for
/// a merge commit, stats are reported against the first parent only). A
/// root commit (no parents) has no stats at all, matching the boundary
/// behavior in §8 (`additions = deletions = 0`), not a diff against an
/// empty tree.
fn compute_stats(repo: &Repository, commit: &git2::Commit) -> Result<Vec<Stat>> {
    if commit.parent_count() == 0 {
        return Ok(Vec::new());
    }
    let tree = commit.tree().map_err(Error::DiffError)?;
    let parent = commit.parent(0).map_err(Error::DiffError)?;
    let parent_tree = parent.tree().map_err(Error::DiffError)?;

    let mut opts = git2::DiffOptions::new();
    let diff = repo
        .diff_tree_to_tree(Some(&parent_tree), Some(&tree), Some(&mut opts))
        .map_err(Error::DiffError)?;

    let mut stats = Vec::new();
    for idx in 0..diff.deltas().len() {
        let delta = diff.get_delta(idx).expect("delta index in range");
        let path = delta
            .new_file()
            .path()
            .or_else(|| delta.old_file().path())
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();

        match git2::Patch::from_diff(&diff, idx) {
            Ok(Some(patch)) => {
                let (_context, additions, deletions) = patch.line_stats().map_err(Error::DiffError)?;
                stats.push(Stat {
                    file: path,
                    additions: additions as i64,
                    deletions: deletions as i64,
                });
            }
            // binary files carry a delta but no line-oriented patch
            Ok(None) => stats.push(Stat {
                file: path,
                additions: 0,
                deletions: 0,
            }),
            Err(e) => return Err(Error::DiffError(e)),
        }
    }
    Ok(stats)
}

/// Object-graph commit walker backed by `git2::Revwalk`.
///
/// `Revwalk<'a>` borrows its `Repository`, which would make it
/// self-referential alongside the `RepoHandle` this struct also holds. To
/// avoid that (and the unsafe lifetime games it implies), `reset` drains the
/// revwalk into an owned `Vec<Oid>` up front rather than holding the
/// `Revwalk` across calls. Per-row materialization (message, author, diff
/// stats) still happens lazily in `next`/`stats_for_current`, which is where
/// the laziness actually matters for correctness and performance (§9).
pub struct ObjectCommitWalker {
    repo: RepoHandle,
    oids: Vec<Oid>,
    pos: usize,
    current: Option<Oid>,
    stats_cache: RefCell<Option<(Oid, Option<Vec<Stat>>)>>,
    /// §7: a `DiffError` is logged at most once per scan, not once per row.
    diff_error_warned: bool,
}

impl ObjectCommitWalker {
    pub fn new(repo: RepoHandle) -> Self {
        Self {
            repo,
            oids: Vec::new(),
            pos: 0,
            current: None,
            stats_cache: RefCell::new(None),
            diff_error_warned: false,
        }
    }
}

impl CommitSource for ObjectCommitWalker {
    fn reset(&mut self, seed: Option<&str>) -> Result<()> {
        self.pos = 0;
        self.current = None;
        self.diff_error_warned = false;
        *self.stats_cache.borrow_mut() = None;

        match seed {
            Some(sha) => match Oid::from_str(sha) {
                Ok(oid) if self.repo.inner().find_commit(oid).is_ok() => {
                    self.oids = vec![oid];
                }
                _ => {
                    log::debug!("{}", Error::NoSuchObject(sha.to_string()));
                    self.oids = Vec::new();
                }
            },
            None => {
                let mut walk = self.repo.inner().revwalk().map_err(Error::WalkError)?;
                walk.push_head().map_err(Error::WalkError)?;
                walk.set_sorting(Sort::TIME).map_err(Error::WalkError)?;
                self.oids = walk.filter_map(|r| r.ok()).collect();
            }
        }
        Ok(())
    }

    fn next(&mut self) -> Result<Option<Commit>> {
        if self.pos >= self.oids.len() {
            self.current = None;
            return Ok(None);
        }
        let oid = self.oids[self.pos];
        self.pos += 1;
        self.current = Some(oid);
        let commit = self.repo.inner().find_commit(oid).map_err(Error::WalkError)?;
        Ok(Some(commit_from_git2(&commit)))
    }

    fn stats_for_current(&mut self) -> Result<Option<Vec<Stat>>> {
        let oid = match self.current {
            Some(oid) => oid,
            None => return Ok(Some(Vec::new())),
        };
        if let Some((cached_oid, stats)) = self.stats_cache.borrow().as_ref() {
            if *cached_oid == oid {
                return Ok(stats.clone());
            }
        }
        let commit = self.repo.inner().find_commit(oid).map_err(Error::WalkError)?;
        let stats = match compute_stats(self.repo.inner(), &commit) {
            Ok(stats) => Some(stats),
            Err(e) => {
                if !self.diff_error_warned {
                    log::warn!("diff computation failed for {}: {} (further diff errors this scan are suppressed)", oid, e);
                    self.diff_error_warned = true;
                }
                None
            }
        };
        *self.stats_cache.borrow_mut() = Some((oid, stats.clone()));
        Ok(stats)
    }
}
