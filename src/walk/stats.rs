//! Per-file diff stats, flattened out of the commit walker's lazy
//! `stats_for_current` (§4.5). Grounded on the original's `git_stats_cli.go`
//! `StatsCLICursor`, which recurses to the next commit whenever the current
//! one has no file stats rather than returning an empty row.

use crate::error::Result;
use crate::walk::commit::{Commit, CommitSource, Stat};

pub struct StatRow {
    pub commit_id: String,
    pub file: String,
    pub additions: i64,
    pub deletions: i64,
}

pub struct StatsWalker {
    source: Box<dyn CommitSource>,
    current_commit: Option<Commit>,
    pending: std::vec::IntoIter<Stat>,
}

impl StatsWalker {
    pub fn new(source: Box<dyn CommitSource>) -> Self {
        Self {
            source,
            current_commit: None,
            pending: Vec::new().into_iter(),
        }
    }

    pub fn reset(&mut self, seed: Option<&str>) -> Result<()> {
        self.source.reset(seed)?;
        self.current_commit = None;
        self.pending = Vec::new().into_iter();
        Ok(())
    }

    /// Advances to the next `(commit, file)` pair, skipping over commits
    /// with zero file stats (root commits, empty merges) instead of
    /// emitting a placeholder row for them.
    pub fn next(&mut self) -> Result<Option<StatRow>> {
        loop {
            if let Some(stat) = self.pending.next() {
                let commit_id = self
                    .current_commit
                    .as_ref()
                    .expect("pending stats only set alongside current_commit")
                    .id
                    .clone();
                return Ok(Some(StatRow {
                    commit_id,
                    file: stat.file,
                    additions: stat.additions,
                    deletions: stat.deletions,
                }));
            }

            match self.source.next()? {
                Some(commit) => {
                    // A DiffError (`None`) has nothing to attach a `file`
                    // column to here, so it's treated the same as a commit
                    // with zero file stats: skipped, not emitted as a row.
                    let stats = self.source.stats_for_current()?.unwrap_or_default();
                    self.current_commit = Some(commit);
                    self.pending = stats.into_iter();
                }
                None => {
                    self.current_commit = None;
                    return Ok(None);
                }
            }
        }
    }
}
