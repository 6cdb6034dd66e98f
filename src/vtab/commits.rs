//! `commits` table (§4.3/§4.4/§4.9), registered under both `git_log` and
//! `git_log_cli` (§6) — the same `VTab` type, differing only in the
//! `RegisterOptions::prefer_cli` flag carried in `Aux` (mirrors the
//! original's `ensureTables` choosing between the two by `git` availability,
//! but here both module names are always registered and the caller picks).

use std::os::raw::c_int;

use rusqlite::vtab::{
    sqlite3_vtab, sqlite3_vtab_cursor, Context, CreateVTab, IndexInfo, VTab, VTabConnection,
    VTabCursor, VTabKind, Values,
};

use crate::registry::RegisterOptions;
use crate::repo::RepoHandle;
use crate::util::resolve_executable;
use crate::vtab::{parse_repo_path, push_id_equality_constraint};
use crate::walk::{CliCommitWalker, Commit, CommitSource, ObjectCommitWalker};

const SCHEMA: &str = "CREATE TABLE x(
    id TEXT,
    message TEXT,
    summary TEXT,
    author_name TEXT,
    author_email TEXT,
    author_when DATETIME,
    committer_name TEXT,
    committer_email TEXT,
    committer_when DATETIME,
    parent_id TEXT,
    parent_count INT,
    tree_id TEXT,
    additions INT,
    deletions INT
)";

#[repr(C)]
pub struct CommitsTab {
    base: sqlite3_vtab,
    repo: RepoHandle,
    opts: RegisterOptions,
}

pub(crate) fn make_source(repo: RepoHandle, opts: &RegisterOptions) -> Box<dyn CommitSource> {
    if opts.prefer_cli {
        if let Some(git) = opts
            .git_binary
            .clone()
            .or_else(|| resolve_executable("git").map(|p| p.to_string_lossy().into_owned()))
        {
            log::debug!("commits table using CLI backend ({git})");
            return Box::new(CliCommitWalker::new(
                repo.path().to_path_buf(),
                git,
            ));
        }
        log::warn!("git executable not found on PATH, falling back to object-graph backend");
    }
    Box::new(ObjectCommitWalker::new(repo))
}

unsafe impl<'vtab> VTab<'vtab> for CommitsTab {
    type Aux = RegisterOptions;
    type Cursor = CommitsCursor;

    fn connect(
        _db: &mut VTabConnection,
        aux: Option<&Self::Aux>,
        args: &[&[u8]],
    ) -> rusqlite::Result<(String, Self)> {
        let path = parse_repo_path(args)?;
        let repo = RepoHandle::open(&path)?;
        let opts = aux.cloned().unwrap_or_default();
        Ok((
            SCHEMA.to_string(),
            CommitsTab {
                base: sqlite3_vtab::default(),
                repo,
                opts,
            },
        ))
    }

    fn best_index(&self, info: &mut IndexInfo) -> rusqlite::Result<()> {
        push_id_equality_constraint(info, 0)
    }

    fn open(&'vtab self) -> rusqlite::Result<Self::Cursor> {
        Ok(CommitsCursor {
            base: sqlite3_vtab_cursor::default(),
            source: make_source(self.repo.clone(), &self.opts),
            current: None,
            stats_cache: None,
            rowid: 0,
        })
    }
}

impl<'vtab> CreateVTab<'vtab> for CommitsTab {
    const KIND: VTabKind = VTabKind::Default;
}

#[repr(C)]
pub struct CommitsCursor {
    base: sqlite3_vtab_cursor,
    source: Box<dyn CommitSource>,
    current: Option<Commit>,
    stats_cache: Option<Option<(i64, i64)>>,
    rowid: i64,
}

impl CommitsCursor {
    /// `None` means the diff against the first parent failed
    /// (`Error::DiffError`), which §7 requires to surface as SQL NULL rather
    /// than as indistinguishable zero stats.
    fn stats(&mut self) -> rusqlite::Result<Option<(i64, i64)>> {
        if let Some(sums) = self.stats_cache {
            return Ok(sums);
        }
        let stats = self.source.stats_for_current().map_err(Into::<rusqlite::Error>::into)?;
        let sums = stats.map(|stats| {
            stats
                .iter()
                .fold((0i64, 0i64), |(a, d), s| (a + s.additions, d + s.deletions))
        });
        self.stats_cache = Some(sums);
        Ok(sums)
    }
}

unsafe impl VTabCursor for CommitsCursor {
    fn filter(&mut self, idx_num: c_int, _idx_str: Option<&str>, args: &Values<'_>) -> rusqlite::Result<()> {
        let seed = if idx_num == 1 {
            args.get::<String>(0).ok()
        } else {
            None
        };
        log::debug!("commits cursor filter: seed={:?}", seed);
        self.source.reset(seed.as_deref()).map_err(|e| {
            log::error!("commits walk aborted: {e}");
            rusqlite::Error::from(e)
        })?;
        self.rowid = 0;
        self.stats_cache = None;
        self.current = self.source.next().map_err(Into::<rusqlite::Error>::into)?;
        Ok(())
    }

    fn next(&mut self) -> rusqlite::Result<()> {
        self.rowid += 1;
        self.stats_cache = None;
        self.current = self.source.next().map_err(|e| {
            log::error!("commits walk aborted: {e}");
            rusqlite::Error::from(e)
        })?;
        Ok(())
    }

    fn eof(&self) -> bool {
        self.current.is_none()
    }

    fn column(&mut self, ctx: &mut Context, i: c_int) -> rusqlite::Result<()> {
        let commit = match &self.current {
            Some(c) => c,
            None => return Ok(()),
        };
        match i {
            0 => ctx.set_result(&commit.id),
            1 => ctx.set_result(&commit.message),
            2 => ctx.set_result(&commit.summary),
            3 => ctx.set_result(&commit.author_name),
            4 => ctx.set_result(&commit.author_email),
            5 => ctx.set_result(&commit.author_when.to_rfc3339()),
            6 => ctx.set_result(&commit.committer_name),
            7 => ctx.set_result(&commit.committer_email),
            8 => ctx.set_result(&commit.committer_when.to_rfc3339()),
            9 => ctx.set_result(&commit.parent_id),
            10 => ctx.set_result(&(commit.parent_count as i64)),
            11 => ctx.set_result(&commit.tree_id),
            12 => {
                let sums = self.stats()?;
                ctx.set_result(&sums.map(|(additions, _)| additions))
            }
            13 => {
                let sums = self.stats()?;
                ctx.set_result(&sums.map(|(_, deletions)| deletions))
            }
            _ => Ok(()),
        }
    }

    fn rowid(&self) -> rusqlite::Result<i64> {
        Ok(self.rowid)
    }
}

