//! `stats` table (§4.5, §6: `git_stats`).

use std::os::raw::c_int;

use rusqlite::vtab::{
    sqlite3_vtab, sqlite3_vtab_cursor, Context, CreateVTab, IndexInfo, VTab, VTabConnection,
    VTabCursor, VTabKind, Values,
};

use crate::registry::RegisterOptions;
use crate::repo::RepoHandle;
use crate::vtab::{parse_repo_path, push_id_equality_constraint};
use crate::vtab::commits::make_source;
use crate::walk::{StatRow, StatsWalker};

const SCHEMA: &str = "CREATE TABLE x(commit_id TEXT, file TEXT, additions INT, deletions INT)";

#[repr(C)]
pub struct StatsTab {
    base: sqlite3_vtab,
    repo: RepoHandle,
    opts: RegisterOptions,
}

unsafe impl<'vtab> VTab<'vtab> for StatsTab {
    type Aux = RegisterOptions;
    type Cursor = StatsCursor;

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
            StatsTab {
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
        Ok(StatsCursor {
            base: sqlite3_vtab_cursor::default(),
            walker: StatsWalker::new(make_source(self.repo.clone(), &self.opts)),
            current: None,
            rowid: 0,
        })
    }
}

impl<'vtab> CreateVTab<'vtab> for StatsTab {
    const KIND: VTabKind = VTabKind::Default;
}

#[repr(C)]
pub struct StatsCursor {
    base: sqlite3_vtab_cursor,
    walker: StatsWalker,
    current: Option<StatRow>,
    rowid: i64,
}

unsafe impl VTabCursor for StatsCursor {
    fn filter(&mut self, idx_num: c_int, _idx_str: Option<&str>, args: &Values<'_>) -> rusqlite::Result<()> {
        let seed = if idx_num == 1 {
            args.get::<String>(0).ok()
        } else {
            None
        };
        log::debug!("stats cursor filter: seed={:?}", seed);
        self.walker.reset(seed.as_deref()).map_err(|e| {
            log::error!("stats walk aborted: {e}");
            rusqlite::Error::from(e)
        })?;
        self.rowid = 0;
        self.current = self.walker.next().map_err(Into::<rusqlite::Error>::into)?;
        Ok(())
    }

    fn next(&mut self) -> rusqlite::Result<()> {
        self.rowid += 1;
        self.current = self.walker.next().map_err(Into::<rusqlite::Error>::into)?;
        Ok(())
    }

    fn eof(&self) -> bool {
        self.current.is_none()
    }

    fn column(&mut self, ctx: &mut Context, i: c_int) -> rusqlite::Result<()> {
        let row = match &self.current {
            Some(r) => r,
            None => return Ok(()),
        };
        match i {
            0 => ctx.set_result(&row.commit_id),
            1 => ctx.set_result(&row.file),
            2 => ctx.set_result(&row.additions),
            3 => ctx.set_result(&row.deletions),
            _ => Ok(()),
        }
    }

    fn rowid(&self) -> rusqlite::Result<i64> {
        Ok(self.rowid)
    }
}
