//! `branches` table (§4.7, §6: `git_branch`).

use std::os::raw::c_int;

use rusqlite::vtab::{
    sqlite3_vtab, sqlite3_vtab_cursor, Context, CreateVTab, IndexInfo, VTab, VTabConnection,
    VTabCursor, VTabKind, Values,
};

use crate::repo::RepoHandle;
use crate::vtab::parse_repo_path;
use crate::walk::{Branch, BranchWalker};

const SCHEMA: &str = "CREATE TABLE x(name TEXT, remote BOOL, target TEXT)";

#[repr(C)]
pub struct BranchesTab {
    base: sqlite3_vtab,
    repo: RepoHandle,
}

unsafe impl<'vtab> VTab<'vtab> for BranchesTab {
    type Aux = ();
    type Cursor = BranchesCursor;

    fn connect(_db: &mut VTabConnection, _aux: Option<&Self::Aux>, args: &[&[u8]]) -> rusqlite::Result<(String, Self)> {
        let path = parse_repo_path(args)?;
        let repo = RepoHandle::open(&path)?;
        Ok((
            SCHEMA.to_string(),
            BranchesTab {
                base: sqlite3_vtab::default(),
                repo,
            },
        ))
    }

    fn best_index(&self, info: &mut IndexInfo) -> rusqlite::Result<()> {
        info.set_estimated_cost(1_000_000.0);
        Ok(())
    }

    fn open(&'vtab self) -> rusqlite::Result<Self::Cursor> {
        Ok(BranchesCursor {
            base: sqlite3_vtab_cursor::default(),
            walker: BranchWalker::new(self.repo.clone()).map_err(Into::<rusqlite::Error>::into)?,
            current: None,
            rowid: 0,
        })
    }
}

impl<'vtab> CreateVTab<'vtab> for BranchesTab {
    const KIND: VTabKind = VTabKind::Default;
}

#[repr(C)]
pub struct BranchesCursor {
    base: sqlite3_vtab_cursor,
    walker: BranchWalker,
    current: Option<Branch>,
    rowid: i64,
}

unsafe impl VTabCursor for BranchesCursor {
    fn filter(&mut self, _idx_num: c_int, _idx_str: Option<&str>, _args: &Values<'_>) -> rusqlite::Result<()> {
        log::debug!("branches cursor filter: full scan");
        self.walker.reset().map_err(|e| {
            log::error!("branches walk aborted: {e}");
            rusqlite::Error::from(e)
        })?;
        self.rowid = 0;
        self.current = self.walker.next();
        Ok(())
    }

    fn next(&mut self) -> rusqlite::Result<()> {
        self.rowid += 1;
        self.current = self.walker.next();
        Ok(())
    }

    fn eof(&self) -> bool {
        self.current.is_none()
    }

    fn column(&mut self, ctx: &mut Context, i: c_int) -> rusqlite::Result<()> {
        let branch = match &self.current {
            Some(b) => b,
            None => return Ok(()),
        };
        match i {
            0 => ctx.set_result(&branch.name),
            1 => ctx.set_result(&branch.remote),
            2 => ctx.set_result(&branch.target),
            _ => Ok(()),
        }
    }

    fn rowid(&self) -> rusqlite::Result<i64> {
        Ok(self.rowid)
    }
}
