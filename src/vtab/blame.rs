//! `blame` table (§4.8, §6: `git_blame`). Schema fixed by §6:
//! `line_no INT, file TEXT, commit_id TEXT, line_contents TEXT`.

use std::os::raw::c_int;

use rusqlite::vtab::{
    sqlite3_vtab, sqlite3_vtab_cursor, Context, CreateVTab, IndexInfo, VTab, VTabConnection,
    VTabCursor, VTabKind, Values,
};

use crate::repo::RepoHandle;
use crate::vtab::parse_repo_path;
use crate::walk::{BlameWalker, BlamedLine};

const SCHEMA: &str = "CREATE TABLE x(line_no INT, file TEXT, commit_id TEXT, line_contents TEXT)";

#[repr(C)]
pub struct BlameTab {
    base: sqlite3_vtab,
    repo: RepoHandle,
}

unsafe impl<'vtab> VTab<'vtab> for BlameTab {
    type Aux = ();
    type Cursor = BlameCursor;

    fn connect(_db: &mut VTabConnection, _aux: Option<&Self::Aux>, args: &[&[u8]]) -> rusqlite::Result<(String, Self)> {
        let path = parse_repo_path(args)?;
        let repo = RepoHandle::open(&path)?;
        Ok((
            SCHEMA.to_string(),
            BlameTab {
                base: sqlite3_vtab::default(),
                repo,
            },
        ))
    }

    fn best_index(&self, info: &mut IndexInfo) -> rusqlite::Result<()> {
        info.set_estimated_cost(10_000_000.0);
        Ok(())
    }

    fn open(&'vtab self) -> rusqlite::Result<Self::Cursor> {
        Ok(BlameCursor {
            base: sqlite3_vtab_cursor::default(),
            walker: BlameWalker::new(self.repo.clone()).map_err(Into::<rusqlite::Error>::into)?,
            current: None,
            rowid: 0,
        })
    }
}

impl<'vtab> CreateVTab<'vtab> for BlameTab {
    const KIND: VTabKind = VTabKind::Default;
}

#[repr(C)]
pub struct BlameCursor {
    base: sqlite3_vtab_cursor,
    walker: BlameWalker,
    current: Option<BlamedLine>,
    rowid: i64,
}

unsafe impl VTabCursor for BlameCursor {
    fn filter(&mut self, _idx_num: c_int, _idx_str: Option<&str>, _args: &Values<'_>) -> rusqlite::Result<()> {
        log::debug!("blame cursor filter: full scan");
        self.walker.reset().map_err(|e| {
            log::error!("blame walk aborted: {e}");
            rusqlite::Error::from(e)
        })?;
        self.rowid = 0;
        self.current = self.walker.next().map_err(|e| {
            log::error!("blame walk aborted: {e}");
            rusqlite::Error::from(e)
        })?;
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
        let line = match &self.current {
            Some(l) => l,
            None => return Ok(()),
        };
        match i {
            0 => ctx.set_result(&(line.line_no as i64)),
            1 => ctx.set_result(&line.file),
            2 => ctx.set_result(&line.commit_id),
            3 => ctx.set_result(&line.content),
            _ => Ok(()),
        }
    }

    fn rowid(&self) -> rusqlite::Result<i64> {
        Ok(self.rowid)
    }
}
