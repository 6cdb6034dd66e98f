//! `tags` table (§4.7, §6: `git_tag`). No constraint pushdown: the entire
//! ref list is cheap to enumerate up front.

use std::os::raw::c_int;

use rusqlite::vtab::{
    sqlite3_vtab, sqlite3_vtab_cursor, Context, CreateVTab, IndexInfo, VTab, VTabConnection,
    VTabCursor, VTabKind, Values,
};

use crate::repo::RepoHandle;
use crate::vtab::parse_repo_path;
use crate::walk::{Tag, TagWalker};

const SCHEMA: &str = "CREATE TABLE x(full_name TEXT, name TEXT, lightweight BOOL, target TEXT, tagger_name TEXT, tagger_email TEXT, message TEXT, target_type TEXT)";

#[repr(C)]
pub struct TagsTab {
    base: sqlite3_vtab,
    repo: RepoHandle,
}

unsafe impl<'vtab> VTab<'vtab> for TagsTab {
    type Aux = ();
    type Cursor = TagsCursor;

    fn connect(_db: &mut VTabConnection, _aux: Option<&Self::Aux>, args: &[&[u8]]) -> rusqlite::Result<(String, Self)> {
        let path = parse_repo_path(args)?;
        let repo = RepoHandle::open(&path)?;
        Ok((
            SCHEMA.to_string(),
            TagsTab {
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
        Ok(TagsCursor {
            base: sqlite3_vtab_cursor::default(),
            walker: TagWalker::new(self.repo.clone()).map_err(Into::<rusqlite::Error>::into)?,
            current: None,
            rowid: 0,
        })
    }
}

impl<'vtab> CreateVTab<'vtab> for TagsTab {
    const KIND: VTabKind = VTabKind::Default;
}

#[repr(C)]
pub struct TagsCursor {
    base: sqlite3_vtab_cursor,
    walker: TagWalker,
    current: Option<Tag>,
    rowid: i64,
}

unsafe impl VTabCursor for TagsCursor {
    fn filter(&mut self, _idx_num: c_int, _idx_str: Option<&str>, _args: &Values<'_>) -> rusqlite::Result<()> {
        log::debug!("tags cursor filter: full scan");
        self.walker.reset().map_err(|e| {
            log::error!("tags walk aborted: {e}");
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
        let tag = match &self.current {
            Some(t) => t,
            None => return Ok(()),
        };
        match i {
            0 => ctx.set_result(&tag.full_name),
            1 => ctx.set_result(&tag.name),
            2 => ctx.set_result(&tag.lightweight),
            3 => ctx.set_result(&tag.target),
            4 => ctx.set_result(&tag.tagger_name),
            5 => ctx.set_result(&tag.tagger_email),
            6 => ctx.set_result(&tag.message),
            7 => ctx.set_result(&tag.target_type),
            _ => Ok(()),
        }
    }

    fn rowid(&self) -> rusqlite::Result<i64> {
        Ok(self.rowid)
    }
}
