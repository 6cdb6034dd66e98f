//! `files` table (§4.6, §6: `git_tree`). `contents` is only read from the
//! object database when column 4 is actually requested (§4.9).

use std::os::raw::c_int;

use rusqlite::vtab::{
    sqlite3_vtab, sqlite3_vtab_cursor, Context, CreateVTab, IndexInfo, VTab, VTabConnection,
    VTabCursor, VTabKind, Values,
};

use crate::registry::RegisterOptions;
use crate::repo::RepoHandle;
use crate::vtab::commits::make_source;
use crate::vtab::{parse_repo_path, push_id_equality_constraint};
use crate::walk::{FileEntry, TreeWalker};

const SCHEMA: &str =
    "CREATE TABLE x(commit_id TEXT, tree_id TEXT, file_id TEXT, name TEXT, contents TEXT, executable BOOL)";

#[repr(C)]
pub struct FilesTab {
    base: sqlite3_vtab,
    repo: RepoHandle,
    opts: RegisterOptions,
}

unsafe impl<'vtab> VTab<'vtab> for FilesTab {
    type Aux = RegisterOptions;
    type Cursor = FilesCursor;

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
            FilesTab {
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
        Ok(FilesCursor {
            base: sqlite3_vtab_cursor::default(),
            walker: TreeWalker::new(self.repo.clone(), make_source(self.repo.clone(), &self.opts)),
            current: None,
            rowid: 0,
        })
    }
}

impl<'vtab> CreateVTab<'vtab> for FilesTab {
    const KIND: VTabKind = VTabKind::Default;
}

#[repr(C)]
pub struct FilesCursor {
    base: sqlite3_vtab_cursor,
    walker: TreeWalker,
    current: Option<FileEntry>,
    rowid: i64,
}

unsafe impl VTabCursor for FilesCursor {
    fn filter(&mut self, idx_num: c_int, _idx_str: Option<&str>, args: &Values<'_>) -> rusqlite::Result<()> {
        let seed = if idx_num == 1 {
            args.get::<String>(0).ok()
        } else {
            None
        };
        log::debug!("files cursor filter: seed={:?}", seed);
        self.walker.reset(seed.as_deref()).map_err(|e| {
            log::error!("tree walk aborted: {e}");
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
        let entry = match &self.current {
            Some(e) => e,
            None => return Ok(()),
        };
        match i {
            0 => ctx.set_result(&entry.commit_id),
            1 => ctx.set_result(&entry.tree_id),
            2 => ctx.set_result(&entry.file_id),
            3 => ctx.set_result(&entry.name),
            4 => {
                let bytes = self
                    .walker
                    .contents(&entry.file_id)
                    .map_err(Into::<rusqlite::Error>::into)?;
                ctx.set_result(&String::from_utf8_lossy(&bytes).into_owned())
            }
            5 => ctx.set_result(&entry.executable),
            _ => Ok(()),
        }
    }

    fn rowid(&self) -> rusqlite::Result<i64> {
        Ok(self.rowid)
    }
}
