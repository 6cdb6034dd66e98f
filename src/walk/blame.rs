//! Blame walker (§4.8). Iterates HEAD's tracked files; for each, blames it
//! line by line.
//!
//! Grounded on `blame_iter.go`, with one deliberate correction: the original
//! indexes hunk content with `lines[i + hunkLineOffset]`, where `i` is the
//! position within the current hunk rather than the file's running line
//! number — an off-by-one whenever a file has more than one hunk. This
//! walker instead tracks the actual 1-based file line and indexes
//! `lines[file_line - 1]` directly (flagged as an Open Question; see
//! DESIGN.md).
//!
//! `git2::Blame<'repo>` borrows the repository, which would make this struct
//! self-referential if a blame were held across `next()` calls. As with
//! `ObjectCommitWalker`, the fix is to drain eagerly: each file's blame is
//! fully walked into owned rows the moment the file is loaded.

use crate::error::{Error, Result};
use crate::repo::RepoHandle;

pub struct BlamedLine {
    pub file: String,
    pub line_no: usize,
    pub commit_id: String,
    pub content: String,
}

pub struct BlameWalker {
    repo: RepoHandle,
    files: std::vec::IntoIter<String>,
    pending: std::vec::IntoIter<BlamedLine>,
}

impl BlameWalker {
    pub fn new(repo: RepoHandle) -> Result<Self> {
        let files = Self::list_head_files(&repo)?;
        Ok(Self {
            repo,
            files: files.into_iter(),
            pending: Vec::new().into_iter(),
        })
    }

    /// Re-enumerates HEAD's tracked files and drops any partially-consumed
    /// file, matching the `filter` contract (§4.2): a cursor reused for a
    /// second scan must not return stale rows.
    pub fn reset(&mut self) -> Result<()> {
        let files = Self::list_head_files(&self.repo)?;
        self.files = files.into_iter();
        self.pending = Vec::new().into_iter();
        Ok(())
    }

    fn list_head_files(repo: &RepoHandle) -> Result<Vec<String>> {
        let head = repo.inner().head().map_err(Error::WalkError)?;
        let commit = head.peel_to_commit().map_err(Error::WalkError)?;
        let tree = commit.tree().map_err(Error::WalkError)?;

        let mut files = Vec::new();
        tree.walk(git2::TreeWalkMode::PreOrder, |root, entry| {
            if entry.kind() != Some(git2::ObjectType::Blob) {
                return git2::TreeWalkResult::Ok;
            }
            if let Some(name) = entry.name() {
                files.push(format!("{root}{name}"));
            }
            git2::TreeWalkResult::Ok
        })
        .map_err(Error::WalkError)?;
        Ok(files)
    }

    /// Blames one file end to end, producing every row it contributes.
    /// Empty files (or files git2 refuses to blame) produce zero rows.
    fn blame_file(&self, path: &str) -> Result<Vec<BlamedLine>> {
        let head = self.repo.inner().head().map_err(Error::WalkError)?;
        let commit = head.peel_to_commit().map_err(Error::WalkError)?;
        let tree = commit.tree().map_err(Error::WalkError)?;
        let entry = match tree.get_path(std::path::Path::new(path)) {
            Ok(e) => e,
            Err(_) => return Ok(Vec::new()),
        };
        let blob = match self.repo.inner().find_blob(entry.id()) {
            Ok(b) => b,
            Err(_) => return Ok(Vec::new()),
        };
        if blob.content().is_empty() {
            return Ok(Vec::new());
        }

        let text = String::from_utf8_lossy(blob.content()).into_owned();
        let lines: Vec<String> = text.split('\n').map(|s| s.to_string()).collect();

        let blame = match self.repo.inner().blame_file(std::path::Path::new(path), None) {
            Ok(b) => b,
            Err(_) => return Ok(Vec::new()),
        };

        let mut rows = Vec::new();
        let mut line_no = 1usize;
        loop {
            let hunk = match blame.get_line(line_no) {
                Some(h) => h,
                None => break, // invalid-line: file complete
            };
            let content = lines.get(line_no - 1).cloned().unwrap_or_default();
            rows.push(BlamedLine {
                file: path.to_string(),
                line_no,
                commit_id: hunk.orig_commit_id().to_string(),
                content,
            });
            line_no += 1;
        }
        Ok(rows)
    }

    pub fn next(&mut self) -> Result<Option<BlamedLine>> {
        loop {
            if let Some(row) = self.pending.next() {
                return Ok(Some(row));
            }
            match self.files.next() {
                Some(path) => {
                    let rows = self.blame_file(&path)?;
                    self.pending = rows.into_iter();
                }
                None => return Ok(None),
            }
        }
    }
}
