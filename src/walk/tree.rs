//! Tree walker (§4.6): for each commit, a pre-order walk of its root tree
//! yielding one row per blob. Grounded on the teacher's own `Tree::walk`
//! usage in `main.rs` (site-generation pass over a tree), generalized here
//! to run once per commit rather than once over HEAD.

use crate::error::{Error, Result};
use crate::repo::RepoHandle;
use crate::walk::commit::{Commit, CommitSource};

pub struct FileEntry {
    pub commit_id: String,
    pub tree_id: String,
    pub file_id: String,
    pub name: String,
    pub executable: bool,
}

struct Blob {
    file_id: git2::Oid,
    name: String,
    executable: bool,
}

pub struct TreeWalker {
    repo: RepoHandle,
    source: Box<dyn CommitSource>,
    current_commit: Option<Commit>,
    pending: std::vec::IntoIter<Blob>,
}

impl TreeWalker {
    pub fn new(repo: RepoHandle, source: Box<dyn CommitSource>) -> Self {
        Self {
            repo,
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

    fn blobs_of(&self, commit: &Commit) -> Result<Vec<Blob>> {
        let oid = git2::Oid::from_str(&commit.tree_id).map_err(Error::WalkError)?;
        let tree = self.repo.inner().find_tree(oid).map_err(Error::WalkError)?;

        let mut blobs = Vec::new();
        tree.walk(git2::TreeWalkMode::PreOrder, |root, entry| {
            if entry.kind() != Some(git2::ObjectType::Blob) {
                return git2::TreeWalkResult::Ok;
            }
            let name = match entry.name() {
                Some(n) => format!("{root}{n}"),
                None => return git2::TreeWalkResult::Ok,
            };
            let executable = entry.filemode() & 0o111 != 0;
            blobs.push(Blob {
                file_id: entry.id(),
                name,
                executable,
            });
            git2::TreeWalkResult::Ok
        })
        .map_err(Error::WalkError)?;
        Ok(blobs)
    }

    pub fn next(&mut self) -> Result<Option<FileEntry>> {
        loop {
            if let Some(blob) = self.pending.next() {
                let commit = self
                    .current_commit
                    .as_ref()
                    .expect("pending blobs only set alongside current_commit");
                return Ok(Some(FileEntry {
                    commit_id: commit.id.clone(),
                    tree_id: commit.tree_id.clone(),
                    file_id: blob.file_id.to_string(),
                    name: blob.name,
                    executable: blob.executable,
                }));
            }

            match self.source.next()? {
                Some(commit) => {
                    let blobs = self.blobs_of(&commit)?;
                    self.current_commit = Some(commit);
                    self.pending = blobs.into_iter();
                }
                None => {
                    self.current_commit = None;
                    return Ok(None);
                }
            }
        }
    }

    /// Lazily fetches a blob's contents; only invoked by the cursor when the
    /// `contents` column is actually requested (§4.9 lazy materialization).
    pub fn contents(&self, file_id: &str) -> Result<Vec<u8>> {
        let oid = git2::Oid::from_str(file_id).map_err(Error::WalkError)?;
        let blob = self.repo.inner().find_blob(oid).map_err(Error::WalkError)?;
        Ok(blob.content().to_vec())
    }
}
