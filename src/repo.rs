//! The repository handle: a single owned, open object database shared
//! read-only by every walker and cursor of one connection.

use std::path::{Path, PathBuf};
use std::rc::Rc;

use git2::Repository;

use crate::error::{Error, Result};

struct Inner {
    repo: Repository,
    path: PathBuf,
}

/// Cheaply cloneable handle around an open `git2::Repository`.
///
/// `git2::Repository` is neither `Copy` nor internally reference counted, so
/// sharing it across the many walkers a single scan may construct goes
/// through an `Rc`. Single-threaded use only (see `RegisterOptions` and the
/// crate-level docs on the concurrency model) — this is deliberately `Rc`,
/// not `Arc`.
#[derive(Clone)]
pub struct RepoHandle(Rc<Inner>);

impl RepoHandle {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let repo = Repository::open(path).map_err(|source| Error::NotARepository {
            path: path.display().to_string(),
            source,
        })?;
        log::info!("opened repository at {}", path.display());
        Ok(Self(Rc::new(Inner {
            repo,
            path: path.to_path_buf(),
        })))
    }

    pub fn inner(&self) -> &Repository {
        &self.0.repo
    }

    /// The path the repository was opened with, used by the CLI commit
    /// backend to invoke `git -C <path> log ...`.
    pub fn path(&self) -> &Path {
        &self.0.path
    }
}
