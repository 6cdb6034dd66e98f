//! Error taxonomy for the engine. Every fallible operation returns [`Error`];
//! the vtab boundary (`column`/`filter`/`next`/`connect`) converts it to
//! `rusqlite::Error::ModuleError` via the `From` impl below.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{path} is not a git repository: {source}")]
    NotARepository { path: String, source: git2::Error },

    #[error("walk failed: {0}")]
    WalkError(#[from] git2::Error),

    #[error("object not found: {0}")]
    NoSuchObject(String),

    #[error("diff computation failed: {0}")]
    DiffError(git2::Error),

    #[error("git CLI failed: {0}")]
    CliError(String),

    #[error("cursor cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for rusqlite::Error {
    fn from(e: Error) -> Self {
        rusqlite::Error::ModuleError(e.to_string())
    }
}
