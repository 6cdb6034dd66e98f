//! Virtual-table adapters that expose a git repository as a set of
//! SQL-queryable tables: commits, per-file diff stats, tree blobs, tags,
//! branches, refs, and line-level blame.
//!
//! This crate does not embed a SQL front end, a CLI, or remote-repository
//! handling — it registers `rusqlite` virtual table modules against a
//! connection the caller already owns. See [`registry::register_all`] and
//! [`registry::ensure_tables`] for the entry points.

pub mod error;
pub mod registry;
pub mod repo;
pub mod util;
pub mod vtab;
pub mod walk;

pub use error::{Error, Result};
pub use registry::{commits_module_name, ensure_tables, register_all, register_module, RegisterOptions};
pub use repo::RepoHandle;
