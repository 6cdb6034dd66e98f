//! Repository walkers: the pieces that actually traverse git state. The
//! `vtab` module wraps each of these behind a `rusqlite` virtual table; these
//! types have no SQL awareness of their own.

pub mod blame;
pub mod commit;
pub mod commit_cli;
pub mod refs;
pub mod stats;
pub mod tree;

pub use blame::{BlameWalker, BlamedLine};
pub use commit::{Commit, CommitSource, ObjectCommitWalker, Stat};
pub use commit_cli::CliCommitWalker;
pub use refs::{Branch, BranchWalker, RawRef, RefWalker, Tag, TagWalker};
pub use stats::{StatRow, StatsWalker};
pub use tree::{FileEntry, TreeWalker};
