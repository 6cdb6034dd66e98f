//! Module registration (§6). Grounded on the original's `gitqlite.go`, which
//! registers a fixed set of module names on a `ConnectHook` and then issues
//! `CREATE VIRTUAL TABLE IF NOT EXISTS <name> USING <module>(%q)` for each
//! once a connection opens. `register_all` is the Rust analogue of the
//! `ConnectHook` registration; `ensure_tables` is the analogue of
//! `ensureTables`.

use rusqlite::vtab::read_only_module;
use rusqlite::Connection;

use crate::vtab::blame::BlameTab;
use crate::vtab::branches::BranchesTab;
use crate::vtab::commits::CommitsTab;
use crate::vtab::files::FilesTab;
use crate::vtab::refs::RefsTab;
use crate::vtab::stats::StatsTab;
use crate::vtab::tags::TagsTab;

/// Per-connection configuration for commit-backed tables (§4.1, §6).
///
/// `prefer_cli` selects the `git log`-spawning backend over the in-process
/// `git2::Revwalk` one; when set but no `git` binary is resolvable, creation
/// silently falls back to the object-graph backend rather than failing
/// (§6: "if absent, creation falls back to the in-process walker").
#[derive(Clone, Debug, Default)]
pub struct RegisterOptions {
    pub prefer_cli: bool,
    pub git_binary: Option<String>,
}

/// The canonical module names (§6), in registration order.
const MODULE_NAMES: &[&str] = &[
    "git_log",
    "git_log_cli",
    "git_stats",
    "git_tree",
    "git_ref",
    "git_tag",
    "git_branch",
    "git_blame",
];

/// Registers a single named module on `conn`. `register_all` is this
/// looped over `MODULE_NAMES`, so the two module names that alias the
/// commits table (`git_log`, `git_log_cli`) map to one `CommitsTab`
/// factory rather than duplicated implementations, differing only in
/// the `RegisterOptions` passed as `Aux`.
pub fn register_module(conn: &Connection, name: &str, opts: RegisterOptions) -> rusqlite::Result<()> {
    match name {
        "git_log" => conn.create_module("git_log", read_only_module::<CommitsTab>(), Some(opts)),
        "git_log_cli" => {
            let mut opts = opts;
            opts.prefer_cli = true;
            conn.create_module("git_log_cli", read_only_module::<CommitsTab>(), Some(opts))
        }
        "git_stats" => conn.create_module("git_stats", read_only_module::<StatsTab>(), Some(opts)),
        "git_tree" => conn.create_module("git_tree", read_only_module::<FilesTab>(), Some(opts)),
        "git_ref" => conn.create_module("git_ref", read_only_module::<RefsTab>(), Some(())),
        "git_tag" => conn.create_module("git_tag", read_only_module::<TagsTab>(), Some(())),
        "git_branch" => conn.create_module("git_branch", read_only_module::<BranchesTab>(), Some(())),
        "git_blame" => conn.create_module("git_blame", read_only_module::<BlameTab>(), Some(())),
        other => Err(rusqlite::Error::ModuleError(format!("unknown module name: {other}"))),
    }
}

/// Registers every module name the engine exposes (§6) on `conn`. Does not
/// create any tables; callers still issue `CREATE VIRTUAL TABLE ... USING
/// <module>(<path>)` themselves, or call `ensure_tables` to do it for the
/// canonical table names.
pub fn register_all(conn: &Connection, opts: RegisterOptions) -> rusqlite::Result<()> {
    for name in MODULE_NAMES {
        register_module(conn, name, opts.clone())?;
    }
    log::info!("registered git virtual table modules");
    Ok(())
}

/// Name of the commits module to use for `ensure_tables`'s `commits` table:
/// `git_log_cli` when a `git` executable is resolvable and the caller asked
/// for it, `git_log` otherwise.
pub fn commits_module_name(opts: &RegisterOptions) -> &'static str {
    if opts.prefer_cli && crate::util::resolve_executable("git").is_some() {
        "git_log_cli"
    } else {
        "git_log"
    }
}

/// Issues `CREATE VIRTUAL TABLE IF NOT EXISTS <name> USING <module>(<path>)`
/// for the canonical table set (§6), after `register_all` has registered
/// the modules. Mirrors `ensureTables` in the original.
pub fn ensure_tables(conn: &Connection, repo_path: &str, opts: &RegisterOptions) -> rusqlite::Result<()> {
    let commits_module = commits_module_name(opts);
    let statements = [
        format!("CREATE VIRTUAL TABLE IF NOT EXISTS commits USING {commits_module}('{repo_path}')"),
        format!("CREATE VIRTUAL TABLE IF NOT EXISTS stats USING git_stats('{repo_path}')"),
        format!("CREATE VIRTUAL TABLE IF NOT EXISTS files USING git_tree('{repo_path}')"),
        format!("CREATE VIRTUAL TABLE IF NOT EXISTS tags USING git_tag('{repo_path}')"),
        format!("CREATE VIRTUAL TABLE IF NOT EXISTS branches USING git_branch('{repo_path}')"),
        format!("CREATE VIRTUAL TABLE IF NOT EXISTS refs USING git_ref('{repo_path}')"),
        format!("CREATE VIRTUAL TABLE IF NOT EXISTS blame USING git_blame('{repo_path}')"),
    ];
    for stmt in statements {
        conn.execute_batch(&stmt)?;
    }
    Ok(())
}
