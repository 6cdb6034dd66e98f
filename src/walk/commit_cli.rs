//! CLI-backed commit walker (§4.4): shells out to `git log --numstat` and
//! parses the textual stream incrementally. Used when the caller asked for
//! CLI mode and a `git` binary is resolvable on PATH (§4.1).

use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::process::{Child, ChildStdout, Command, Stdio};

use chrono::{DateTime, FixedOffset};

use crate::error::{Error, Result};
use crate::walk::commit::{summary_of, Commit, CommitSource, Stat};

/// Record separator: marks the start of each commit's record in the `git
/// log` output, so the parser can find record boundaries without being
/// confused by embedded newlines in commit messages (§4.4).
const RS: char = '\u{1e}';
/// Field separator between the fixed-position header fields of a record.
const FS: char = '\u{1f}';

pub struct CliCommitWalker {
    repo_path: PathBuf,
    git_binary: String,
    seed: Option<String>,
    child: Option<Child>,
    reader: Option<BufReader<ChildStdout>>,
    pending_line: Option<String>,
    saw_any_record: bool,
    current_stats: Vec<Stat>,
}

impl CliCommitWalker {
    pub fn new(repo_path: impl Into<PathBuf>, git_binary: impl Into<String>) -> Self {
        Self {
            repo_path: repo_path.into(),
            git_binary: git_binary.into(),
            seed: None,
            child: None,
            reader: None,
            pending_line: None,
            saw_any_record: false,
            current_stats: Vec::new(),
        }
    }

    fn format_string() -> String {
        format!("{RS}%H{FS}%P{FS}%an{FS}%ae{FS}%ad{FS}%cn{FS}%ce{FS}%cd{FS}%T{FS}%B")
    }

    fn spawn(&mut self) -> Result<()> {
        let mut cmd = Command::new(&self.git_binary);
        cmd.arg("-C")
            .arg(&self.repo_path)
            .arg("log")
            .arg("--numstat")
            .arg("--date=format:%Y-%m-%dT%H:%M:%S%z")
            .arg(format!("--pretty=format:{}", Self::format_string()));
        if let Some(sha) = &self.seed {
            cmd.arg(sha).arg("-1");
        }
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());

        log::debug!("spawning {:?}", cmd);
        let mut child = cmd
            .spawn()
            .map_err(|e| Error::CliError(format!("failed to spawn {}: {}", self.git_binary, e)))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::CliError("child produced no stdout".into()))?;
        self.reader = Some(BufReader::new(stdout));
        self.child = Some(child);
        self.pending_line = None;
        self.saw_any_record = false;
        Ok(())
    }

    fn terminate_child(&mut self) {
        self.reader = None;
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }

    /// Reads the next complete record (a line starting with `RS` plus every
    /// line up to, but not including, the next `RS`-prefixed line or EOF).
    fn read_record(&mut self) -> Result<Option<Vec<String>>> {
        let reader = match self.reader.as_mut() {
            Some(r) => r,
            None => return Ok(None),
        };

        let mut lines = Vec::new();
        if let Some(first) = self.pending_line.take() {
            lines.push(first);
        } else {
            let mut line = String::new();
            match reader.read_line(&mut line) {
                Ok(0) => return Ok(None),
                Ok(_) => {
                    trim_newline(&mut line);
                    lines.push(line);
                }
                Err(e) => return Err(Error::CliError(e.to_string())),
            }
        }

        loop {
            let mut line = String::new();
            match reader.read_line(&mut line) {
                Ok(0) => break,
                Ok(_) => {
                    trim_newline(&mut line);
                    if line.starts_with(RS) {
                        self.pending_line = Some(line);
                        break;
                    }
                    lines.push(line);
                }
                Err(e) => return Err(Error::CliError(e.to_string())),
            }
        }

        Ok(Some(lines))
    }

    fn finish_and_check_status(&mut self) -> Result<()> {
        let status = match self.child.take() {
            Some(mut child) => child.wait().map_err(|e| Error::CliError(e.to_string()))?,
            None => return Ok(()),
        };
        self.reader = None;
        // A seeded lookup that produced no record is an unknown object
        // (§7 `NoSuchObject`), not a failure, even if `git log` exits
        // non-zero for it. Any other non-zero exit propagates.
        let no_such_object = self.seed.is_some() && !self.saw_any_record;
        if !status.success() && !no_such_object {
            let e = Error::CliError(format!("git log exited with {status}"));
            log::error!("commit walk aborted: {e}");
            return Err(e);
        }
        Ok(())
    }
}

fn trim_newline(line: &mut String) {
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
}

fn is_numstat_line(line: &str) -> bool {
    let mut parts = line.splitn(3, '\t');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(a), Some(b), Some(_)) => is_numstat_field(a) && is_numstat_field(b),
        _ => false,
    }
}

fn is_numstat_field(field: &str) -> bool {
    !field.is_empty() && (field == "-" || field.chars().all(|c| c.is_ascii_digit()))
}

fn parse_numstat_field(field: &str) -> i64 {
    if field == "-" {
        0
    } else {
        field.parse().unwrap_or(0)
    }
}

fn parse_date(s: &str) -> Result<DateTime<FixedOffset>> {
    DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%z")
        .map_err(|e| Error::CliError(format!("invalid commit date {:?}: {}", s, e)))
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

fn parse_record(lines: &[String]) -> Result<(Commit, Vec<Stat>)> {
    let first = lines
        .first()
        .ok_or_else(|| Error::CliError("empty record".into()))?;
    let first = first.strip_prefix(RS).unwrap_or(first);

    let mut fields = first.splitn(9, FS);
    let mut next_field = || -> Result<&str> {
        fields
            .next()
            .ok_or_else(|| Error::CliError("truncated commit header".into()))
    };

    let hash = next_field()?.to_string();
    let parents_raw = next_field()?.to_string();
    let author_name = next_field()?.to_string();
    let author_email = next_field()?.to_string();
    let author_date = next_field()?.to_string();
    let committer_name = next_field()?.to_string();
    let committer_email = next_field()?.to_string();
    let committer_date = next_field()?.to_string();
    let tree_id = next_field()?.to_string();
    let message_first_line = fields.next().unwrap_or("").to_string();
    drop(fields);

    let mut body_lines = vec![message_first_line];
    if lines.len() > 1 {
        body_lines.extend(lines[1..].iter().cloned());
    }

    let mut split_at = body_lines.len();
    for (i, line) in body_lines.iter().enumerate().rev() {
        if is_numstat_line(line) {
            split_at = i;
        } else if line.trim().is_empty() {
            continue;
        } else {
            break;
        }
    }
    let (message_lines, numstat_lines) = body_lines.split_at(split_at);

    let message = message_lines
        .join("\n")
        .trim_end_matches(|c: char| c == '\n' || c.is_whitespace())
        .to_string();

    let mut stats = Vec::new();
    for line in numstat_lines {
        if line.trim().is_empty() {
            continue;
        }
        let mut cols = line.splitn(3, '\t');
        let additions = parse_numstat_field(cols.next().unwrap_or("0"));
        let deletions = parse_numstat_field(cols.next().unwrap_or("0"));
        let file = cols.next().unwrap_or("").to_string();
        stats.push(Stat {
            file,
            additions,
            deletions,
        });
    }

    let parent_id = parents_raw.split_whitespace().next().map(|s| s.to_string());
    let parent_count = parents_raw.split_whitespace().count();
    let summary = summary_of(&message);

    let commit = Commit {
        id: hash,
        summary,
        message: non_empty(message),
        author_name: non_empty(author_name),
        author_email: non_empty(author_email),
        author_when: parse_date(&author_date)?,
        committer_name: non_empty(committer_name),
        committer_email: non_empty(committer_email),
        committer_when: parse_date(&committer_date)?,
        parent_id,
        parent_count,
        tree_id,
    };

    Ok((commit, stats))
}

impl CommitSource for CliCommitWalker {
    fn reset(&mut self, seed: Option<&str>) -> Result<()> {
        self.terminate_child();
        self.seed = seed.map(|s| s.to_string());
        self.spawn()
    }

    fn next(&mut self) -> Result<Option<Commit>> {
        match self.read_record()? {
            Some(lines) if !lines.is_empty() => {
                self.saw_any_record = true;
                let (commit, stats) = parse_record(&lines)?;
                self.current_stats = stats;
                Ok(Some(commit))
            }
            _ => {
                if let Some(sha) = &self.seed {
                    if !self.saw_any_record {
                        log::debug!("{}", Error::NoSuchObject(sha.clone()));
                    }
                }
                self.finish_and_check_status()?;
                Ok(None)
            }
        }
    }

    fn stats_for_current(&mut self) -> Result<Option<Vec<Stat>>> {
        Ok(Some(self.current_stats.clone()))
    }
}

impl Drop for CliCommitWalker {
    fn drop(&mut self) {
        self.terminate_child();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numstat_line_detection() {
        assert!(is_numstat_line("3\t1\tsrc/main.rs"));
        assert!(is_numstat_line("-\t-\tassets/logo.png"));
        assert!(!is_numstat_line("this is a commit message line"));
        assert!(!is_numstat_line(""));
    }

    #[test]
    fn parses_a_single_record_with_multiline_message_and_numstat() {
        let lines: Vec<String> = vec![
            format!(
                "{RS}deadbeef{FS}{FS}Jane{FS}jane@example.com{FS}2024-01-02T03:04:05+0000{FS}Jane{FS}jane@example.com{FS}2024-01-02T03:04:05+0000{FS}treesha{FS}Fix bug"
            ),
            "".to_string(),
            "with a body".to_string(),
            "".to_string(),
            "3\t1\tsrc/main.rs".to_string(),
            "-\t-\tassets/logo.png".to_string(),
        ];
        let (commit, stats) = parse_record(&lines).unwrap();
        assert_eq!(commit.id, "deadbeef");
        assert_eq!(commit.summary.as_deref(), Some("Fix bug"));
        assert!(commit.message.as_deref().unwrap().contains("with a body"));
        assert_eq!(commit.parent_count, 0);
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].additions, 3);
        assert_eq!(stats[0].deletions, 1);
        assert_eq!(stats[1].additions, 0);
        assert_eq!(stats[1].deletions, 0);
    }

    #[test]
    fn parses_merge_parent_list() {
        let lines: Vec<String> = vec![format!(
            "{RS}abc{FS}parent1 parent2{FS}{FS}{FS}2024-01-02T03:04:05+0000{FS}{FS}{FS}2024-01-02T03:04:05+0000{FS}tree{FS}Merge branch"
        )];
        let (commit, _stats) = parse_record(&lines).unwrap();
        assert_eq!(commit.parent_count, 2);
        assert_eq!(commit.parent_id.as_deref(), Some("parent1"));
    }
}
