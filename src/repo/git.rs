//! Thin wrapper over the `git` CLI
//!
//! Every version-control side effect goes through [`GitWorkspace`]. Commands
//! run synchronously in the workspace root and fail with [`Error::Git`]
//! carrying the subcommand and stderr.

use crate::error::{Error, Result};
use crate::types::{Commit, ConflictStatusEntry};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tracing::{debug, trace};

/// Field separator for `git log` output (ASCII unit separator)
const LOG_FIELD_SEP: char = '\u{1f}';

/// Output of a successful `git push --porcelain`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushRefStatus {
    /// Single-character flag (` `, `+`, `-`, `*`, `=`, `!`)
    pub flag: char,
    /// `src:dst` refspec as reported by git
    pub refspec: String,
    /// Human readable summary
    pub summary: String,
}

impl PushRefStatus {
    /// Whether git reported this ref as rejected or failed
    pub const fn is_error(&self) -> bool {
        self.flag == '!'
    }
}

/// A git working directory driven through the CLI.
///
/// Commands block the calling thread. A run is a single sequential writer
/// that owns the working directory, so the async engine calls these
/// directly instead of going through `tokio::process`.
#[derive(Debug, Clone)]
pub struct GitWorkspace {
    root: PathBuf,
}

impl GitWorkspace {
    /// Initialize (or reuse) a repository at `path`
    pub fn init(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)?;
        let ws = Self {
            root: path.to_path_buf(),
        };
        ws.git(&["init", "--quiet"])?;
        Ok(ws)
    }

    /// Workspace root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn command(&self, args: &[&str]) -> Result<Output> {
        trace!(args = ?args, "running git");
        Command::new("git")
            .args(args)
            .current_dir(&self.root)
            .env("GIT_TERMINAL_PROMPT", "0")
            .output()
            .map_err(Error::from)
    }

    /// Run a git command, returning trimmed stdout
    fn git(&self, args: &[&str]) -> Result<String> {
        self.git_described(args, &args.join(" "))
    }

    /// Like [`Self::git`] but reports `description` instead of the arguments
    /// on failure, for commands that carry secrets.
    fn git_described(&self, args: &[&str], description: &str) -> Result<String> {
        let output = self.command(args)?;
        if !output.status.success() {
            return Err(Error::Git {
                command: description.to_string(),
                stderr: failure_text(&output),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim_end().to_string())
    }

    /// Run a git command whose exit status is the answer
    fn git_succeeds(&self, args: &[&str]) -> Result<bool> {
        Ok(self.command(args)?.status.success())
    }

    // =========================================================================
    // Configuration and remotes
    // =========================================================================

    /// Set a config value, replacing any existing values
    pub fn set_config(&self, key: &str, value: &str) -> Result<()> {
        self.git(&["config", "--replace-all", key, value])?;
        Ok(())
    }

    /// Set a config value whose content must not appear in error messages
    pub fn set_secret_config(&self, key: &str, value: &str) -> Result<()> {
        self.git_described(
            &["config", "--replace-all", key, value],
            &format!("config {key} <redacted>"),
        )?;
        Ok(())
    }

    /// Names of configured remotes
    pub fn remote_names(&self) -> Result<Vec<String>> {
        Ok(self
            .git(&["remote"])?
            .lines()
            .map(str::to_string)
            .collect())
    }

    /// Point `name` at `url`, adding the remote if it doesn't exist yet
    pub fn set_remote(&self, name: &str, url: &str) -> Result<()> {
        if self.remote_names()?.iter().any(|r| r == name) {
            debug!(remote = name, url, "updating remote url");
            self.git(&["remote", "set-url", name, url])?;
        } else {
            debug!(remote = name, url, "adding remote");
            self.git(&["remote", "add", name, url])?;
        }
        Ok(())
    }

    /// Fetch a refspec (or branch name) from a remote
    pub fn fetch(&self, remote: &str, refspec: &str) -> Result<()> {
        debug!(remote, refspec, "fetching");
        self.git(&["fetch", "--quiet", remote, refspec])?;
        Ok(())
    }

    /// Whether `branch` exists on the remote (`ls-remote --heads`)
    pub fn remote_has_branch(&self, remote: &str, branch: &str) -> Result<bool> {
        let out = self.git(&["ls-remote", "--heads", remote, branch])?;
        Ok(!out.is_empty())
    }

    /// Whether a remote-tracking ref `refs/remotes/<remote>/<branch>` exists locally
    pub fn has_remote_tracking_ref(&self, remote: &str, branch: &str) -> Result<bool> {
        self.git_succeeds(&[
            "show-ref",
            "--verify",
            "--quiet",
            &format!("refs/remotes/{remote}/{branch}"),
        ])
    }

    /// Delete `refs/remotes/<remote>/<branch>`. Returns `false` if it didn't exist.
    pub fn delete_remote_tracking_ref(&self, remote: &str, branch: &str) -> Result<bool> {
        if !self.has_remote_tracking_ref(remote, branch)? {
            return Ok(false);
        }
        self.git(&["update-ref", "-d", &format!("refs/remotes/{remote}/{branch}")])?;
        Ok(true)
    }

    /// Whether `name` is a tag
    pub fn is_tag(&self, name: &str) -> Result<bool> {
        self.git_succeeds(&[
            "show-ref",
            "--verify",
            "--quiet",
            &format!("refs/tags/{name}"),
        ])
    }

    // =========================================================================
    // Branches and revisions
    // =========================================================================

    /// Resolve a revision to a full SHA
    pub fn rev_parse(&self, rev: &str) -> Result<String> {
        self.git(&["rev-parse", "--verify", &format!("{rev}^{{commit}}")])
    }

    /// Resolve a revision to an abbreviated SHA of `len` characters
    pub fn rev_parse_short(&self, rev: &str, len: usize) -> Result<String> {
        self.git(&[
            "rev-parse",
            &format!("--short={len}"),
            &format!("{rev}^{{commit}}"),
        ])
    }

    /// Create or move a branch to `target` without checking it out
    pub fn force_branch(&self, name: &str, target: &str) -> Result<()> {
        self.git(&["branch", "--force", name, target])?;
        Ok(())
    }

    /// Force-delete a local branch. Returns `false` if it didn't exist.
    pub fn delete_branch_if_exists(&self, name: &str) -> Result<bool> {
        let exists = self.git_succeeds(&[
            "show-ref",
            "--verify",
            "--quiet",
            &format!("refs/heads/{name}"),
        ])?;
        if exists {
            self.git(&["branch", "-D", name])?;
        }
        Ok(exists)
    }

    /// Check out a revision (detached unless it names a local branch)
    pub fn checkout(&self, rev: &str) -> Result<()> {
        self.git(&["checkout", "--quiet", rev])?;
        Ok(())
    }

    /// Create `name` at `start` and check it out
    pub fn checkout_new_branch(&self, name: &str, start: &str) -> Result<()> {
        self.git(&["checkout", "--quiet", "-b", name, start])?;
        Ok(())
    }

    /// Create or reset `name` to `start`, check it out and discard local changes
    pub fn checkout_reset_branch(&self, name: &str, start: &str) -> Result<()> {
        self.git(&["checkout", "--quiet", "--force", "-B", name, start])?;
        self.git(&["reset", "--quiet", "--hard"])?;
        Ok(())
    }

    /// Restore a single path from another revision into index and worktree
    pub fn checkout_path_from(&self, rev: &str, path: &str) -> Result<()> {
        self.git(&["checkout", rev, "--", path])?;
        Ok(())
    }

    /// Best common ancestor of two revisions
    pub fn merge_base(&self, a: &str, b: &str) -> Result<String> {
        self.git(&["merge-base", a, b])
    }

    /// Non-merge commits on the ancestry path `base..head`, oldest first
    pub fn ancestry_path_commits(&self, base: &str, head: &str) -> Result<Vec<Commit>> {
        let out = self.git(&[
            "log",
            "--reverse",
            "--no-merges",
            "--ancestry-path",
            "--pretty=format:%H%x1f%s%x1f%aN%x1f%aE",
            &format!("{base}..{head}"),
        ])?;
        out.lines().map(parse_log_line).collect()
    }

    /// Remote-tracking branches whose history contains `rev`
    pub fn remote_branches_containing(&self, rev: &str) -> Result<Vec<String>> {
        Ok(self
            .git(&["branch", "-r", "--contains", rev])?
            .lines()
            // git indents every entry
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .collect())
    }

    /// Whether two revisions have identical trees
    pub fn trees_equal(&self, a: &str, b: &str) -> Result<bool> {
        let output = self.command(&["diff", "--quiet", a, b])?;
        match output.status.code() {
            Some(0) => Ok(true),
            Some(1) => Ok(false),
            _ => Err(Error::Git {
                command: format!("diff --quiet {a} {b}"),
                stderr: failure_text(&output),
            }),
        }
    }

    // =========================================================================
    // Commit construction
    // =========================================================================

    /// Build a commit object with an explicit tree and parent list.
    ///
    /// Nothing is checked out and no ref moves; the new SHA is returned.
    pub fn commit_tree(&self, tree: &str, parents: &[&str], message: &str) -> Result<String> {
        let mut args = vec!["commit-tree", tree];
        for parent in parents {
            args.push("-p");
            args.push(parent);
        }
        args.push("-m");
        args.push(message);
        self.git(&args)
    }

    /// Cherry-pick `sha`, preferring the picked commit's side on overlap
    pub fn cherry_pick_theirs(&self, sha: &str) -> Result<()> {
        self.git(&["cherry-pick", "-Xtheirs", sha])?;
        Ok(())
    }

    /// Skip the in-progress cherry-pick
    pub fn cherry_pick_skip(&self) -> Result<()> {
        self.git(&["cherry-pick", "--skip"])?;
        Ok(())
    }

    /// Abort an in-progress cherry-pick. Returns `false` if none was running.
    pub fn cherry_pick_abort(&self) -> Result<bool> {
        self.git_succeeds(&["cherry-pick", "--abort"])
    }

    /// Parsed `git status --porcelain` entries
    pub fn status_entries(&self) -> Result<Vec<ConflictStatusEntry>> {
        let output = self.command(&["status", "--porcelain", "-z"])?;
        if !output.status.success() {
            return Err(Error::Git {
                command: "status --porcelain -z".to_string(),
                stderr: failure_text(&output),
            });
        }
        Ok(parse_porcelain_z(&String::from_utf8_lossy(&output.stdout)))
    }

    /// Remove a path from index and worktree
    pub fn remove_path(&self, path: &str) -> Result<()> {
        self.git(&["rm", "--quiet", "--", path])?;
        Ok(())
    }

    /// Commit the index reusing the prepared message (`commit --no-edit`)
    pub fn commit_no_edit(&self) -> Result<()> {
        self.git(&["commit", "--quiet", "--no-edit"])?;
        Ok(())
    }

    /// Commit the index with `message`, optionally overriding the author
    pub fn commit(&self, message: &str, author: Option<&str>) -> Result<()> {
        let author_arg = author.map(|a| format!("--author={a}"));
        let mut args = vec!["commit", "--quiet", "-m", message];
        if let Some(ref arg) = author_arg {
            args.push(arg);
        }
        self.git(&args)?;
        Ok(())
    }

    /// Move HEAD back `count` commits keeping index and worktree
    pub fn reset_soft(&self, count: usize) -> Result<()> {
        self.git(&["reset", "--quiet", "--soft", &format!("HEAD~{count}")])?;
        Ok(())
    }

    /// Whether the index differs from HEAD
    pub fn has_staged_changes(&self) -> Result<bool> {
        Ok(!self.git_succeeds(&["diff", "--cached", "--quiet"])?)
    }

    /// Whether the worktree has any uncommitted or untracked changes
    pub fn is_dirty(&self) -> Result<bool> {
        Ok(!self.git(&["status", "--porcelain"])?.is_empty())
    }

    /// Stage everything, including untracked and deleted files
    pub fn add_all(&self) -> Result<()> {
        self.git(&["add", "--all"])?;
        Ok(())
    }

    // =========================================================================
    // Push
    // =========================================================================

    /// Force-push `refspec` to `remote` and return per-ref status lines
    pub fn force_push(&self, remote: &str, refspec: &str) -> Result<Vec<PushRefStatus>> {
        debug!(remote, refspec, "force pushing");
        let output = self.command(&["push", "--porcelain", "--force", remote, refspec])?;
        let statuses = parse_push_porcelain(&String::from_utf8_lossy(&output.stdout));

        if !output.status.success() && statuses.is_empty() {
            return Err(Error::Git {
                command: format!("push --force {remote} {refspec}"),
                stderr: failure_text(&output),
            });
        }
        Ok(statuses)
    }
}

fn failure_text(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if stderr.is_empty() {
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    } else {
        stderr
    }
}

fn parse_log_line(line: &str) -> Result<Commit> {
    let mut fields = line.splitn(4, LOG_FIELD_SEP);
    let (Some(sha), Some(message), Some(author_name), Some(author_email)) =
        (fields.next(), fields.next(), fields.next(), fields.next())
    else {
        return Err(Error::Internal(format!("unexpected git log line: {line:?}")));
    };
    Ok(Commit {
        sha: sha.to_string(),
        message: message.to_string(),
        author_name: author_name.to_string(),
        author_email: author_email.to_string(),
    })
}

/// Parse NUL-separated porcelain v1 status output.
///
/// With `-z` paths are never quoted. Renames and copies carry the original
/// path as an extra field, which is skipped.
fn parse_porcelain_z(raw: &str) -> Vec<ConflictStatusEntry> {
    let mut entries = Vec::new();
    let mut fields = raw.split('\0').filter(|f| !f.is_empty());

    while let Some(field) = fields.next() {
        if field.len() < 4 {
            continue;
        }
        let (code, path) = field.split_at(2);
        if code.starts_with('R') || code.starts_with('C') {
            fields.next();
        }
        entries.push(ConflictStatusEntry {
            code: code.to_string(),
            path: path[1..].to_string(),
        });
    }
    entries
}

fn parse_push_porcelain(raw: &str) -> Vec<PushRefStatus> {
    raw.lines()
        .filter_map(|line| {
            let mut parts = line.splitn(3, '\t');
            let flag_field = parts.next()?;
            let refspec = parts.next()?;
            let summary = parts.next().unwrap_or_default();
            let flag = flag_field.chars().next()?;
            Some(PushRefStatus {
                flag,
                refspec: refspec.to_string(),
                summary: summary.to_string(),
            })
        })
        .collect()
}
