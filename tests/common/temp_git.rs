//! Real git repositories for end-to-end tests
//!
//! `TempRemotes` creates bare `source`, `dest` and `rebase` repositories plus
//! an authoring clone used to build their histories with the git CLI.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

pub const AUTHOR_NAME: &str = "Test Author";
pub const AUTHOR_EMAIL: &str = "author@example.com";

fn git_command(dir: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::new("git");
    cmd.args([
        "-c",
        &format!("user.name={AUTHOR_NAME}"),
        "-c",
        &format!("user.email={AUTHOR_EMAIL}"),
        "-c",
        "init.defaultBranch=main",
        "-c",
        "commit.gpgsign=false",
    ])
    .args(args)
    .current_dir(dir);
    cmd
}

/// Run git in `dir` where failure is expected, returning whether it succeeded
pub fn git_ok(dir: &Path, args: &[&str]) -> bool {
    git_command(dir, args)
        .output()
        .expect("failed to spawn git")
        .status
        .success()
}

/// Run git in `dir`, panicking with stderr on failure
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = git_command(dir, args)
        .output()
        .expect("failed to spawn git");
    assert!(
        output.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Three bare remotes and an authoring clone in one temp dir
pub struct TempRemotes {
    pub dir: TempDir,
    pub source: PathBuf,
    pub dest: PathBuf,
    pub rebase: PathBuf,
    pub work: PathBuf,
}

impl TempRemotes {
    /// Empty bare repos at `<tmp>/upstream/project.git`, `<tmp>/fork/project.git`
    /// and `<tmp>/bot/project.git`
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let bare = |ns: &str| {
            let path = dir.path().join(ns).join("project.git");
            fs::create_dir_all(&path).unwrap();
            git(&path, &["init", "--quiet", "--bare"]);
            path
        };
        let source = bare("upstream");
        let dest = bare("fork");
        let rebase = bare("bot");

        let work = dir.path().join("work");
        fs::create_dir_all(&work).unwrap();
        git(&work, &["init", "--quiet"]);
        for (name, path) in [("source", &source), ("dest", &dest), ("rebase", &rebase)] {
            git(&work, &["remote", "add", name, path.to_str().unwrap()]);
        }

        Self {
            dir,
            source,
            dest,
            rebase,
            work,
        }
    }

    /// Clone directory used by the bot under test
    pub fn workdir(&self) -> PathBuf {
        self.dir.path().join("bot-clone")
    }

    /// `<url>:<branch>` spec for one of the bare repos
    pub fn spec(path: &Path, branch: &str) -> String {
        format!("file://{}:{branch}", path.display())
    }

    pub fn source_spec(&self, branch: &str) -> String {
        Self::spec(&self.source, branch)
    }

    pub fn dest_spec(&self, branch: &str) -> String {
        Self::spec(&self.dest, branch)
    }

    pub fn rebase_spec(&self, branch: &str) -> String {
        Self::spec(&self.rebase, branch)
    }

    /// Run git in the authoring clone
    pub fn git(&self, args: &[&str]) -> String {
        git(&self.work, args)
    }

    /// Write `content` to `file` and commit everything with `message`
    pub fn commit(&self, file: &str, content: &str, message: &str) -> String {
        self.write(file, content);
        self.git(&["add", "--all"]);
        self.git(&["commit", "--quiet", "-m", message]);
        self.head()
    }

    /// Like [`Self::commit`] with an explicit author
    pub fn commit_as(&self, file: &str, content: &str, message: &str, author: &str) -> String {
        self.write(file, content);
        self.git(&["add", "--all"]);
        self.git(&["commit", "--quiet", "-m", message, &format!("--author={author}")]);
        self.head()
    }

    /// Delete `file` and commit
    pub fn delete(&self, file: &str, message: &str) -> String {
        self.git(&["rm", "--quiet", file]);
        self.git(&["commit", "--quiet", "-m", message]);
        self.head()
    }

    pub fn write(&self, file: &str, content: &str) {
        let path = self.work.join(file);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    pub fn head(&self) -> String {
        self.git(&["rev-parse", "HEAD"])
    }

    /// Check out `branch` at `start`, creating or resetting it
    pub fn branch(&self, branch: &str, start: &str) {
        self.git(&["checkout", "--quiet", "-B", branch, start]);
    }

    /// Push HEAD to `remote` as `branch`
    pub fn push(&self, remote: &str, branch: &str) {
        self.git(&[
            "push",
            "--quiet",
            "--force",
            remote,
            &format!("HEAD:refs/heads/{branch}"),
        ]);
    }

    /// Create a lightweight tag at HEAD and push it to `remote`
    pub fn push_tag(&self, remote: &str, tag: &str) {
        self.git(&["tag", "--force", tag]);
        self.git(&["push", "--quiet", "--force", remote, &format!("refs/tags/{tag}")]);
    }

    /// Subjects on `branch` of a bare repo, oldest first, merges included
    pub fn log_subjects(repo: &Path, branch: &str) -> Vec<String> {
        git(repo, &["log", "--reverse", "--format=%s", branch])
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// Subjects along the first-parent chain of `branch`, newest first
    pub fn first_parent_subjects(repo: &Path, branch: &str) -> Vec<String> {
        git(repo, &["log", "--first-parent", "--format=%s", branch])
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// Author email of the tip of `branch`
    pub fn tip_author_email(repo: &Path, branch: &str) -> String {
        git(repo, &["log", "-1", "--format=%aE", branch])
    }

    /// Parents of the commit `rev`
    pub fn parents(repo: &Path, rev: &str) -> Vec<String> {
        git(repo, &["rev-list", "--parents", "-n", "1", rev])
            .split_whitespace()
            .skip(1)
            .map(str::to_string)
            .collect()
    }

    /// `author email` of each commit on `branch`, oldest first
    pub fn log_authors(repo: &Path, branch: &str) -> Vec<String> {
        git(repo, &["log", "--reverse", "--format=%aE", branch])
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// Whether `branch` exists in a bare repo
    pub fn has_branch(repo: &Path, branch: &str) -> bool {
        Command::new("git")
            .args([
                "show-ref",
                "--verify",
                "--quiet",
                &format!("refs/heads/{branch}"),
            ])
            .current_dir(repo)
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// File content at `branch:path` in a bare repo, `None` when absent
    pub fn show_file(repo: &Path, branch: &str, path: &str) -> Option<String> {
        let output = Command::new("git")
            .args(["show", &format!("{branch}:{path}")])
            .current_dir(repo)
            .output()
            .ok()?;
        output
            .status
            .success()
            .then(|| String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// Commit SHA of `rev` in a bare repo
    pub fn rev(repo: &Path, rev: &str) -> String {
        git(repo, &["rev-parse", rev])
    }
}
