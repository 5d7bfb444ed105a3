//! Shared fixtures for integration tests.
//!
//! Repositories are created with the `git` CLI so the library is checked
//! against what git itself writes.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

use githook::core::types::{BranchName, Oid};
use githook::git::Git;

/// A throwaway repository with a fixed identity.
pub struct TestRepo {
    dir: TempDir,
    root: PathBuf,
}

impl TestRepo {
    /// Create a repository on `main` with one commit.
    pub fn new() -> Self {
        let repo = Self::empty();
        repo.commit_file("README.md", "# Test Repo\n", "Initial commit");
        repo
    }

    /// Create a repository on `main` with no commits.
    pub fn empty() -> Self {
        Self::named("project")
    }

    /// Create a repository whose directory is called `name`.
    pub fn named(name: &str) -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let root = dir.path().join(name);
        std::fs::create_dir(&root).unwrap();

        run_git(&root, &["init", "-b", "main"]);
        run_git(&root, &["config", "user.email", "test@example.com"]);
        run_git(&root, &["config", "user.name", "Test User"]);
        run_git(&root, &["config", "commit.gpgsign", "false"]);

        Self { dir, root }
    }

    /// Path to the work tree.
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Scratch space next to the repository.
    pub fn scratch(&self) -> &Path {
        self.dir.path()
    }

    /// Open a Git interface to this repository.
    pub fn git(&self) -> Git {
        Git::open(self.path()).expect("failed to open test repo")
    }

    /// Run git in the work tree and return trimmed stdout.
    pub fn git_cli(&self, args: &[&str]) -> String {
        git_output(self.path(), args)
    }

    /// Write a file and commit it, returning the new HEAD.
    pub fn commit_file(&self, path: &str, content: &str, message: &str) -> Oid {
        std::fs::write(self.path().join(path), content).unwrap();
        run_git(self.path(), &["add", path]);
        run_git(self.path(), &["commit", "-m", message]);
        self.head()
    }

    /// Commit as a specific author, returning the new HEAD.
    pub fn commit_as(&self, name: &str, email: &str, path: &str, content: &str, message: &str) -> Oid {
        std::fs::write(self.path().join(path), content).unwrap();
        run_git(self.path(), &["add", path]);
        let author = format!("{} <{}>", name, email);
        run_git(
            self.path(),
            &["commit", "--author", &author, "--date", "2024-03-01T12:00:00+02:00", "-m", message],
        );
        self.head()
    }

    /// Current HEAD commit.
    pub fn head(&self) -> Oid {
        Oid::new(self.git_cli(&["rev-parse", "HEAD"])).unwrap()
    }

    /// Tip of a local branch, read with the git CLI.
    pub fn tip(&self, branch: &str) -> Oid {
        Oid::new(self.git_cli(&["rev-parse", &format!("refs/heads/{}", branch)])).unwrap()
    }

    /// Tree id of a commit.
    pub fn tree_of(&self, commit: &Oid) -> String {
        self.git_cli(&["rev-parse", &format!("{}^{{tree}}", commit)])
    }

    /// Parents of a commit, in order.
    pub fn parents_of(&self, commit: &Oid) -> Vec<String> {
        self.git_cli(&["rev-list", "--parents", "-n", "1", commit.as_str()])
            .split_whitespace()
            .skip(1)
            .map(String::from)
            .collect()
    }

    /// Create a branch at HEAD.
    pub fn create_branch(&self, name: &str) {
        run_git(self.path(), &["branch", name]);
    }

    /// Check out a branch.
    pub fn checkout(&self, name: &str) {
        run_git(self.path(), &["checkout", "-q", name]);
    }

    /// Merge `branch` into the current branch with a merge commit.
    pub fn merge(&self, branch: &str, message: &str) -> Oid {
        run_git(self.path(), &["merge", "--no-ff", "-m", message, branch]);
        self.head()
    }

    /// Create an empty bare repository next to this one.
    pub fn bare_sibling(&self, name: &str) -> PathBuf {
        let path = self.scratch().join(name);
        run_git(self.scratch(), &["init", "--bare", "-b", "main", name]);
        path
    }
}

/// Branch name shorthand.
pub fn branch(name: &str) -> BranchName {
    BranchName::new(name).unwrap()
}

/// Run git in `dir`, panicking on failure.
pub fn run_git(dir: &Path, args: &[&str]) {
    git_output(dir, args);
}

/// Run git in `dir` and return trimmed stdout.
pub fn git_output(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_CONFIG_NOSYSTEM", "1")
        .output()
        .expect("git command failed");

    if !output.status.success() {
        panic!(
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }
    String::from_utf8(output.stdout).unwrap().trim().to_string()
}
