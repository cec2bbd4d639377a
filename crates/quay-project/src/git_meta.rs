//! Git metadata without spawning git.
//!
//! Branch and remote come straight from `.git/HEAD` and `.git/config`,
//! which is orders of magnitude cheaper than a subprocess per project and
//! good enough for display purposes.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use quay_core::fs;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitInfo {
    pub has_git: bool,
    pub branch: Option<String>,
    pub remote: Option<String>,
}

/// Inspect `<dir>/.git` for branch and origin-remote information.
///
/// Worktrees and submodules keep `.git` as a file containing a `gitdir:`
/// pointer to the real git directory; that indirection is followed (one
/// level, relative pointers resolved against the project directory).
pub async fn git_info(project_dir: &Path) -> GitInfo {
    let git_path = project_dir.join(".git");
    let Ok(meta) = tokio::fs::metadata(&git_path).await else {
        return GitInfo::default();
    };

    let git_dir = if meta.is_file() {
        match fs::read_text(&git_path).await.as_deref().and_then(gitdir_pointer) {
            Some(pointer) => resolve_gitdir(project_dir, &pointer),
            None => git_path,
        }
    } else {
        git_path
    };

    let branch = fs::read_text(&git_dir.join("HEAD"))
        .await
        .as_deref()
        .and_then(head_branch);
    let remote = fs::read_text(&git_dir.join("config"))
        .await
        .as_deref()
        .and_then(origin_url);

    GitInfo {
        has_git: true,
        branch,
        remote,
    }
}

fn gitdir_pointer(text: &str) -> Option<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"(?m)^gitdir:\s*(.+)$").expect("valid regex"));
    re.captures(text).map(|caps| caps[1].trim().to_string())
}

fn resolve_gitdir(project_dir: &Path, pointer: &str) -> PathBuf {
    let pointer = Path::new(pointer);
    if pointer.is_absolute() {
        pointer.to_path_buf()
    } else {
        project_dir.join(pointer)
    }
}

fn head_branch(head: &str) -> Option<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"ref: refs/heads/(.+)").expect("valid regex"));
    re.captures(head).map(|caps| caps[1].trim().to_string())
}

fn origin_url(config: &str) -> Option<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r#"\[remote "origin"\][^\[]*url\s*=\s*(.+)"#).expect("valid regex")
    });
    re.captures(config).map(|caps| caps[1].trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn write(path: &Path, contents: &str) {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.unwrap();
        }
        tokio::fs::write(path, contents).await.unwrap();
    }

    #[tokio::test]
    async fn no_git_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(git_info(dir.path()).await, GitInfo::default());
    }

    #[tokio::test]
    async fn reads_branch_and_origin() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join(".git/HEAD"), "ref: refs/heads/main\n").await;
        write(
            &dir.path().join(".git/config"),
            "[core]\n\tbare = false\n[remote \"origin\"]\n\turl = git@example.com:me/proj.git\n\tfetch = +refs/heads/*:refs/remotes/origin/*\n[branch \"main\"]\n",
        )
        .await;

        let info = git_info(dir.path()).await;
        assert!(info.has_git);
        assert_eq!(info.branch.as_deref(), Some("main"));
        assert_eq!(info.remote.as_deref(), Some("git@example.com:me/proj.git"));
    }

    #[tokio::test]
    async fn detached_head_has_no_branch() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join(".git/HEAD"), "4f2a9c1d8e\n").await;

        let info = git_info(dir.path()).await;
        assert!(info.has_git);
        assert_eq!(info.branch, None);
    }

    #[tokio::test]
    async fn follows_gitdir_pointer_file() {
        let dir = tempfile::tempdir().unwrap();
        let real = dir.path().join("real-gitdir");
        write(&real.join("HEAD"), "ref: refs/heads/feature/x\n").await;

        let project = dir.path().join("worktree");
        tokio::fs::create_dir_all(&project).await.unwrap();
        write(&project.join(".git"), "gitdir: ../real-gitdir\n").await;

        let info = git_info(&project).await;
        assert!(info.has_git);
        assert_eq!(info.branch.as_deref(), Some("feature/x"));
    }

    #[tokio::test]
    async fn a_remote_other_than_origin_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        write(
            &dir.path().join(".git/config"),
            "[remote \"upstream\"]\n\turl = https://example.com/up.git\n",
        )
        .await;

        let info = git_info(dir.path()).await;
        assert!(info.has_git);
        assert_eq!(info.remote, None);
    }
}
