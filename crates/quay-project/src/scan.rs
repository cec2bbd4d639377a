//! The walker: turns the managed tree into a project list.
//!
//! Three passes over fixed depths, no recursion: direct children of the
//! root (markers required), each `*_suite` namespace (markers required,
//! suite label attached), then each status folder (presence there already
//! implies project-hood). Unreadable subtrees contribute nothing; the scan
//! itself never fails.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use quay_core::slugify;

use crate::classify::{
    determine_status, format_suite_name, is_ignored_name, is_project_directory, is_suite_directory,
    STATUS_FOLDERS,
};
use crate::model::Project;
use crate::{bugs, detect, git_meta, rcodegen};

#[derive(Debug, Clone)]
pub struct Scanner {
    root: PathBuf,
}

impl Scanner {
    /// Scanner over the validated root directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Full, uncached walk. Expensive; most callers want the cache wrapper.
    pub async fn scan_all(&self) -> Vec<Project> {
        let mut projects: Vec<Project> = Vec::new();
        let mut seen_slugs: HashSet<String> = HashSet::new();

        // Projects still sitting directly under the root.
        self.scan_level(&self.root, true, None, &mut projects, &mut seen_slugs)
            .await;

        // Suite namespaces.
        for name in read_dir_names(&self.root).await {
            if !is_suite_directory(&name) {
                continue;
            }
            let suite = format_suite_name(&name);
            self.scan_level(
                &self.root.join(&name),
                true,
                Some(suite.as_str()),
                &mut projects,
                &mut seen_slugs,
            )
            .await;
        }

        // Status folders, in their fixed order.
        for (folder, _) in STATUS_FOLDERS {
            let status_path = self.root.join(folder);
            if tokio::fs::metadata(&status_path).await.is_ok() {
                self.scan_level(&status_path, false, None, &mut projects, &mut seen_slugs)
                    .await;
            }
        }

        projects.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));
        debug!(count = projects.len(), root = %self.root.display(), "scan complete");
        projects
    }

    /// Scan the direct children of one directory.
    async fn scan_level(
        &self,
        dir: &Path,
        require_markers: bool,
        suite: Option<&str>,
        projects: &mut Vec<Project>,
        seen_slugs: &mut HashSet<String>,
    ) {
        let names = read_dir_names(dir).await;
        if names.is_empty() {
            return;
        }

        for name in names {
            if is_ignored_name(&name) || name.starts_with('.') || name.starts_with("__") {
                continue;
            }
            // Suites are scanned as their own namespaces.
            if is_suite_directory(&name) {
                continue;
            }

            let Some(mut project) = self
                .scan_project(&dir.join(&name), require_markers, suite)
                .await
            else {
                continue;
            };

            // Slug collision: prefix whichever side carries a suite. Two
            // suite-less directories with the same slug stay ambiguous;
            // that is accepted for a single-operator tree.
            if seen_slugs.contains(&project.slug) {
                if let Some(existing) = projects.iter_mut().find(|p| p.slug == project.slug) {
                    if let Some(existing_suite) = existing.suite.clone() {
                        seen_slugs.remove(&existing.slug);
                        existing.slug = format!("{}--{}", slugify(&existing_suite), existing.slug);
                        seen_slugs.insert(existing.slug.clone());
                    }
                }
                if let Some(suite) = &project.suite {
                    project.slug = format!("{}--{}", slugify(suite), project.slug);
                }
            }

            seen_slugs.insert(project.slug.clone());
            projects.push(project);
        }
    }

    /// Inspect one candidate directory, running every detector
    /// concurrently. `None` when the directory is ignored, not a
    /// directory, or (when required) carries no project marker.
    pub async fn scan_project(
        &self,
        path: &Path,
        require_markers: bool,
        suite: Option<&str>,
    ) -> Option<Project> {
        let name = path.file_name()?.to_string_lossy().into_owned();
        if is_ignored_name(&name) {
            return None;
        }

        let meta = tokio::fs::metadata(path).await.ok()?;
        if !meta.is_dir() {
            return None;
        }

        if require_markers && !is_project_directory(path).await {
            return None;
        }

        let (
            tech_stack,
            description,
            git,
            version,
            scripts,
            dependencies,
            last_modified,
            bugs,
            rcodegen,
        ) = tokio::join!(
            detect::tech_stack(path),
            detect::description(path),
            git_meta::git_info(path),
            detect::version(path),
            detect::scripts(path),
            detect::dependencies(path),
            detect::last_modified(path),
            bugs::scan_bugs(path),
            rcodegen::scan_rcodegen(path),
        );

        Some(Project {
            slug: slugify(&name),
            name,
            path: path.to_path_buf(),
            suite: suite.map(str::to_string),
            description,
            status: determine_status(&self.root, path),
            tech_stack,
            version,
            last_modified,
            git_branch: git.branch,
            git_remote: git.remote,
            has_git: git.has_git,
            dependencies,
            scripts,
            bugs,
            rcodegen,
            starred: false,
        })
    }
}

/// Names of the directory's entries, sorted for deterministic traversal.
/// Unreadable directories yield an empty list.
async fn read_dir_names(dir: &Path) -> Vec<String> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(err) => {
            warn!(dir = %dir.display(), %err, "skipping unreadable directory");
            return Vec::new();
        }
    };

    let mut names = Vec::new();
    loop {
        match entries.next_entry().await {
            Ok(Some(entry)) => names.push(entry.file_name().to_string_lossy().into_owned()),
            Ok(None) => break,
            Err(err) => {
                warn!(dir = %dir.display(), %err, "directory listing truncated");
                break;
            }
        }
    }
    names.sort();
    names
}
