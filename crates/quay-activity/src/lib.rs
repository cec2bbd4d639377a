//! Git statistics across the scanned projects.
//!
//! Commit feeds and line-velocity numbers are gathered by fanning
//! `git log --numstat` out over every project that has git, with a small
//! worker cap: dozens of simultaneous git subprocesses would thrash the
//! disk and file-descriptor table for no wall-clock gain. One project's
//! git failure (missing binary, timeout, corrupt repo) only loses that
//! project's numbers.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use quay_process::{parse_numstat_line, run_git, RunOptions};
use quay_project::Project;
use quay_work::{work_map, WorkOptions};

/// Workers for git fan-out. Three is enough to hide subprocess latency
/// without stacking up dozens of git processes.
const GIT_WORKERS: usize = 3;

/// Per-project git timeout; far below the general subprocess default since
/// a log over a healthy repo returns in well under a second.
const GIT_TIMEOUT: Duration = Duration::from_secs(15);

/// Sentinel separating commits in the custom log format.
const COMMIT_START: &str = "COMMIT_START";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitInfo {
    pub hash: String,
    pub message: String,
    pub author: String,
    /// Author date, ISO-8601.
    pub date: String,
    pub project: String,
    pub project_slug: String,
    pub lines_added: u64,
    pub lines_removed: u64,
}

/// Added/removed line totals for one day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayStat {
    pub lines_added: u64,
    pub lines_removed: u64,
}

#[derive(Debug, Clone)]
struct GitTarget {
    name: String,
    slug: String,
    path: PathBuf,
}

fn git_targets(projects: &[Project]) -> Vec<GitTarget> {
    projects
        .iter()
        .filter(|p| p.has_git)
        .map(|p| GitTarget {
            name: p.name.clone(),
            slug: p.slug.clone(),
            path: p.path.clone(),
        })
        .collect()
}

/// Recent commits across every git-backed project, newest first.
///
/// `per_project` bounds how many commits each repository contributes.
pub async fn collect_recent_commits(projects: &[Project], per_project: usize) -> Vec<CommitInfo> {
    let targets = git_targets(projects);
    let limit = per_project.to_string();

    let results = work_map(
        targets,
        move |target: GitTarget| {
            let limit = limit.clone();
            async move {
                let options = RunOptions::new(&target.path).timeout(GIT_TIMEOUT);
                let stdout = run_git(
                    &[
                        "log",
                        "--numstat",
                        "-n",
                        &limit,
                        "--pretty=format:COMMIT_START%n%H%n%s%n%an%n%aI",
                        "--no-merges",
                    ],
                    &options,
                )
                .await?;
                Ok(parse_commit_log(&stdout, &target.name, &target.slug))
            }
        },
        WorkOptions {
            workers: Some(GIT_WORKERS),
        },
    )
    .await;

    let mut commits: Vec<CommitInfo> = Vec::new();
    let mut failed = 0usize;
    for result in results {
        match result.result {
            Ok(batch) => commits.extend(batch),
            Err(_) => failed += 1,
        }
    }
    if failed > 0 {
        debug!(failed, "some projects contributed no commits");
    }

    commits.sort_by(|a, b| b.date.cmp(&a.date));
    commits
}

/// Parse the `COMMIT_START`-delimited log format produced by
/// [`collect_recent_commits`]'s git invocation.
pub fn parse_commit_log(stdout: &str, project: &str, project_slug: &str) -> Vec<CommitInfo> {
    let mut commits = Vec::new();

    for block in stdout.split(COMMIT_START) {
        let block = block.trim();
        if block.is_empty() {
            continue;
        }

        let lines: Vec<&str> = block.lines().collect();
        if lines.len() < 4 {
            continue;
        }

        let mut lines_added = 0;
        let mut lines_removed = 0;
        for line in &lines[4..] {
            if let Some((added, removed)) = parse_numstat_line(line) {
                lines_added += added;
                lines_removed += removed;
            }
        }

        commits.push(CommitInfo {
            hash: lines[0].trim().to_string(),
            message: lines[1].trim().to_string(),
            author: lines[2].trim().to_string(),
            date: lines[3].trim().to_string(),
            project: project.to_string(),
            project_slug: project_slug.to_string(),
            lines_added,
            lines_removed,
        });
    }

    commits
}

/// Per-day line totals over the last `days` days, merged across every
/// git-backed project and keyed by `YYYY-MM-DD` (so iteration order is
/// chronological). Days without activity are absent; zero-filling a date
/// range is left to presentation.
pub async fn collect_velocity(projects: &[Project], days: u32) -> BTreeMap<String, DayStat> {
    let targets = git_targets(projects);
    let since = format!("--since={days} days ago");

    let results = work_map(
        targets,
        move |target: GitTarget| {
            let since = since.clone();
            async move {
                let options = RunOptions::new(&target.path).timeout(GIT_TIMEOUT);
                let stdout = run_git(
                    &["log", "--numstat", &since, "--pretty=format:%ad", "--date=short"],
                    &options,
                )
                .await?;
                Ok(parse_velocity_log(&stdout))
            }
        },
        WorkOptions {
            workers: Some(GIT_WORKERS),
        },
    )
    .await;

    let mut merged: BTreeMap<String, DayStat> = BTreeMap::new();
    for result in results {
        let Ok(local) = result.result else {
            continue;
        };
        for (date, stat) in local {
            let entry = merged.entry(date).or_default();
            entry.lines_added += stat.lines_added;
            entry.lines_removed += stat.lines_removed;
        }
    }
    merged
}

/// Parse `git log --numstat --pretty=format:%ad --date=short` output into
/// per-day totals.
pub fn parse_velocity_log(stdout: &str) -> BTreeMap<String, DayStat> {
    static DATE_RE: OnceLock<Regex> = OnceLock::new();
    let date_re = DATE_RE.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid regex"));

    let mut totals: BTreeMap<String, DayStat> = BTreeMap::new();
    let mut current_date: Option<String> = None;

    for line in stdout.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if date_re.is_match(trimmed) {
            current_date = Some(trimmed.to_string());
            continue;
        }

        if let (Some(date), Some((added, removed))) =
            (&current_date, parse_numstat_line(trimmed))
        {
            let entry = totals.entry(date.clone()).or_default();
            entry.lines_added += added;
            entry.lines_removed += removed;
        }
    }

    totals
}
