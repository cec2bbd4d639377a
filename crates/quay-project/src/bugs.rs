//! Bug-report folders: one markdown file per bug under `_bugs_open` and
//! `_bugs_fixed`.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::model::{BugInfo, BugReport, BugStatus};

const OPEN_DIR: &str = "_bugs_open";
const FIXED_DIR: &str = "_bugs_fixed";

/// Count and parse both bug folders. `None` when neither folder holds any
/// reports, so callers can skip the card entirely.
pub async fn scan_bugs(project_dir: &Path) -> Option<BugInfo> {
    let mut bugs = Vec::new();

    let open_count = scan_folder(&project_dir.join(OPEN_DIR), BugStatus::Open, &mut bugs).await;
    let fixed_count = scan_folder(&project_dir.join(FIXED_DIR), BugStatus::Fixed, &mut bugs).await;

    if open_count == 0 && fixed_count == 0 {
        return None;
    }

    bugs.sort_by(|a, b| b.date.cmp(&a.date));

    Some(BugInfo {
        open_count,
        fixed_count,
        bugs,
    })
}

/// Returns how many markdown reports the folder held; files that cannot be
/// read still count but contribute no parsed entry.
async fn scan_folder(dir: &Path, status: BugStatus, bugs: &mut Vec<BugReport>) -> usize {
    let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
        return 0;
    };

    let mut names = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();

    let mut count = 0;
    for name in names {
        if !name.ends_with(".md") {
            continue;
        }
        count += 1;

        if let Some(bug) = parse_bug_file(&dir.join(&name), &name, status).await {
            bugs.push(bug);
        }
    }
    count
}

async fn parse_bug_file(path: &Path, filename: &str, status: BugStatus) -> Option<BugReport> {
    let content = tokio::fs::read_to_string(path).await.ok()?;

    static TITLE_RE: OnceLock<Regex> = OnceLock::new();
    let title_re = TITLE_RE.get_or_init(|| Regex::new(r"(?m)^#\s+(.+)$").expect("valid regex"));
    let title = title_re
        .captures(&content)
        .map(|caps| caps[1].to_string())
        .unwrap_or_else(|| filename.strip_suffix(".md").unwrap_or(filename).to_string());

    static DATE_RE: OnceLock<Regex> = OnceLock::new();
    let date_re = DATE_RE.get_or_init(|| Regex::new(r"^(\d{4}-\d{2}-\d{2})").expect("valid regex"));
    let date = date_re
        .captures(filename)
        .map(|caps| caps[1].to_string())
        .unwrap_or_default();

    Some(BugReport {
        filename: filename.to_string(),
        title,
        date,
        status,
    })
}
