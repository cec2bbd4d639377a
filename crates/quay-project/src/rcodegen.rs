//! Code-quality report scanning under `_rcodegen`.
//!
//! A structured `.grades.json` index is preferred. Without one, report
//! filenames matching `<name>-<tool>-<task>-<date>.md` are scanned for a
//! `TOTAL_SCORE: N/100` marker. Only the first 10 KiB of each report is
//! searched — reports can be arbitrarily large, and an unbounded regex scan
//! over them is a latent performance hole.

use std::collections::HashSet;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use tokio::io::AsyncReadExt;

use quay_core::fs;

use crate::model::{RcodegenGrade, RcodegenInfo, RcodegenTaskGrade, RcodegenTaskGrades};

const RCODEGEN_DIR: &str = "_rcodegen";
const GRADES_INDEX: &str = ".grades.json";

/// Bytes of each report searched for the score marker.
const SCORE_SCAN_BYTES: u64 = 10_240;

/// How many reports are retained on the aggregate.
const RECENT_GRADES: usize = 10;

const PRIMARY_TASKS: [&str; 4] = ["audit", "test", "fix", "refactor"];

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GradesIndex {
    grades: Vec<RcodegenGrade>,
}

/// Aggregate the `_rcodegen` folder, or `None` when it is absent or holds
/// no usable grades.
pub async fn scan_rcodegen(project_dir: &Path) -> Option<RcodegenInfo> {
    let report_dir = project_dir.join(RCODEGEN_DIR);
    if !fs::file_exists(&report_dir).await {
        return None;
    }

    let mut grades = match fs::read_text(&report_dir.join(GRADES_INDEX)).await {
        Some(text) => match serde_json::from_str::<GradesIndex>(&text) {
            Ok(index) => index.grades,
            Err(_) => scan_report_files(&report_dir).await,
        },
        None => scan_report_files(&report_dir).await,
    };

    if grades.is_empty() {
        return None;
    }

    grades.sort_by(|a, b| b.date.cmp(&a.date));

    let latest_grade = grades.first().map(|g| g.grade);
    let last_run = grades.first().map(|g| g.date.clone());

    let mut task_grades = RcodegenTaskGrades::default();
    for task in PRIMARY_TASKS {
        let bucket = match task {
            "audit" => &mut task_grades.audit,
            "test" => &mut task_grades.test,
            "fix" => &mut task_grades.fix,
            _ => &mut task_grades.refactor,
        };
        let mut seen_tools = HashSet::new();
        for grade in &grades {
            if grade.task == task && seen_tools.insert(grade.tool.clone()) {
                bucket.push(RcodegenTaskGrade {
                    grade: grade.grade,
                    tool: grade.tool.clone(),
                });
            }
        }
    }

    Some(RcodegenInfo {
        report_count: grades.len(),
        last_run,
        latest_grade,
        task_grades,
        recent_grades: grades.into_iter().take(RECENT_GRADES).collect(),
    })
}

async fn scan_report_files(report_dir: &Path) -> Vec<RcodegenGrade> {
    static NAME_RE: OnceLock<Regex> = OnceLock::new();
    let name_re = NAME_RE.get_or_init(|| {
        Regex::new(r"^.+-([a-z]+)-([a-z]+)-(\d{4}-\d{2}-\d{2})").expect("valid regex")
    });

    let Ok(mut entries) = tokio::fs::read_dir(report_dir).await else {
        return Vec::new();
    };

    let mut names = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();

    let mut grades = Vec::new();
    for name in names {
        if !name.ends_with(".md") {
            continue;
        }
        let Some(caps) = name_re.captures(&name) else {
            continue;
        };
        let (tool, task, date) = (caps[1].to_string(), caps[2].to_string(), caps[3].to_string());

        let Some(grade) = extract_score(&report_dir.join(&name)).await else {
            continue;
        };

        grades.push(RcodegenGrade {
            date: format!("{date}T00:00:00.000Z"),
            tool,
            task,
            grade,
            report_file: name,
        });
    }
    grades
}

/// Pull `TOTAL_SCORE: N/100` out of the head of a report file.
async fn extract_score(path: &Path) -> Option<f64> {
    static SCORE_RE: OnceLock<Regex> = OnceLock::new();
    let score_re = SCORE_RE.get_or_init(|| {
        Regex::new(r"(?i)TOTAL_SCORE:\s*(\d+(?:\.\d+)?)\s*/\s*100").expect("valid regex")
    });

    let file = tokio::fs::File::open(path).await.ok()?;
    let mut head = Vec::new();
    file.take(SCORE_SCAN_BYTES).read_to_end(&mut head).await.ok()?;

    let text = String::from_utf8_lossy(&head);
    score_re
        .captures(&text)
        .and_then(|caps| caps[1].parse::<f64>().ok())
}
