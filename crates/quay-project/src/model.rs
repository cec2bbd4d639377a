use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use quay_core::Status;

/// A classified, metadata-enriched view of one directory in the managed
/// tree.
///
/// Projects are rebuilt on every scan and never persisted; `path` is the
/// only identity anchor that survives renames. Optional fields mean "not
/// detected", never an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub slug: String,
    pub name: String,
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub suite: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,
    pub status: Status,
    pub tech_stack: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub version: Option<String>,
    /// Directory mtime, serialized as milliseconds since the Unix epoch.
    #[serde(with = "timestamp_millis")]
    pub last_modified: SystemTime,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub git_branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub git_remote: Option<String>,
    pub has_git: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub dependencies: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub scripts: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub bugs: Option<BugInfo>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub rcodegen: Option<RcodegenInfo>,
    /// Sourced entirely from the override store; scans always produce
    /// `false`.
    #[serde(default)]
    pub starred: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BugStatus {
    Open,
    Fixed,
}

/// One markdown bug report inside `_bugs_open` / `_bugs_fixed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BugReport {
    pub filename: String,
    /// First `# ` heading, or the filename stem when none exists.
    pub title: String,
    /// `YYYY-MM-DD` filename prefix; empty when the filename has none.
    pub date: String,
    pub status: BugStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BugInfo {
    pub open_count: usize,
    pub fixed_count: usize,
    /// Sorted newest-first by date.
    pub bugs: Vec<BugReport>,
}

/// One graded code-quality report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RcodegenGrade {
    pub date: String,
    pub tool: String,
    pub task: String,
    pub grade: f64,
    pub report_file: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RcodegenTaskGrade {
    pub grade: f64,
    pub tool: String,
}

/// Latest grade per tool for each of the primary task types.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RcodegenTaskGrades {
    pub audit: Vec<RcodegenTaskGrade>,
    pub test: Vec<RcodegenTaskGrade>,
    pub fix: Vec<RcodegenTaskGrade>,
    pub refactor: Vec<RcodegenTaskGrade>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RcodegenInfo {
    pub report_count: usize,
    pub last_run: Option<String>,
    /// 0–100 score of the most recent report.
    pub latest_grade: Option<f64>,
    pub task_grades: RcodegenTaskGrades,
    /// The 10 most recent reports, newest first.
    pub recent_grades: Vec<RcodegenGrade>,
}

mod timestamp_millis {
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &SystemTime, serializer: S) -> Result<S::Ok, S::Error> {
        let millis = time
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SystemTime, D::Error> {
        let millis = u64::deserialize(deserializer)?;
        Ok(UNIX_EPOCH + Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn serializes_camel_case_with_millis() {
        let project = Project {
            slug: "proj-a".to_string(),
            name: "proj-a".to_string(),
            path: PathBuf::from("/code/proj-a"),
            suite: None,
            description: None,
            status: Status::Active,
            tech_stack: vec!["Rust".to_string()],
            version: None,
            last_modified: UNIX_EPOCH + Duration::from_millis(1_700_000_000_000),
            git_branch: Some("main".to_string()),
            git_remote: None,
            has_git: true,
            dependencies: None,
            scripts: None,
            bugs: None,
            rcodegen: None,
            starred: false,
        };

        let json = serde_json::to_value(&project).unwrap();
        assert_eq!(json["lastModified"], 1_700_000_000_000u64);
        assert_eq!(json["hasGit"], true);
        assert_eq!(json["techStack"][0], "Rust");
        assert_eq!(json["gitBranch"], "main");
        // Undetected fields are omitted, not null.
        assert!(json.get("gitRemote").is_none());

        let back: Project = serde_json::from_value(json).unwrap();
        assert_eq!(back, project);
    }
}
