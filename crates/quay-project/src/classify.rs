//! Decides what counts as a project and which status bucket it lands in.

use std::path::{Component, Path};

use quay_core::{fs, Status};

/// Files or directories whose presence marks a directory as a project root.
pub const PROJECT_MARKERS: &[&str] = &[
    "package.json",
    "pyproject.toml",
    "requirements.txt",
    "Cargo.toml",
    "go.mod",
    "Makefile",
    ".git",
    "VERSION",
];

/// Directory names that are never projects and never scanned into.
pub const IGNORED_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    "__pycache__",
    ".next",
    "dist",
    "build",
    "target",
    ".obsidian",
    ".stfolder",
    ".pytest_cache",
    ".codemachine",
    ".claude",
];

/// Status folder names, in the fixed order they are scanned. `active` has
/// no folder: it is the default for anything living directly under the
/// root or inside a suite.
pub const STATUS_FOLDERS: &[(&str, Status)] = &[
    ("_crawlers", Status::Crawlers),
    ("_research_and_demos", Status::Research),
    ("_tools", Status::Tools),
    ("_icebox", Status::Icebox),
    ("_old", Status::Archived),
];

pub fn is_ignored_name(name: &str) -> bool {
    IGNORED_DIRS.contains(&name) || name.starts_with(".sync-conflict")
}

pub fn status_for_folder(name: &str) -> Option<Status> {
    STATUS_FOLDERS
        .iter()
        .find(|(folder, _)| *folder == name)
        .map(|(_, status)| *status)
}

/// Whether `path` contains at least one recognized project marker.
///
/// Directories under status subtrees skip this check: living there is
/// already sufficient evidence of project-hood.
pub async fn is_project_directory(path: &Path) -> bool {
    for marker in PROJECT_MARKERS {
        if fs::file_exists(&path.join(marker)).await {
            return true;
        }
    }
    false
}

/// Status derived from the shallowest status-folder component of `path`
/// relative to `root`; `active` when none matches (including paths outside
/// the root entirely).
pub fn determine_status(root: &Path, path: &Path) -> Status {
    let Ok(relative) = path.strip_prefix(root) else {
        return Status::Active;
    };

    for component in relative.components() {
        if let Component::Normal(name) = component {
            if let Some(status) = name.to_str().and_then(status_for_folder) {
                return status;
            }
        }
    }

    Status::Active
}

/// Suite containers group related projects under one label.
pub fn is_suite_directory(name: &str) -> bool {
    name.ends_with("_suite")
}

/// Display label for a suite directory: `app_email4ai_suite` → `App Email4ai`.
pub fn format_suite_name(dir_name: &str) -> String {
    let stem = dir_name.strip_suffix("_suite").unwrap_or(dir_name);
    stem.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn status_defaults_to_active() {
        let root = PathBuf::from("/code");
        assert_eq!(determine_status(&root, &root.join("proj")), Status::Active);
        assert_eq!(determine_status(&root, Path::new("/elsewhere/proj")), Status::Active);
    }

    #[test]
    fn shallowest_status_folder_wins() {
        let root = PathBuf::from("/code");
        assert_eq!(determine_status(&root, &root.join("_icebox/proj")), Status::Icebox);
        assert_eq!(
            determine_status(&root, &root.join("_icebox/_old/proj")),
            Status::Icebox
        );
        assert_eq!(determine_status(&root, &root.join("_old/sub/proj")), Status::Archived);
        assert_eq!(
            determine_status(&root, &root.join("_research_and_demos/x")),
            Status::Research
        );
    }

    #[test]
    fn suite_names_title_case() {
        assert!(is_suite_directory("builder_suite"));
        assert!(!is_suite_directory("builder"));
        assert_eq!(format_suite_name("builder_suite"), "Builder");
        assert_eq!(format_suite_name("app_email4ai_suite"), "App Email4ai");
    }

    #[test]
    fn sync_conflict_dirs_are_ignored() {
        assert!(is_ignored_name("node_modules"));
        assert!(is_ignored_name(".sync-conflict-20240101"));
        assert!(!is_ignored_name("my-project"));
    }

    #[tokio::test]
    async fn markers_gate_project_hood() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!is_project_directory(dir.path()).await);
        tokio::fs::write(dir.path().join("Cargo.toml"), b"[package]")
            .await
            .unwrap();
        assert!(is_project_directory(dir.path()).await);
    }
}
