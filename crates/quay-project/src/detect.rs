//! Per-project detectors.
//!
//! Each one inspects a single project directory and extracts one fact.
//! They are independent, idempotent, and absence-tolerant: a missing or
//! unreadable input yields "not detected", never an error.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::SystemTime;

use quay_core::fs;

use crate::manifest::{self, PackageJson};

/// At most this many technology labels survive per project.
const MAX_TECH_LABELS: usize = 5;

const DESCRIPTION_MAX_CHARS: usize = 200;

struct TechDetection {
    label: &'static str,
    priority: u8,
}

/// JavaScript-ecosystem dependency → label, framework detections outranking
/// the generic runtime.
const JS_TECHS: &[(&str, &str, u8)] = &[
    ("next", "Next.js", 10),
    ("react", "React", 9),
    ("vue", "Vue", 9),
    ("svelte", "Svelte", 9),
    ("express", "Express", 8),
    ("fastify", "Fastify", 8),
    ("electron", "Electron", 9),
    ("tailwindcss", "Tailwind", 7),
    ("typescript", "TypeScript", 6),
];

const PYTHON_FRAMEWORKS: &[(&str, &str)] =
    &[("fastapi", "FastAPI"), ("django", "Django"), ("flask", "Flask")];

/// Detected technology labels, deduplicated and ordered by priority
/// (descending), truncated to the top five.
pub async fn tech_stack(project_dir: &Path) -> Vec<String> {
    let mut techs: Vec<TechDetection> = Vec::new();

    if let Some(pkg) = PackageJson::load(project_dir).await {
        for &(dep, label, priority) in JS_TECHS {
            if pkg.depends_on(dep) {
                techs.push(TechDetection { label, priority });
            }
        }
        // A package.json with none of the known frameworks still marks a
        // Node.js project.
        if techs.is_empty() {
            techs.push(TechDetection {
                label: "Node.js",
                priority: 5,
            });
        }
    }

    if let Some(py) = manifest::load_pyproject(project_dir).await {
        techs.push(TechDetection {
            label: "Python",
            priority: 10,
        });
        push_python_frameworks(&mut techs, &py.raw);
    } else if let Some(reqs) = fs::read_text(&project_dir.join("requirements.txt")).await {
        techs.push(TechDetection {
            label: "Python",
            priority: 10,
        });
        push_python_frameworks(&mut techs, &reqs);
    }

    if fs::file_exists(&project_dir.join("Cargo.toml")).await {
        techs.push(TechDetection {
            label: "Rust",
            priority: 10,
        });
    }

    if fs::file_exists(&project_dir.join("go.mod")).await {
        techs.push(TechDetection {
            label: "Go",
            priority: 10,
        });
    }

    // Stable sort: equal priorities keep detection order.
    techs.sort_by(|a, b| b.priority.cmp(&a.priority));

    let mut seen = std::collections::HashSet::new();
    techs
        .into_iter()
        .filter(|t| seen.insert(t.label))
        .take(MAX_TECH_LABELS)
        .map(|t| t.label.to_string())
        .collect()
}

fn push_python_frameworks(techs: &mut Vec<TechDetection>, manifest_text: &str) {
    for &(needle, label) in PYTHON_FRAMEWORKS {
        if manifest_text.contains(needle) {
            techs.push(TechDetection { label, priority: 8 });
        }
    }
}

/// Project description: the manifest's description field, else the first
/// real paragraph of a README (headings, images, and badge lines skipped),
/// truncated to ~200 characters.
pub async fn description(project_dir: &Path) -> Option<String> {
    if let Some(pkg) = PackageJson::load(project_dir).await {
        if let Some(text) = pkg.description {
            if !text.is_empty() {
                return Some(text);
            }
        }
    }

    const README_NAMES: &[&str] = &["README.md", "readme.md", "Readme.md", "README.txt", "README"];
    for name in README_NAMES {
        let Some(readme) = fs::read_text(&project_dir.join(name)).await else {
            continue;
        };
        if let Some(paragraph) = first_paragraph(&readme) {
            return Some(paragraph);
        }
    }

    None
}

fn first_paragraph(readme: &str) -> Option<String> {
    let mut description = String::new();
    let mut found_content = false;

    for line in readme.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            if found_content {
                break;
            }
            continue;
        }
        if trimmed.starts_with('#') {
            continue;
        }
        // Images and badge/link lines are noise, not prose.
        if trimmed.starts_with("![") || trimmed.starts_with('[') {
            continue;
        }

        found_content = true;
        if !description.is_empty() {
            description.push(' ');
        }
        description.push_str(trimmed);

        if description.chars().count() > DESCRIPTION_MAX_CHARS {
            break;
        }
    }

    if description.is_empty() {
        return None;
    }

    if description.chars().count() > DESCRIPTION_MAX_CHARS {
        let truncated: String = description.chars().take(DESCRIPTION_MAX_CHARS).collect();
        Some(format!("{truncated}..."))
    } else {
        Some(description)
    }
}

/// Version string: `VERSION` file first, then package.json, pyproject.toml,
/// and Cargo.toml. First hit wins.
pub async fn version(project_dir: &Path) -> Option<String> {
    if let Some(text) = fs::read_text(&project_dir.join("VERSION")).await {
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            return trimmed.lines().next().map(str::to_string);
        }
    }

    if let Some(pkg) = PackageJson::load(project_dir).await {
        if let Some(version) = pkg.version {
            if !version.is_empty() {
                return Some(version);
            }
        }
    }

    if let Some(py) = manifest::load_pyproject(project_dir).await {
        if let Some(version) = py.version {
            return Some(version);
        }
    }

    manifest::load_cargo_version(project_dir).await
}

pub async fn scripts(project_dir: &Path) -> Option<BTreeMap<String, String>> {
    PackageJson::load(project_dir).await?.scripts
}

pub async fn dependencies(project_dir: &Path) -> Option<BTreeMap<String, String>> {
    PackageJson::load(project_dir).await?.dependencies
}

/// Directory mtime; "now" when the stat fails so sorting stays total.
pub async fn last_modified(project_dir: &Path) -> SystemTime {
    match tokio::fs::metadata(project_dir).await {
        Ok(meta) => meta.modified().unwrap_or_else(|_| SystemTime::now()),
        Err(_) => SystemTime::now(),
    }
}
