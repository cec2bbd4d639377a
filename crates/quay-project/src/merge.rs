//! Layering user overrides on top of derived project data.
//!
//! The store never mutates derived fields; callers apply overrides at read
//! time. A present override field replaces the derived value 1:1, an absent
//! one leaves it untouched.

use std::collections::BTreeMap;

use quay_config::DashboardConfig;
use quay_core::Status;

use crate::model::Project;

/// Apply override metadata to every project in the list.
pub fn apply_overrides(projects: Vec<Project>, config: &DashboardConfig) -> Vec<Project> {
    projects
        .into_iter()
        .map(|mut project| {
            let Some(meta) = config.projects.get(&project.slug) else {
                project.starred = false;
                return project;
            };

            if let Some(status) = meta.status {
                project.status = status;
            }
            if let Some(name) = &meta.custom_name {
                if !name.is_empty() {
                    project.name = name.clone();
                }
            }
            if let Some(description) = &meta.custom_description {
                if !description.is_empty() {
                    project.description = Some(description.clone());
                }
            }
            project.starred = meta.starred.unwrap_or(false);
            project
        })
        .collect()
}

/// Per-status totals over an (already merged) project list. Every status
/// appears, zero counts included.
pub fn status_counts(projects: &[Project]) -> BTreeMap<Status, usize> {
    let mut counts: BTreeMap<Status, usize> = Status::ALL.iter().map(|s| (*s, 0)).collect();
    for project in projects {
        *counts.entry(project.status).or_default() += 1;
    }
    counts
}

/// Case-insensitive match against name, description, and tech stack.
pub fn matches_search(project: &Project, query_lowercase: &str) -> bool {
    if project.name.to_lowercase().contains(query_lowercase) {
        return true;
    }
    if let Some(description) = &project.description {
        if description.to_lowercase().contains(query_lowercase) {
            return true;
        }
    }
    project
        .tech_stack
        .iter()
        .any(|tech| tech.to_lowercase().contains(query_lowercase))
}

/// Display order: starred first, then name, case-insensitively.
pub fn sort_for_display(projects: &mut [Project]) {
    projects.sort_by(|a, b| {
        b.starred
            .cmp(&a.starred)
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
}
