use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use quay_core::Status;

/// Name of the flat config file kept at the scan root.
pub const CONFIG_FILENAME: &str = ".quay.json";

/// User-supplied overrides for one project, keyed by slug.
///
/// Every field is optional: a present field replaces the derived value at
/// read time, an absent field leaves it untouched. Entries whose slug no
/// longer matches any scanned project are harmless and retained.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starred: Option<bool>,
}

impl ProjectMetadata {
    /// Merge `patch` over `self`: present fields win, absent fields keep
    /// the current value.
    fn apply(&mut self, patch: ProjectMetadata) {
        let ProjectMetadata {
            status,
            custom_name,
            custom_description,
            tags,
            notes,
            starred,
        } = patch;
        if status.is_some() {
            self.status = status;
        }
        if custom_name.is_some() {
            self.custom_name = custom_name;
        }
        if custom_description.is_some() {
            self.custom_description = custom_description;
        }
        if tags.is_some() {
            self.tags = tags;
        }
        if notes.is_some() {
            self.notes = notes;
        }
        if starred.is_some() {
            self.starred = starred;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    pub sidebar_collapsed: bool,
    pub default_status: Status,
    pub terminal_height: u32,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            sidebar_collapsed: false,
            default_status: Status::Active,
            terminal_height: 300,
        }
    }
}

/// Partial settings update; present fields replace the stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsPatch {
    pub sidebar_collapsed: Option<bool>,
    pub default_status: Option<Status>,
    pub terminal_height: Option<u32>,
}

/// Everything persisted for the dashboard: per-slug overrides plus app
/// settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub projects: BTreeMap<String, ProjectMetadata>,
    pub settings: AppSettings,
}

/// Read/merge/write access to the flat JSON config file.
///
/// Writes are read-modify-write without a file lock: concurrent writers can
/// lose updates. That matches the single-local-user deployment this serves;
/// callers must not assume stronger guarantees.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    /// Store for the config file under `root` (the scan root).
    pub fn new(root: &Path) -> Self {
        Self {
            path: root.join(CONFIG_FILENAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the config, falling back to defaults when the file is missing
    /// or malformed. Never errors.
    pub async fn read(&self) -> DashboardConfig {
        let Some(text) = quay_core::fs::read_text(&self.path).await else {
            return DashboardConfig::default();
        };
        match serde_json::from_str(&text) {
            Ok(config) => config,
            Err(err) => {
                warn!(path = %self.path.display(), %err, "ignoring malformed config file");
                DashboardConfig::default()
            }
        }
    }

    pub async fn write(&self, config: &DashboardConfig) -> io::Result<()> {
        let json = serde_json::to_string_pretty(config).expect("config serializes");
        tokio::fs::write(&self.path, json).await
    }

    /// Override metadata for one slug, if any.
    pub async fn get(&self, slug: &str) -> Option<ProjectMetadata> {
        self.read().await.projects.get(slug).cloned()
    }

    /// Merge `patch` into the entry for `slug`, creating it if needed.
    pub async fn set(&self, slug: &str, patch: ProjectMetadata) -> io::Result<()> {
        let mut config = self.read().await;
        config.projects.entry(slug.to_string()).or_default().apply(patch);
        self.write(&config).await
    }

    /// Merge a partial settings update into the stored settings.
    pub async fn update_settings(&self, patch: SettingsPatch) -> io::Result<()> {
        let mut config = self.read().await;
        if let Some(value) = patch.sidebar_collapsed {
            config.settings.sidebar_collapsed = value;
        }
        if let Some(value) = patch.default_status {
            config.settings.default_status = value;
        }
        if let Some(value) = patch.terminal_height {
            config.settings.terminal_height = value;
        }
        self.write(&config).await
    }
}
