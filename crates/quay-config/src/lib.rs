//! Configuration for Quay: the validated process environment and the
//! per-project metadata override store.
//!
//! The override store is a single flat JSON file living at the scan root.
//! User edits (renames, status moves, stars, tags, notes) are layered over
//! filesystem-derived project data at read time; the store itself never
//! touches derived data.

mod env;
mod store;

pub use env::{Env, EnvError, LogLevel};
pub use store::{
    AppSettings, ConfigStore, DashboardConfig, ProjectMetadata, SettingsPatch, CONFIG_FILENAME,
};
