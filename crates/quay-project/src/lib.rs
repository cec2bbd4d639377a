//! Project discovery and aggregation for Quay.
//!
//! This crate turns a managed directory tree into a list of [`Project`]s:
//! - classification (marker files, status folders, suites)
//! - per-directory detectors (tech stack, git, versions, bug and
//!   code-quality reports), all absence-tolerant
//! - the walker that assembles the list and resolves slug collisions
//! - a TTL cache that coalesces concurrent scans
//! - override layering from the metadata store

pub mod bugs;
pub mod classify;
pub mod detect;
pub mod git_meta;
pub mod manifest;
pub mod merge;
pub mod rcodegen;

mod cache;
mod model;
mod scan;

pub use cache::{ProjectSource, ScanCache, ScanCacheError, SCAN_CACHE_TTL};
pub use model::{
    BugInfo, BugReport, BugStatus, Project, RcodegenGrade, RcodegenInfo, RcodegenTaskGrade,
    RcodegenTaskGrades,
};
pub use scan::Scanner;
