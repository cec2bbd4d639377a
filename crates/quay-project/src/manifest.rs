//! Typed parsers for the manifest formats the detectors inspect.
//!
//! Each loader returns `None` when its file is missing or malformed; the
//! detectors never distinguish the two.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use quay_core::fs;

/// The slice of `package.json` the detectors care about.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PackageJson {
    pub description: Option<String>,
    pub version: Option<String>,
    pub dependencies: Option<BTreeMap<String, String>>,
    pub dev_dependencies: Option<BTreeMap<String, String>>,
    pub scripts: Option<BTreeMap<String, String>>,
}

impl PackageJson {
    pub async fn load(project_dir: &Path) -> Option<Self> {
        fs::read_json(&project_dir.join("package.json")).await
    }

    /// Whether `name` appears in dependencies or devDependencies.
    pub fn depends_on(&self, name: &str) -> bool {
        self.dependencies
            .as_ref()
            .is_some_and(|deps| deps.contains_key(name))
            || self
                .dev_dependencies
                .as_ref()
                .is_some_and(|deps| deps.contains_key(name))
    }
}

/// `pyproject.toml`: the raw text is kept because framework hints are
/// substring heuristics, while the version comes from the parsed document
/// (`[project]` or `[tool.poetry]`).
#[derive(Debug)]
pub struct PyProject {
    pub raw: String,
    pub version: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PyProjectDoc {
    project: Option<PyProjectTable>,
    tool: Option<PyProjectTool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PyProjectTool {
    poetry: Option<PyProjectTable>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PyProjectTable {
    version: Option<String>,
}

pub async fn load_pyproject(project_dir: &Path) -> Option<PyProject> {
    let raw = fs::read_text(&project_dir.join("pyproject.toml")).await?;
    let version = toml::from_str::<PyProjectDoc>(&raw).ok().and_then(|doc| {
        doc.project
            .and_then(|p| p.version)
            .or_else(|| doc.tool.and_then(|t| t.poetry).and_then(|p| p.version))
    });
    Some(PyProject { raw, version })
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CargoDoc {
    package: Option<CargoPackage>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CargoPackage {
    // `version.workspace = true` makes this a table, so accept any value.
    version: Option<toml::Value>,
}

/// The `[package] version` of a `Cargo.toml`, when it is a plain string.
pub async fn load_cargo_version(project_dir: &Path) -> Option<String> {
    let raw = fs::read_text(&project_dir.join("Cargo.toml")).await?;
    let doc: CargoDoc = toml::from_str(&raw).ok()?;
    doc.package?
        .version
        .and_then(|value| value.as_str().map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn write(dir: &Path, name: &str, contents: &str) {
        tokio::fs::write(dir.join(name), contents).await.unwrap();
    }

    #[tokio::test]
    async fn package_json_dependency_lookup_spans_dev_deps() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "package.json",
            r#"{"dependencies": {"react": "18.0.0"}, "devDependencies": {"typescript": "5.0.0"}}"#,
        )
        .await;

        let pkg = PackageJson::load(dir.path()).await.unwrap();
        assert!(pkg.depends_on("react"));
        assert!(pkg.depends_on("typescript"));
        assert!(!pkg.depends_on("vue"));
    }

    #[tokio::test]
    async fn malformed_package_json_is_none() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "package.json", "{oops").await;
        assert!(PackageJson::load(dir.path()).await.is_none());
    }

    #[tokio::test]
    async fn pyproject_version_prefers_project_table() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "pyproject.toml",
            "[project]\nname = \"svc\"\nversion = \"2.1.0\"\n\n[tool.poetry]\nversion = \"9.9.9\"\n",
        )
        .await;

        let py = load_pyproject(dir.path()).await.unwrap();
        assert_eq!(py.version.as_deref(), Some("2.1.0"));
    }

    #[tokio::test]
    async fn pyproject_falls_back_to_poetry_version() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "pyproject.toml",
            "[tool.poetry]\nname = \"svc\"\nversion = \"0.3.0\"\n",
        )
        .await;

        let py = load_pyproject(dir.path()).await.unwrap();
        assert_eq!(py.version.as_deref(), Some("0.3.0"));
    }

    #[tokio::test]
    async fn cargo_workspace_version_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "Cargo.toml",
            "[package]\nname = \"thing\"\nversion.workspace = true\n",
        )
        .await;
        assert_eq!(load_cargo_version(dir.path()).await, None);

        write(
            dir.path(),
            "Cargo.toml",
            "[package]\nname = \"thing\"\nversion = \"1.4.2\"\n",
        )
        .await;
        assert_eq!(load_cargo_version(dir.path()).await.as_deref(), Some("1.4.2"));
    }
}
