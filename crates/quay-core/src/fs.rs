//! Tolerant async filesystem helpers.
//!
//! Detectors treat every filesystem or parse failure as "not detected", so
//! these helpers collapse errors into `None` instead of surfacing them.

use std::path::Path;

use serde::de::DeserializeOwned;

/// Whether a path exists (file or directory). Permission errors count as
/// absent.
pub async fn file_exists(path: &Path) -> bool {
    tokio::fs::metadata(path).await.is_ok()
}

/// Read a file as UTF-8 text, or `None` if it is missing, unreadable, or
/// not valid UTF-8.
pub async fn read_text(path: &Path) -> Option<String> {
    tokio::fs::read_to_string(path).await.ok()
}

/// Read and deserialize a JSON file, or `None` on any I/O or parse failure.
pub async fn read_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let text = read_text(path).await?;
    serde_json::from_str(&text).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[tokio::test]
    async fn missing_files_are_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        assert!(!file_exists(&path).await);
        assert_eq!(read_text(&path).await, None);
        assert_eq!(read_json::<BTreeMap<String, String>>(&path).await, None);
    }

    #[tokio::test]
    async fn malformed_json_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        tokio::fs::write(&path, b"{not json").await.unwrap();
        assert!(file_exists(&path).await);
        assert_eq!(read_json::<BTreeMap<String, String>>(&path).await, None);
    }

    #[tokio::test]
    async fn reads_valid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ok.json");
        tokio::fs::write(&path, br#"{"a": "1"}"#).await.unwrap();
        let parsed: BTreeMap<String, String> = read_json(&path).await.unwrap();
        assert_eq!(parsed.get("a").map(String::as_str), Some("1"));
    }
}
