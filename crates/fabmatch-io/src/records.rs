//! Raw-record JSON files.
//!
//! Extraction output is stored as a pretty-printed JSON array so it can be
//! inspected or edited before matching. Loading is lenient per record: one
//! malformed element does not discard the rest of the file.

use std::fs;
use std::path::Path;

use fabmatch_core::{RawEntity, RawPart};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{IoError, Result};

/// Load a JSON array of records, dropping elements that fail to decode.
pub fn load_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let text = fs::read_to_string(path).map_err(|e| IoError::file(path, e))?;
    let values: Vec<Value> = serde_json::from_str(&text)?;

    let total = values.len();
    let records: Vec<T> = values
        .into_iter()
        .filter_map(|value| serde_json::from_value(value).ok())
        .collect();

    debug!(
        path = %path.display(),
        records = records.len(),
        dropped = total - records.len(),
        "loaded records"
    );
    Ok(records)
}

pub fn load_entities(path: &Path) -> Result<Vec<RawEntity>> {
    load_records(path)
}

pub fn load_parts(path: &Path) -> Result<Vec<RawPart>> {
    load_records(path)
}

/// Write records as a pretty-printed JSON array, creating parent directories.
pub fn save_records<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| IoError::file(parent, e))?;
    }
    let json = serde_json::to_string_pretty(records)?;
    fs::write(path, json).map_err(|e| IoError::file(path, e))?;
    debug!(path = %path.display(), records = records.len(), "saved records");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_creates_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/out/parts.json");
        let parts = vec![RawPart {
            id: Some("1".into()),
            reference: vec!["a.nc".into()],
            ..RawPart::default()
        }];

        save_records(&path, &parts).unwrap();
        assert_eq!(load_parts(&path).unwrap(), parts);

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"Reference\""));
        assert!(text.contains('\n'));
    }

    #[test]
    fn test_non_ascii_is_written_verbatim() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("parts.json");
        let parts = vec![RawPart {
            name: Some("Träger".into()),
            ..RawPart::default()
        }];
        save_records(&path, &parts).unwrap();
        assert!(fs::read_to_string(&path).unwrap().contains("Träger"));
    }

    #[test]
    fn test_malformed_records_are_dropped_individually() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("entities.json");
        fs::write(
            &path,
            r#"[
                {"GlobalId": "a", "Type": "IfcBeam", "Properties": {}},
                {"GlobalId": 42},
                "not a record",
                {"GlobalId": "b", "Type": "IfcPlate", "Properties": {}, "LocationRotation": null}
            ]"#,
        )
        .unwrap();

        let entities = load_entities(&path).unwrap();
        let ids: Vec<_> = entities.iter().map(|e| e.global_id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[test]
    fn test_missing_file_names_the_path() {
        let err = load_parts(Path::new("/nonexistent/parts.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/parts.json"));
    }

    #[test]
    fn test_top_level_must_be_an_array() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, r#"{"ID": "1"}"#).unwrap();
        assert!(matches!(load_parts(&path), Err(IoError::Json(_))));
    }
}
