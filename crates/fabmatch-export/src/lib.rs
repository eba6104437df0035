//! Export formats for fabmatch results.
//!
//! Supported outputs:
//! - JSON (one object per match, vectors as arrays)
//! - CSV (review table, vectors split into columns)
//! - Finalized review (edited CSV copied next to its JSON rendering)

pub mod error;
pub mod json;
pub mod review;
pub mod table;

use std::path::Path;

use fabmatch_core::MatchRecord;

pub use error::{ExportError, Result};
pub use json::MatchRow;
pub use review::{FinalizedReview, ReviewRow};

/// Export matches as a JSON document.
pub fn export_json(path: &Path, records: &[MatchRecord]) -> Result<()> {
    json::write(path, records)
}

/// Export matches as a CSV review table.
pub fn export_csv(path: &Path, records: &[MatchRecord]) -> Result<()> {
    table::write(path, records)
}

/// Export both documents.
pub fn export_results(json_path: &Path, csv_path: &Path, records: &[MatchRecord]) -> Result<()> {
    export_json(json_path, records)?;
    export_csv(csv_path, records)
}

/// Publish a reviewed CSV into `out_dir` along with its JSON rendering.
pub fn finalize_review(csv_path: &Path, out_dir: &Path) -> Result<FinalizedReview> {
    review::finalize(csv_path, out_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fabmatch_core::{MatchMethod, ModelEntity, PartRecord};
    use glam::DVec3;
    use tempfile::TempDir;

    pub(crate) fn sample_records() -> Vec<MatchRecord> {
        vec![
            MatchRecord {
                entity: ModelEntity {
                    id: "e1".into(),
                    name_key: "Träger 1.nc".into(),
                    axis: DVec3::Z,
                    ref_direction: DVec3::X,
                    location: DVec3::new(1.0, 2.0, 3.0),
                },
                part: PartRecord {
                    id: "p1".into(),
                    name_key: "Träger 1.nc".into(),
                    rx: DVec3::X,
                    ry: DVec3::Y,
                    base: DVec3::new(10.0, 20.0, 30.0),
                },
                error: 0.0,
                method: MatchMethod::UniqueName,
                needs_manual_check: false,
            },
            MatchRecord {
                entity: ModelEntity {
                    id: "e2".into(),
                    name_key: "B-2.nc".into(),
                    axis: DVec3::Z,
                    ref_direction: DVec3::Y,
                    location: DVec3::ZERO,
                },
                part: PartRecord {
                    id: "p2".into(),
                    name_key: "B-2.nc".into(),
                    rx: DVec3::X,
                    ry: DVec3::Y,
                    base: DVec3::ZERO,
                },
                error: 2.0,
                method: MatchMethod::Assignment,
                needs_manual_check: true,
            },
        ]
    }

    #[test]
    fn test_export_results_creates_both_files() {
        let dir = TempDir::new().unwrap();
        let json_path = dir.path().join("out/matches.json");
        let csv_path = dir.path().join("out/csv/matches.csv");

        export_results(&json_path, &csv_path, &sample_records()).unwrap();

        assert!(json_path.exists());
        let csv = std::fs::read_to_string(&csv_path).unwrap();
        assert_eq!(csv.lines().count(), 3);
    }

    #[test]
    fn test_exported_csv_finalizes() {
        let dir = TempDir::new().unwrap();
        let csv_path = dir.path().join("matches.csv");
        export_csv(&csv_path, &sample_records()).unwrap();

        let result = finalize_review(&csv_path, &dir.path().join("final")).unwrap();
        assert_eq!(result.rows, 2);

        let rows: Vec<ReviewRow> =
            serde_json::from_str(&std::fs::read_to_string(&result.json_path).unwrap()).unwrap();
        assert_eq!(rows[1]["XML_ID"].as_deref(), Some("p2"));
        assert_eq!(rows[1]["NeedManualCheck"].as_deref(), Some("true"));
    }
}
