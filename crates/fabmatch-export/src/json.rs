//! JSON result document.

use std::path::Path;

use fabmatch_core::{MatchMethod, MatchRecord};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ensure_parent, ExportError, Result};

/// One exported match, with both sides' geometry carried through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRow {
    #[serde(rename = "IFC_ID")]
    pub ifc_id: String,
    #[serde(rename = "XML_ID")]
    pub xml_id: String,
    #[serde(rename = "Error")]
    pub error: f64,
    #[serde(rename = "Method")]
    pub method: MatchMethod,
    #[serde(rename = "NC_Name")]
    pub nc_name: String,
    #[serde(rename = "IFC_Location")]
    pub ifc_location: [f64; 3],
    #[serde(rename = "IFC_Axis")]
    pub ifc_axis: [f64; 3],
    #[serde(rename = "IFC_RefDirection")]
    pub ifc_ref_direction: [f64; 3],
    #[serde(rename = "XML_Base")]
    pub xml_base: [f64; 3],
    #[serde(rename = "XML_Rx")]
    pub xml_rx: [f64; 3],
    #[serde(rename = "XML_Ry")]
    pub xml_ry: [f64; 3],
    #[serde(rename = "NeedManualCheck")]
    pub need_manual_check: bool,
}

impl From<&MatchRecord> for MatchRow {
    fn from(record: &MatchRecord) -> Self {
        Self {
            ifc_id: record.entity.id.clone(),
            xml_id: record.part.id.clone(),
            error: record.error,
            method: record.method,
            nc_name: record.name_key().to_string(),
            ifc_location: record.entity.location.to_array(),
            ifc_axis: record.entity.axis.to_array(),
            ifc_ref_direction: record.entity.ref_direction.to_array(),
            xml_base: record.part.base.to_array(),
            xml_rx: record.part.rx.to_array(),
            xml_ry: record.part.ry.to_array(),
            need_manual_check: record.needs_manual_check,
        }
    }
}

pub fn rows(records: &[MatchRecord]) -> Vec<MatchRow> {
    records.iter().map(MatchRow::from).collect()
}

/// Pretty-printed JSON array of [`MatchRow`]s.
pub fn to_string(records: &[MatchRecord]) -> Result<String> {
    Ok(serde_json::to_string_pretty(&rows(records))?)
}

pub fn write(path: &Path, records: &[MatchRecord]) -> Result<()> {
    ensure_parent(path)?;
    std::fs::write(path, to_string(records)?).map_err(|e| ExportError::file(path, e))?;
    debug!(path = %path.display(), rows = records.len(), "wrote JSON results");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::sample_records;
    use serde_json::Value;

    #[test]
    fn test_field_names() {
        let text = to_string(&sample_records()).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        let first = &value[0];

        assert_eq!(first["IFC_ID"], "e1");
        assert_eq!(first["XML_ID"], "p1");
        assert_eq!(first["Method"], "unique_nc_name");
        assert_eq!(first["NC_Name"], "Träger 1.nc");
        assert_eq!(first["IFC_Location"], serde_json::json!([1.0, 2.0, 3.0]));
        assert_eq!(first["NeedManualCheck"], false);
        assert_eq!(value[1]["Method"], "matrix_direction_match");
        assert_eq!(value[1]["NeedManualCheck"], true);
    }

    #[test]
    fn test_rows_decode_back() {
        let text = to_string(&sample_records()).unwrap();
        let decoded: Vec<MatchRow> = serde_json::from_str(&text).unwrap();
        assert_eq!(decoded, rows(&sample_records()));
    }

    #[test]
    fn test_empty_result_is_empty_array() {
        assert_eq!(to_string(&[]).unwrap(), "[]");
    }
}
