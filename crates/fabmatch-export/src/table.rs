//! CSV review table.
//!
//! One row per match with every vector split into `_X`, `_Y`, `_Z` columns,
//! so the table can be sorted and filtered in a spreadsheet during review.

use std::io;
use std::path::Path;

use fabmatch_core::MatchRecord;
use serde::Serialize;
use tracing::debug;

use crate::error::{ensure_parent, ExportError, Result};

/// Column names, in output order.
pub const HEADER: [&str; 24] = [
    "IFC_ID",
    "XML_ID",
    "Error",
    "Method",
    "NC_Name",
    "IFC_Location_X",
    "IFC_Location_Y",
    "IFC_Location_Z",
    "IFC_Axis_X",
    "IFC_Axis_Y",
    "IFC_Axis_Z",
    "IFC_RefDirection_X",
    "IFC_RefDirection_Y",
    "IFC_RefDirection_Z",
    "XML_Base_X",
    "XML_Base_Y",
    "XML_Base_Z",
    "XML_Rx_X",
    "XML_Rx_Y",
    "XML_Rx_Z",
    "XML_Ry_X",
    "XML_Ry_Y",
    "XML_Ry_Z",
    "NeedManualCheck",
];

/// Field order must follow [`HEADER`].
#[derive(Serialize)]
struct Row<'a> {
    ifc_id: &'a str,
    xml_id: &'a str,
    error: f64,
    method: &'static str,
    nc_name: &'a str,
    ifc_location: [f64; 3],
    ifc_axis: [f64; 3],
    ifc_ref_direction: [f64; 3],
    xml_base: [f64; 3],
    xml_rx: [f64; 3],
    xml_ry: [f64; 3],
    need_manual_check: bool,
}

impl<'a> From<&'a MatchRecord> for Row<'a> {
    fn from(record: &'a MatchRecord) -> Self {
        Self {
            ifc_id: &record.entity.id,
            xml_id: &record.part.id,
            error: record.error,
            method: record.method.as_str(),
            nc_name: record.name_key(),
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

/// Write the table, header included, to any writer.
pub fn write_to<W: io::Write>(writer: W, records: &[MatchRecord]) -> Result<()> {
    // Header is written explicitly so an empty result still has one.
    let mut csv = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv.write_record(HEADER)?;
    for record in records {
        csv.serialize(Row::from(record))?;
    }
    csv.flush()?;
    Ok(())
}

pub fn write(path: &Path, records: &[MatchRecord]) -> Result<()> {
    ensure_parent(path)?;
    let file = std::fs::File::create(path).map_err(|e| ExportError::file(path, e))?;
    write_to(io::BufWriter::new(file), records)?;
    debug!(path = %path.display(), rows = records.len(), "wrote CSV results");
    Ok(())
}
