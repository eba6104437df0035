//! fabmatch-io: record extraction for fabmatch.
//!
//! Turns the two source formats into raw interchange records:
//!
//! | Source | Reader | Record |
//! |--------|--------|--------|
//! | IFC model (.ifc) | [`IfcReader`] | [`RawEntity`] |
//! | Assembly XML (.xml) | [`AssemblyReader`] | [`RawPart`] |
//!
//! and stores them as JSON arrays ([`save_records`], [`load_entities`],
//! [`load_parts`]).
//!
//! # Quick Start
//!
//! ```ignore
//! use fabmatch_io::{extract_entities, save_records, IfcReadOptions};
//!
//! let entities = extract_entities(Path::new("hall.ifc"), &IfcReadOptions::default())?;
//! save_records(Path::new("out/entities.json"), &entities)?;
//! ```

pub mod error;
pub mod formats;
pub mod records;
pub mod traits;

pub use error::{IoError, Result};
#[cfg(feature = "assembly")]
pub use formats::assembly::AssemblyReader;
#[cfg(feature = "ifc")]
pub use formats::ifc::{ElementKind, IfcReadOptions, IfcReader};
pub use records::{load_entities, load_parts, load_records, save_records};
pub use traits::SourceReader;

use std::path::Path;

use fabmatch_core::{RawEntity, RawPart};

/// Extract structural elements from an IFC file.
#[cfg(feature = "ifc")]
pub fn extract_entities(path: &Path, options: &IfcReadOptions) -> Result<Vec<RawEntity>> {
    IfcReader::with_options(options.clone()).read_path(path)
}

/// Extract parts from an assembly XML file.
#[cfg(feature = "assembly")]
pub fn extract_parts(path: &Path) -> Result<Vec<RawPart>> {
    AssemblyReader::new().read_path(path)
}
