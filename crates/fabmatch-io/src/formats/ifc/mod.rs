//! IFC (ISO 10303-21) model reader.
//!
//! Extracts structural elements with their local placement and property sets.

mod graph;
mod p21;
mod reader;

pub use reader::{ElementKind, IfcReadOptions, IfcReader};
