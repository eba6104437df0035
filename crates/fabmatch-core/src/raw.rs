//! Raw extraction records as stored in the interchange JSON files.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Property-set name → property key → value.
pub type PropertySets = IndexMap<String, IndexMap<String, serde_json::Value>>;

/// A structural element extracted from a BIM model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEntity {
    #[serde(rename = "GlobalId")]
    pub global_id: String,
    /// IFC class the element was found under (e.g. `IfcBeam`).
    #[serde(rename = "Type", default)]
    pub kind: String,
    #[serde(rename = "Properties", default)]
    pub properties: PropertySets,
    #[serde(rename = "LocationRotation", default)]
    pub placement: Option<RawPlacement>,
}

impl RawEntity {
    /// Look up a single property value.
    pub fn property(&self, set: &str, key: &str) -> Option<&serde_json::Value> {
        self.properties.get(set)?.get(key)
    }
}

/// Local placement of an element: origin plus the Z axis and X reference
/// direction of its coordinate system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPlacement {
    #[serde(rename = "Location")]
    pub location: RawPoint,
    #[serde(rename = "Axis")]
    pub axis: Vec<f64>,
    #[serde(rename = "RefDirection")]
    pub ref_direction: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawPoint {
    #[serde(rename = "X")]
    pub x: f64,
    #[serde(rename = "Y")]
    pub y: f64,
    #[serde(rename = "Z")]
    pub z: f64,
}

impl From<[f64; 3]> for RawPoint {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self { x, y, z }
    }
}

/// A part extracted from a fabrication assembly definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPart {
    #[serde(rename = "ID", default)]
    pub id: Option<String>,
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(rename = "Type", default)]
    pub kind: Option<String>,
    #[serde(rename = "Base", default)]
    pub base: Option<Vec<f64>>,
    #[serde(rename = "Rx", default)]
    pub rx: Option<Vec<f64>>,
    #[serde(rename = "Ry", default)]
    pub ry: Option<Vec<f64>>,
    /// Referenced fabrication file names; the first one is the name key.
    #[serde(rename = "Reference", default)]
    pub reference: Vec<String>,
}
