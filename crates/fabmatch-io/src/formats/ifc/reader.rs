//! IFC reader implementation.

use std::collections::HashMap;

use fabmatch_core::{PropertySets, RawEntity, RawPlacement, RawPoint};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use tracing::{debug, warn};

use crate::error::{IoError, Result};
use crate::traits::SourceReader;

use super::graph::IfcGraph;
use super::p21::{parse_data_section, strip_comments, EntityInstance, StepValue};

/// Structural element kinds extracted from a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    Plate,
    Beam,
    Column,
    Member,
    Slab,
    Wall,
}

impl ElementKind {
    pub const ALL: [ElementKind; 6] = [
        Self::Plate,
        Self::Beam,
        Self::Column,
        Self::Member,
        Self::Slab,
        Self::Wall,
    ];

    /// Schema name reported in the `Type` field.
    pub fn ifc_name(self) -> &'static str {
        match self {
            Self::Plate => "IfcPlate",
            Self::Beam => "IfcBeam",
            Self::Column => "IfcColumn",
            Self::Member => "IfcMember",
            Self::Slab => "IfcSlab",
            Self::Wall => "IfcWall",
        }
    }

    /// Part 21 type names covered by this kind, subtypes included.
    pub fn step_names(self) -> &'static [&'static str] {
        match self {
            Self::Plate => &["IFCPLATE", "IFCPLATESTANDARDCASE"],
            Self::Beam => &["IFCBEAM", "IFCBEAMSTANDARDCASE"],
            Self::Column => &["IFCCOLUMN", "IFCCOLUMNSTANDARDCASE"],
            Self::Member => &["IFCMEMBER", "IFCMEMBERSTANDARDCASE"],
            Self::Slab => &["IFCSLAB", "IFCSLABSTANDARDCASE", "IFCSLABELEMENTEDCASE"],
            Self::Wall => &["IFCWALL", "IFCWALLSTANDARDCASE", "IFCWALLELEMENTEDCASE"],
        }
    }

    /// Parse a schema name such as `IfcBeam` (case-insensitive).
    pub fn from_ifc_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.ifc_name().eq_ignore_ascii_case(name))
    }
}

/// Options for reading IFC models.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IfcReadOptions {
    /// Kinds to extract, in output order.
    pub element_kinds: Vec<ElementKind>,
}

impl Default for IfcReadOptions {
    fn default() -> Self {
        Self {
            element_kinds: ElementKind::ALL.to_vec(),
        }
    }
}

impl IfcReadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict extraction to the given kinds.
    pub fn with_kinds(mut self, kinds: impl IntoIterator<Item = ElementKind>) -> Self {
        self.element_kinds = kinds.into_iter().collect();
        self
    }
}

/// IFC (ISO 10303-21) model reader.
#[derive(Debug, Clone, Default)]
pub struct IfcReader {
    options: IfcReadOptions,
}

impl IfcReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: IfcReadOptions) -> Self {
        Self { options }
    }
}

impl SourceReader for IfcReader {
    type Record = RawEntity;

    fn name(&self) -> &'static str {
        "ifc"
    }

    fn extensions(&self) -> &[&'static str] {
        &["ifc", "p21", "step", "stp"]
    }

    fn can_read(&self, data: &[u8]) -> bool {
        // Only the header matters
        let head = &data[..data.len().min(8192)];
        let head = head.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(head);

        String::from_utf8_lossy(head)
            .to_ascii_uppercase()
            .contains("ISO-10303-21")
    }

    fn read(&self, data: &[u8]) -> Result<Vec<RawEntity>> {
        if !self.can_read(data) {
            return Err(IoError::UnknownFormat(
                "missing ISO-10303-21 header; not an IFC file".into(),
            ));
        }

        // Some exporters emit stray non-UTF-8 bytes
        let text = String::from_utf8_lossy(data);
        let text = strip_comments(&text);

        let (_, instances) = parse_data_section(&text).map_err(|e| match e {
            nom::Err::Error(e) | nom::Err::Failure(e) => {
                IoError::parse_at("malformed DATA section", text.len() - e.input.len())
            }
            nom::Err::Incomplete(_) => IoError::parse("truncated DATA section"),
        })?;

        let graph = IfcGraph::new(instances);
        if graph.is_empty() {
            warn!("IFC DATA section holds no instances");
            return Ok(Vec::new());
        }
        debug!(instances = graph.len(), "parsed IFC data section");

        let entities = EntityExtractor::new(&graph).extract(&self.options.element_kinds);
        debug!(entities = entities.len(), "extracted IFC elements");
        Ok(entities)
    }
}

/// Converts graph instances into raw entity records.
struct EntityExtractor<'a> {
    graph: &'a IfcGraph,
    /// Property definition IDs per element, type-level sets first.
    definitions: HashMap<u64, Vec<u64>>,
}

impl<'a> EntityExtractor<'a> {
    fn new(graph: &'a IfcGraph) -> Self {
        let mut type_sets: HashMap<u64, Vec<u64>> = HashMap::new();
        for &rel_id in graph.find_by_type("IFCRELDEFINESBYTYPE") {
            let Some(rel) = graph.get(rel_id) else { continue };
            let Some(type_object) = graph.resolve(rel.param(5)) else {
                continue;
            };
            let sets: Vec<u64> = type_object
                .param(5)
                .map(|v| v.references().collect())
                .unwrap_or_default();
            for object in rel.param(4).into_iter().flat_map(StepValue::references) {
                type_sets.entry(object).or_default().extend(&sets);
            }
        }

        let mut definitions = type_sets;
        for &rel_id in graph.find_by_type("IFCRELDEFINESBYPROPERTIES") {
            let Some(rel) = graph.get(rel_id) else { continue };
            let Some(set) = rel.param(5).and_then(StepValue::as_reference) else {
                continue;
            };
            for object in rel.param(4).into_iter().flat_map(StepValue::references) {
                definitions.entry(object).or_default().push(set);
            }
        }

        Self { graph, definitions }
    }

    fn extract(&self, kinds: &[ElementKind]) -> Vec<RawEntity> {
        let mut out = Vec::new();
        for &kind in kinds {
            let mut ids: Vec<u64> = kind
                .step_names()
                .iter()
                .flat_map(|name| self.graph.find_by_type(name))
                .copied()
                .collect();
            ids.sort_unstable();

            for id in ids {
                match self.entity(id, kind) {
                    Some(entity) => out.push(entity),
                    None => warn!(id, kind = kind.ifc_name(), "element without GlobalId skipped"),
                }
            }
        }
        out
    }

    fn entity(&self, id: u64, kind: ElementKind) -> Option<RawEntity> {
        let instance = self.graph.get(id)?;
        let global_id = instance.param(0)?.as_str()?.to_string();

        Some(RawEntity {
            global_id,
            kind: kind.ifc_name().to_string(),
            properties: self.property_sets(id),
            placement: self.placement(instance),
        })
    }

    /// ObjectPlacement → IfcLocalPlacement → IfcAxis2Placement3D.
    fn placement(&self, element: &EntityInstance) -> Option<RawPlacement> {
        let local = self
            .graph
            .resolve(element.param(5))
            .filter(|i| i.type_name == "IFCLOCALPLACEMENT")?;
        let axis2 = self
            .graph
            .resolve(local.param(1))
            .filter(|i| i.type_name == "IFCAXIS2PLACEMENT3D")?;

        let location = self.graph.point(axis2.param(0)?.as_reference()?)?;
        let axis = self.graph.direction(axis2.param(1)?.as_reference()?)?;
        let ref_direction = self.graph.direction(axis2.param(2)?.as_reference()?)?;

        Some(RawPlacement {
            location: RawPoint::from(location),
            axis,
            ref_direction,
        })
    }

    fn property_sets(&self, element: u64) -> PropertySets {
        let mut sets = PropertySets::new();
        let Some(definitions) = self.definitions.get(&element) else {
            return sets;
        };

        for &definition in definitions {
            let Some(instance) = self.graph.get(definition) else {
                continue;
            };
            let (name, values) = match instance.type_name.as_str() {
                "IFCPROPERTYSET" => (instance.param(2), self.properties(instance.param(4))),
                "IFCELEMENTQUANTITY" => (instance.param(2), self.quantities(instance.param(5))),
                _ => continue,
            };
            let Some(name) = name.and_then(StepValue::as_str) else {
                continue;
            };

            let set = sets.entry(name.to_string()).or_default();
            for (key, value) in values {
                set.insert(key, value);
            }
        }

        sets
    }

    fn properties(&self, list: Option<&StepValue>) -> IndexMap<String, Value> {
        let mut out = IndexMap::new();
        for id in list.into_iter().flat_map(StepValue::references) {
            let Some(property) = self.graph.get(id) else {
                continue;
            };
            let Some(name) = property.param(0).and_then(StepValue::as_str) else {
                continue;
            };
            let value = match property.type_name.as_str() {
                "IFCPROPERTYSINGLEVALUE" | "IFCPROPERTYENUMERATEDVALUE" => {
                    property.param(2).map_or(Value::Null, to_json)
                }
                _ => continue,
            };
            out.insert(name.to_string(), value);
        }
        out
    }

    fn quantities(&self, list: Option<&StepValue>) -> IndexMap<String, Value> {
        let mut out = IndexMap::new();
        for id in list.into_iter().flat_map(StepValue::references) {
            let Some(quantity) = self.graph.get(id) else {
                continue;
            };
            if !quantity.type_name.starts_with("IFCQUANTITY") {
                continue;
            }
            let Some(name) = quantity.param(0).and_then(StepValue::as_str) else {
                continue;
            };
            out.insert(
                name.to_string(),
                quantity.param(3).map_or(Value::Null, to_json),
            );
        }
        out
    }
}

/// Decode a property value. IFC-typed wrappers are unwrapped; booleans and
/// logicals become JSON booleans, `UNKNOWN` stays a string.
fn to_json(value: &StepValue) -> Value {
    match value {
        StepValue::Typed { type_name, value } => match (type_name.as_str(), value.as_ref()) {
            ("IFCBOOLEAN" | "IFCLOGICAL", StepValue::Enum(e)) => match e.as_str() {
                "T" | "TRUE" => Value::Bool(true),
                "F" | "FALSE" => Value::Bool(false),
                other => Value::String(other.to_string()),
            },
            (_, inner) => to_json(inner),
        },
        StepValue::String(s) => Value::String(s.clone()),
        StepValue::Enum(e) | StepValue::Binary(e) => Value::String(e.clone()),
        StepValue::Integer(i) => Value::Number(Number::from(*i)),
        StepValue::Real(r) => Number::from_f64(*r).map_or(Value::Null, Value::Number),
        StepValue::List(items) => Value::Array(items.iter().map(to_json).collect()),
        StepValue::Reference(_) | StepValue::Omitted | StepValue::Derived => Value::Null,
    }
}
