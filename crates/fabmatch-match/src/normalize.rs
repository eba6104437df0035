//! Projection of raw extraction records onto matcher records.
//!
//! Extraction output is sparse: elements without a placement, parts without
//! a frame, property sets that lack the name-key property. Such records are
//! excluded here by explicit predicates; they are expected noise, not errors.

use fabmatch_core::{ModelEntity, PartRecord, RawEntity, RawPart, DEFAULT_NAME_SUFFIX};
use glam::DVec3;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Which model property supplies the name key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameKeySource {
    /// Property-set name, e.g. `+Träger`.
    pub property_set: String,
    /// Property key inside the set, e.g. `Position`.
    pub property_key: String,
    /// Appended to the property value to form the key.
    pub suffix: String,
}

impl NameKeySource {
    pub fn new(property_set: impl Into<String>, property_key: impl Into<String>) -> Self {
        Self {
            property_set: property_set.into(),
            property_key: property_key.into(),
            suffix: DEFAULT_NAME_SUFFIX.to_string(),
        }
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    /// Derive the name key for an entity, if the property is present and
    /// renders as text.
    pub fn name_key(&self, entity: &RawEntity) -> Option<String> {
        let value = entity.property(&self.property_set, &self.property_key)?;
        let text = render_property(value)?;
        Some(format!("{}{}", text.trim(), self.suffix))
    }
}

fn render_property(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Read exactly three finite components.
pub fn vec3(components: &[f64]) -> Option<DVec3> {
    match *components {
        [x, y, z] => Some(DVec3::new(x, y, z)).filter(|v| v.is_finite()),
        _ => None,
    }
}

/// A direction is usable when it is finite and has non-zero length.
pub fn is_usable_direction(v: DVec3) -> bool {
    v.is_finite() && v.length_squared() > 0.0
}

/// Both vectors of a frame pair must be usable directions.
pub fn is_usable_frame(primary: DVec3, secondary: DVec3) -> bool {
    is_usable_direction(primary) && is_usable_direction(secondary)
}

/// Project one raw entity, or `None` when any required field is missing.
pub fn normalize_entity(raw: &RawEntity, source: &NameKeySource) -> Option<ModelEntity> {
    let name_key = source.name_key(raw)?;
    let placement = raw.placement.as_ref()?;
    let axis = vec3(&placement.axis)?;
    let ref_direction = vec3(&placement.ref_direction)?;
    let location = DVec3::new(placement.location.x, placement.location.y, placement.location.z);

    if !location.is_finite() || !is_usable_frame(axis, ref_direction) {
        return None;
    }

    Some(ModelEntity {
        id: raw.global_id.clone(),
        name_key,
        axis,
        ref_direction,
        location,
    })
}

/// Project one raw part, or `None` when any required field is missing.
pub fn normalize_part(raw: &RawPart) -> Option<PartRecord> {
    let id = raw.id.clone()?;
    let name_key = raw.reference.first()?.trim().to_string();
    let rx = vec3(raw.rx.as_deref()?)?;
    let ry = vec3(raw.ry.as_deref()?)?;
    let base = vec3(raw.base.as_deref()?)?;

    if !is_usable_frame(rx, ry) {
        return None;
    }

    Some(PartRecord {
        id,
        name_key,
        rx,
        ry,
        base,
    })
}

/// Normalize all entities, preserving input order.
pub fn normalize_entities(raw: &[RawEntity], source: &NameKeySource) -> Vec<ModelEntity> {
    let entities: Vec<_> = raw
        .iter()
        .filter_map(|e| normalize_entity(e, source))
        .collect();
    debug!(
        kept = entities.len(),
        dropped = raw.len() - entities.len(),
        "normalized model entities"
    );
    entities
}

/// Normalize all parts, preserving input order.
pub fn normalize_parts(raw: &[RawPart]) -> Vec<PartRecord> {
    let parts: Vec<_> = raw.iter().filter_map(normalize_part).collect();
    debug!(
        kept = parts.len(),
        dropped = raw.len() - parts.len(),
        "normalized assembly parts"
    );
    parts
}
