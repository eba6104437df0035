//! Normalized records consumed and produced by the matcher.

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// A model-side component ready for matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelEntity {
    pub id: String,
    pub name_key: String,
    /// Local Z axis of the placement.
    pub axis: DVec3,
    /// Local X reference direction of the placement.
    pub ref_direction: DVec3,
    pub location: DVec3,
}

/// An assembly-side part ready for matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartRecord {
    pub id: String,
    pub name_key: String,
    /// Local X axis in the assembly frame.
    pub rx: DVec3,
    /// Local Y axis in the assembly frame.
    pub ry: DVec3,
    pub base: DVec3,
}

/// How a match was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchMethod {
    /// The name key occurred exactly once on each side.
    #[serde(rename = "unique_nc_name")]
    UniqueName,
    /// Chosen by minimum-cost assignment over orientation error.
    #[serde(rename = "matrix_direction_match")]
    Assignment,
}

impl MatchMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchMethod::UniqueName => "unique_nc_name",
            MatchMethod::Assignment => "matrix_direction_match",
        }
    }
}

impl std::fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One accepted pairing between a model entity and an assembly part.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchRecord {
    pub entity: ModelEntity,
    pub part: PartRecord,
    /// Frobenius distance between the resolved rotation and the target.
    pub error: f64,
    pub method: MatchMethod,
    pub needs_manual_check: bool,
}

impl MatchRecord {
    pub fn entity_id(&self) -> &str {
        &self.entity.id
    }

    pub fn part_id(&self) -> &str {
        &self.part.id
    }

    pub fn name_key(&self) -> &str {
        &self.entity.name_key
    }
}

/// Counters reported alongside the match list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSummary {
    pub total: usize,
    pub needs_manual_check: usize,
}

impl MatchSummary {
    pub fn from_records(records: &[MatchRecord]) -> Self {
        Self {
            total: records.len(),
            needs_manual_check: records.iter().filter(|r| r.needs_manual_check).count(),
        }
    }
}

impl std::fmt::Display for MatchSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Matched: {} | Manual Check Needed: {}",
            self.total, self.needs_manual_check
        )
    }
}
