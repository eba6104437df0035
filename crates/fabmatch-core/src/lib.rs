//! Core record types for fabmatch.
//!
//! Two families of records live here:
//!
//! - **Raw records** ([`RawEntity`], [`RawPart`]) mirror the interchange JSON
//!   written by the IFC and assembly readers. Every geometric field is
//!   optional because extraction is best-effort.
//! - **Normalized records** ([`ModelEntity`], [`PartRecord`]) carry exactly the
//!   fields the matcher needs, and [`MatchRecord`] is the matcher's output.

pub mod raw;
pub mod types;

pub use raw::{PropertySets, RawEntity, RawPart, RawPlacement, RawPoint};
pub use types::{MatchMethod, MatchRecord, MatchSummary, ModelEntity, PartRecord};

/// Suffix appended to model-side name keys so they line up with the
/// fabrication file names referenced by assembly parts.
pub const DEFAULT_NAME_SUFFIX: &str = ".nc";
