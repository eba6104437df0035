//! Correspondence engine for fabmatch.
//!
//! # Pipeline
//!
//! ```text
//! RawEntity ─┐ normalize   ┌──────────────┐ orientation  ┌────────────┐
//!            ├───────────> │ name groups  │ ───────────> │ assignment │ ──> MatchOutcome
//! RawPart  ──┘             └──────────────┘   (scorer)   └────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use fabmatch_match::{reconcile, MatchOptions, NameKeySource};
//!
//! let source = NameKeySource::new("+Träger", "Position");
//! let outcome = reconcile(&raw_entities, &raw_parts, &source, &MatchOptions::default());
//! println!("{}", outcome.summary);
//! ```

pub mod assignment;
pub mod engine;
pub mod normalize;
pub mod orientation;

pub use assignment::CostMatrix;
pub use engine::{match_records, MatchOptions, MatchOutcome};
pub use normalize::{normalize_entities, normalize_parts, NameKeySource};
pub use orientation::{align, best_alignment, Alignment, Calibration, FlipSigns};

use fabmatch_core::{RawEntity, RawPart};

/// Normalize raw extraction output and match it.
pub fn reconcile(
    entities: &[RawEntity],
    parts: &[RawPart],
    source: &NameKeySource,
    options: &MatchOptions,
) -> MatchOutcome {
    let entities = normalize_entities(entities, source);
    let parts = normalize_parts(parts);
    match_records(&entities, &parts, options)
}
