//! Two-phase correspondence between model entities and assembly parts.
//!
//! Phase A accepts every name key that occurs exactly once on each side.
//! The first such pair fixes the [`Calibration`] that all later scoring is
//! measured against. Phase B solves each remaining name group as a
//! minimum-cost assignment over orientation error and flags pairs whose
//! cost has a near-equal rival in the same row or column.

use fabmatch_core::{MatchMethod, MatchRecord, MatchSummary, ModelEntity, PartRecord};
use indexmap::IndexMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::{debug, info, warn};

use crate::assignment::{self, CostMatrix};
use crate::orientation::{align, Calibration};

/// Costs closer than this to the chosen cost count as a tie.
pub const DEFAULT_TIE_TOLERANCE: f64 = 1e-4;

/// Cost used for a pair whose frames are degenerate under every flip.
pub const DEFAULT_DEGENERATE_COST: f64 = 1e6;

/// Matching options.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchOptions {
    pub tie_tolerance: f64,
    pub degenerate_cost: f64,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            tie_tolerance: DEFAULT_TIE_TOLERANCE,
            degenerate_cost: DEFAULT_DEGENERATE_COST,
        }
    }
}

/// Result of one matching run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchOutcome {
    /// Unique-name matches first, then assignment matches, each in
    /// name-group order.
    pub records: Vec<MatchRecord>,
    pub summary: MatchSummary,
    /// Reference rotation used for assignment scoring, if one was found.
    pub calibration: Option<Calibration>,
}

type Members<'a, T> = SmallVec<[&'a T; 4]>;

/// A name key that still needs assignment, with its members on both sides.
struct PendingGroup<'g, 'a> {
    key: &'a str,
    entities: &'g Members<'a, ModelEntity>,
    parts: &'g Members<'a, PartRecord>,
}

fn group_by_key<'a, T>(
    items: &'a [T],
    key: impl Fn(&'a T) -> &'a str,
) -> IndexMap<&'a str, Members<'a, T>> {
    let mut groups: IndexMap<&'a str, Members<'a, T>> = IndexMap::new();
    for item in items {
        groups.entry(key(item)).or_default().push(item);
    }
    groups
}

/// Match normalized entities to normalized parts.
///
/// Never fails: keys present on only one side and surplus members of a
/// group are simply left out of the result.
pub fn match_records(
    entities: &[ModelEntity],
    parts: &[PartRecord],
    options: &MatchOptions,
) -> MatchOutcome {
    let entity_groups = group_by_key(entities, |e| e.name_key.as_str());
    let part_groups = group_by_key(parts, |p| p.name_key.as_str());

    let mut unique = Vec::new();
    let mut pending = Vec::new();
    for (key, group_entities) in &entity_groups {
        let Some(group_parts) = part_groups.get(key) else {
            continue;
        };
        if group_entities.len() == 1 && group_parts.len() == 1 {
            unique.push(MatchRecord {
                entity: group_entities[0].clone(),
                part: group_parts[0].clone(),
                error: 0.0,
                method: MatchMethod::UniqueName,
                needs_manual_check: false,
            });
        } else {
            pending.push(PendingGroup {
                key: *key,
                entities: group_entities,
                parts: group_parts,
            });
        }
    }

    let calibration = unique.first().and_then(|first: &MatchRecord| {
        let calibration = Calibration::from_pair(&first.entity, &first.part);
        if calibration.is_none() {
            warn!(
                entity = %first.entity.id,
                part = %first.part.id,
                "first unique match has degenerate frames, scoring against identity"
            );
        }
        calibration
    });

    let assigned: Vec<Vec<MatchRecord>> = pending
        .par_iter()
        .map(|group| resolve_group(group, calibration, options))
        .collect();

    let mut records = unique;
    let unique_count = records.len();
    records.extend(assigned.into_iter().flatten());

    let summary = MatchSummary::from_records(&records);
    info!(
        entities = entities.len(),
        parts = parts.len(),
        unique = unique_count,
        assigned = summary.total - unique_count,
        manual_check = summary.needs_manual_check,
        calibrated = calibration.is_some(),
        "matching finished"
    );

    MatchOutcome {
        records,
        summary,
        calibration,
    }
}

fn resolve_group(
    group: &PendingGroup<'_, '_>,
    calibration: Option<Calibration>,
    options: &MatchOptions,
) -> Vec<MatchRecord> {
    let costs = CostMatrix::from_fn(group.entities.len(), group.parts.len(), |i, j| {
        align(group.entities[i], group.parts[j], calibration)
            .map_or(options.degenerate_cost, |a| a.error)
    });
    let pairs = assignment::solve(&costs);

    let records: Vec<_> = pairs
        .into_iter()
        .map(|(i, j)| MatchRecord {
            entity: group.entities[i].clone(),
            part: group.parts[j].clone(),
            error: costs.get(i, j),
            method: MatchMethod::Assignment,
            needs_manual_check: assignment::is_ambiguous(&costs, i, j, options.tie_tolerance),
        })
        .collect();

    debug!(
        key = group.key,
        entities = costs.rows(),
        parts = costs.cols(),
        flagged = records.iter().filter(|r| r.needs_manual_check).count(),
        "resolved name group"
    );
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{DMat3, DVec3};

    fn entity(id: &str, key: &str, frame: DMat3) -> ModelEntity {
        ModelEntity {
            id: id.to_string(),
            name_key: key.to_string(),
            axis: frame.z_axis,
            ref_direction: frame.x_axis,
            location: DVec3::ZERO,
        }
    }

    fn part(id: &str, key: &str, frame: DMat3) -> PartRecord {
        PartRecord {
            id: id.to_string(),
            name_key: key.to_string(),
            rx: frame.x_axis,
            ry: frame.y_axis,
            base: DVec3::ZERO,
        }
    }

    fn rot_z(degrees: f64) -> DMat3 {
        DMat3::from_rotation_z(degrees.to_radians())
    }

    fn ids(outcome: &MatchOutcome) -> Vec<(&str, &str)> {
        outcome
            .records
            .iter()
            .map(|r| (r.entity_id(), r.part_id()))
            .collect()
    }

    #[test]
    fn test_unique_names_match_directly() {
        let entities = vec![
            entity("A", "x.nc", DMat3::IDENTITY),
            entity("B", "y.nc", rot_z(40.0)),
        ];
        let parts = vec![
            part("2", "y.nc", rot_z(-70.0)),
            part("1", "x.nc", DMat3::from_rotation_x(1.0)),
        ];

        let outcome = match_records(&entities, &parts, &MatchOptions::default());
        assert_eq!(ids(&outcome), [("A", "1"), ("B", "2")]);
        for record in &outcome.records {
            assert_eq!(record.method, MatchMethod::UniqueName);
            assert_eq!(record.error, 0.0);
            assert!(!record.needs_manual_check);
        }
        assert_eq!(outcome.summary, MatchSummary { total: 2, needs_manual_check: 0 });
    }

    #[test]
    fn test_unique_match_ignores_geometry() {
        // Parallel part axes would be degenerate under scoring.
        let entities = vec![entity("A", "x.nc", DMat3::IDENTITY)];
        let mut degenerate = part("1", "x.nc", DMat3::IDENTITY);
        degenerate.ry = degenerate.rx;

        let outcome = match_records(&entities, &[degenerate], &MatchOptions::default());
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].error, 0.0);
        assert!(outcome.calibration.is_none());
    }

    #[test]
    fn test_clear_assignment_not_flagged() {
        let entities = vec![
            entity("e1", "x.nc", DMat3::IDENTITY),
            entity("e2", "x.nc", rot_z(30.0)),
        ];
        // Supplied in swapped order; geometry decides.
        let parts = vec![
            part("p2", "x.nc", rot_z(30.0)),
            part("p1", "x.nc", DMat3::IDENTITY),
        ];

        let outcome = match_records(&entities, &parts, &MatchOptions::default());
        assert_eq!(ids(&outcome), [("e1", "p1"), ("e2", "p2")]);
        for record in &outcome.records {
            assert_eq!(record.method, MatchMethod::Assignment);
            assert!(record.error < 1e-9);
            assert!(!record.needs_manual_check);
        }
    }

    #[test]
    fn test_near_equal_costs_flag_both() {
        let entities = vec![
            entity("e1", "x.nc", DMat3::IDENTITY),
            entity("e2", "x.nc", DMat3::IDENTITY),
        ];
        let parts = vec![
            part("p1", "x.nc", DMat3::IDENTITY),
            part("p2", "x.nc", rot_z(0.001)),
        ];

        let outcome = match_records(&entities, &parts, &MatchOptions::default());
        assert_eq!(outcome.records.len(), 2);
        assert!(outcome.records.iter().all(|r| r.needs_manual_check));
        assert_eq!(outcome.summary.needs_manual_check, 2);
    }

    #[test]
    fn test_several_assignment_groups_resolve_independently() {
        let entities = vec![
            entity("a1", "a.nc", DMat3::IDENTITY),
            entity("b1", "b.nc", rot_z(90.0)),
            entity("a2", "a.nc", rot_z(90.0)),
            entity("b2", "b.nc", DMat3::IDENTITY),
        ];
        let parts = vec![
            part("pb1", "b.nc", DMat3::IDENTITY),
            part("pa1", "a.nc", rot_z(90.0)),
            part("pb2", "b.nc", rot_z(90.0)),
            part("pa2", "a.nc", DMat3::IDENTITY),
        ];

        let outcome = match_records(&entities, &parts, &MatchOptions::default());
        assert_eq!(
            ids(&outcome),
            [("a1", "pa2"), ("a2", "pa1"), ("b1", "pb2"), ("b2", "pb1")]
        );
        assert!(outcome.records.iter().all(|r| r.error < 1e-9));
        assert_eq!(outcome.summary.needs_manual_check, 0);
    }

    #[test]
    fn test_tolerance_is_configurable() {
        let entities = vec![
            entity("e1", "x.nc", DMat3::IDENTITY),
            entity("e2", "x.nc", rot_z(30.0)),
        ];
        let parts = vec![
            part("p1", "x.nc", DMat3::IDENTITY),
            part("p2", "x.nc", rot_z(30.0)),
        ];
        let options = MatchOptions {
            tie_tolerance: 1.0,
            ..MatchOptions::default()
        };

        let outcome = match_records(&entities, &parts, &options);
        assert!(outcome.records.iter().all(|r| r.needs_manual_check));
    }

    #[test]
    fn test_one_sided_keys_are_omitted() {
        let entities = vec![
            entity("A", "x.nc", DMat3::IDENTITY),
            entity("orphan", "z.nc", DMat3::IDENTITY),
        ];
        let parts = vec![
            part("1", "x.nc", DMat3::IDENTITY),
            part("stray", "w.nc", DMat3::IDENTITY),
        ];

        let outcome = match_records(&entities, &parts, &MatchOptions::default());
        assert_eq!(ids(&outcome), [("A", "1")]);
    }

    #[test]
    fn test_surplus_members_stay_unmatched() {
        let entities = vec![
            entity("e1", "x.nc", DMat3::IDENTITY),
            entity("e2", "x.nc", rot_z(45.0)),
            entity("e3", "x.nc", rot_z(20.0)),
        ];
        let parts = vec![
            part("p1", "x.nc", rot_z(45.0)),
            part("p2", "x.nc", DMat3::IDENTITY),
        ];

        let outcome = match_records(&entities, &parts, &MatchOptions::default());
        assert_eq!(ids(&outcome), [("e1", "p2"), ("e2", "p1")]);
    }

    #[test]
    fn test_unique_matches_come_first() {
        let entities = vec![
            entity("e1", "group.nc", DMat3::IDENTITY),
            entity("e2", "group.nc", rot_z(30.0)),
            entity("solo", "solo.nc", DMat3::IDENTITY),
        ];
        let parts = vec![
            part("p1", "group.nc", DMat3::IDENTITY),
            part("p2", "group.nc", rot_z(30.0)),
            part("s", "solo.nc", DMat3::IDENTITY),
        ];

        let outcome = match_records(&entities, &parts, &MatchOptions::default());
        assert_eq!(ids(&outcome), [("solo", "s"), ("e1", "p1"), ("e2", "p2")]);
        assert_eq!(outcome.records[0].method, MatchMethod::UniqueName);
    }

    #[test]
    fn test_calibration_from_first_unique_match() {
        // The assembly tool reports every part rotated about Z.
        let offset = rot_z(30.0);
        let entities = vec![
            entity("solo", "solo.nc", DMat3::IDENTITY),
            entity("other", "other.nc", DMat3::IDENTITY),
            entity("e1", "x.nc", DMat3::IDENTITY),
            entity("e2", "x.nc", rot_z(50.0)),
        ];
        let parts = vec![
            part("other", "other.nc", DMat3::IDENTITY),
            part("s", "solo.nc", offset),
            part("p1", "x.nc", offset),
            part("p2", "x.nc", offset * rot_z(50.0)),
        ];

        let outcome = match_records(&entities, &parts, &MatchOptions::default());
        let calibration = outcome.calibration.unwrap();
        assert!(calibration.rotation().abs_diff_eq(offset, 1e-9));

        let assigned: Vec<_> = outcome
            .records
            .iter()
            .filter(|r| r.method == MatchMethod::Assignment)
            .collect();
        assert_eq!(assigned.len(), 2);
        assert_eq!((assigned[0].entity_id(), assigned[0].part_id()), ("e1", "p1"));
        assert_eq!((assigned[1].entity_id(), assigned[1].part_id()), ("e2", "p2"));
        assert!(assigned.iter().all(|r| r.error < 1e-9));
    }

    #[test]
    fn test_degenerate_cells_use_large_cost() {
        let mut degenerate = entity("bad", "x.nc", DMat3::IDENTITY);
        degenerate.ref_direction = degenerate.axis;
        let entities = vec![degenerate, entity("good", "x.nc", DMat3::IDENTITY)];
        let parts = vec![
            part("p1", "x.nc", DMat3::IDENTITY),
            part("p2", "x.nc", rot_z(60.0)),
        ];

        let outcome = match_records(&entities, &parts, &MatchOptions::default());
        assert_eq!(outcome.records.len(), 2);
        let bad = outcome.records.iter().find(|r| r.entity_id() == "bad").unwrap();
        assert_eq!(bad.error, DEFAULT_DEGENERATE_COST);
        let good = outcome.records.iter().find(|r| r.entity_id() == "good").unwrap();
        assert_eq!(good.part_id(), "p1");
    }

    #[test]
    fn test_deterministic() {
        let entities: Vec<_> = (0..12)
            .map(|i| entity(&format!("e{i}"), &format!("k{}.nc", i % 3), rot_z(i as f64 * 7.0)))
            .collect();
        let parts: Vec<_> = (0..12)
            .rev()
            .map(|i| part(&format!("p{i}"), &format!("k{}.nc", i % 3), rot_z(i as f64 * 7.0 + 0.5)))
            .collect();

        let first = match_records(&entities, &parts, &MatchOptions::default());
        let second = match_records(&entities, &parts, &MatchOptions::default());
        assert_eq!(first, second);
        assert_eq!(first.records.len(), 12);
    }

    #[test]
    fn test_empty_inputs() {
        let outcome = match_records(&[], &[], &MatchOptions::default());
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.summary, MatchSummary::default());
    }
}
