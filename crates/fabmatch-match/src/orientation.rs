//! Orientation scoring under unknown axis-sign conventions.
//!
//! The model side describes a placement by its Z axis and X reference
//! direction; the assembly side by its X and Y axes. The two tools disagree
//! on axis signs often enough that every sign combination has to be tried.
//! For each combination both frames are completed to right-handed
//! orthonormal bases, the relative rotation is projected onto the nearest
//! proper rotation, and the combination closest to the target wins.

use fabmatch_core::{ModelEntity, PartRecord};
use glam::{DMat3, DVec3};
use nalgebra::Matrix3;

/// Cross products shorter than this are treated as parallel inputs.
const DEGENERATE_EPSILON: f64 = 1e-12;

/// Iteration cap handed to the SVD; a 3×3 converges in a handful.
const SVD_MAX_ITERATIONS: usize = 1000;

/// Rotation all later scoring is measured against, taken from the first
/// unambiguous match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration(DMat3);

impl Calibration {
    /// Calibrate from a pair scored against the identity.
    pub fn from_pair(entity: &ModelEntity, part: &PartRecord) -> Option<Self> {
        align(entity, part, None).map(|a| Self(a.rotation))
    }

    pub fn rotation(&self) -> DMat3 {
        self.0
    }
}

/// Sign applied to each input vector, each either `-1.0` or `1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlipSigns {
    pub axis: f64,
    pub ref_direction: f64,
    pub rx: f64,
    pub ry: f64,
}

impl FlipSigns {
    pub const NONE: Self = Self {
        axis: 1.0,
        ref_direction: 1.0,
        rx: 1.0,
        ry: 1.0,
    };
}

/// Best rotation found by the flip search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Alignment {
    pub rotation: DMat3,
    /// Frobenius distance between `rotation` and the target.
    pub error: f64,
    pub flips: FlipSigns,
}

/// All 16 sign combinations, axis sign varying slowest.
fn flip_combinations() -> impl Iterator<Item = FlipSigns> {
    const SIGNS: [f64; 2] = [-1.0, 1.0];
    (0..16usize).map(|i| FlipSigns {
        axis: SIGNS[(i >> 3) & 1],
        ref_direction: SIGNS[(i >> 2) & 1],
        rx: SIGNS[(i >> 1) & 1],
        ry: SIGNS[i & 1],
    })
}

fn unit_cross(a: DVec3, b: DVec3) -> Option<DVec3> {
    let c = a.cross(b);
    let length = c.length();
    if !length.is_finite() || length < DEGENERATE_EPSILON {
        return None;
    }
    Some(c / length)
}

/// Right-handed basis from a Z axis and an X reference direction.
fn model_basis(axis: DVec3, ref_direction: DVec3) -> Option<DMat3> {
    let z = axis.try_normalize()?;
    let x = ref_direction.try_normalize()?;
    let y = unit_cross(z, x)?;
    let x = unit_cross(y, z)?;
    Some(DMat3::from_cols(x, y, z))
}

/// Right-handed basis from X and Y axes.
fn part_basis(rx: DVec3, ry: DVec3) -> Option<DMat3> {
    let x = rx.try_normalize()?;
    let y = ry.try_normalize()?;
    let z = unit_cross(x, y)?;
    let y = unit_cross(z, x)?;
    Some(DMat3::from_cols(x, y, z))
}

/// Orthogonal polar factor `U·Vᵀ` of `m`, rejected unless it is a finite
/// proper rotation.
fn nearest_rotation(m: &DMat3) -> Option<DMat3> {
    let matrix = Matrix3::from_column_slice(&m.to_cols_array());
    let svd = matrix.try_svd(true, true, f64::EPSILON, SVD_MAX_ITERATIONS)?;
    let rotation = svd.u? * svd.v_t?;

    if !rotation.iter().all(|v| v.is_finite()) || rotation.determinant() <= 0.0 {
        return None;
    }
    Some(DMat3::from_cols_slice(rotation.as_slice()))
}

fn frobenius_distance(a: &DMat3, b: &DMat3) -> f64 {
    (*a - *b)
        .to_cols_array()
        .iter()
        .map(|v| v * v)
        .sum::<f64>()
        .sqrt()
}

fn flipped_rotation(
    axis: DVec3,
    ref_direction: DVec3,
    rx: DVec3,
    ry: DVec3,
    flips: FlipSigns,
) -> Option<DMat3> {
    let model = model_basis(axis * flips.axis, ref_direction * flips.ref_direction)?;
    let part = part_basis(rx * flips.rx, ry * flips.ry)?;
    nearest_rotation(&(part * model.transpose()))
}

/// Search all sign combinations for the rotation closest to `target`
/// (identity when `None`).
///
/// Returns `None` only when every combination is degenerate, i.e. one side's
/// two vectors are parallel or zero.
pub fn best_alignment(
    axis: DVec3,
    ref_direction: DVec3,
    rx: DVec3,
    ry: DVec3,
    target: Option<Calibration>,
) -> Option<Alignment> {
    let target = target.map_or(DMat3::IDENTITY, |c| c.rotation());
    let mut best: Option<Alignment> = None;

    for flips in flip_combinations() {
        let Some(rotation) = flipped_rotation(axis, ref_direction, rx, ry, flips) else {
            continue;
        };
        let error = frobenius_distance(&rotation, &target);
        if best.map_or(true, |b| error < b.error) {
            best = Some(Alignment {
                rotation,
                error,
                flips,
            });
        }
    }

    best
}

/// [`best_alignment`] for a normalized entity/part pair.
pub fn align(entity: &ModelEntity, part: &PartRecord, target: Option<Calibration>) -> Option<Alignment> {
    best_alignment(entity.axis, entity.ref_direction, part.rx, part.ry, target)
}
