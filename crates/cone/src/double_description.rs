use exact::{Integer, MatrixInt};
use itertools::Itertools;
use num_traits::Zero;
use rustc_hash::FxHashSet;
use thiserror::Error;
use tracing::debug;

use crate::{Bitmask, Ray, ValidityConstraints};

#[derive(Debug, Error)]
pub enum EnumerationError {
    /// The working ray set outgrew the configured limit. The enumeration is
    /// abandoned cleanly; no partial output is produced.
    #[error("ray limit of {limit} exceeded while intersecting hyperplane {hyperplane}")]
    RayLimitExceeded { limit: usize, hyperplane: usize },

    /// The subspace matrix does not live in the same dimension as the cone.
    #[error("subspace has {subspace_dim} columns but the cone lives in dimension {cone_dim}")]
    DimensionMismatch {
        subspace_dim: usize,
        cone_dim: usize,
    },
}

/// A pointed polyhedral cone in double description form: its extreme rays
/// together with the normals of its supporting facets.
///
/// The usual starting point is [`InitialCone::orthant`], the non-negative
/// orthant, whose extreme rays are the coordinate axes and whose facets are
/// the coordinate hyperplanes.
#[derive(Clone, Debug)]
pub struct InitialCone {
    dim: usize,
    rays: Vec<Ray>,
    faces: Vec<Ray>,
}

impl InitialCone {
    /// The non-negative orthant of `R^dim`.
    pub fn orthant(dim: usize) -> InitialCone {
        let rays = (0..dim).map(|axis| Ray::unit(dim, axis)).collect();
        let faces = (0..dim).map(|axis| Ray::unit(dim, axis)).collect();
        InitialCone { dim, rays, faces }
    }

    /// A cone from an explicit double description pair. The rays must be the
    /// extreme rays of the cone cut out by the given facet normals; this is
    /// not verified.
    pub fn new(dim: usize, rays: Vec<Ray>, faces: Vec<Ray>) -> InitialCone {
        assert!(
            rays.iter().chain(&faces).all(|r| r.dim() == dim),
            "cone rays and faces must all have dimension {dim}"
        );
        InitialCone { dim, rays, faces }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }
}

/// A ray of a partial solution cone, together with the set of original
/// facets it lies on (for adjacency tests) and the set of coordinates where
/// it vanishes (for admissibility tests).
#[derive(Clone)]
struct RaySpec {
    ray: Ray,
    facets: Bitmask,
    coord_zeros: Bitmask,
}

impl RaySpec {
    fn new(ray: Ray, faces: &[Ray]) -> RaySpec {
        let mut facets = Bitmask::new(faces.len());
        for (f, face) in faces.iter().enumerate() {
            if ray.dot(face).is_zero() {
                facets.set(f);
            }
        }
        let mut coord_zeros = Bitmask::new(ray.dim());
        for (i, entry) in ray.entries().iter().enumerate() {
            if entry.is_zero() {
                coord_zeros.set(i);
            }
        }
        RaySpec {
            ray,
            facets,
            coord_zeros,
        }
    }
}

/// Whether a ray whose zero coordinates are given by `zeros` satisfies every
/// constraint mask ("at most one coordinate of each mask may be non-zero").
fn admissible(zeros: &Bitmask, masks: &[Bitmask]) -> bool {
    masks.iter().all(|mask| mask.count_ones_outside(zeros) <= 1)
}

/// Vertex enumeration via the double description method.
///
/// Given a pointed cone and a linear subspace (the intersection of the
/// hyperplanes described by the rows of a matrix), [`enumerate`] produces the
/// extreme rays of the intersection — each in canonical primitive form, with
/// no duplicates, sorted lexicographically. The computation is exact and
/// deterministic: the same inputs always produce the identical sequence.
///
/// A single enumeration runs on the calling thread and shares nothing, so
/// independent enumerations may run in parallel. Intermediate ray sets can
/// grow exponentially in the worst case; an optional [`ray_limit`] turns
/// runaway growth into a clean [`EnumerationError::RayLimitExceeded`].
///
/// [`enumerate`]: DoubleDescription::enumerate
/// [`ray_limit`]: DoubleDescription::ray_limit
#[derive(Clone, Debug, Default)]
pub struct DoubleDescription {
    ray_limit: Option<usize>,
}

impl DoubleDescription {
    pub fn new() -> DoubleDescription {
        DoubleDescription::default()
    }

    /// Caps the number of rays held at any point of the enumeration.
    pub fn ray_limit(mut self, limit: usize) -> DoubleDescription {
        self.ray_limit = Some(limit);
        self
    }

    /// Computes the extreme rays of `cone ∩ {x : subspace · x = 0}`,
    /// restricted to admissible rays if constraints are given.
    ///
    /// Each row of `subspace` is the normal of one hyperplane through the
    /// origin. The hyperplanes are intersected one at a time: rays lying in
    /// the hyperplane survive, and each adjacent pair of rays on strictly
    /// opposite sides contributes its combination in the hyperplane. Pairs
    /// whose combined support already violates a constraint are skipped
    /// outright, since inadmissibility survives combination.
    pub fn enumerate(
        &self,
        cone: &InitialCone,
        subspace: &MatrixInt,
        constraints: &ValidityConstraints,
    ) -> Result<Vec<Ray>, EnumerationError> {
        let dim = subspace.cols();
        if cone.dim() != dim {
            return Err(EnumerationError::DimensionMismatch {
                subspace_dim: dim,
                cone_dim: cone.dim(),
            });
        }

        let masks = if constraints.is_empty() {
            Vec::new()
        } else {
            constraints.bitmasks(dim)
        };

        // Inadmissible rays can never contribute an admissible combination,
        // so they are dropped before the first hyperplane.
        let mut current: Vec<RaySpec> = cone
            .rays
            .iter()
            .map(|ray| RaySpec::new(ray.clone(), &cone.faces))
            .filter(|spec| admissible(&spec.coord_zeros, &masks))
            .collect();

        // Process sparse hyperplanes first; they tend to keep the
        // intermediate ray sets small.
        let order: Vec<usize> = (0..subspace.rows())
            .sorted_by_key(|&row| {
                (0..dim)
                    .filter(|&col| !subspace.entry(row, col).is_zero())
                    .count()
            })
            .collect();

        for (step, &row) in order.iter().enumerate() {
            let dots: Vec<Integer> = current
                .iter()
                .map(|spec| spec.ray.dot_row(subspace, row))
                .collect();

            let mut positive = Vec::new();
            let mut negative = Vec::new();
            let mut zero = Vec::new();
            for (index, dot) in dots.iter().enumerate() {
                match dot.signum() {
                    1 => positive.push(index),
                    -1 => negative.push(index),
                    _ => zero.push(index),
                }
            }

            let mut next = Vec::new();
            let mut seen = FxHashSet::default();
            for &z in &zero {
                if seen.insert(current[z].facets.clone()) {
                    next.push(current[z].clone());
                }
            }

            // Rays in the hyperplane survive; each adjacent (positive,
            // negative) pair meets the hyperplane in a new extreme ray.
            for &p in &positive {
                for &n in &negative {
                    let common_zeros =
                        current[p].coord_zeros.intersection(&current[n].coord_zeros);
                    if !admissible(&common_zeros, &masks) {
                        continue;
                    }

                    let common_facets = current[p].facets.intersection(&current[n].facets);
                    let third_ray_blocks = current
                        .iter()
                        .enumerate()
                        .any(|(k, other)| k != p && k != n && other.facets.contains(&common_facets));
                    if third_ray_blocks {
                        continue;
                    }

                    // v = <n,h>·p - <p,h>·n up to sign; taken with positive
                    // coefficients so that v stays inside the cone.
                    let a = -&dots[n];
                    let b = dots[p].clone();
                    let mut combined = current[p].ray.combine(&a, &current[n].ray, &b);
                    combined.scale_down();
                    let spec = RaySpec::new(combined, &cone.faces);
                    if !admissible(&spec.coord_zeros, &masks) {
                        continue;
                    }
                    if seen.insert(spec.facets.clone()) {
                        next.push(spec);
                        if let Some(limit) = self.ray_limit {
                            if next.len() > limit {
                                return Err(EnumerationError::RayLimitExceeded {
                                    limit,
                                    hyperplane: step,
                                });
                            }
                        }
                    }
                }
            }

            debug!(
                hyperplane = step,
                row,
                positive = positive.len(),
                negative = negative.len(),
                surviving = next.len(),
                "intersected hyperplane"
            );

            current = next;
            if current.is_empty() {
                break;
            }
        }

        let mut result: Vec<Ray> = current
            .into_iter()
            .map(|spec| {
                let mut ray = spec.ray;
                ray.scale_down();
                ray
            })
            .collect();
        result.sort();
        result.dedup();
        Ok(result)
    }
}
