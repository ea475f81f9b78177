//! The exact algorithmic core for computations on triangulated manifolds.
//!
//! This crate is a thin driver over four small workspace crates:
//!
//! - [`exact`] — arbitrary-precision [`Integer`]s, dense [`MatrixInt`]
//!   matrices and [`smith_normal_form`];
//! - [`abelian`] — finitely generated [`AbelianGroup`]s in canonical
//!   invariant-factor form;
//! - [`cone`] — exact vertex enumeration for pointed rational cones via the
//!   double description method;
//! - [`isosig`] — abstract [`Triangulation`]s and their isomorphism
//!   signatures.
//!
//! Everything here is deterministic and exact: the same inputs always give
//! bit-for-bit identical outputs, there is no floating point, and no global
//! state or caching. Individual operations are single-threaded; independent
//! operations can be driven from separate threads freely.

pub use abelian::{AbelianGroup, GroupError};
pub use cone::{
    Bitmask, DoubleDescription, EnumerationError, InitialCone, Ray, ValidityConstraints,
};
pub use exact::{rank, smith_normal_form, Integer, MatrixInt};
pub use isosig::{Gluing, GluingError, Perm, SigError, Triangulation};

/// The abelian group presented by the given matrix (columns are generators,
/// rows are relations). For a triangulation this is how `H_1` arrives from
/// its relation matrix.
pub fn homology_from_presentation(presentation: MatrixInt) -> AbelianGroup {
    AbelianGroup::from_presentation(presentation)
}

/// The homology `ker M / im N` of a chain complex, with the matrices acting
/// on column vectors. `M * N = 0` is the caller's responsibility.
pub fn homology_from_chain(m: MatrixInt, n: MatrixInt) -> Result<AbelianGroup, GroupError> {
    AbelianGroup::from_chain(m, n)
}

/// As [`homology_from_chain`], with coefficients mod `p` (`p = 0` means
/// integer coefficients).
pub fn homology_from_chain_mod(
    m: MatrixInt,
    n: MatrixInt,
    p: &Integer,
) -> Result<AbelianGroup, GroupError> {
    AbelianGroup::from_chain_mod(m, n, p)
}

/// The extreme rays of the intersection of the non-negative orthant with the
/// linear subspace cut out by the rows of `subspace`, restricted to rays
/// admissible under `constraints`. Rays come back primitive, deduplicated
/// and sorted lexicographically.
pub fn enumerate_orthant_vertices(
    subspace: &MatrixInt,
    constraints: &ValidityConstraints,
) -> Result<Vec<Ray>, EnumerationError> {
    DoubleDescription::new().enumerate(
        &InitialCone::orthant(subspace.cols()),
        subspace,
        constraints,
    )
}
