//! Exact vertex enumeration for pointed rational polyhedral cones.
//!
//! The entry point is [`DoubleDescription`], which intersects a cone (given
//! by its extreme rays and supporting facets) with a linear subspace and
//! returns the extreme rays of the intersection. Rays are exact integer
//! vectors up to positive scaling ([`Ray`]), facet incidences are tracked
//! with [`Bitmask`]s, and [`ValidityConstraints`] can restrict the output to
//! admissible rays only.

mod bitmask;
mod constraints;
mod double_description;
mod ray;

pub use bitmask::Bitmask;
pub use constraints::ValidityConstraints;
pub use double_description::{DoubleDescription, EnumerationError, InitialCone};
pub use ray::Ray;
