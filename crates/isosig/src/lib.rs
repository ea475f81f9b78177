//! Isomorphism signatures for abstract triangulations.
//!
//! A [`Triangulation`] is a purely combinatorial object: an ordered list of
//! `d`-dimensional simplices, each of whose `d + 1` facets is either boundary
//! or glued to a facet of another simplex via a permutation of vertex labels.
//!
//! [`Triangulation::isosig`] produces a short printable string that is
//! identical for combinatorially isomorphic triangulations and nothing else,
//! and [`Triangulation::from_isosig`] reverses it. Signatures are plain ASCII
//! over a 64-character alphabet, suitable for use as database keys.

mod base64;
mod perm;
mod sig;
mod triangulation;

pub use perm::Perm;
pub use sig::SigError;
pub use triangulation::{Gluing, GluingError, Triangulation};
