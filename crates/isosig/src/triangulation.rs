use std::collections::VecDeque;
use std::fmt;

use thiserror::Error;

use crate::Perm;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GluingError {
    #[error("simplex {simplex} out of range ({size} simplices)")]
    SimplexOutOfRange { simplex: usize, size: usize },

    #[error("facet {facet} out of range in dimension {dim}")]
    FacetOutOfRange { facet: usize, dim: usize },

    #[error("permutation degree {degree} does not match dimension {dim}")]
    PermDegreeMismatch { degree: usize, dim: usize },

    #[error("facet {facet} of simplex {simplex} is already glued")]
    AlreadyGlued { simplex: usize, facet: usize },

    #[error("a facet cannot be glued to itself")]
    SelfIdentification,
}

/// One side of a facet identification: the neighbouring simplex and the
/// vertex-label permutation carrying this simplex's labels to its labels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Gluing {
    pub simplex: usize,
    pub perm: Perm,
}

#[derive(Clone, Debug)]
struct Simplex {
    gluings: Vec<Option<Gluing>>,
}

/// An abstract `d`-dimensional triangulation: top-dimensional simplices with
/// facet gluings.
///
/// Simplices are indexed `0..size()`, and each has `d + 1` facets, facet `f`
/// being the one opposite vertex `f`. A facet is either boundary or glued to
/// some facet of some simplex (possibly the same simplex) via a permutation
/// of `{0, .., d}`; the matching facet always carries the inverse
/// permutation, so the gluing data is an involution by construction.
#[derive(Clone, Debug)]
pub struct Triangulation {
    dim: usize,
    simplices: Vec<Simplex>,
}

impl Triangulation {
    /// Creates an empty triangulation of the given dimension. Dimensions
    /// below 2 are not supported.
    pub fn new(dim: usize) -> Triangulation {
        assert!(dim >= 2, "dimension must be at least 2");
        Triangulation {
            dim,
            simplices: Vec::new(),
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn size(&self) -> usize {
        self.simplices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.simplices.is_empty()
    }

    /// Appends a new simplex with all facets boundary, returning its index.
    pub fn add_simplex(&mut self) -> usize {
        self.simplices.push(Simplex {
            gluings: vec![None; self.dim + 1],
        });
        self.simplices.len() - 1
    }

    /// Appends `count` new simplices at once.
    pub fn add_simplices(&mut self, count: usize) {
        for _ in 0..count {
            self.add_simplex();
        }
    }

    /// The gluing on the given facet, or `None` for a boundary facet.
    pub fn gluing(&self, simplex: usize, facet: usize) -> Option<&Gluing> {
        self.simplices[simplex].gluings[facet].as_ref()
    }

    pub fn is_boundary(&self, simplex: usize, facet: usize) -> bool {
        self.gluing(simplex, facet).is_none()
    }

    pub fn count_boundary_facets(&self) -> usize {
        self.simplices
            .iter()
            .map(|s| s.gluings.iter().filter(|g| g.is_none()).count())
            .sum()
    }

    /// Glues facet `facet` of `simplex` to simplex `dest` under `perm`:
    /// vertex `v` of `simplex` is identified with vertex `perm(v)` of
    /// `dest`, so the facet meets facet `perm(facet)` of `dest`. The matching
    /// side is written with the inverse permutation.
    pub fn join(
        &mut self,
        simplex: usize,
        facet: usize,
        dest: usize,
        perm: Perm,
    ) -> Result<(), GluingError> {
        let size = self.size();
        if simplex >= size {
            return Err(GluingError::SimplexOutOfRange { simplex, size });
        }
        if dest >= size {
            return Err(GluingError::SimplexOutOfRange { simplex: dest, size });
        }
        if facet > self.dim {
            return Err(GluingError::FacetOutOfRange {
                facet,
                dim: self.dim,
            });
        }
        if perm.degree() != self.dim + 1 {
            return Err(GluingError::PermDegreeMismatch {
                degree: perm.degree(),
                dim: self.dim,
            });
        }
        let dest_facet = perm.apply(facet);
        if simplex == dest && dest_facet == facet {
            return Err(GluingError::SelfIdentification);
        }
        if self.simplices[simplex].gluings[facet].is_some() {
            return Err(GluingError::AlreadyGlued { simplex, facet });
        }
        if self.simplices[dest].gluings[dest_facet].is_some() {
            return Err(GluingError::AlreadyGlued {
                simplex: dest,
                facet: dest_facet,
            });
        }

        self.simplices[dest].gluings[dest_facet] = Some(Gluing {
            simplex,
            perm: perm.inverse(),
        });
        self.simplices[simplex].gluings[facet] = Some(Gluing {
            simplex: dest,
            perm,
        });
        Ok(())
    }

    /// Removes the gluing on the given facet (and its matching side),
    /// returning the gluing that was there.
    pub fn unjoin(&mut self, simplex: usize, facet: usize) -> Option<Gluing> {
        let gluing = self.simplices[simplex].gluings[facet].take()?;
        let dest_facet = gluing.perm.apply(facet);
        self.simplices[gluing.simplex].gluings[dest_facet] = None;
        Some(gluing)
    }

    /// The connected components of the simplex-adjacency graph, each sorted,
    /// ordered by smallest member.
    pub fn components(&self) -> Vec<Vec<usize>> {
        let mut component_of = vec![usize::MAX; self.size()];
        let mut components = Vec::new();
        for start in 0..self.size() {
            if component_of[start] != usize::MAX {
                continue;
            }
            let label = components.len();
            let mut members = Vec::new();
            let mut queue = VecDeque::from([start]);
            component_of[start] = label;
            while let Some(simplex) = queue.pop_front() {
                members.push(simplex);
                for gluing in self.simplices[simplex].gluings.iter().flatten() {
                    if component_of[gluing.simplex] == usize::MAX {
                        component_of[gluing.simplex] = label;
                        queue.push_back(gluing.simplex);
                    }
                }
            }
            members.sort_unstable();
            components.push(members);
        }
        components
    }

    pub fn is_connected(&self) -> bool {
        self.components().len() <= 1
    }
}

impl fmt::Display for Triangulation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (index, simplex) in self.simplices.iter().enumerate() {
            write!(f, "{index}:")?;
            for gluing in &simplex.gluings {
                match gluing {
                    None => write!(f, " bdry")?,
                    Some(g) => write!(f, " {}{:?}", g.simplex, g.perm)?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_writes_both_sides() {
        let mut tri = Triangulation::new(2);
        tri.add_simplices(2);
        let perm = Perm::from_images(vec![1, 0, 2]);
        tri.join(0, 2, 1, perm.clone()).unwrap();

        let forward = tri.gluing(0, 2).unwrap();
        assert_eq!(forward.simplex, 1);
        assert_eq!(forward.perm, perm);

        // Facet 2 maps to facet perm(2) = 2 of the neighbour, which points
        // back with the inverse permutation.
        let backward = tri.gluing(1, 2).unwrap();
        assert_eq!(backward.simplex, 0);
        assert_eq!(backward.perm, perm.inverse());
    }

    #[test]
    fn self_gluing_of_distinct_facets_is_allowed() {
        let mut tri = Triangulation::new(2);
        tri.add_simplex();
        // Vertex rotation glues facet 0 to facet 1 of the same triangle.
        tri.join(0, 0, 0, Perm::from_images(vec![1, 2, 0])).unwrap();
        assert!(!tri.is_boundary(0, 0));
        assert!(!tri.is_boundary(0, 1));
        assert!(tri.is_boundary(0, 2));
    }

    #[test]
    fn gluing_a_facet_to_itself_is_rejected() {
        let mut tri = Triangulation::new(2);
        tri.add_simplex();
        assert_eq!(
            tri.join(0, 0, 0, Perm::identity(3)),
            Err(GluingError::SelfIdentification)
        );
    }

    #[test]
    fn double_gluing_is_rejected() {
        let mut tri = Triangulation::new(2);
        tri.add_simplices(3);
        tri.join(0, 0, 1, Perm::identity(3)).unwrap();
        assert_eq!(
            tri.join(0, 0, 2, Perm::identity(3)),
            Err(GluingError::AlreadyGlued {
                simplex: 0,
                facet: 0
            })
        );
    }

    #[test]
    fn unjoin_restores_boundary() {
        let mut tri = Triangulation::new(3);
        tri.add_simplices(2);
        tri.join(1, 3, 0, Perm::identity(4)).unwrap();
        assert_eq!(tri.count_boundary_facets(), 6);

        let gluing = tri.unjoin(1, 3).unwrap();
        assert_eq!(gluing.simplex, 0);
        assert_eq!(tri.count_boundary_facets(), 8);
        assert!(tri.is_boundary(0, 3));
    }

    #[test]
    fn components_follow_gluings() {
        let mut tri = Triangulation::new(2);
        tri.add_simplices(4);
        tri.join(0, 0, 2, Perm::identity(3)).unwrap();
        tri.join(1, 1, 3, Perm::identity(3)).unwrap();
        assert_eq!(tri.components(), vec![vec![0, 2], vec![1, 3]]);
        assert!(!tri.is_connected());
    }
}
