use thiserror::Error;

use crate::base64;
use crate::{Perm, Triangulation};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SigError {
    /// The factorial `(dim + 1)!` does not fit the fixed-width permutation
    /// fields, so signatures cannot be formed in this dimension.
    #[error("dimension {dim} is too large for signature encoding")]
    UnsupportedDimension { dim: usize },

    #[error("invalid character in signature")]
    InvalidCharacter,

    #[error("signature ends unexpectedly")]
    Truncated,

    #[error("invalid facet action")]
    InvalidFacetAction,

    #[error("facet actions overrun the component size")]
    ActionCountMismatch,

    #[error("non-zero facet actions beyond the end of the component")]
    ExtraneousActions,

    #[error("component describes more simplices than this build can handle")]
    TooManySimplices,

    #[error("gluing destination is not an existing simplex")]
    BadDestination,

    #[error("permutation index out of range")]
    BadPermutationIndex,

    #[error("gluings do not form a valid involution")]
    BadGluing,
}

/// Facet actions, stored as trits in the signature stream.
const ACTION_BOUNDARY: u8 = 0;
const ACTION_NEW: u8 = 1;
const ACTION_JOIN: u8 = 2;

/// The number of signature characters used for one permutation index in the
/// given degree's `S_n`.
fn chars_per_perm(n_perms: u64) -> usize {
    let mut chars = 1;
    let mut max = (n_perms - 1) >> 6;
    while max > 0 {
        chars += 1;
        max >>= 6;
    }
    chars
}

/// The serialised stream for one connected component under one choice of
/// canonical labelling.
struct ComponentStream {
    size: usize,
    actions: Vec<u8>,
    join_dests: Vec<usize>,
    join_gluings: Vec<u64>,
}

impl ComponentStream {
    fn encode(&self, chars_per_perm: usize) -> String {
        let mut out = String::new();

        // One character per integer for small components; otherwise a width
        // marker followed by the field width in characters.
        let n_chars = if self.size < 63 {
            1
        } else {
            let mut chars = 0;
            let mut tmp = self.size;
            while tmp > 0 {
                tmp >>= 6;
                chars += 1;
            }
            out.push(base64::encode_single(63));
            out.push(base64::encode_single(chars as u8));
            chars
        };

        base64::encode_int(&mut out, self.size as u64, n_chars);
        for chunk in self.actions.chunks(3) {
            out.push(base64::encode_trits(chunk));
        }
        for &dest in &self.join_dests {
            base64::encode_int(&mut out, dest as u64, n_chars);
        }
        for &gluing in &self.join_gluings {
            base64::encode_int(&mut out, gluing, chars_per_perm);
        }
        out
    }
}

impl Triangulation {
    /// The isomorphism signature of this triangulation.
    ///
    /// Two triangulations have the same signature exactly when they are
    /// combinatorially isomorphic; [`from_isosig`] reconstructs a
    /// triangulation from its signature (up to relabelling).
    ///
    /// The signature is found by canonically relabelling each connected
    /// component from every possible starting simplex and starting vertex
    /// permutation, keeping the lexicographically smallest serialisation,
    /// and concatenating the per-component strings in sorted order. The cost
    /// is proportional to `size * (dim + 1)!` traversals per component.
    ///
    /// [`from_isosig`]: Triangulation::from_isosig
    pub fn isosig(&self) -> Result<String, SigError> {
        let degree = self.dim() + 1;
        let n_perms = Perm::count(degree).ok_or(SigError::UnsupportedDimension {
            dim: self.dim(),
        })?;
        let cpp = chars_per_perm(n_perms);
        if cpp > 10 {
            return Err(SigError::UnsupportedDimension { dim: self.dim() });
        }

        if self.is_empty() {
            return Ok(base64::encode_single(0).to_string());
        }

        let mut parts = Vec::new();
        for component in self.components() {
            let mut best: Option<String> = None;
            for &start in &component {
                for perm in Perm::all(degree) {
                    let candidate = self.canonical_stream(start, &perm).encode(cpp);
                    if best.as_ref().map_or(true, |b| candidate < *b) {
                        best = Some(candidate);
                    }
                }
            }
            parts.extend(best);
        }
        parts.sort();
        Ok(parts.concat())
    }

    /// Serialises the connected component containing `start`, canonically
    /// relabelled so that `start` becomes simplex 0 with its vertices mapped
    /// by the inverse of `vertices`.
    ///
    /// The relabelling is breadth-first: each facet of each simplex, taken
    /// in canonical label order, either is boundary, attaches the next
    /// unused label (with the identity gluing), or closes up against an
    /// already-labelled simplex (recording the destination and the gluing
    /// permutation). Gluings already recorded from the other side are
    /// skipped.
    fn canonical_stream(&self, start: usize, vertices: &Perm) -> ComponentStream {
        let size = self.size();
        let degree = self.dim() + 1;

        // image maps source simplices to canonical labels, preimage the
        // other way; vertex_map[s] carries source vertex labels of s to
        // canonical vertex labels.
        let mut image: Vec<Option<usize>> = vec![None; size];
        let mut preimage: Vec<Option<usize>> = vec![None; size];
        let mut vertex_map: Vec<Perm> = vec![Perm::identity(degree); size];

        image[start] = Some(0);
        preimage[0] = Some(start);
        vertex_map[start] = vertices.inverse();

        let mut actions = Vec::new();
        let mut join_dests = Vec::new();
        let mut join_gluings = Vec::new();
        let mut next_unused = 1;

        let mut label = 0;
        while label < size {
            let Some(src) = preimage[label] else {
                break;
            };
            let vm_src = vertex_map[src].clone();

            for facet_img in 0..degree {
                let facet_src = vm_src.pre(facet_img);

                let Some(gluing) = self.gluing(src, facet_src) else {
                    actions.push(ACTION_BOUNDARY);
                    continue;
                };
                let dest = gluing.simplex;

                if let Some(dest_img) = image[dest] {
                    // Skip a gluing that was already recorded from the other
                    // side: either the destination was processed earlier, or
                    // this is a self-gluing whose partner facet came first.
                    let partner = gluing.perm.apply(facet_src);
                    if dest_img < label
                        || (dest == src && vm_src.apply(partner) < facet_img)
                    {
                        continue;
                    }

                    join_dests.push(dest_img);
                    let canonical = vertex_map[dest]
                        .compose(&gluing.perm)
                        .compose(&vm_src.inverse());
                    join_gluings.push(canonical.ordered_index());
                    actions.push(ACTION_JOIN);
                } else {
                    image[dest] = Some(next_unused);
                    preimage[next_unused] = Some(dest);
                    next_unused += 1;
                    vertex_map[dest] = vm_src.compose(&gluing.perm.inverse());
                    actions.push(ACTION_NEW);
                }
            }
            label += 1;
        }

        ComponentStream {
            size: label,
            actions,
            join_dests,
            join_gluings,
        }
    }

    /// Rebuilds a triangulation of the given dimension from its signature.
    ///
    /// Leading and trailing whitespace is ignored. Every structural defect
    /// in the string — foreign characters, truncation, actions that overrun
    /// the component, gluings to simplices that do not exist yet, or
    /// permutation indices out of range — yields a [`SigError`], and no
    /// partial triangulation is produced.
    pub fn from_isosig(dim: usize, sig: &str) -> Result<Triangulation, SigError> {
        let degree = dim + 1;
        let n_perms =
            Perm::count(degree).ok_or(SigError::UnsupportedDimension { dim })?;
        let cpp = chars_per_perm(n_perms);
        if cpp > 10 {
            return Err(SigError::UnsupportedDimension { dim });
        }

        let bytes = sig.trim().as_bytes();
        if !bytes.iter().copied().all(base64::is_valid) {
            return Err(SigError::InvalidCharacter);
        }

        let mut tri = Triangulation::new(dim);
        let mut pos = 0;
        while pos < bytes.len() {
            // The component size, with an optional width marker in front.
            let first = base64::decode_single(bytes[pos]).ok_or(SigError::InvalidCharacter)?;
            pos += 1;
            let (n_chars, n_simp) = if first < 63 {
                (1, first as u64)
            } else {
                let width = *bytes.get(pos).ok_or(SigError::Truncated)?;
                pos += 1;
                let width =
                    base64::decode_single(width).ok_or(SigError::InvalidCharacter)? as usize;
                if width > 10 {
                    return Err(SigError::TooManySimplices);
                }
                if pos + width > bytes.len() {
                    return Err(SigError::Truncated);
                }
                let n = base64::decode_int(&bytes[pos..pos + width]);
                pos += width;
                (width, n)
            };
            if n_simp == 0 {
                continue;
            }
            let n_simp = usize::try_from(n_simp).map_err(|_| SigError::TooManySimplices)?;
            let total_slots = degree
                .checked_mul(n_simp)
                .ok_or(SigError::TooManySimplices)?;

            // The action trits. Boundary facets occupy one slot; gluings
            // occupy two (the matching facet is decided at the same time).
            let mut actions = Vec::new();
            let mut slots = 0;
            let mut n_joins = 0;
            while slots < total_slots {
                let c = *bytes.get(pos).ok_or(SigError::Truncated)?;
                pos += 1;
                let trits = base64::decode_trits(c).ok_or(SigError::InvalidCharacter)?;
                for &trit in &trits {
                    if slots == total_slots {
                        if trit != 0 {
                            return Err(SigError::ExtraneousActions);
                        }
                        continue;
                    }
                    match trit {
                        ACTION_BOUNDARY => slots += 1,
                        ACTION_NEW => slots += 2,
                        ACTION_JOIN => {
                            slots += 2;
                            n_joins += 1;
                        }
                        _ => return Err(SigError::InvalidFacetAction),
                    }
                    if slots > total_slots {
                        return Err(SigError::ActionCountMismatch);
                    }
                    actions.push(trit);
                }
            }

            let mut join_dests = Vec::with_capacity(n_joins);
            for _ in 0..n_joins {
                if pos + n_chars > bytes.len() {
                    return Err(SigError::Truncated);
                }
                join_dests.push(base64::decode_int(&bytes[pos..pos + n_chars]) as usize);
                pos += n_chars;
            }

            let mut join_gluings = Vec::with_capacity(n_joins);
            for _ in 0..n_joins {
                if pos + cpp > bytes.len() {
                    return Err(SigError::Truncated);
                }
                let index = base64::decode_int(&bytes[pos..pos + cpp]);
                pos += cpp;
                if index >= n_perms {
                    return Err(SigError::BadPermutationIndex);
                }
                join_gluings.push(index);
            }

            // Replay the actions in the same lexicographic facet order the
            // encoder used.
            let base = tri.size();
            tri.add_simplices(n_simp);
            let mut next_unused = 1;
            let mut action_pos = 0;
            let mut join_pos = 0;
            for simplex in 0..n_simp {
                for facet in 0..degree {
                    if tri.gluing(base + simplex, facet).is_some() {
                        // Already glued from the other side.
                        continue;
                    }
                    let action = *actions
                        .get(action_pos)
                        .ok_or(SigError::ActionCountMismatch)?;
                    action_pos += 1;
                    match action {
                        ACTION_BOUNDARY => {}
                        ACTION_NEW => {
                            if next_unused >= n_simp {
                                return Err(SigError::BadDestination);
                            }
                            tri.join(
                                base + simplex,
                                facet,
                                base + next_unused,
                                Perm::identity(degree),
                            )
                            .map_err(|_| SigError::BadGluing)?;
                            next_unused += 1;
                        }
                        _ => {
                            let dest = join_dests[join_pos];
                            let perm = Perm::from_ordered_index(join_gluings[join_pos], degree);
                            join_pos += 1;
                            if dest >= next_unused {
                                return Err(SigError::BadDestination);
                            }
                            tri.join(base + simplex, facet, base + dest, perm)
                                .map_err(|_| SigError::BadGluing)?;
                        }
                    }
                }
            }
        }
        Ok(tri)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    /// The double of a triangle: two triangles glued along all three edges,
    /// a 2-sphere.
    fn sphere() -> Triangulation {
        let mut tri = Triangulation::new(2);
        tri.add_simplices(2);
        for facet in 0..3 {
            tri.join(0, facet, 1, Perm::identity(3)).unwrap();
        }
        tri
    }

    #[test]
    fn empty_triangulation_has_fixed_signature() {
        let tri = Triangulation::new(2);
        assert_eq!(tri.isosig().unwrap(), "a");
        let back = Triangulation::from_isosig(2, "a").unwrap();
        assert!(back.is_empty());
    }

    #[test]
    fn single_triangle_signature() {
        let mut tri = Triangulation::new(2);
        tri.add_simplex();
        // One simplex, three boundary facets: the stream is fully forced.
        assert_eq!(tri.isosig().unwrap(), "ba");
    }

    #[test]
    fn sphere_signature_is_isomorphism_invariant() {
        let reference = sphere().isosig().unwrap();

        // The same sphere built with the roles of the triangles swapped.
        let mut swapped = Triangulation::new(2);
        swapped.add_simplices(2);
        for facet in 0..3 {
            swapped.join(1, facet, 0, Perm::identity(3)).unwrap();
        }
        assert_eq!(swapped.isosig().unwrap(), reference);

        // And with a non-trivial gluing permutation (a relabelled sphere).
        let relabel = Perm::from_images(vec![1, 2, 0]);
        let mut twisted = Triangulation::new(2);
        twisted.add_simplices(2);
        for facet in 0..3 {
            twisted
                .join(0, facet, 1, relabel.clone())
                .unwrap();
        }
        assert_eq!(twisted.isosig().unwrap(), reference);
    }

    #[rstest]
    #[case(2)]
    #[case(3)]
    fn round_trip_is_isomorphic(#[case] dim: usize) {
        // A small chain with mixed boundary and interior facets.
        let mut tri = Triangulation::new(dim);
        tri.add_simplices(3);
        tri.join(0, 0, 1, Perm::identity(dim + 1)).unwrap();
        tri.join(1, 1, 2, Perm::identity(dim + 1)).unwrap();

        let sig = tri.isosig().unwrap();
        let back = Triangulation::from_isosig(dim, &sig).unwrap();
        assert_eq!(back.size(), tri.size());
        assert_eq!(back.dim(), tri.dim());
        assert_eq!(back.isosig().unwrap(), sig);
    }

    #[test]
    fn self_gluings_round_trip() {
        let mut tri = Triangulation::new(2);
        tri.add_simplex();
        tri.join(0, 0, 0, Perm::from_images(vec![1, 2, 0])).unwrap();

        let sig = tri.isosig().unwrap();
        let back = Triangulation::from_isosig(2, &sig).unwrap();
        assert_eq!(back.size(), 1);
        assert_eq!(back.isosig().unwrap(), sig);
    }

    #[test]
    fn boundary_only_triangulations_use_no_join_tokens() {
        // Two triangles sharing one edge: all actions are boundary or new,
        // so the string is exactly size + two action characters.
        let mut tri = Triangulation::new(2);
        tri.add_simplices(2);
        tri.join(0, 0, 1, Perm::identity(3)).unwrap();

        let sig = tri.isosig().unwrap();
        assert_eq!(sig.len(), 3);
        let back = Triangulation::from_isosig(2, &sig).unwrap();
        assert_eq!(back.count_boundary_facets(), 4);
    }

    #[test]
    fn components_sort_within_signature() {
        let mut tri = Triangulation::new(2);
        tri.add_simplices(3);
        tri.join(1, 0, 2, Perm::identity(3)).unwrap();

        // One isolated triangle plus one glued pair, in either order.
        let mut other = Triangulation::new(2);
        other.add_simplices(3);
        other.join(0, 0, 1, Perm::identity(3)).unwrap();

        let sig = tri.isosig().unwrap();
        assert_eq!(other.isosig().unwrap(), sig);

        let back = Triangulation::from_isosig(2, &sig).unwrap();
        assert_eq!(back.components().len(), 2);
        assert_eq!(back.isosig().unwrap(), sig);
    }

    #[test]
    fn wide_components_use_the_width_marker() {
        // A path of 63 triangles forces the multi-character encoding.
        let mut tri = Triangulation::new(2);
        tri.add_simplices(63);
        for simplex in 0..62 {
            tri.join(simplex, 0, simplex + 1, Perm::from_images(vec![1, 0, 2]))
                .unwrap();
        }

        let sig = tri.isosig().unwrap();
        assert!(sig.starts_with('-'));
        let back = Triangulation::from_isosig(2, &sig).unwrap();
        assert_eq!(back.size(), 63);
        assert_eq!(back.isosig().unwrap(), sig);
    }

    #[test]
    fn signatures_separate_non_isomorphic_triangulations() {
        let sphere_sig = sphere().isosig().unwrap();

        // Gluing the two triangles with a twist gives RP^2 instead.
        let mut twisted = Triangulation::new(2);
        twisted.add_simplices(2);
        twisted.join(0, 0, 1, Perm::identity(3)).unwrap();
        twisted.join(0, 1, 1, Perm::identity(3)).unwrap();
        twisted
            .join(0, 2, 1, Perm::from_images(vec![1, 0, 2]))
            .unwrap();

        assert_ne!(twisted.isosig().unwrap(), sphere_sig);
    }

    #[rstest]
    #[case("")]
    #[case("  \t ")]
    fn blank_input_decodes_to_the_empty_triangulation(#[case] sig: &str) {
        let tri = Triangulation::from_isosig(2, sig).unwrap();
        assert!(tri.is_empty());
    }

    #[test]
    fn invalid_characters_are_rejected() {
        assert!(matches!(
            Triangulation::from_isosig(2, "b!"),
            Err(SigError::InvalidCharacter)
        ));
        assert!(matches!(
            Triangulation::from_isosig(2, "b a"),
            Err(SigError::InvalidCharacter)
        ));
    }

    #[test]
    fn truncated_streams_are_rejected() {
        // "c" promises two triangles but provides no actions.
        assert!(matches!(
            Triangulation::from_isosig(2, "c"),
            Err(SigError::Truncated)
        ));
    }

    #[test]
    fn malformed_gluings_are_rejected() {
        let sig = sphere().isosig().unwrap();
        // Truncating a valid signature must never produce a triangulation.
        for cut in 1..sig.len() {
            assert!(Triangulation::from_isosig(2, &sig[..cut]).is_err());
        }
    }

    #[test]
    fn oversized_permutation_index_is_rejected() {
        // Component of two triangles where facet 0 of the first is glued to
        // an earlier simplex with permutation index 63 (out of range for
        // S_3, which has only 6 elements). Actions: [2, 0, 0] then [0, 0, 0],
        // destination 0, permutation index 63.
        let mut sig = String::new();
        sig.push(base64::encode_single(2));
        sig.push(base64::encode_trits(&[2, 0, 0]));
        sig.push(base64::encode_trits(&[0, 0, 0]));
        sig.push(base64::encode_single(0));
        sig.push(base64::encode_single(63));
        assert!(matches!(
            Triangulation::from_isosig(2, &sig),
            Err(SigError::BadPermutationIndex)
        ));
    }
}
