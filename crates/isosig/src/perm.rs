use std::fmt;

use itertools::Itertools;

/// A permutation of `{0, .., n-1}`, with the degree `n` chosen at runtime.
///
/// Signatures only need a handful of operations: composition, inversion,
/// images and preimages, and the lexicographic index used to serialise a
/// permutation as an integer. Degrees are small (a `d`-dimensional
/// triangulation uses degree `d + 1`), so images are stored directly.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Perm {
    images: Vec<u8>,
}

impl Perm {
    /// The identity permutation of the given degree.
    pub fn identity(degree: usize) -> Perm {
        Perm {
            images: (0..degree as u8).collect(),
        }
    }

    /// Builds a permutation from its image list. The list must be a
    /// bijection of `{0, .., n-1}`.
    pub fn from_images(images: Vec<u8>) -> Perm {
        let mut hit = vec![false; images.len()];
        for &image in &images {
            assert!(
                (image as usize) < images.len() && !hit[image as usize],
                "images do not form a permutation"
            );
            hit[image as usize] = true;
        }
        Perm { images }
    }

    pub fn degree(&self) -> usize {
        self.images.len()
    }

    /// The image of `i`.
    pub fn apply(&self, i: usize) -> usize {
        self.images[i] as usize
    }

    /// The preimage of `i`.
    pub fn pre(&self, i: usize) -> usize {
        self.images
            .iter()
            .position(|&image| image as usize == i)
            .expect("argument out of range")
    }

    pub fn inverse(&self) -> Perm {
        let mut images = vec![0; self.images.len()];
        for (i, &image) in self.images.iter().enumerate() {
            images[image as usize] = i as u8;
        }
        Perm { images }
    }

    /// The composition `self ∘ other`: first apply `other`, then `self`.
    pub fn compose(&self, other: &Perm) -> Perm {
        assert_eq!(self.degree(), other.degree(), "permutation degrees differ");
        Perm {
            images: other.images.iter().map(|&i| self.images[i as usize]).collect(),
        }
    }

    /// Whether this is the identity.
    pub fn is_identity(&self) -> bool {
        self.images.iter().enumerate().all(|(i, &image)| i as u8 == image)
    }

    /// The index of this permutation among all permutations of its degree,
    /// ordered lexicographically by image list.
    pub fn ordered_index(&self) -> u64 {
        let n = self.degree();
        let mut index = 0;
        for i in 0..n {
            let smaller_later = (i + 1..n)
                .filter(|&j| self.images[j] < self.images[i])
                .count() as u64;
            index += smaller_later * factorial(n - 1 - i);
        }
        index
    }

    /// The inverse of [`ordered_index`]: the `index`th permutation of the
    /// given degree in lexicographic order.
    ///
    /// [`ordered_index`]: Perm::ordered_index
    pub fn from_ordered_index(mut index: u64, degree: usize) -> Perm {
        assert!(
            Perm::count(degree).is_some_and(|count| index < count),
            "permutation index out of range"
        );
        let mut available: Vec<u8> = (0..degree as u8).collect();
        let mut images = Vec::with_capacity(degree);
        for i in 0..degree {
            let block = factorial(degree - 1 - i);
            let position = (index / block) as usize;
            index %= block;
            images.push(available.remove(position));
        }
        Perm { images }
    }

    /// The number of permutations of the given degree, or `None` if `n!`
    /// overflows a `u64`.
    pub fn count(degree: usize) -> Option<u64> {
        (1..=degree as u64).try_fold(1u64, u64::checked_mul)
    }

    /// All permutations of the given degree, in lexicographic order.
    pub fn all(degree: usize) -> impl Iterator<Item = Perm> {
        (0..degree as u8)
            .permutations(degree)
            .map(|images| Perm { images })
    }
}

/// `n!` for the small degrees that appear in practice; the codec checks
/// [`Perm::count`] before ever calling into this.
fn factorial(n: usize) -> u64 {
    (1..=n as u64).product()
}

impl fmt::Debug for Perm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}]", self.images.iter().join(" "))
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rstest::rstest;

    use super::*;

    #[test]
    fn identity_basics() {
        let id = Perm::identity(4);
        assert!(id.is_identity());
        assert_eq!(id.ordered_index(), 0);
        assert_eq!(id.inverse(), id);
    }

    #[test]
    fn compose_applies_right_first() {
        // other sends 0 -> 1; self sends 1 -> 2.
        let other = Perm::from_images(vec![1, 0, 2]);
        let this = Perm::from_images(vec![0, 2, 1]);
        let composed = this.compose(&other);
        assert_eq!(composed.apply(0), 2);
    }

    #[test]
    fn inverse_composes_to_identity() {
        let p = Perm::from_images(vec![2, 0, 3, 1]);
        assert!(p.compose(&p.inverse()).is_identity());
        assert!(p.inverse().compose(&p).is_identity());
    }

    #[rstest]
    #[case(3)]
    #[case(4)]
    #[case(5)]
    fn ordered_index_enumerates_lexicographically(#[case] degree: usize) {
        let count = Perm::count(degree).unwrap();
        for (index, perm) in Perm::all(degree).enumerate() {
            assert_eq!(perm.ordered_index(), index as u64);
            assert_eq!(Perm::from_ordered_index(index as u64, degree), perm);
        }
        assert_eq!(Perm::all(degree).count() as u64, count);
    }

    #[test]
    fn count_overflows_to_none() {
        assert_eq!(Perm::count(0), Some(1));
        assert_eq!(Perm::count(5), Some(120));
        assert_eq!(Perm::count(60), None);
    }

    proptest! {
        #[test]
        fn pre_is_inverse_image(index in 0u64..120, at in 0usize..5) {
            let p = Perm::from_ordered_index(index, 5);
            prop_assert_eq!(p.pre(p.apply(at)), at);
            prop_assert_eq!(p.inverse().apply(p.apply(at)), at);
        }
    }
}
