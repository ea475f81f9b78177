use std::fmt;

use exact::{Integer, MatrixInt};
use itertools::Itertools;
use num_traits::{One, Zero};

/// A ray in `R^n`: an integer vector considered up to positive scaling.
///
/// The canonical form is primitive (the gcd of the entries is 1), reached via
/// [`scale_down`]. Rays order lexicographically on their entries, which gives
/// the stable output order of the enumerator.
///
/// [`scale_down`]: Ray::scale_down
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ray(Vec<Integer>);

impl Ray {
    /// The zero vector of the given dimension.
    pub fn new(dim: usize) -> Ray {
        Ray(vec![Integer::zero(); dim])
    }

    /// The unit vector along the given coordinate axis.
    pub fn unit(dim: usize, axis: usize) -> Ray {
        assert!(axis < dim, "axis {axis} out of range for dimension {dim}");
        let mut ray = Ray::new(dim);
        ray.0[axis] = Integer::one();
        ray
    }

    pub fn from_entries(entries: Vec<Integer>) -> Ray {
        Ray(entries)
    }

    /// Builds a ray from literal entries; handy in tests.
    pub fn from_slice(entries: &[i64]) -> Ray {
        Ray(entries.iter().map(|&e| Integer::from(e)).collect())
    }

    pub fn dim(&self) -> usize {
        self.0.len()
    }

    pub fn entry(&self, index: usize) -> &Integer {
        &self.0[index]
    }

    pub fn entries(&self) -> &[Integer] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(Integer::is_zero)
    }

    /// The dot product with another ray.
    pub fn dot(&self, other: &Ray) -> Integer {
        assert_eq!(self.dim(), other.dim(), "ray dimensions differ");
        self.0
            .iter()
            .zip(&other.0)
            .map(|(a, b)| a * b)
            .sum()
    }

    /// The dot product with one row of a matrix.
    pub fn dot_row(&self, matrix: &MatrixInt, row: usize) -> Integer {
        assert_eq!(self.dim(), matrix.cols(), "ray does not match matrix width");
        (0..matrix.cols())
            .map(|col| matrix.entry(row, col) * &self.0[col])
            .sum()
    }

    /// Divides all entries by their gcd, producing the canonical primitive
    /// representative of this ray. The zero vector is left untouched.
    pub fn scale_down(&mut self) {
        let mut g = Integer::zero();
        for entry in &self.0 {
            g = g.gcd(entry);
            if g.is_one() {
                return;
            }
        }
        if g.is_zero() {
            return;
        }
        for entry in &mut self.0 {
            *entry = entry.div_exact(&g);
        }
    }

    /// The combination `a * self + b * other`, entry by entry.
    pub fn combine(&self, a: &Integer, other: &Ray, b: &Integer) -> Ray {
        assert_eq!(self.dim(), other.dim(), "ray dimensions differ");
        Ray(self
            .0
            .iter()
            .zip(&other.0)
            .map(|(x, y)| a * x + b * y)
            .collect())
    }
}

impl fmt::Debug for Ray {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({})", self.0.iter().join(", "))
    }
}

impl fmt::Display for Ray {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({})", self.0.iter().join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_down_to_primitive() {
        let mut ray = Ray::from_slice(&[6, -9, 12]);
        ray.scale_down();
        assert_eq!(ray, Ray::from_slice(&[2, -3, 4]));

        let mut zero = Ray::new(3);
        zero.scale_down();
        assert_eq!(zero, Ray::new(3));
    }

    #[test]
    fn dot_products() {
        let a = Ray::from_slice(&[1, 2, 3]);
        let b = Ray::from_slice(&[4, -5, 6]);
        assert_eq!(a.dot(&b), Integer::from(12));

        let m = MatrixInt::from_rows(&[vec![1, -1, 0]]);
        assert_eq!(a.dot_row(&m, 0), Integer::from(-1));
    }

    #[test]
    fn lexicographic_order() {
        let a = Ray::from_slice(&[0, 0, 1]);
        let b = Ray::from_slice(&[1, 1, 0]);
        assert!(a < b);
    }

    #[test]
    fn combine_is_linear() {
        let a = Ray::from_slice(&[1, 0, 2]);
        let b = Ray::from_slice(&[0, 1, 1]);
        let c = a.combine(&Integer::from(2), &b, &Integer::from(3));
        assert_eq!(c, Ray::from_slice(&[2, 3, 7]));
    }
}
