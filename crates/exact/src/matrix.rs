use std::fmt;
use std::ops::{Index, IndexMut};

use itertools::Itertools;
use num_traits::Zero;

use crate::Integer;

/// A dense matrix of [`Integer`]s, stored in row-major order.
///
/// The matrix is built for the in-place row and column operations that Smith
/// normal form reduction needs; entry access is O(1) and every mutating
/// operation preserves the shape. Out-of-range indices and shape mismatches
/// are programmer errors and panic.
#[derive(Clone, PartialEq, Eq)]
pub struct MatrixInt {
    rows: usize,
    cols: usize,
    entries: Vec<Integer>,
}

impl MatrixInt {
    /// Creates a zero matrix with the given shape.
    pub fn new(rows: usize, cols: usize) -> MatrixInt {
        MatrixInt {
            rows,
            cols,
            entries: vec![Integer::zero(); rows * cols],
        }
    }

    /// Builds a matrix from literal rows. All rows must have the same length;
    /// an empty slice gives the 0×0 matrix.
    pub fn from_rows(rows: &[Vec<i64>]) -> MatrixInt {
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, Vec::len);
        let mut result = MatrixInt::new(n_rows, n_cols);
        for (i, row) in rows.iter().enumerate() {
            assert_eq!(row.len(), n_cols, "rows must all have the same length");
            for (j, value) in row.iter().enumerate() {
                result[(i, j)] = Integer::from(*value);
            }
        }
        result
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    pub fn is_zero(&self) -> bool {
        self.entries.iter().all(Integer::is_zero)
    }

    fn offset(&self, row: usize, col: usize) -> usize {
        assert!(
            row < self.rows && col < self.cols,
            "entry ({row}, {col}) out of range for a {}x{} matrix",
            self.rows,
            self.cols
        );
        row * self.cols + col
    }

    pub fn entry(&self, row: usize, col: usize) -> &Integer {
        &self.entries[self.offset(row, col)]
    }

    pub fn entry_mut(&mut self, row: usize, col: usize) -> &mut Integer {
        let offset = self.offset(row, col);
        &mut self.entries[offset]
    }

    pub fn set(&mut self, row: usize, col: usize, value: Integer) {
        let offset = self.offset(row, col);
        self.entries[offset] = value;
    }

    /// Swaps two entire rows.
    pub fn swap_rows(&mut self, r1: usize, r2: usize) {
        if r1 == r2 {
            return;
        }
        for col in 0..self.cols {
            let a = self.offset(r1, col);
            let b = self.offset(r2, col);
            self.entries.swap(a, b);
        }
    }

    /// Swaps two columns, from the given row downwards. Rows above `from_row`
    /// are left untouched; pass 0 to swap the full columns.
    pub fn swap_cols(&mut self, c1: usize, c2: usize, from_row: usize) {
        if c1 == c2 {
            return;
        }
        for row in from_row..self.rows {
            let a = self.offset(row, c1);
            let b = self.offset(row, c2);
            self.entries.swap(a, b);
        }
    }

    /// Adds row `src` to row `dst`, from the given column onwards.
    pub fn add_row_from(&mut self, src: usize, dst: usize, from_col: usize) {
        assert_ne!(src, dst, "cannot add a row to itself");
        for col in from_col..self.cols {
            let value = self.entry(src, col).clone();
            *self.entry_mut(dst, col) += value;
        }
    }

    /// Adds column `src` to column `dst`, from the given row onwards.
    pub fn add_col_from(&mut self, src: usize, dst: usize, from_row: usize) {
        assert_ne!(src, dst, "cannot add a column to itself");
        for row in from_row..self.rows {
            let value = self.entry(row, src).clone();
            *self.entry_mut(row, dst) += value;
        }
    }

    /// Adds `coeff` times row `src` to row `dst`, from the given column
    /// onwards.
    pub fn add_multiple_of_row(
        &mut self,
        src: usize,
        dst: usize,
        coeff: &Integer,
        from_col: usize,
    ) {
        assert_ne!(src, dst, "cannot add a row to itself");
        for col in from_col..self.cols {
            let value = coeff * self.entry(src, col);
            *self.entry_mut(dst, col) += value;
        }
    }

    /// Adds `coeff` times column `src` to column `dst`, from the given row
    /// onwards.
    pub fn add_multiple_of_col(
        &mut self,
        src: usize,
        dst: usize,
        coeff: &Integer,
        from_row: usize,
    ) {
        assert_ne!(src, dst, "cannot add a column to itself");
        for row in from_row..self.rows {
            let value = coeff * self.entry(row, src);
            *self.entry_mut(row, dst) += value;
        }
    }

    /// Negates every entry of the given row.
    pub fn negate_row(&mut self, row: usize) {
        for col in 0..self.cols {
            self.entry_mut(row, col).negate();
        }
    }

    /// Negates every entry of the given column.
    pub fn negate_col(&mut self, col: usize) {
        for row in 0..self.rows {
            self.entry_mut(row, col).negate();
        }
    }

    /// Multiplies row `row` by the given coefficient, from the given column
    /// onwards.
    pub fn multiply_row(&mut self, row: usize, coeff: &Integer, from_col: usize) {
        for col in from_col..self.cols {
            *self.entry_mut(row, col) *= coeff;
        }
    }

    /// Multiplies column `col` by the given coefficient, from the given row
    /// onwards.
    pub fn multiply_col(&mut self, col: usize, coeff: &Integer, from_row: usize) {
        for row in from_row..self.rows {
            *self.entry_mut(row, col) *= coeff;
        }
    }

    /// Replaces rows `r1` and `r2` with linear combinations of both:
    /// `row1' = a * row1 + b * row2` and `row2' = c * row1 + d * row2`,
    /// from the given column onwards. The caller is responsible for keeping
    /// the combination unimodular (`a * d - b * c == ±1`).
    pub fn comb_rows(
        &mut self,
        r1: usize,
        r2: usize,
        a: &Integer,
        b: &Integer,
        c: &Integer,
        d: &Integer,
        from_col: usize,
    ) {
        assert_ne!(r1, r2, "cannot combine a row with itself");
        for col in from_col..self.cols {
            let x = self.entry(r1, col).clone();
            let y = self.entry(r2, col).clone();
            self.set(r1, col, a * &x + b * &y);
            self.set(r2, col, c * &x + d * &y);
        }
    }

    /// Replaces columns `c1` and `c2` with linear combinations of both:
    /// `col1' = a * col1 + b * col2` and `col2' = c * col1 + d * col2`,
    /// from the given row onwards.
    pub fn comb_cols(
        &mut self,
        c1: usize,
        c2: usize,
        a: &Integer,
        b: &Integer,
        c: &Integer,
        d: &Integer,
        from_row: usize,
    ) {
        assert_ne!(c1, c2, "cannot combine a column with itself");
        for row in from_row..self.rows {
            let x = self.entry(row, c1).clone();
            let y = self.entry(row, c2).clone();
            self.set(row, c1, a * &x + b * &y);
            self.set(row, c2, c * &x + d * &y);
        }
    }

    pub fn transpose(&self) -> MatrixInt {
        let mut result = MatrixInt::new(self.cols, self.rows);
        for row in 0..self.rows {
            for col in 0..self.cols {
                result.set(col, row, self.entry(row, col).clone());
            }
        }
        result
    }
}

impl Index<(usize, usize)> for MatrixInt {
    type Output = Integer;

    fn index(&self, (row, col): (usize, usize)) -> &Integer {
        self.entry(row, col)
    }
}

impl IndexMut<(usize, usize)> for MatrixInt {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut Integer {
        self.entry_mut(row, col)
    }
}

impl fmt::Display for MatrixInt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for row in 0..self.rows {
            let entries = (0..self.cols).map(|col| self.entry(row, col)).join(", ");
            writeln!(f, "[{entries}]")?;
        }
        Ok(())
    }
}

impl fmt::Debug for MatrixInt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "MatrixInt({}x{})\n{}", self.rows, self.cols, self)
    }
}

#[cfg(feature = "proptest")]
pub mod arbitrary {
    use proptest::collection::vec;
    use proptest::prelude::*;

    use super::*;

    pub const MAX_DIM: usize = 6;

    #[derive(Debug, Clone)]
    pub struct MatrixIntArbParams {
        pub rows: BoxedStrategy<usize>,
        pub cols: BoxedStrategy<usize>,
    }

    impl Default for MatrixIntArbParams {
        fn default() -> Self {
            Self {
                rows: (0..=MAX_DIM).boxed(),
                cols: (0..=MAX_DIM).boxed(),
            }
        }
    }

    impl Arbitrary for MatrixInt {
        type Parameters = MatrixIntArbParams;
        type Strategy = BoxedStrategy<Self>;

        fn arbitrary_with(args: Self::Parameters) -> Self::Strategy {
            (args.rows, args.cols)
                .prop_flat_map(|(rows, cols)| {
                    vec(-50i64..50, rows * cols)
                        .prop_map(move |entries| {
                            let mut m = MatrixInt::new(rows, cols);
                            for (idx, value) in entries.into_iter().enumerate() {
                                m.set(idx / cols.max(1), idx % cols.max(1), Integer::from(value));
                            }
                            m
                        })
                })
                .boxed()
        }
    }
}

#[cfg(test)]
mod tests {
    use expect_test::expect;

    use super::*;

    #[test]
    fn display_rows() {
        let m = MatrixInt::from_rows(&[vec![2, 0], vec![0, 3]]);
        expect![[r#"
            [2, 0]
            [0, 3]
        "#]]
        .assert_eq(&m.to_string());
    }

    #[test]
    fn comb_rows_is_invertible() {
        let mut m = MatrixInt::from_rows(&[vec![3, 5], vec![2, 7]]);
        let original = m.clone();
        // [[2, 1], [1, 1]] followed by its inverse [[1, -1], [-1, 2]].
        m.comb_rows(
            0,
            1,
            &Integer::from(2),
            &Integer::from(1),
            &Integer::from(1),
            &Integer::from(1),
            0,
        );
        m.comb_rows(
            0,
            1,
            &Integer::from(1),
            &Integer::from(-1),
            &Integer::from(-1),
            &Integer::from(2),
            0,
        );
        assert_eq!(m, original);
    }

    #[test]
    fn swap_cols_respects_from_row() {
        let mut m = MatrixInt::from_rows(&[vec![1, 2], vec![3, 4], vec![5, 6]]);
        m.swap_cols(0, 1, 1);
        assert_eq!(m, MatrixInt::from_rows(&[vec![1, 2], vec![4, 3], vec![6, 5]]));
    }

    #[test]
    fn add_multiple_of_row_and_negate() {
        let mut m = MatrixInt::from_rows(&[vec![1, 2], vec![10, 20]]);
        m.add_multiple_of_row(0, 1, &Integer::from(-10), 0);
        assert_eq!(m, MatrixInt::from_rows(&[vec![1, 2], vec![0, 0]]));

        m.negate_row(0);
        assert_eq!(m, MatrixInt::from_rows(&[vec![-1, -2], vec![0, 0]]));

        m.negate_col(1);
        assert_eq!(m, MatrixInt::from_rows(&[vec![-1, 2], vec![0, 0]]));
    }

    #[test]
    fn transpose_round_trip() {
        let m = MatrixInt::from_rows(&[vec![1, 2, 3], vec![4, 5, 6]]);
        assert_eq!(m.transpose().transpose(), m);
    }

    #[test]
    #[should_panic]
    fn out_of_range_entry_panics() {
        let m = MatrixInt::new(2, 2);
        let _ = m.entry(2, 0);
    }
}
