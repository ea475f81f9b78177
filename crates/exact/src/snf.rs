use num_traits::Zero;

use crate::{Integer, MatrixInt};

/// Reduces the given matrix, in place, to its Smith normal form.
///
/// On return the matrix is diagonal with non-negative entries
/// `d_1, d_2, ...` where each `d_i` divides `d_{i+1}`; any zero entries sit
/// at the end of the chain. The reduction applies only unimodular row and
/// column operations, so the matrix stays equivalent to the original (in
/// particular, for square matrices the determinant is preserved up to sign).
///
/// This never fails and runs in polynomial time. Pivots are chosen as the
/// remaining entry of smallest absolute value, and off-pivot entries are
/// cleared with Bezout combinations rather than plain Euclidean steps, which
/// keeps intermediate entries from swelling.
pub fn smith_normal_form(matrix: &mut MatrixInt) {
    let rows = matrix.rows();
    let cols = matrix.cols();

    let mut stage = 0;
    'stage: while stage < rows && stage < cols {
        // Find a pivot: the non-zero entry of smallest absolute value in the
        // remaining block.
        let mut pivot: Option<(usize, usize, Integer)> = None;
        for i in stage..rows {
            for j in stage..cols {
                let value = matrix.entry(i, j).abs();
                if !value.is_zero() && pivot.as_ref().map_or(true, |(_, _, best)| value < *best) {
                    pivot = Some((i, j, value));
                }
            }
        }
        let Some((pivot_row, pivot_col, _)) = pivot else {
            // The matrix is zero from here on, so we are done.
            break;
        };

        if pivot_row != stage {
            matrix.swap_rows(stage, pivot_row);
        }
        if pivot_col != stage {
            matrix.swap_cols(stage, pivot_col, stage);
        }

        // Clear the remainder of the pivot row.
        for j in stage + 1..cols {
            if matrix.entry(stage, j).is_zero() {
                continue;
            }
            let a = matrix.entry(stage, stage).clone();
            let b = matrix.entry(stage, j).clone();
            let (d, u, v) = a.gcd_with_coeffs(&b);
            let a = a.div_exact(&d);
            let b = b.div_exact(&d);
            let neg_b = -b;
            matrix.comb_cols(stage, j, &u, &v, &neg_b, &a, stage);
        }

        // Clear the remainder of the pivot column, noting whether that can
        // have disturbed the row we just cleared.
        let mut touched_row = false;
        for i in stage + 1..rows {
            if matrix.entry(i, stage).is_zero() {
                continue;
            }
            touched_row = true;
            let a = matrix.entry(stage, stage).clone();
            let b = matrix.entry(i, stage).clone();
            let (d, u, v) = a.gcd_with_coeffs(&b);
            let a = a.div_exact(&d);
            let b = b.div_exact(&d);
            let neg_b = -b;
            matrix.comb_rows(stage, i, &u, &v, &neg_b, &a, stage);
        }
        if touched_row && (stage + 1..cols).any(|j| !matrix.entry(stage, j).is_zero()) {
            // The clean row was disturbed; redo this stage.
            continue 'stage;
        }

        // Enforce the divisibility chain: every remaining entry must be a
        // multiple of the pivot. A violating row is folded into the pivot
        // row, which makes the next pass emit the gcd at the pivot.
        let diag = matrix.entry(stage, stage).clone();
        for i in stage + 1..rows {
            for j in stage + 1..cols {
                if !matrix.entry(i, j).is_divisible_by(&diag) {
                    matrix.add_row_from(i, stage, stage + 1);
                    continue 'stage;
                }
            }
        }

        if matrix.entry(stage, stage).signum() < 0 {
            matrix.entry_mut(stage, stage).negate();
        }
        stage += 1;
    }
}

/// The rank of the given matrix, computed by reducing a working copy to
/// Smith normal form and counting non-zero diagonal entries.
pub fn rank(matrix: &MatrixInt) -> usize {
    let mut work = matrix.clone();
    smith_normal_form(&mut work);
    (0..work.rows().min(work.cols()))
        .take_while(|&i| !work.entry(i, i).is_zero())
        .count()
}

#[cfg(test)]
mod tests {
    use expect_test::expect;
    use num_traits::{One, Zero};
    use proptest::prelude::*;

    use super::*;

    /// Naive cofactor determinant, for checking that the reduction preserves
    /// it up to sign on small matrices.
    fn determinant(m: &MatrixInt) -> Integer {
        assert!(m.is_square());
        let n = m.rows();
        if n == 0 {
            return Integer::one();
        }
        if n == 1 {
            return m.entry(0, 0).clone();
        }
        let mut det = Integer::zero();
        for col in 0..n {
            let mut minor = MatrixInt::new(n - 1, n - 1);
            for i in 1..n {
                let mut k = 0;
                for j in 0..n {
                    if j == col {
                        continue;
                    }
                    minor.set(i - 1, k, m.entry(i, j).clone());
                    k += 1;
                }
            }
            let cofactor = m.entry(0, col) * &determinant(&minor);
            if col % 2 == 0 {
                det += cofactor;
            } else {
                det -= cofactor;
            }
        }
        det
    }

    fn diagonal(m: &MatrixInt) -> Vec<Integer> {
        (0..m.rows().min(m.cols()))
            .map(|i| m.entry(i, i).clone())
            .collect()
    }

    fn assert_snf_shape(m: &MatrixInt) {
        for i in 0..m.rows() {
            for j in 0..m.cols() {
                if i != j {
                    assert!(m.entry(i, j).is_zero(), "off-diagonal entry at ({i}, {j})");
                }
            }
        }
        let diag = diagonal(m);
        for pair in diag.windows(2) {
            assert!(pair[0].signum() >= 0);
            assert!(
                pair[1].is_divisible_by(&pair[0]),
                "{} does not divide {}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn snf_2x2() {
        let mut m = MatrixInt::from_rows(&[vec![2, 0], vec![0, 3]]);
        smith_normal_form(&mut m);
        expect![[r#"
            [1, 0]
            [0, 6]
        "#]]
        .assert_eq(&m.to_string());
    }

    #[test]
    fn snf_3x3_divisibility() {
        let mut m = MatrixInt::from_rows(&[vec![6, 0, 0], vec![0, 10, 0], vec![0, 0, 15]]);
        smith_normal_form(&mut m);
        expect![[r#"
            [1, 0, 0]
            [0, 30, 0]
            [0, 0, 30]
        "#]]
        .assert_eq(&m.to_string());
    }

    #[test]
    fn snf_empty_matrix_is_noop() {
        let mut m = MatrixInt::new(0, 3);
        smith_normal_form(&mut m);
        assert_eq!(m, MatrixInt::new(0, 3));

        let mut m = MatrixInt::new(3, 0);
        smith_normal_form(&mut m);
        assert_eq!(m, MatrixInt::new(3, 0));
    }

    #[test]
    fn snf_rectangular() {
        let mut m = MatrixInt::from_rows(&[vec![2, 4, 4], vec![-6, 6, 12]]);
        smith_normal_form(&mut m);
        assert_snf_shape(&m);
        assert_eq!(diagonal(&m), vec![Integer::from(2), Integer::from(6)]);
    }

    #[test]
    fn snf_zero_rows_trail() {
        let mut m = MatrixInt::from_rows(&[vec![1, 2], vec![2, 4]]);
        smith_normal_form(&mut m);
        assert_eq!(diagonal(&m), vec![Integer::one(), Integer::zero()]);
    }

    #[test]
    fn rank_of_singular_matrix() {
        let m = MatrixInt::from_rows(&[vec![1, 2, 3], vec![2, 4, 6], vec![0, 0, 1]]);
        assert_eq!(rank(&m), 2);
    }

    proptest! {
        #[test]
        fn snf_is_idempotent(m in any::<MatrixInt>()) {
            let mut once = m;
            smith_normal_form(&mut once);
            let mut twice = once.clone();
            smith_normal_form(&mut twice);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn snf_diagonal_with_divisibility_chain(m in any::<MatrixInt>()) {
            let mut m = m;
            smith_normal_form(&mut m);
            assert_snf_shape(&m);
        }

        #[test]
        fn snf_preserves_determinant_magnitude(
            entries in proptest::collection::vec(-9i64..9, 9)
        ) {
            let m = MatrixInt::from_rows(&[
                entries[0..3].to_vec(),
                entries[3..6].to_vec(),
                entries[6..9].to_vec(),
            ]);
            let det_before = determinant(&m).abs();
            let mut reduced = m;
            smith_normal_form(&mut reduced);
            prop_assert_eq!(determinant(&reduced).abs(), det_before);
        }
    }
}
