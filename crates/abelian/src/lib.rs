//! Finitely generated abelian groups in canonical invariant-factor form.
//!
//! An [`AbelianGroup`] represents `Z^r + Z_{d_1} + ... + Z_{d_k}` where every
//! invariant factor `d_i` is at least 2 and `d_1 | d_2 | ... | d_k`. This
//! representation is unique, so two groups are equal exactly when their rank
//! and factor lists match. Torsion that arrives in any other shape (say
//! `Z_2 + Z_3`) is folded into canonical form as it is added (`Z_6`).

use std::fmt;

use exact::{smith_normal_form, Integer, MatrixInt};
use itertools::Itertools;
use num_traits::{One, Zero};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GroupError {
    /// Invariant factors handed to a constructor must each exceed 1 and each
    /// must divide the next.
    #[error("invariant factors must all exceed 1 and form a divisibility chain")]
    InvalidInvariantFactors,

    /// The two matrices of a chain complex must compose: the number of
    /// columns of the outer matrix must match the number of rows of the
    /// inner one.
    #[error("chain matrices do not compose: M is {m_rows}x{m_cols} but N is {n_rows}x{n_cols}")]
    ChainShapeMismatch {
        m_rows: usize,
        m_cols: usize,
        n_rows: usize,
        n_cols: usize,
    },
}

/// A finitely generated abelian group, stored as a free rank plus the sorted
/// list of invariant factors.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct AbelianGroup {
    rank: usize,
    /// Invariant factors in ascending order; every entry is at least 2 and
    /// divides the entry after it.
    inv_factors: Vec<Integer>,
}

impl AbelianGroup {
    /// Creates the trivial group.
    pub fn new() -> AbelianGroup {
        AbelianGroup::default()
    }

    /// Creates a free abelian group of the given rank.
    pub fn free(rank: usize) -> AbelianGroup {
        AbelianGroup {
            rank,
            inv_factors: Vec::new(),
        }
    }

    /// Creates a group with the given rank and invariant factors. The factors
    /// must already be in canonical form: each greater than 1, each dividing
    /// the next.
    pub fn with_invariant_factors<I>(rank: usize, factors: I) -> Result<AbelianGroup, GroupError>
    where
        I: IntoIterator,
        I::Item: Into<Integer>,
    {
        let factors: Vec<Integer> = factors.into_iter().map(Into::into).collect();
        for factor in &factors {
            if *factor <= Integer::one() {
                return Err(GroupError::InvalidInvariantFactors);
            }
        }
        for pair in factors.windows(2) {
            if !pair[1].is_divisible_by(&pair[0]) {
                return Err(GroupError::InvalidInvariantFactors);
            }
        }
        Ok(AbelianGroup {
            rank,
            inv_factors: factors,
        })
    }

    /// Creates the group defined by a presentation matrix: each column is a
    /// generator and each row is a relation.
    pub fn from_presentation(presentation: MatrixInt) -> AbelianGroup {
        let mut group = AbelianGroup::new();
        group.add_presentation(presentation);
        group
    }

    /// Creates the homology group `ker M / im N` of a chain complex
    ///
    /// ```text
    ///   Z^a <-- M -- Z^b <-- N -- Z^c
    /// ```
    ///
    /// The matrices act on column vectors, and `M * N = 0` is a precondition
    /// that is not checked (violating it aborts). The shapes must compose.
    pub fn from_chain(mut m: MatrixInt, mut n: MatrixInt) -> Result<AbelianGroup, GroupError> {
        if m.cols() != n.rows() {
            return Err(GroupError::ChainShapeMismatch {
                m_rows: m.rows(),
                m_cols: m.cols(),
                n_rows: n.rows(),
                n_cols: n.cols(),
            });
        }

        smith_normal_form(&mut m);
        let rank_m = count_pivots(&m);
        smith_normal_form(&mut n);
        let rank_n = count_pivots(&n);
        assert!(
            rank_m + rank_n <= n.rows(),
            "matrices do not form a chain complex"
        );

        let mut group = AbelianGroup::free(n.rows() - rank_n - rank_m);
        for i in 0..rank_n {
            let d = n.entry(i, i);
            if !d.is_one() {
                group.add_torsion(d.clone());
            }
        }
        Ok(group)
    }

    /// Creates the homology of a chain complex with mod-`p` coefficients.
    ///
    /// Every non-zero pivot `d` of either matrix contributes a `Z_gcd(d, |p|)`
    /// factor, and when `p` is non-zero the residual free rank converts to
    /// copies of `Z_|p|`. With `p = 0` this is exactly [`from_chain`].
    ///
    /// [`from_chain`]: AbelianGroup::from_chain
    pub fn from_chain_mod(
        mut m: MatrixInt,
        mut n: MatrixInt,
        p: &Integer,
    ) -> Result<AbelianGroup, GroupError> {
        let p = p.abs();
        if p.is_zero() {
            return AbelianGroup::from_chain(m, n);
        }
        if m.cols() != n.rows() {
            return Err(GroupError::ChainShapeMismatch {
                m_rows: m.rows(),
                m_cols: m.cols(),
                n_rows: n.rows(),
                n_cols: n.cols(),
            });
        }

        smith_normal_form(&mut m);
        let rank_m = count_pivots(&m);
        smith_normal_form(&mut n);
        let rank_n = count_pivots(&n);
        assert!(
            rank_m + rank_n <= n.rows(),
            "matrices do not form a chain complex"
        );

        let mut group = AbelianGroup::new();
        for i in 0..rank_m {
            // A pivot d of M only constrains mod p through gcd(d, p): the
            // kernel of multiplication by d on Z_p is Z_gcd(d, p).
            group.add_torsion(m.entry(i, i).gcd(&p));
        }
        for i in 0..rank_n {
            group.add_torsion(n.entry(i, i).gcd(&p));
        }
        for _ in 0..(n.rows() - rank_n - rank_m) {
            group.add_torsion(p.clone());
        }
        Ok(group)
    }

    /// The rank of the group (the number of `Z` summands).
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Adjusts the rank by the given amount, which may be negative. The
    /// resulting rank must stay non-negative.
    pub fn add_rank(&mut self, delta: isize) {
        let rank = self.rank as isize + delta;
        assert!(rank >= 0, "rank cannot become negative");
        self.rank = rank as usize;
    }

    /// Adds a single `Z_degree` torsion summand and restores canonical form.
    ///
    /// The degree must be strictly positive; a degree of 1 is a no-op. The
    /// invariant-factor list is rewritten with a gcd/lcm cascade, so this is
    /// cheap enough to call once per summand.
    pub fn add_torsion(&mut self, degree: Integer) {
        assert!(degree.signum() > 0, "torsion degree must be positive");
        let mut incoming = degree;
        if incoming.is_one() {
            return;
        }
        for i in (0..self.inv_factors.len()).rev() {
            let g = incoming.gcd(&self.inv_factors[i]);
            let lcm = self.inv_factors[i].div_exact(&g) * &incoming;
            self.inv_factors[i] = lcm;
            incoming = g;
            if incoming.is_one() {
                return;
            }
        }
        self.inv_factors.insert(0, incoming);
    }

    /// Adds the given group as a direct summand.
    pub fn add_group(&mut self, other: &AbelianGroup) {
        self.rank += other.rank;
        for factor in &other.inv_factors {
            self.add_torsion(factor.clone());
        }
    }

    /// Adds the group defined by the given presentation matrix as a direct
    /// summand: each column is a generator, each row a relation.
    pub fn add_presentation(&mut self, mut presentation: MatrixInt) {
        smith_normal_form(&mut presentation);
        let pivots = count_pivots(&presentation);
        self.rank += presentation.cols() - pivots;
        for i in 0..pivots {
            let d = presentation.entry(i, i);
            if !d.is_one() {
                self.add_torsion(d.clone());
            }
        }
    }

    /// The invariant factors in ascending order.
    pub fn invariant_factors(&self) -> &[Integer] {
        &self.inv_factors
    }

    pub fn count_invariant_factors(&self) -> usize {
        self.inv_factors.len()
    }

    /// The `index`th invariant factor, ascending.
    pub fn invariant_factor(&self, index: usize) -> &Integer {
        &self.inv_factors[index]
    }

    /// The number of invariant factors divisible by `degree`. Equivalently,
    /// the rank of the maximal `Z_degree` subgroup of the torsion part.
    pub fn torsion_rank(&self, degree: &Integer) -> usize {
        self.inv_factors
            .iter()
            .filter(|factor| factor.is_divisible_by(degree))
            .count()
    }

    pub fn is_trivial(&self) -> bool {
        self.rank == 0 && self.inv_factors.is_empty()
    }

    pub fn is_z(&self) -> bool {
        self.rank == 1 && self.inv_factors.is_empty()
    }

    pub fn is_free(&self, rank: usize) -> bool {
        self.rank == rank && self.inv_factors.is_empty()
    }

    /// Whether this group is `Z_n`. For `n = 0` this means `Z`; for `n = 1`
    /// the trivial group.
    pub fn is_zn(&self, n: u64) -> bool {
        match n {
            0 => self.is_z(),
            1 => self.is_trivial(),
            _ => {
                self.rank == 0
                    && self.inv_factors.len() == 1
                    && self.inv_factors[0] == Integer::from(n)
            }
        }
    }
}

fn count_pivots(m: &MatrixInt) -> usize {
    (0..m.rows().min(m.cols()))
        .take_while(|&i| !m.entry(i, i).is_zero())
        .count()
}

impl fmt::Display for AbelianGroup {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_trivial() {
            return write!(f, "0");
        }
        let mut terms = Vec::new();
        match self.rank {
            0 => {}
            1 => terms.push("Z".to_owned()),
            rank => terms.push(format!("{rank} Z")),
        }
        for (count, factor) in self
            .inv_factors
            .iter()
            .dedup_with_count()
        {
            if count == 1 {
                terms.push(format!("Z_{factor}"));
            } else {
                terms.push(format!("{count} Z_{factor}"));
            }
        }
        write!(f, "{}", terms.join(" + "))
    }
}
