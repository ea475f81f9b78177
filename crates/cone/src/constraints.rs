use crate::Bitmask;

/// Admissibility constraints for vertex enumeration.
///
/// Coordinates are grouped into consecutive blocks of equal size. Each
/// constraint names a set of positions and requires that a ray be non-zero on
/// at most one of them:
///
/// - a *local* constraint applies its position pattern separately inside
///   every block (one constraint per block);
/// - a *global* constraint applies its per-block pattern across all blocks
///   at once (a single constraint for the whole vector).
///
/// Coordinates beyond the blocks (trailing slack coordinates) are allowed but
/// cannot appear in any constraint. Admissibility is not preserved under
/// convex combination, but inadmissibility is, which is what lets the
/// enumerator discard hopeless ray pairs early.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidityConstraints {
    block_size: usize,
    n_blocks: usize,
    local: Vec<Vec<usize>>,
    global: Vec<Vec<usize>>,
}

impl ValidityConstraints {
    /// An empty set of constraints: every ray is admissible.
    pub fn none() -> ValidityConstraints {
        ValidityConstraints::default()
    }

    /// Creates an empty constraint set over the given block structure.
    pub fn new(block_size: usize, n_blocks: usize) -> ValidityConstraints {
        ValidityConstraints {
            block_size,
            n_blocks,
            local: Vec::new(),
            global: Vec::new(),
        }
    }

    /// Adds one local constraint per block: within each block, at most one of
    /// the given positions (relative to the block start) may be non-zero.
    pub fn add_local<I: IntoIterator<Item = usize>>(&mut self, pattern: I) {
        let pattern: Vec<usize> = pattern.into_iter().collect();
        assert!(
            pattern.iter().all(|&p| p < self.block_size),
            "constraint position out of block range"
        );
        self.local.push(pattern);
    }

    /// Adds a single constraint spanning every block: across the whole
    /// vector, at most one of the given positions (relative to each block
    /// start) may be non-zero.
    pub fn add_global<I: IntoIterator<Item = usize>>(&mut self, pattern: I) {
        let pattern: Vec<usize> = pattern.into_iter().collect();
        assert!(
            pattern.iter().all(|&p| p < self.block_size),
            "constraint position out of block range"
        );
        self.global.push(pattern);
    }

    pub fn is_empty(&self) -> bool {
        self.local.is_empty() && self.global.is_empty()
    }

    /// Expands the constraints into facet bitmasks of the given length, one
    /// mask per concrete constraint. The enumerator treats each mask as "at
    /// most one of these coordinates may be non-zero".
    pub fn bitmasks(&self, len: usize) -> Vec<Bitmask> {
        assert!(
            len >= self.block_size * self.n_blocks,
            "bitmask length shorter than the constrained coordinates"
        );
        let mut masks = Vec::with_capacity(self.local.len() * self.n_blocks + self.global.len());
        for pattern in &self.local {
            for block in 0..self.n_blocks {
                let mut mask = Bitmask::new(len);
                for &position in pattern {
                    mask.set(block * self.block_size + position);
                }
                masks.push(mask);
            }
        }
        for pattern in &self.global {
            let mut mask = Bitmask::new(len);
            for block in 0..self.n_blocks {
                for &position in pattern {
                    mask.set(block * self.block_size + position);
                }
            }
            masks.push(mask);
        }
        masks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_constraints_expand_per_block() {
        let mut constraints = ValidityConstraints::new(3, 2);
        constraints.add_local([1, 2]);
        let masks = constraints.bitmasks(8);
        assert_eq!(masks.len(), 2);
        assert!(masks[0].get(1) && masks[0].get(2) && !masks[0].get(0));
        assert!(masks[1].get(4) && masks[1].get(5) && !masks[1].get(3));
        assert!(!masks[0].get(6) && !masks[0].get(7));
    }

    #[test]
    fn global_constraints_span_blocks() {
        let mut constraints = ValidityConstraints::new(2, 3);
        constraints.add_global([0]);
        let masks = constraints.bitmasks(6);
        assert_eq!(masks.len(), 1);
        assert!(masks[0].get(0) && masks[0].get(2) && masks[0].get(4));
        assert!(!masks[0].get(1) && !masks[0].get(3) && !masks[0].get(5));
    }

    #[test]
    fn no_constraints_means_no_masks() {
        assert!(ValidityConstraints::none().bitmasks(5).is_empty());
    }
}
