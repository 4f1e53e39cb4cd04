//! Ranking of sorted k-subsets of `0..n`.
//!
//! Subsets are numbered in lexicographic order of their sorted elements. The rank of
//! `[p0 < p1 < ... < pk-1]` is the number of subsets whose first element is smaller than
//! `p0`, plus the rank of the remaining elements within the domain `p0+1 .. n`.

use crate::error::SolverError;
use crate::playfield::{BoxVec, FieldId};

#[derive(Clone, Debug)]
pub struct Indexer {
    n: usize,
    k: usize,
    // binomial[n][k] = C(n, k), saturated at u64::MAX.
    binomial: Vec<Vec<u64>>,
    // prefix[n][k][s] = number of k-subsets of an n-element domain whose minimum is < s,
    // for 0 <= s <= n-k. Rows with k == 0 or k > n are empty.
    prefix: Vec<Vec<Vec<u64>>>,
}

impl Indexer {
    /// Builds the tables for k-subsets of `0..n`. Fails if `C(n, k)` exceeds 64 bits.
    pub fn new(n: usize, k: usize) -> Result<Self, SolverError> {
        let binomial = binomial_table(n, k);
        if k <= n && binomial[n][k] == u64::MAX {
            return Err(SolverError::ArithmeticOverflow("number of box configurations"));
        }

        let mut prefix: Vec<Vec<Vec<u64>>> = vec![vec![Vec::new(); k + 1]; n + 1];
        for m in 1..=n {
            for j in 1..=k.min(m) {
                let row = &mut prefix[m][j];
                row.reserve_exact(m - j + 1);
                row.push(0);
                // The minimum is s: the other j-1 elements come from the m-1-s above it.
                for s in 0..m - j {
                    let next = row[s].saturating_add(binomial[m - 1 - s][j - 1]);
                    row.push(next);
                }
            }
        }

        Ok(Indexer { n, k, binomial, prefix })
    }

    /// `C(n, k)` for `n` and `k` up to the sizes the tables were built for.
    #[inline]
    pub fn binomial(&self, n: usize, k: usize) -> u64 {
        self.binomial[n][k]
    }

    /// Number of distinct k-subsets, i.e. the exclusive upper bound of all ranks.
    #[inline]
    pub fn num_subsets(&self) -> u64 {
        if self.k > self.n {
            0
        } else {
            self.binomial[self.n][self.k]
        }
    }

    /// Rank of a strictly ascending k-subset of `0..n`.
    pub fn rank(&self, sorted: &[FieldId]) -> u64 {
        debug_assert_eq!(sorted.len(), self.k);
        debug_assert!(sorted.windows(2).all(|w| w[0] < w[1]));
        let mut no = 0;
        let mut start = 0;
        for (i, &pos) in sorted.iter().enumerate() {
            let pos = pos as usize;
            debug_assert!(pos < self.n);
            no += self.prefix[self.n - start][self.k - i][pos - start];
            start = pos + 1;
        }
        no
    }

    /// Inverse of [`Indexer::rank`]. `index` must be below [`Indexer::num_subsets`].
    pub fn unrank(&self, mut index: u64) -> BoxVec {
        debug_assert!(index < self.num_subsets());
        let mut out = BoxVec::with_capacity(self.k);
        let mut start = 0;
        for i in 0..self.k {
            let row = &self.prefix[self.n - start][self.k - i];
            // row[0] == 0, so at least one boundary qualifies.
            let s = row.partition_point(|&v| v <= index) - 1;
            index -= row[s];
            out.push((start + s) as FieldId);
            start += s + 1;
        }
        out
    }
}

/// C(i, j) for 0 <= i <= n, 0 <= j <= k via C(i, j) = C(i, j-1) * (i-j+1) / j. Values that
/// do not fit in 64 bits are stored as u64::MAX.
fn binomial_table(n: usize, k: usize) -> Vec<Vec<u64>> {
    let mut table = vec![vec![0u64; k + 1]; n + 1];
    for i in 0..=n {
        table[i][0] = 1;
        // Exact on the rising half of the row; the falling half mirrors it.
        let half = (i / 2).min(k);
        let mut c: Option<u128> = Some(1);
        for j in 1..=half {
            c = c.and_then(|c| c.checked_mul((i - j + 1) as u128)).map(|c| c / j as u128);
            table[i][j] = c.and_then(|c| u64::try_from(c).ok()).unwrap_or(u64::MAX);
        }
        for j in half + 1..=k.min(i) {
            table[i][j] = table[i][i - j];
        }
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subsets(n: usize, k: usize) -> Vec<Vec<FieldId>> {
        fn rec(start: usize, n: usize, k: usize, cur: &mut Vec<FieldId>, out: &mut Vec<Vec<FieldId>>) {
            if cur.len() == k {
                out.push(cur.clone());
                return;
            }
            for p in start..n {
                cur.push(p as FieldId);
                rec(p + 1, n, k, cur, out);
                cur.pop();
            }
        }
        let mut out = Vec::new();
        rec(0, n, k, &mut Vec::new(), &mut out);
        out
    }

    #[test]
    fn binomials_match_known_values() {
        let ix = Indexer::new(10, 5).unwrap();
        assert_eq!(ix.binomial(5, 2), 10);
        assert_eq!(ix.binomial(10, 3), 120);
        assert_eq!(ix.binomial(10, 5), 252);
        assert_eq!(ix.binomial(7, 0), 1);
        assert_eq!(ix.binomial(3, 5), 0);
        assert_eq!(ix.num_subsets(), 252);
    }

    #[test]
    fn rank_is_lexicographic_position() {
        for n in 1..=8 {
            for k in 1..=n {
                let ix = Indexer::new(n, k).unwrap();
                let all = subsets(n, k);
                assert_eq!(all.len() as u64, ix.num_subsets());
                for (i, s) in all.iter().enumerate() {
                    assert_eq!(ix.rank(s), i as u64, "n={n} k={k} {s:?}");
                    assert_eq!(ix.unrank(i as u64).as_slice(), s.as_slice());
                }
            }
        }
    }

    #[test]
    fn unrank_then_rank_on_larger_domain() {
        let ix = Indexer::new(40, 6).unwrap();
        let total = ix.num_subsets();
        assert_eq!(total, 3_838_380);
        for i in (0..total).step_by(9_973).chain([total - 1]) {
            let s = ix.unrank(i);
            assert!(s.windows(2).all(|w| w[0] < w[1]));
            assert!(s.iter().all(|&p| (p as usize) < 40));
            assert_eq!(ix.rank(&s), i);
        }
    }

    #[test]
    fn empty_subset_has_single_rank() {
        let ix = Indexer::new(5, 0).unwrap();
        assert_eq!(ix.num_subsets(), 1);
        assert_eq!(ix.rank(&[]), 0);
        assert!(ix.unrank(0).is_empty());
    }

    #[test]
    fn goal_subset_ranks_first() {
        let ix = Indexer::new(12, 4).unwrap();
        assert_eq!(ix.rank(&[0, 1, 2, 3]), 0);
        assert_eq!(ix.rank(&[8, 9, 10, 11]), ix.num_subsets() - 1);
    }

    #[test]
    fn oversized_space_is_rejected() {
        assert!(Indexer::new(200, 60).is_err());
        // Narrow subsets of a large domain still fit.
        let ix = Indexer::new(200, 3).unwrap();
        assert_eq!(ix.num_subsets(), 1_313_400);
    }
}
