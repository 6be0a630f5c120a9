//! Word-level edit distance with a pluggable equivalence test, and its deterministic backtrace.

use crate::mapping::NormMapping;
use serde::{Deserialize, Serialize};

/// One step of an alignment, read left to right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EditOp {
    Equal,
    Substitute,
    /// Token present only in the target.
    Insert,
    /// Token present only in the source.
    Delete,
}

impl EditOp {
    pub fn as_char(&self) -> char {
        match self {
            Self::Equal => 'E',
            Self::Substitute => 'S',
            Self::Insert => 'I',
            Self::Delete => 'D',
        }
    }

    pub fn is_error(&self) -> bool {
        !matches!(self, Self::Equal)
    }
}

/// Decides whether a source token and a target token count as the same word.
///
/// Implementations need not be symmetric; the aligner always passes the source token first.
pub trait Equivalence {
    fn equivalent(&self, source: &str, target: &str) -> bool;
}

/// Identical strings only.
#[derive(Debug, Clone, Copy, Default)]
pub struct Exact;

impl Equivalence for Exact {
    fn equivalent(&self, source: &str, target: &str) -> bool {
        source == target
    }
}

/// Spelling-variant aware comparison routed through a [`NormMapping`].
///
/// The target token is looked up as a dialectal form; the source token matches if it is one of the
/// normalized forms found there, or any dialectal spelling of those normalized forms. A target
/// token unknown to the mapping never matches, not even an identical source token.
#[derive(Debug, Clone, Copy)]
pub struct MappingAware<'a> {
    mapping: &'a NormMapping,
}

impl<'a> MappingAware<'a> {
    pub fn new(mapping: &'a NormMapping) -> Self {
        Self { mapping }
    }
}

impl Equivalence for MappingAware<'_> {
    fn equivalent(&self, source: &str, target: &str) -> bool {
        let Some(norms) = self.mapping.norm_forms(target) else {
            return false;
        };
        norms.iter().any(|norm| {
            norm == source
                || self
                    .mapping
                    .dialect_forms(norm)
                    .is_some_and(|forms| forms.contains(source))
        })
    }
}

/// Fully materialized (n+1)x(m+1) cost table, kept whole for the backtrace.
#[derive(Debug, Clone)]
pub struct EditTable {
    rows: usize,
    cols: usize,
    cells: Vec<usize>,
}

impl EditTable {
    pub fn build<S, T, E>(source: &[S], target: &[T], eq: &E) -> Self
    where
        S: AsRef<str>,
        T: AsRef<str>,
        E: Equivalence + ?Sized,
    {
        let rows = source.len() + 1;
        let cols = target.len() + 1;
        let mut cells = vec![0usize; rows * cols];

        for i in 1..rows {
            cells[i * cols] = i;
        }
        for j in 1..cols {
            cells[j] = j;
        }

        for i in 1..rows {
            let s = source[i - 1].as_ref();
            for j in 1..cols {
                let cost = if eq.equivalent(s, target[j - 1].as_ref()) {
                    0
                } else {
                    1
                };
                let del = cells[(i - 1) * cols + j] + 1;
                let ins = cells[i * cols + j - 1] + 1;
                let sub = cells[(i - 1) * cols + j - 1] + cost;
                cells[i * cols + j] = del.min(ins).min(sub);
            }
        }

        Self { rows, cols, cells }
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> usize {
        self.cells[i * self.cols + j]
    }

    pub fn source_len(&self) -> usize {
        self.rows - 1
    }

    pub fn target_len(&self) -> usize {
        self.cols - 1
    }

    /// Minimum edit cost between the full sequences.
    pub fn distance(&self) -> usize {
        self.get(self.rows - 1, self.cols - 1)
    }

    /// Walk back from the bottom-right cell and return the operations left to right.
    ///
    /// Ties prefer the diagonal, then left (insert), then up (delete). A diagonal step is `Equal`
    /// when it costs nothing and `Substitute` otherwise. Changing this order keeps the total cost
    /// but changes the ins/del/sub split.
    pub fn backtrace(&self) -> Vec<EditOp> {
        let mut i = self.source_len();
        let mut j = self.target_len();
        let mut steps = Vec::with_capacity(i + j);

        while i > 0 && j > 0 {
            let here = self.get(i, j);
            let diag = self.get(i - 1, j - 1);
            let left = self.get(i, j - 1);
            let up = self.get(i - 1, j);
            let cheapest = diag.min(left).min(up);

            if cheapest == diag {
                steps.push(if diag == here {
                    EditOp::Equal
                } else {
                    EditOp::Substitute
                });
                i -= 1;
                j -= 1;
            } else if cheapest == left {
                steps.push(EditOp::Insert);
                j -= 1;
            } else {
                steps.push(EditOp::Delete);
                i -= 1;
            }
        }

        steps.extend(std::iter::repeat(EditOp::Delete).take(i));
        steps.extend(std::iter::repeat(EditOp::Insert).take(j));
        steps.reverse();
        steps
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alignment {
    pub ops: Vec<EditOp>,
    pub distance: usize,
}

impl Alignment {
    pub fn errors(&self) -> usize {
        self.ops.iter().filter(|op| op.is_error()).count()
    }

    /// Compact code string, e.g. `EEIE`.
    pub fn code_string(&self) -> String {
        self.ops.iter().map(EditOp::as_char).collect()
    }
}

/// Align `source` against `target` under `eq`.
pub fn align<S, T, E>(source: &[S], target: &[T], eq: &E) -> Alignment
where
    S: AsRef<str>,
    T: AsRef<str>,
    E: Equivalence + ?Sized,
{
    let table = EditTable::build(source, target, eq);
    Alignment {
        ops: table.backtrace(),
        distance: table.distance(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use EditOp::*;

    fn exact(source: &[&str], target: &[&str]) -> Alignment {
        align(source, target, &Exact)
    }

    fn count(ops: &[EditOp], which: EditOp) -> usize {
        ops.iter().filter(|op| **op == which).count()
    }

    /// Tiny deterministic generator so the property checks stay reproducible.
    struct Lcg(u64);

    impl Lcg {
        fn next(&mut self) -> u64 {
            self.0 = self
                .0
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            self.0 >> 33
        }

        fn sequence(&mut self) -> Vec<&'static str> {
            const VOCAB: [&str; 4] = ["a", "b", "c", "d"];
            let len = (self.next() % 7) as usize;
            (0..len)
                .map(|_| VOCAB[(self.next() % VOCAB.len() as u64) as usize])
                .collect()
        }
    }

    #[test]
    fn test_identical_sequences() {
        let a = exact(&["a", "b", "c"], &["a", "b", "c"]);
        assert_eq!(a.ops, vec![Equal, Equal, Equal]);
        assert_eq!(a.distance, 0);
    }

    #[test]
    fn test_single_insertion() {
        let a = exact(&["a", "b"], &["a", "x", "b"]);
        assert_eq!(a.distance, 1);
        assert_eq!(a.ops, vec![Equal, Insert, Equal]);
    }

    #[test]
    fn test_single_deletion() {
        let a = exact(&["a", "x", "b"], &["a", "b"]);
        assert_eq!(a.distance, 1);
        assert_eq!(a.ops, vec![Equal, Delete, Equal]);
    }

    #[test]
    fn test_empty_sides() {
        let a = exact(&[], &["a", "b"]);
        assert_eq!(a.ops, vec![Insert, Insert]);
        let a = exact(&["a", "b"], &[]);
        assert_eq!(a.ops, vec![Delete, Delete]);
        let a = exact(&[], &[]);
        assert!(a.ops.is_empty());
        assert_eq!(a.distance, 0);
    }

    #[test]
    fn test_tie_break_prefers_substitution() {
        // "a b" -> "x y": two substitutions, never a del/ins pair.
        let a = exact(&["a", "b"], &["x", "y"]);
        assert_eq!(a.ops, vec![Substitute, Substitute]);
        // Leftover target token is an insertion at the front.
        let a = exact(&["a"], &["x", "y"]);
        assert_eq!(a.ops, vec![Insert, Substitute]);
        let a = exact(&["a", "b"], &["x"]);
        assert_eq!(a.ops, vec![Delete, Substitute]);
    }

    #[test]
    fn test_tie_break_equal_only_when_diagonal_is_cheapest() {
        // At the last cell the diagonal equals the current cost but the left cell is cheaper.
        let a = exact(&["b"], &["b", "c"]);
        assert_eq!(a.ops, vec![Equal, Insert]);
        assert_eq!(a.code_string(), "EI");
    }

    #[test]
    fn test_tie_break_full_sequence() {
        let a = exact(&["a", "b", "c", "d"], &["b", "x", "d", "e"]);
        assert_eq!(a.distance, 3);
        assert_eq!(a.ops, vec![Delete, Equal, Substitute, Equal, Insert]);
    }

    #[test]
    fn test_mapping_scenario() {
        let mapping = NormMapping::from_entries([("haben", vec!["hän", "häi"])]);
        let flex = MappingAware::new(&mapping);

        let a = align(&["haben"], &["hän"], &flex);
        assert_eq!(a.ops, vec![Equal]);
        assert_eq!(a.distance, 0);

        let a = align(&["haben"], &["hän"], &Exact);
        assert_eq!(a.ops, vec![Substitute]);
        assert_eq!(a.distance, 1);

        // Two dialectal spellings of the same normalized form.
        let a = align(&["häi"], &["hän"], &flex);
        assert_eq!(a.ops, vec![Equal]);
    }

    #[test]
    fn test_mapping_unknown_target_never_matches() {
        let mapping = NormMapping::from_entries([("haben", vec!["hän"])]);
        let flex = MappingAware::new(&mapping);
        assert!(!flex.equivalent("und", "und"));
        assert!(!flex.equivalent("hän", "haben"));
        assert!(flex.equivalent("haben", "hän"));
    }

    #[test]
    fn test_mapping_multiple_norm_forms() {
        let mapping = NormMapping::from_entries([
            ("haben", vec!["hän"]),
            ("hatten", vec!["hän", "händ"]),
        ]);
        let flex = MappingAware::new(&mapping);
        assert!(flex.equivalent("händ", "hän"));
        // "händ" only reaches "hatten", whose forms include "hän".
        assert!(flex.equivalent("hän", "händ"));
        let a = align(&["mir", "händ"], &["mir", "hän"], &flex);
        // "mir" is not in the mapping, so it cannot match even though it is identical.
        assert_eq!(a.ops, vec![Substitute, Equal]);
    }

    #[test]
    fn test_self_alignment_all_equal() {
        let mut rng = Lcg(7);
        for _ in 0..50 {
            let s = rng.sequence();
            let a = exact(&s, &s);
            assert_eq!(a.distance, 0);
            assert!(a.ops.iter().all(|op| *op == Equal));
            assert_eq!(a.ops.len(), s.len());
        }
    }

    #[test]
    fn test_exact_distance_is_symmetric() {
        let mut rng = Lcg(11);
        for _ in 0..200 {
            let s = rng.sequence();
            let t = rng.sequence();
            assert_eq!(exact(&s, &t).distance, exact(&t, &s).distance);
        }
    }

    #[test]
    fn test_triangle_bound() {
        let mut rng = Lcg(13);
        for _ in 0..200 {
            let s = rng.sequence();
            let t = rng.sequence();
            let u = rng.sequence();
            assert!(exact(&s, &t).distance <= exact(&s, &u).distance + exact(&u, &t).distance);
        }
    }

    #[test]
    fn test_operation_count_identities() {
        let mut rng = Lcg(17);
        for _ in 0..200 {
            let s = rng.sequence();
            let t = rng.sequence();
            let a = exact(&s, &t);
            let (n, m) = (s.len() as i64, t.len() as i64);
            let d = (count(&a.ops, Equal) + count(&a.ops, Substitute)) as i64;
            let ins = count(&a.ops, Insert) as i64;
            let del = count(&a.ops, Delete) as i64;
            assert_eq!(ins, m - d);
            assert_eq!(del, n - d);
            assert_eq!(ins - del, m - n);
            assert_eq!(a.errors(), a.distance);
        }
    }
}
