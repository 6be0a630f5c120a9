use crate::align::{align, Alignment, EditOp, Exact, MappingAware};
use crate::mapping::NormMapping;
use crate::normalize::{normalize_line, tokenize_words, utterance_id};
use crate::report::{Report, FLEXWER_TAG};
use crate::{read_text, FlexwerError, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::ops::{Add, AddAssign};
use std::path::Path;

/// Operation counts over any number of aligned utterance pairs.
///
/// Addition is commutative, so per-pair or per-worker counts can be reduced in any order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusStats {
    pub equal: usize,
    pub insertions: usize,
    pub deletions: usize,
    pub substitutions: usize,
    /// Sum of alignment lengths, equal and inserted positions included.
    pub total_positions: usize,
    pub pairs: usize,
}

impl CorpusStats {
    /// Counts for a single aligned pair.
    pub fn from_ops(ops: &[EditOp]) -> Self {
        let mut stats = Self {
            pairs: 1,
            total_positions: ops.len(),
            ..Self::default()
        };
        for op in ops {
            match op {
                EditOp::Equal => stats.equal += 1,
                EditOp::Insert => stats.insertions += 1,
                EditOp::Delete => stats.deletions += 1,
                EditOp::Substitute => stats.substitutions += 1,
            }
        }
        stats
    }

    pub fn errors(&self) -> usize {
        self.insertions + self.deletions + self.substitutions
    }

    /// Error percentage, or `None` when nothing was aligned.
    pub fn error_rate(&self) -> Option<f64> {
        if self.total_positions == 0 {
            return None;
        }
        Some(self.errors() as f64 / self.total_positions as f64 * 100.0)
    }
}

impl Add for CorpusStats {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            equal: self.equal + rhs.equal,
            insertions: self.insertions + rhs.insertions,
            deletions: self.deletions + rhs.deletions,
            substitutions: self.substitutions + rhs.substitutions,
            total_positions: self.total_positions + rhs.total_positions,
            pairs: self.pairs + rhs.pairs,
        }
    }
}

impl AddAssign for CorpusStats {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl std::iter::Sum for CorpusStats {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

/// How reference and hypothesis lines are matched up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairingMode {
    /// Sort both files lexicographically and pair by position. Historical behaviour: files that
    /// do not sort consistently are silently mis-paired.
    #[default]
    Sorted,
    /// Join on the leading utterance id; any missing or duplicate id is fatal.
    ById,
}

#[derive(Debug, Clone, Copy)]
pub struct ScoreOptions {
    pub pairing: PairingMode,
    /// Worker threads for alignment; 0 and 1 both mean sequential.
    pub jobs: usize,
    /// Keep every pair's tokens and operations for diagnostics.
    pub keep_details: bool,
}

impl Default for ScoreOptions {
    fn default() -> Self {
        Self {
            pairing: PairingMode::Sorted,
            jobs: 1,
            keep_details: false,
        }
    }
}

/// One aligned utterance pair, kept only when diagnostics are requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairDetail {
    pub reference: String,
    pub hypothesis: String,
    pub ops: Vec<EditOp>,
}

impl PairDetail {
    /// `<ref> || <hyp> || <rate>%`
    pub fn diagnostic_line(&self) -> String {
        let stats = CorpusStats::from_ops(&self.ops);
        format!(
            "{} || {} || {:.2}%",
            self.reference,
            self.hypothesis,
            stats.error_rate().unwrap_or(0.0)
        )
    }

    pub fn reference_tokens(&self) -> Vec<&str> {
        tokenize_words(&self.reference)
    }

    pub fn hypothesis_tokens(&self) -> Vec<&str> {
        tokenize_words(&self.hypothesis)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScoredCorpus {
    pub stats: CorpusStats,
    pub details: Vec<PairDetail>,
}

impl ScoredCorpus {
    pub fn report(&self, hypothesis_path: impl Into<String>) -> Result<Report> {
        Report::from_stats(FLEXWER_TAG, &self.stats, hypothesis_path)
    }
}

/// Scores a hypothesis corpus against a reference corpus.
///
/// Reference tokens are the alignment source and hypothesis tokens the target, so an extra
/// hypothesis word is an insertion. With a mapping, hypothesis tokens are looked up as
/// dialectal forms.
pub struct CorpusScorer<'a> {
    mapping: Option<&'a NormMapping>,
    options: ScoreOptions,
}

impl<'a> CorpusScorer<'a> {
    pub fn new(mapping: Option<&'a NormMapping>, options: ScoreOptions) -> Self {
        Self { mapping, options }
    }

    /// Align one pair of already-normalized transcripts.
    pub fn align_transcripts(&self, reference: &str, hypothesis: &str) -> Alignment {
        let source = tokenize_words(reference);
        let target = tokenize_words(hypothesis);
        match self.mapping {
            Some(mapping) => align(&source, &target, &MappingAware::new(mapping)),
            None => align(&source, &target, &Exact),
        }
    }

    /// Read both corpus files and score them.
    pub fn score_files(&self, reference: &Path, hypothesis: &Path) -> Result<ScoredCorpus> {
        let ref_lines = read_lines(reference)?;
        let hyp_lines = read_lines(hypothesis)?;
        log::debug!(
            "read {} reference lines from {}, {} hypothesis lines from {}",
            ref_lines.len(),
            reference.display(),
            hyp_lines.len(),
            hypothesis.display()
        );
        self.score_lines(ref_lines, hyp_lines)
    }

    /// Pair raw lines according to the pairing mode and score every pair.
    pub fn score_lines(
        &self,
        references: Vec<String>,
        hypotheses: Vec<String>,
    ) -> Result<ScoredCorpus> {
        let pairs = match self.options.pairing {
            PairingMode::Sorted => pair_sorted(references, hypotheses)?,
            PairingMode::ById => pair_by_id(references, hypotheses)?,
        };
        self.score_pairs(&pairs)
    }

    /// Score raw `(reference, hypothesis)` line pairs, on a pool of `jobs` workers when `jobs > 1`.
    ///
    /// Pairs are scored independently and collected in input order, so the result does not
    /// depend on the worker count.
    pub fn score_pairs(&self, pairs: &[(String, String)]) -> Result<ScoredCorpus> {
        let jobs = self.options.jobs.max(1).min(pairs.len().max(1));
        let scored: Vec<(CorpusStats, Option<PairDetail>)> = if jobs == 1 {
            pairs.iter().map(|pair| self.score_pair(pair)).collect()
        } else {
            log::debug!("scoring {} pairs on {} workers", pairs.len(), jobs);
            let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;
            pool.install(|| pairs.par_iter().map(|pair| self.score_pair(pair)).collect())
        };

        let mut out = ScoredCorpus::default();
        for (stats, detail) in scored {
            out.stats += stats;
            out.details.extend(detail);
        }
        Ok(out)
    }

    fn score_pair(
        &self,
        (raw_ref, raw_hyp): &(String, String),
    ) -> (CorpusStats, Option<PairDetail>) {
        let reference = normalize_line(raw_ref);
        let hypothesis = normalize_line(raw_hyp);
        let alignment = self.align_transcripts(&reference, &hypothesis);
        let stats = CorpusStats::from_ops(&alignment.ops);
        let detail = self.options.keep_details.then(|| PairDetail {
            reference,
            hypothesis,
            ops: alignment.ops,
        });
        (stats, detail)
    }
}

/// Read a corpus file as raw lines, each keeping its line terminator.
pub fn read_lines(path: &Path) -> Result<Vec<String>> {
    let text = read_text(path)?;
    Ok(text.split_inclusive('\n').map(str::to_string).collect())
}

/// Sort both sides independently and pair by position.
pub fn pair_sorted(
    mut references: Vec<String>,
    mut hypotheses: Vec<String>,
) -> Result<Vec<(String, String)>> {
    if references.len() != hypotheses.len() {
        return Err(FlexwerError::LineCountMismatch {
            reference: references.len(),
            hypothesis: hypotheses.len(),
        });
    }
    references.sort();
    hypotheses.sort();
    Ok(references.into_iter().zip(hypotheses).collect())
}

/// Join on utterance id. Blank lines are ignored; pairs come out in reference-id order.
pub fn pair_by_id(
    references: Vec<String>,
    hypotheses: Vec<String>,
) -> Result<Vec<(String, String)>> {
    let mut refs: BTreeMap<String, String> = BTreeMap::new();
    for line in references {
        let Some(id) = utterance_id(&line).map(str::to_string) else {
            continue;
        };
        if refs.contains_key(&id) {
            return Err(FlexwerError::DuplicateId {
                id,
                side: "reference",
            });
        }
        refs.insert(id, line);
    }

    let mut hyps: HashMap<String, String> = HashMap::new();
    for line in hypotheses {
        let Some(id) = utterance_id(&line).map(str::to_string) else {
            continue;
        };
        if hyps.contains_key(&id) {
            return Err(FlexwerError::DuplicateId {
                id,
                side: "hypothesis",
            });
        }
        if !refs.contains_key(&id) {
            return Err(FlexwerError::MissingId {
                id,
                side: "reference",
            });
        }
        hyps.insert(id, line);
    }

    refs.into_iter()
        .map(|(id, reference)| match hyps.remove(&id) {
            Some(hypothesis) => Ok((reference, hypothesis)),
            None => Err(FlexwerError::MissingId {
                id,
                side: "hypothesis",
            }),
        })
        .collect()
}
