//! Score every hypothesis of a decoding grid (LM weight x word insertion penalty) and keep the best.
//!
//! Expected decode directory layout:
//!
//! ```text
//! <decode_dir>/scoring_kaldi/test_filt.txt          reference
//! <decode_dir>/scoring_kaldi/penalty_<wip>/<lmwt>.txt  one hypothesis per grid point
//! ```
//!
//! One report file is written per grid point (`flex_<lmwt>_<wip>`, or `ourwer_<lmwt>_<wip>`
//! without a mapping) and the winner goes to `scoring_kaldi/best_flexwer` (or `best_ourwer`).

use crate::corpus::{CorpusScorer, ScoreOptions};
use crate::mapping::NormMapping;
use crate::report::{Report, ReportParser};
use crate::select::{find_best_report, write_best_report, BestReport};
use crate::{io_error, FlexwerError, Result};
use std::path::PathBuf;
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct SweepPlan {
    pub decode_dir: PathBuf,
    /// Reference path relative to `decode_dir`.
    pub reference: PathBuf,
    pub word_insertion_penalties: Vec<f64>,
    pub min_lmwt: u32,
    pub max_lmwt: u32,
}

#[derive(Debug, Clone)]
pub struct SweepOutcome {
    /// `(report file, report)` for every scored grid point, in scoring order.
    pub reports: Vec<(PathBuf, Report)>,
    pub best: BestReport,
    pub best_file: PathBuf,
}

impl SweepPlan {
    fn labels(mapped: bool) -> (&'static str, &'static str, &'static str) {
        if mapped {
            ("flex_", "FLEXWER", "best_flexwer")
        } else {
            ("ourwer_", "OURWER", "best_ourwer")
        }
    }

    pub fn reference_path(&self) -> PathBuf {
        self.decode_dir.join(&self.reference)
    }

    pub fn penalty_dir(&self, wip: f64) -> PathBuf {
        self.decode_dir
            .join("scoring_kaldi")
            .join(format!("penalty_{}", format_penalty(wip)))
    }

    /// Hypothesis files for one penalty, sorted by file name.
    ///
    /// Takes `*.txt` except `*chars.txt`. A file whose stem is an integer LM weight outside
    /// `[min_lmwt, max_lmwt]` is skipped; other stems are kept.
    pub fn hypotheses(&self, wip: f64) -> Result<Vec<PathBuf>> {
        let dir = self.penalty_dir(wip);
        if !dir.is_dir() {
            return Err(FlexwerError::FileNotFound { path: dir });
        }
        let mut out = Vec::new();
        for entry in WalkDir::new(&dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(dir.as_path()).to_path_buf();
                io_error(&path, e.into())
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if !name.ends_with(".txt") || name.ends_with("chars.txt") {
                continue;
            }
            let stem = name.trim_end_matches(".txt");
            if let Ok(lmwt) = stem.parse::<u32>() {
                if lmwt < self.min_lmwt || lmwt > self.max_lmwt {
                    log::debug!("skipping {}: lmwt outside grid", entry.path().display());
                    continue;
                }
            }
            out.push(entry.path().to_path_buf());
        }
        Ok(out)
    }

    /// Score the whole grid, write one report per point, then select and write the best.
    pub fn run(
        &self,
        mapping: Option<&NormMapping>,
        options: ScoreOptions,
        parser: &ReportParser,
    ) -> Result<SweepOutcome> {
        let (prefix, tag, best_name) = Self::labels(mapping.is_some());
        let reference = self.reference_path();
        let scorer = CorpusScorer::new(mapping, options);

        let mut reports = Vec::new();
        for &wip in &self.word_insertion_penalties {
            let hypotheses = self.hypotheses(wip)?;
            log::info!(
                "penalty {}: {} hypothesis files",
                format_penalty(wip),
                hypotheses.len()
            );
            for hyp in hypotheses {
                let stem = hyp
                    .file_stem()
                    .map(|s| s.to_string_lossy().to_string())
                    .unwrap_or_default();
                let report = scorer
                    .score_files(&reference, &hyp)?
                    .report(hyp.display().to_string())?;
                let out = self
                    .decode_dir
                    .join(format!("{prefix}{stem}_{}", format_penalty(wip)));
                std::fs::write(&out, format!("{report}\n")).map_err(|e| io_error(&out, e))?;
                log::info!("{report}");
                reports.push((out, report));
            }
        }

        let best = find_best_report(&self.decode_dir, prefix, parser)?;
        let best_file = self.decode_dir.join("scoring_kaldi").join(best_name);
        write_best_report(&best, tag, &best_file)?;

        Ok(SweepOutcome {
            reports,
            best,
            best_file,
        })
    }
}

/// Penalty as it appears in decode directory names: `0.0`, `0.5`, `1.0`.
pub fn format_penalty(wip: f64) -> String {
    if wip.fract() == 0.0 && wip.is_finite() {
        format!("{wip:.1}")
    } else {
        format!("{wip}")
    }
}
