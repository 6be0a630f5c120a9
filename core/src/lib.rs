//! FLEXWER scoring core
//!
//! Word error rate between a reference and a hypothesis transcript corpus, optionally treating
//! spelling variants listed in a normalization mapping as the same word.

use std::path::{Path, PathBuf};

pub mod align;
pub use align::{align, Alignment, EditOp, EditTable, Equivalence, Exact, MappingAware};

pub mod mapping;
pub use mapping::NormMapping;

pub mod normalize;
pub use normalize::{normalize_line, tokenize_words, utterance_id};

pub mod corpus;
pub use corpus::{
    CorpusScorer, CorpusStats, PairDetail, PairingMode, ScoreOptions, ScoredCorpus,
};

pub mod pretty;
pub use pretty::render_alignment;

pub mod report;
pub use report::{Report, ReportParser, FLEXWER_TAG};

pub mod select;
pub use select::{find_best_report, write_best_report, BestReport};

pub mod sweep;
pub use sweep::{SweepOutcome, SweepPlan};

#[derive(thiserror::Error, Debug)]
pub enum FlexwerError {
    #[error("file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed mapping: {0}")]
    MalformedMapping(String),

    #[error("line count mismatch: reference has {reference} lines, hypothesis has {hypothesis}")]
    LineCountMismatch { reference: usize, hypothesis: usize },

    #[error("utterance id '{id}' missing from {side}")]
    MissingId { id: String, side: &'static str },

    #[error("duplicate utterance id '{id}' in {side}")]
    DuplicateId { id: String, side: &'static str },

    #[error("nothing to score: corpus has no aligned positions")]
    EmptyCorpus,

    #[error("malformed report line: {0}")]
    MalformedReport(String),

    #[error("no report files starting with '{prefix}' in {}", dir.display())]
    NoReports { dir: PathBuf, prefix: String },

    #[error("failed to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, FlexwerError>;

/// Read a UTF-8 file, reporting a missing file distinctly from other I/O failures.
pub(crate) fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| io_error(path, source))
}

pub(crate) fn io_error(path: &Path, source: std::io::Error) -> FlexwerError {
    if source.kind() == std::io::ErrorKind::NotFound {
        FlexwerError::FileNotFound {
            path: path.to_path_buf(),
        }
    } else {
        FlexwerError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
