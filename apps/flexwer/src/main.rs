mod score;
mod sweep;

use clap::{Args, Parser, Subcommand, ValueEnum};
use flexwer_core::PairingMode;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Join {
    /// Sort both files and pair lines by position (historical behaviour).
    Sorted,
    /// Pair lines by utterance id; missing or duplicate ids are fatal.
    ById,
}

impl From<Join> for PairingMode {
    fn from(join: Join) -> Self {
        match join {
            Join::Sorted => PairingMode::Sorted,
            Join::ById => PairingMode::ById,
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub(crate) struct Cli {
    /// Config file (default: configs/flexwer.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Score one hypothesis file against a reference and print the report line.
    Score(ScoreArgs),
    /// Score every hypothesis of a decode directory's LM weight x penalty grid and pick the best.
    Sweep(SweepArgs),
    /// Pick the best of already written report files in a directory.
    Select(SelectArgs),
}

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// File containing reference transcriptions.
    #[arg(long = "ref")]
    reference: PathBuf,

    /// File containing system output hypotheses.
    #[arg(long = "hyp")]
    hypothesis: PathBuf,

    /// Normalized-to-dialectal mapping (JSON). Enables flexible matching.
    #[arg(short = 'm', long = "n2d-mapping")]
    mapping: Option<PathBuf>,

    /// Print line by line results.
    #[arg(long)]
    verbose: bool,

    /// Print each pair's alignment (implies line by line output).
    #[arg(long)]
    pretty: bool,

    #[arg(long, value_enum)]
    join: Option<Join>,

    /// Worker threads for alignment.
    #[arg(long)]
    jobs: Option<usize>,
}

#[derive(Args, Debug)]
pub(crate) struct SweepArgs {
    /// Decode directory (contains scoring_kaldi/).
    #[arg(long)]
    dir: PathBuf,

    /// Word insertion penalty range.
    #[arg(long, num_args = 1..)]
    wip: Option<Vec<f64>>,

    /// Language model weights min.
    #[arg(long)]
    min_lmwt: Option<u32>,

    /// Language model weights max.
    #[arg(long)]
    max_lmwt: Option<u32>,

    /// Normalized-to-dialectal mapping (JSON). Enables flexible matching.
    #[arg(short = 'm', long = "n2d-mapping")]
    mapping: Option<PathBuf>,

    #[arg(long, value_enum)]
    join: Option<Join>,

    #[arg(long)]
    jobs: Option<usize>,

    /// Also write a JSON summary of every grid point and the winner.
    #[arg(long)]
    summary: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct SelectArgs {
    /// Directory holding report files.
    #[arg(long)]
    dir: PathBuf,

    /// Only files whose names start with this prefix are considered.
    #[arg(long, default_value = "flex_")]
    prefix: String,

    /// Tag written on the best line.
    #[arg(long, default_value = flexwer_core::FLEXWER_TAG)]
    tag: String,

    /// Output file (default: <dir>/scoring_kaldi/best_<tag in lowercase>).
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();
    let started = Instant::now();
    let cli = Cli::parse();
    let settings = flexwer_config::load_settings(cli.config.as_deref())?;

    match cli.command {
        Command::Score(args) => score::run(&args, &settings)?,
        Command::Sweep(args) => {
            sweep::run_sweep(&args, &settings)?;
            log::info!("Done in {:.2?}", started.elapsed());
        }
        Command::Select(args) => sweep::run_select(&args)?,
    }
    Ok(())
}
