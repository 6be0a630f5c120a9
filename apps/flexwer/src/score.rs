use crate::ScoreArgs;
use anyhow::Context;
use flexwer_config::FlexwerSettings;
use flexwer_core::{render_alignment, CorpusScorer, NormMapping, ScoreOptions};
use std::io::Write;

pub(crate) fn options(
    join: Option<crate::Join>,
    jobs: Option<usize>,
    keep_details: bool,
    settings: &FlexwerSettings,
) -> ScoreOptions {
    ScoreOptions {
        pairing: join.map(Into::into).unwrap_or(settings.score.pairing),
        jobs: jobs.unwrap_or(settings.score.jobs).max(1),
        keep_details,
    }
}

pub(crate) fn run(args: &ScoreArgs, settings: &FlexwerSettings) -> anyhow::Result<()> {
    let mapping = args
        .mapping
        .as_deref()
        .map(NormMapping::load)
        .transpose()
        .context("Failed to load mapping")?;

    let options = options(args.join, args.jobs, args.verbose || args.pretty, settings);
    log::debug!(
        "scoring {} against {} (pairing={:?} jobs={} mapping={})",
        args.hypothesis.display(),
        args.reference.display(),
        options.pairing,
        options.jobs,
        mapping.is_some()
    );

    let scorer = CorpusScorer::new(mapping.as_ref(), options);
    let scored = scorer
        .score_files(&args.reference, &args.hypothesis)
        .with_context(|| format!("Failed to score {}", args.hypothesis.display()))?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for detail in &scored.details {
        writeln!(out, "{}", detail.diagnostic_line())?;
        if args.pretty {
            writeln!(
                out,
                "{}",
                render_alignment(
                    &detail.reference_tokens(),
                    &detail.hypothesis_tokens(),
                    &detail.ops
                )
            )?;
        }
    }

    let report = scored.report(args.hypothesis.display().to_string())?;
    writeln!(out, "{report}")?;
    Ok(())
}
