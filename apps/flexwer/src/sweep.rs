use crate::{SelectArgs, SweepArgs};
use anyhow::Context;
use flexwer_config::{validate_sweep, FlexwerSettings, SweepSettings};
use flexwer_core::{
    find_best_report, write_best_report, NormMapping, ReportParser, SweepOutcome, SweepPlan,
};
use std::path::Path;

/// CLI flags over config file values over built-in defaults.
fn merge_sweep(args: &SweepArgs, settings: &FlexwerSettings) -> anyhow::Result<SweepSettings> {
    let base = &settings.sweep;
    let merged = SweepSettings {
        word_insertion_penalties: args
            .wip
            .clone()
            .unwrap_or_else(|| base.word_insertion_penalties.clone()),
        min_lmwt: args.min_lmwt.unwrap_or(base.min_lmwt),
        max_lmwt: args.max_lmwt.unwrap_or(base.max_lmwt),
        reference: base.reference.clone(),
        mapping: args.mapping.clone().or_else(|| base.mapping.clone()),
    };
    validate_sweep(&merged)?;
    Ok(merged)
}

pub(crate) fn run_sweep(args: &SweepArgs, settings: &FlexwerSettings) -> anyhow::Result<()> {
    let sweep = merge_sweep(args, settings)?;
    let mapping = sweep
        .mapping
        .as_deref()
        .map(NormMapping::load)
        .transpose()
        .context("Failed to load mapping")?;

    let plan = SweepPlan {
        decode_dir: args.dir.clone(),
        reference: sweep.reference.clone(),
        word_insertion_penalties: sweep.word_insertion_penalties.clone(),
        min_lmwt: sweep.min_lmwt,
        max_lmwt: sweep.max_lmwt,
    };
    log::info!(
        "sweep {}: wip={:?} lmwt={}..={}",
        plan.decode_dir.display(),
        plan.word_insertion_penalties,
        plan.min_lmwt,
        plan.max_lmwt
    );

    let options = crate::score::options(args.join, args.jobs, false, settings);
    let parser = ReportParser::new();
    let outcome = plan
        .run(mapping.as_ref(), options, &parser)
        .with_context(|| format!("Sweep failed in {}", plan.decode_dir.display()))?;

    println!("{}", outcome.best.best_line(best_tag(mapping.is_some())));
    if let Some(path) = &args.summary {
        write_summary(path, &outcome)?;
    }
    Ok(())
}

fn best_tag(mapped: bool) -> &'static str {
    if mapped {
        "FLEXWER"
    } else {
        "OURWER"
    }
}

fn write_summary(path: &Path, outcome: &SweepOutcome) -> anyhow::Result<()> {
    let points: Vec<_> = outcome
        .reports
        .iter()
        .map(|(file, report)| {
            serde_json::json!({
                "file": file.display().to_string(),
                "report": report,
            })
        })
        .collect();
    let data = serde_json::json!({
        "points": points,
        "best": {
            "file": outcome.best.file.display().to_string(),
            "report": &outcome.best.report,
        },
        "best_file": outcome.best_file.display().to_string(),
    });
    std::fs::write(path, serde_json::to_string_pretty(&data)?)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

pub(crate) fn run_select(args: &SelectArgs) -> anyhow::Result<()> {
    let parser = ReportParser::new();
    let best = find_best_report(&args.dir, &args.prefix, &parser)?;
    let out = args.out.clone().unwrap_or_else(|| {
        args.dir
            .join("scoring_kaldi")
            .join(format!("best_{}", args.tag.to_lowercase()))
    });
    write_best_report(&best, &args.tag, &out)?;
    println!("{}", best.best_line(&args.tag));
    Ok(())
}
