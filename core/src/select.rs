use crate::report::{Report, ReportParser};
use crate::{io_error, read_text, FlexwerError, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// The lowest-rate report found in a directory, with the file it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct BestReport {
    pub report: Report,
    pub file: PathBuf,
}

impl BestReport {
    /// Line written to a best file: the winning counts, retagged, pointing at the report file.
    pub fn best_line(&self, tag: &str) -> String {
        self.report
            .retagged(tag, self.file.display().to_string())
            .to_string()
    }
}

/// Scan the files directly inside `dir` whose names start with `prefix` and keep the lowest rate.
///
/// Files are visited in file-name order and ties keep the first one. Files that do not hold a
/// report line are skipped with a warning.
pub fn find_best_report(dir: &Path, prefix: &str, parser: &ReportParser) -> Result<BestReport> {
    let mut best: Option<BestReport> = None;

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            io_error(&path, e.into())
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if !name.starts_with(prefix) {
            continue;
        }

        let text = read_text(entry.path())?;
        let report = match parser.parse(&text) {
            Ok(r) => r,
            Err(FlexwerError::MalformedReport(line)) => {
                log::warn!(
                    "skipping {}: not a report ({})",
                    entry.path().display(),
                    line
                );
                continue;
            }
            Err(e) => return Err(e),
        };

        let better = best.as_ref().map_or(true, |b| report.rate < b.report.rate);
        if better {
            best = Some(BestReport {
                report,
                file: entry.path().to_path_buf(),
            });
        }
    }

    best.ok_or_else(|| FlexwerError::NoReports {
        dir: dir.to_path_buf(),
        prefix: prefix.to_string(),
    })
}

/// Write `best` to `out` under `tag`, creating the parent directory if needed.
pub fn write_best_report(best: &BestReport, tag: &str, out: &Path) -> Result<()> {
    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
    }
    std::fs::write(out, format!("{}\n", best.best_line(tag))).map_err(|e| io_error(out, e))?;
    log::info!("best {} -> {}", best.report.rate, out.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_find_best_keeps_minimum() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        fs::write(
            dir.path().join("flex_10_0.0"),
            "%FLEXWER 40.00 [ 4 / 10, 1 ins, 1 del, 2 sub ] p0/10.txt\n",
        )?;
        fs::write(
            dir.path().join("flex_11_0.0"),
            "%FLEXWER 30.00 [ 3 / 10, 1 ins, 1 del, 1 sub ] p0/11.txt\n",
        )?;
        fs::write(
            dir.path().join("flex_12_0.5"),
            "%FLEXWER 30.00 [ 3 / 10, 0 ins, 1 del, 2 sub ] p5/12.txt\n",
        )?;
        fs::write(dir.path().join("flex_notes"), "scratch\n")?;
        fs::write(
            dir.path().join("ourwer_9_0.0"),
            "%FLEXWER 1.00 [ 1 / 100, 0 ins, 0 del, 1 sub ] p0/9.txt\n",
        )?;
        fs::create_dir(dir.path().join("flex_dir"))?;

        let parser = ReportParser::new();
        let best = find_best_report(dir.path(), "flex_", &parser)?;
        assert_eq!(best.file, dir.path().join("flex_11_0.0"));
        assert_eq!(best.report.path, "p0/11.txt");
        assert_eq!(
            best.best_line("FLEXWER"),
            format!(
                "%FLEXWER 30.00 [ 3 / 10, 1 ins, 1 del, 1 sub ] {}",
                dir.path().join("flex_11_0.0").display()
            )
        );
        Ok(())
    }

    #[test]
    fn test_find_best_no_reports() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join("flex_bad"), "garbage\n")?;
        let err = find_best_report(dir.path(), "flex_", &ReportParser::new()).unwrap_err();
        assert!(matches!(err, FlexwerError::NoReports { .. }));
        Ok(())
    }

    #[test]
    fn test_write_best() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        fs::write(
            dir.path().join("ourwer_7_1.0"),
            "%FLEXWER 12.50 [ 1 / 8, 0 ins, 0 del, 1 sub ] p1/7.txt\n",
        )?;
        let best = find_best_report(dir.path(), "ourwer_", &ReportParser::new())?;
        let out = dir.path().join("scoring_kaldi").join("best_ourwer");
        write_best_report(&best, "OURWER", &out)?;
        let written = fs::read_to_string(&out)?;
        assert!(written.starts_with("%OURWER 12.50 [ 1 / 8, 0 ins, 0 del, 1 sub ] "));
        assert!(written.ends_with("ourwer_7_1.0\n"));
        Ok(())
    }
}
