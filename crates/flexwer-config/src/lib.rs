use anyhow::Context;
use flexwer_core::PairingMode;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Paths tried when no `--config` is given, relative to the working directory.
pub const DEFAULT_CONFIG_PATHS: [&str; 2] = ["configs/flexwer.toml", "../../configs/flexwer.toml"];

#[derive(Debug, Clone, PartialEq)]
pub struct SweepSettings {
    pub word_insertion_penalties: Vec<f64>,
    pub min_lmwt: u32,
    pub max_lmwt: u32,
    /// Reference transcripts, relative to the decode directory.
    pub reference: PathBuf,
    pub mapping: Option<PathBuf>,
}

impl Default for SweepSettings {
    fn default() -> Self {
        Self {
            word_insertion_penalties: vec![0.0, 0.5, 1.0],
            min_lmwt: 7,
            max_lmwt: 17,
            reference: PathBuf::from("scoring_kaldi/test_filt.txt"),
            mapping: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreSettings {
    pub pairing: PairingMode,
    pub jobs: usize,
}

impl Default for ScoreSettings {
    fn default() -> Self {
        Self {
            pairing: PairingMode::Sorted,
            jobs: 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlexwerSettings {
    pub sweep: SweepSettings,
    pub score: ScoreSettings,
    /// File the settings were read from, if any.
    pub source: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SweepToml {
    #[serde(default)]
    wip: Option<Vec<f64>>,
    #[serde(default)]
    min_lmwt: Option<u32>,
    #[serde(default)]
    max_lmwt: Option<u32>,
    #[serde(default)]
    reference: Option<PathBuf>,
    #[serde(default)]
    mapping: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ScoreToml {
    #[serde(default)]
    join: Option<PairingMode>,
    #[serde(default = "default_jobs")]
    jobs: usize,
}

fn default_jobs() -> usize {
    1
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RootConfigToml {
    #[serde(default)]
    sweep: Option<SweepToml>,
    #[serde(default)]
    score: Option<ScoreToml>,
}

/// Try the default locations for `flexwer.toml`. `None` when no file exists.
pub fn read_default_config_text() -> Option<(PathBuf, String)> {
    for p in &DEFAULT_CONFIG_PATHS {
        if let Ok(c) = fs::read_to_string(p) {
            return Some((PathBuf::from(p), c));
        }
    }
    None
}

/// Parse settings from TOML text. Keys left out keep their built-in defaults.
pub fn parse_settings(text: &str) -> anyhow::Result<FlexwerSettings> {
    let root: RootConfigToml =
        toml::from_str(text).map_err(|e| anyhow::anyhow!("Failed to parse flexwer config: {e}"))?;

    let mut settings = FlexwerSettings::default();
    if let Some(sweep) = root.sweep {
        let SweepToml {
            wip,
            min_lmwt,
            max_lmwt,
            reference,
            mapping,
        } = sweep;
        if let Some(wip) = wip {
            settings.sweep.word_insertion_penalties = wip;
        }
        if let Some(v) = min_lmwt {
            settings.sweep.min_lmwt = v;
        }
        if let Some(v) = max_lmwt {
            settings.sweep.max_lmwt = v;
        }
        if let Some(reference) = reference {
            settings.sweep.reference = reference;
        }
        settings.sweep.mapping = mapping;
    }
    if let Some(score) = root.score {
        if let Some(join) = score.join {
            settings.score.pairing = join;
        }
        settings.score.jobs = score.jobs.max(1);
    }
    validate_sweep(&settings.sweep)?;
    Ok(settings)
}

pub fn validate_sweep(sweep: &SweepSettings) -> anyhow::Result<()> {
    if sweep.word_insertion_penalties.is_empty() {
        anyhow::bail!("sweep.wip must list at least one word insertion penalty");
    }
    if let Some(bad) = sweep
        .word_insertion_penalties
        .iter()
        .find(|w| !w.is_finite())
    {
        anyhow::bail!("sweep.wip contains a non-finite penalty: {bad}");
    }
    if sweep.min_lmwt > sweep.max_lmwt {
        anyhow::bail!(
            "sweep.min_lmwt ({}) is greater than sweep.max_lmwt ({})",
            sweep.min_lmwt,
            sweep.max_lmwt
        );
    }
    Ok(())
}

/// Paths to data files named in a config file are relative to that file's directory.
/// `sweep.reference` is not: it stays relative to the decode directory of each sweep.
fn resolve_relative_to(settings: &mut FlexwerSettings, config_dir: &Path) {
    if let Some(mapping) = settings.sweep.mapping.as_mut() {
        if mapping.is_relative() {
            *mapping = config_dir.join(&*mapping);
        }
    }
}

/// Load settings from `explicit`, else from the first default path found, else built-in defaults.
pub fn load_settings(explicit: Option<&Path>) -> anyhow::Result<FlexwerSettings> {
    let (path, text) = match explicit {
        Some(p) => {
            let text = fs::read_to_string(p)
                .with_context(|| format!("Failed to read config {}", p.display()))?;
            (p.to_path_buf(), text)
        }
        None => match read_default_config_text() {
            Some(found) => found,
            None => {
                log::debug!("no flexwer.toml found in {:?}; using defaults", DEFAULT_CONFIG_PATHS);
                return Ok(FlexwerSettings::default());
            }
        },
    };
    let mut settings =
        parse_settings(&text).with_context(|| format!("Invalid config {}", path.display()))?;
    log::info!("loaded config {}", path.display());
    if let Some(dir) = path.parent() {
        resolve_relative_to(&mut settings, dir);
    }
    settings.source = Some(path);
    Ok(settings)
}
