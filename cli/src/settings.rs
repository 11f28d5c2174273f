use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use clap::ValueEnum;
use minegym_core::EnvConfig;

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum Preset {
    Beginner,
    Intermediate,
    Expert,
}

impl Preset {
    pub fn config(self) -> EnvConfig {
        match self {
            Self::Beginner => EnvConfig::beginner(),
            Self::Intermediate => EnvConfig::intermediate(),
            Self::Expert => EnvConfig::expert(),
        }
    }
}

/// Command line values that take priority over the config file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Overrides {
    pub preset: Option<Preset>,
    pub rows: Option<u8>,
    pub cols: Option<u8>,
    pub mines: Option<u16>,
    pub seed: Option<u64>,
}

pub fn parse_config(source: &str) -> Result<EnvConfig> {
    toml::from_str(source).context("Invalid environment config")
}

pub fn load_config(path: &Path) -> Result<EnvConfig> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Could not read config file {}", path.display()))?;
    parse_config(&source).with_context(|| format!("Could not load {}", path.display()))
}

/// Layers `overrides` on top of `base` (or the preset, or the defaults), making sure the result has a seed.
pub fn resolve(base: Option<EnvConfig>, overrides: &Overrides) -> Result<EnvConfig> {
    let mut config = match (overrides.preset, base) {
        (Some(preset), base) => EnvConfig {
            rewards: base.map(|base| base.rewards).unwrap_or_default(),
            seed: base.and_then(|base| base.seed),
            ..preset.config()
        },
        (None, Some(base)) => base,
        (None, None) => EnvConfig::default(),
    };

    if let Some(rows) = overrides.rows {
        config.size.0 = rows;
    }
    if let Some(cols) = overrides.cols {
        config.size.1 = cols;
    }
    if let Some(mines) = overrides.mines {
        config.mines = mines;
    }
    config.seed = overrides.seed.or(config.seed).or_else(|| Some(clock_seed()));

    config.validate()?;
    Ok(config)
}

fn clock_seed() -> u64 {
    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or_default();
    log::debug!("No seed given, using {seed} from the clock");
    seed
}
