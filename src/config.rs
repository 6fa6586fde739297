use crate::cli::Cli;
use anyhow::{bail, Context, Result};
use emostroop_experiment::ExperimentConfig;
use emostroop_trigger::TriggerConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub fullscreen: bool,
    /// Window size when not fullscreen.
    pub window_size: (u32, u32),
    pub font: Option<PathBuf>,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            fullscreen: true,
            window_size: (1280, 720),
            font: Some(PathBuf::from("media/Arial_Rounded_MT_Bold.ttf")),
        }
    }
}

/// Everything the binary reads from disk. Missing keys keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub experiment: ExperimentConfig,
    pub trigger: TriggerConfig,
    pub display: DisplayConfig,
    pub assets_dir: PathBuf,
    pub data_dir: PathBuf,
    /// Fixed seed for image selection and ITIs; drawn from the OS when unset.
    pub seed: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            experiment: ExperimentConfig::default(),
            trigger: TriggerConfig::default(),
            display: DisplayConfig::default(),
            assets_dir: PathBuf::from("media/images"),
            data_dir: PathBuf::from("data"),
            seed: None,
        }
    }
}

impl AppConfig {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Command-line flags override the file.
    pub fn apply(&mut self, cli: &Cli) {
        if let Some(assets) = &cli.assets {
            self.assets_dir = assets.clone();
        }
        if let Some(data) = &cli.data {
            self.data_dir = data.clone();
        }
        if let Some(font) = &cli.font {
            self.display.font = Some(font.clone());
        }
        if cli.windowed {
            self.display.fullscreen = false;
        }
        if cli.debug {
            self.experiment.debug = true;
        }
        if cli.seed.is_some() {
            self.seed = cli.seed;
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.experiment.validate()?;
        let (w, h) = self.display.window_size;
        if w == 0 || h == 0 {
            bail!("display.window_size must be non-zero, got {w}x{h}");
        }
        Ok(())
    }
}
