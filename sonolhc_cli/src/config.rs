//! Layered run configuration.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sonolhc_core::SonifyConfig;
use sonolhc_render::{PngConfig, SynthConfig};
use std::path::Path;

/// Everything a run can be tuned with. Any subset may be given in JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Matching gates, energy scale and entity spacing
    pub sonify: SonifyConfig,

    /// Tone synthesizer settings
    pub synth: SynthConfig,

    /// Figure size
    pub png: PngConfig,
}

impl AppConfig {
    /// Loads a JSON config file. Missing fields keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Invalid config {}", path.display()))
    }
}
