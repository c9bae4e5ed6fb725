//! Engine settings loaded from TOML
//!
//! Every section is optional; missing fields take their defaults.
//!
//! ```toml
//! visualizer = "gravity"
//!
//! [colors]
//! dominant = "#ff2d95"
//! accent = "#00e5ff"
//!
//! [analyzer]
//! bar_count = 64
//!
//! [visualizers.gravity]
//! particleCount = 8000
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::warn;

use crate::analysis::{AnalyzerConfig, DEFAULT_BAR_COUNT};
use crate::audio::SpectrumConfig;
use crate::color::{self, ColorScheme, DEFAULT_ACCENT, DEFAULT_DOMINANT};
use crate::logging::LogConfig;
use crate::visualizer::VisualizerConfig;
use crate::visualizers::GRAVITY_ID;
use crate::Result;

/// Color scheme as hex strings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorSettings {
    /// Dominant color (`#rrggbb`)
    pub dominant: String,
    /// Accent color (`#rrggbb`)
    pub accent: String,
}

impl Default for ColorSettings {
    fn default() -> Self {
        Self {
            dominant: DEFAULT_DOMINANT.to_string(),
            accent: DEFAULT_ACCENT.to_string(),
        }
    }
}

/// Audio analysis settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerSettings {
    /// Bars per frame
    pub bar_count: usize,
    /// FFT front-end
    #[serde(flatten)]
    pub spectrum: SpectrumConfig,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            bar_count: DEFAULT_BAR_COUNT,
            spectrum: SpectrumConfig::default(),
        }
    }
}

impl AnalyzerSettings {
    /// Analyzer configuration for the frequency analyzer
    pub fn analyzer_config(&self) -> AnalyzerConfig {
        self.spectrum.analyzer_config(self.bar_count)
    }
}

/// Headless host settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostSettings {
    /// Frames per second
    pub fps: u32,
    /// Total run time (s)
    pub duration_secs: f64,
    /// Time on each visualizer before cycling to the next (s), 0 = never
    pub cycle_secs: f64,
    /// Viewport width
    pub width: u32,
    /// Viewport height
    pub height: u32,
}

impl Default for HostSettings {
    fn default() -> Self {
        Self {
            fps: 60,
            duration_secs: 12.0,
            cycle_secs: 4.0,
            width: 1280,
            height: 720,
        }
    }
}

/// Top-level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Visualizer selected at startup
    pub visualizer: String,
    /// Color scheme
    pub colors: ColorSettings,
    /// Audio analysis
    pub analyzer: AnalyzerSettings,
    /// Per-visualizer parameter overrides, keyed by type id
    pub visualizers: BTreeMap<String, VisualizerConfig>,
    /// Logging
    pub log: LogConfig,
    /// Headless host
    pub host: HostSettings,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            visualizer: GRAVITY_ID.to_string(),
            colors: ColorSettings::default(),
            analyzer: AnalyzerSettings::default(),
            visualizers: BTreeMap::new(),
            log: LogConfig::default(),
            host: HostSettings::default(),
        }
    }
}

impl EngineSettings {
    /// Load settings from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse settings from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Serialize to TOML text
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Write settings to a TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    /// Parsed color scheme. Invalid colors fall back to the defaults.
    pub fn color_scheme(&self) -> ColorScheme {
        let defaults = ColorScheme::default();
        let parse = |hex: &str, fallback| {
            color::parse_hex(hex).unwrap_or_else(|e| {
                warn!("{}, using default", e);
                fallback
            })
        };
        ColorScheme::new(
            parse(&self.colors.dominant, defaults.dominant),
            parse(&self.colors.accent, defaults.accent),
        )
    }

    /// Parameter overrides for a visualizer type (empty when none)
    pub fn visualizer_config(&self, id: &str) -> VisualizerConfig {
        self.visualizers.get(id).cloned().unwrap_or_default()
    }
}
