//! Sonora Core - Audio-reactive visualization pipeline
//!
//! This crate contains the visualization engine embedded in the player:
//! - Frequency analysis (raw spectrum -> bars and band averages)
//! - Visualizer contract and the registry of built-in styles
//! - Visualizer manager driving the single per-frame loop
//! - Gravitational particle field and ripple field simulations
//! - Engine settings and logging configuration

#![warn(missing_docs)]

pub use glam::{Vec2, Vec3};
use thiserror::Error;

pub mod analysis;
pub mod audio;
pub mod color;
pub mod logging;
pub mod manager;
pub mod registry;
pub mod scheduler;
pub mod settings;
pub mod surface;
pub mod visualizer;
pub mod visualizers;

// --- Re-exports grouped by category ---

// Analysis
pub use analysis::{AnalyzerConfig, FrequencyAnalysis, FrequencyAnalyzer};
pub use audio::{AnalysisSource, ByteSpectrumAnalyzer, SpectrumConfig, SpectrumFeed, SpectrumHandle};

// Visualizer system
pub use color::ColorScheme;
pub use manager::{ManagerState, VisualizerManager};
pub use registry::{VisualizerDescriptor, VisualizerFactory, VisualizerRegistry};
pub use visualizer::{ControlSpec, Visualizer, VisualizerConfig, VisualizerControl};
pub use visualizers::{GravityField, RippleField, SpectrumBars};

// Host seams
pub use scheduler::{FrameHandle, FrameScheduler, ManualScheduler};
pub use surface::{BufferId, DrawCall, Primitive, Surface, Vertex};

// Settings & Logging
pub use logging::LogConfig;
pub use settings::EngineSettings;

/// Core error types
#[derive(Error, Debug)]
pub enum CoreError {
    /// Requested visualizer type is not registered
    #[error("Unknown visualizer type: {0}")]
    UnknownVisualizer(String),

    /// Color string could not be parsed
    #[error("Invalid color '{0}', expected #rrggbb")]
    InvalidColor(String),

    /// A setting value is out of its valid range
    #[error("Invalid setting: {0}")]
    InvalidSetting(String),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings file could not be parsed
    #[error("Settings parse error: {0}")]
    SettingsParse(#[from] toml::de::Error),

    /// Settings could not be serialized
    #[error("Settings serialize error: {0}")]
    SettingsSerialize(#[from] toml::ser::Error),
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
