//! Visualizer contract
//!
//! Every visual style implements [`Visualizer`]. The manager drives an instance
//! through `init` -> (`update` -> `render`)* -> `destroy`; the UI reads
//! `controls()` to build sliders and writes back through `update_config`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::analysis::FrequencyAnalysis;
use crate::color::ColorScheme;
use crate::surface::Surface;

/// Numeric parameters keyed by name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VisualizerConfig(BTreeMap<String, f32>);

impl VisualizerConfig {
    /// Empty config
    pub fn new() -> Self {
        Self::default()
    }

    /// Value for `key`, if set
    pub fn get(&self, key: &str) -> Option<f32> {
        self.0.get(key).copied()
    }

    /// Value for `key`, or `default` when missing or not finite
    pub fn value_or(&self, key: &str, default: f32) -> f32 {
        self.get(key).filter(|v| v.is_finite()).unwrap_or(default)
    }

    /// Set a value
    pub fn set(&mut self, key: impl Into<String>, value: f32) {
        self.0.insert(key.into(), value);
    }

    /// Builder-style `set`
    pub fn with(mut self, key: impl Into<String>, value: f32) -> Self {
        self.set(key, value);
        self
    }

    /// Copy every entry of `other` over this config
    pub fn merge(&mut self, other: &VisualizerConfig) {
        for (key, value) in &other.0 {
            self.0.insert(key.clone(), *value);
        }
    }

    /// Whether `key` is set
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the config has no entries
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl<K: Into<String>> FromIterator<(K, f32)> for VisualizerConfig {
    fn from_iter<I: IntoIterator<Item = (K, f32)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Static description of a tunable parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlSpec {
    /// Display name
    pub name: &'static str,
    /// Config key
    pub key: &'static str,
    /// Minimum value
    pub min: f32,
    /// Maximum value
    pub max: f32,
    /// Slider step
    pub step: f32,
    /// Default value
    pub default: f32,
    /// Labels for enumerated controls (index = value)
    pub labels: Option<&'static [&'static str]>,
}

impl ControlSpec {
    /// A plain slider control
    pub const fn slider(
        name: &'static str,
        key: &'static str,
        min: f32,
        max: f32,
        step: f32,
        default: f32,
    ) -> Self {
        Self {
            name,
            key,
            min,
            max,
            step,
            default,
            labels: None,
        }
    }

    /// An enumerated control with one label per integer value
    pub fn choice(
        name: &'static str,
        key: &'static str,
        labels: &'static [&'static str],
        default: f32,
    ) -> Self {
        Self {
            name,
            key,
            min: 0.0,
            max: labels.len().saturating_sub(1) as f32,
            step: 1.0,
            default,
            labels: Some(labels),
        }
    }

    /// Describe the control with its value taken from `config`
    pub fn resolve(&self, config: &VisualizerConfig) -> VisualizerControl {
        VisualizerControl {
            name: self.name.to_string(),
            key: self.key.to_string(),
            min: self.min,
            max: self.max,
            step: self.step,
            default: self.default,
            value: config.value_or(self.key, self.default),
            labels: self
                .labels
                .map(|labels| labels.iter().map(|l| l.to_string()).collect()),
        }
    }
}

/// Default config built from a control table
pub fn defaults_from(specs: &[ControlSpec]) -> VisualizerConfig {
    specs.iter().map(|spec| (spec.key, spec.default)).collect()
}

/// Describe every control in a table against `config`
pub fn resolve_controls(
    specs: &[ControlSpec],
    config: &VisualizerConfig,
) -> Vec<VisualizerControl> {
    specs.iter().map(|spec| spec.resolve(config)).collect()
}

/// Control descriptor handed to the UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualizerControl {
    /// Display name
    pub name: String,
    /// Config key
    pub key: String,
    /// Minimum value
    pub min: f32,
    /// Maximum value
    pub max: f32,
    /// Slider step
    pub step: f32,
    /// Default value
    pub default: f32,
    /// Current value
    pub value: f32,
    /// Labels for enumerated controls
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
}

/// Contract implemented by every visual style
pub trait Visualizer: Send {
    /// Allocate surface resources. Called once before the first frame.
    fn init(&mut self, surface: &mut Surface);

    /// Advance the simulation by one frame without painting
    fn update(&mut self, analysis: &FrequencyAnalysis);

    /// Paint the current state without mutating the simulation
    fn render(&self, surface: &mut Surface);

    /// Release surface resources. Safe to call repeatedly or before `init`.
    fn destroy(&mut self, surface: &mut Surface);

    /// Tunable parameters with their current values
    fn controls(&self) -> Vec<VisualizerControl>;

    /// Display name
    fn name(&self) -> &str;

    /// Mutable access to the parameter store
    fn config_mut(&mut self) -> &mut VisualizerConfig;

    /// Store a parameter value. Structural keys rebuild state synchronously.
    fn update_config(&mut self, key: &str, value: f32) {
        self.config_mut().set(key, value);
    }

    /// Replace the color scheme
    fn update_colors(&mut self, colors: ColorScheme);

    /// Playback started or stopped
    fn set_playback_state(&mut self, _is_playing: bool) {}
}
