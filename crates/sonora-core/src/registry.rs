//! Visualizer Registry - type id to factory, display name and defaults

use once_cell::sync::Lazy;
use tracing::{debug, warn};

use crate::color::ColorScheme;
use crate::visualizer::{Visualizer, VisualizerConfig};
use crate::visualizers::{
    GravityField, RippleField, SpectrumBars, BARS_ID, GRAVITY_ID, RIPPLE_ID,
};
use crate::{CoreError, Result};

/// Builds a visualizer from a merged config and a color scheme
pub type VisualizerFactory = fn(VisualizerConfig, ColorScheme) -> Box<dyn Visualizer>;

/// Registered visualizer type
#[derive(Debug, Clone)]
pub struct VisualizerDescriptor {
    /// Type id
    pub id: String,
    /// Display name
    pub name: String,
    /// Constructor
    pub factory: VisualizerFactory,
    /// Parameters used when the caller does not set them
    pub default_config: VisualizerConfig,
}

/// Ordered table of visualizer types
#[derive(Debug, Clone, Default)]
pub struct VisualizerRegistry {
    descriptors: Vec<VisualizerDescriptor>,
}

static GLOBAL: Lazy<VisualizerRegistry> = Lazy::new(VisualizerRegistry::builtin);

/// The process-wide registry of built-in visualizers
pub fn global() -> &'static VisualizerRegistry {
    &GLOBAL
}

impl VisualizerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in visualizer
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(
            GRAVITY_ID,
            "Gravitational Particle Field",
            |config, colors| Box::new(GravityField::new(config, colors)),
            GravityField::default_config(),
        );
        registry.register(
            RIPPLE_ID,
            "Ripple Field",
            |config, colors| Box::new(RippleField::new(config, colors)),
            RippleField::default_config(),
        );
        registry.register(
            BARS_ID,
            "Spectrum Bars",
            |config, colors| Box::new(SpectrumBars::new(config, colors)),
            SpectrumBars::default_config(),
        );
        registry
    }

    /// Register a type. Re-registering an id replaces the previous entry.
    pub fn register(
        &mut self,
        id: &str,
        name: &str,
        factory: VisualizerFactory,
        default_config: VisualizerConfig,
    ) {
        let descriptor = VisualizerDescriptor {
            id: id.to_string(),
            name: name.to_string(),
            factory,
            default_config,
        };

        match self.descriptors.iter_mut().find(|d| d.id == id) {
            Some(existing) => {
                warn!("Visualizer '{}' registered twice, replacing", id);
                *existing = descriptor;
            }
            None => {
                debug!("Registered visualizer '{}' ({})", id, name);
                self.descriptors.push(descriptor);
            }
        }
    }

    /// Instantiate a type with `config` layered over its defaults.
    ///
    /// Unknown ids are logged and yield `None`.
    pub fn create(
        &self,
        id: &str,
        config: &VisualizerConfig,
        colors: ColorScheme,
    ) -> Option<Box<dyn Visualizer>> {
        match self.try_create(id, config, colors) {
            Ok(visualizer) => Some(visualizer),
            Err(e) => {
                warn!("{}", e);
                None
            }
        }
    }

    /// Like `create`, but reports unknown ids as an error
    pub fn try_create(
        &self,
        id: &str,
        config: &VisualizerConfig,
        colors: ColorScheme,
    ) -> Result<Box<dyn Visualizer>> {
        let descriptor = self
            .get(id)
            .ok_or_else(|| CoreError::UnknownVisualizer(id.to_string()))?;

        let mut merged = descriptor.default_config.clone();
        merged.merge(config);
        Ok((descriptor.factory)(merged, colors))
    }

    /// Descriptor for an id
    pub fn get(&self, id: &str) -> Option<&VisualizerDescriptor> {
        self.descriptors.iter().find(|d| d.id == id)
    }

    /// Whether an id is registered
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Registered ids in registration order
    pub fn types(&self) -> Vec<&str> {
        self.descriptors.iter().map(|d| d.id.as_str()).collect()
    }

    /// Display name for an id
    pub fn name(&self, id: &str) -> Option<&str> {
        self.get(id).map(|d| d.name.as_str())
    }

    /// Default parameters for an id
    pub fn default_config(&self, id: &str) -> Option<&VisualizerConfig> {
        self.get(id).map(|d| &d.default_config)
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}
