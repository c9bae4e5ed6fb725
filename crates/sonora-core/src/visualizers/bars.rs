//! Spectrum Bars - one bar per analyzer bar, eased toward the live level

use tracing::debug;

use crate::analysis::FrequencyAnalysis;
use crate::color::{rgba, ColorScheme};
use crate::surface::{BufferId, Primitive, Surface, Vertex};
use crate::visualizer::{
    defaults_from, resolve_controls, ControlSpec, Visualizer, VisualizerConfig, VisualizerControl,
};

/// Registry id
pub const BARS_ID: &str = "bars";

const CONTROLS: &[ControlSpec] = &[
    ControlSpec::slider("Smoothing", "smoothing", 0.05, 1.0, 0.05, 0.35),
    ControlSpec::slider("Height", "heightScale", 0.1, 3.0, 0.1, 1.0),
    ControlSpec::slider("Width", "barWidth", 0.2, 1.0, 0.05, 0.8),
];

/// Total width of the bar row in world units
const ROW_WIDTH: f32 = 10.0;

/// Classic bar spectrum visualizer
pub struct SpectrumBars {
    config: VisualizerConfig,
    colors: ColorScheme,
    heights: Vec<f32>,
    buffer: Option<BufferId>,
    initialized: bool,
}

impl SpectrumBars {
    /// Create a bar visualizer
    pub fn new(config: VisualizerConfig, colors: ColorScheme) -> Self {
        let mut merged = Self::default_config();
        merged.merge(&config);
        Self {
            config: merged,
            colors,
            heights: Vec::new(),
            buffer: None,
            initialized: false,
        }
    }

    /// Default parameter set
    pub fn default_config() -> VisualizerConfig {
        defaults_from(CONTROLS)
    }

    /// Current eased bar heights (0-255 scale)
    pub fn heights(&self) -> &[f32] {
        &self.heights
    }
}

impl Visualizer for SpectrumBars {
    fn init(&mut self, surface: &mut Surface) {
        if self.initialized {
            return;
        }
        self.buffer = Some(surface.allocate("bars.levels", Primitive::Bars, 64));
        self.initialized = true;
        debug!("SpectrumBars initialized");
    }

    fn update(&mut self, analysis: &FrequencyAnalysis) {
        if !self.initialized {
            return;
        }
        let smoothing = self.config.value_or("smoothing", 0.35).clamp(0.0, 1.0);

        if self.heights.len() != analysis.bars.len() {
            self.heights.resize(analysis.bars.len(), 0.0);
        }
        for (height, &target) in self.heights.iter_mut().zip(&analysis.bars) {
            *height += (target - *height) * smoothing;
        }
    }

    fn render(&self, surface: &mut Surface) {
        let Some(buffer) = self.buffer else {
            return;
        };

        let count = self.heights.len();
        let slot = ROW_WIDTH / count.max(1) as f32;
        let scale = self.config.value_or("heightScale", 1.0);
        let width = self.config.value_or("barWidth", 0.8);

        let vertices: Vec<Vertex> = self
            .heights
            .iter()
            .enumerate()
            .map(|(i, &h)| {
                let t = if count > 1 { i as f32 / (count - 1) as f32 } else { 0.0 };
                let x = -ROW_WIDTH / 2.0 + (i as f32 + 0.5) * slot;
                Vertex::new(
                    [x, 0.0, slot * width],
                    h / 255.0 * scale,
                    rgba(self.colors.gradient(t), 1.0),
                )
            })
            .collect();

        surface.write(buffer, &vertices);
        surface.draw(buffer, vertices.len());
    }

    fn destroy(&mut self, surface: &mut Surface) {
        if let Some(buffer) = self.buffer.take() {
            surface.release(buffer);
        }
        self.heights.clear();
        self.initialized = false;
    }

    fn controls(&self) -> Vec<VisualizerControl> {
        resolve_controls(CONTROLS, &self.config)
    }

    fn name(&self) -> &str {
        "Spectrum Bars"
    }

    fn config_mut(&mut self) -> &mut VisualizerConfig {
        &mut self.config
    }

    fn update_colors(&mut self, colors: ColorScheme) {
        self.colors = colors;
    }
}
