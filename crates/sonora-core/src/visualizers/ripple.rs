//! Ripple Field
//!
//! Every bar that crosses its threshold drops an expanding ring into the
//! scene. Bass bands spawn large, slow, infrequent ripples; treble bands
//! spawn small fast ones more often. Rings hold their opacity for the
//! first 60% of their travel and fade out over the rest. When the music
//! stops, spawning halts and the remaining rings fade over two seconds.

use glam::Vec2;
use palette::Srgb;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, trace, warn};

use super::layout::{band_position, Layout, LayoutMode, LAYOUT_LABELS};
use crate::analysis::FrequencyAnalysis;
use crate::color::{from_hsl, lerp_color, rgba, ColorScheme};
use crate::surface::{BufferId, Primitive, Surface, Vertex};
use crate::visualizer::{
    defaults_from, resolve_controls, ControlSpec, Visualizer, VisualizerConfig, VisualizerControl,
};

/// Registry id
pub const RIPPLE_ID: &str = "ripple";

/// Threshold increase from the lowest to the highest band
const THRESHOLD_SPAN: f32 = 60.0;
/// Spawn interval of the lowest band (ms)
const BASS_INTERVAL_MS: f32 = 400.0;
/// Spawn interval of the highest band (ms)
const TREBLE_INTERVAL_MS: f32 = 80.0;
const BASS_MAX_RADIUS: f32 = 8.0;
const TREBLE_MAX_RADIUS: f32 = 1.5;
const BASS_SPEED: f32 = 1.5;
const TREBLE_SPEED: f32 = 4.0;
/// Progress at which a ripple starts fading
const FADE_START: f32 = 0.6;
/// Blended energy below which the field counts as silent
const SILENCE_ENERGY: f32 = 0.02;
/// Wall-clock fade after silence starts (s)
const SILENCE_FADE_SECS: f64 = 2.0;
/// Hue of the highest band (degrees); the lowest is 0
const HUE_SWEEP: f32 = 240.0;
/// Half height of the visible area in world units
const VIEW_HALF_HEIGHT: f32 = 5.0;

fn control_specs() -> [ControlSpec; 5] {
    [
        ControlSpec::choice("Layout", "layoutMode", LAYOUT_LABELS, 0.0),
        ControlSpec::slider("Threshold", "baseThreshold", 60.0, 240.0, 5.0, 140.0),
        ControlSpec::slider("Max Ripples", "maxRipples", 10.0, 400.0, 10.0, 120.0),
        ControlSpec::slider("Size", "sizeScale", 0.25, 3.0, 0.05, 1.0),
        ControlSpec::slider("Color Influence", "colorInfluence", 0.0, 1.0, 0.05, 0.3),
    ]
}

/// Resolved numeric parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RippleParams {
    /// Placement strategy
    pub layout_mode: LayoutMode,
    /// Spawn threshold of the lowest band (0-255)
    pub base_threshold: f32,
    /// Live ripple cap
    pub max_ripples: usize,
    /// Multiplier on every ripple's maximum radius
    pub size_scale: f32,
    /// Blend from the hue sweep toward the scheme gradient
    pub color_influence: f32,
}

impl RippleParams {
    /// Resolve parameters, falling back to defaults for missing or invalid keys
    pub fn from_config(config: &VisualizerConfig) -> Self {
        let specs = control_specs();
        let value = |key: &str| {
            let default = specs.iter().find(|c| c.key == key).map_or(0.0, |c| c.default);
            config.value_or(key, default)
        };

        let layout_value = value("layoutMode");
        let layout_mode = LayoutMode::from_value(layout_value).unwrap_or_else(|| {
            warn!("Unknown ripple layout mode {}, using random", layout_value);
            LayoutMode::Random
        });

        Self {
            layout_mode,
            base_threshold: value("baseThreshold").clamp(0.0, 255.0),
            max_ripples: value("maxRipples").round().max(0.0) as usize,
            size_scale: value("sizeScale").max(0.0),
            color_influence: value("colorInfluence").clamp(0.0, 1.0),
        }
    }

    /// Spawn threshold for a band (strictly exceeded to spawn)
    pub fn threshold(&self, band: usize, band_count: usize) -> f32 {
        (self.base_threshold + band_position(band, band_count) * THRESHOLD_SPAN).min(255.0)
    }

    /// Minimum time between spawns of a band (ms)
    pub fn interval_ms(&self, band: usize, band_count: usize) -> f32 {
        let t = band_position(band, band_count).powf(self.layout_mode.interval_bias());
        lerp(BASS_INTERVAL_MS, TREBLE_INTERVAL_MS, t)
    }

    /// Maximum radius of a ripple spawned by a band
    pub fn max_radius(&self, band: usize, band_count: usize) -> f32 {
        lerp(BASS_MAX_RADIUS, TREBLE_MAX_RADIUS, band_position(band, band_count)) * self.size_scale
    }

    /// Expansion speed of a ripple spawned by a band (units/s)
    pub fn speed(&self, band: usize, band_count: usize) -> f32 {
        lerp(BASS_SPEED, TREBLE_SPEED, band_position(band, band_count))
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// An expanding ring
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ripple {
    /// Center
    pub position: Vec2,
    /// Spawn time (s)
    pub spawn_time: f64,
    /// Peak opacity (bar / 255)
    pub amplitude: f32,
    /// Radius at which the ripple is gone
    pub max_radius: f32,
    /// Expansion speed (units/s)
    pub speed: f32,
    /// Band that spawned it
    pub band: usize,
    /// Ring color
    pub color: Srgb,
}

impl Ripple {
    /// Radius at `now`
    pub fn radius(&self, now: f64) -> f32 {
        (now - self.spawn_time).max(0.0) as f32 * self.speed
    }

    /// Fraction of the way to `max_radius`
    pub fn progress(&self, now: f64) -> f32 {
        if self.max_radius <= 0.0 {
            return 1.0;
        }
        self.radius(now) / self.max_radius
    }

    /// Opacity at `now`: flat until 60% progress, then linear to zero
    pub fn opacity(&self, now: f64) -> f32 {
        let progress = self.progress(now);
        if progress < FADE_START {
            self.amplitude
        } else {
            (self.amplitude * (1.0 - (progress - FADE_START) / (1.0 - FADE_START))).max(0.0)
        }
    }
}

/// Ripple field visualizer
pub struct RippleField {
    config: VisualizerConfig,
    params: RippleParams,
    colors: ColorScheme,
    rng: StdRng,
    layout: Layout,

    ripples: Vec<Ripple>,
    last_spawn: Vec<f64>,
    half_extent: Vec2,
    buffer: Option<BufferId>,
    initialized: bool,

    playing: bool,
    now: f64,
    silence_since: Option<f64>,
    spawned_total: u64,
    dropped_total: u64,
}

impl RippleField {
    /// Create an unseeded field
    pub fn new(config: VisualizerConfig, colors: ColorScheme) -> Self {
        Self::with_rng(config, colors, StdRng::from_os_rng())
    }

    /// Create a field with a fixed random seed
    pub fn with_seed(config: VisualizerConfig, colors: ColorScheme, seed: u64) -> Self {
        Self::with_rng(config, colors, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: VisualizerConfig, colors: ColorScheme, mut rng: StdRng) -> Self {
        let mut merged = Self::default_config();
        merged.merge(&config);
        let params = RippleParams::from_config(&merged);
        Self {
            layout: Layout::new(params.layout_mode, &mut rng),
            params,
            config: merged,
            colors,
            rng,
            ripples: Vec::new(),
            last_spawn: Vec::new(),
            half_extent: Vec2::splat(VIEW_HALF_HEIGHT),
            buffer: None,
            initialized: false,
            playing: true,
            now: 0.0,
            silence_since: None,
            spawned_total: 0,
            dropped_total: 0,
        }
    }

    /// Default parameter set
    pub fn default_config() -> VisualizerConfig {
        defaults_from(&control_specs())
    }

    /// Resolved parameters
    pub fn params(&self) -> &RippleParams {
        &self.params
    }

    /// Live ripples
    pub fn ripples(&self) -> &[Ripple] {
        &self.ripples
    }

    /// Number of live ripples
    pub fn active_ripples(&self) -> usize {
        self.ripples.len()
    }

    /// Active layout mode
    pub fn layout_mode(&self) -> LayoutMode {
        self.layout.mode()
    }

    /// Ripples spawned since creation
    pub fn spawned_total(&self) -> u64 {
        self.spawned_total
    }

    /// Spawns dropped because the cap was reached
    pub fn dropped_total(&self) -> u64 {
        self.dropped_total
    }

    /// Half width/height of the area ripples are placed in
    pub fn half_extent(&self) -> Vec2 {
        self.half_extent
    }

    /// Whether spawning is currently halted
    pub fn is_silent(&self) -> bool {
        self.silence_since.is_some()
    }

    /// Global opacity multiplier from the silence fade
    pub fn fade_factor(&self) -> f32 {
        match self.silence_since {
            Some(since) => (1.0 - (self.now - since) / SILENCE_FADE_SECS).clamp(0.0, 1.0) as f32,
            None => 1.0,
        }
    }

    /// Spawn a ripple for `band` unless the cap is reached. Returns whether it spawned.
    pub fn spawn_ripple(
        &mut self,
        band: usize,
        band_count: usize,
        amplitude: f32,
        now: f64,
    ) -> bool {
        if self.ripples.len() >= self.params.max_ripples {
            self.dropped_total += 1;
            return false;
        }

        let amplitude = amplitude.clamp(0.0, 1.0);
        let t = band_position(band, band_count);
        let hue_color = from_hsl(t * HUE_SWEEP, 0.7 + amplitude * 0.3, 0.45 + amplitude * 0.15);
        let color = lerp_color(hue_color, self.colors.gradient(t), self.params.color_influence);

        let position = self
            .layout
            .position(band, band_count, self.half_extent, &mut self.rng);

        self.ripples.push(Ripple {
            position,
            spawn_time: now,
            amplitude,
            max_radius: self.params.max_radius(band, band_count),
            speed: self.params.speed(band, band_count),
            band,
            color,
        });
        self.spawned_total += 1;
        true
    }
}

impl Visualizer for RippleField {
    fn init(&mut self, surface: &mut Surface) {
        if self.initialized {
            return;
        }
        self.half_extent = Vec2::new(VIEW_HALF_HEIGHT * surface.aspect(), VIEW_HALF_HEIGHT);
        self.buffer = Some(surface.allocate(
            "ripple.rings",
            Primitive::Rings,
            self.params.max_ripples,
        ));
        self.initialized = true;
        debug!("RippleField initialized ({:?} layout)", self.layout.mode());
    }

    fn update(&mut self, analysis: &FrequencyAnalysis) {
        if !self.initialized {
            return;
        }

        let now = analysis.timestamp;
        self.now = now;
        self.ripples.retain(|ripple| ripple.progress(now) < 1.0);

        let energy = analysis.bass_avg * 0.5 + analysis.mid_avg * 0.3 + analysis.high_avg * 0.2;
        if !analysis.is_playing || !self.playing || energy < SILENCE_ENERGY {
            if self.silence_since.is_none() {
                trace!("RippleField: silence at {:.2}s", now);
                self.silence_since = Some(now);
            }
            return;
        }
        if self.silence_since.is_some() {
            // Survivors keep the fade they reached; only new rings start at full opacity
            let fade = self.fade_factor();
            for ripple in &mut self.ripples {
                ripple.amplitude *= fade;
            }
            self.silence_since = None;
        }

        let band_count = analysis.bars.len();
        if self.last_spawn.len() != band_count {
            self.last_spawn.resize(band_count, f64::NEG_INFINITY);
        }

        for (band, &value) in analysis.bars.iter().enumerate() {
            if value <= self.params.threshold(band, band_count) {
                continue;
            }
            let since_ms = (now - self.last_spawn[band]) * 1000.0;
            if since_ms <= self.params.interval_ms(band, band_count) as f64 {
                continue;
            }
            // Dropped spawns leave the band free to try again next frame
            if self.spawn_ripple(band, band_count, value / 255.0, now) {
                self.last_spawn[band] = now;
            }
        }
    }

    fn render(&self, surface: &mut Surface) {
        let Some(buffer) = self.buffer else {
            return;
        };

        let fade = self.fade_factor();
        let vertices: Vec<Vertex> = self
            .ripples
            .iter()
            .map(|ripple| {
                Vertex::new(
                    ripple.position.extend(0.0).to_array(),
                    ripple.radius(self.now),
                    rgba(ripple.color, ripple.opacity(self.now) * fade),
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
        if self.initialized {
            debug!(
                "RippleField destroyed ({} spawned, {} dropped)",
                self.spawned_total, self.dropped_total
            );
        }
        self.ripples.clear();
        self.last_spawn.clear();
        self.silence_since = None;
        self.initialized = false;
    }

    fn controls(&self) -> Vec<VisualizerControl> {
        resolve_controls(&control_specs(), &self.config)
    }

    fn name(&self) -> &str {
        "Ripple Field"
    }

    fn config_mut(&mut self) -> &mut VisualizerConfig {
        &mut self.config
    }

    fn update_config(&mut self, key: &str, value: f32) {
        self.config.set(key, value);
        self.params = RippleParams::from_config(&self.config);

        if key == "layoutMode" {
            self.layout.activate(self.params.layout_mode, &mut self.rng);
            debug!("RippleField layout -> {:?}", self.params.layout_mode);
        }
    }

    fn update_colors(&mut self, colors: ColorScheme) {
        self.colors = colors;
    }

    fn set_playback_state(&mut self, is_playing: bool) {
        self.playing = is_playing;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field() -> RippleField {
        RippleField::with_seed(VisualizerConfig::new(), ColorScheme::default(), 11)
    }

    fn loud(t: f64, bars: usize) -> FrequencyAnalysis {
        FrequencyAnalysis {
            bars: vec![255.0; bars],
            bass_avg: 1.0,
            mid_avg: 1.0,
            high_avg: 1.0,
            is_playing: true,
            ..Default::default()
        }
        .with_timestamp(t)
    }

    #[test]
    fn test_band_curves() {
        let params = RippleParams::from_config(&RippleField::default_config());
        assert_eq!(params.threshold(0, 64), 140.0);
        assert_eq!(params.threshold(63, 64), 200.0);
        assert_eq!(params.interval_ms(0, 64), 400.0);
        assert_eq!(params.interval_ms(63, 64), 80.0);
        assert_eq!(params.max_radius(0, 64), 8.0);
        assert_eq!(params.speed(0, 64), 1.5);
        assert!(params.max_radius(63, 64) < params.max_radius(0, 64));
        assert!(params.speed(63, 64) > params.speed(0, 64));
    }

    #[test]
    fn test_layout_bias_shapes_interval() {
        let config = RippleField::default_config().with("layoutMode", 3.0);
        let spiral = RippleParams::from_config(&config);
        let random = RippleParams::from_config(&RippleField::default_config());
        // Spiral keeps mid bands closer to the bass interval
        assert!(spiral.interval_ms(32, 64) > random.interval_ms(32, 64));
    }

    #[test]
    fn test_threshold_is_strict() {
        let mut surface = Surface::default();
        let mut ripple = field();
        ripple.init(&mut surface);

        let mut analysis = loud(0.0, 2);
        analysis.bars = vec![140.0, 0.0];
        ripple.update(&analysis);
        assert_eq!(ripple.active_ripples(), 0);

        analysis.bars = vec![141.0, 0.0];
        ripple.update(&analysis.with_timestamp(0.01));
        assert_eq!(ripple.active_ripples(), 1);
    }

    #[test]
    fn test_interval_gates_band() {
        let mut surface = Surface::default();
        let mut ripple = field();
        ripple.init(&mut surface);

        ripple.update(&loud(0.0, 64));
        ripple.update(&loud(0.2, 64));
        let bass = ripple.ripples().iter().filter(|r| r.band == 0).count();
        let treble = ripple.ripples().iter().filter(|r| r.band == 63).count();
        assert_eq!(bass, 1);
        assert_eq!(treble, 2);
    }

    #[test]
    fn test_cap_drops_spawns() {
        let mut surface = Surface::default();
        let config = VisualizerConfig::new().with("maxRipples", 10.0);
        let mut ripple = RippleField::with_seed(config, ColorScheme::default(), 5);
        ripple.init(&mut surface);

        ripple.update(&loud(0.0, 64));
        assert_eq!(ripple.active_ripples(), 10);
        assert_eq!(ripple.dropped_total(), 54);
    }

    #[test]
    fn test_lifecycle() {
        let mut surface = Surface::default();
        let mut ripple = field();
        ripple.init(&mut surface);
        assert!(ripple.spawn_ripple(0, 64, 1.0, 0.0));

        let r = ripple.ripples()[0];
        assert_eq!(r.max_radius, 8.0);
        assert_eq!(r.speed, 1.5);
        assert_eq!(r.opacity(1.0), 1.0);
        assert!(r.opacity(4.5) < 1.0);

        let mut quiet = FrequencyAnalysis::silent(64);
        ripple.update(&quiet.clone().with_timestamp(5.0));
        assert_eq!(ripple.active_ripples(), 1);

        quiet.timestamp = 5.34;
        ripple.update(&quiet);
        assert_eq!(ripple.active_ripples(), 0);
    }

    #[test]
    fn test_silence_halts_and_fades() {
        let mut surface = Surface::default();
        let mut ripple = field();
        ripple.init(&mut surface);

        ripple.update(&loud(0.0, 64));
        let spawned = ripple.spawned_total();
        assert!(spawned > 0);

        let mut stopped = loud(1.0, 64);
        stopped.is_playing = false;
        ripple.update(&stopped);
        assert!(ripple.is_silent());
        assert_eq!(ripple.spawned_total(), spawned);
        assert_eq!(ripple.fade_factor(), 1.0);

        ripple.update(&stopped.clone().with_timestamp(2.0));
        assert!((ripple.fade_factor() - 0.5).abs() < 1e-6);
        ripple.update(&stopped.with_timestamp(3.5));
        assert_eq!(ripple.fade_factor(), 0.0);

        ripple.update(&loud(4.0, 64));
        assert!(!ripple.is_silent());
        assert!(ripple.spawned_total() > spawned);
    }

    #[test]
    fn test_resume_keeps_faded_ripples_dim() {
        let mut surface = Surface::default();
        let mut ripple = field();
        ripple.init(&mut surface);
        assert!(ripple.spawn_ripple(0, 64, 0.8, 0.0));

        let quiet = FrequencyAnalysis::silent(64);
        ripple.update(&quiet.clone().with_timestamp(0.1));
        ripple.update(&quiet.with_timestamp(2.0));
        assert!((ripple.fade_factor() - 0.05).abs() < 1e-4);

        // Energy returns without any bar crossing its threshold
        let mut resumed = loud(2.05, 64);
        resumed.bars = vec![0.0; 64];
        ripple.update(&resumed);

        assert!(!ripple.is_silent());
        assert_eq!(ripple.fade_factor(), 1.0);
        assert_eq!(ripple.active_ripples(), 1);
        let visible = ripple.ripples()[0].opacity(2.05) * ripple.fade_factor();
        // Fade at resume is 1 - 1.95 / 2
        assert!((visible - 0.8 * 0.025).abs() < 1e-4, "opacity jumped to {}", visible);

        assert!(ripple.spawn_ripple(0, 64, 0.8, 2.05));
        assert_eq!(ripple.ripples()[1].opacity(2.05), 0.8);
    }

    #[test]
    fn test_playback_state_stops_spawning() {
        let mut surface = Surface::default();
        let mut ripple = field();
        ripple.init(&mut surface);
        ripple.set_playback_state(false);
        ripple.update(&loud(0.0, 64));
        assert_eq!(ripple.active_ripples(), 0);
        assert!(ripple.is_silent());
    }

    #[test]
    fn test_render_rings() {
        let mut surface = Surface::new(1600, 800);
        let mut ripple = field();
        ripple.init(&mut surface);
        assert_eq!(ripple.half_extent(), Vec2::new(10.0, 5.0));

        ripple.update(&loud(0.0, 16));
        ripple.render(&mut surface);
        assert_eq!(surface.draw_calls().len(), 1);
        assert_eq!(surface.draw_calls()[0].primitive, Primitive::Rings);
        assert_eq!(surface.draw_calls()[0].count, ripple.active_ripples());
    }

    #[test]
    fn test_unknown_layout_falls_back() {
        let mut ripple = field();
        ripple.update_config("layoutMode", 2.0);
        assert_eq!(ripple.layout_mode(), LayoutMode::Grid);
        ripple.update_config("layoutMode", 9.0);
        assert_eq!(ripple.layout_mode(), LayoutMode::Random);
    }

    #[test]
    fn test_hue_sweep() {
        let config = VisualizerConfig::new().with("colorInfluence", 0.0);
        let mut ripple = RippleField::with_seed(config, ColorScheme::default(), 1);
        ripple.spawn_ripple(0, 64, 1.0, 0.0);
        ripple.spawn_ripple(63, 64, 1.0, 0.0);
        let low = ripple.ripples()[0].color;
        let high = ripple.ripples()[1].color;
        // Red-ish bass, blue-ish treble
        assert!(low.red > low.blue);
        assert!(high.blue > high.red);
    }
}
