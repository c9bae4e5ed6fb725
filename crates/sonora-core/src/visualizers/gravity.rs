//! Gravitational Particle Field
//!
//! A cloud of particles orbiting a handful of audio-driven attractors.
//! Each attractor follows one band (bass, mid, high by index) and grows
//! heavier with it; a spin term swirls particles around the attractor's
//! axis, and beats kick the whole cloud outward. A soft spherical boundary
//! keeps everything on screen.

use glam::{Quat, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::{PI, TAU};
use tracing::debug;

use super::beat::{beat_energy, BeatDetector};
use crate::analysis::FrequencyAnalysis;
use crate::color::{rgba, ColorScheme};
use crate::surface::{BufferId, Primitive, Surface, Vertex};
use crate::visualizer::{
    defaults_from, resolve_controls, ControlSpec, Visualizer, VisualizerConfig, VisualizerControl,
};

/// Registry id
pub const GRAVITY_ID: &str = "gravity";

/// Mass gain per unit of (band * multiplier)
pub const AUDIO_GRAVITY_GAIN: f32 = 8.0;
/// Spin gain per unit of (mid * multiplier)
pub const AUDIO_SPIN_GAIN: f32 = 2.0;

/// Minimum particle-attractor distance used in the force law
const DISTANCE_FLOOR: f32 = 0.1;
/// Attractor orbit speed about the Y axis (rad/s)
const ORBIT_SPEED: f32 = 0.15;
const FIRST_FRAME_DT: f32 = 1.0 / 60.0;
const MAX_DT: f32 = 0.05;
const SPAWN_RADIUS_MIN: f32 = 1.0;
const SPAWN_RADIUS_MAX: f32 = 4.0;
const SPAWN_SPEED: f32 = 0.05;

const CONTROLS: &[ControlSpec] = &[
    ControlSpec::slider("Particles", "particleCount", 500.0, 20000.0, 500.0, 4000.0),
    ControlSpec::slider("Attractors", "attractorCount", 1.0, 8.0, 1.0, 3.0),
    ControlSpec::slider("Gravity", "gravityStrength", 0.1, 5.0, 0.1, 1.0),
    ControlSpec::slider("Attractor Radius", "attractorRadius", 1.0, 5.0, 0.1, 2.5),
    ControlSpec::slider("Spin", "spinStrength", 0.0, 2.0, 0.05, 0.5),
    ControlSpec::slider("Max Speed", "maxSpeed", 0.5, 6.0, 0.1, 2.0),
    ControlSpec::slider("Damping", "damping", 0.9, 1.0, 0.005, 0.98),
    ControlSpec::slider("Bound Radius", "boundRadius", 3.0, 12.0, 0.5, 6.0),
    ControlSpec::slider("Boundary Force", "boundaryStrength", 1.0, 30.0, 1.0, 10.0),
    ControlSpec::slider("Bass Gravity", "bassGravityMultiplier", 0.0, 3.0, 0.1, 1.0),
    ControlSpec::slider("Mid Spin", "midSpinMultiplier", 0.0, 3.0, 0.1, 1.0),
    ControlSpec::slider("Smoothing", "smoothingFactor", 0.05, 1.0, 0.05, 0.3),
    ControlSpec::slider("Beat Sensitivity", "beatSensitivity", 1.0, 3.0, 0.05, 1.4),
    ControlSpec::slider("Beat Cooldown (ms)", "beatCooldownMs", 100.0, 1000.0, 10.0, 300.0),
    ControlSpec::slider("Beat Kick", "beatKick", 0.0, 2.0, 0.05, 0.5),
    ControlSpec::slider("Particle Size", "particleSize", 0.01, 0.2, 0.005, 0.05),
];

/// Resolved numeric parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GravityParams {
    /// Number of particles
    pub particle_count: usize,
    /// Number of attractors
    pub attractor_count: usize,
    /// Gravitational constant G
    pub gravity_strength: f32,
    /// Radius of the attractor sphere
    pub attractor_radius: f32,
    /// Base spin strength
    pub spin_strength: f32,
    /// Particle speed limit
    pub max_speed: f32,
    /// Per-frame velocity damping
    pub damping: f32,
    /// Soft boundary radius
    pub bound_radius: f32,
    /// Boundary spring constant
    pub boundary_strength: f32,
    /// Audio gain on attractor mass
    pub bass_gravity_multiplier: f32,
    /// Audio gain on attractor spin
    pub mid_spin_multiplier: f32,
    /// Band smoothing factor
    pub smoothing_factor: f32,
    /// Beat threshold over baseline
    pub beat_sensitivity: f32,
    /// Minimum time between beats (seconds)
    pub beat_cooldown_secs: f64,
    /// Outward velocity per unit of beat energy
    pub beat_kick: f32,
    /// Base particle size
    pub particle_size: f32,
}

impl GravityParams {
    /// Resolve parameters, falling back to defaults for missing keys
    pub fn from_config(config: &VisualizerConfig) -> Self {
        let value = |key: &str| {
            let spec = CONTROLS.iter().find(|c| c.key == key);
            let default = spec.map_or(0.0, |c| c.default);
            config.value_or(key, default)
        };

        Self {
            particle_count: value("particleCount").round().clamp(0.0, 20000.0) as usize,
            attractor_count: value("attractorCount").round().clamp(1.0, 8.0) as usize,
            gravity_strength: value("gravityStrength").max(0.0),
            attractor_radius: value("attractorRadius").max(0.0),
            spin_strength: value("spinStrength"),
            max_speed: value("maxSpeed").max(0.01),
            damping: value("damping").clamp(0.0, 1.0),
            bound_radius: value("boundRadius").max(0.5),
            boundary_strength: value("boundaryStrength").max(0.0),
            bass_gravity_multiplier: value("bassGravityMultiplier").max(0.0),
            mid_spin_multiplier: value("midSpinMultiplier").max(0.0),
            smoothing_factor: value("smoothingFactor").clamp(0.0, 1.0),
            beat_sensitivity: value("beatSensitivity"),
            beat_cooldown_secs: value("beatCooldownMs").max(0.0) as f64 / 1000.0,
            beat_kick: value("beatKick"),
            particle_size: value("particleSize").max(0.0),
        }
    }
}

/// Audio-driven point mass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attractor {
    /// Current position
    pub position: Vec3,
    /// Position on the Fibonacci sphere before orbiting
    pub home: Vec3,
    /// Effective mass this frame
    pub mass: f32,
    /// Mass at rest
    pub base_mass: f32,
    /// Unit spin axis
    pub rotation_axis: Vec3,
    /// Effective spin strength this frame
    pub spin_strength: f32,
}

/// Simulated particle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    /// Position
    pub position: Vec3,
    /// Velocity
    pub velocity: Vec3,
    /// Mass
    pub mass: f32,
}

/// Gravitational particle field visualizer
pub struct GravityField {
    config: VisualizerConfig,
    params: GravityParams,
    colors: ColorScheme,
    rng: StdRng,

    attractors: Vec<Attractor>,
    particles: Vec<Particle>,
    buffer: Option<BufferId>,
    initialized: bool,

    beat: BeatDetector,
    smoothed_bands: [f32; 3],
    last_time: Option<f64>,
    elapsed: f32,
}

impl GravityField {
    /// Create an unseeded field
    pub fn new(config: VisualizerConfig, colors: ColorScheme) -> Self {
        Self::with_rng(config, colors, StdRng::from_os_rng())
    }

    /// Create a field with a fixed random seed
    pub fn with_seed(config: VisualizerConfig, colors: ColorScheme, seed: u64) -> Self {
        Self::with_rng(config, colors, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: VisualizerConfig, colors: ColorScheme, rng: StdRng) -> Self {
        let mut merged = Self::default_config();
        merged.merge(&config);
        Self {
            params: GravityParams::from_config(&merged),
            config: merged,
            colors,
            rng,
            attractors: Vec::new(),
            particles: Vec::new(),
            buffer: None,
            initialized: false,
            beat: BeatDetector::new(),
            smoothed_bands: [0.0; 3],
            last_time: None,
            elapsed: 0.0,
        }
    }

    /// Default parameter set
    pub fn default_config() -> VisualizerConfig {
        defaults_from(CONTROLS)
    }

    /// Resolved parameters
    pub fn params(&self) -> &GravityParams {
        &self.params
    }

    /// Live particle count
    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    /// Live attractor count
    pub fn attractor_count(&self) -> usize {
        self.attractors.len()
    }

    /// Current beat pulse (1.0 at rest)
    pub fn beat_multiplier(&self) -> f32 {
        self.beat.multiplier()
    }

    /// Beat detector state
    pub fn beat_detector(&self) -> &BeatDetector {
        &self.beat
    }

    /// Attractors
    pub fn attractors(&self) -> &[Attractor] {
        &self.attractors
    }

    /// Particles
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Whether `init` has run
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn rebuild_attractors(&mut self) {
        let count = self.params.attractor_count;
        let radius = self.params.attractor_radius;
        let rotation = Quat::from_rotation_y(self.elapsed * ORBIT_SPEED);

        let mut attractors = Vec::with_capacity(count);
        for i in 0..count {
            // Fibonacci sphere
            let phi = (-1.0 + 2.0 * i as f32 / count as f32).clamp(-1.0, 1.0).acos();
            let theta = (count as f32 * PI).sqrt() * phi;
            let home = Vec3::new(
                radius * theta.cos() * phi.sin(),
                radius * theta.sin() * phi.sin(),
                radius * phi.cos(),
            );

            let base_mass = self.rng.random_range(0.8..1.2);
            attractors.push(Attractor {
                position: rotation * home,
                home,
                mass: base_mass,
                base_mass,
                rotation_axis: random_unit_vector(&mut self.rng),
                spin_strength: self.params.spin_strength,
            });
        }

        debug!("GravityField: {} attractors", count);
        self.attractors = attractors;
    }

    fn rebuild_particles(&mut self) {
        let count = self.params.particle_count;
        let rng = &mut self.rng;

        self.particles = (0..count)
            .map(|_| {
                let r = rng.random_range(SPAWN_RADIUS_MIN..SPAWN_RADIUS_MAX);
                let theta = rng.random::<f32>() * TAU;
                let phi = (2.0 * rng.random::<f32>() - 1.0).acos();
                Particle {
                    position: Vec3::new(
                        r * phi.sin() * theta.cos(),
                        r * phi.sin() * theta.sin(),
                        r * phi.cos(),
                    ),
                    velocity: Vec3::new(
                        rng.random_range(-SPAWN_SPEED..SPAWN_SPEED),
                        rng.random_range(-SPAWN_SPEED..SPAWN_SPEED),
                        rng.random_range(-SPAWN_SPEED..SPAWN_SPEED),
                    ),
                    mass: rng.random_range(0.5..1.5),
                }
            })
            .collect();

        debug!("GravityField: {} particles", count);
    }

    /// Apply band values and the beat pulse to the attractors
    fn couple_audio(&mut self, bands: [f32; 3]) {
        let smoothing = self.params.smoothing_factor;
        let mut effective = [0.0; 3];
        for ((smoothed, raw), eff) in self
            .smoothed_bands
            .iter_mut()
            .zip(bands)
            .zip(effective.iter_mut())
        {
            let raw = if raw.is_finite() { raw.clamp(0.0, 1.0) } else { 0.0 };
            *smoothed += (raw - *smoothed) * smoothing;
            *eff = raw.max(*smoothed);
        }

        let pulse = self.beat.multiplier();
        let mid = effective[1];
        let rotation = Quat::from_rotation_y(self.elapsed * ORBIT_SPEED);

        for (i, attractor) in self.attractors.iter_mut().enumerate() {
            let band = effective[i % 3];
            attractor.mass = attractor.base_mass
                * (1.0 + band * self.params.bass_gravity_multiplier * AUDIO_GRAVITY_GAIN)
                * pulse;
            attractor.spin_strength = self.params.spin_strength
                * (1.0 + mid * self.params.mid_spin_multiplier * AUDIO_SPIN_GAIN);
            attractor.position = rotation * attractor.home;
        }
    }

    /// Advance the physics by `dt` seconds
    pub fn step(&mut self, dt: f32) {
        let p = self.params;

        for particle in &mut self.particles {
            let mut force = Vec3::ZERO;

            for attractor in &self.attractors {
                let to_attractor = attractor.position - particle.position;
                let distance = to_attractor.length().max(DISTANCE_FLOOR);
                let direction = to_attractor / distance;
                let magnitude =
                    p.gravity_strength * attractor.mass * particle.mass / (distance * distance);

                force += direction * magnitude;
                force += attractor.rotation_axis.cross(direction)
                    * magnitude
                    * attractor.spin_strength;
            }

            let radius = particle.position.length();
            if radius > p.bound_radius {
                let overshoot = radius - p.bound_radius;
                force -= particle.position / radius * overshoot * p.boundary_strength;
            }

            particle.velocity += force * dt;
            particle.velocity = particle.velocity.clamp_length_max(p.max_speed) * p.damping;
            if !particle.velocity.is_finite() {
                particle.velocity = Vec3::ZERO;
            }
            particle.position += particle.velocity * dt;
        }
    }
}

fn random_unit_vector(rng: &mut StdRng) -> Vec3 {
    let z: f32 = rng.random_range(-1.0..1.0);
    let theta = rng.random::<f32>() * TAU;
    let ring = (1.0 - z * z).max(0.0).sqrt();
    Vec3::new(ring * theta.cos(), ring * theta.sin(), z).normalize_or(Vec3::Y)
}

impl Visualizer for GravityField {
    fn init(&mut self, surface: &mut Surface) {
        if self.initialized {
            return;
        }
        self.rebuild_attractors();
        self.rebuild_particles();
        self.buffer = Some(surface.allocate(
            "gravity.particles",
            Primitive::Points,
            self.params.particle_count,
        ));
        self.initialized = true;
        debug!("GravityField initialized");
    }

    fn update(&mut self, analysis: &FrequencyAnalysis) {
        if !self.initialized {
            return;
        }

        let now = analysis.timestamp;
        let dt = match self.last_time {
            Some(last) => ((now - last) as f32).clamp(0.0, MAX_DT),
            None => FIRST_FRAME_DT,
        };
        self.last_time = Some(now);
        self.elapsed += dt;

        let energy = beat_energy(analysis.bass_avg, analysis.mid_avg, analysis.high_avg);
        if let Some(beat) = self.beat.process(
            energy,
            now,
            self.params.beat_sensitivity,
            self.params.beat_cooldown_secs,
        ) {
            let kick = beat * self.params.beat_kick;
            for particle in &mut self.particles {
                particle.velocity += particle.position.normalize_or_zero() * kick;
            }
        }

        self.couple_audio([analysis.bass_avg, analysis.mid_avg, analysis.high_avg]);
        self.step(dt);
    }

    fn render(&self, surface: &mut Surface) {
        let Some(buffer) = self.buffer else {
            return;
        };

        let pulse = self.beat.multiplier();
        let max_speed = self.params.max_speed;
        let vertices: Vec<Vertex> = self
            .particles
            .iter()
            .map(|particle| {
                let speed_ratio = (particle.velocity.length() / max_speed).clamp(0.0, 1.0);
                let size = self.params.particle_size * (1.0 + speed_ratio) * pulse;
                let color = rgba(self.colors.gradient(speed_ratio), 0.85);
                Vertex::new(particle.position.to_array(), size, color)
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
            debug!("GravityField destroyed");
        }
        self.particles.clear();
        self.attractors.clear();
        self.initialized = false;
    }

    fn controls(&self) -> Vec<VisualizerControl> {
        resolve_controls(CONTROLS, &self.config)
    }

    fn name(&self) -> &str {
        "Gravitational Particle Field"
    }

    fn config_mut(&mut self) -> &mut VisualizerConfig {
        &mut self.config
    }

    fn update_config(&mut self, key: &str, value: f32) {
        self.config.set(key, value);
        let previous = self.params;
        self.params = GravityParams::from_config(&self.config);

        if !self.initialized {
            return;
        }
        match key {
            "particleCount" if self.params.particle_count != previous.particle_count => {
                self.rebuild_particles();
            }
            "attractorCount" | "attractorRadius" if self.params != previous => {
                self.rebuild_attractors();
                self.couple_audio(self.smoothed_bands);
            }
            _ => {}
        }
    }

    fn update_colors(&mut self, colors: ColorScheme) {
        self.colors = colors;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(particles: f32) -> GravityField {
        let config = VisualizerConfig::new().with("particleCount", particles);
        GravityField::with_seed(config, ColorScheme::default(), 7)
    }

    fn frame(t: f64, bass: f32, mid: f32, high: f32) -> FrequencyAnalysis {
        FrequencyAnalysis {
            bass_avg: bass,
            mid_avg: mid,
            high_avg: high,
            is_playing: true,
            ..FrequencyAnalysis::silent(64)
        }
        .with_timestamp(t)
    }

    #[test]
    fn test_init_builds_population() {
        let mut surface = Surface::default();
        let mut gravity = field(1000.0);
        assert_eq!(gravity.particle_count(), 0);

        gravity.init(&mut surface);
        assert_eq!(gravity.particle_count(), 1000);
        assert_eq!(gravity.attractor_count(), 3);
        assert_eq!(surface.live_buffers(), 1);

        for particle in gravity.particles() {
            let r = particle.position.length();
            assert!((SPAWN_RADIUS_MIN - 1e-4..=SPAWN_RADIUS_MAX + 1e-4).contains(&r));
            assert!((0.5..1.5).contains(&particle.mass));
        }
        for attractor in gravity.attractors() {
            assert!((attractor.position.length() - 2.5).abs() < 1e-4);
            assert!((attractor.rotation_axis.length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_lifecycle_out_of_order_is_noop() {
        let mut surface = Surface::default();
        let mut gravity = field(500.0);

        gravity.update(&frame(0.0, 1.0, 1.0, 1.0));
        gravity.render(&mut surface);
        gravity.destroy(&mut surface);
        assert!(surface.draw_calls().is_empty());

        gravity.init(&mut surface);
        gravity.destroy(&mut surface);
        gravity.destroy(&mut surface);
        assert_eq!(surface.live_buffers(), 0);
        assert!(!gravity.is_initialized());
    }

    #[test]
    fn test_render_single_draw_call() {
        let mut surface = Surface::default();
        let mut gravity = field(500.0);
        gravity.init(&mut surface);
        gravity.update(&frame(0.0, 0.0, 0.0, 0.0));
        gravity.render(&mut surface);

        assert_eq!(surface.draw_calls().len(), 1);
        assert_eq!(surface.draw_calls()[0].count, 500);
        assert_eq!(surface.draw_calls()[0].primitive, Primitive::Points);
    }

    #[test]
    fn test_particle_count_rebuilds_only_particles() {
        let mut surface = Surface::default();
        let mut gravity = field(500.0);
        gravity.init(&mut surface);
        let attractors = gravity.attractors().to_vec();

        gravity.update_config("particleCount", 1500.0);
        assert_eq!(gravity.particle_count(), 1500);
        assert_eq!(gravity.attractors(), attractors.as_slice());
        assert_eq!(gravity.controls()[0].value, 1500.0);
    }

    #[test]
    fn test_attractor_count_rebuilds_only_attractors() {
        let mut surface = Surface::default();
        let mut gravity = field(500.0);
        gravity.init(&mut surface);
        let particles = gravity.particles().to_vec();

        gravity.update_config("attractorCount", 5.0);
        assert_eq!(gravity.attractor_count(), 5);
        assert_eq!(gravity.particles(), particles.as_slice());
        assert!(gravity.is_initialized());
    }

    #[test]
    fn test_band_drives_matching_attractors() {
        let mut surface = Surface::default();
        let config = VisualizerConfig::new()
            .with("particleCount", 500.0)
            .with("attractorCount", 4.0);
        let mut gravity = GravityField::with_seed(config, ColorScheme::default(), 3);
        gravity.init(&mut surface);

        gravity.update(&frame(0.0, 1.0, 0.0, 0.0));
        let pulse = gravity.beat_multiplier();
        let ratio = |a: &Attractor| a.mass / a.base_mass;

        let attractors = gravity.attractors();
        // Bass follows attractors 0 and 3
        assert!((ratio(&attractors[0]) - (1.0 + AUDIO_GRAVITY_GAIN) * pulse).abs() < 1e-3);
        assert!((ratio(&attractors[3]) - (1.0 + AUDIO_GRAVITY_GAIN) * pulse).abs() < 1e-3);
        assert!((ratio(&attractors[1]) - pulse).abs() < 1e-3);
        assert!((ratio(&attractors[2]) - pulse).abs() < 1e-3);
    }

    #[test]
    fn test_smoothing_holds_after_drop() {
        let mut surface = Surface::default();
        let mut gravity = field(500.0);
        gravity.init(&mut surface);

        gravity.update(&frame(0.0, 1.0, 0.0, 0.0));
        gravity.update(&frame(1.0 / 60.0, 0.0, 0.0, 0.0));

        // max(raw = 0, smoothed > 0) keeps the attractor heavier than rest
        let a = gravity.attractors()[0];
        assert!(a.mass / a.base_mass > gravity.beat_multiplier());
    }

    #[test]
    fn test_beat_kicks_particles_outward() {
        let mut surface = Surface::default();
        let mut gravity = field(500.0);
        gravity.init(&mut surface);

        let mut t = 0.0;
        for _ in 0..60 {
            gravity.update(&frame(t, 0.1, 0.1, 0.1));
            t += 1.0 / 60.0;
        }
        let beats = gravity.beat_detector().beats_detected();

        gravity.update(&frame(t + 0.5, 1.0, 1.0, 1.0));
        assert_eq!(gravity.beat_detector().beats_detected(), beats + 1);
        assert!(gravity.beat_multiplier() > 1.0);
    }

    #[test]
    fn test_boundary_pulls_escaped_particle_inward() {
        let mut surface = Surface::default();
        let config = VisualizerConfig::new()
            .with("particleCount", 500.0)
            .with("gravityStrength", 0.0)
            .with("boundRadius", 6.0)
            .with("boundaryStrength", 10.0);
        let mut gravity = GravityField::with_seed(config, ColorScheme::default(), 2);
        gravity.init(&mut surface);

        gravity.particles = vec![
            Particle {
                position: Vec3::new(8.0, 0.0, 0.0),
                velocity: Vec3::ZERO,
                mass: 1.0,
            },
            Particle {
                position: Vec3::new(0.0, 5.0, 0.0),
                velocity: Vec3::ZERO,
                mass: 1.0,
            },
        ];
        gravity.step(1.0 / 60.0);

        // 2 units past the bound at strength 10, one frame, then damping
        let escaped = gravity.particles()[0];
        let expected = -20.0 / 60.0 * 0.98;
        assert!((escaped.velocity.x - expected).abs() < 1e-5);
        assert_eq!(escaped.velocity.y, 0.0);
        assert!(escaped.position.length() < 8.0);

        let inside = gravity.particles()[1];
        assert_eq!(inside.velocity, Vec3::ZERO);
        assert_eq!(inside.position, Vec3::new(0.0, 5.0, 0.0));
    }

    #[test]
    fn test_params_fallback() {
        let config = VisualizerConfig::new().with("attractorCount", 0.0);
        let params = GravityParams::from_config(&config);
        assert_eq!(params.attractor_count, 1);
        assert_eq!(params.particle_count, 4000);
        assert!((params.beat_cooldown_secs - 0.3).abs() < 1e-9);
    }
}
