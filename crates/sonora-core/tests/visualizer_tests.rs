use rand::rngs::StdRng;
use rand::SeedableRng;
use sonora_core::analysis::FrequencyAnalysis;
use sonora_core::visualizers::layout::{Layout, LayoutMode, GRID_CELLS};
use sonora_core::{ColorScheme, GravityField, RippleField, Surface, Visualizer, VisualizerConfig};
use std::collections::HashSet;

const BOUND_EPSILON: f32 = 0.3;

fn furthest(gravity: &GravityField) -> f32 {
    gravity
        .particles()
        .iter()
        .map(|p| p.position.length())
        .fold(0.0f32, f32::max)
}

fn silent_frame(t: f64) -> FrequencyAnalysis {
    FrequencyAnalysis {
        is_playing: true,
        ..FrequencyAnalysis::silent(64)
    }
    .with_timestamp(t)
}

#[test]
fn test_gravity_settles_inside_bound() {
    let mut surface = Surface::default();
    // Spawn shell reaches radius 4, well past a bound of 2
    let config = VisualizerConfig::new()
        .with("particleCount", 2000.0)
        .with("attractorRadius", 1.0)
        .with("spinStrength", 0.0)
        .with("maxSpeed", 1.0)
        .with("boundRadius", 2.0)
        .with("boundaryStrength", 30.0);
    let mut gravity = GravityField::with_seed(config, ColorScheme::default(), 42);
    gravity.init(&mut surface);

    let bound = gravity.params().bound_radius;
    assert!(furthest(&gravity) > bound + 1.5);

    let mut frame = 0;
    while frame < 600 {
        gravity.update(&silent_frame(frame as f64 / 60.0));
        frame += 1;
    }
    while frame < 1200 {
        gravity.update(&silent_frame(frame as f64 / 60.0));
        let reach = furthest(&gravity);
        assert!(
            reach <= bound + BOUND_EPSILON,
            "frame {}: particle at {} exceeds {}",
            frame,
            reach,
            bound + BOUND_EPSILON
        );
        frame += 1;
    }
    assert_eq!(gravity.beat_detector().beats_detected(), 0);
}

#[test]
fn test_gravity_is_deterministic_for_a_seed() {
    let run = || {
        let mut surface = Surface::default();
        let config = VisualizerConfig::new().with("particleCount", 500.0);
        let mut gravity = GravityField::with_seed(config, ColorScheme::default(), 9);
        gravity.init(&mut surface);
        for frame in 0..60 {
            gravity.update(&silent_frame(frame as f64 / 60.0));
        }
        gravity.particles().to_vec()
    };
    assert_eq!(run(), run());
}

#[test]
fn test_gravity_frame_gap_is_clamped() {
    let mut surface = Surface::default();
    let config = VisualizerConfig::new().with("particleCount", 500.0);
    let mut gravity = GravityField::with_seed(config, ColorScheme::default(), 5);
    gravity.init(&mut surface);

    gravity.update(&silent_frame(0.0));
    // A long stall must not fling particles out
    gravity.update(&silent_frame(30.0));
    let bound = gravity.params().bound_radius;
    assert!(gravity
        .particles()
        .iter()
        .all(|p| p.position.length() <= bound + BOUND_EPSILON));
}

#[test]
fn test_ripple_present_then_gone() {
    let mut surface = Surface::default();
    let mut ripple = RippleField::with_seed(VisualizerConfig::new(), ColorScheme::default(), 1);
    ripple.init(&mut surface);

    assert!(ripple.spawn_ripple(0, 64, 0.8, 0.0));
    let spawned = ripple.ripples()[0];
    assert_eq!(spawned.max_radius, 8.0);
    assert_eq!(spawned.speed, 1.5);

    let quiet = FrequencyAnalysis::silent(64);
    ripple.update(&quiet.clone().with_timestamp(5.0));
    assert_eq!(ripple.active_ripples(), 1);
    ripple.update(&quiet.with_timestamp(5.34));
    assert_eq!(ripple.active_ripples(), 0);
}

#[test]
fn test_grid_layout_visits_all_cells_before_repeat() {
    let mut rng = StdRng::seed_from_u64(99);
    let mut layout = Layout::new(LayoutMode::Grid, &mut rng);

    let mut seen = HashSet::new();
    for _ in 0..GRID_CELLS {
        assert!(seen.insert(layout.next_grid_cell(17)), "cell repeated early");
    }
    assert!(!seen.insert(layout.next_grid_cell(17)));
}

#[test]
fn test_grid_reshuffles_on_activation() {
    let mut surface = Surface::default();
    let config = VisualizerConfig::new().with("layoutMode", 2.0);
    let mut ripple = RippleField::with_seed(config, ColorScheme::default(), 3);
    ripple.init(&mut surface);

    let positions = |ripple: &mut RippleField| {
        (0..8)
            .map(|i| {
                ripple.spawn_ripple(0, 64, 1.0, i as f64);
                ripple.ripples().last().map(|r| r.position).unwrap()
            })
            .collect::<Vec<_>>()
    };

    let first = positions(&mut ripple);
    ripple.update_config("layoutMode", 2.0);
    let second = positions(&mut ripple);
    assert_ne!(first, second);
}
