//! Sonora - headless host for the audio-reactive visualization engine
//!
//! Feeds a synthesized test signal through the analysis pipeline and drives
//! the visualizer manager frame by frame, cycling through every registered
//! visualizer and logging what each one draws.
//!
//! Usage: `sonora [settings.toml]`

#![warn(missing_docs)]

mod logging_setup;
mod synth;

use anyhow::{Context, Result};
use sonora_core::registry;
use sonora_core::{
    ByteSpectrumAnalyzer, EngineSettings, ManualScheduler, SpectrumFeed, Surface,
    VisualizerManager,
};
use tracing::{debug, info, warn};

use crate::synth::TestSignal;

/// Tempo of the test signal
const TEST_BPM: f32 = 120.0;
/// Transport pause at the end of every cycle (s)
const PAUSE_SECS: f64 = 0.75;

/// The main entry point for the application.
fn main() -> Result<()> {
    let settings = match std::env::args().nth(1) {
        Some(path) => EngineSettings::load(&path)
            .with_context(|| format!("Failed to load settings from {}", path))?,
        None => EngineSettings::default(),
    };

    let _log_guard = logging_setup::init(&settings.log)?;

    info!("==========================================");
    info!("===      Sonora Session Started        ===");
    info!("==========================================");

    run(&settings)
}

fn run(settings: &EngineSettings) -> Result<()> {
    let host = &settings.host;
    let fps = host.fps.max(1);
    let frame_dt = 1.0 / fps as f64;
    let total_frames = (host.duration_secs.max(0.0) * fps as f64).round() as u64;
    let cycle_frames = (host.cycle_secs * fps as f64).round() as u64;

    let mut spectrum = ByteSpectrumAnalyzer::new(settings.analyzer.spectrum);
    let sample_rate = spectrum.config().sample_rate;
    let samples_per_frame = (sample_rate / fps) as usize;
    let feed = SpectrumFeed::new(
        spectrum
            .config()
            .analyzer_config(settings.analyzer.bar_count),
    );
    let published = feed.handle();

    let mut manager = VisualizerManager::new(
        feed,
        ManualScheduler::new(),
        Surface::new(host.width, host.height),
    );
    let colors = settings.color_scheme();

    let mut order: Vec<&str> = registry::global().types();
    match order.iter().position(|id| *id == settings.visualizer) {
        Some(start) => order.rotate_left(start),
        None => warn!(
            "Unknown visualizer '{}' in settings, starting with '{}'",
            settings.visualizer,
            order.first().copied().unwrap_or_default()
        ),
    }
    let Some(&first) = order.first() else {
        anyhow::bail!("No visualizers registered");
    };

    manager.set_playback_state(true);
    switch_to(&mut manager, settings, first, colors);

    let mut signal = TestSignal::new(sample_rate, TEST_BPM);
    let mut current = 0usize;

    for frame in 0..total_frames {
        let now = frame as f64 * frame_dt;

        if cycle_frames > 0 && frame > 0 && frame % cycle_frames == 0 {
            current = (current + 1) % order.len();
            switch_to(&mut manager, settings, order[current], colors);
        }

        let playing = cycle_frames == 0 || (now % host.cycle_secs) < host.cycle_secs - PAUSE_SECS;
        if playing != manager.is_playing() {
            debug!("Transport {}", if playing { "resumed" } else { "paused" });
            manager.set_playback_state(playing);
        }

        let samples = if playing {
            signal.render(samples_per_frame)
        } else {
            signal.skip(samples_per_frame)
        };
        spectrum.push_samples(&samples);
        published.publish(spectrum.compute());

        let Some(handle) = manager.scheduler_mut().next_due() else {
            warn!("Frame loop stopped unexpectedly");
            break;
        };
        manager.on_frame(handle, now);

        if frame % fps as u64 == 0 {
            let surface = manager.surface();
            let vertices: usize = surface.draw_calls().iter().map(|call| call.count).sum();
            info!(
                "t={:>5.1}s {:<30} draws={} vertices={} buffers={}",
                now,
                manager.current_name(),
                surface.draw_calls().len(),
                vertices,
                surface.live_buffers()
            );
        }
    }

    info!(
        "Rendered {} frames ({} stale callbacks ignored)",
        manager.frames_rendered(),
        manager.stale_frames()
    );
    manager.destroy();
    Ok(())
}

fn switch_to(
    manager: &mut VisualizerManager<SpectrumFeed, ManualScheduler>,
    settings: &EngineSettings,
    id: &str,
    colors: sonora_core::ColorScheme,
) {
    let config = settings.visualizer_config(id);
    if !manager.switch_visualizer(id, &config, colors) {
        return;
    }

    info!("Visualizer: {}", manager.current_name());
    match serde_json::to_string(&manager.current_controls()) {
        Ok(json) => debug!("Controls: {}", json),
        Err(e) => warn!("Failed to serialize controls: {}", e),
    }
}
