//! Visualizer Manager - owns the active visualizer and its frame loop
//!
//! At most one visualizer is alive at a time. Switching always tears the old
//! one down (loop stopped, resources released, surface cleared) before the
//! new one is created, so two instances never share the surface.
//!
//! The loop is a single pending frame registration with the host's
//! [`FrameScheduler`]. Each delivered frame pulls one analysis, runs
//! `update` then `render`, and registers the next frame. A handle that is no
//! longer the pending one is stale and ignored.

use std::sync::Arc;
use tracing::{debug, trace, warn};

use crate::audio::AnalysisSource;
use crate::color::ColorScheme;
use crate::registry::VisualizerRegistry;
use crate::scheduler::{FrameHandle, FrameScheduler};
use crate::surface::Surface;
use crate::visualizer::{Visualizer, VisualizerConfig, VisualizerControl};

/// Lifecycle state of the manager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerState {
    /// No visualizer
    Idle,
    /// A visualizer is running
    Active,
}

struct ActiveVisualizer {
    kind: String,
    instance: Box<dyn Visualizer>,
}

/// Drives a single visualizer from an analysis source
pub struct VisualizerManager<A: AnalysisSource, S: FrameScheduler> {
    registry: Arc<VisualizerRegistry>,
    source: A,
    scheduler: S,
    surface: Surface,
    active: Option<ActiveVisualizer>,
    is_playing: bool,
    pending_frame: Option<FrameHandle>,
    frames_rendered: u64,
    stale_frames: u64,
}

impl<A: AnalysisSource, S: FrameScheduler> VisualizerManager<A, S> {
    /// Create a manager over the built-in visualizers
    pub fn new(source: A, scheduler: S, surface: Surface) -> Self {
        Self::with_registry(
            Arc::new(VisualizerRegistry::builtin()),
            source,
            scheduler,
            surface,
        )
    }

    /// Create a manager over a custom registry
    pub fn with_registry(
        registry: Arc<VisualizerRegistry>,
        source: A,
        scheduler: S,
        surface: Surface,
    ) -> Self {
        Self {
            registry,
            source,
            scheduler,
            surface,
            active: None,
            is_playing: false,
            pending_frame: None,
            frames_rendered: 0,
            stale_frames: 0,
        }
    }

    /// Replace the active visualizer.
    ///
    /// Unknown ids are logged and leave the current visualizer running.
    /// Returns whether the switch happened.
    pub fn switch_visualizer(
        &mut self,
        id: &str,
        config: &VisualizerConfig,
        colors: ColorScheme,
    ) -> bool {
        if !self.registry.contains(id) {
            warn!("Cannot switch to unknown visualizer '{}'", id);
            return false;
        }

        self.teardown();

        let Some(mut instance) = self.registry.create(id, config, colors) else {
            return false;
        };
        instance.init(&mut self.surface);
        instance.set_playback_state(self.is_playing);
        debug!("Switched to visualizer '{}' ({})", id, instance.name());

        self.active = Some(ActiveVisualizer {
            kind: id.to_string(),
            instance,
        });
        self.start_loop();
        true
    }

    /// Run one frame. Stale or unexpected handles are ignored.
    ///
    /// `now` is the host frame clock in seconds. Returns whether a frame ran.
    pub fn on_frame(&mut self, handle: FrameHandle, now: f64) -> bool {
        if self.pending_frame != Some(handle) {
            self.stale_frames += 1;
            trace!("Ignoring stale frame {:?}", handle);
            return false;
        }
        self.pending_frame = None;

        let Some(active) = self.active.as_mut() else {
            return false;
        };

        let analysis = self.source.analysis(self.is_playing).with_timestamp(now);
        active.instance.update(&analysis);
        self.surface.begin_frame();
        active.instance.render(&mut self.surface);
        self.frames_rendered += 1;

        self.pending_frame = Some(self.scheduler.request_frame());
        true
    }

    /// Forward a parameter change to the active visualizer
    pub fn update_config(&mut self, key: &str, value: f32) {
        if let Some(active) = self.active.as_mut() {
            active.instance.update_config(key, value);
        }
    }

    /// Forward a color scheme to the active visualizer
    pub fn update_colors(&mut self, colors: ColorScheme) {
        if let Some(active) = self.active.as_mut() {
            active.instance.update_colors(colors);
        }
    }

    /// Record the playback flag and forward it to the active visualizer
    pub fn set_playback_state(&mut self, is_playing: bool) {
        self.is_playing = is_playing;
        if let Some(active) = self.active.as_mut() {
            active.instance.set_playback_state(is_playing);
        }
    }

    /// Reconfigure the analyzer's bar count
    pub fn set_bar_count(&mut self, bar_count: usize) {
        self.source.set_bar_count(bar_count);
    }

    /// Stop the loop and release the active visualizer
    pub fn destroy(&mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        self.stop_loop();
        if let Some(mut old) = self.active.take() {
            old.instance.destroy(&mut self.surface);
            debug!("Destroyed visualizer '{}'", old.kind);
        }
        self.surface.clear();
    }

    fn start_loop(&mut self) {
        self.stop_loop();
        self.pending_frame = Some(self.scheduler.request_frame());
    }

    fn stop_loop(&mut self) {
        if let Some(handle) = self.pending_frame.take() {
            self.scheduler.cancel_frame(handle);
        }
    }

    /// Controls of the active visualizer (empty when idle)
    pub fn current_controls(&self) -> Vec<VisualizerControl> {
        self.active
            .as_ref()
            .map(|a| a.instance.controls())
            .unwrap_or_default()
    }

    /// Display name of the active visualizer (empty when idle)
    pub fn current_name(&self) -> &str {
        self.active.as_ref().map_or("", |a| a.instance.name())
    }

    /// Type id of the active visualizer
    pub fn current_type(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.kind.as_str())
    }

    /// Lifecycle state
    pub fn state(&self) -> ManagerState {
        if self.active.is_some() {
            ManagerState::Active
        } else {
            ManagerState::Idle
        }
    }

    /// Last playback flag
    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    /// The registered frame, if the loop is running
    pub fn pending_frame(&self) -> Option<FrameHandle> {
        self.pending_frame
    }

    /// Frames rendered since creation
    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// Frame callbacks rejected as stale
    pub fn stale_frames(&self) -> u64 {
        self.stale_frames
    }

    /// Registry this manager creates from
    pub fn registry(&self) -> &VisualizerRegistry {
        &self.registry
    }

    /// Render surface
    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// Mutable render surface (e.g. for resizing)
    pub fn surface_mut(&mut self) -> &mut Surface {
        &mut self.surface
    }

    /// Frame scheduler
    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    /// Mutable frame scheduler
    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    /// Analysis source
    pub fn source(&self) -> &A {
        &self.source
    }

    /// Mutable analysis source
    pub fn source_mut(&mut self) -> &mut A {
        &mut self.source
    }
}

impl<A: AnalysisSource, S: FrameScheduler> Drop for VisualizerManager<A, S> {
    fn drop(&mut self) {
        self.teardown();
    }
}
