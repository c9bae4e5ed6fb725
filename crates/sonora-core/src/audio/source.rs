//! Per-frame analysis source
//!
//! The manager pulls one `FrequencyAnalysis` per frame through `AnalysisSource`.
//! `SpectrumFeed` is the standard implementation: the audio layer publishes the
//! latest byte spectrum into a shared handle, and the feed analyzes whatever is
//! there when the frame runs.

use parking_lot::Mutex;
use std::sync::Arc;

use crate::analysis::{AnalyzerConfig, FrequencyAnalysis, FrequencyAnalyzer};

/// Provider of per-frame audio analysis
pub trait AnalysisSource {
    /// Produce the analysis for the current frame
    fn analysis(&mut self, is_playing: bool) -> FrequencyAnalysis;

    /// Request a different bar count for subsequent frames
    fn set_bar_count(&mut self, bar_count: usize);
}

/// Shared slot holding the most recent raw spectrum
#[derive(Debug, Clone, Default)]
pub struct SpectrumHandle(Arc<Mutex<Vec<u8>>>);

impl SpectrumHandle {
    /// Replace the stored spectrum
    pub fn publish(&self, spectrum: &[u8]) {
        let mut slot = self.0.lock();
        slot.clear();
        slot.extend_from_slice(spectrum);
    }

    /// Copy of the stored spectrum
    pub fn snapshot(&self) -> Vec<u8> {
        self.0.lock().clone()
    }
}

/// `AnalysisSource` backed by a published spectrum
#[derive(Debug, Clone)]
pub struct SpectrumFeed {
    analyzer: FrequencyAnalyzer,
    spectrum: SpectrumHandle,
}

impl SpectrumFeed {
    /// Create a feed for an analysis node with the given properties
    pub fn new(config: AnalyzerConfig) -> Self {
        Self {
            spectrum: SpectrumHandle(Arc::new(Mutex::new(vec![0; config.bin_count]))),
            analyzer: FrequencyAnalyzer::new(config),
        }
    }

    /// Handle for the audio layer to publish spectra into
    pub fn handle(&self) -> SpectrumHandle {
        self.spectrum.clone()
    }

    /// Underlying analyzer
    pub fn analyzer(&self) -> &FrequencyAnalyzer {
        &self.analyzer
    }
}

impl AnalysisSource for SpectrumFeed {
    fn analysis(&mut self, is_playing: bool) -> FrequencyAnalysis {
        let spectrum = self.spectrum.0.lock();
        self.analyzer.analyze(&spectrum, is_playing)
    }

    fn set_bar_count(&mut self, bar_count: usize) {
        self.analyzer.set_bar_count(bar_count);
    }
}
