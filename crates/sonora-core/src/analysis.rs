//! Frequency Analysis - raw byte spectrum to perceptual control values
//!
//! Turns the per-frame magnitude array produced by the audio layer into the
//! bounded set of values every visualizer consumes:
//! - `bars`: log-spaced magnitudes, one spectrum bin per bar (no averaging)
//! - `bass_avg` / `mid_avg` / `high_avg`: normalized band means
//! - `average_frequency`: unweighted mean of the entire spectrum
//!
//! The analyzer is a pure function of its input plus the fixed sample rate and
//! bin count of the analysis node. The bar-to-bin table is computed once per
//! bar-count configuration.

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Default number of bars
pub const DEFAULT_BAR_COUNT: usize = 64;

/// Bass band range (Hz)
pub const BASS_BAND_HZ: (f32, f32) = (20.0, 250.0);
/// Mid band range (Hz)
pub const MID_BAND_HZ: (f32, f32) = (250.0, 2000.0);
/// High band range (Hz)
pub const HIGH_BAND_HZ: (f32, f32) = (2000.0, 16000.0);

/// Share of bars dedicated to the 20-800 Hz region
const BASS_BAR_RATIO: f32 = 0.4;
const BAR_MIN_HZ: f32 = 20.0;
const BAR_SPLIT_HZ: f32 = 800.0;
const BAR_MAX_HZ: f32 = 16000.0;

/// Fixed properties of the analysis node feeding the analyzer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Sample rate of the audio context (Hz)
    pub sample_rate: f32,
    /// Number of FFT bins in the raw spectrum (fft_size / 2)
    pub bin_count: usize,
    /// Number of bars to derive
    pub bar_count: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100.0,
            bin_count: 1024,
            bar_count: DEFAULT_BAR_COUNT,
        }
    }
}

impl AnalyzerConfig {
    /// Nyquist frequency (Hz)
    pub fn nyquist(&self) -> f32 {
        self.sample_rate / 2.0
    }
}

/// One frame of derived audio control values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrequencyAnalysis {
    /// Raw magnitudes, one per FFT bin
    pub raw_spectrum: Vec<u8>,
    /// Log-spaced bar magnitudes (0-255, low to high frequency)
    pub bars: Vec<f32>,
    /// Mean of the bass band (0.0 - 1.0)
    pub bass_avg: f32,
    /// Mean of the mid band (0.0 - 1.0)
    pub mid_avg: f32,
    /// Mean of the high band (0.0 - 1.0)
    pub high_avg: f32,
    /// Mean of the whole raw spectrum (0 - 255)
    pub average_frequency: f32,
    /// `average_frequency / 255`
    pub normalized_frequency: f32,
    /// Playback flag passed through from the transport
    pub is_playing: bool,
    /// Frame timestamp in seconds (stamped by the manager)
    pub timestamp: f64,
}

impl FrequencyAnalysis {
    /// An all-zero analysis with `bar_count` bars
    pub fn silent(bar_count: usize) -> Self {
        Self {
            bars: vec![0.0; bar_count],
            ..Default::default()
        }
    }

    /// Return this analysis stamped with a frame time
    pub fn with_timestamp(mut self, timestamp: f64) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Maps raw spectra onto bars and bands
#[derive(Debug, Clone)]
pub struct FrequencyAnalyzer {
    config: AnalyzerConfig,
    /// Spectrum bin index sampled by each bar
    bar_bins: Vec<usize>,
    /// Inclusive bin ranges for bass, mid, high (None = empty range)
    band_bins: [Option<RangeInclusive<usize>>; 3],
}

impl Default for FrequencyAnalyzer {
    fn default() -> Self {
        Self::new(AnalyzerConfig::default())
    }
}

impl FrequencyAnalyzer {
    /// Create an analyzer for the given analysis node
    pub fn new(config: AnalyzerConfig) -> Self {
        let nyquist = config.nyquist();
        let band_bins = [BASS_BAND_HZ, MID_BAND_HZ, HIGH_BAND_HZ]
            .map(|(min, max)| band_bin_range(min, max, nyquist, config.bin_count));

        let mut analyzer = Self {
            config,
            bar_bins: Vec::new(),
            band_bins,
        };
        analyzer.rebuild_bar_table();
        analyzer
    }

    /// Current configuration
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Number of bars produced per frame
    pub fn bar_count(&self) -> usize {
        self.bar_bins.len()
    }

    /// Spectrum bin sampled by each bar
    pub fn bar_bins(&self) -> &[usize] {
        &self.bar_bins
    }

    /// Reconfigure the bar count. This is the only way `bars.len()` changes.
    pub fn set_bar_count(&mut self, bar_count: usize) {
        if bar_count == self.config.bar_count {
            return;
        }
        tracing::debug!(
            "FrequencyAnalyzer bar count {} -> {}",
            self.config.bar_count,
            bar_count
        );
        self.config.bar_count = bar_count;
        self.rebuild_bar_table();
    }

    fn rebuild_bar_table(&mut self) {
        let nyquist = self.config.nyquist();
        let bin_count = self.config.bin_count;
        self.bar_bins = bar_frequencies(self.config.bar_count)
            .into_iter()
            .map(|freq| bin_for_frequency(freq, nyquist, bin_count))
            .collect();
    }

    /// Derive one frame of control values from a raw spectrum
    pub fn analyze(&self, raw_spectrum: &[u8], is_playing: bool) -> FrequencyAnalysis {
        // Bins missing from a short buffer read as silence
        let bars = self
            .bar_bins
            .iter()
            .map(|&bin| raw_spectrum.get(bin).copied().unwrap_or(0) as f32)
            .collect();

        let [bass, mid, high] = &self.band_bins;

        let average_frequency = if raw_spectrum.is_empty() {
            0.0
        } else {
            raw_spectrum.iter().map(|&v| v as f32).sum::<f32>() / raw_spectrum.len() as f32
        };

        FrequencyAnalysis {
            raw_spectrum: raw_spectrum.to_vec(),
            bars,
            bass_avg: band_average(raw_spectrum, bass.as_ref()),
            mid_avg: band_average(raw_spectrum, mid.as_ref()),
            high_avg: band_average(raw_spectrum, high.as_ref()),
            average_frequency,
            normalized_frequency: average_frequency / 255.0,
            is_playing,
            timestamp: 0.0,
        }
    }
}

/// Target frequency of every bar.
///
/// The first `floor(count * 0.4)` bars cover 20-800 Hz on a square-root warped
/// log curve, spreading bass over more bars. The rest cover 800-16000 Hz on a
/// plain log curve.
pub fn bar_frequencies(bar_count: usize) -> Vec<f32> {
    let bass_bars = (bar_count as f32 * BASS_BAR_RATIO).floor() as usize;
    let treble_bars = bar_count - bass_bars;

    let bass = (0..bass_bars).map(|i| {
        let t = unit_position(i, bass_bars);
        BAR_MIN_HZ * (BAR_SPLIT_HZ / BAR_MIN_HZ).powf(t.sqrt())
    });
    let treble = (0..treble_bars).map(|i| {
        let t = unit_position(i, treble_bars);
        BAR_SPLIT_HZ * (BAR_MAX_HZ / BAR_SPLIT_HZ).powf(t)
    });

    bass.chain(treble).collect()
}

/// `i / (count - 1)`, 0 for single-element regions
fn unit_position(i: usize, count: usize) -> f32 {
    if count > 1 {
        i as f32 / (count - 1) as f32
    } else {
        0.0
    }
}

/// Nearest spectrum bin for a frequency, clamped to the valid range
pub fn bin_for_frequency(freq: f32, nyquist: f32, bin_count: usize) -> usize {
    if bin_count == 0 || nyquist <= 0.0 {
        return 0;
    }
    let bin = (freq / nyquist * bin_count as f32).floor();
    (bin.max(0.0) as usize).min(bin_count - 1)
}

fn band_bin_range(
    min_freq: f32,
    max_freq: f32,
    nyquist: f32,
    bin_count: usize,
) -> Option<RangeInclusive<usize>> {
    if bin_count == 0 || nyquist <= 0.0 {
        return None;
    }
    let min_bin = (min_freq / nyquist * bin_count as f32).floor() as usize;
    let max_bin = ((max_freq / nyquist * bin_count as f32).floor() as usize).min(bin_count - 1);
    (min_bin <= max_bin).then_some(min_bin..=max_bin)
}

/// Arithmetic mean of the bins in `range`, normalized by 255. Empty -> 0.
fn band_average(raw_spectrum: &[u8], range: Option<&RangeInclusive<usize>>) -> f32 {
    let Some(range) = range else {
        return 0.0;
    };

    let (sum, count) = raw_spectrum
        .iter()
        .skip(*range.start())
        .take(range.end() - range.start() + 1)
        .fold((0u32, 0u32), |(sum, count), &v| (sum + v as u32, count + 1));

    if count == 0 {
        return 0.0;
    }
    sum as f32 / count as f32 / 255.0
}
