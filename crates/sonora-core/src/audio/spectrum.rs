//! Byte Spectrum Analyzer - PCM samples to a byte magnitude spectrum
//!
//! Produces the `u8` per-bin magnitudes the frequency analyzer consumes, using
//! the same scaling as a browser analyser node:
//! 1. Hann-windowed FFT of the most recent `fft_size` samples
//! 2. Magnitude `|X[k]| / N`, smoothed over time with `smoothing_time_constant`
//! 3. Converted to dB and mapped linearly from `[min_db, max_db]` onto `[0, 255]`

use num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::analysis::AnalyzerConfig;
use crate::{CoreError, Result};

/// Smallest accepted FFT size
const MIN_FFT_SIZE: usize = 32;
/// Largest accepted FFT size
const MAX_FFT_SIZE: usize = 32768;

/// Configuration for the byte spectrum analyzer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectrumConfig {
    /// Sample rate of incoming audio (Hz)
    pub sample_rate: u32,
    /// FFT size (power of 2)
    pub fft_size: usize,
    /// Temporal smoothing between successive spectra (0.0 - 1.0)
    pub smoothing_time_constant: f32,
    /// Level mapped to byte 0 (dB)
    pub min_decibels: f32,
    /// Level mapped to byte 255 (dB)
    pub max_decibels: f32,
}

impl Default for SpectrumConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            fft_size: 2048,
            smoothing_time_constant: 0.8,
            min_decibels: -100.0,
            max_decibels: -30.0,
        }
    }
}

impl SpectrumConfig {
    /// Check the configuration for values the analyzer cannot work with
    pub fn validate(&self) -> Result<()> {
        if !self.fft_size.is_power_of_two()
            || !(MIN_FFT_SIZE..=MAX_FFT_SIZE).contains(&self.fft_size)
        {
            return Err(CoreError::InvalidSetting(format!(
                "fft_size must be a power of two in {}..={}, got {}",
                MIN_FFT_SIZE, MAX_FFT_SIZE, self.fft_size
            )));
        }
        if self.sample_rate == 0 {
            return Err(CoreError::InvalidSetting(
                "sample_rate must be non-zero".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.smoothing_time_constant) {
            return Err(CoreError::InvalidSetting(format!(
                "smoothing_time_constant must be in 0..=1, got {}",
                self.smoothing_time_constant
            )));
        }
        if self.min_decibels >= self.max_decibels {
            return Err(CoreError::InvalidSetting(format!(
                "min_decibels ({}) must be below max_decibels ({})",
                self.min_decibels, self.max_decibels
            )));
        }
        Ok(())
    }

    /// Number of magnitude bins (half the FFT size)
    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Analyzer configuration matching this spectrum
    pub fn analyzer_config(&self, bar_count: usize) -> AnalyzerConfig {
        AnalyzerConfig {
            sample_rate: self.sample_rate as f32,
            bin_count: self.bin_count(),
            bar_count,
        }
    }
}

/// FFT front-end producing byte magnitudes
pub struct ByteSpectrumAnalyzer {
    /// FFT instance
    fft: Arc<dyn Fft<f32>>,

    /// Configuration
    config: SpectrumConfig,

    /// Input sample ring buffer
    input_buffer: Vec<f32>,

    /// Write position in ring buffer
    write_pos: usize,

    /// FFT complex buffer
    fft_buffer: Vec<Complex<f32>>,

    /// FFT scratch buffer
    scratch_buffer: Vec<Complex<f32>>,

    /// Hann window coefficients
    window: Vec<f32>,

    /// Time-smoothed linear magnitudes
    smoothed_magnitudes: Vec<f32>,

    /// Latest byte spectrum
    byte_spectrum: Vec<u8>,

    /// Samples pushed since creation/reset
    total_samples: u64,
}

impl ByteSpectrumAnalyzer {
    /// Create an analyzer. Invalid configurations fall back to defaults.
    pub fn new(config: SpectrumConfig) -> Self {
        let config = match config.validate() {
            Ok(()) => config,
            Err(e) => {
                tracing::warn!("{}, using default spectrum config", e);
                SpectrumConfig::default()
            }
        };

        let fft_size = config.fft_size;
        let half_size = config.bin_count();

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);
        let scratch_len = fft.get_inplace_scratch_len();

        let window: Vec<f32> = (0..fft_size)
            .map(|i| {
                let t = i as f32 / (fft_size - 1) as f32;
                0.5 * (1.0 - (2.0 * std::f32::consts::PI * t).cos())
            })
            .collect();

        debug!(
            "ByteSpectrumAnalyzer created: sample_rate={}, fft_size={}, smoothing={}",
            config.sample_rate, fft_size, config.smoothing_time_constant
        );

        Self {
            fft,
            config,
            input_buffer: vec![0.0; fft_size],
            write_pos: 0,
            fft_buffer: vec![Complex::new(0.0, 0.0); fft_size],
            scratch_buffer: vec![Complex::new(0.0, 0.0); scratch_len],
            window,
            smoothed_magnitudes: vec![0.0; half_size],
            byte_spectrum: vec![0; half_size],
            total_samples: 0,
        }
    }

    /// Append mono samples to the ring buffer
    pub fn push_samples(&mut self, samples: &[f32]) {
        let size = self.input_buffer.len();
        for &sample in samples {
            // NaN/Inf would poison the smoothed magnitudes forever
            self.input_buffer[self.write_pos] = if sample.is_finite() { sample } else { 0.0 };
            self.write_pos = (self.write_pos + 1) % size;
        }
        self.total_samples += samples.len() as u64;
    }

    /// Run the FFT over the latest window and refresh the byte spectrum
    pub fn compute(&mut self) -> &[u8] {
        let size = self.config.fft_size;

        // Unwrap the ring buffer oldest -> newest
        for i in 0..size {
            let src_idx = (self.write_pos + i) % size;
            self.fft_buffer[i] = Complex::new(self.input_buffer[src_idx] * self.window[i], 0.0);
        }

        self.fft
            .process_with_scratch(&mut self.fft_buffer, &mut self.scratch_buffer);

        let norm = 1.0 / size as f32;
        let tau = self.config.smoothing_time_constant;
        let db_range = self.config.max_decibels - self.config.min_decibels;

        for (i, smoothed) in self.smoothed_magnitudes.iter_mut().enumerate() {
            let magnitude = self.fft_buffer[i].norm() * norm;
            *smoothed = tau * *smoothed + (1.0 - tau) * magnitude;

            let byte = if *smoothed > 0.0 {
                let db = 20.0 * smoothed.log10();
                (255.0 * (db - self.config.min_decibels) / db_range).clamp(0.0, 255.0)
            } else {
                0.0
            };
            self.byte_spectrum[i] = byte as u8;
        }

        &self.byte_spectrum
    }

    /// Latest byte spectrum (as of the last `compute`)
    pub fn byte_spectrum(&self) -> &[u8] {
        &self.byte_spectrum
    }

    /// Number of magnitude bins
    pub fn bin_count(&self) -> usize {
        self.byte_spectrum.len()
    }

    /// Active configuration
    pub fn config(&self) -> &SpectrumConfig {
        &self.config
    }

    /// Samples pushed since creation or the last reset
    pub fn total_samples(&self) -> u64 {
        self.total_samples
    }

    /// Clear all buffered audio and smoothing state
    pub fn reset(&mut self) {
        self.input_buffer.fill(0.0);
        self.write_pos = 0;
        self.smoothed_magnitudes.fill(0.0);
        self.byte_spectrum.fill(0);
        self.total_samples = 0;

        debug!("ByteSpectrumAnalyzer reset");
    }
}
