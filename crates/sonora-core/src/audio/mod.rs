//! Audio front-end
//!
//! - `spectrum`: PCM samples -> byte magnitude spectrum (FFT)
//! - `source`: per-frame `FrequencyAnalysis` provider consumed by the manager

pub mod source;
pub mod spectrum;

pub use source::{AnalysisSource, SpectrumFeed, SpectrumHandle};
pub use spectrum::{ByteSpectrumAnalyzer, SpectrumConfig};
