//! Built-in visualizers
//!
//! - `gravity`: gravitational particle field with beat detection
//! - `ripple`: expanding rings spawned per frequency band
//! - `bars`: classic spectrum bars

pub mod bars;
pub mod beat;
pub mod gravity;
pub mod layout;
pub mod ripple;

pub use bars::{SpectrumBars, BARS_ID};
pub use beat::BeatDetector;
pub use gravity::{GravityField, GravityParams, GRAVITY_ID};
pub use layout::LayoutMode;
pub use ripple::{RippleField, RippleParams, RIPPLE_ID};
