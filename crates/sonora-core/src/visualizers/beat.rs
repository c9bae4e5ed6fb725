//! Energy-over-baseline beat detection

/// Baseline decay per frame
pub const BASELINE_DECAY: f32 = 0.93;
/// Energy below this never counts as a beat
pub const MIN_BEAT_ENERGY: f32 = 0.05;
/// Multiplier gain per unit of beat energy
pub const BEAT_PULSE: f32 = 1.5;
/// Per-frame decay of the pulse toward 1
pub const PULSE_DECAY: f32 = 0.9;

/// Bass-weighted blend of the three band averages
pub fn beat_energy(bass: f32, mid: f32, high: f32) -> f32 {
    bass * 0.6 + mid * 0.3 + high * 0.1
}

/// Running beat detector with a hard cooldown gate
#[derive(Debug, Clone)]
pub struct BeatDetector {
    baseline: f32,
    last_beat: Option<f64>,
    multiplier: f32,
    beats_detected: u64,
}

impl Default for BeatDetector {
    fn default() -> Self {
        Self {
            baseline: 0.0,
            last_beat: None,
            multiplier: 1.0,
            beats_detected: 0,
        }
    }
}

impl BeatDetector {
    /// Create a detector with an empty baseline
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one frame. Returns the beat energy when a beat fires.
    ///
    /// The threshold test uses the baseline from before this frame.
    pub fn process(
        &mut self,
        energy: f32,
        now: f64,
        sensitivity: f32,
        cooldown_secs: f64,
    ) -> Option<f32> {
        let energy = if energy.is_finite() { energy.max(0.0) } else { 0.0 };

        // Decay any previous pulse first so a fresh beat starts at full height
        self.multiplier = 1.0 + (self.multiplier - 1.0) * PULSE_DECAY;

        let cooled = self
            .last_beat
            .map_or(true, |last| now - last >= cooldown_secs);
        let is_beat =
            energy > MIN_BEAT_ENERGY && energy > self.baseline * sensitivity && cooled;

        self.baseline = self.baseline * BASELINE_DECAY + energy * (1.0 - BASELINE_DECAY);

        if !is_beat {
            return None;
        }

        self.last_beat = Some(now);
        self.multiplier = 1.0 + energy * BEAT_PULSE;
        self.beats_detected += 1;
        tracing::trace!("beat: energy={:.3} baseline={:.3}", energy, self.baseline);
        Some(energy)
    }

    /// Current transient multiplier (1.0 at rest)
    pub fn multiplier(&self) -> f32 {
        self.multiplier
    }

    /// Running energy baseline
    pub fn baseline(&self) -> f32 {
        self.baseline
    }

    /// Beats fired since creation or reset
    pub fn beats_detected(&self) -> u64 {
        self.beats_detected
    }

    /// Forget history
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
