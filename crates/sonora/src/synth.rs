//! Synthesized test signal: a four-on-the-floor kick, an off-beat
//! shimmer and a sustained A minor chord.

use std::f32::consts::TAU;

const CHORD_HZ: [f32; 3] = [220.0, 261.63, 329.63];
const SHIMMER_HZ: f32 = 6000.0;

/// Endless PCM generator
pub struct TestSignal {
    sample_rate: f32,
    beat_len: f32,
    position: u64,
}

impl TestSignal {
    /// Create a generator at `bpm`
    pub fn new(sample_rate: u32, bpm: f32) -> Self {
        Self {
            sample_rate: sample_rate as f32,
            beat_len: 60.0 / bpm.max(1.0),
            position: 0,
        }
    }

    /// Next `count` mono samples
    pub fn render(&mut self, count: usize) -> Vec<f32> {
        (0..count)
            .map(|_| {
                let t = self.position as f32 / self.sample_rate;
                self.position += 1;
                self.sample(t)
            })
            .collect()
    }

    /// Advance by `count` samples of silence
    pub fn skip(&mut self, count: usize) -> Vec<f32> {
        self.position += count as u64;
        vec![0.0; count]
    }

    fn sample(&self, t: f32) -> f32 {
        let in_beat = t % self.beat_len;

        // Kick: pitch drops 150 -> 50 Hz, fast decay
        let kick_freq = 50.0 + 100.0 * (-in_beat * 30.0).exp();
        let kick = (TAU * kick_freq * in_beat).sin() * (-in_beat * 12.0).exp() * 0.9;

        let off_beat = (t + self.beat_len / 2.0) % self.beat_len;
        let shimmer = (TAU * SHIMMER_HZ * t).sin() * (-off_beat * 25.0).exp() * 0.2;

        let tremolo = 0.75 + 0.25 * (TAU * 0.5 * t).sin();
        let chord: f32 = CHORD_HZ.iter().map(|f| (TAU * f * t).sin()).sum::<f32>() * 0.06 * tremolo;

        (kick + shimmer + chord).clamp(-1.0, 1.0)
    }
}
