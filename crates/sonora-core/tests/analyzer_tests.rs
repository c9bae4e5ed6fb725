use proptest::prelude::*;
use sonora_core::analysis::{AnalyzerConfig, FrequencyAnalyzer};
use sonora_core::audio::{ByteSpectrumAnalyzer, SpectrumConfig};
use std::collections::HashSet;

fn spectrum() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..2048)
}

proptest! {
    #[test]
    fn bar_count_is_always_configured(raw in spectrum(), bars in 1usize..256) {
        let analyzer = FrequencyAnalyzer::new(AnalyzerConfig {
            bar_count: bars,
            ..Default::default()
        });
        let analysis = analyzer.analyze(&raw, true);
        prop_assert_eq!(analysis.bars.len(), bars);
        prop_assert!(analysis.bars.iter().all(|&b| (0.0..=255.0).contains(&b)));
    }

    #[test]
    fn band_averages_are_bounded(raw in spectrum()) {
        let analysis = FrequencyAnalyzer::default().analyze(&raw, false);
        for value in [analysis.bass_avg, analysis.mid_avg, analysis.high_avg] {
            prop_assert!(!value.is_nan());
            prop_assert!((0.0..=1.0).contains(&value));
        }
        prop_assert!((0.0..=1.0).contains(&analysis.normalized_frequency));
    }

    #[test]
    fn bars_ignore_unselected_bins(
        raw in prop::collection::vec(any::<u8>(), 1024),
        noise in any::<u8>(),
    ) {
        let analyzer = FrequencyAnalyzer::default();
        let selected: HashSet<usize> = analyzer.bar_bins().iter().copied().collect();

        let mut other = raw.clone();
        for (i, v) in other.iter_mut().enumerate() {
            if !selected.contains(&i) {
                *v = noise;
            }
        }

        prop_assert_eq!(analyzer.analyze(&raw, true).bars, analyzer.analyze(&other, true).bars);
    }

    #[test]
    fn byte_spectrum_survives_any_input(samples in prop::collection::vec(any::<f32>(), 0..4096)) {
        let mut analyzer = ByteSpectrumAnalyzer::new(SpectrumConfig::default());
        analyzer.push_samples(&samples);
        prop_assert_eq!(analyzer.compute().len(), 1024);
    }
}

#[test]
fn test_sine_lands_in_matching_band() {
    let config = SpectrumConfig {
        smoothing_time_constant: 0.0,
        ..Default::default()
    };
    let mut spectrum = ByteSpectrumAnalyzer::new(config);
    let samples: Vec<f32> = (0..2048)
        .map(|i| (2.0 * std::f32::consts::PI * 100.0 * i as f32 / 44100.0).sin() * 0.8)
        .collect();
    spectrum.push_samples(&samples);

    let analyzer = FrequencyAnalyzer::new(config.analyzer_config(64));
    let analysis = analyzer.analyze(spectrum.compute(), true);

    assert!(analysis.bass_avg > analysis.mid_avg);
    assert!(analysis.bass_avg > analysis.high_avg);
}
