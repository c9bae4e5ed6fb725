use criterion::{criterion_group, criterion_main, Criterion};
use sonora_core::analysis::{FrequencyAnalysis, FrequencyAnalyzer};
use sonora_core::{ColorScheme, GravityField, RippleField, Surface, Visualizer, VisualizerConfig};

fn gravity_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("GravityField");

    for particles in [4000.0, 20000.0] {
        let mut surface = Surface::new(1280, 720);
        let config = VisualizerConfig::new().with("particleCount", particles);
        let mut gravity = GravityField::with_seed(config, ColorScheme::default(), 1);
        gravity.init(&mut surface);

        group.bench_function(format!("step_{}", particles as usize), |b| {
            b.iter(|| gravity.step(std::hint::black_box(1.0 / 60.0)))
        });

        group.bench_function(format!("render_{}", particles as usize), |b| {
            b.iter(|| {
                surface.begin_frame();
                gravity.render(&mut surface);
            })
        });
    }
    group.finish();
}

fn ripple_benchmark(c: &mut Criterion) {
    let mut surface = Surface::new(1280, 720);
    let mut ripple = RippleField::with_seed(VisualizerConfig::new(), ColorScheme::default(), 1);
    ripple.init(&mut surface);

    let mut t = 0.0;
    c.bench_function("RippleField/update_loud", |b| {
        b.iter(|| {
            let analysis = FrequencyAnalysis {
                bars: vec![255.0; 64],
                bass_avg: 1.0,
                mid_avg: 1.0,
                high_avg: 1.0,
                is_playing: true,
                ..Default::default()
            }
            .with_timestamp(t);
            ripple.update(std::hint::black_box(&analysis));
            t += 1.0 / 60.0;
        })
    });
}

fn analyzer_benchmark(c: &mut Criterion) {
    let analyzer = FrequencyAnalyzer::default();
    let spectrum: Vec<u8> = (0..1024).map(|i| (i % 256) as u8).collect();

    c.bench_function("FrequencyAnalyzer/analyze", |b| {
        b.iter(|| analyzer.analyze(std::hint::black_box(&spectrum), true))
    });
}

criterion_group!(benches, gravity_benchmark, ripple_benchmark, analyzer_benchmark);
criterion_main!(benches);
