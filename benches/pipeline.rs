//! Pipeline benchmark: trace replay → raw session → feature extraction.

use behavior_gate::collectors::{Collector, InteractionEvent, RegionId, ScriptedSource, TargetHandle, TraceEntry, Viewport};
use behavior_gate::config::{CollectorConfig, FeaturesConfig};
use behavior_gate::features::FeatureExtractor;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn make_dummy_trace(n: usize) -> Vec<TraceEntry> {
    let region = Some(RegionId(1));
    (0..n)
        .flat_map(|i| {
            let at = (i as i64) * 40;
            let key = char::from(b'a' + (i % 26) as u8).to_string();
            [
                InteractionEvent::PointerMove {
                    x: Some((i * 7 % 1280) as f64),
                    y: Some((i * 13 % 720) as f64),
                    at,
                },
                InteractionEvent::KeyDown { key: key.clone(), at: at + 5 },
                InteractionEvent::KeyUp { key, at: at + 30 },
                InteractionEvent::FocusIn {
                    target: TargetHandle((i % 3) as u64),
                    at: at + 35,
                },
            ]
        })
        .map(|event| TraceEntry { region, event })
        .collect()
}

fn bench_feature_extraction(c: &mut Criterion) {
    let trace = make_dummy_trace(250);
    let mut source = ScriptedSource::new(Viewport::new(1280.0, 720.0));
    let mut collector = Collector::new(CollectorConfig::default(), 0);
    collector.attach(&mut source, Some(RegionId(1)));
    source.replay(&trace);
    let session = collector.snapshot();
    let extractor = FeatureExtractor::new(FeaturesConfig::default());

    c.bench_function("feature_extract_1000_events", |b| {
        b.iter(|| black_box(extractor.extract(black_box(&session), "bench", 10_000)))
    });
}

fn bench_trace_replay(c: &mut Criterion) {
    let trace = make_dummy_trace(250);

    c.bench_function("collector_replay_1000_events", |b| {
        b.iter(|| {
            let mut source = ScriptedSource::new(Viewport::new(1280.0, 720.0));
            let mut collector = Collector::new(CollectorConfig::default(), 0);
            collector.attach(&mut source, Some(RegionId(1)));
            source.replay(black_box(&trace));
            black_box(collector.snapshot())
        })
    });
}

fn bench_full_pipeline(c: &mut Criterion) {
    let trace = make_dummy_trace(250);
    let extractor = FeatureExtractor::new(FeaturesConfig::default());

    c.bench_function("full_pipeline_replay_to_features", |b| {
        b.iter(|| {
            let mut source = ScriptedSource::new(Viewport::new(1280.0, 720.0));
            let mut collector = Collector::new(CollectorConfig::default(), 0);
            collector.attach(&mut source, Some(RegionId(1)));
            source.replay(&trace);
            collector.track_request(10_000);
            black_box(collector.extract(&extractor, "bench", 10_000))
        })
    });
}

criterion_group!(
    benches,
    bench_feature_extraction,
    bench_trace_replay,
    bench_full_pipeline
);
criterion_main!(benches);
