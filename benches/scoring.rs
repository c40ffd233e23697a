use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dice10k::games::{has_scoring_dice, score, simulate, Die, SimulationConfig};
use dice10k::GameConfig;

fn dice(faces: &[u8]) -> Vec<Die> {
    faces.iter().filter_map(|&f| Die::new(f)).collect()
}

fn bench_scoring(c: &mut Criterion) {
    let hands = [
        dice(&[1, 1, 1, 5, 2, 3]),
        dice(&[1, 2, 3, 4, 5, 6]),
        dice(&[4, 4, 4, 4, 4, 4]),
        dice(&[2, 3, 4, 6, 6, 2]),
    ];

    c.bench_function("score", |b| {
        b.iter(|| {
            for hand in &hands {
                black_box(score(black_box(hand)));
            }
        })
    });

    c.bench_function("has_scoring_dice", |b| {
        b.iter(|| {
            for hand in &hands {
                black_box(has_scoring_dice(black_box(hand)));
            }
        })
    });
}

fn bench_simulation(c: &mut Criterion) {
    let config = GameConfig::default();
    c.bench_function("simulate_100_rounds", |b| {
        b.iter(|| {
            simulate(
                &config,
                SimulationConfig {
                    rounds: 100,
                    ..Default::default()
                },
            )
        })
    });
}

criterion_group!(benches, bench_scoring, bench_simulation);
criterion_main!(benches);
