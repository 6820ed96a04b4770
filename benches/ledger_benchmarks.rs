use criterion::{Criterion, black_box, criterion_group, criterion_main};

use spelldrill::engine::boss::select_encounter;
use spelldrill::engine::ledger::{MemoryLedgerStore, MistakeCounts, MistakeLedger};
use spelldrill::engine::word::Word;

fn make_ledger(entries: usize) -> MistakeLedger {
    let counts: MistakeCounts = (0..entries)
        .filter_map(|i| Word::parse(&format!("word{i:05}")).map(|w| (w, (i % 37) as u32)))
        .collect();
    MistakeLedger::open(Box::new(MemoryLedgerStore::with_counts(counts)))
}

fn bench_top_misses(c: &mut Criterion) {
    let ledger = make_ledger(5_000);

    c.bench_function("top_misses (12 of 5000)", |b| {
        b.iter(|| ledger.top_misses(black_box(12)))
    });
}

fn bench_select_encounter(c: &mut Criterion) {
    let ledger = make_ledger(5_000);
    let words = ledger.top_misses(12);

    c.bench_function("select_encounter (12 words)", |b| {
        b.iter(|| select_encounter(black_box(&words), &ledger))
    });
}

fn bench_increment(c: &mut Criterion) {
    let word = Word::parse("rhythm").unwrap();

    c.bench_function("increment (500-entry ledger, memory store)", |b| {
        let mut ledger = make_ledger(500);
        b.iter(|| ledger.increment(black_box(&word)))
    });
}

criterion_group!(
    benches,
    bench_top_misses,
    bench_select_encounter,
    bench_increment
);
criterion_main!(benches);
