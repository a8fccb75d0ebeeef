use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use jsondiff_benches::available_corpora;
use jsondiff_core::{
    canonicalize, diff_from_values, evaluate, to_nulling, DiffOptions, IgnoreStrategy, Query,
};

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("query-parse");
    for corpus in available_corpora() {
        group.bench_with_input(BenchmarkId::from_parameter(corpus.name()), &corpus.ignore(), |b, source| {
            b.iter(|| black_box(Query::parse(source).expect("query parses")));
        });
    }
    group.finish();
}

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate-nulling");
    for corpus in available_corpora() {
        let dataset = corpus.load().expect("failed to load dataset");
        let query = to_nulling(&Query::parse(corpus.ignore()).expect("query parses"));
        group.throughput(Throughput::Bytes(dataset.fixture_bytes() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(corpus.name()), &dataset, |b, dataset| {
            b.iter(|| black_box(evaluate(&query, dataset.before().clone()).expect("evaluates")));
        });
    }
    group.finish();
}

fn bench_canonicalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("canonicalize");
    for corpus in available_corpora() {
        let dataset = corpus.load().expect("failed to load dataset");
        group.throughput(Throughput::Bytes(dataset.fixture_bytes() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(corpus.name()), &dataset, |b, dataset| {
            b.iter(|| black_box(canonicalize(dataset.before()).expect("serializes")));
        });
    }
    group.finish();
}

fn bench_diff(c: &mut Criterion) {
    let mut group = c.benchmark_group("diff");
    for corpus in available_corpora() {
        let dataset = corpus.load().expect("failed to load dataset");
        let only = Query::parse(corpus.only()).expect("query parses");
        let ignore = Query::parse(corpus.ignore()).expect("query parses");
        let cases = [
            ("all", DiffOptions::default()),
            ("only", DiffOptions::new(Some(only), None)),
            ("ignore-delete", DiffOptions::new(None, Some(ignore.clone()))),
            (
                "ignore-null",
                DiffOptions::new(None, Some(ignore))
                    .with_ignore_strategy(IgnoreStrategy::Nullify)
                    .expect("valid options"),
            ),
        ];
        group.throughput(Throughput::Bytes(dataset.fixture_bytes() as u64));
        for (mode, options) in cases {
            group.bench_function(BenchmarkId::new(corpus.name(), mode), |b| {
                b.iter(|| {
                    let rendered = diff_from_values(dataset.before().clone(), dataset.after().clone(), &options);
                    black_box(rendered.expect("diff succeeds"));
                });
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_parse, bench_evaluate, bench_canonicalize, bench_diff);
criterion_main!(benches);
