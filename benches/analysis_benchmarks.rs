//! Criterion benchmarks for the call-site analysis pipeline.
//!
//! Run with: `cargo bench`
//!
//! Projects are synthetic so results are reproducible across machines.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use callers::analysis::{
    analyze, build_equivalence_set, classify, equivalence_declarations, resolve, verify, AnalysisOptions,
    ClassifyOptions, Query,
};
use callers::model::TsProject;

// ─── Helpers ─────────────────────────────────────────────────────────

/// One interface hierarchy plus `num_files` units, each declaring an
/// implementing class and a consumer that calls through class, interface and
/// an untyped receiver. Every class shares the method name `handle`.
fn synthetic_sources(num_files: usize) -> Vec<(String, String)> {
    let mut sources = vec![(
        "src/contracts.ts".to_string(),
        "export interface Handler { handle(n: number): void; }\n\
         export interface NamedHandler extends Handler { name(): string; }\n"
            .to_string(),
    )];
    for i in 0..num_files {
        let src = format!(
            r#"
export class Service{i} implements NamedHandler {{
    private total = 0;
    handle(n: number) {{ this.total += n; }}
    name() {{ return "service{i}"; }}
    run() {{ this.handle(1); }}
}}
export function consume{i}(s: Service{i}, h: Handler, raw) {{
    s.handle(1);
    h.handle(2);
    raw.handle(3);
    const fn = s.handle;
    fn.call(s, 4);
}}
"#
        );
        sources.push((format!("src/services/service_{i}.ts"), src));
    }
    sources
}

fn build_project(num_files: usize) -> TsProject {
    let sources = synthetic_sources(num_files);
    let borrowed: Vec<(&str, &str)> = sources.iter().map(|(p, s)| (p.as_str(), s.as_str())).collect();
    TsProject::from_sources(&borrowed).unwrap()
}

// ─── Benchmarks ──────────────────────────────────────────────────────

fn bench_project_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("project_build");
    group.sample_size(20);
    for &n in &[10usize, 100] {
        let sources = synthetic_sources(n);
        let borrowed: Vec<(&str, &str)> = sources.iter().map(|(p, s)| (p.as_str(), s.as_str())).collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &borrowed, |b, borrowed| {
            b.iter(|| TsProject::from_sources(black_box(borrowed)).unwrap())
        });
    }
    group.finish();
}

fn bench_equivalence(c: &mut Criterion) {
    let project = build_project(100);
    let decl = resolve(&project, &Query::new("Service42", "handle")).unwrap();
    c.bench_function("build_equivalence_set", |b| {
        b.iter(|| build_equivalence_set(&project, black_box(decl)))
    });
}

fn bench_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify");
    group.sample_size(20);
    for &n in &[10usize, 100] {
        let project = build_project(n);
        let decl = resolve(&project, &Query::new("Service0", "handle")).unwrap();
        let set = build_equivalence_set(&project, decl);
        group.bench_with_input(BenchmarkId::from_parameter(n), &set, |b, set| {
            b.iter(|| classify(&project, black_box(set), &ClassifyOptions::default()).len())
        });
    }
    group.finish();
}

fn bench_verify(c: &mut Criterion) {
    let project = build_project(100);
    let decl = resolve(&project, &Query::new("Service0", "handle")).unwrap();
    let set = build_equivalence_set(&project, decl);
    let decls = equivalence_declarations(&project, &set);
    c.bench_function("verify_100", |b| {
        b.iter(|| {
            let sites = classify(&project, &set, &ClassifyOptions::default());
            verify(&project, black_box(sites), &decls).len()
        })
    });
}

fn bench_analyze(c: &mut Criterion) {
    let project = build_project(100);
    let query = Query::new("Service7", "handle");
    let options = AnalysisOptions { strict: true, tearoff: true, ..Default::default() };
    c.bench_function("analyze_strict_100", |b| {
        b.iter(|| analyze(&project, black_box(&query), &options).unwrap().call_sites.len())
    });
}

criterion_group!(
    benches,
    bench_project_build,
    bench_equivalence,
    bench_classify,
    bench_verify,
    bench_analyze,
);
criterion_main!(benches);
