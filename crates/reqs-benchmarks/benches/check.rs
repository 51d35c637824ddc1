//! Checking benchmarks
//!
//! Lint rules, constraint satisfiability, import scanning and the parallel
//! source audit.

use camino::Utf8Path;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use reqs_benchmarks::{criterion_config, generate_manifest, generate_python_source, write_source_tree};
use reqs_check::audit::scan_imports;
use reqs_check::{is_satisfiable, Checker, ImportAudit};
use reqs_core::{DependencySet, SpecifierSet};
use reqs_manifest::Manifest;
use std::str::FromStr;
use tempfile::tempdir;

fn bench_lint_rules(c: &mut Criterion) {
    let mut group = c.benchmark_group("lint_rules");
    let checker = Checker::default();

    for count in [10, 100, 500, 1000] {
        // duplicate every tenth line so grouping and the solver run
        let mut content = generate_manifest(count);
        for i in (0..count).step_by(10) {
            content.push_str(&format!("package-{}>=1.0\n", i));
        }
        let manifest = match Manifest::parse(&content, "requirements.txt") {
            Ok(manifest) => manifest,
            Err(e) => panic!("generated manifest failed to parse: {}", e),
        };
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("check_manifest", count), &manifest, |b, manifest| {
            b.iter(|| black_box(checker.check_manifest(black_box(manifest))))
        });
    }

    group.finish();
}

fn bench_satisfiability(c: &mut Criterion) {
    let mut group = c.benchmark_group("satisfiability");

    let cases = [
        ("range", ">=1.0,<2.0,!=1.5"),
        ("compatible", "~=1.4.2,>=1.4.5,!=1.4.*"),
        ("pins", "==1.0.0,==1.0,>=0.9"),
        ("wildcards", "==2.*,!=2.3.*,<2.4,>=2.1"),
        ("empty", ">=3.0,<2.0"),
    ];

    for (name, text) in cases {
        let set = match SpecifierSet::from_str(text) {
            Ok(set) => set,
            Err(e) => panic!("invalid benchmark specifier {}: {}", text, e),
        };
        group.bench_with_input(BenchmarkId::new("is_satisfiable", name), &set, |b, set| {
            b.iter(|| black_box(is_satisfiable(black_box(set))))
        });
    }

    group.finish();
}

fn bench_import_scanning(c: &mut Criterion) {
    let mut group = c.benchmark_group("import_scanning");

    for imports in [10, 100, 1000] {
        let source = generate_python_source(imports);
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::new("scan_imports", imports), &source, |b, source| {
            b.iter(|| black_box(scan_imports(black_box(source))))
        });
    }

    group.finish();
}

fn bench_source_audit(c: &mut Criterion) {
    let mut group = c.benchmark_group("source_audit");
    group.sample_size(20);

    let declared = match Manifest::parse(&generate_manifest(100), "requirements.txt")
        .and_then(|manifest| manifest.dependency_set())
    {
        Ok(set) => set,
        Err(e) => panic!("generated manifest failed to parse: {}", e),
    };

    for files in [10, 100, 500] {
        let dir = match tempdir() {
            Ok(dir) => dir,
            Err(e) => panic!("failed to create temp dir: {}", e),
        };
        let root = match Utf8Path::from_path(dir.path()) {
            Some(root) => root.to_path_buf(),
            None => panic!("temp dir is not valid UTF-8"),
        };
        if let Err(e) = write_source_tree(&root, files, 50) {
            panic!("failed to write sources: {}", e);
        }

        let audit = ImportAudit::new(vec![root.into_std_path_buf()]);
        group.throughput(Throughput::Elements(files as u64));
        group.bench_with_input(BenchmarkId::new("run", files), &declared, |b, declared: &DependencySet| {
            b.iter(|| black_box(audit.run(declared)))
        });
    }

    group.finish();
}

criterion_group! {
    name = benches;
    config = criterion_config();
    targets = bench_lint_rules, bench_satisfiability, bench_import_scanning, bench_source_audit
}
criterion_main!(benches);
