//! Criterion benchmarks for the audit pipeline.
//!
//! - parse: frontmatter and section scanning
//! - detect: rule evaluation on a parsed document
//! - batch: the full pipeline over many documents, sequential and parallel

use std::hint::black_box;
use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

use skill_audit::audit::document::CanonicalSection;
use skill_audit::audit::rules::RuleCatalog;
use skill_audit::audit::{BatchRunner, DocumentInput, detect_gaps, parse_document, parse_text};
use skill_audit::config::FixerConfig;
use skill_audit::test_utils::fixtures::SkillDoc;

fn gappy_document() -> String {
    SkillDoc::compliant()
        .without("author")
        .without("license")
        .set("allowed-tools", "Read, Write, Bash")
        .set("description", "Generate charts from CSV files.")
        .without_section(CanonicalSection::Examples)
        .section(CanonicalSection::Prerequisites, "TBD")
        .render()
}

// =============================================================================
// Parse / detect
// =============================================================================

fn parse_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    for padding in [0usize, 50, 500] {
        let text = SkillDoc::compliant()
            .other_section("Notes", &"Extra notes line.\n".repeat(padding))
            .render();
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::new("lines", padding), &text, |b, text| {
            b.iter(|| parse_document("skills/x/SKILL.md", black_box(text.as_bytes())));
        });
    }
    group.finish();
}

fn detect_benchmarks(c: &mut Criterion) {
    let catalog = RuleCatalog::default();
    let clean = parse_text("skills/x/SKILL.md", &SkillDoc::compliant().render());
    let gappy = parse_text("skills/x/SKILL.md", &gappy_document());

    let mut group = c.benchmark_group("detect");
    group.bench_function("clean", |b| b.iter(|| detect_gaps(black_box(&clean), &catalog)));
    group.bench_function("gappy", |b| b.iter(|| detect_gaps(black_box(&gappy), &catalog)));
    group.finish();
}

// =============================================================================
// Full pipeline
// =============================================================================

fn batch_benchmarks(c: &mut Criterion) {
    let inputs: Vec<DocumentInput> = (0..200)
        .map(|i| {
            let text = if i % 2 == 0 {
                gappy_document()
            } else {
                SkillDoc::compliant().render()
            };
            DocumentInput::new(format!("skills/s{i}/SKILL.md"), text)
        })
        .collect();
    let catalog = Arc::new(RuleCatalog::default());

    let mut group = c.benchmark_group("batch");
    group.throughput(Throughput::Elements(inputs.len() as u64));
    for jobs in [1usize, 0] {
        let runner = BatchRunner::new(Arc::clone(&catalog), FixerConfig::default()).with_jobs(jobs);
        group.bench_with_input(BenchmarkId::new("jobs", jobs), &inputs, |b, inputs| {
            b.iter(|| runner.run(black_box(inputs)));
        });
    }
    group.finish();
}

criterion_group!(benches, parse_benchmarks, detect_benchmarks, batch_benchmarks);
criterion_main!(benches);
