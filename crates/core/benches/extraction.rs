use clearly_core::{Clearly, ClearlyConfig, Document, Extractor, SiteConfigMap, SiteRule, parse, preprocess};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

fn fixture(name: &str) -> String {
    std::fs::read_to_string(format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)).unwrap()
}

fn bench_parse(c: &mut Criterion) {
    let small = fixture("cyrillic.html");
    let medium = fixture("article.html");
    let large = medium.replace("<body>", &format!("<body>{}", "<div><p>Filler text, repeated.</p></div>".repeat(2000)));

    let mut group = c.benchmark_group("parse");

    group.bench_with_input(BenchmarkId::new("small", "2KB"), &small, |b, html| {
        b.iter(|| Document::parse(black_box(html)))
    });

    group.bench_with_input(BenchmarkId::new("medium", "6KB"), &medium, |b, html| {
        b.iter(|| Document::parse(black_box(html)))
    });

    group.bench_with_input(BenchmarkId::new("large", "80KB"), &large, |b, html| {
        b.iter(|| Document::parse(black_box(html)))
    });

    group.finish();
}

fn bench_full_extraction(c: &mut Criterion) {
    let html = fixture("article.html");

    c.bench_function("full_extraction", |b| b.iter(|| parse(black_box(&html))));
}

fn bench_site_config(c: &mut Criterion) {
    let html = fixture("github_issue.html");
    let sites = SiteConfigMap::from_json(&fixture("siteconfig.json")).unwrap();
    let reader = Clearly::new().with_site_config(sites);

    c.bench_function("site_config_extraction", |b| {
        b.iter(|| reader.parse_with_url(black_box(&html), "https://github.com/acme/widget/issues/12"))
    });
}

fn bench_preprocess(c: &mut Criterion) {
    let doc = Document::parse(&fixture("article.html")).unwrap();
    let rule = SiteRule::default();

    c.bench_function("preprocess", |b| {
        b.iter(|| {
            let mut copy = doc.clone();
            preprocess::prepare_document(black_box(&mut copy), &rule)
        })
    });
}

fn bench_scoring(c: &mut Criterion) {
    let mut doc = Document::parse(&fixture("article.html")).unwrap();
    let rule = SiteRule::default();
    preprocess::prepare_document(&mut doc, &rule);
    let config = ClearlyConfig::default();
    let title = doc.extract_metadata().title;

    c.bench_function("scoring_and_selection", |b| {
        b.iter(|| Extractor::new(&config, &rule, &title).extract(black_box(&doc)))
    });
}

criterion_group!(
    benches,
    bench_parse,
    bench_full_extraction,
    bench_site_config,
    bench_preprocess,
    bench_scoring
);
criterion_main!(benches);
