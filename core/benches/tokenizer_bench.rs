use beacon_core::tokenizer::tokenize;
use criterion::{criterion_group, criterion_main, Criterion};

const SAMPLE: &str = "A web crawler, sometimes called a spider, is an Internet bot that \
systematically browses the World Wide Web and that is typically operated by search engines \
for the purpose of Web indexing. Web search engines and some other websites use Web crawling \
or spidering software to update their web content or indices of other sites' web content. \
Web crawlers copy pages for processing by a search engine, which indexes the downloaded pages \
so that users can search more efficiently.";

fn bench_tokenize(c: &mut Criterion) {
    let text = SAMPLE.repeat(50);
    c.bench_function("tokenize_crawler_article", |b| b.iter(|| tokenize(&text)));
}

criterion_group!(benches, bench_tokenize);
criterion_main!(benches);
