use bencher::{request_fixtures, Fixture};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use micro_h1::codec::{Code, RequestReader, Token, TokenReader};
use std::hint::black_box;

/// Feeds `input` in windows of `step` bytes and counts the data-bearing tokens.
fn tokenize(reader: &mut RequestReader, input: &[u8], step: usize) -> usize {
    let mut buffer = Vec::with_capacity(input.len());
    let mut fed = 0;
    let mut tokens_seen = 0;

    loop {
        let end = (fed + step).min(input.len());
        buffer.extend_from_slice(&input[fed..end]);
        fed = end;

        let mut tokens = reader.set_buffer(&mut buffer);
        loop {
            match tokens.code() {
                Code::Insufficient => break,
                Code::Error(e) => panic!("fixture should be valid: {e}"),
                Code::EndOfMessage => return tokens_seen,
                _ => {
                    if !matches!(tokens.token(), Some(Token::Skip) | None) {
                        tokens_seen += 1;
                    }
                }
            }
            tokens.next();
        }
        let parsed = tokens.parsed_count();
        buffer.drain(..parsed);
    }
}

fn bench_fixture(criterion: &mut Criterion, group_name: &str, step: Option<usize>) {
    let mut group = criterion.benchmark_group(group_name);

    for fixture in request_fixtures() {
        group.throughput(Throughput::Bytes(fixture.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(fixture.name()), &fixture, |b, fixture: &Fixture| {
            let step = step.unwrap_or(fixture.len());
            b.iter(|| {
                let mut reader = RequestReader::new();
                black_box(tokenize(&mut reader, black_box(fixture.content()), step))
            });
        });
    }

    group.finish();
}

fn benchmark_reader(criterion: &mut Criterion) {
    bench_fixture(criterion, "reader_whole", None);
    bench_fixture(criterion, "reader_16_byte_windows", Some(16));
}

criterion_group!(reader, benchmark_reader);
criterion_main!(reader);
