//! Benchmarks for reshaping Reddit payloads into MCP output

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use mcp_reddit::reddit::{parse_comments, parse_listing};
use serde_json::{json, Value};

fn post_child(i: usize) -> Value {
    json!({"kind": "t3", "data": {
        "id": format!("p{}", i),
        "title": format!("Post number {} about something interesting", i),
        "permalink": format!("/r/bench/comments/p{}/post_number_{}/", i, i),
        "url": "https://example.com/image.png",
        "author": format!("user{}", i % 17),
        "subreddit": "bench",
        "score": i * 3,
        "num_comments": i % 50,
        "over_18": false,
        "created_utc": 1_700_000_000.0 + i as f64
    }})
}

fn listing(n: usize) -> Value {
    let children: Vec<Value> = (0..n).map(post_child).collect();
    json!({"kind": "Listing", "data": {"children": children}})
}

fn comments_payload(n: usize) -> Value {
    let mut children: Vec<Value> = (0..n)
        .map(|i| {
            json!({"kind": "t1", "data": {
                "author": format!("commenter{}", i % 23),
                "body": "This is a reasonably sized comment body used for benchmarking.",
                "score": i as i64 - 5,
                "created_utc": 1_700_000_500.0 + i as f64,
                "replies": ""
            }})
        })
        .collect();
    children.push(json!({"kind": "more", "data": {"count": 40, "children": ["x1", "x2"]}}));

    json!([
        {"kind": "Listing", "data": {"children": [post_child(0)]}},
        {"kind": "Listing", "data": {"children": children}}
    ])
}

fn bench_parse_listing(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_listing");

    for size in [10, 25, 100] {
        let payload = listing(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("posts", size), &payload, |b, payload| {
            b.iter(|| parse_listing(black_box(payload.clone())).unwrap())
        });
    }

    group.finish();
}

fn bench_parse_comments(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_comments");

    for size in [10, 100, 500] {
        let payload = comments_payload(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("comments", size), &payload, |b, payload| {
            b.iter(|| parse_comments(black_box(payload.clone())).unwrap())
        });
    }

    group.finish();
}

fn bench_serialize_output(c: &mut Criterion) {
    let posts = parse_listing(listing(100)).unwrap();

    c.bench_function("serialize_100_posts", |b| {
        b.iter(|| serde_json::to_string_pretty(black_box(&posts)).unwrap())
    });
}

criterion_group!(
    benches,
    bench_parse_listing,
    bench_parse_comments,
    bench_serialize_output
);
criterion_main!(benches);
