// Copyright (c) 2026 Bountyy Oy. All rights reserved.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use teapot::cookie::{Cookie, Jar};
use url::Url;

fn cookies() -> Vec<Cookie> {
    vec![
        Cookie::new("session", "abc123").path("/"),
        Cookie::new("user id", "42").path("/"),
        Cookie::new("pref(theme)", "dark").path("/"),
        Cookie::new("csrf_token", "f00dfeed").path("/").secure(true),
    ]
}

fn set_cookies_benchmark(c: &mut Criterion) {
    let target = Url::parse("https://example.com/account").unwrap();

    let lenient = Jar::new();
    c.bench_function("jar_set_cookies_lenient", |b| {
        b.iter(|| lenient.set_cookies(black_box(&target), cookies()))
    });

    let strict = Jar::builder().strict().build();
    c.bench_function("jar_set_cookies_strict", |b| {
        b.iter(|| strict.set_cookies(black_box(&target), cookies()))
    });
}

fn cookies_benchmark(c: &mut Criterion) {
    let target = Url::parse("https://example.com/account").unwrap();

    let lenient = Jar::new();
    lenient.set_cookies(&target, cookies());
    c.bench_function("jar_cookies_lenient", |b| {
        b.iter(|| black_box(lenient.cookies(black_box(&target))))
    });

    let strict = Jar::builder().strict().build();
    strict.set_cookies(&target, cookies());
    c.bench_function("jar_cookies_strict", |b| {
        b.iter(|| black_box(strict.cookies(black_box(&target))))
    });
}

criterion_group!(benches, set_cookies_benchmark, cookies_benchmark);
criterion_main!(benches);
