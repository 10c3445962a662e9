//! Request-path benchmarks
//!
//! Measures the non-I/O work done for every chat completion: request parsing,
//! prompt construction and word counting. The `end_to_end` group drives the
//! full router against the echo backend.
//!
//! Run with: `cargo bench`

use axum::body::Body;
use axum::http::Request;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use llamashim::{
    adapter::{PromptOptions, build_prompt, count_words},
    config::Config,
    handlers::{self, AppState, openai::types::ChatCompletionRequest},
};
use std::hint::black_box;
use std::str::FromStr;
use std::sync::Arc;
use tower::ServiceExt;

fn conversation(turns: usize) -> ChatCompletionRequest {
    let mut builder = ChatCompletionRequest::builder()
        .model("local-llama")
        .system_message("You are a concise assistant that answers in plain English.");
    for i in 0..turns {
        builder = builder
            .user_message(format!("Question {} about ownership and borrowing in Rust?", i))
            .assistant_message(format!("Answer {}: the borrow checker enforces it.", i));
    }
    builder.user_message("Summarize everything so far.").build()
}

/// Benchmark request body parsing
fn bench_request_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("request_parsing");

    for turns in [1, 10, 50] {
        let body = serde_json::to_vec(&conversation(turns)).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(turns), &body, |b, body| {
            b.iter(|| ChatCompletionRequest::from_slice(black_box(body)).unwrap());
        });
    }

    group.finish();
}

/// Benchmark flattening conversations into a prompt
fn bench_prompt_building(c: &mut Criterion) {
    let options = PromptOptions::default();
    let mut group = c.benchmark_group("prompt_building");

    for turns in [1, 10, 50] {
        let request = conversation(turns);
        group.bench_with_input(
            BenchmarkId::from_parameter(turns),
            request.messages(),
            |b, messages| {
                b.iter(|| build_prompt(black_box(messages), &options));
            },
        );
    }

    group.finish();
}

/// Benchmark the whitespace word counter used for usage figures
fn bench_word_count(c: &mut Criterion) {
    let options = PromptOptions::default();
    let mut group = c.benchmark_group("word_count");

    for turns in [1, 10, 50] {
        let prompt = build_prompt(conversation(turns).messages(), &options).into_string();
        group.bench_with_input(BenchmarkId::from_parameter(turns), &prompt, |b, p| {
            b.iter(|| count_words(black_box(p)));
        });
    }

    group.finish();
}

/// Benchmark configuration parsing and validation
///
/// Runs once at startup; included to catch pathological regressions.
fn bench_config_parsing(c: &mut Criterion) {
    let toml_str = r#"
[server]
host = "127.0.0.1"
port = 3000

[models]
served = ["llama-3-8b", "mistral-7b"]

[generation]
backend = "llamacpp"
base_url = "http://localhost:8081"
"#;

    c.bench_function("config_parsing", |b| {
        b.iter(|| Config::from_str(black_box(toml_str)).unwrap());
    });
}

/// Benchmark a full request through the router with the echo backend
fn bench_end_to_end(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let state = AppState::new(Arc::new(Config::default())).unwrap();
    let app = handlers::router(state);
    let body = serde_json::to_string(&conversation(10)).unwrap();

    c.bench_function("end_to_end_echo", |b| {
        b.to_async(&runtime).iter(|| {
            let app = app.clone();
            let body = body.clone();
            async move {
                let request = Request::builder()
                    .method("POST")
                    .uri("/v1/chat/completions")
                    .body(Body::from(body))
                    .unwrap();
                let response = app.oneshot(request).await.unwrap();
                axum::body::to_bytes(response.into_body(), usize::MAX)
                    .await
                    .unwrap()
            }
        });
    });
}

criterion_group!(
    benches,
    bench_request_parsing,
    bench_prompt_building,
    bench_word_count,
    bench_config_parsing,
    bench_end_to_end,
);
criterion_main!(benches);
