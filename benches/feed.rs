use chrono::{DateTime, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use stackwatch::{filter_new, EventRenderer, MemorySink, MonitorEvent, PollState, StackEvent};
use stackwatch::telemetry::emit_best_effort;

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

// A full page, newest first, as the event log returns it.
fn page(newest: usize) -> Vec<StackEvent> {
    (0..100)
        .map(|offset| {
            let n = newest - offset;
            StackEvent::new(
                format!("event-{n}"),
                start() + chrono::Duration::milliseconds(n as i64 * 10),
                format!("Resource{}", n % 17),
                "UPDATE_IN_PROGRESS",
            )
            .with_reason("Resource creation Initiated")
        })
        .collect()
}

fn dedup_steady_state(c: &mut Criterion) {
    let cursor = "event-990".to_string();
    let batch = page(1_000);

    c.bench_function("filter_new_10_fresh_of_100", |b| {
        b.iter(|| filter_new(black_box(batch.clone()), Some(cursor.as_str()), start()))
    });

    c.bench_function("poll_state_first_page", |b| {
        b.iter(|| {
            let mut state = PollState::new(start());
            black_box(state.advance(batch.clone()))
        })
    });
}

fn render_rows(c: &mut Criterion) {
    let renderer = EventRenderer::new();
    let batch = page(1_000);

    c.bench_function("render_100_rows", |b| {
        b.iter(|| {
            for event in &batch {
                black_box(renderer.row(event));
            }
        })
    });
}

fn telemetry_emit(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let sink = MemorySink::with_capacity(1_024);

    c.bench_function("emit_best_effort_memory_sink", |b| {
        b.to_async(&rt).iter(|| async {
            emit_best_effort(sink.clone(), MonitorEvent::PollCompleted { new_events: 1 }).await;
        })
    });
}

criterion_group!(benches, dedup_steady_state, render_rows, telemetry_emit);
criterion_main!(benches);
