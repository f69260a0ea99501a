//! Benchmarks for the per-frame counting path

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use repcount_core::{ClientId, FrameTime, JointPoint, KeypointLayout};
use repcount_engine::{ExerciseKind, ExerciseProfile, ProfileTable, RepSession};
use repcount_session::SessionManager;
use repcount_signal::{angle_between, SmoothingWindow};
use repcount_test::MotionScript;

fn bench_angle_between(c: &mut Criterion) {
    let a = JointPoint::new(0.5, 0.9);
    let b = JointPoint::new(0.5, 0.7);
    let d = JointPoint::new(0.7, 0.6);

    c.bench_function("angle_between", |bench| {
        bench.iter(|| angle_between(black_box(a), black_box(b), black_box(d)))
    });
}

fn bench_push_and_smooth(c: &mut Criterion) {
    let mut window = SmoothingWindow::default();

    c.bench_function("push_and_smooth", |b| {
        let mut x = 0.0f32;
        b.iter(|| {
            x = (x + 7.0) % 180.0;
            black_box(window.push_and_smooth(black_box(x)))
        })
    });
}

fn bench_rep_session_advance(c: &mut Criterion) {
    let profile = Arc::new(ExerciseProfile::standard(ExerciseKind::Squat));
    let values: Vec<(FrameTime, f32)> = MotionScript::reps(20).values(&profile);
    let mut session = RepSession::new(profile, 3);

    c.bench_function("rep_session_advance", |b| {
        let mut i = 0usize;
        b.iter(|| {
            let (t, v) = values[i % values.len()];
            i += 1;
            if i % values.len() == 0 {
                session.reset();
            }
            black_box(session.advance(v, t))
        })
    });
}

fn bench_metric_measure(c: &mut Criterion) {
    let profile = ExerciseProfile::standard(ExerciseKind::BicepCurl);
    let frames = MotionScript::reps(1)
        .with_layout(KeypointLayout::Coco17)
        .frames(&profile);

    c.bench_function("metric_measure", |b| {
        let mut i = 0usize;
        b.iter(|| {
            let (_, frame) = &frames[i % frames.len()];
            i += 1;
            black_box(profile.metric.measure(black_box(frame), 0.5))
        })
    });
}

fn bench_process_frame(c: &mut Criterion) {
    let table = Arc::new(ProfileTable::standard());
    let profile = ExerciseProfile::standard(ExerciseKind::Squat);
    let frames = MotionScript::reps(20).frames(&profile);
    let span = frames.last().map(|(t, _)| t.as_micros() + 1).unwrap_or(1);

    let manager = SessionManager::new(table, Default::default());
    let client = ClientId::new("bench");
    let _ = manager.create_session(client.clone(), "squat");

    c.bench_function("session_process_frame", |b| {
        let mut i = 0usize;
        b.iter(|| {
            let (t, frame) = &frames[i % frames.len()];
            // Keep timestamps increasing across laps
            let lap = (i / frames.len()) as i64;
            let now = FrameTime::from_micros(t.as_micros() + lap * span);
            i += 1;
            black_box(manager.process_frame(&client, frame, now))
        })
    });
}

criterion_group!(
    benches,
    bench_angle_between,
    bench_push_and_smooth,
    bench_rep_session_advance,
    bench_metric_measure,
    bench_process_frame,
);
criterion_main!(benches);
