#![no_main]

use std::sync::Arc;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use repcount_core::FrameTime;
use repcount_engine::{ExerciseKind, ExerciseProfile, Measurement, RepSession};

#[derive(Debug, Arbitrary)]
struct Input {
    kind: u8,
    window: u8,
    steps: Vec<(f32, u16)>,
}

fuzz_target!(|input: Input| {
    let kinds = ExerciseKind::all();
    let kind = kinds[input.kind as usize % kinds.len()];
    let profile = Arc::new(ExerciseProfile::standard(kind));
    let interval = profile.min_rep_interval;
    let mut session = RepSession::new(profile, input.window as usize % 8);

    let mut now = FrameTime::ZERO;
    let mut last_count: Option<FrameTime> = None;
    let mut count = 0;

    for (value, dt_ms) in input.steps {
        now = now + std::time::Duration::from_millis(dt_ms as u64);
        let observation = session.observe(Measurement::Value(value), now);

        assert!(session.count() >= count);
        if observation.rep_completed() {
            if let Some(prev) = last_count {
                assert!(now - prev >= interval);
            }
            last_count = Some(now);
        }
        count = session.count();
    }
});
