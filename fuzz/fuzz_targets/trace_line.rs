#![no_main]

use libfuzzer_sys::fuzz_target;
use repcount_runtime::{pose_frame, TraceEvent};

fuzz_target!(|data: &[u8]| {
    let Ok(line) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(Some(TraceEvent::Frame { layout, keypoints, .. })) = TraceEvent::parse_line(1, line) {
        let frame = pose_frame(layout, &keypoints);
        assert_eq!(frame.keypoints.len(), keypoints.len());
    }
});
