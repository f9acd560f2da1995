//! Fuzz target for progress tracker signal handling
//!
//! The counter must never decrease and the callback must see every signal.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use r2index_progress::{NullReporter, ProgressTracker, SignalMode};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Arbitrary)]
struct SignalInput {
    cumulative: bool,
    total: Option<u64>,
    log_every_signal: bool,
    values: Vec<u64>,
}

fuzz_target!(|input: SignalInput| {
    let mode = if input.cumulative {
        SignalMode::Cumulative
    } else {
        SignalMode::Incremental
    };
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);

    let tracker = ProgressTracker::new("Fuzzing", mode)
        .with_total(input.total)
        .with_interval(input.log_every_signal.then_some(Duration::ZERO))
        .with_reporter(NullReporter)
        .with_callback(move |n: u64| sink.lock().unwrap().push(n));

    let mut previous = 0;
    for &value in &input.values {
        tracker.on_signal(value);
        let now = tracker.bytes_transferred();
        assert!(now >= previous);
        previous = now;
    }
    tracker.finish();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), input.values.len());
    assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    // Snapshot rendering must cope with any total, including zero.
    let _ = tracker.snapshot().to_string();
});
