//! User progress callback capability.

use std::sync::{Arc, mpsc};

/// Receives the cumulative byte count after every signal
///
/// Invocations are not serialized: with a multipart backend the callback may
/// run concurrently on several worker threads. Implemented for closures,
/// `Arc`s of callbacks, and the sending halves of std and tokio channels.
pub trait ProgressCallback: Send + Sync {
    /// Called with the total bytes transferred so far
    fn on_bytes(&self, cumulative: u64);
}

impl<F> ProgressCallback for F
where
    F: Fn(u64) + Send + Sync,
{
    fn on_bytes(&self, cumulative: u64) {
        self(cumulative);
    }
}

impl<T: ProgressCallback + ?Sized> ProgressCallback for Arc<T> {
    fn on_bytes(&self, cumulative: u64) {
        (**self).on_bytes(cumulative);
    }
}

impl ProgressCallback for mpsc::Sender<u64> {
    fn on_bytes(&self, cumulative: u64) {
        // A dropped receiver only means nobody is listening any more.
        let _ = self.send(cumulative);
    }
}

impl ProgressCallback for tokio::sync::mpsc::UnboundedSender<u64> {
    fn on_bytes(&self, cumulative: u64) {
        let _ = self.send(cumulative);
    }
}
