//! Lossy progress reporting
//!
//! Progress events flow through a bounded channel with `try_send`; when the
//! observer falls behind, events are dropped rather than stalling the
//! computation.

use crossbeam::channel::{bounded, Receiver, Sender, TrySendError};

/// A (current, total) progress pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub current: usize,
    pub total: usize,
}

/// Receiving end of the progress stream.
pub type ProgressReceiver = Receiver<Progress>;

/// Fire-and-forget sender of progress events.
#[derive(Debug, Clone)]
pub struct ProgressSender {
    tx: Sender<Progress>,
}

impl ProgressSender {
    /// A bounded progress channel; `capacity` events are buffered before
    /// dropping begins.
    pub fn channel(capacity: usize) -> (Self, ProgressReceiver) {
        let (tx, rx) = bounded(capacity);
        (Self { tx }, rx)
    }

    /// Send an event, dropping it if the buffer is full or the receiver is
    /// gone.
    pub fn send(&self, current: usize, total: usize) {
        match self.tx.try_send(Progress { current, total }) {
            Ok(()) | Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {}
        }
    }
}
