//! Byte-level send progress for the phase-2 upload body.
//!
//! The file part of the multipart form is fed to the transport as a stream of
//! fixed-size chunks. Every chunk handed over advances a counter, and the
//! caller's callback receives the cumulative percentage.

use std::sync::Arc;

use bytes::Bytes;
use futures_util::stream::{self, Stream, StreamExt};

/// Receives upload progress as a percentage in `[0, 100]`.
pub type ProgressCallback = Arc<dyn Fn(f64) + Send + Sync>;

/// Chunk size used when streaming the file body.
pub const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// `sent / total * 100`, clamped to `[0, 100]`; `None` when `total` is zero.
pub fn percent(sent: u64, total: u64) -> Option<f64> {
    if total == 0 {
        return None;
    }
    Some(((sent as f64 / total as f64) * 100.0).clamp(0.0, 100.0))
}

/// Cumulative byte counter that reports to an optional callback.
pub struct ProgressTracker {
    total: u64,
    sent: u64,
    callback: Option<ProgressCallback>,
}

impl ProgressTracker {
    pub fn new(total: u64, callback: Option<ProgressCallback>) -> Self {
        Self {
            total,
            sent: 0,
            callback,
        }
    }

    /// Record `n` more bytes sent and notify the callback.
    ///
    /// Returns the percentage reported, or `None` when there is no definite
    /// total to report against.
    pub fn advance(&mut self, n: u64) -> Option<f64> {
        self.sent = self.sent.saturating_add(n);
        let pct = percent(self.sent, self.total)?;
        if let Some(cb) = &self.callback {
            cb(pct);
        }
        Some(pct)
    }
}

/// Split `data` into consecutive slices of at most `chunk_size` bytes.
pub fn chunks(data: Bytes, chunk_size: usize) -> impl Iterator<Item = Bytes> + Send + Sync + 'static {
    let chunk_size = chunk_size.max(1);
    let len = data.len();
    (0..len)
        .step_by(chunk_size)
        .map(move |start| data.slice(start..(start + chunk_size).min(len)))
}

/// Stream `data` in chunks, reporting progress as each chunk is polled.
pub fn progress_stream(
    data: Bytes,
    chunk_size: usize,
    callback: Option<ProgressCallback>,
) -> impl Stream<Item = std::io::Result<Bytes>> + Send + Sync + 'static {
    let mut tracker = ProgressTracker::new(data.len() as u64, callback);
    stream::iter(chunks(data, chunk_size)).map(move |chunk| {
        tracker.advance(chunk.len() as u64);
        Ok(chunk)
    })
}
