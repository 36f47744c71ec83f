use pulsevitals_codec::{CodecError, decode_capture};
use pulsevitals_types::{Sample, VitalsError};

use crate::{ClockedSource, SampleSource};

/// Replays a decoded capture against an external clock.
#[derive(Debug)]
pub struct CaptureSource {
    samples: Vec<Sample>,
    cursor: usize,
    horizon_ms: u64,
}

impl CaptureSource {
    pub fn new(samples: Vec<Sample>) -> Self {
        Self {
            samples,
            cursor: 0,
            horizon_ms: 0,
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        Ok(Self::new(decode_capture(bytes)?))
    }

    /// Timestamp of the first recorded sample.
    pub fn start_ms(&self) -> Option<u64> {
        self.samples.first().map(|s| s.timestamp_ms)
    }

    pub fn end_ms(&self) -> Option<u64> {
        self.samples.last().map(|s| s.timestamp_ms)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl SampleSource for CaptureSource {
    fn drain(&mut self, out: &mut Vec<Sample>) -> Result<usize, VitalsError> {
        let pending = &self.samples[self.cursor..];
        let count = pending
            .iter()
            .position(|s| s.timestamp_ms > self.horizon_ms)
            .unwrap_or(pending.len());

        out.extend_from_slice(&pending[..count]);
        self.cursor += count;
        Ok(count)
    }
}

impl ClockedSource for CaptureSource {
    fn advance_to(&mut self, now_ms: u64) {
        self.horizon_ms = self.horizon_ms.max(now_ms);
    }

    fn is_exhausted(&self) -> bool {
        self.cursor >= self.samples.len()
    }
}
