use pulsevitals_types::{Sample, VitalsError};

use crate::{ClockedSource, SampleSource};

/// Tees every drained sample into memory so a session can be written out as
/// a capture afterwards.
#[derive(Debug)]
pub struct Recorder<S> {
    inner: S,
    samples: Vec<Sample>,
    enabled: bool,
}

impl<S> Recorder<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            samples: Vec::new(),
            enabled: true,
        }
    }

    /// Forwards samples without keeping them.
    pub fn passthrough(inner: S) -> Self {
        Self {
            enabled: false,
            ..Self::new(inner)
        }
    }

    pub fn is_recording(&self) -> bool {
        self.enabled
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.inner
    }
}

impl<S: SampleSource> SampleSource for Recorder<S> {
    fn drain(&mut self, out: &mut Vec<Sample>) -> Result<usize, VitalsError> {
        let start = out.len();
        let count = self.inner.drain(out)?;
        if self.enabled {
            self.samples.extend_from_slice(&out[start..]);
        }
        Ok(count)
    }
}

impl<S: ClockedSource> ClockedSource for Recorder<S> {
    fn advance_to(&mut self, now_ms: u64) {
        self.inner.advance_to(now_ms);
    }

    fn is_exhausted(&self) -> bool {
        self.inner.is_exhausted()
    }
}
