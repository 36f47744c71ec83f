use std::collections::VecDeque;

use pulsevitals_types::{Sample, VitalsError};

use crate::SampleSource;

/// In-memory queue, filled by the caller between ticks.
#[derive(Debug, Default)]
pub struct ManualSource {
    queue: VecDeque<Sample>,
}

impl ManualSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sample: Sample) {
        self.queue.push_back(sample);
    }

    pub fn extend(&mut self, samples: impl IntoIterator<Item = Sample>) {
        self.queue.extend(samples);
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl SampleSource for ManualSource {
    fn drain(&mut self, out: &mut Vec<Sample>) -> Result<usize, VitalsError> {
        let count = self.queue.len();
        out.extend(self.queue.drain(..));
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_takes_everything_in_order() {
        let mut source = ManualSource::new();
        source.extend((0..5).map(|i| Sample::new(i, i * 2, u64::from(i) * 20)));

        let mut out = Vec::new();
        assert_eq!(source.drain(&mut out), Ok(5));
        assert!(source.is_empty());
        assert_eq!(out[4], Sample::new(4, 8, 80));

        assert_eq!(source.drain(&mut out), Ok(0));
        assert_eq!(out.len(), 5);
    }
}
