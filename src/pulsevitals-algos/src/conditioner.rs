use pulsevitals_types::ConditioningConfig;

use crate::RingBuffer;

/// Zero-mean view of the current analysis window, oldest sample first.
#[derive(Debug, Clone, Copy)]
pub struct ConditionedWindow<'a> {
    pub values: &'a [f64],
    pub timestamps: &'a [u64],
}

impl ConditionedWindow<'_> {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Rolling IR window with an incremental moving-average smoother.
///
/// Each pushed sample costs O(1): the smoothing accumulator adds the newest
/// value and subtracts the one leaving the smoothing window. DC removal runs
/// once per analysis pass into scratch buffers sized at construction, leaving
/// the stored raw and smoothed series untouched.
#[derive(Debug, Clone)]
pub struct SignalConditioner {
    raw: RingBuffer<(u64, u32)>,
    smoothed: RingBuffer<f64>,
    smoothing: RingBuffer<u32>,
    smoothing_sum: u64,
    min_samples: usize,
    detrended: Box<[f64]>,
    timestamps: Box<[u64]>,
}

impl SignalConditioner {
    pub fn new(config: &ConditioningConfig) -> Self {
        let capacity = config.analysis_window;
        Self {
            raw: RingBuffer::new(capacity),
            smoothed: RingBuffer::new(capacity),
            smoothing: RingBuffer::new(config.smoothing_window),
            smoothing_sum: 0,
            min_samples: config.smoothing_window + 2,
            detrended: vec![0.0; capacity].into_boxed_slice(),
            timestamps: vec![0; capacity].into_boxed_slice(),
        }
    }

    pub fn push(&mut self, timestamp_ms: u64, ir: u32) {
        let evicted = self.smoothing.push(ir).unwrap_or_default();
        self.smoothing_sum = self.smoothing_sum + u64::from(ir) - u64::from(evicted);
        let average = self.smoothing_sum as f64 / self.smoothing.len() as f64;

        self.raw.push((timestamp_ms, ir));
        self.smoothed.push(average);
    }

    /// Builds the DC-removed series for peak detection. `None` until the
    /// window holds more samples than one smoothing span plus its neighbours.
    pub fn condition(&mut self) -> Option<ConditionedWindow<'_>> {
        let n = self.smoothed.len();
        if n < self.min_samples {
            return None;
        }

        self.smoothed.copy_to(&mut self.detrended);
        for (slot, (timestamp, _)) in self.timestamps.iter_mut().zip(self.raw.iter()) {
            *slot = timestamp;
        }

        let values = &mut self.detrended[..n];
        let mean = values.iter().sum::<f64>() / n as f64;
        for value in values.iter_mut() {
            *value -= mean;
        }

        Some(ConditionedWindow {
            values: &self.detrended[..n],
            timestamps: &self.timestamps[..n],
        })
    }

    pub fn latest_smoothed(&self) -> Option<f64> {
        self.smoothed.newest()
    }

    pub fn raw(&self) -> &RingBuffer<(u64, u32)> {
        &self.raw
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    pub fn reset(&mut self) {
        self.raw.reset();
        self.smoothed.reset();
        self.smoothing.reset();
        self.smoothing_sum = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conditioner() -> SignalConditioner {
        SignalConditioner::new(&ConditioningConfig::default())
    }

    #[test]
    fn too_few_samples_yield_nothing() {
        let mut conditioner = conditioner();
        for i in 0..16 {
            conditioner.push(i * 20, 50_000);
        }
        assert!(conditioner.condition().is_none());
        conditioner.push(16 * 20, 50_000);
        assert!(conditioner.condition().is_some());
    }

    #[test]
    fn smoothing_is_a_trailing_moving_average() {
        let mut conditioner = SignalConditioner::new(&ConditioningConfig {
            analysis_window: 10,
            smoothing_window: 3,
        });
        for (i, value) in [3, 6, 9, 12].into_iter().enumerate() {
            conditioner.push(i as u64, value);
        }
        // (6 + 9 + 12) / 3
        assert_eq!(conditioner.latest_smoothed(), Some(9.0));
    }

    #[test]
    fn partial_smoothing_window_averages_what_it_has() {
        let mut conditioner = conditioner();
        conditioner.push(0, 100);
        conditioner.push(20, 200);
        assert_eq!(conditioner.latest_smoothed(), Some(150.0));
    }

    #[test]
    fn conditioned_window_is_zero_mean_and_ordered() {
        let mut conditioner = conditioner();
        for i in 0..400_u64 {
            let ir = 40_000 + ((i % 40) as u32) * 100;
            conditioner.push(i * 20, ir);
        }
        let window = conditioner.condition().unwrap();
        assert_eq!(window.len(), 250);
        let mean = window.values.iter().sum::<f64>() / window.len() as f64;
        assert!(mean.abs() < 1e-6, "mean should be removed, got {mean}");
        assert_eq!(window.timestamps[0], 150 * 20);
        assert_eq!(window.timestamps[249], 399 * 20);
        assert!(window.timestamps.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn dc_removal_does_not_mutate_stored_series() {
        let mut conditioner = conditioner();
        for i in 0..30 {
            conditioner.push(i * 20, 70_000);
        }
        let before = conditioner.latest_smoothed();
        let _ = conditioner.condition();
        let _ = conditioner.condition();
        assert_eq!(conditioner.latest_smoothed(), before);
        assert_eq!(before, Some(70_000.0));
    }

    #[test]
    fn reset_discards_session() {
        let mut conditioner = conditioner();
        for i in 0..100 {
            conditioner.push(i * 20, 90_000);
        }
        conditioner.reset();
        assert!(conditioner.is_empty());
        assert_eq!(conditioner.latest_smoothed(), None);
        conditioner.push(0, 10);
        assert_eq!(conditioner.latest_smoothed(), Some(10.0));
    }
}
