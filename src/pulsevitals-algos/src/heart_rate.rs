use pulsevitals_types::{BpmReading, HeartRateConfig, HeartRateSource, VitalsError};

use crate::{RingBuffer, helpers::median::median_in_place};

/// Turns accepted peak spacing into a median-filtered BPM.
#[derive(Debug, Clone)]
pub struct HeartRateEstimator {
    min_bpm: f64,
    max_bpm: f64,
    history: RingBuffer<f64>,
    instantaneous: Vec<f64>,
    scratch: Box<[f64]>,
}

impl HeartRateEstimator {
    const MS_PER_MINUTE: f64 = 60_000.0;

    /// `max_peaks` bounds the number of peaks one analysis window can yield.
    pub fn new(config: &HeartRateConfig, max_peaks: usize) -> Self {
        Self {
            min_bpm: config.min_bpm,
            max_bpm: config.max_bpm,
            history: RingBuffer::new(config.history_size),
            instantaneous: Vec::with_capacity(max_peaks),
            scratch: vec![0.0; config.history_size].into_boxed_slice(),
        }
    }

    /// Instantaneous BPM for one inter-peak interval, or `None` when the
    /// interval is degenerate or implies a rate outside the clamp.
    pub fn interval_bpm(&self, interval_ms: u64) -> Option<f64> {
        if interval_ms == 0 {
            return None;
        }
        let bpm = Self::MS_PER_MINUTE / interval_ms as f64;
        (self.min_bpm..=self.max_bpm).contains(&bpm).then_some(bpm)
    }

    /// Estimates BPM from one window's accepted peaks.
    ///
    /// A usable window (two or more peaks with at least one in-range
    /// interval) adds its median to the history, and the history median is
    /// reported. Otherwise the previous history median is repeated unchanged,
    /// or `InsufficientData` is returned when there is no history yet.
    pub fn estimate(&mut self, peaks: &[u64]) -> Result<BpmReading, VitalsError> {
        self.instantaneous.clear();
        for pair in peaks.windows(2) {
            if let Some(bpm) = self.interval_bpm(pair[1].saturating_sub(pair[0])) {
                self.instantaneous.push(bpm);
            }
        }

        if let Some(window_bpm) = median_in_place(&mut self.instantaneous) {
            self.history.push(window_bpm);
            let bpm = self.history_median().ok_or(VitalsError::InsufficientData)?;
            return Ok(BpmReading {
                bpm,
                source: HeartRateSource::Measured,
            });
        }

        self.history_median()
            .map(|bpm| BpmReading {
                bpm,
                source: HeartRateSource::Fallback,
            })
            .ok_or(VitalsError::InsufficientData)
    }

    pub fn history_median(&mut self) -> Option<f64> {
        let n = self.history.copy_to(&mut self.scratch);
        median_in_place(&mut self.scratch[..n])
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn reset(&mut self) {
        self.history.reset();
        self.instantaneous.clear();
    }
}
