use pulsevitals_types::WaveformConfig;

use crate::RingBuffer;

/// Display scaling for the raw IR trace.
///
/// Extremes are widened in O(1) per sample. Narrowing needs a scan, because
/// nothing tells the running max that its sample has left the ring, so the
/// whole ring is rescanned every `rescan_interval` samples.
#[derive(Debug, Clone)]
pub struct WaveformNormalizer {
    samples: RingBuffer<u32>,
    min: u32,
    max: u32,
    since_rescan: usize,
    rescan_interval: usize,
}

impl WaveformNormalizer {
    const MIDPOINT: f32 = 0.5;

    pub fn new(config: &WaveformConfig) -> Self {
        Self {
            samples: RingBuffer::new(config.width),
            min: u32::MAX,
            max: 0,
            since_rescan: 0,
            rescan_interval: config.rescan_interval,
        }
    }

    pub fn push(&mut self, ir: u32) {
        self.samples.push(ir);
        self.min = self.min.min(ir);
        self.max = self.max.max(ir);

        self.since_rescan += 1;
        if self.since_rescan >= self.rescan_interval {
            self.since_rescan = 0;
            self.rescan();
        }
    }

    fn rescan(&mut self) {
        let (min, max) = self
            .samples
            .iter()
            .fold((u32::MAX, 0), |(min, max), v| (min.min(v), max.max(v)));
        self.min = min;
        self.max = max;
    }

    /// Maps `sample` into `[0, 1]` using the current extremes. A flat (or
    /// empty) range maps everything to the midpoint.
    pub fn normalize(&self, sample: u32) -> f32 {
        if self.min >= self.max {
            return Self::MIDPOINT;
        }
        let range = f64::from(self.max - self.min);
        let offset = f64::from(sample) - f64::from(self.min);
        (offset / range).clamp(0.0, 1.0) as f32
    }

    /// Writes the normalized ring, oldest first, into `out`. Columns with no
    /// sample yet sit on the midpoint at the left edge.
    pub fn fill(&self, out: &mut [f32]) {
        let pad = out.len().saturating_sub(self.samples.len());
        let (blank, trace) = out.split_at_mut(pad);
        blank.fill(Self::MIDPOINT);

        let skip = self.samples.len() - trace.len();
        for (slot, sample) in trace.iter_mut().zip(self.samples.iter().skip(skip)) {
            *slot = self.normalize(sample);
        }
    }

    /// Amplitude relative to the signal level, 0..=100.
    pub fn quality(&self) -> u8 {
        if self.min >= self.max || self.max == 0 {
            return 0;
        }
        let range = u64::from(self.max - self.min);
        (range * 1_000 / u64::from(self.max)).min(100) as u8
    }

    pub fn extremes(&self) -> Option<(u32, u32)> {
        (!self.samples.is_empty()).then_some((self.min, self.max))
    }

    pub fn width(&self) -> usize {
        self.samples.capacity()
    }

    pub fn reset(&mut self) {
        self.samples.reset();
        self.min = u32::MAX;
        self.max = 0;
        self.since_rescan = 0;
    }
}
