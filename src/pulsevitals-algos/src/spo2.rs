use pulsevitals_types::{Spo2Config, VitalsError};

use crate::RingBuffer;

/// Ratio-of-ratios SpO2 over a short paired window of red and IR samples.
#[derive(Debug, Clone)]
pub struct SpO2Estimator {
    config: Spo2Config,
    red: RingBuffer<u32>,
    ir: RingBuffer<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ChannelStats {
    dc: f64,
    ac: f64,
}

impl ChannelStats {
    /// `None` for an empty window.
    fn of(window: &RingBuffer<u32>) -> Option<Self> {
        if window.is_empty() {
            return None;
        }

        let (sum, min, max) = window.iter().fold((0_u64, u32::MAX, 0_u32), |(s, lo, hi), v| {
            (s + u64::from(v), lo.min(v), hi.max(v))
        });
        Some(Self {
            dc: sum as f64 / window.len() as f64,
            ac: f64::from(max - min),
        })
    }
}

impl SpO2Estimator {
    pub fn new(config: &Spo2Config) -> Self {
        Self {
            config: *config,
            red: RingBuffer::new(config.window),
            ir: RingBuffer::new(config.window),
        }
    }

    /// Both channels of a slot go in together so the windows never skew.
    pub fn push(&mut self, red: u32, ir: u32) {
        self.red.push(red);
        self.ir.push(ir);
    }

    /// `(AC_red / DC_red) / (AC_ir / DC_ir)` over the current window.
    pub fn ratio(&self) -> Result<f64, VitalsError> {
        if self.ir.len() < self.config.min_samples {
            return Err(VitalsError::InsufficientData);
        }

        let (Some(red), Some(ir)) = (ChannelStats::of(&self.red), ChannelStats::of(&self.ir))
        else {
            return Err(VitalsError::InsufficientData);
        };
        if red.dc == 0.0 || ir.dc == 0.0 || ir.ac == 0.0 {
            return Err(VitalsError::ChannelUnavailable);
        }

        Ok((red.ac / red.dc) / (ir.ac / ir.dc))
    }

    /// Maps a ratio through the linear calibration, bounded to the plausible band.
    pub fn calibrate(&self, ratio: f64) -> f64 {
        (self.config.intercept - self.config.slope * ratio)
            .clamp(self.config.min_percent, self.config.max_percent)
    }

    pub fn estimate(&self) -> Result<f64, VitalsError> {
        self.ratio().map(|ratio| self.calibrate(ratio))
    }

    pub fn reset(&mut self) {
        self.red.reset();
        self.ir.reset();
    }
}
