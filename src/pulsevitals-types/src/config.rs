use serde::{Deserialize, Serialize};

use crate::VitalsError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FingerConfig {
    /// Running IR average above which a finger counts as present.
    pub threshold: u32,
    /// Samples in the running average. The window length is the hysteresis.
    pub window: usize,
}

impl Default for FingerConfig {
    fn default() -> Self {
        Self {
            threshold: 10_000,
            window: 20,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConditioningConfig {
    /// Samples kept for each analysis pass (~5 s at 50 Hz).
    pub analysis_window: usize,
    pub smoothing_window: usize,
}

impl Default for ConditioningConfig {
    fn default() -> Self {
        Self {
            analysis_window: 250,
            smoothing_window: 15,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeakConfig {
    /// Fraction of the positive amplitude a candidate must exceed.
    pub threshold_ratio: f64,
    /// Refractory spacing between accepted peaks (300 ms caps at 200 BPM).
    pub min_peak_distance_ms: u64,
}

impl Default for PeakConfig {
    fn default() -> Self {
        Self {
            threshold_ratio: 0.3,
            min_peak_distance_ms: 300,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeartRateConfig {
    pub min_bpm: f64,
    pub max_bpm: f64,
    pub history_size: usize,
}

impl Default for HeartRateConfig {
    fn default() -> Self {
        Self {
            min_bpm: 40.0,
            max_bpm: 200.0,
            history_size: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Spo2Config {
    pub window: usize,
    pub min_samples: usize,
    /// `SpO2 = intercept - slope * R`
    pub intercept: f64,
    pub slope: f64,
    pub min_percent: f64,
    pub max_percent: f64,
}

impl Default for Spo2Config {
    fn default() -> Self {
        Self {
            window: 20,
            min_samples: 4,
            intercept: 104.0,
            slope: 17.0,
            min_percent: 80.0,
            max_percent: 100.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveformConfig {
    /// Display samples, one per column.
    pub width: usize,
    /// Samples between full min/max rescans.
    pub rescan_interval: usize,
}

impl Default for WaveformConfig {
    fn default() -> Self {
        Self {
            width: 128,
            rescan_interval: 256,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CadenceConfig {
    pub compute_interval_ms: u64,
    pub draw_interval_ms: u64,
}

impl Default for CadenceConfig {
    fn default() -> Self {
        Self {
            compute_interval_ms: 2_000,
            draw_interval_ms: 300,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Full-scale ADC reading. Larger values are clamped.
    pub max_sample_value: u32,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            max_sample_value: (1 << 18) - 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VitalsConfig {
    pub finger: FingerConfig,
    pub conditioning: ConditioningConfig,
    pub peaks: PeakConfig,
    pub heart_rate: HeartRateConfig,
    pub spo2: Spo2Config,
    pub waveform: WaveformConfig,
    pub cadence: CadenceConfig,
    pub sensor: SensorConfig,
}

impl VitalsConfig {
    pub fn validate(&self) -> Result<(), VitalsError> {
        let invalid = |msg: &str| -> Result<(), VitalsError> {
            Err(VitalsError::InvalidConfig(msg.to_owned()))
        };

        if self.finger.window == 0 {
            return invalid("finger.window must be greater than zero");
        }
        if self.conditioning.smoothing_window == 0 {
            return invalid("conditioning.smoothing_window must be greater than zero");
        }
        if self.conditioning.analysis_window < self.conditioning.smoothing_window + 2 {
            return invalid("conditioning.analysis_window must exceed smoothing_window + 1");
        }
        if !(self.peaks.threshold_ratio > 0.0 && self.peaks.threshold_ratio < 1.0) {
            return invalid("peaks.threshold_ratio must be in (0, 1)");
        }
        if self.heart_rate.min_bpm <= 0.0 || self.heart_rate.min_bpm >= self.heart_rate.max_bpm {
            return invalid("heart_rate.min_bpm must be positive and below max_bpm");
        }
        if self.heart_rate.history_size == 0 {
            return invalid("heart_rate.history_size must be greater than zero");
        }
        if self.spo2.window == 0 || self.spo2.min_samples == 0 {
            return invalid("spo2.window and spo2.min_samples must be greater than zero");
        }
        if self.spo2.min_samples > self.spo2.window {
            return invalid("spo2.min_samples cannot exceed spo2.window");
        }
        if self.spo2.min_percent > self.spo2.max_percent {
            return invalid("spo2.min_percent cannot exceed spo2.max_percent");
        }
        if self.waveform.width == 0 || self.waveform.rescan_interval == 0 {
            return invalid("waveform.width and waveform.rescan_interval must be greater than zero");
        }
        if self.cadence.compute_interval_ms == 0 || self.cadence.draw_interval_ms == 0 {
            return invalid("cadence intervals must be greater than zero");
        }
        if self.sensor.max_sample_value == 0 {
            return invalid("sensor.max_sample_value must be greater than zero");
        }

        Ok(())
    }
}
